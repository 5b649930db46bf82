// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Inference Adapter Port
//!
//! The uniform contract every worker depends on: given a job descriptor,
//! produce a result. Two concrete adapters exist in the infrastructure layer
//! (OCR pipeline, form-parse vision-language pipeline) selected at startup
//! by the deployed-engine configuration key.
//!
//! An adapter is synchronous, CPU/GPU-bound work from the domain's point of
//! view - it never touches the queue or the state store. Infrastructure
//! implementations are responsible for running the actual heavy computation
//! off the async scheduler (e.g. via `spawn_blocking`) so a multi-minute
//! call can't stall the worker loop.

use crate::entities::JobDescriptor;
use crate::error::DispatchError;
use async_trait::async_trait;
use std::sync::Arc;

/// A callback a worker passes down so the adapter can report intermediate
/// progress (0..100) as it works, e.g. once per detected OCR region. Form
/// parsing has no sub-steps to report and simply never calls it between
/// start and finish.
pub type ProgressReporter = Arc<dyn Fn(u8) + Send + Sync>;

/// `(filename, payload_bytes, params) -> result`, the only operation a
/// worker calls.
///
/// Implementations surface failures via [`DispatchError`]'s
/// `InvalidImage` / `ModelUnavailable` / `OutOfGpuMemory` / `InferenceFailed`
/// / `PostProcessFailed` variants - the worker that invokes this never needs
/// to downcast or otherwise special-case an adapter-specific error type.
#[async_trait]
pub trait InferenceAdapter: Send + Sync {
    /// Run inference for one job, reporting progress through `progress` as
    /// work proceeds. Returns the opaque-to-the-dispatcher result payload to
    /// be written into the job record on success.
    async fn run(
        &self,
        job: &JobDescriptor,
        progress: ProgressReporter,
    ) -> Result<serde_json::Value, DispatchError>;

    /// Best-effort hook invoked after an `OutOfGpuMemory` failure, before
    /// the GPU admission lease is released, so the next job starts against a
    /// clean heap. A no-op default is valid for adapters with nothing to
    /// clear (e.g. a test double).
    async fn clear_gpu_cache(&self) {}
}
