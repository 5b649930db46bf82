// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Infrastructure Layer
//!
//! Every concrete implementation of a [`dispatch_domain::services`] port,
//! plus the process-wide concerns (logging, metrics) that sit alongside
//! them: GPU admission, the priority queue and worker pools, job-state
//! store backends, and the OCR/form-parse inference adapters.

pub mod gpu;
pub mod inference;
pub mod logging;
pub mod metrics;
pub mod queue;
pub mod state_store;

pub use gpu::{GpuAdmissionControllerImpl, GpuMemorySource, NoGpuMemorySource};
pub use inference::{FixtureModelRuntime, FormParseAdapter, ModelRuntime, OcrAdapter, UnavailableModelRuntime};
pub use metrics::DispatchMetrics;
pub use queue::{JobQueue, SharedDeps, WorkerPool};
pub use state_store::{InMemoryJobStateStore, RedisJobStateStore};
