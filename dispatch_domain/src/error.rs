// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Dispatch Error
//!
//! Single error type shared by every port in this crate. Infrastructure
//! adapters translate their own error types (redis errors, HTTP errors, model
//! runtime errors) into one of these variants before they cross the port
//! boundary; nothing above the adapter layer should need to know which
//! storage backend or which model runtime raised a failure.

use thiserror::Error;

/// Errors surfaced by the domain ports.
///
/// Variant choice mirrors the taxonomy the dispatcher must distinguish at
/// the HTTP boundary and in job records: validation happens before a job
/// record exists, admission and inference failures are terminal job states,
/// and store failures are transient by design (see [`DispatchError::is_transient`]).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Submission-time validation failure (bad extension, bad MIME, oversized
    /// upload, missing file). Never results in a job record being created.
    #[error("validation failed: {0}")]
    Validation(String),

    /// `wait_acquire` exceeded its timeout before a GPU slot became free.
    #[error("gpu acquisition timeout")]
    GpuTimeout,

    /// The uploaded bytes could not be decoded as an image.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// The configured model for this deployment is not loaded or not
    /// applicable to the requested job kind.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// The inference runtime reported it ran out of GPU memory mid-job.
    #[error("out of gpu memory: {0}")]
    OutOfGpuMemory(String),

    /// Inference ran but produced no usable result.
    #[error("inference failed: {0}")]
    InferenceFailed(String),

    /// Inference succeeded but its output could not be turned into the
    /// expected result shape.
    #[error("post-process failed: {0}")]
    PostProcessFailed(String),

    /// The job state store could not be reached or returned an error.
    /// Treated as transient: the worker logs and continues rather than
    /// failing the job outright.
    #[error("state store unavailable: {0}")]
    StoreUnavailable(String),

    /// Requested job id has no record.
    #[error("job id not found")]
    NotFound,

    /// Catch-all for conditions that don't fit a more specific variant.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    /// Whether this failure is transient and should not terminate the
    /// calling job (see §7 of the error handling design: store failures are
    /// logged and the worker continues, possibly reporting stale state).
    pub fn is_transient(&self) -> bool {
        matches!(self, DispatchError::StoreUnavailable(_))
    }

    /// The human-readable message written into a job record's `error` field.
    /// Distinct from `Display` so callers aren't tempted to leak internal
    /// detail (e.g. store connection strings) into a terminal record.
    pub fn job_message(&self) -> String {
        match self {
            DispatchError::GpuTimeout => "gpu acquisition timeout".to_string(),
            other => other.to_string(),
        }
    }
}
