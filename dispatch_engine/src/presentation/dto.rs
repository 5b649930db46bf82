// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Response Shapes
//!
//! JSON bodies for spec.md §6's five endpoints plus SPEC_FULL.md §6's two
//! ambient ones. These are wire types only - no behavior lives here beyond
//! [`StatusResponse::from_record`]'s translation from the domain's
//! [`JobRecord`].

use dispatch_domain::entities::{JobRecord, JobStatus};
use dispatch_domain::JobId;
use serde::Serialize;

/// Body for any error response (400/404/5xx) from the HTTP adapter.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

/// `POST /<kind>[/priority]` response.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub job_id: JobId,
    pub message: String,
}

/// `GET /<kind>/status/{job_id}` response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub status: JobStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

impl StatusResponse {
    /// `success` mirrors whether the job itself succeeded, not whether the
    /// poll succeeded - an `error` record is still a successful poll, just
    /// one reporting a failed job (spec.md §7's "User-visible failure").
    pub fn from_record(record: &JobRecord) -> Self {
        let message = match record.status {
            JobStatus::Pending => "job is queued".to_string(),
            JobStatus::Processing => "job is processing".to_string(),
            JobStatus::Completed => "job completed".to_string(),
            JobStatus::Error => record.error.clone().unwrap_or_else(|| "job failed".to_string()),
        };
        Self {
            success: !matches!(record.status, JobStatus::Error),
            status: record.status,
            message,
            progress: Some(record.progress),
            result: record.result.clone(),
        }
    }
}

/// Lane depths within one job kind's queue.
#[derive(Debug, Serialize)]
pub struct QueueDepthDto {
    pub normal: usize,
    pub priority: usize,
}

/// `GET /<kind>/queue/status` response.
#[derive(Debug, Serialize)]
pub struct QueueStatusResponse {
    pub queue_depth: QueueDepthDto,
    pub active_jobs: usize,
    pub worker_count: usize,
}

/// A point-in-time GPU memory reading, when one is available.
#[derive(Debug, Serialize)]
pub struct GpuMemoryDto {
    pub allocated_gib: f64,
    pub reserved_gib: f64,
    pub total_gib: f64,
    pub free_gib: f64,
}

/// `GET /gpu/status` response.
#[derive(Debug, Serialize)]
pub struct GpuStatusResponse {
    pub capacity: usize,
    pub active_holders: usize,
    pub holder_ids: Vec<String>,
    pub gpu_memory: Option<GpuMemoryDto>,
}

/// `GET /health` response - liveness probe only, no dependency checks.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// `GET /` response - basic API metadata.
#[derive(Debug, Serialize)]
pub struct ApiInfoResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub deployed_engine: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn completed_record_reports_success_true() {
        let mut record = JobRecord::pending(JobId::new(), Utc::now());
        record.start_processing().unwrap();
        record.complete(serde_json::json!({"a": 1})).unwrap();

        let response = StatusResponse::from_record(&record);
        assert!(response.success);
        assert_eq!(response.progress, Some(100));
        assert!(response.result.is_some());
    }

    #[test]
    fn error_record_reports_success_false_with_error_message() {
        let mut record = JobRecord::pending(JobId::new(), Utc::now());
        record.fail("gpu acquisition timeout").unwrap();

        let response = StatusResponse::from_record(&record);
        assert!(!response.success);
        assert_eq!(response.message, "gpu acquisition timeout");
        assert!(response.result.is_none());
    }
}
