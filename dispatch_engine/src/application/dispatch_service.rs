// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Dispatch Service
//!
//! The use-case layer the HTTP presentation surface calls into. Owns the two
//! worker pools (OCR, form-parse), the shared GPU admission controller, and
//! the job-state store, and exposes exactly the four operations spec.md §6's
//! HTTP table needs: submit, status, queue status, GPU status.

use crate::infrastructure::queue::QueueDepth;
use crate::infrastructure::WorkerPool;
use bytes::Bytes;
use dispatch_domain::entities::{JobDescriptor, JobParameters, JobRecord};
use dispatch_domain::services::{GpuAdmissionController, GpuStats, JobStateStore};
use dispatch_domain::value_objects::{JobKind, Priority};
use dispatch_domain::{DispatchError, JobId};
use std::sync::Arc;

/// A worker pool's depth/occupancy snapshot, as surfaced by
/// `GET /<kind>/queue/status`.
#[derive(Debug, Clone)]
pub struct PoolStatus {
    pub depth: QueueDepth,
    pub active_jobs: usize,
    pub worker_count: usize,
}

/// Wires the job-state store, GPU admission controller, and both worker
/// pools together. One instance lives for the life of the process; routes
/// hold an `Arc<DispatchService>`.
pub struct DispatchService {
    state_store: Arc<dyn JobStateStore>,
    gpu: Arc<dyn GpuAdmissionController>,
    ocr_pool: WorkerPool,
    form_pool: WorkerPool,
}

impl DispatchService {
    pub fn new(
        state_store: Arc<dyn JobStateStore>,
        gpu: Arc<dyn GpuAdmissionController>,
        ocr_pool: WorkerPool,
        form_pool: WorkerPool,
    ) -> Self {
        Self { state_store, gpu, ocr_pool, form_pool }
    }

    fn pool_for(&self, kind: JobKind) -> &WorkerPool {
        match kind {
            JobKind::Ocr => &self.ocr_pool,
            JobKind::FormParse => &self.form_pool,
        }
    }

    /// Write a `pending` record, enqueue the descriptor into the matching
    /// pool, and return the minted [`JobId`] - matching the data-flow
    /// described in spec.md §2 ("HTTP adapter writes a pending record,
    /// enqueues a job descriptor").
    pub async fn submit_job(
        &self,
        kind: JobKind,
        filename: String,
        payload: Bytes,
        parameters: JobParameters,
        priority: Priority,
    ) -> Result<JobId, DispatchError> {
        let descriptor = JobDescriptor::new(kind, filename, payload, parameters, priority);
        let record = JobRecord::pending(descriptor.id, descriptor.submitted_at);
        self.state_store.put(record).await?;

        tracing::info!(job_id = %descriptor.id, kind = %kind, priority = ?priority, "job submitted");
        self.pool_for(kind).submit(descriptor);

        Ok(descriptor.id)
    }

    /// Point lookup for the status endpoint. `None` maps to the HTTP
    /// adapter's "Job ID not found" 404 (spec.md §8 scenario 4).
    pub async fn get_status(&self, job_id: JobId) -> Result<Option<JobRecord>, DispatchError> {
        self.state_store.get(job_id).await
    }

    pub fn queue_status(&self, kind: JobKind) -> PoolStatus {
        let pool = self.pool_for(kind);
        PoolStatus { depth: pool.queue_depth(), active_jobs: pool.active_jobs(), worker_count: pool.worker_count() }
    }

    pub async fn gpu_status(&self) -> GpuStats {
        self.gpu.stats().await
    }

    /// Signal both pools to stop after their current job. Part of the
    /// bootstrap layer's graceful-shutdown sequence.
    pub fn shutdown_pools(&self) {
        self.ocr_pool.shutdown();
        self.form_pool.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::gpu::{GpuAdmissionControllerImpl, NoGpuMemorySource};
    use crate::infrastructure::inference::{FixtureModelRuntime, OcrAdapter};
    use crate::infrastructure::queue::SharedDeps;
    use crate::infrastructure::InMemoryJobStateStore;
    use dispatch_domain::services::InferenceAdapter;
    use std::time::Duration;

    fn service() -> DispatchService {
        let store: Arc<dyn JobStateStore> = Arc::new(InMemoryJobStateStore::new());
        let gpu: Arc<dyn GpuAdmissionController> =
            Arc::new(GpuAdmissionControllerImpl::new(1, 12.0, Arc::new(NoGpuMemorySource)));
        let adapter: Arc<dyn InferenceAdapter> = Arc::new(OcrAdapter::new(Arc::new(FixtureModelRuntime::single_word("HELLO"))));

        let metrics = Arc::new(crate::infrastructure::metrics::DispatchMetrics::new().unwrap());
        let ocr_pool = WorkerPool::new(
            1,
            Arc::new(SharedDeps {
                service_name: "ocr",
                state_store: store.clone(),
                gpu: gpu.clone(),
                adapter: adapter.clone(),
                gpu_acquire_timeout: Duration::from_secs(5),
                metrics: metrics.clone(),
            }),
        );
        let form_pool = WorkerPool::new(
            1,
            Arc::new(SharedDeps {
                service_name: "form_parse",
                state_store: store.clone(),
                gpu: gpu.clone(),
                adapter,
                gpu_acquire_timeout: Duration::from_secs(5),
                metrics,
            }),
        );

        DispatchService::new(store, gpu, ocr_pool, form_pool)
    }

    #[tokio::test]
    async fn submitted_job_is_pending_then_reaches_completed() {
        let service = service();
        let job_id = service
            .submit_job(JobKind::Ocr, "f.png".to_string(), Bytes::from_static(b"x"), JobParameters::Ocr, Priority::Normal)
            .await
            .unwrap();

        let record = service.get_status(job_id).await.unwrap().unwrap();
        assert!(matches!(record.status, dispatch_domain::entities::JobStatus::Pending | dispatch_domain::entities::JobStatus::Completed));

        for _ in 0..50 {
            if service.get_status(job_id).await.unwrap().unwrap().status.is_terminal() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("job never reached a terminal state");
    }

    #[tokio::test]
    async fn unknown_job_id_returns_none() {
        let service = service();
        assert!(service.get_status(JobId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn gpu_status_reports_configured_capacity() {
        let service = service();
        let stats = service.gpu_status().await;
        assert_eq!(stats.capacity, 1);
        assert_eq!(stats.active_holders, 0);
    }
}
