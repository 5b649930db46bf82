// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Worker Pool
//!
//! `W` workers per job kind, started lazily on first submission and run
//! until the pool is shut down. Each worker runs the dequeue -> admit ->
//! infer -> record loop described in the job-dispatch design.

use super::{JobQueue, QueueDepth};
use crate::infrastructure::metrics::DispatchMetrics;
use dispatch_domain::entities::{JobDescriptor, JobRecord};
use dispatch_domain::services::{GpuAdmissionController, InferenceAdapter, JobStateStore};
use dispatch_domain::value_objects::HolderId;
use dispatch_domain::DispatchError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Everything a single worker needs to run its loop, independent of which
/// pool it belongs to. Cloned (by `Arc`) into every spawned task.
struct WorkerContext {
    service_name: &'static str,
    queue: Arc<JobQueue>,
    state_store: Arc<dyn JobStateStore>,
    gpu: Arc<dyn GpuAdmissionController>,
    adapter: Arc<dyn InferenceAdapter>,
    gpu_acquire_timeout: Duration,
    shutdown: Arc<Notify>,
    metrics: Arc<DispatchMetrics>,
}

/// A lazily-started pool of workers draining one [`JobQueue`].
///
/// `submit` both enqueues the descriptor and, on the very first call,
/// spawns the worker tasks - matching the original service's
/// `start_worker`-on-first-submission behavior (see SPEC_FULL.md §4.D).
pub struct WorkerPool {
    queue: Arc<JobQueue>,
    started: AtomicBool,
    worker_count: usize,
    active_jobs: Arc<AtomicUsize>,
    shutdown: Arc<Notify>,
    handles: std::sync::Mutex<Vec<JoinHandle<()>>>,
    context: std::sync::Mutex<Option<Arc<SharedDeps>>>,
}

/// Dependencies supplied once, at pool construction, and handed to every
/// worker when the pool starts.
pub struct SharedDeps {
    pub service_name: &'static str,
    pub state_store: Arc<dyn JobStateStore>,
    pub gpu: Arc<dyn GpuAdmissionController>,
    pub adapter: Arc<dyn InferenceAdapter>,
    pub gpu_acquire_timeout: Duration,
    pub metrics: Arc<DispatchMetrics>,
}

impl WorkerPool {
    pub fn new(worker_count: usize, deps: Arc<SharedDeps>) -> Self {
        Self {
            queue: Arc::new(JobQueue::new()),
            started: AtomicBool::new(false),
            worker_count: worker_count.max(1),
            active_jobs: Arc::new(AtomicUsize::new(0)),
            shutdown: Arc::new(Notify::new()),
            handles: std::sync::Mutex::new(Vec::new()),
            context: std::sync::Mutex::new(Some(deps)),
        }
    }

    /// Enqueue `job` and ensure the worker tasks are running.
    pub fn submit(&self, job: JobDescriptor) {
        self.ensure_started();
        self.queue.enqueue(job);
    }

    pub fn queue_depth(&self) -> QueueDepth {
        self.queue.depth()
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn active_jobs(&self) -> usize {
        self.active_jobs.load(Ordering::SeqCst)
    }

    /// Signal every worker to stop after its current job. Does not wait for
    /// them to drain - callers join the handles separately if they need to.
    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }

    fn ensure_started(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        let deps = self
            .context
            .lock()
            .unwrap()
            .take()
            .expect("worker pool started twice without a SharedDeps");

        let mut handles = self.handles.lock().unwrap();
        for worker_id in 0..self.worker_count {
            let ctx = WorkerContext {
                service_name: deps.service_name,
                queue: self.queue.clone(),
                state_store: deps.state_store.clone(),
                gpu: deps.gpu.clone(),
                adapter: deps.adapter.clone(),
                gpu_acquire_timeout: deps.gpu_acquire_timeout,
                shutdown: self.shutdown.clone(),
                metrics: deps.metrics.clone(),
            };
            let active_jobs = self.active_jobs.clone();
            handles.push(tokio::spawn(worker_loop(ctx, worker_id, active_jobs)));
        }
    }
}

/// One worker's infinite loop: dequeue, admit, infer, record, release.
async fn worker_loop(ctx: WorkerContext, worker_id: usize, active_jobs: Arc<AtomicUsize>) {
    let holder_id = HolderId::worker(ctx.service_name, worker_id);
    loop {
        let job = tokio::select! {
            job = ctx.queue.dequeue() => job,
            _ = ctx.shutdown.notified() => {
                tracing::info!(service = ctx.service_name, worker_id, "worker shutting down");
                return;
            }
        };

        active_jobs.fetch_add(1, Ordering::SeqCst);
        run_one_job(&ctx, &holder_id, job).await;
        active_jobs.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Steps 2-7 of the worker loop for a single dequeued descriptor. Never
/// propagates an error out of the loop - every failure is translated into a
/// terminal job record, matching §7's "worker never rethrows" policy.
async fn run_one_job(ctx: &WorkerContext, holder_id: &HolderId, job: JobDescriptor) {
    let job_id = job.id;

    // Step 3: admission, before any record transition away from `pending`.
    let admitted = ctx.gpu.wait_acquire(holder_id, ctx.gpu_acquire_timeout).await;
    if !admitted {
        record_failure(ctx, job_id, DispatchError::GpuTimeout).await;
        return;
    }

    // Step 2 (moved after admission - see SPEC_FULL.md §3): `processing`
    // is only observable once the job actually holds a GPU lease.
    if let Err(err) = update_record(ctx, job_id, |record| record.start_processing().map_err(|e| {
        DispatchError::Internal(e.to_string())
    }))
    .await
    {
        tracing::warn!(%job_id, error = %err, "failed to write processing state");
    }

    let (reporter, progress_writer) = spawn_progress_writer(ctx.clone_store(), job_id);

    // Step 4: inference runs off the dequeue loop's own task via the
    // adapter's own `spawn_blocking` usage internally; from here it is just
    // an ordinary async call.
    let result = ctx.adapter.run(&job, reporter).await;

    // `reporter` (and its sole channel sender) was dropped when `run`
    // returned, so the writer task below is draining its last queued
    // updates and will finish on its own; wait for it so every progress
    // write is ordered strictly before the terminal write that follows.
    // This is what keeps progress writes single-writer-per-job even though
    // they originate from a callback invoked off the worker's own task.
    let _ = progress_writer.await;

    match result {
        Ok(payload) => {
            if let Err(err) = update_record(ctx, job_id, |record| {
                record.complete(payload.clone()).map_err(|e| DispatchError::Internal(e.to_string()))
            })
            .await
            {
                tracing::error!(%job_id, error = %err, "failed to write completed state");
            }
            ctx.metrics.record_job_completed(ctx.service_name);
        }
        Err(err) => {
            if matches!(err, DispatchError::OutOfGpuMemory(_)) {
                ctx.adapter.clear_gpu_cache().await;
            }
            record_failure(ctx, job_id, err).await;
        }
    }

    // Step 7: release is unconditional once admitted, regardless of outcome.
    ctx.gpu.release(holder_id).await;
}

async fn record_failure(ctx: &WorkerContext, job_id: dispatch_domain::JobId, error: DispatchError) {
    let message = error.job_message();
    if let Err(store_err) =
        update_record(ctx, job_id, |record| record.fail(message.clone()).map_err(|e| DispatchError::Internal(e.to_string())))
            .await
    {
        tracing::error!(%job_id, error = %store_err, "failed to write error state");
    }
    ctx.metrics.record_job_failed(ctx.service_name);
}

/// Read-modify-write a job record. Store failures are transient per §7.4:
/// logged by the caller, never turned into a panic or a second job failure.
async fn update_record(
    ctx: &WorkerContext,
    job_id: dispatch_domain::JobId,
    mutate: impl FnOnce(&mut JobRecord) -> Result<(), DispatchError>,
) -> Result<(), DispatchError> {
    let mut record = ctx
        .state_store
        .get(job_id)
        .await?
        .ok_or(DispatchError::NotFound)?;
    mutate(&mut record)?;
    ctx.state_store.put(record).await
}

/// Builds a [`ProgressReporter`](dispatch_domain::services::ProgressReporter)
/// that funnels every progress callback through a single background task
/// via an unbounded channel, rather than spawning one detached task per
/// callback. A detached-task-per-callback design has no ordering guarantee
/// between spawned tasks, so a progress write can land after the worker's
/// own `complete`/`fail` write and regress `progress` - this channel
/// serializes writes in call order on one task, and the caller awaits the
/// returned handle once inference finishes so every queued write lands
/// before the terminal record write (see `run_one_job`).
fn spawn_progress_writer(
    store: Arc<dyn JobStateStore>,
    job_id: dispatch_domain::JobId,
) -> (dispatch_domain::services::ProgressReporter, JoinHandle<()>) {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<u8>();

    let handle = tokio::spawn(async move {
        while let Some(progress) = rx.recv().await {
            if let Ok(Some(mut record)) = store.get(job_id).await {
                record.set_progress(progress);
                if let Err(err) = store.put(record).await {
                    tracing::warn!(%job_id, error = %err, "failed to persist progress");
                }
            }
        }
    });

    let reporter: dispatch_domain::services::ProgressReporter = Arc::new(move |progress: u8| {
        let _ = tx.send(progress);
    });

    (reporter, handle)
}

impl WorkerContext {
    fn clone_store(&self) -> Arc<dyn JobStateStore> {
        self.state_store.clone()
    }
}
