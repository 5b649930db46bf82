// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Priority Queue
//!
//! Two FIFO lanes (`normal`, `priority`) backing one job kind. Enqueue is
//! non-blocking and always succeeds; dequeue tries `priority` first, then
//! `normal`, and sleeps briefly before retrying if both are empty.

pub mod worker_pool;

use dispatch_domain::entities::JobDescriptor;
use dispatch_domain::value_objects::Priority;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

pub use worker_pool::WorkerPool;

/// How long a dequeue loop sleeps after finding both lanes empty before
/// retrying. Matches the "approximately 1 second" sleep the original
/// implementation's poll loop used.
const EMPTY_QUEUE_BACKOFF: Duration = Duration::from_secs(1);

/// A snapshot of lane depths, for the `/<kind>/queue/status` endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueueDepth {
    pub normal: usize,
    pub priority: usize,
}

/// Two unbounded FIFO channels, shared by every worker in a pool.
///
/// Channels are unbounded because spec §4.C imposes no hard size - enqueue
/// must always succeed. The receivers are wrapped in a `Mutex` so that
/// multiple worker tasks can dequeue concurrently; only one worker ever
/// holds a given descriptor, since a channel recv is inherently
/// single-consumer per message.
pub struct JobQueue {
    normal_tx: mpsc::UnboundedSender<JobDescriptor>,
    normal_rx: Mutex<mpsc::UnboundedReceiver<JobDescriptor>>,
    priority_tx: mpsc::UnboundedSender<JobDescriptor>,
    priority_rx: Mutex<mpsc::UnboundedReceiver<JobDescriptor>>,
    // Depths are tracked separately from the channel internals so `stats()`
    // doesn't need a `len()` that `mpsc::UnboundedReceiver` doesn't expose.
    normal_depth: std::sync::atomic::AtomicUsize,
    priority_depth: std::sync::atomic::AtomicUsize,
}

impl JobQueue {
    pub fn new() -> Self {
        let (normal_tx, normal_rx) = mpsc::unbounded_channel();
        let (priority_tx, priority_rx) = mpsc::unbounded_channel();
        Self {
            normal_tx,
            normal_rx: Mutex::new(normal_rx),
            priority_tx,
            priority_rx: Mutex::new(priority_rx),
            normal_depth: std::sync::atomic::AtomicUsize::new(0),
            priority_depth: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Enqueue a descriptor into its priority's lane. Never blocks, never
    /// fails while any receiver half is alive (which is always true for the
    /// lifetime of the owning [`WorkerPool`]).
    pub fn enqueue(&self, job: JobDescriptor) {
        use std::sync::atomic::Ordering;
        match job.priority {
            Priority::High => {
                self.priority_depth.fetch_add(1, Ordering::SeqCst);
                let _ = self.priority_tx.send(job);
            }
            Priority::Normal => {
                self.normal_depth.fetch_add(1, Ordering::SeqCst);
                let _ = self.normal_tx.send(job);
            }
        }
    }

    /// Try the priority lane, then the normal lane, without blocking.
    fn try_dequeue(&self) -> Option<JobDescriptor> {
        use std::sync::atomic::Ordering;
        if let Ok(mut rx) = self.priority_rx.try_lock() {
            if let Ok(job) = rx.try_recv() {
                self.priority_depth.fetch_sub(1, Ordering::SeqCst);
                return Some(job);
            }
        }
        if let Ok(mut rx) = self.normal_rx.try_lock() {
            if let Ok(job) = rx.try_recv() {
                self.normal_depth.fetch_sub(1, Ordering::SeqCst);
                return Some(job);
            }
        }
        None
    }

    /// Dequeue per §4.C's policy: priority first, then normal, sleeping
    /// briefly between passes when both lanes are empty. Cancellation-safe -
    /// callers select! this against a shutdown signal.
    pub async fn dequeue(&self) -> JobDescriptor {
        loop {
            if let Some(job) = self.try_dequeue() {
                return job;
            }
            tokio::time::sleep(EMPTY_QUEUE_BACKOFF).await;
        }
    }

    pub fn depth(&self) -> QueueDepth {
        use std::sync::atomic::Ordering;
        QueueDepth {
            normal: self.normal_depth.load(Ordering::SeqCst),
            priority: self.priority_depth.load(Ordering::SeqCst),
        }
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use dispatch_domain::entities::JobParameters;
    use dispatch_domain::value_objects::{JobId, JobKind};

    fn descriptor(priority: Priority) -> JobDescriptor {
        JobDescriptor {
            id: JobId::new(),
            kind: JobKind::Ocr,
            filename: "f.png".to_string(),
            payload: Bytes::new(),
            parameters: JobParameters::Ocr,
            submitted_at: chrono::Utc::now(),
            priority,
        }
    }

    #[tokio::test]
    async fn priority_lane_drains_before_normal() {
        let queue = JobQueue::new();
        let normal = descriptor(Priority::Normal);
        let normal_id = normal.id;
        let high = descriptor(Priority::High);
        let high_id = high.id;

        queue.enqueue(normal);
        queue.enqueue(high);

        let first = queue.dequeue().await;
        assert_eq!(first.id, high_id);
        let second = queue.dequeue().await;
        assert_eq!(second.id, normal_id);
    }

    #[tokio::test]
    async fn fifo_within_a_single_lane() {
        let queue = JobQueue::new();
        let a = descriptor(Priority::Normal);
        let a_id = a.id;
        let b = descriptor(Priority::Normal);
        let b_id = b.id;

        queue.enqueue(a);
        queue.enqueue(b);

        assert_eq!(queue.dequeue().await.id, a_id);
        assert_eq!(queue.dequeue().await.id, b_id);
    }

    #[test]
    fn depth_reflects_enqueued_counts() {
        let queue = JobQueue::new();
        queue.enqueue(descriptor(Priority::Normal));
        queue.enqueue(descriptor(Priority::High));
        queue.enqueue(descriptor(Priority::High));

        let depth = queue.depth();
        assert_eq!(depth.normal, 1);
        assert_eq!(depth.priority, 2);
    }
}
