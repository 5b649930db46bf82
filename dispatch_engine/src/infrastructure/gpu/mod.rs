// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # GPU Admission Controller
//!
//! `parking_lot`-mutex-protected implementation of
//! [`dispatch_domain::services::GpuAdmissionController`]: a bounded set of
//! holder ids, polled into by `wait_acquire`, gated by an optional memory
//! reading.

mod memory_source;

pub use memory_source::{GpuMemorySource, NoGpuMemorySource};

use async_trait::async_trait;
use dispatch_domain::services::{GpuAdmissionController, GpuStats};
use dispatch_domain::value_objects::HolderId;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How often `wait_acquire` retries `try_acquire`. Spec §4.B caps this at
/// 2s; 500ms keeps the common case (capacity frees up quickly) responsive
/// without hammering the lock.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

struct State {
    holders: HashSet<HolderId>,
}

/// The shared gate in front of every worker pool's inference call.
///
/// All mutation happens under one `parking_lot::Mutex`, matching the
/// "all four operations run under one lock" invariant from spec §4.B -
/// `parking_lot` rather than `std::sync::Mutex` because it's non-poisoning
/// and cheaper to lock/unlock at the rate a worker pool contends on it.
pub struct GpuAdmissionControllerImpl {
    state: Mutex<State>,
    capacity: usize,
    memory_threshold_gib: f64,
    memory_source: Arc<dyn GpuMemorySource>,
}

impl GpuAdmissionControllerImpl {
    pub fn new(capacity: usize, memory_threshold_gib: f64, memory_source: Arc<dyn GpuMemorySource>) -> Self {
        Self {
            state: Mutex::new(State { holders: HashSet::new() }),
            capacity: capacity.max(1),
            memory_threshold_gib,
            memory_source,
        }
    }

    fn memory_is_sufficient(&self) -> bool {
        match self.memory_source.read() {
            // No reading available: treated as sufficient, per §4.B.
            None => true,
            Some(info) => info.allocated_gib < self.memory_threshold_gib,
        }
    }
}

#[async_trait]
impl GpuAdmissionController for GpuAdmissionControllerImpl {
    async fn try_acquire(&self, holder_id: &HolderId) -> bool {
        // Both the capacity check and the memory-pressure gate happen under
        // the one lock, per §4.B ("all four operations run under one lock");
        // reading memory outside the critical section would let a capacity
        // decision and a memory decision be made against two different
        // instants in time.
        let mut state = self.state.lock();
        if !self.memory_is_sufficient() {
            return false;
        }
        if state.holders.contains(holder_id) {
            // Double-acquire under the same id: silent no-op, preserved
            // from the original service's set semantics (see spec §4.B and
            // SPEC_FULL.md §9's Open Question resolution).
            tracing::warn!(holder = %holder_id, "duplicate try_acquire for an already-held id");
            return false;
        }
        if state.holders.len() >= self.capacity {
            return false;
        }
        state.holders.insert(holder_id.clone());
        true
    }

    async fn wait_acquire(&self, holder_id: &HolderId, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.try_acquire(holder_id).await {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn release(&self, holder_id: &HolderId) {
        let mut state = self.state.lock();
        if !state.holders.remove(holder_id) {
            tracing::warn!(holder = %holder_id, "release of a holder id that was not held");
        }
    }

    async fn stats(&self) -> GpuStats {
        let state = self.state.lock();
        GpuStats {
            active_holders: state.holders.len(),
            capacity: self.capacity,
            holder_ids: state.holders.iter().cloned().collect(),
            memory_info: self.memory_source.read(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(capacity: usize) -> GpuAdmissionControllerImpl {
        GpuAdmissionControllerImpl::new(capacity, 12.0, Arc::new(NoGpuMemorySource))
    }

    #[tokio::test]
    async fn try_acquire_respects_capacity() {
        let gpu = controller(1);
        let a = HolderId::worker("ocr", 0);
        let b = HolderId::worker("ocr", 1);

        assert!(gpu.try_acquire(&a).await);
        assert!(!gpu.try_acquire(&b).await);

        gpu.release(&a).await;
        assert!(gpu.try_acquire(&b).await);
    }

    #[tokio::test]
    async fn double_acquire_under_same_id_is_a_silent_no_op() {
        let gpu = controller(2);
        let a = HolderId::worker("ocr", 0);

        assert!(gpu.try_acquire(&a).await);
        assert!(!gpu.try_acquire(&a).await);

        let stats = gpu.stats().await;
        assert_eq!(stats.active_holders, 1);
    }

    #[tokio::test]
    async fn release_of_unheld_id_is_idempotent() {
        let gpu = controller(1);
        let a = HolderId::worker("ocr", 0);
        gpu.release(&a).await; // must not panic
        let stats = gpu.stats().await;
        assert_eq!(stats.active_holders, 0);
    }

    #[tokio::test]
    async fn wait_acquire_times_out_under_saturation() {
        let gpu = controller(1);
        let a = HolderId::worker("ocr", 0);
        let b = HolderId::worker("ocr", 1);
        assert!(gpu.try_acquire(&a).await);

        let admitted = gpu.wait_acquire(&b, Duration::from_millis(100)).await;
        assert!(!admitted);
    }

    #[tokio::test]
    async fn wait_acquire_succeeds_once_capacity_frees_up() {
        let gpu = Arc::new(controller(1));
        let a = HolderId::worker("ocr", 0);
        let b = HolderId::worker("ocr", 1);
        assert!(gpu.try_acquire(&a).await);

        let gpu_clone = gpu.clone();
        let releaser = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            gpu_clone.release(&a).await;
        });

        let admitted = gpu.wait_acquire(&b, Duration::from_secs(2)).await;
        assert!(admitted);
        releaser.await.unwrap();
    }

    #[tokio::test]
    async fn stats_reports_capacity_and_active_holders() {
        let gpu = controller(3);
        let a = HolderId::worker("ocr", 0);
        gpu.try_acquire(&a).await;

        let stats = gpu.stats().await;
        assert_eq!(stats.capacity, 3);
        assert_eq!(stats.active_holders, 1);
        assert_eq!(stats.free(), 2);
    }
}

#[cfg(test)]
mod capacity_invariant_proptest {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Acquire(usize),
        Release(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![(0usize..4).prop_map(Op::Acquire), (0usize..4).prop_map(Op::Release)]
    }

    proptest! {
        // Quantified invariant from spec §4.B/§8: at every point in time,
        // |GPU.active_holders| <= GPU_MAX_CONCURRENT, for any interleaving
        // of acquire/release calls across a small pool of holder ids.
        #[test]
        fn active_holders_never_exceeds_capacity(
            capacity in 1usize..4,
            ops in prop::collection::vec(op_strategy(), 0..30)
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let gpu = GpuAdmissionControllerImpl::new(capacity, 12.0, Arc::new(NoGpuMemorySource));
                for op in ops {
                    match op {
                        Op::Acquire(n) => {
                            gpu.try_acquire(&HolderId::worker("worker", n)).await;
                        }
                        Op::Release(n) => {
                            gpu.release(&HolderId::worker("worker", n)).await;
                        }
                    }
                    let stats = gpu.stats().await;
                    prop_assert!(stats.active_holders <= capacity);
                }
                Ok(())
            })?;
        }
    }
}
