// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # GPU Admission Controller Port
//!
//! Bounds the number of simultaneous GPU users across *all* job kinds to a
//! configured capacity, and refuses admission when measured GPU memory
//! pressure crosses a configured threshold. This is the single gate shared
//! by every worker pool - OCR and form-parse workers contend for the same
//! capacity budget because they ultimately share one physical GPU.

use crate::value_objects::HolderId;
use async_trait::async_trait;
use std::time::Duration;

/// A point-in-time GPU memory reading, when the host exposes one. Advisory
/// only - the controller never allocates or frees memory itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpuMemoryInfo {
    pub allocated_gib: f64,
    pub reserved_gib: f64,
    pub total_gib: f64,
}

impl GpuMemoryInfo {
    pub fn free_gib(&self) -> f64 {
        (self.total_gib - self.allocated_gib).max(0.0)
    }
}

/// An advisory snapshot of the controller's state, returned by `stats()`.
#[derive(Debug, Clone)]
pub struct GpuStats {
    pub active_holders: usize,
    pub capacity: usize,
    pub holder_ids: Vec<HolderId>,
    pub memory_info: Option<GpuMemoryInfo>,
}

impl GpuStats {
    pub fn free(&self) -> usize {
        self.capacity.saturating_sub(self.active_holders)
    }
}

/// The shared gate in front of every worker pool's inference call.
///
/// All four operations are specified to run "under one lock": whatever a
/// concrete implementation uses for mutual exclusion, the holders set and
/// capacity counter must be consistent at the moment any one of these
/// methods returns - no caller can observe a torn intermediate state.
///
/// There is no FIFO ordering among waiters in `wait_acquire` - it is a
/// polling loop, not a queue of its own. That's acceptable because the
/// number of concurrent waiters equals the number of worker tasks, which is
/// small and bounded; real ordering already happens one layer up, in the
/// priority queue.
#[async_trait]
pub trait GpuAdmissionController: Send + Sync {
    /// Non-blocking. Returns `true` iff current holders < capacity AND
    /// measured GPU memory usage is below the configured threshold (when a
    /// memory reading is available at all - an unavailable reading is
    /// treated as sufficient memory, never as a reason to refuse). On
    /// success, atomically inserts `holder_id`.
    ///
    /// A second `try_acquire` under an id that's already held returns
    /// `false` without disturbing the existing lease - not a panic, not a
    /// double-insert. Preserve this quirk rather than "fixing" it; it's
    /// relied on by callers that retry blindly.
    async fn try_acquire(&self, holder_id: &HolderId) -> bool;

    /// Polls `try_acquire` (interval <= 2s) until it succeeds or `timeout`
    /// elapses. Returns `false` on timeout.
    async fn wait_acquire(&self, holder_id: &HolderId, timeout: Duration) -> bool;

    /// Remove `holder_id` from the active set. Idempotent: releasing an id
    /// that isn't held is logged as an anomaly, not an error.
    async fn release(&self, holder_id: &HolderId);

    /// Advisory snapshot for the `/gpu/status` endpoint.
    async fn stats(&self) -> GpuStats;
}
