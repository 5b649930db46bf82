// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Job State Store Port
//!
//! Durable key -> record mapping for job status, progress, result, and
//! error. The dispatcher never scans or iterates this store - every
//! operation is a point lookup or upsert by [`JobId`].
//!
//! ## Guarantees implementations must uphold
//!
//! - `put` is atomic with respect to concurrent readers: any `get` returns a
//!   consistent snapshot of one past `put`, never a torn mix of two writes.
//! - Single-writer-per-job is the *caller's* responsibility (one worker owns
//!   one job at a time via the queue's dequeue semantics); the store does
//!   not arbitrate conflicting writes itself - last writer wins.
//! - Values must be JSON-serialisable; no other requirement is placed on the
//!   backing technology (in-memory map, Redis, or anything else).

use crate::entities::JobRecord;
use crate::error::DispatchError;
use crate::value_objects::JobId;
use async_trait::async_trait;

/// Durable storage for job records, polled by the HTTP layer and written by
/// exactly one worker per job.
#[async_trait]
pub trait JobStateStore: Send + Sync {
    /// Upsert the record for `id`. Overwrites whatever was there.
    async fn put(&self, record: JobRecord) -> Result<(), DispatchError>;

    /// Non-blocking point lookup. `Ok(None)` means the id is unknown, not an
    /// error - that distinction is the HTTP layer's 404.
    async fn get(&self, id: JobId) -> Result<Option<JobRecord>, DispatchError>;
}
