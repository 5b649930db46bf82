// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # GPU Admission Holder Identifier
//!
//! Identifies one outstanding GPU admission lease. Constructed as
//! `"<service>_worker_<n>"`, e.g. `"ocr_worker_3"`, matching the original
//! Python service's `f"{service_name}_worker_{worker_id}"` naming.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A worker's self-chosen identity for the duration of one admission lease.
///
/// It is the caller's responsibility to make this unique per outstanding
/// `acquire` - the admission controller enforces set semantics (a second
/// `try_acquire` under the same id is a silent no-op, see
/// [`crate::services::GpuAdmissionController`]) but does not itself guarantee
/// uniqueness.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HolderId(String);

impl HolderId {
    /// Build a holder id from a service name and worker index, e.g.
    /// `HolderId::worker("ocr", 3)` → `"ocr_worker_3"`.
    pub fn worker(service_name: &str, worker_id: usize) -> Self {
        Self(format!("{service_name}_worker_{worker_id}"))
    }

    /// Wrap an already-formatted holder id, e.g. for values that arrived
    /// over the wire in `/gpu/status` responses.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
