// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Job urgency classes. See [`crate::services::queue`] docs on the
//! infrastructure side for the dequeue policy these two lanes imply.

use serde::{Deserialize, Serialize};

/// A job's urgency class.
///
/// Two lanes only - no weighted or fair-share scheduling. `High` jobs
/// overtake waiting `Normal` jobs at the next dequeue decision but never
/// preempt a job already running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Normal,
    High,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}
