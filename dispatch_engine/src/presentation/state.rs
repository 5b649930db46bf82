// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Shared Route State
//!
//! What every axum handler needs: the [`DispatchService`] use-case layer,
//! resolved upload validation thresholds, the metrics handle, and which
//! engine this deployment reports itself as running (for `GET /`).

use super::validation::UploadValidationConfig;
use crate::application::DispatchService;
use crate::infrastructure::DispatchMetrics;
use dispatch_bootstrap::config::DeployedEngine;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DispatchService>,
    pub validation: Arc<UploadValidationConfig>,
    pub metrics: Arc<DispatchMetrics>,
    pub deployed_engine: DeployedEngine,
}

impl AppState {
    /// Upper bound for `DefaultBodyLimit`, derived from the same threshold
    /// [`UploadValidationConfig::validate`] enforces post-parse - keeps axum
    /// from buffering an upload only to reject it on size afterwards.
    pub fn validation_max_body_bytes(&self) -> usize {
        self.validation.max_file_size_bytes().min(usize::MAX as u64) as usize
    }
}
