// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # HTTP Presentation Layer
//!
//! The thin axum adapter spec.md §1 treats as an external collaborator:
//! multipart upload validation, route wiring, and JSON response shapes for
//! the five endpoints in §6's table plus the two ambient endpoints
//! (`/health`, `/`) recorded in SPEC_FULL.md §6.
//!
//! Nothing here makes a dispatch decision - every route is a thin call into
//! [`crate::application::DispatchService`], translated to and from JSON at
//! the boundary.

mod dto;
mod error;
mod routes;
mod state;
mod validation;

pub use dto::{
    ApiInfoResponse, ErrorBody, GpuMemoryDto, GpuStatusResponse, HealthResponse, QueueDepthDto,
    QueueStatusResponse, StatusResponse, SubmitResponse,
};
pub use error::ApiError;
pub use routes::build_router;
pub use state::AppState;
pub use validation::UploadValidationConfig;
