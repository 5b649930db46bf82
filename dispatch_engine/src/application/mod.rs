// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Application Layer
//!
//! The use-case layer sitting between the HTTP presentation surface and the
//! domain ports: [`DispatchService`] wires the two worker pools, the shared
//! GPU admission controller, and the job-state store together behind the
//! four operations the HTTP adapter needs (submit, status, queue status, GPU
//! status).

pub mod dispatch_service;

pub use dispatch_service::{DispatchService, PoolStatus};
