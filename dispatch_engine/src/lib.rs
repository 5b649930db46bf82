// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # Dispatch Engine
//!
//! The application and infrastructure layers of the GPU job-dispatch engine:
//! the priority queue, the worker pools that drain it, the GPU admission
//! controller, the job state store backends, the OCR/form-parse inference
//! adapters, and the HTTP adapter that exposes all of it to clients.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Presentation Layer                          │
//! │  (axum routes, DTOs, multipart validation)                  │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Application Layer                          │
//! │  (DispatchService: submit, status, queue/gpu status)         │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Domain Layer                             │
//! │  (dispatch_domain: JobRecord, JobDescriptor, ports)          │
//! └─────────────────────────────────────────────────────────────┘
//!                                ▲
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                Infrastructure Layer                         │
//! │  (queue, gpu admission, state store, inference, metrics)    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Core Concepts
//!
//! ### Job
//! A job is a single upload processed by either the OCR or form-parse
//! pipeline. Submission creates a `pending` [`dispatch_domain::entities::JobRecord`]
//! and enqueues a [`dispatch_domain::entities::JobDescriptor`]; exactly one
//! worker carries it to a terminal state.
//!
//! ### Worker Pools
//! OCR and form-parse each have an independent pool of workers, started
//! lazily on first submission. Workers dequeue, admit onto the shared GPU,
//! invoke the configured inference adapter, and write the terminal record.
//!
//! ### GPU Admission
//! A single [`dispatch_domain::services::GpuAdmissionController`] bounds how
//! many workers - across both pools - may run inference at once, gated
//! additionally by a pluggable memory-pressure reading.
//!
//! ## Error Handling
//!
//! Every port returns [`dispatch_domain::DispatchError`]; infrastructure
//! adapters translate backend-specific failures (Redis, HTTP, the model
//! runtime) into one of its variants at the boundary.
//!
//! ## Testing
//!
//! ```bash
//! # Run all tests
//! cargo test
//!
//! # Run unit tests only
//! make test-unit
//! ```

pub mod application;
pub mod infrastructure;
pub mod presentation;

// Tests are organized as:
// - Unit tests: #[cfg(test)] modules within each source file
// - Integration tests: separate files in tests/ directory

pub use application::DispatchService;
pub use dispatch_domain::{DispatchError, HolderId, JobId, JobKind, Priority};
