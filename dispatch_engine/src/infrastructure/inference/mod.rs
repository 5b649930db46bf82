// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Inference Adapters
//!
//! The two concrete [`dispatch_domain::services::InferenceAdapter`]
//! implementations (OCR, form-parse), the swappable [`ModelRuntime`]
//! abstraction standing in for the real model binaries, and the
//! form-parse adapter's tolerant [`json_repair`] recovery stage.

pub mod form_parse_adapter;
pub mod json_repair;
pub mod model_runtime;
pub mod ocr_adapter;

pub use form_parse_adapter::FormParseAdapter;
pub use model_runtime::{FixtureModelRuntime, ModelRuntime, OcrDetection, OcrResult, UnavailableModelRuntime};
pub use ocr_adapter::OcrAdapter;
