// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Secure Command-Line Argument Validation
//!
//! Range and pattern validation applied to parsed CLI values before they
//! become [`ConfigOverrides`](crate::config::ConfigOverrides).

use thiserror::Error;

/// Maximum single argument length (prevents degenerate inputs, not an
/// attack surface concern for a server CLI, but cheap to keep).
const MAX_ARG_LENGTH: usize = 1000;

/// CLI validation errors
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("argument too long (max {MAX_ARG_LENGTH} characters): {0}")]
    ArgumentTooLong(String),

    #[error("invalid argument value for {arg}: {reason}")]
    InvalidValue { arg: String, reason: String },
}

/// Secure argument parser: range and shape validation for CLI values.
pub struct SecureArgParser;

impl SecureArgParser {
    /// Validate a single argument's length.
    pub fn validate_argument(arg: &str) -> Result<(), ParseError> {
        if arg.len() > MAX_ARG_LENGTH {
            return Err(ParseError::ArgumentTooLong(arg.chars().take(50).collect::<String>() + "..."));
        }
        Ok(())
    }

    /// Validate a worker-count-style argument: nonzero and below a sane cap.
    pub fn validate_worker_count(arg_name: &str, value: usize) -> Result<usize, ParseError> {
        if value == 0 || value > 128 {
            return Err(ParseError::InvalidValue {
                arg: arg_name.to_string(),
                reason: "must be between 1 and 128".to_string(),
            });
        }
        Ok(value)
    }

    /// Validate the `deployed_engine` CLI string against its known values.
    pub fn validate_deployed_engine(value: &str) -> Result<String, ParseError> {
        match value.to_lowercase().as_str() {
            "ocr" | "form_parse" | "both" => Ok(value.to_lowercase()),
            _ => Err(ParseError::InvalidValue {
                arg: "deployed-engine".to_string(),
                reason: format!("must be one of ocr, form_parse, both (got '{value}')"),
            }),
        }
    }

    /// Validate a GPU memory threshold in GiB.
    pub fn validate_memory_threshold(value: f64) -> Result<f64, ParseError> {
        if value <= 0.0 || value > 1024.0 {
            return Err(ParseError::InvalidValue {
                arg: "gpu-memory-threshold-gib".to_string(),
                reason: "must be between 0 and 1024".to_string(),
            });
        }
        Ok(value)
    }
}
