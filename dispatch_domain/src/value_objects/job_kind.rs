// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The two job kinds this dispatcher accepts, each with its own worker pool
//! and inference adapter but sharing one GPU admission controller.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which inference workload a job descriptor carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Text-region detection + transformer OCR.
    Ocr,
    /// Vision-language prompt -> JSON extraction.
    FormParse,
}

impl JobKind {
    /// The HTTP path segment this kind is addressed by (`ocr` / `parse`).
    pub fn path_segment(self) -> &'static str {
        match self {
            JobKind::Ocr => "ocr",
            JobKind::FormParse => "parse",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Ocr => write!(f, "ocr"),
            JobKind::FormParse => write!(f, "form_parse"),
        }
    }
}

impl FromStr for JobKind {
    type Err = crate::DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ocr" => Ok(JobKind::Ocr),
            "parse" | "form_parse" => Ok(JobKind::FormParse),
            other => Err(crate::DispatchError::Validation(format!("unknown job kind: {other}"))),
        }
    }
}
