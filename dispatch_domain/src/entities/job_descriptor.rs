// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Job Descriptor
//!
//! The in-queue representation of a job: bytes plus parameters. Distinct
//! from [`crate::entities::JobRecord`], the observable state a client polls.
//! A descriptor is created at submission, consumed exactly once by a worker,
//! and dropped once the worker has written the record's terminal state.

use crate::value_objects::{JobId, JobKind, Priority};
use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Per-kind parameters carried alongside the uploaded bytes.
///
/// OCR jobs carry none today; form-parse jobs carry the optional prompt
/// override submitted via the `llm_prompt` form field (whitespace-collapsed
/// before it reaches the adapter - see the HTTP layer's submission path).
#[derive(Debug, Clone)]
pub enum JobParameters {
    Ocr,
    FormParse { llm_prompt: Option<String> },
}

/// A queued unit of work.
#[derive(Debug, Clone)]
pub struct JobDescriptor {
    /// Links back to the [`crate::entities::JobRecord`] this job updates.
    pub id: JobId,
    pub kind: JobKind,
    pub filename: String,
    pub payload: Bytes,
    pub parameters: JobParameters,
    pub submitted_at: DateTime<Utc>,
    pub priority: Priority,
}

impl JobDescriptor {
    pub fn new(
        kind: JobKind,
        filename: impl Into<String>,
        payload: Bytes,
        parameters: JobParameters,
        priority: Priority,
    ) -> Self {
        Self {
            id: JobId::new(),
            kind,
            filename: filename.into(),
            payload,
            parameters,
            submitted_at: Utc::now(),
            priority,
        }
    }
}
