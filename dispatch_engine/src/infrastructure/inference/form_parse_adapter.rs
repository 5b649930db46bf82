// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Form-Parse Inference Adapter
//!
//! Build a prompt (the submitted `llm_prompt`, or the configured default),
//! run the vision-language [`ModelRuntime`] step, and repair its JSON
//! output via [`super::json_repair::repair`]. Progress only ever moves
//! `pending -> 1 -> 100` (spec §4.D) - there is no sub-step to report.

use super::json_repair;
use super::model_runtime::ModelRuntime;
use async_trait::async_trait;
use dispatch_domain::entities::{JobDescriptor, JobParameters};
use dispatch_domain::services::{InferenceAdapter, ProgressReporter};
use dispatch_domain::DispatchError;
use std::sync::Arc;

pub struct FormParseAdapter {
    runtime: Arc<dyn ModelRuntime>,
    default_prompt: String,
}

impl FormParseAdapter {
    pub fn new(runtime: Arc<dyn ModelRuntime>, default_prompt: impl Into<String>) -> Self {
        Self { runtime, default_prompt: default_prompt.into() }
    }

    /// Collapse a submitted prompt the way the HTTP adapter's upstream
    /// original service did: trim, fold internal whitespace (including
    /// newlines) to single spaces, and drop lines that are empty after
    /// trimming.
    fn collapse_whitespace(raw: &str) -> String {
        raw.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl InferenceAdapter for FormParseAdapter {
    async fn run(&self, job: &JobDescriptor, _progress: ProgressReporter) -> Result<serde_json::Value, DispatchError> {
        let llm_prompt = match &job.parameters {
            JobParameters::FormParse { llm_prompt } => llm_prompt.clone(),
            JobParameters::Ocr => {
                return Err(DispatchError::Internal(
                    "form-parse adapter invoked with non-form-parse job parameters".to_string(),
                ))
            }
        };

        let prompt = match llm_prompt.as_deref().map(Self::collapse_whitespace) {
            Some(collapsed) if !collapsed.is_empty() => collapsed,
            _ => self.default_prompt.clone(),
        };

        let runtime = self.runtime.clone();
        let payload = job.payload.clone();

        let raw = tokio::task::spawn_blocking(move || runtime.generate_form_json(&payload, &prompt))
            .await
            .map_err(|e| DispatchError::Internal(format!("form-parse worker task panicked: {e}")))??;

        Ok(json_repair::repair(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::inference::model_runtime::FixtureModelRuntime;
    use bytes::Bytes;
    use dispatch_domain::value_objects::{JobKind, Priority};

    fn job(llm_prompt: Option<String>) -> JobDescriptor {
        JobDescriptor {
            id: dispatch_domain::JobId::new(),
            kind: JobKind::FormParse,
            filename: "form.png".to_string(),
            payload: Bytes::from_static(b"fake-form-png"),
            parameters: JobParameters::FormParse { llm_prompt },
            submitted_at: chrono::Utc::now(),
            priority: Priority::Normal,
        }
    }

    #[test]
    fn collapses_multiline_prompt_to_single_spaces() {
        let collapsed = FormParseAdapter::collapse_whitespace("  line one\n   line two\n");
        assert_eq!(collapsed, "line one line two");
    }

    #[tokio::test]
    async fn repairs_generated_json_into_an_object() {
        let runtime = Arc::new(FixtureModelRuntime::new(
            vec![],
            "```json\n{\"patient_name\": \"Jane Doe\"}\n```",
        ));
        let adapter = FormParseAdapter::new(runtime, "default prompt");
        let progress: ProgressReporter = Arc::new(|_| {});

        let result = adapter.run(&job(None), progress).await.unwrap();
        assert_eq!(result["patient_name"], "Jane Doe");
    }

    #[tokio::test]
    async fn blank_prompt_falls_back_to_default() {
        let runtime = Arc::new(FixtureModelRuntime::new(vec![], "{}"));
        let adapter = FormParseAdapter::new(runtime, "the default prompt");
        let progress: ProgressReporter = Arc::new(|_| {});

        // The fixture doesn't observe which prompt it received, but this
        // exercises the blank-prompt-defaults-out path without panicking.
        let result = adapter.run(&job(Some("   \n  ".to_string())), progress).await;
        assert!(result.is_ok());
    }
}
