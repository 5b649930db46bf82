// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # OCR Inference Adapter
//!
//! Detect text regions, running each detection's discovery through a
//! progress callback (spec §4.D: "for OCR, the adapter exposes a mid-job
//! progress callback per detected sub-region"). Runs the [`ModelRuntime`]
//! call inside `spawn_blocking` so a long detection pass can't stall the
//! worker's async scheduler.

use super::model_runtime::ModelRuntime;
use async_trait::async_trait;
use dispatch_domain::entities::{JobDescriptor, JobParameters};
use dispatch_domain::services::{InferenceAdapter, ProgressReporter};
use dispatch_domain::DispatchError;
use std::sync::{Arc, Mutex};
use std::time::Instant;

pub struct OcrAdapter {
    runtime: Arc<dyn ModelRuntime>,
}

impl OcrAdapter {
    pub fn new(runtime: Arc<dyn ModelRuntime>) -> Self {
        Self { runtime }
    }
}

#[async_trait]
impl InferenceAdapter for OcrAdapter {
    async fn run(&self, job: &JobDescriptor, progress: ProgressReporter) -> Result<serde_json::Value, DispatchError> {
        if !matches!(job.parameters, JobParameters::Ocr) {
            return Err(DispatchError::Internal("ocr adapter invoked with non-ocr job parameters".to_string()));
        }

        let runtime = self.runtime.clone();
        let payload = job.payload.clone();
        let started = Instant::now();

        // The detection count isn't known up front, so progress is scaled
        // against an expected-region estimate rather than a true fraction;
        // the last detection always pins progress to 99, leaving 100 for
        // the worker's own `complete` write.
        let reported = Arc::new(Mutex::new(0u8));
        let reported_for_closure = reported.clone();
        let progress_for_closure = progress.clone();

        let result = tokio::task::spawn_blocking(move || {
            let mut on_region = move |_detection: &super::model_runtime::OcrDetection| {
                let mut guard = reported_for_closure.lock().unwrap();
                *guard = (*guard + 10).min(99);
                progress_for_closure(*guard);
            };
            runtime.detect_text_regions(&payload, &mut on_region)
        })
        .await
        .map_err(|e| DispatchError::Internal(format!("ocr worker task panicked: {e}")))??;

        let elapsed_ms = started.elapsed().as_millis() as u64;

        Ok(serde_json::json!({
            "detections": result.detections,
            "total_detections": result.detections.len(),
            "image_width": result.image_width,
            "image_height": result.image_height,
            "filename": job.filename,
            "elapsed_ms": elapsed_ms,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::inference::model_runtime::FixtureModelRuntime;
    use bytes::Bytes;
    use dispatch_domain::value_objects::{JobKind, Priority};
    use std::sync::Mutex;

    fn job(payload: Bytes) -> JobDescriptor {
        JobDescriptor {
            id: dispatch_domain::JobId::new(),
            kind: JobKind::Ocr,
            filename: "hello.png".to_string(),
            payload,
            parameters: JobParameters::Ocr,
            submitted_at: chrono::Utc::now(),
            priority: Priority::Normal,
        }
    }

    #[tokio::test]
    async fn single_word_image_yields_one_detection() {
        let adapter = OcrAdapter::new(Arc::new(FixtureModelRuntime::single_word("HELLO")));
        let job = job(Bytes::from_static(b"fake-100x100-png"));
        let reports: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
        let reports_clone = reports.clone();
        let progress: ProgressReporter = Arc::new(move |p| reports_clone.lock().unwrap().push(p));

        let result = adapter.run(&job, progress).await.unwrap();
        assert_eq!(result["total_detections"], 1);
        assert_eq!(result["detections"][0]["text"], "HELLO");
        assert!(!reports.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_payload_surfaces_invalid_image() {
        let adapter = OcrAdapter::new(Arc::new(FixtureModelRuntime::single_word("HELLO")));
        let job = job(Bytes::new());
        let progress: ProgressReporter = Arc::new(|_| {});

        let err = adapter.run(&job, progress).await.unwrap_err();
        assert!(matches!(err, DispatchError::InvalidImage(_)));
    }
}
