// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Dispatch Metrics
//!
//! Prometheus-based observability for the dispatch engine: queue depths,
//! GPU holder occupancy, and job outcome counters. Advisory only - nothing
//! here feeds back into dispatch decisions.

use dispatch_domain::DispatchError;
use prometheus::{IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry};
use std::sync::Arc;

/// Thread-safe handle to the process's Prometheus registry and the
/// counters/gauges the dispatcher updates as jobs move through it.
#[derive(Clone)]
pub struct DispatchMetrics {
    registry: Arc<Registry>,
    queue_depth: IntGaugeVec,
    active_holders: IntGauge,
    jobs_completed_total: IntCounterVec,
    jobs_failed_total: IntCounterVec,
}

impl DispatchMetrics {
    pub fn new() -> Result<Self, DispatchError> {
        let registry = Registry::new();

        let queue_depth = IntGaugeVec::new(
            Opts::new("dispatch_queue_depth", "Number of queued jobs by kind and lane").namespace("dispatch"),
            &["kind", "lane"],
        )
        .map_err(|e| DispatchError::Internal(format!("failed to create queue_depth metric: {e}")))?;

        let active_holders = IntGauge::with_opts(
            Opts::new("dispatch_gpu_active_holders", "Current GPU admission holders").namespace("dispatch"),
        )
        .map_err(|e| DispatchError::Internal(format!("failed to create active_holders metric: {e}")))?;

        let jobs_completed_total = IntCounterVec::new(
            Opts::new("dispatch_jobs_completed_total", "Total jobs that reached status=completed").namespace("dispatch"),
            &["kind"],
        )
        .map_err(|e| DispatchError::Internal(format!("failed to create jobs_completed_total metric: {e}")))?;

        let jobs_failed_total = IntCounterVec::new(
            Opts::new("dispatch_jobs_failed_total", "Total jobs that reached status=error").namespace("dispatch"),
            &["kind"],
        )
        .map_err(|e| DispatchError::Internal(format!("failed to create jobs_failed_total metric: {e}")))?;

        registry
            .register(Box::new(queue_depth.clone()))
            .map_err(|e| DispatchError::Internal(format!("failed to register queue_depth metric: {e}")))?;
        registry
            .register(Box::new(active_holders.clone()))
            .map_err(|e| DispatchError::Internal(format!("failed to register active_holders metric: {e}")))?;
        registry
            .register(Box::new(jobs_completed_total.clone()))
            .map_err(|e| DispatchError::Internal(format!("failed to register jobs_completed_total metric: {e}")))?;
        registry
            .register(Box::new(jobs_failed_total.clone()))
            .map_err(|e| DispatchError::Internal(format!("failed to register jobs_failed_total metric: {e}")))?;

        Ok(Self { registry: Arc::new(registry), queue_depth, active_holders, jobs_completed_total, jobs_failed_total })
    }

    pub fn record_queue_depth(&self, kind: &str, normal: usize, priority: usize) {
        self.queue_depth.with_label_values(&[kind, "normal"]).set(normal as i64);
        self.queue_depth.with_label_values(&[kind, "priority"]).set(priority as i64);
    }

    pub fn record_active_holders(&self, count: usize) {
        self.active_holders.set(count as i64);
    }

    pub fn record_job_completed(&self, kind: &str) {
        self.jobs_completed_total.with_label_values(&[kind]).inc();
    }

    pub fn record_job_failed(&self, kind: &str) {
        self.jobs_failed_total.with_label_values(&[kind]).inc();
    }

    /// Render the current state of every registered metric in the text
    /// exposition format, for a `/metrics` scrape.
    pub fn export(&self) -> Result<String, DispatchError> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| DispatchError::Internal(format!("failed to encode metrics: {e}")))?;
        String::from_utf8(buffer).map_err(|e| DispatchError::Internal(format!("metrics output was not utf8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_includes_registered_metric_names() {
        let metrics = DispatchMetrics::new().unwrap();
        metrics.record_queue_depth("ocr", 3, 1);
        metrics.record_active_holders(1);
        metrics.record_job_completed("ocr");
        metrics.record_job_failed("form_parse");

        let text = metrics.export().unwrap();
        assert!(text.contains("dispatch_queue_depth"));
        assert!(text.contains("dispatch_gpu_active_holders"));
        assert!(text.contains("dispatch_jobs_completed_total"));
        assert!(text.contains("dispatch_jobs_failed_total"));
    }
}
