// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Dispatch Engine Entry Point
//!
//! Wires the bootstrap layer's CLI/config/signal handling to the
//! application and infrastructure layers: parses arguments, resolves
//! configuration, builds the job-state store / GPU admission controller /
//! worker pools / HTTP router, then serves until a shutdown signal arrives.

use dispatch_bootstrap::config::{self, AppConfig, ConfigOverrides};
use dispatch_bootstrap::shutdown::ShutdownCoordinator;
use dispatch_bootstrap::{signals, ValidatedCommand};
use dispatch_domain::services::{GpuAdmissionController, JobStateStore};
use dispatch_domain::DispatchError;
use dispatch_engine::infrastructure::{
    FixtureModelRuntime, FormParseAdapter, GpuAdmissionControllerImpl, InMemoryJobStateStore, NoGpuMemorySource,
    OcrAdapter, RedisJobStateStore, SharedDeps, UnavailableModelRuntime, WorkerPool,
};
use dispatch_engine::presentation::{build_router, AppState, UploadValidationConfig};
use dispatch_engine::{infrastructure, DispatchService};
use dispatch_domain::services::InferenceAdapter;
use dispatch_domain::value_objects::JobKind;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = match dispatch_bootstrap::bootstrap_cli() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("argument error: {err}");
            return std::process::ExitCode::from(dispatch_bootstrap::ExitCode::UsageError.as_i32() as u8);
        }
    };

    dispatch_engine::infrastructure::logging::init(cli.verbose);

    let result = match cli.command {
        ValidatedCommand::ValidateConfig { config: path } => validate_config(&path),
        ValidatedCommand::Serve { overrides } => run_server(cli.config_file.as_ref(), overrides).await,
    };

    match result {
        Ok(()) => std::process::ExitCode::from(dispatch_bootstrap::ExitCode::Success.as_i32() as u8),
        Err(err) => {
            let code = dispatch_bootstrap::ExitCode::from_dispatch_error(&err);
            tracing::error!(error = %err, "fatal error, exiting with {code}");
            std::process::ExitCode::from(code.as_i32() as u8)
        }
    }
}

fn validate_config(path: &std::path::PathBuf) -> Result<(), DispatchError> {
    config::load(Some(path)).map_err(|e| DispatchError::Validation(e.to_string()))?;
    println!("configuration file {} is valid", path.display());
    Ok(())
}

async fn run_server(
    config_file: Option<&std::path::PathBuf>,
    overrides: ConfigOverrides,
) -> Result<(), DispatchError> {
    let config = config::load_with_cli_overrides(config_file, overrides)
        .map_err(|e| DispatchError::Validation(e.to_string()))?;

    tracing::info!(bind_addr = %config.bind_addr, deployed_engine = ?config.deployed_engine, "starting dispatch engine");

    let state_store: Arc<dyn JobStateStore> = match &config.state_store_url {
        Some(url) => {
            tracing::info!("connecting to Redis job-state store");
            Arc::new(RedisJobStateStore::connect(url).await?)
        }
        None => {
            tracing::info!("using in-memory job-state store");
            Arc::new(InMemoryJobStateStore::new())
        }
    };

    let gpu: Arc<dyn GpuAdmissionController> = Arc::new(GpuAdmissionControllerImpl::new(
        config.gpu_max_concurrent,
        config.gpu_memory_threshold_gib,
        Arc::new(NoGpuMemorySource),
    ));

    let metrics = Arc::new(infrastructure::DispatchMetrics::new()?);

    let (ocr_runtime, form_runtime) = model_runtimes(&config);
    let ocr_adapter: Arc<dyn InferenceAdapter> = Arc::new(OcrAdapter::new(ocr_runtime));
    let form_adapter: Arc<dyn InferenceAdapter> =
        Arc::new(FormParseAdapter::new(form_runtime, config.default_form_prompt.clone()));

    let ocr_pool = WorkerPool::new(
        config.max_workers_ocr,
        Arc::new(SharedDeps {
            service_name: "ocr",
            state_store: state_store.clone(),
            gpu: gpu.clone(),
            adapter: ocr_adapter,
            gpu_acquire_timeout: config.gpu_acquire_timeout(),
            metrics: metrics.clone(),
        }),
    );
    let form_pool = WorkerPool::new(
        config.max_workers_form,
        Arc::new(SharedDeps {
            service_name: "form_parse",
            state_store: state_store.clone(),
            gpu: gpu.clone(),
            adapter: form_adapter,
            gpu_acquire_timeout: config.gpu_acquire_timeout(),
            metrics: metrics.clone(),
        }),
    );

    let service = Arc::new(DispatchService::new(state_store, gpu, ocr_pool, form_pool));

    let validation = Arc::new(UploadValidationConfig::new(
        config.allowed_extensions.clone(),
        config.allowed_mime_types.clone(),
        config.max_file_size_bytes,
    ));

    let app_state = AppState {
        service: service.clone(),
        validation,
        metrics: metrics.clone(),
        deployed_engine: config.deployed_engine,
    };

    let router = build_router(app_state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .map_err(|e| DispatchError::Internal(format!("failed to bind {}: {e}", config.bind_addr)))?;
    tracing::info!(addr = %config.bind_addr, "HTTP adapter listening");

    let coordinator = ShutdownCoordinator::default();
    let gauge_task = tokio::spawn(gauge_updater(service.clone(), metrics.clone(), coordinator.token()));

    let shutdown_coordinator = coordinator.clone();
    let signal_task = tokio::spawn(async move {
        let handler = signals::create_signal_handler();
        handler
            .wait_for_signal(Box::new(move || shutdown_coordinator.initiate_shutdown()))
            .await;
    });

    let shutdown_token = coordinator.token();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown_token.cancelled().await })
        .await
        .map_err(|e| DispatchError::Internal(format!("HTTP server error: {e}")))?;

    coordinator.initiate_shutdown();
    signal_task.abort();
    gauge_task.abort();

    service.shutdown_pools();
    tracing::info!("dispatch engine shut down");
    Ok(())
}

/// Build the per-kind [`ModelRuntime`]: a real fixture runtime for the
/// deployed engine(s), [`UnavailableModelRuntime`] for the other - matching
/// SPEC_FULL.md §9's `DEPLOYED_ENGINE`-vs-two-pools resolution (both pools
/// always exist; only the backing runtime differs).
fn model_runtimes(
    config: &AppConfig,
) -> (Arc<dyn infrastructure::ModelRuntime>, Arc<dyn infrastructure::ModelRuntime>) {
    let ocr: Arc<dyn infrastructure::ModelRuntime> = if config.ocr_engine_active() {
        Arc::new(FixtureModelRuntime::single_word("SAMPLE"))
    } else {
        Arc::new(UnavailableModelRuntime { engine_name: "ocr" })
    };
    let form: Arc<dyn infrastructure::ModelRuntime> = if config.form_parse_engine_active() {
        Arc::new(FixtureModelRuntime::new(Vec::new(), "{}"))
    } else {
        Arc::new(UnavailableModelRuntime { engine_name: "form_parse" })
    };
    (ocr, form)
}

/// Periodically refreshes the queue-depth and GPU-holder gauges that nothing
/// else in the request path touches, so `/metrics` stays current between
/// scrapes even on an idle dispatcher.
async fn gauge_updater(
    service: Arc<DispatchService>,
    metrics: Arc<infrastructure::DispatchMetrics>,
    shutdown: dispatch_bootstrap::shutdown::CancellationToken,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(5));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                for kind in [JobKind::Ocr, JobKind::FormParse] {
                    let status = service.queue_status(kind);
                    metrics.record_queue_depth(&kind.to_string(), status.depth.normal, status.depth.priority);
                }
                let gpu_stats = service.gpu_status().await;
                metrics.record_active_holders(gpu_stats.active_holders);
            }
            _ = shutdown.cancelled() => return,
        }
    }
}
