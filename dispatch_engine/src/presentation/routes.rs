// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Route Wiring
//!
//! spec.md §6's HTTP table, mounted over [`AppState`]. `<kind>` is `ocr` or
//! `parse`, resolved to [`JobKind`] by [`JobKind::from_str`] at the top of
//! every handler - an unrecognised kind is a [`DispatchError::Validation`],
//! which [`ApiError`] turns into a 400 the same way a bad extension would.

use super::dto::{
    ApiInfoResponse, GpuMemoryDto, GpuStatusResponse, HealthResponse, QueueDepthDto, QueueStatusResponse,
    StatusResponse, SubmitResponse,
};
use super::error::ApiError;
use super::state::AppState;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use dispatch_domain::entities::JobParameters;
use dispatch_domain::value_objects::{JobKind, Priority};
use dispatch_domain::{DispatchError, JobId};
use std::str::FromStr;
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    let max_body = state.validation_max_body_bytes();

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/gpu/status", get(gpu_status))
        .route("/{kind}", post(submit_normal))
        .route("/{kind}/priority", post(submit_priority))
        .route("/{kind}/status/{job_id}", get(status))
        .route("/{kind}/queue/status", get(queue_status))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn root(State(state): State<AppState>) -> Json<ApiInfoResponse> {
    let deployed_engine = match state.deployed_engine {
        dispatch_bootstrap::config::DeployedEngine::Ocr => "ocr",
        dispatch_bootstrap::config::DeployedEngine::FormParse => "form_parse",
        dispatch_bootstrap::config::DeployedEngine::Both => "both",
    };
    Json(ApiInfoResponse {
        name: "dispatch-engine",
        version: env!("CARGO_PKG_VERSION"),
        deployed_engine: deployed_engine.to_string(),
    })
}

/// Prometheus text-exposition scrape target. Not part of spec.md's HTTP
/// table - an ambient endpoint matching SPEC_FULL.md §6's logging/metrics
/// stack requirement.
async fn metrics(State(state): State<AppState>) -> Result<String, ApiError> {
    state.metrics.export().map_err(ApiError::from)
}

async fn gpu_status(State(state): State<AppState>) -> Json<GpuStatusResponse> {
    let stats = state.service.gpu_status().await;
    Json(GpuStatusResponse {
        capacity: stats.capacity,
        active_holders: stats.active_holders,
        holder_ids: stats.holder_ids.iter().map(|h| h.to_string()).collect(),
        gpu_memory: stats.memory_info.map(|info| GpuMemoryDto {
            allocated_gib: info.allocated_gib,
            reserved_gib: info.reserved_gib,
            total_gib: info.total_gib,
            free_gib: info.free_gib(),
        }),
    })
}

async fn submit_normal(
    state: State<AppState>,
    path: Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    submit(state, path, Priority::Normal, multipart).await
}

async fn submit_priority(
    state: State<AppState>,
    path: Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    submit(state, path, Priority::High, multipart).await
}

/// Parse the multipart upload, validate it, and hand it to
/// [`DispatchService::submit_job`]. Shared by `/<kind>` and
/// `/<kind>/priority`; only `priority` differs between the two routes.
async fn submit(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    priority: Priority,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let kind = JobKind::from_str(&kind)?;

    let mut filename: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut payload: Option<Bytes> = None;
    let mut llm_prompt: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DispatchError::Validation(format!("malformed multipart upload: {e}")))?
    {
        match field.name() {
            Some("file") => {
                filename = field.file_name().map(str::to_string);
                content_type = field.content_type().map(str::to_string);
                payload = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| DispatchError::Validation(format!("failed to read uploaded file: {e}")))?,
                );
            }
            Some("llm_prompt") if kind == JobKind::FormParse => {
                llm_prompt = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| DispatchError::Validation(format!("failed to read llm_prompt: {e}")))?,
                );
            }
            _ => {}
        }
    }

    let filename = filename.ok_or_else(|| DispatchError::Validation("missing required 'file' field".to_string()))?;
    let payload = payload.ok_or_else(|| DispatchError::Validation("missing required 'file' field".to_string()))?;

    state.validation.validate(&filename, content_type.as_deref(), payload.len() as u64)?;

    let parameters = match kind {
        JobKind::Ocr => JobParameters::Ocr,
        JobKind::FormParse => JobParameters::FormParse { llm_prompt },
    };

    let job_id = state.service.submit_job(kind, filename, payload, parameters, priority).await?;

    Ok((
        StatusCode::OK,
        Json(SubmitResponse { success: true, job_id, message: "job submitted".to_string() }),
    ))
}

async fn status(
    State(state): State<AppState>,
    Path((kind, job_id)): Path<(String, String)>,
) -> Result<Json<StatusResponse>, ApiError> {
    JobKind::from_str(&kind)?;
    let job_id = JobId::from_str(&job_id).map_err(|_| DispatchError::NotFound)?;
    let record = state.service.get_status(job_id).await?.ok_or(DispatchError::NotFound)?;
    Ok(Json(StatusResponse::from_record(&record)))
}

async fn queue_status(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<QueueStatusResponse>, ApiError> {
    let kind = JobKind::from_str(&kind)?;
    let pool_status = state.service.queue_status(kind);
    Ok(Json(QueueStatusResponse {
        queue_depth: QueueDepthDto { normal: pool_status.depth.normal, priority: pool_status.depth.priority },
        active_jobs: pool_status.active_jobs,
        worker_count: pool_status.worker_count,
    }))
}
