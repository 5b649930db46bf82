// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Redis Job State Store
//!
//! Backs [`dispatch_domain::services::JobStateStore`] onto Redis via a
//! `ConnectionManager`, selected when `STATE_STORE_URL` is configured.
//! Wire shape matches the original service's `redis_job_manager.py`: a JSON
//! object with `status`, `result`, `error`, `progress` (this implementation
//! adds `id` and `submitted_at` so a record round-trips exactly) stored as
//! a plain string value keyed by job id.

use async_trait::async_trait;
use dispatch_domain::entities::{JobRecord, JobStatus};
use dispatch_domain::services::JobStateStore;
use dispatch_domain::value_objects::JobId;
use dispatch_domain::DispatchError;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

/// On-wire shape for one job record. Mirrors `redis_job_manager.py`'s
/// `set_job_status`/`get_job_status` dict, plus the two fields needed to
/// reconstruct a full [`JobRecord`].
#[derive(Debug, Serialize, Deserialize)]
struct WireRecord {
    id: JobId,
    status: JobStatus,
    result: Option<serde_json::Value>,
    error: Option<String>,
    progress: u8,
    submitted_at: chrono::DateTime<chrono::Utc>,
}

impl From<JobRecord> for WireRecord {
    fn from(record: JobRecord) -> Self {
        Self {
            id: record.id,
            status: record.status,
            result: record.result,
            error: record.error,
            progress: record.progress,
            submitted_at: record.submitted_at,
        }
    }
}

impl From<WireRecord> for JobRecord {
    fn from(wire: WireRecord) -> Self {
        JobRecord {
            id: wire.id,
            status: wire.status,
            progress: wire.progress,
            result: wire.result,
            error: wire.error,
            submitted_at: wire.submitted_at,
        }
    }
}

pub struct RedisJobStateStore {
    connection: ConnectionManager,
}

impl RedisJobStateStore {
    /// Connect to `url` (e.g. `redis://127.0.0.1:6379/0`), establishing a
    /// `ConnectionManager` that reconnects automatically on failure.
    pub async fn connect(url: &str) -> Result<Self, DispatchError> {
        let client = redis::Client::open(url).map_err(|e| DispatchError::StoreUnavailable(e.to_string()))?;
        let connection = client
            .get_connection_manager()
            .await
            .map_err(|e| DispatchError::StoreUnavailable(e.to_string()))?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl JobStateStore for RedisJobStateStore {
    async fn put(&self, record: JobRecord) -> Result<(), DispatchError> {
        let key = record.id.to_string();
        let wire = WireRecord::from(record);
        let payload = serde_json::to_string(&wire).map_err(|e| DispatchError::Internal(e.to_string()))?;
        let mut conn = self.connection.clone();
        conn.set::<_, _, ()>(key, payload)
            .await
            .map_err(|e| DispatchError::StoreUnavailable(e.to_string()))
    }

    async fn get(&self, id: JobId) -> Result<Option<JobRecord>, DispatchError> {
        let mut conn = self.connection.clone();
        let payload: Option<String> = conn
            .get(id.to_string())
            .await
            .map_err(|e| DispatchError::StoreUnavailable(e.to_string()))?;
        match payload {
            None => Ok(None),
            Some(raw) => {
                let wire: WireRecord =
                    serde_json::from_str(&raw).map_err(|e| DispatchError::Internal(e.to_string()))?;
                Ok(Some(wire.into()))
            }
        }
    }
}
