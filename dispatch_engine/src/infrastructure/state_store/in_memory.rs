// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # In-Memory Job State Store
//!
//! `dashmap`-backed default store. Records do not survive a process
//! restart - this is the deliberate Open Question resolution recorded in
//! SPEC_FULL.md §9 (choice (b): in-process map).

use async_trait::async_trait;
use dashmap::DashMap;
use dispatch_domain::entities::JobRecord;
use dispatch_domain::services::JobStateStore;
use dispatch_domain::value_objects::JobId;
use dispatch_domain::DispatchError;

/// Sharded concurrent hash map keyed by job id. `put`/`get` are each a
/// single shard operation, so the atomicity guarantee spec §4.A requires
/// (no reader ever observes a torn write) holds without any extra locking.
#[derive(Default)]
pub struct InMemoryJobStateStore {
    records: DashMap<JobId, JobRecord>,
}

impl InMemoryJobStateStore {
    pub fn new() -> Self {
        Self { records: DashMap::new() }
    }
}

#[async_trait]
impl JobStateStore for InMemoryJobStateStore {
    async fn put(&self, record: JobRecord) -> Result<(), DispatchError> {
        self.records.insert(record.id, record);
        Ok(())
    }

    async fn get(&self, id: JobId) -> Result<Option<JobRecord>, DispatchError> {
        Ok(self.records.get(&id).map(|entry| entry.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = InMemoryJobStateStore::new();
        let id = JobId::new();
        let record = JobRecord::pending(id, Utc::now());
        store.put(record.clone()).await.unwrap();

        let fetched = store.get(id).await.unwrap().unwrap();
        assert_eq!(fetched.id, id);
        assert_eq!(fetched.status, record.status);
    }

    #[tokio::test]
    async fn unknown_id_returns_none_not_an_error() {
        let store = InMemoryJobStateStore::new();
        assert!(store.get(JobId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_overwrites_last_writer_wins() {
        let store = InMemoryJobStateStore::new();
        let id = JobId::new();
        let mut record = JobRecord::pending(id, Utc::now());
        store.put(record.clone()).await.unwrap();

        record.set_progress(42);
        store.put(record).await.unwrap();

        let fetched = store.get(id).await.unwrap().unwrap();
        assert_eq!(fetched.progress, 42);
    }
}
