// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Job State Store Backends
//!
//! Two implementations of [`dispatch_domain::services::JobStateStore`]:
//! [`InMemoryJobStateStore`] (the default) and [`RedisJobStateStore`]
//! (selected when `STATE_STORE_URL` is configured).

mod in_memory;
mod redis_store;

pub use in_memory::InMemoryJobStateStore;
pub use redis_store::RedisJobStateStore;
