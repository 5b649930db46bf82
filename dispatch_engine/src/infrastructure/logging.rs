// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Logging Initialization
//!
//! Wires `tracing-subscriber`'s `EnvFilter` to `RUST_LOG`, falling back to
//! `info` (or `debug` under `--verbose`) when unset. Called once at process
//! start, before anything else logs.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber. `verbose` raises the default
/// level to `debug` when `RUST_LOG` isn't set; an explicit `RUST_LOG`
/// always wins.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}
