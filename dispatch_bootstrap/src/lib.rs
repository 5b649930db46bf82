// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # Bootstrap Module
//!
//! The bootstrap module sits **outside** the enterprise application layers
//! (domain, application, infrastructure) and provides:
//!
//! - **Entry point** - Application lifecycle management
//! - **Signal handling** - Graceful shutdown (SIGTERM, SIGINT, SIGHUP)
//! - **Argument parsing** - CLI argument validation
//! - **Configuration** - Layered config resolution (defaults/file/env/CLI)
//! - **Error handling** - Unix exit code mapping
//! - **Async coordination** - Shutdown coordination and cancellation
//!
//! ## Architecture Position
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │          BOOTSTRAP (This Module)            │
//! │  - Entry Point                              │
//! │  - Signal Handling                          │
//! │  - CLI + Configuration                      │
//! └─────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────┐
//! │         APPLICATION LAYER                   │
//! │  - Dispatch service, worker pools            │
//! └─────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────┐
//! │           DOMAIN LAYER                      │
//! │  - Job records, ports, DispatchError         │
//! └─────────────────────────────────────────────┘
//!                      ▲
//!                      │
//! ┌─────────────────────────────────────────────┐
//! │       INFRASTRUCTURE LAYER                  │
//! │  - GPU admission, queue, state store, HTTP  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - `signals` - Signal handling (SIGTERM, SIGINT, SIGHUP)
//! - `cli` - Argument parsing
//! - `config` - Application configuration
//! - `exit_code` - Unix exit code enumeration
//! - `shutdown` - Shutdown coordination

pub mod cli;
pub mod config;
pub mod exit_code;
pub mod shutdown;
pub mod signals;

pub use cli::{parse_and_validate, ValidatedCli, ValidatedCommand};
pub use config::AppConfig;
pub use exit_code::ExitCode;

/// Parse and validate CLI arguments. Main entry point for the bootstrap
/// layer; the caller resolves the validated command into an [`AppConfig`]
/// via [`config::load_with_cli_overrides`] and maps its own result to an
/// exit code with [`exit_code::result_to_exit_code`].
pub fn bootstrap_cli() -> Result<ValidatedCli, cli::ParseError> {
    cli::parse_and_validate()
}
