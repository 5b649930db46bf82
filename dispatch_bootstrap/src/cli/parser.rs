// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CLI Parser
//!
//! Command-line interface parsing using clap.
//!
//! This module defines the CLI structure and handles argument parsing.
//! Security validation happens in the validator module after parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI structure
#[derive(Parser, Debug, Clone)]
#[command(name = "dispatch-engine")]
#[command(about = concat!("GPU job-dispatch engine v", env!("CARGO_PKG_VERSION")))]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose (debug-level) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path (TOML or YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the HTTP server and worker pools
    Serve {
        /// Address to bind the HTTP adapter to
        #[arg(long, env = "APP_BIND_ADDR")]
        bind_addr: Option<String>,

        /// Which model engine(s) are actually loaded: ocr, form_parse, both
        #[arg(long, env = "DEPLOYED_ENGINE")]
        deployed_engine: Option<String>,

        /// OCR worker pool size
        #[arg(long, env = "MAX_WORKERS_OCR")]
        max_workers_ocr: Option<usize>,

        /// Form-parse worker pool size
        #[arg(long, env = "MAX_WORKERS_FORM")]
        max_workers_form: Option<usize>,

        /// Maximum simultaneous GPU admission leases
        #[arg(long, env = "GPU_MAX_CONCURRENT")]
        gpu_max_concurrent: Option<usize>,

        /// GPU memory threshold, in GiB, above which admission is refused
        #[arg(long, env = "GPU_MEMORY_THRESHOLD_GIB")]
        gpu_memory_threshold_gib: Option<f64>,

        /// Seconds a worker waits for GPU admission before failing the job
        #[arg(long, env = "GPU_ACQUIRE_TIMEOUT_S")]
        gpu_acquire_timeout_s: Option<u64>,

        /// Job-state store backend URL (Redis). Omit for the in-memory store
        #[arg(long, env = "STATE_STORE_URL")]
        state_store_url: Option<String>,
    },

    /// Validate a configuration file without starting the server
    ValidateConfig {
        /// Configuration file to validate
        config: PathBuf,
    },
}

/// Parse CLI arguments.
///
/// # Panics
///
/// Clap will exit the process with an appropriate error message if parsing
/// fails, or print help/version text and exit for `--help`/`--version`.
pub fn parse_cli() -> Cli {
    Cli::parse()
}
