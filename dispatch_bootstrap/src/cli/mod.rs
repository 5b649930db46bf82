// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface Module
//!
//! Bootstrap-layer CLI handling.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  1. parser::parse_cli()             │  Parse CLI with clap
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  2. validator::validate()           │  Range/shape validation
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  3. ValidatedCli                    │  Safe, validated command
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `parser` - CLI structure and clap parsing
//! - `validator` - Range/shape validation layer

pub mod parser;
pub mod validator;

pub use parser::{parse_cli, Cli, Commands};
pub use validator::{ParseError, SecureArgParser};

use crate::config::{ConfigOverrides, DeployedEngine};
use std::path::PathBuf;

/// Validated CLI configuration
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub command: ValidatedCommand,
    pub verbose: bool,
    pub config_file: Option<PathBuf>,
}

/// Validated command variants
#[derive(Debug, Clone)]
pub enum ValidatedCommand {
    Serve { overrides: ConfigOverrides },
    ValidateConfig { config: PathBuf },
}

/// Parse and validate CLI arguments: parse with clap, then range/shape-check
/// every value before it becomes a [`ConfigOverrides`].
///
/// # Errors
///
/// Returns [`ParseError`] if any value fails validation.
pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    let cli = parse_cli();
    validate_cli(cli)
}

fn validate_cli(cli: Cli) -> Result<ValidatedCli, ParseError> {
    if let Some(ref path) = cli.config {
        SecureArgParser::validate_argument(&path.to_string_lossy())?;
    }

    let command = match cli.command {
        Commands::Serve {
            bind_addr,
            deployed_engine,
            max_workers_ocr,
            max_workers_form,
            gpu_max_concurrent,
            gpu_memory_threshold_gib,
            gpu_acquire_timeout_s,
            state_store_url,
        } => {
            let deployed_engine = deployed_engine
                .map(|value| SecureArgParser::validate_deployed_engine(&value))
                .transpose()?
                .map(|value| match value.as_str() {
                    "ocr" => DeployedEngine::Ocr,
                    "form_parse" => DeployedEngine::FormParse,
                    _ => DeployedEngine::Both,
                });

            let max_workers_ocr = max_workers_ocr
                .map(|value| SecureArgParser::validate_worker_count("max-workers-ocr", value))
                .transpose()?;
            let max_workers_form = max_workers_form
                .map(|value| SecureArgParser::validate_worker_count("max-workers-form", value))
                .transpose()?;
            let gpu_memory_threshold_gib = gpu_memory_threshold_gib
                .map(SecureArgParser::validate_memory_threshold)
                .transpose()?;

            if let Some(ref url) = state_store_url {
                SecureArgParser::validate_argument(url)?;
            }

            ValidatedCommand::Serve {
                overrides: ConfigOverrides {
                    bind_addr,
                    deployed_engine,
                    max_workers_ocr,
                    max_workers_form,
                    gpu_max_concurrent,
                    gpu_memory_threshold_gib,
                    gpu_acquire_timeout_s,
                    state_store_url,
                    ..Default::default()
                },
            }
        }
        Commands::ValidateConfig { config } => {
            SecureArgParser::validate_argument(&config.to_string_lossy())?;
            ValidatedCommand::ValidateConfig { config }
        }
    };

    Ok(ValidatedCli {
        command,
        verbose: cli.verbose,
        config_file: cli.config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_with_no_flags_validates() {
        let cli = Cli {
            command: Commands::Serve {
                bind_addr: None,
                deployed_engine: None,
                max_workers_ocr: None,
                max_workers_form: None,
                gpu_max_concurrent: None,
                gpu_memory_threshold_gib: None,
                gpu_acquire_timeout_s: None,
                state_store_url: None,
            },
            verbose: false,
            config: None,
        };
        assert!(validate_cli(cli).is_ok());
    }

    #[test]
    fn serve_rejects_bad_deployed_engine() {
        let cli = Cli {
            command: Commands::Serve {
                bind_addr: None,
                deployed_engine: Some("bogus".to_string()),
                max_workers_ocr: None,
                max_workers_form: None,
                gpu_max_concurrent: None,
                gpu_memory_threshold_gib: None,
                gpu_acquire_timeout_s: None,
                state_store_url: None,
            },
            verbose: false,
            config: None,
        };
        assert!(validate_cli(cli).is_err());
    }

    #[test]
    fn serve_rejects_zero_workers() {
        let cli = Cli {
            command: Commands::Serve {
                bind_addr: None,
                deployed_engine: None,
                max_workers_ocr: Some(0),
                max_workers_form: None,
                gpu_max_concurrent: None,
                gpu_memory_threshold_gib: None,
                gpu_acquire_timeout_s: None,
                state_store_url: None,
            },
            verbose: false,
            config: None,
        };
        assert!(validate_cli(cli).is_err());
    }
}
