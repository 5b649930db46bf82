// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Application Configuration
//!
//! Bootstrap-phase configuration structure for the dispatch engine.
//!
//! ## Design Philosophy
//!
//! `AppConfig` holds **validated** configuration after:
//! 1. Built-in defaults
//! 2. An optional config file
//! 3. Environment variables (`APP_`-prefixed)
//! 4. Command-line flags (highest precedence)
//!
//! ## Immutability
//!
//! All configuration is **immutable** after creation. This ensures thread
//! safety (no synchronization needed) and predictable behavior when shared
//! across worker tasks.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Which concrete model engine has a real runtime loaded in this process.
///
/// Both the OCR and form-parse HTTP surfaces and worker pools always exist;
/// this only selects which one is backed by a real `ModelRuntime` versus one
/// that reports `ModelUnavailable`. See DESIGN.md for the rationale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployedEngine {
    Ocr,
    FormParse,
    Both,
}

impl Default for DeployedEngine {
    fn default() -> Self {
        DeployedEngine::Both
    }
}

/// Application configuration, fully resolved before the dispatcher starts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address the HTTP adapter binds to.
    pub bind_addr: String,

    /// Which model engine(s) are actually loaded.
    pub deployed_engine: DeployedEngine,

    /// OCR worker pool size.
    pub max_workers_ocr: usize,

    /// Form-parse worker pool size.
    pub max_workers_form: usize,

    /// Maximum simultaneous GPU admission leases across both pools.
    pub gpu_max_concurrent: usize,

    /// GPU memory usage above which admission is refused, in GiB.
    pub gpu_memory_threshold_gib: f64,

    /// How long a worker waits for GPU admission before failing the job.
    pub gpu_acquire_timeout_s: u64,

    /// Upload file extensions accepted by the HTTP adapter (without the dot).
    pub allowed_extensions: Vec<String>,

    /// Upload MIME types accepted by the HTTP adapter.
    pub allowed_mime_types: Vec<String>,

    /// Maximum accepted upload size in bytes.
    pub max_file_size_bytes: u64,

    /// Job-state store backend. `None` selects the in-memory store; `Some`
    /// gives the Redis connection URL.
    pub state_store_url: Option<String>,

    /// Prompt sent to the form-parse adapter when a job doesn't supply one.
    pub default_form_prompt: String,

    /// Verbose (debug-level) logging.
    pub verbose: bool,
}

impl AppConfig {
    pub fn gpu_acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.gpu_acquire_timeout_s)
    }

    /// `true` if the OCR engine has a real model runtime behind it.
    pub fn ocr_engine_active(&self) -> bool {
        matches!(self.deployed_engine, DeployedEngine::Ocr | DeployedEngine::Both)
    }

    /// `true` if the form-parse engine has a real model runtime behind it.
    pub fn form_parse_engine_active(&self) -> bool {
        matches!(self.deployed_engine, DeployedEngine::FormParse | DeployedEngine::Both)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            deployed_engine: DeployedEngine::default(),
            max_workers_ocr: 1,
            max_workers_form: 1,
            gpu_max_concurrent: 1,
            gpu_memory_threshold_gib: 12.0,
            gpu_acquire_timeout_s: 300,
            allowed_extensions: vec!["png".into(), "jpg".into(), "jpeg".into(), "bmp".into(), "tiff".into()],
            allowed_mime_types: vec![
                "image/png".into(),
                "image/jpeg".into(),
                "image/bmp".into(),
                "image/tiff".into(),
            ],
            max_file_size_bytes: 20 * 1024 * 1024,
            state_store_url: None,
            default_form_prompt: DEFAULT_FORM_PROMPT.to_string(),
            verbose: false,
        }
    }
}

/// The original system's long-form instruction prompt, used whenever a
/// form-parse job is submitted without its own `llm_prompt`.
pub const DEFAULT_FORM_PROMPT: &str = "\
You are given an image of a filled-in form. Extract every field you can \
identify into a single flat JSON object whose keys are normalized field \
names (lowercase, words separated by underscores) and whose values are the \
text entered for that field. If a field has no value, omit it rather than \
emitting an empty string. Respond with only the JSON object, fenced in a \
```json code block.";

/// Overlay of config-file/env/CLI values on top of [`AppConfig::default`].
///
/// Every field is optional because each layer only supplies what it
/// overrides; `merge_into` fills gaps left by the layer before it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigOverrides {
    pub bind_addr: Option<String>,
    pub deployed_engine: Option<DeployedEngine>,
    pub max_workers_ocr: Option<usize>,
    pub max_workers_form: Option<usize>,
    pub gpu_max_concurrent: Option<usize>,
    pub gpu_memory_threshold_gib: Option<f64>,
    pub gpu_acquire_timeout_s: Option<u64>,
    pub allowed_extensions: Option<Vec<String>>,
    pub allowed_mime_types: Option<Vec<String>>,
    pub max_file_size_bytes: Option<u64>,
    pub state_store_url: Option<String>,
    pub default_form_prompt: Option<String>,
    pub verbose: Option<bool>,
}

impl ConfigOverrides {
    fn merge_into(self, base: AppConfig) -> AppConfig {
        AppConfig {
            bind_addr: self.bind_addr.unwrap_or(base.bind_addr),
            deployed_engine: self.deployed_engine.unwrap_or(base.deployed_engine),
            max_workers_ocr: self.max_workers_ocr.unwrap_or(base.max_workers_ocr),
            max_workers_form: self.max_workers_form.unwrap_or(base.max_workers_form),
            gpu_max_concurrent: self.gpu_max_concurrent.unwrap_or(base.gpu_max_concurrent),
            gpu_memory_threshold_gib: self.gpu_memory_threshold_gib.unwrap_or(base.gpu_memory_threshold_gib),
            gpu_acquire_timeout_s: self.gpu_acquire_timeout_s.unwrap_or(base.gpu_acquire_timeout_s),
            allowed_extensions: self.allowed_extensions.unwrap_or(base.allowed_extensions),
            allowed_mime_types: self.allowed_mime_types.unwrap_or(base.allowed_mime_types),
            max_file_size_bytes: self.max_file_size_bytes.unwrap_or(base.max_file_size_bytes),
            state_store_url: self.state_store_url.or(base.state_store_url),
            default_form_prompt: self.default_form_prompt.unwrap_or(base.default_form_prompt),
            verbose: self.verbose.unwrap_or(base.verbose),
        }
    }
}

/// Errors raised while resolving configuration from its layered sources.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: config::ConfigError,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Load configuration: defaults -> optional file -> `APP_`-prefixed
/// environment variables. CLI flags are applied afterwards by the caller via
/// [`ConfigOverrides::merge_into`] through [`load_with_cli_overrides`].
pub fn load(config_file: Option<&PathBuf>) -> Result<AppConfig, ConfigError> {
    load_with_cli_overrides(config_file, ConfigOverrides::default())
}

/// Load configuration and apply CLI-supplied overrides last, matching the
/// bootstrap layer's precedence: defaults < file < env < CLI flags.
pub fn load_with_cli_overrides(
    config_file: Option<&PathBuf>,
    cli_overrides: ConfigOverrides,
) -> Result<AppConfig, ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = config_file {
        builder = builder.add_source(config::File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(config::Environment::with_prefix("APP").separator("__"));

    let layered = builder.build().map_err(|source| ConfigError::File {
        path: config_file.cloned().unwrap_or_default(),
        source,
    })?;

    let overrides: ConfigOverrides = layered.try_deserialize().unwrap_or_default();
    let resolved = cli_overrides.merge_into(overrides.merge_into(AppConfig::default()));
    validate(resolved)
}

fn validate(config: AppConfig) -> Result<AppConfig, ConfigError> {
    if config.max_workers_ocr == 0 && config.max_workers_form == 0 {
        return Err(ConfigError::Invalid(
            "at least one of max_workers_ocr/max_workers_form must be nonzero".to_string(),
        ));
    }
    if config.gpu_max_concurrent == 0 {
        return Err(ConfigError::Invalid("gpu_max_concurrent must be at least 1".to_string()));
    }
    if config.gpu_memory_threshold_gib <= 0.0 {
        return Err(ConfigError::Invalid("gpu_memory_threshold_gib must be positive".to_string()));
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(AppConfig::default()).is_ok());
    }

    #[test]
    fn overrides_merge_over_defaults() {
        let overrides = ConfigOverrides {
            max_workers_ocr: Some(7),
            ..Default::default()
        };
        let merged = overrides.merge_into(AppConfig::default());
        assert_eq!(merged.max_workers_ocr, 7);
        assert_eq!(merged.max_workers_form, AppConfig::default().max_workers_form);
    }

    #[test]
    fn zero_gpu_concurrency_is_rejected() {
        let mut config = AppConfig::default();
        config.gpu_max_concurrent = 0;
        assert!(validate(config).is_err());
    }

    #[test]
    fn deployed_engine_activation() {
        let mut config = AppConfig::default();
        config.deployed_engine = DeployedEngine::Ocr;
        assert!(config.ocr_engine_active());
        assert!(!config.form_parse_engine_active());
    }
}
