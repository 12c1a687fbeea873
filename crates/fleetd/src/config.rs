//! Configuration management for fleetd.
//!
//! Loads settings from a TOML file or uses defaults. Every field has a
//! serde default so partial files parse cleanly.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{info, warn};

/// Default config file path.
pub const CONFIG_PATH: &str = "/etc/fleetd/config.toml";

/// Environment variable overriding the config path.
pub const CONFIG_PATH_ENV: &str = "FLEETD_CONFIG";

/// Daemon settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// HTTP bind address.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Version tag stamped onto every interpretation.
    #[serde(default = "default_model_version")]
    pub model_version: String,

    /// Per-request timeout in seconds at the HTTP layer.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8087".to_string()
}

fn default_model_version() -> String {
    "fleet-interpreter-v1".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            model_version: default_model_version(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Orchestration feature flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Drive workflows through the graph engine.
    #[serde(default = "default_enable_graph_engine")]
    pub enable_graph_engine: bool,

    /// Permit sequential re-execution when the graph path fails, and
    /// sequential-only operation when the engine is unavailable.
    #[serde(default = "default_allow_fallback")]
    pub allow_deterministic_fallback: bool,
}

fn default_enable_graph_engine() -> bool {
    true
}

fn default_allow_fallback() -> bool {
    true
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            enable_graph_engine: default_enable_graph_engine(),
            allow_deterministic_fallback: default_allow_fallback(),
        }
    }
}

/// Data access settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Row source: only "sample" is built in; warehouse access is an
    /// external collaborator behind the same loader seam.
    #[serde(default = "default_data_source")]
    pub source: String,

    /// Sample telemetry bundle (JSON).
    #[serde(default = "default_sample_file")]
    pub sample_file: String,

    /// Directory holding the reference dictionaries (YAML).
    #[serde(default = "default_reference_dir")]
    pub reference_dir: String,
}

fn default_data_source() -> String {
    "sample".to_string()
}

fn default_sample_file() -> String {
    "data/sample/telemetry_sample.json".to_string()
}

fn default_reference_dir() -> String {
    "data/reference".to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source: default_data_source(),
            sample_file: default_sample_file(),
            reference_dir: default_reference_dir(),
        }
    }
}

/// External text-generation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextGenConfig {
    /// Off by default: the deterministic templates are always sufficient.
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_textgen_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_textgen_model")]
    pub model: String,

    #[serde(default = "default_textgen_timeout")]
    pub timeout_secs: u64,
}

fn default_textgen_endpoint() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_textgen_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_textgen_timeout() -> u64 {
    8
}

impl Default for TextGenConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_textgen_endpoint(),
            model: default_textgen_model(),
            timeout_secs: default_textgen_timeout(),
        }
    }
}

/// Full daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub daemon: DaemonConfig,

    #[serde(default)]
    pub features: FeatureConfig,

    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub textgen: TextGenConfig,
}

impl Config {
    /// Load config from `FLEETD_CONFIG` or the default path, falling back
    /// to defaults when no file is present.
    pub fn load() -> Self {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| CONFIG_PATH.to_string());
        Self::load_from_path(&path).unwrap_or_else(|e| {
            warn!("Config not found at {}, using defaults: {}", path, e);
            Config::default()
        })
    }

    /// Load config from a specific path.
    pub fn load_from_path(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded config from {}", path);
        Ok(config)
    }
}
