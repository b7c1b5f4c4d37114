//! Environment snapshots supplying live data to tag handlers
//!
//! The engine never measures anything itself. The host samples its process
//! and system state into an [`EnvSnapshot`] before each evaluation, so
//! metric tags stay pure functions of their context. Snapshots also load
//! from TOML files, which the CLI uses to feed the metric tags.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading snapshot files
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to read snapshot file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse snapshot TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Read-only environment data captured before one evaluation
///
/// All fields have neutral defaults so partial TOML files and bare test
/// contexts work without ceremony.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnvSnapshot {
    pub bot_name: String,
    pub bot_version: String,
    pub bot_owner_id: String,
    /// Bot process uptime in milliseconds
    pub bot_uptime_ms: u64,
    pub shard_count: u32,
    /// Registered command count; updated in-context by the command-sync tags
    pub command_count: u32,
    /// Gateway round-trip latency in milliseconds
    pub ping_ms: f64,
    pub ram_used_mb: f64,
    pub ram_total_mb: f64,
    pub cpu_model: String,
    pub cpu_arch: String,
    pub cpu_cores: u32,
    pub os_name: String,
    /// Host OS uptime in seconds
    pub os_uptime_secs: u64,
}

impl Default for EnvSnapshot {
    fn default() -> Self {
        Self {
            bot_name: "unknown".to_string(),
            bot_version: "0.0.0".to_string(),
            bot_owner_id: String::new(),
            bot_uptime_ms: 0,
            shard_count: 1,
            command_count: 0,
            ping_ms: 0.0,
            ram_used_mb: 0.0,
            ram_total_mb: 0.0,
            cpu_model: "unknown".to_string(),
            cpu_arch: "unknown".to_string(),
            cpu_cores: 0,
            os_name: "unknown".to_string(),
            os_uptime_secs: 0,
        }
    }
}

impl EnvSnapshot {
    /// Load a snapshot from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, SnapshotError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load a snapshot from a TOML string
    pub fn from_str(content: &str) -> Result<Self, SnapshotError> {
        let parsed = toml::from_str(content)?;
        Ok(parsed)
    }
}
