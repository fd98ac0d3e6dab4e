//! Configuration file loading with precedence handling.

use crate::model::LayoutPolicy;
use crate::source::DEFAULT_PORT;
use crate::view_state::LayoutParams;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "VIZEXEC_CONFIG";

/// Environment variable overriding the server port.
pub const PORT_ENV: &str = "VIZEXEC_PORT";

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to read config file (permission issues, not a file, ...).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax or unknown keys.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },

    /// An environment override could not be parsed.
    #[error("Invalid value {value:?} for {var}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
    },

    /// A resolved value is out of range.
    #[error("Invalid {field}: {reason}")]
    InvalidValue {
        /// Setting name.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, hardcoded defaults are used.
/// Corresponds to `~/.config/vizexec/config.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Share one vertical clock across lifelines.
    #[serde(default)]
    pub synchronized: Option<bool>,

    /// Horizontal space per lane, in pixels.
    #[serde(default)]
    pub lane_width: Option<f64>,

    /// Width of one call bar, in pixels.
    #[serde(default)]
    pub bar_width: Option<f64>,

    /// Maximum click distance for selection, in pixels.
    #[serde(default)]
    pub pick_threshold: Option<f64>,

    /// TCP port for `--server` when none is given.
    #[serde(default)]
    pub server_port: Option<u16>,

    /// Delay between polls when following a file.
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,

    /// Where `w` (and `--headless --save`) writes the journal.
    #[serde(default)]
    pub save_path: Option<PathBuf>,
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Synchronized (true) or free-running layout.
    pub synchronized: bool,
    /// Lane width.
    pub lane_width: f64,
    /// Bar width.
    pub bar_width: f64,
    /// Pick threshold.
    pub pick_threshold: f64,
    /// Server port.
    pub server_port: u16,
    /// File poll interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
    /// Journal save path.
    pub save_path: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        let layout = LayoutParams::default();
        Self {
            synchronized: true,
            lane_width: layout.lane_width,
            bar_width: layout.bar_width,
            pick_threshold: layout.pick_threshold,
            server_port: DEFAULT_PORT,
            poll_interval_ms: 100,
            log_file_path: default_log_path(),
            save_path: PathBuf::from("vizexec-saved.log"),
        }
    }
}

impl ResolvedConfig {
    /// Placement policy.
    pub fn layout_policy(&self) -> LayoutPolicy {
        if self.synchronized {
            LayoutPolicy::Synchronized
        } else {
            LayoutPolicy::FreeRunning
        }
    }

    /// Diagram geometry with the configured widths.
    pub fn layout_params(&self) -> LayoutParams {
        LayoutParams {
            lane_width: self.lane_width,
            bar_width: self.bar_width,
            pick_threshold: self.pick_threshold,
            ..LayoutParams::default()
        }
    }

    /// File poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Reject values the layout cannot work with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first bad setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |field: &'static str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("must be a positive number, got {}", value),
                })
            }
        };
        positive("lane_width", self.lane_width)?;
        positive("bar_width", self.bar_width)?;
        positive("pick_threshold", self.pick_threshold)?;
        if self.bar_width >= self.lane_width {
            return Err(ConfigError::InvalidValue {
                field: "bar_width",
                reason: "must be smaller than lane_width".to_string(),
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval_ms",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/vizexec/vizexec.log` on Unix-like systems,
/// or appropriate platform path on other systems.
///
/// If state directory cannot be determined, falls back to current directory.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("vizexec").join("vizexec.log")
    } else {
        PathBuf::from("vizexec.log")
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    // Missing file is not an error - use defaults
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/vizexec/config.toml` on Unix, appropriate path on other platforms.
/// Returns `None` if home directory cannot be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("vizexec").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `VIZEXEC_CONFIG` environment variable
/// 3. Default path `~/.config/vizexec/config.toml`
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Apply environment variable overrides to resolved config.
///
/// Checks for:
/// - `VIZEXEC_PORT`: Override server port
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnv` if a set variable does not parse.
pub fn apply_env_overrides(mut config: ResolvedConfig) -> Result<ResolvedConfig, ConfigError> {
    if let Ok(port) = std::env::var(PORT_ENV) {
        config.server_port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
            var: PORT_ENV,
            value: port.clone(),
        })?;
    }
    Ok(config)
}

/// Merge config file into defaults to create resolved config.
///
/// For each field in `ConfigFile`, if `Some(value)`, use it; otherwise use default.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    ResolvedConfig {
        synchronized: config.synchronized.unwrap_or(defaults.synchronized),
        lane_width: config.lane_width.unwrap_or(defaults.lane_width),
        bar_width: config.bar_width.unwrap_or(defaults.bar_width),
        pick_threshold: config.pick_threshold.unwrap_or(defaults.pick_threshold),
        server_port: config.server_port.unwrap_or(defaults.server_port),
        poll_interval_ms: config.poll_interval_ms.unwrap_or(defaults.poll_interval_ms),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
        save_path: config.save_path.unwrap_or(defaults.save_path),
    }
}

/// Apply CLI argument overrides to resolved config.
///
/// CLI args have the highest precedence and override all other sources.
/// Only applies overrides for flags that were explicitly set by the user.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(
    mut config: ResolvedConfig,
    port_override: Option<u16>,
    free_running_override: Option<bool>,
    save_override: Option<PathBuf>,
) -> ResolvedConfig {
    if let Some(port) = port_override {
        config.server_port = port;
    }

    if let Some(free_running) = free_running_override {
        config.synchronized = !free_running;
    }

    if let Some(path) = save_override {
        config.save_path = path;
    }

    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
