//! Configuration
//!
//! Two toggles drive everything: `simula.enabled` (master switch for the
//! engine) and `simula.connection_refuse` (connection gate). Both default
//! to off. A host holds one [`GlobalSettings`]; each session may override
//! `simula.enabled` through its [`SessionSettings`]. Refusal is decided
//! before a session exists, so it can only be changed globally.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::Severity;

/// Name of the master switch
pub const SETTING_ENABLED: &str = "simula.enabled";

/// Name of the connection refusal toggle
pub const SETTING_CONNECTION_REFUSE: &str = "simula.connection_refuse";

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(String),

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("unrecognized configuration parameter \"{0}\"")]
    UnknownSetting(String),

    #[error("parameter \"{name}\" requires a Boolean value, got \"{value}\"")]
    InvalidBool { name: String, value: String },

    #[error("parameter \"{0}\" cannot be changed for a single session")]
    GlobalOnly(String),
}

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulaConfig {
    /// Engine master switch (default: false)
    #[serde(default)]
    pub simulation_enabled: bool,

    /// Refuse every new connection (default: false)
    #[serde(default)]
    pub connections_refused: bool,

    /// JSON rule file backing the rule store
    #[serde(default = "default_rules_path")]
    pub rules_path: PathBuf,

    /// Minimum log severity (default: "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_rules_path() -> PathBuf {
    PathBuf::from("./simula_rules.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SimulaConfig {
    fn default() -> Self {
        Self {
            simulation_enabled: false,
            connections_refused: false,
            rules_path: default_rules_path(),
            log_level: default_log_level(),
        }
    }
}

impl SimulaConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration JSON
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: SimulaConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.rules_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("rules_path must not be empty".into()));
        }
        self.severity()?;
        Ok(())
    }

    /// Parsed `log_level`
    pub fn severity(&self) -> ConfigResult<Severity> {
        self.log_level.parse().map_err(ConfigError::Invalid)
    }
}

/// Parse a boolean setting value
///
/// Accepts on/off, true/false, yes/no, 1/0, case-insensitive.
pub fn parse_bool(name: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().trim_matches('\'').to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Process-wide toggles
///
/// Written by the host's configuration mechanism, read by the engine and
/// the gate.
#[derive(Debug, Default)]
pub struct GlobalSettings {
    simulation_enabled: AtomicBool,
    connections_refused: AtomicBool,
}

impl GlobalSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &SimulaConfig) -> Self {
        Self {
            simulation_enabled: AtomicBool::new(config.simulation_enabled),
            connections_refused: AtomicBool::new(config.connections_refused),
        }
    }

    pub fn simulation_enabled(&self) -> bool {
        self.simulation_enabled.load(Ordering::SeqCst)
    }

    pub fn connections_refused(&self) -> bool {
        self.connections_refused.load(Ordering::SeqCst)
    }

    pub fn set_simulation_enabled(&self, enabled: bool) {
        self.simulation_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn set_connections_refused(&self, refused: bool) {
        self.connections_refused.store(refused, Ordering::SeqCst);
    }
}

/// Per-session overrides; `None` falls through to the global value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSettings {
    simulation_enabled: Option<bool>,
}

impl SessionSettings {
    /// Override a toggle by name for this session
    pub fn set(&mut self, name: &str, value: bool) -> ConfigResult<()> {
        match normalize_name(name).as_str() {
            SETTING_ENABLED => self.simulation_enabled = Some(value),
            SETTING_CONNECTION_REFUSE => return Err(ConfigError::GlobalOnly(name.to_string())),
            _ => return Err(ConfigError::UnknownSetting(name.to_string())),
        }
        Ok(())
    }

    /// Drop the override, falling back to the global value
    pub fn reset(&mut self, name: &str) -> ConfigResult<()> {
        match normalize_name(name).as_str() {
            SETTING_ENABLED => self.simulation_enabled = None,
            SETTING_CONNECTION_REFUSE => return Err(ConfigError::GlobalOnly(name.to_string())),
            _ => return Err(ConfigError::UnknownSetting(name.to_string())),
        }
        Ok(())
    }

    pub fn simulation_enabled(&self, global: &GlobalSettings) -> bool {
        self.simulation_enabled
            .unwrap_or_else(|| global.simulation_enabled())
    }
}
