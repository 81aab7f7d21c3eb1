//! TOML-based application configuration.
//!
//! Stores the portal endpoint, sync behavior (look-back, retries, the
//! deployment-specific timestamp correction) and output labeling.
//!
//! Configuration is stored at `~/.config/glucosync/config.toml`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::sync::orchestrator::SyncSettings;
use crate::sync::planner::FullWindowPolicy;
use crate::sync::transformer::TransformOptions;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("unknown config key: {0}")]
    UnknownKey(String),

    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Portal endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Sync behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: i64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default)]
    pub full_window_policy: FullWindowPolicy,
    /// Correction applied to upstream timestamps, in hours. The observed
    /// portal labels readings two hours ahead; adjust per deployment.
    #[serde(default = "default_correction_hours")]
    pub timestamp_correction_hours: i64,
}

/// Output record labeling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_device")]
    pub device: String,
    /// Source tag used in synthetic record ids.
    #[serde(default = "default_source")]
    pub source: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/glucosync/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub portal: PortalConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

// Default functions
fn default_base_url() -> String {
    "https://portal.example.com/api/v1/".into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_lookback_hours() -> i64 {
    24
}
fn default_max_retries() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    5000
}
fn default_correction_hours() -> i64 {
    -2
}
fn default_device() -> String {
    "glucosync".into()
}
fn default_source() -> String {
    "portal".into()
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            lookback_hours: default_lookback_hours(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            full_window_policy: FullWindowPolicy::default(),
            timestamp_correction_hours: default_correction_hours(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            source: default_source(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(Self::path()?, content)?;
        Ok(())
    }

    /// Load from disk, returning defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Orchestrator settings derived from this config.
    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            lookback_hours: self.sync.lookback_hours,
            max_retries: self.sync.max_retries,
            base_delay_ms: self.sync.base_delay_ms,
            full_window_policy: self.sync.full_window_policy,
            source: self.output.source.clone(),
            transform: TransformOptions {
                timestamp_correction_hours: self.sync.timestamp_correction_hours,
                device: self.output.device.clone(),
            },
        }
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        match current {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key and persist. The new value is
    /// parsed against the existing value's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        let (parents, leaf) = match key.rsplit_once('.') {
            Some((parents, leaf)) => (parents, leaf),
            None => return Err(ConfigError::UnknownKey(key.to_string())),
        };

        let mut current = &mut json;
        for part in parents.split('.') {
            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }
        let obj = current
            .as_object_mut()
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        let existing = obj
            .get(leaf)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
            ),
            serde_json::Value::Number(_) => {
                if let Ok(n) = value.parse::<i64>() {
                    serde_json::Value::Number(n.into())
                } else if let Ok(n) = value.parse::<f64>() {
                    serde_json::Number::from_f64(n)
                        .map(serde_json::Value::Number)
                        .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                } else {
                    return Err(invalid(format!("cannot parse '{value}' as number")));
                }
            }
            _ => serde_json::Value::String(value.into()),
        };
        obj.insert(leaf.to_string(), new_value);

        *self = serde_json::from_value(json)
            .map_err(|e| invalid(e.to_string()))?;
        self.save()?;
        Ok(())
    }
}
