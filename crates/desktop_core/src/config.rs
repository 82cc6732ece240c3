//! Runtime configuration for the desktop backend.
//!
//! # Responsibility
//! - Select the storage backend and tune the write pipeline.
//! - Load settings from JSON documents or `DESKTOP_*` environment variables.
//!
//! # Invariants
//! - Every field has a default, so an empty document is a valid config.
//! - `validate()` runs before any loaded config is returned.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DEBOUNCE_MS: &str = "DESKTOP_DEBOUNCE_MS";
pub const ENV_MAX_IN_FLIGHT: &str = "DESKTOP_MAX_IN_FLIGHT";
pub const ENV_DB_PATH: &str = "DESKTOP_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "DESKTOP_LOG_LEVEL";

const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Where items are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageBackend {
    /// Process-local map; nothing survives a restart.
    #[default]
    Memory,
    /// Single SQLite database file.
    Sqlite { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopConfig {
    pub debounce_ms: u64,
    pub max_in_flight_writes: Option<usize>,
    pub storage: StorageBackend,
    pub log_level: Option<String>,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            max_in_flight_writes: None,
            storage: StorageBackend::Memory,
            log_level: None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid config document: {err}"),
            Self::InvalidValue { key, value } => {
                write!(f, "invalid value `{value}` for `{key}`")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl DesktopConfig {
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `DESKTOP_*` variables on top of the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_DEBOUNCE_MS) {
            config.debounce_ms = parse_number(ENV_DEBOUNCE_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_IN_FLIGHT) {
            config.max_in_flight_writes = Some(parse_number(ENV_MAX_IN_FLIGHT, &raw)?);
        }
        if let Some(raw) = lookup(ENV_DB_PATH) {
            config.storage = StorageBackend::Sqlite {
                path: PathBuf::from(raw.trim()),
            };
        }
        if let Some(raw) = lookup(ENV_LOG_LEVEL) {
            config.log_level = Some(raw.trim().to_string());
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_in_flight_writes == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "max_in_flight_writes",
                value: "0".to_string(),
            });
        }
        if let StorageBackend::Sqlite { path } = &self.storage {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "storage.path",
                    value: String::new(),
                });
            }
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}
