//! Explicit service configuration.
//!
//! # Responsibility
//! - Describe everything the store, remote client and logger need at startup.
//! - Load it from a JSON file and reject unusable values early.
//!
//! # Invariants
//! - Configuration is passed into constructors; nothing reads it globally.

use crate::model::metadata::PERSON_METADATA_MODEL_ID;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Top-level configuration for one service process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// SQLite file holding persons and sync metadata.
    pub database_path: PathBuf,
    pub remote: RemoteSourceConfig,
    /// `model_id` of the metadata record tracking person syncs.
    #[serde(default = "default_metadata_model_id")]
    pub metadata_model_id: String,
    #[serde(default)]
    pub log: LogConfig,
}

/// CRM endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSourceConfig {
    /// Full URL of the contact-list endpoint.
    pub base_url: String,
    /// Whole-request timeout. Unset leaves the client default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Logging settings. Unset fields fall back to build-mode defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub level: Option<String>,
    /// Absolute directory for rolling log files; unset disables file logging.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_metadata_model_id() -> String {
    PERSON_METADATA_MODEL_ID.to_string()
}

/// Configuration load or validation failure.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl ServiceConfig {
    /// Parses and validates configuration from JSON text.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Checks values that would otherwise fail later at first use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "database_path must not be empty".to_string(),
            ));
        }
        if self.metadata_model_id.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "metadata_model_id must not be blank".to_string(),
            ));
        }
        self.remote.validate()?;
        if let Some(dir) = self.log.dir.as_ref() {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log.dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}

impl RemoteSourceConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(self.base_url.trim()).map_err(|err| {
            ConfigError::Invalid(format!("remote.base_url `{}`: {err}", self.base_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "remote.base_url must use http or https, got `{}`",
                url.scheme()
            )));
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "remote.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
