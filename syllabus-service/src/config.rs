//! Static configuration loaded at startup.
//!
//! Settings come from an optional `config.{toml,yaml,json}` file in the working
//! directory, overridden by `SYLLABUS__`-prefixed environment variables
//! (e.g. `SYLLABUS__SERVER__PORT=9090`).

// Leading :: keeps the config crate distinct from this module's own path
use ::config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ServiceError, ServiceResult};

/// Static configuration that cannot be changed at runtime
#[derive(Debug, Clone, Deserialize)]
pub struct StaticConfig {
    #[serde(default = "default_server")]
    pub server: ServerConfig,

    #[serde(default = "default_storage")]
    pub storage: StorageConfig,

    #[serde(default = "default_extractor")]
    pub extractor: ExtractorConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the SQLite database and the upload staging area.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// External extraction script configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractorConfig {
    /// Interpreter the extraction script runs under.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Path to the extraction script.
    #[serde(default = "default_script")]
    pub script: PathBuf,

    /// Maximum wall-clock runtime for one extraction, in seconds.
    /// Unset means no limit; extraction jobs can legitimately run for minutes.
    #[serde(default)]
    pub max_runtime_secs: Option<u64>,
}

impl StorageConfig {
    /// Staging directory for uploaded files awaiting extraction.
    pub fn staging_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    /// Path of the SQLite database the extraction script writes into.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("syllabus_master.db")
    }
}

impl ExtractorConfig {
    pub fn max_runtime(&self) -> Option<Duration> {
        self.max_runtime_secs.map(Duration::from_secs)
    }
}

/// Load configuration from file and env vars
pub fn load_config() -> ServiceResult<StaticConfig> {
    Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(
            Environment::with_prefix("SYLLABUS")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| ServiceError::Config {
            message: format!("Failed to build config: {}", e),
        })?
        .try_deserialize()
        .map_err(|e| ServiceError::Config {
            message: format!("Failed to deserialize config: {}", e),
        })
}

// ==================== Default Value Functions ====================

pub(crate) fn default_server() -> ServerConfig {
    ServerConfig {
        host: default_host(),
        port: default_port(),
    }
}

pub(crate) fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub(crate) fn default_port() -> u16 {
    8080
}

pub(crate) fn default_storage() -> StorageConfig {
    StorageConfig {
        data_dir: default_data_dir(),
    }
}

pub(crate) fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

pub(crate) fn default_extractor() -> ExtractorConfig {
    ExtractorConfig {
        interpreter: default_interpreter(),
        script: default_script(),
        max_runtime_secs: None,
    }
}

pub(crate) fn default_interpreter() -> String {
    "python3".to_string()
}

pub(crate) fn default_script() -> PathBuf {
    PathBuf::from("./syllabus-scrapper.py")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = default_server();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);

        let storage = default_storage();
        assert_eq!(storage.staging_dir(), PathBuf::from("./data/uploads"));
        assert_eq!(
            storage.db_path(),
            PathBuf::from("./data/syllabus_master.db")
        );

        let extractor = default_extractor();
        assert_eq!(extractor.interpreter, "python3");
        assert!(extractor.max_runtime().is_none());
    }
}
