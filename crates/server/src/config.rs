//! Service configuration read from environment variables.
//!
//! `HOST` and `PORT` set the listen address. `STORAGE_BACKEND` picks `local`
//! (rooted at `STORAGE_ROOT`) or `s3` (`BUCKET_NAME`, `AWS_REGION`, `S3_ENDPOINT`).

use std::env;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a valid port number, got '{value}'")]
    InvalidPort { name: &'static str, value: String },
    #[error("STORAGE_BACKEND must be 'local' or 's3', got '{0}'")]
    UnknownBackend(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub storage: StorageConfig,
}

/// Where the analyze endpoint fetches presentations from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Local {
        root: PathBuf,
    },
    S3 {
        bucket: String,
        region: Option<String>,
        endpoint: Option<String>,
    },
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match get("PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidPort {
                name: "PORT",
                value: value.clone(),
            })?,
            None => 8000,
        };

        let backend = get("STORAGE_BACKEND").unwrap_or_else(|| "local".to_string());
        let storage = match backend.to_lowercase().as_str() {
            "local" => StorageConfig::Local {
                root: PathBuf::from(get("STORAGE_ROOT").unwrap_or_else(|| ".".to_string())),
            },
            "s3" => StorageConfig::S3 {
                bucket: get("BUCKET_NAME").unwrap_or_else(|| "default-bucket".to_string()),
                region: get("AWS_REGION"),
                endpoint: get("S3_ENDPOINT"),
            },
            _ => return Err(ConfigError::UnknownBackend(backend)),
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            storage,
        })
    }
}
