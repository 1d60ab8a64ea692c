//! Object storage the analyze endpoint reads presentations from.

use crate::config::StorageConfig;
use async_trait::async_trait;
use aws_sdk_s3::{error::SdkError, Client as S3Client};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Invalid object key: {0}")]
    InvalidKey(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the full content of an object.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Objects as files under a root directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a key to a path, refusing anything that would leave the root.
    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if key.is_empty() || escapes {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn describe(&self) -> String {
        format!("local directory {}", self.root.display())
    }
}

/// Objects in an S3 bucket.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: S3Client,
    bucket: String,
}

impl S3Store {
    pub async fn new(bucket: String, region: Option<String>, endpoint: Option<String>) -> Self {
        let mut config_loader = aws_config::from_env();
        if let Some(region) = region {
            config_loader = config_loader.region(aws_config::Region::new(region));
        }
        let config = config_loader.load().await;

        // Custom endpoints (LocalStack, MinIO) need path-style addressing.
        let client = match endpoint {
            Some(endpoint_url) => {
                let s3_config = aws_sdk_s3::config::Builder::from(&config)
                    .endpoint_url(endpoint_url)
                    .force_path_style(true)
                    .build();
                S3Client::from_conf(s3_config)
            }
            None => S3Client::new(&config),
        };

        Self { client, bucket }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match e {
                SdkError::ServiceError(err) if err.err().is_no_such_key() => {
                    StorageError::NotFound(key.to_string())
                }
                other => StorageError::Backend(format!("GetObject {} failed: {}", key, other)),
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Backend(format!("Reading {} failed: {}", key, e)))?;

        Ok(data.into_bytes().to_vec())
    }

    fn describe(&self) -> String {
        format!("S3 bucket {}", self.bucket)
    }
}

/// Build the store selected by configuration.
pub async fn from_config(config: &StorageConfig) -> Arc<dyn ObjectStore> {
    match config {
        StorageConfig::Local { root } => Arc::new(LocalStore::new(root.clone())),
        StorageConfig::S3 {
            bucket,
            region,
            endpoint,
        } => Arc::new(S3Store::new(bucket.clone(), region.clone(), endpoint.clone()).await),
    }
}
