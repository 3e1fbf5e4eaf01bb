// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Schema migration to v{version} failed: {reason}")]
    Migration { version: i64, reason: String },
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        StorageError::Backend(e.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

/// String key-value persistence shared by every backend of the ETag cache.
///
/// The store may be shared with unrelated data, so callers namespace their
/// keys and must only enumerate/remove keys they own.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Missing keys are not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Every key currently stored.
    async fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Remove several keys. Default implementation removes them one by one.
    async fn remove_many(&self, keys: &[String]) -> Result<(), StorageError> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }

    /// Keys starting with `prefix`. Default implementation filters [`keys`](Self::keys).
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .keys()
            .await?
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect())
    }
}
