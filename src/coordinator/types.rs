// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Public types for the menu sync service.

use thiserror::Error;

use crate::domain::{MenuItem, ValidationError};
use crate::storage::traits::StorageError;

/// Hard failures of the sync service. Network problems never surface here;
/// they degrade to cached or fallback data.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("invalid menu payload: {0}")]
    Validation(#[from] ValidationError),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SyncError {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Storage(_) => "storage",
            SyncError::Validation(_) => "validation",
            SyncError::Config(_) => "config",
        }
    }
}

/// Where a [`MenuResponse`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    /// Fresh cache entry, no request made
    Cache,
    /// 200 from the server
    Network,
    /// 304 from the server, cached payload served
    NotModified,
    /// Request failed, cached payload served regardless of age
    StaleCache,
}

impl FetchSource {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchSource::Cache => "cache",
            FetchSource::Network => "network",
            FetchSource::NotModified => "not_modified",
            FetchSource::StaleCache => "stale_cache",
        }
    }
}

impl std::fmt::Display for FetchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a [`SyncReport`] came from: any [`FetchSource`], or one of the
/// local fallbacks once the fetch produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    Cache,
    Network,
    NotModified,
    StaleCache,
    Repository,
    Empty,
}

impl DataOrigin {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DataOrigin::Cache => "cache",
            DataOrigin::Network => "network",
            DataOrigin::NotModified => "not_modified",
            DataOrigin::StaleCache => "stale_cache",
            DataOrigin::Repository => "repository",
            DataOrigin::Empty => "empty",
        }
    }
}

impl From<FetchSource> for DataOrigin {
    fn from(source: FetchSource) -> Self {
        match source {
            FetchSource::Cache => DataOrigin::Cache,
            FetchSource::Network => DataOrigin::Network,
            FetchSource::NotModified => DataOrigin::NotModified,
            FetchSource::StaleCache => DataOrigin::StaleCache,
        }
    }
}

impl std::fmt::Display for DataOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Skip the cache check and send no `If-None-Match`.
    pub force_refresh: bool,
}

impl FetchOptions {
    #[must_use]
    pub fn forced() -> Self {
        Self { force_refresh: true }
    }
}

/// Parsed menu data plus its cache metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuResponse {
    pub items: Vec<MenuItem>,
    pub etag: Option<String>,
    pub last_modified: String,
    pub source: FetchSource,
}

/// Outcome of [`super::MenuSyncService::sync_chain`].
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub items: Vec<MenuItem>,
    pub source: DataOrigin,
    /// Rows written to the repository by this sync.
    pub persisted: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_from_source() {
        assert_eq!(DataOrigin::from(FetchSource::StaleCache), DataOrigin::StaleCache);
        assert_eq!(DataOrigin::from(FetchSource::Network).to_string(), "network");
        assert_eq!(DataOrigin::Repository.as_str(), "repository");
    }

    #[test]
    fn test_default_options_use_cache() {
        assert!(!FetchOptions::default().force_refresh);
        assert!(FetchOptions::forced().force_refresh);
    }

    #[test]
    fn test_error_kinds() {
        let err = SyncError::from(StorageError::Backend("disk full".into()));
        assert_eq!(err.kind(), "storage");
        assert_eq!(err.to_string(), "Storage backend error: disk full");

        let err = SyncError::from(ValidationError::MissingField { field: "name" });
        assert_eq!(err.to_string(), "invalid menu payload: name is required");
    }
}
