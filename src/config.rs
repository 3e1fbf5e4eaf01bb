// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Configuration for the menu sync core.
//!
//! # Example
//!
//! ```
//! use menu_sync::{StorageBackend, SyncConfig};
//!
//! // Defaults: SQLite file, 24h cache, 10s request timeout
//! let config = SyncConfig::default();
//! assert_eq!(config.cache_ttl_secs, 86_400);
//!
//! // Volatile everything, e.g. for tests
//! let config = SyncConfig {
//!     api_base_url: "http://localhost:8080".into(),
//!     storage: StorageBackend::Memory,
//!     ..Default::default()
//! };
//! assert!(config.storage.is_memory());
//! ```

use std::time::Duration;

use serde::Deserialize;

/// Where cache records and menu rows are kept.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageBackend {
    /// One SQLite database holding both the key-value cache table and the
    /// menu schema.
    Sqlite { url: String },
    /// DashMap cache plus a private `sqlite::memory:` repository.
    Memory,
}

impl StorageBackend {
    #[must_use]
    pub fn is_memory(&self) -> bool {
        matches!(self, StorageBackend::Memory)
    }
}

impl Default for StorageBackend {
    fn default() -> Self {
        StorageBackend::Sqlite {
            url: default_database_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Menu API root, without trailing slash.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default)]
    pub storage: StorageBackend,

    /// Key prefix for cache records: `<ns>_cache:<url>` and `<ns>_etag:<url>`.
    #[serde(default = "default_cache_namespace")]
    pub cache_namespace: String,

    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Serialise identical concurrent fetches so only one hits the network.
    #[serde(default = "default_true")]
    pub dedupe_inflight: bool,

    /// On a 304 whose cached payload is already gone, issue one
    /// unconditional request instead of returning nothing.
    #[serde(default)]
    pub refetch_on_orphaned_not_modified: bool,

    /// Pool size for file databases. In-memory databases always use 1.
    #[serde(default = "default_sql_max_connections")]
    pub sql_max_connections: u32,
}

fn default_api_base_url() -> String {
    "https://api.protein-finder.example.com".to_string()
}
fn default_database_url() -> String {
    "sqlite:menu_sync.db".to_string()
}
fn default_cache_namespace() -> String {
    "@protein_finder".to_string()
}
fn default_cache_ttl_secs() -> u64 {
    24 * 60 * 60
}
fn default_request_timeout_ms() -> u64 {
    10_000
}
fn default_true() -> bool {
    true
}
fn default_sql_max_connections() -> u32 {
    5
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            storage: StorageBackend::default(),
            cache_namespace: default_cache_namespace(),
            cache_ttl_secs: default_cache_ttl_secs(),
            request_timeout_ms: default_request_timeout_ms(),
            dedupe_inflight: true,
            refetch_on_orphaned_not_modified: false,
            sql_max_connections: default_sql_max_connections(),
        }
    }
}

impl SyncConfig {
    /// Defaults overridden by `MENU_SYNC_*` environment variables.
    ///
    /// `MENU_SYNC_DATABASE_URL=memory` selects [`StorageBackend::Memory`].
    /// Unparseable numbers keep the default.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup("MENU_SYNC_API_BASE_URL") {
            config.api_base_url = url;
        }
        if let Some(url) = lookup("MENU_SYNC_DATABASE_URL") {
            config.storage = if url == "memory" {
                StorageBackend::Memory
            } else {
                StorageBackend::Sqlite { url }
            };
        }
        if let Some(ttl) = lookup("MENU_SYNC_CACHE_TTL_SECS").and_then(|v| v.parse().ok()) {
            config.cache_ttl_secs = ttl;
        }
        if let Some(ms) = lookup("MENU_SYNC_REQUEST_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            config.request_timeout_ms = ms;
        }
        config
    }

    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
