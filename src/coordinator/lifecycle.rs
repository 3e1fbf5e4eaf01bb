// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Construction of the sync service from configuration.

use std::sync::Arc;

use tracing::info;

use super::inflight::InflightRequests;
use super::types::SyncError;
use super::MenuSyncService;
use crate::api::ApiClient;
use crate::cache::EtagCache;
use crate::config::{StorageBackend, SyncConfig};
use crate::repository::{MenuRepository, SqlMenuRepository};
use crate::storage::memory::InMemoryKvStore;
use crate::storage::sql::SqliteKvStore;
use crate::storage::traits::KeyValueStore;

impl MenuSyncService {
    /// Open storage and build the HTTP client described by `config`.
    ///
    /// With [`StorageBackend::Sqlite`] the cache table and the menu schema
    /// share one database. With [`StorageBackend::Memory`] nothing outlives
    /// the process.
    pub async fn open(config: SyncConfig) -> Result<Self, SyncError> {
        let api = ApiClient::new(&config.api_base_url, config.request_timeout())
            .map_err(|e| SyncError::Config(e.to_string()))?;

        let (store, repository): (Arc<dyn KeyValueStore>, Arc<dyn MenuRepository>) =
            match &config.storage {
                StorageBackend::Memory => {
                    let repository = SqlMenuRepository::connect("sqlite::memory:", 1).await?;
                    (Arc::new(InMemoryKvStore::new()), Arc::new(repository))
                }
                StorageBackend::Sqlite { url } => {
                    let repository =
                        SqlMenuRepository::connect(url, config.sql_max_connections).await?;
                    let store = SqliteKvStore::with_pool(repository.pool()).await?;
                    (Arc::new(store), Arc::new(repository))
                }
            };

        let cache = EtagCache::new(store, &config.cache_namespace).with_ttl(config.cache_ttl());
        info!(
            api = %config.api_base_url,
            memory = config.storage.is_memory(),
            "menu sync service ready"
        );
        Ok(Self::from_parts(config, api, cache, repository))
    }

    /// Assemble a service from already-built parts, e.g. a cache with a
    /// manual clock or a repository wrapper.
    pub fn from_parts(
        config: SyncConfig,
        api: ApiClient,
        cache: EtagCache,
        repository: Arc<dyn MenuRepository>,
    ) -> Self {
        Self {
            inflight: InflightRequests::new(config.dedupe_inflight),
            config,
            api,
            cache,
            repository,
        }
    }
}
