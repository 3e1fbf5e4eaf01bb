// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Menu sync service.
//!
//! The [`MenuSyncService`] is the only component that writes to both the
//! ETag cache and the repository:
//!
//! - **Cache**: raw `/menus` payloads keyed by URL, fresh for 24 hours
//! - **Network**: conditional GETs, never retried
//! - **Repository**: durable copy, upserted with every non-stale result of
//!   [`MenuSyncService::sync_chain`] / [`MenuSyncService::sync_all`]
//!
//! # Degradation order
//!
//! ```text
//! fresh cache → network (200 / 304) → stale cache → repository → empty
//! ```
//!
//! The first three are handled by the fetch API; the last two by the sync
//! API. The chain list degrades to a built-in list instead.
//!
//! # Example
//!
//! ```rust,no_run
//! use menu_sync::{FetchOptions, MenuSyncService, StorageBackend, SyncConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), menu_sync::SyncError> {
//! let config = SyncConfig {
//!     storage: StorageBackend::Memory,
//!     ..Default::default()
//! };
//! let service = MenuSyncService::open(config).await?;
//!
//! let report = service.sync_chain("sukiya", FetchOptions::default()).await?;
//! println!("{} items from {}", report.items.len(), report.source);
//! # Ok(())
//! # }
//! ```

mod api;
mod chains;
mod inflight;
mod lifecycle;
mod sync;
mod types;

pub use chains::fallback_chains;
pub use types::{DataOrigin, FetchOptions, FetchSource, MenuResponse, SyncError, SyncReport};

use std::sync::Arc;

use crate::api::ApiClient;
use crate::cache::EtagCache;
use crate::config::SyncConfig;
use crate::repository::MenuRepository;

use inflight::InflightRequests;

/// Orchestrates cache, network and repository for menu data.
///
/// Construct one at startup and share it by reference (or `Arc`). All
/// methods take `&self`.
pub struct MenuSyncService {
    config: SyncConfig,
    api: ApiClient,
    cache: EtagCache,
    repository: Arc<dyn MenuRepository>,
    inflight: InflightRequests,
}

impl MenuSyncService {
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    #[must_use]
    pub fn cache(&self) -> &EtagCache {
        &self.cache
    }

    /// The repository, for local search and filtering.
    #[must_use]
    pub fn repository(&self) -> &Arc<dyn MenuRepository> {
        &self.repository
    }
}
