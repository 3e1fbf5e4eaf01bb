// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Write-through to the repository.
//!
//! Every payload the server has confirmed (200, 304, or a fresh cache entry
//! it sent earlier) is bulk-saved, so the repository catches up even when
//! the cache was filled by a plain fetch or an earlier write failed. Stale
//! fallbacks are not written. When a fetch yields nothing, the repository
//! answers instead, and an empty repository yields an empty report.

use tracing::{info, instrument, warn};

use super::api::{FETCH_ALL_MENUS, FETCH_MENUS};
use super::types::{DataOrigin, FetchOptions, FetchSource, MenuResponse, SyncError, SyncReport};
use super::MenuSyncService;
use crate::domain::MenuItem;
use crate::metrics;
use crate::repository::NutrientFilter;

impl MenuSyncService {
    /// Fetch one chain and persist the confirmed items.
    #[instrument(skip(self), fields(force = options.force_refresh))]
    pub async fn sync_chain(
        &self,
        chain: &str,
        options: FetchOptions,
    ) -> Result<SyncReport, SyncError> {
        let fetched = self.fetch_menus_by_chain(chain, options).await?;
        match fetched {
            Some(response) => self.persist(response).await,
            None => {
                let items = self.repository.find_by_chain(chain).await?;
                Ok(local_report(FETCH_MENUS, items))
            }
        }
    }

    /// Fetch every menu and persist the confirmed items.
    #[instrument(skip(self), fields(force = options.force_refresh))]
    pub async fn sync_all(&self, options: FetchOptions) -> Result<SyncReport, SyncError> {
        let fetched = self.fetch_all_menus(options).await?;
        match fetched {
            Some(response) => self.persist(response).await,
            None => {
                let items = self
                    .repository
                    .find_by_nutrient_filter(&NutrientFilter::default())
                    .await?;
                Ok(local_report(FETCH_ALL_MENUS, items))
            }
        }
    }

    async fn persist(&self, response: MenuResponse) -> Result<SyncReport, SyncError> {
        let persisted = if response.source != FetchSource::StaleCache {
            self.repository.bulk_save(&response.items).await?;
            metrics::record_items_persisted(response.items.len());
            info!(count = response.items.len(), source = %response.source, "persisted menu items");
            response.items.len()
        } else {
            0
        };

        Ok(SyncReport {
            items: response.items,
            source: response.source.into(),
            persisted,
        })
    }
}

fn local_report(operation: &str, items: Vec<MenuItem>) -> SyncReport {
    let source = if items.is_empty() {
        DataOrigin::Empty
    } else {
        DataOrigin::Repository
    };
    warn!(operation, count = items.len(), source = source.as_str(), "no remote data, answering locally");
    metrics::record_fallback(operation, source.as_str());

    SyncReport {
        items,
        source,
        persisted: 0,
    }
}
