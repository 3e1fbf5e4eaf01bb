// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Fetch API: cache check, conditional request, stale fallback.
//!
//! ```text
//! CacheCheck ──fresh──────────────────────────────▶ Cache
//!     │ stale / missing / forced
//!     ▼
//! ConditionalFetch ──200──▶ validate, cache ──────▶ Network
//!     │          └────304──▶ cached payload ──────▶ NotModified (or absent)
//!     │ transport error, bad status, bad body
//!     ▼
//! any cached payload, regardless of age ──────────▶ StaleCache (or absent)
//! ```

use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::chains::fallback_chains;
use super::types::{FetchOptions, FetchSource, MenuResponse, SyncError};
use super::MenuSyncService;
use crate::api::{ChainsResponse, FetchOutcome, MenusResponse, TransportError};
use crate::cache::{CacheEntry, CacheLookup};
use crate::domain::ChainInfo;
use crate::metrics;

pub(crate) const FETCH_MENUS: &str = "fetch_menus";
pub(crate) const FETCH_ALL_MENUS: &str = "fetch_all_menus";
const FETCH_CHAINS: &str = "fetch_chains";

/// Epoch millis as an RFC 3339 timestamp.
pub(crate) fn format_millis(millis: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()
        .and_then(|t| t.format(&Rfc3339).ok())
        .unwrap_or_default()
}

impl MenuSyncService {
    /// Menus of one chain.
    ///
    /// `Ok(None)` means nothing could be served: the request failed and no
    /// cached payload exists. Only storage failures and invalid server
    /// payloads are errors.
    #[instrument(skip(self), fields(force = options.force_refresh))]
    pub async fn fetch_menus_by_chain(
        &self,
        chain: &str,
        options: FetchOptions,
    ) -> Result<Option<MenuResponse>, SyncError> {
        let url = match self.api.menus_url(Some(chain)) {
            Ok(url) => url,
            Err(e) => {
                warn!(chain, error = %e, "cannot build menu URL");
                return Ok(None);
            }
        };
        self.fetch_menus(FETCH_MENUS, url, options).await
    }

    /// Menus of every chain. Same contract as
    /// [`fetch_menus_by_chain`](Self::fetch_menus_by_chain).
    #[instrument(skip(self), fields(force = options.force_refresh))]
    pub async fn fetch_all_menus(
        &self,
        options: FetchOptions,
    ) -> Result<Option<MenuResponse>, SyncError> {
        let url = match self.api.menus_url(None) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "cannot build menu URL");
                return Ok(None);
            }
        };
        self.fetch_menus(FETCH_ALL_MENUS, url, options).await
    }

    /// Chain list from the server, or the built-in list when the request
    /// fails. Never cached.
    #[instrument(skip(self))]
    pub async fn fetch_available_chains(&self) -> Vec<ChainInfo> {
        let result = match self.api.chains_url() {
            Ok(url) => self.api.get_json::<ChainsResponse>(&url).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(response) => {
                metrics::record_fetch(FETCH_CHAINS, "network");
                response.chains
            }
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "chain list unavailable, using built-in list");
                metrics::record_fallback(FETCH_CHAINS, "fallback");
                fallback_chains()
            }
        }
    }

    /// Drop every cached payload and ETag.
    pub async fn clear_cache(&self) -> Result<(), SyncError> {
        self.cache.clear_all_cache().await?;
        info!("menu cache cleared");
        Ok(())
    }

    async fn fetch_menus(
        &self,
        operation: &'static str,
        url: Url,
        options: FetchOptions,
    ) -> Result<Option<MenuResponse>, SyncError> {
        let key = url.as_str();
        let _guard = self.inflight.acquire(key, operation).await;

        let mut stale = None;
        if !options.force_refresh {
            match self.cache.lookup(key).await? {
                CacheLookup::Fresh(entry) => {
                    metrics::record_cache_lookup("hit");
                    if let Some(response) = cached_response(entry, FetchSource::Cache) {
                        debug!(url = key, "serving fresh cache entry");
                        metrics::record_fetch(operation, "cache");
                        return Ok(Some(response));
                    }
                    self.cache.remove_cache(key).await?;
                }
                CacheLookup::Stale(entry) => {
                    metrics::record_cache_lookup("expired");
                    stale = Some(entry);
                }
                CacheLookup::Missing => metrics::record_cache_lookup("miss"),
            }
        }

        let etag = if options.force_refresh {
            None
        } else {
            self.cache.get_etag(key).await?
        };

        match self.api.get_conditional(&url, etag.as_deref()).await {
            Ok(FetchOutcome::Fresh {
                body,
                etag,
                last_modified,
            }) => self.accept_fresh(operation, key, body, etag, last_modified).await,
            Ok(FetchOutcome::NotModified) => self.revalidated(operation, &url, stale).await,
            Err(e) => self.serve_stale(operation, key, &e).await,
        }
    }

    /// Validate a 200 body, cache it when the server sent an ETag, and
    /// return it.
    async fn accept_fresh(
        &self,
        operation: &'static str,
        key: &str,
        body: Value,
        etag: Option<String>,
        last_modified: Option<String>,
    ) -> Result<Option<MenuResponse>, SyncError> {
        let payload: MenusResponse = match serde_json::from_value(body.clone()) {
            Ok(payload) => payload,
            Err(e) => return self.serve_stale(operation, key, &TransportError::Decode(e)).await,
        };
        let items = match payload.into_items() {
            Ok(items) => items,
            Err(e) => {
                warn!(url = key, error = %e, "server sent an invalid menu item");
                metrics::record_error(operation, "validation");
                return Err(e.into());
            }
        };

        let etag = etag.filter(|e| !e.is_empty());
        if let Some(etag) = &etag {
            self.cache.save_etag(key, etag).await?;
            self.cache.save_cache(key, body, etag).await?;
        }

        let last_modified =
            last_modified.unwrap_or_else(|| format_millis(self.cache.now_millis()));
        info!(url = key, items = items.len(), cached = etag.is_some(), "fetched menus");
        metrics::record_fetch(operation, "network");
        Ok(Some(MenuResponse {
            items,
            etag,
            last_modified,
            source: FetchSource::Network,
        }))
    }

    /// Handle a 304. A stale entry we sent the ETag for has just been
    /// confirmed by the server and is re-stamped.
    async fn revalidated(
        &self,
        operation: &'static str,
        url: &Url,
        stale: Option<CacheEntry>,
    ) -> Result<Option<MenuResponse>, SyncError> {
        let key = url.as_str();
        let entry = match stale {
            Some(entry) => {
                self.cache.save_cache(key, entry.data.clone(), &entry.etag).await?;
                Some(entry)
            }
            None => self.cache.get_cache(key).await?,
        };

        if let Some(response) = entry.and_then(|e| cached_response(e, FetchSource::NotModified)) {
            metrics::record_fetch(operation, "not_modified");
            return Ok(Some(response));
        }

        warn!(url = key, "304 Not Modified but the cached payload is gone");
        if self.config.refetch_on_orphaned_not_modified {
            match self.api.get_conditional(url, None).await {
                Ok(FetchOutcome::Fresh {
                    body,
                    etag,
                    last_modified,
                }) => return self.accept_fresh(operation, key, body, etag, last_modified).await,
                Ok(FetchOutcome::NotModified) => {
                    warn!(url = key, "unconditional refetch answered 304")
                }
                Err(e) => warn!(url = key, error = %e, "unconditional refetch failed"),
            }
        }

        metrics::record_fallback(operation, "empty");
        Ok(None)
    }

    /// Serve whatever payload is cached for `key`, regardless of age.
    async fn serve_stale(
        &self,
        operation: &'static str,
        key: &str,
        error: &TransportError,
    ) -> Result<Option<MenuResponse>, SyncError> {
        warn!(url = key, error = %error, kind = error.kind(), "menu request failed, falling back to cache");

        if let Some(entry) = self.cache.lookup(key).await?.any() {
            if let Some(response) = cached_response(entry, FetchSource::StaleCache) {
                metrics::record_fallback(operation, "stale_cache");
                metrics::record_fetch(operation, "stale_cache");
                return Ok(Some(response));
            }
        }

        metrics::record_fallback(operation, "empty");
        Ok(None)
    }
}

/// Rebuild a response from a cache entry. `None` if the stored payload no
/// longer decodes or validates.
fn cached_response(entry: CacheEntry, source: FetchSource) -> Option<MenuResponse> {
    let CacheEntry {
        etag,
        data,
        timestamp,
        url,
    } = entry;

    let payload: MenusResponse = match serde_json::from_value(data) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(url = %url, error = %e, "cached payload no longer decodes");
            return None;
        }
    };
    let last_modified = payload
        .last_modified
        .clone()
        .unwrap_or_else(|| format_millis(timestamp));
    let items = match payload.into_items() {
        Ok(items) => items,
        Err(e) => {
            warn!(url = %url, error = %e, "cached payload holds an invalid item");
            return None;
        }
    };

    Some(MenuResponse {
        items,
        etag: Some(etag).filter(|e| !e.is_empty()),
        last_modified,
        source,
    })
}
