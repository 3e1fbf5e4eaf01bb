// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! ETag-based HTTP response cache.
//!
//! Two records are kept per request URL, stored independently so a request
//! can be revalidated without loading the payload:
//!
//! ```text
//! <ns>_etag:<url>   →  "W/\"abc123\""
//! <ns>_cache:<url>  →  {"etag": "...", "data": {...}, "timestamp": 1767084657058, "url": "..."}
//! ```
//!
//! # Freshness
//!
//! An entry is fresh while `now - timestamp <= ttl` (24 hours by default).
//! Stale entries are evicted lazily: [`EtagCache::get_cache`] removes them
//! when it finds them, nothing sweeps in the background.
//!
//! # Errors
//!
//! Backend failures propagate as [`StorageError`]. A payload record that
//! no longer parses is treated as missing and evicted.

pub mod clock;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::metrics;
use crate::storage::traits::{KeyValueStore, StorageError};
pub use clock::{Clock, ManualClock, SystemClock};

/// Default time-to-live of a cached payload.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Full cached response for one URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub etag: String,
    pub data: Value,
    /// Epoch millis at which the entry was written.
    pub timestamp: i64,
    pub url: String,
}

impl CacheEntry {
    #[must_use]
    pub fn age_millis(&self, now_millis: i64) -> i64 {
        now_millis - self.timestamp
    }

    #[must_use]
    pub fn is_fresh(&self, now_millis: i64, ttl: Duration) -> bool {
        self.age_millis(now_millis) <= ttl.as_millis() as i64
    }
}

/// Outcome of a non-evicting cache read.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Fresh(CacheEntry),
    Stale(CacheEntry),
    Missing,
}

impl CacheLookup {
    #[must_use]
    pub fn fresh(self) -> Option<CacheEntry> {
        match self {
            CacheLookup::Fresh(entry) => Some(entry),
            _ => None,
        }
    }

    /// The entry regardless of age.
    #[must_use]
    pub fn any(self) -> Option<CacheEntry> {
        match self {
            CacheLookup::Fresh(entry) | CacheLookup::Stale(entry) => Some(entry),
            CacheLookup::Missing => None,
        }
    }
}

/// Cache Entry Store over any [`KeyValueStore`].
pub struct EtagCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    cache_prefix: String,
    etag_prefix: String,
    ttl: Duration,
}

impl EtagCache {
    /// Cache under `namespace` (e.g. `@protein_finder`) with the default TTL.
    pub fn new(store: Arc<dyn KeyValueStore>, namespace: &str) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            cache_prefix: format!("{}_cache:", namespace),
            etag_prefix: format!("{}_etag:", namespace),
            ttl: DEFAULT_TTL,
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    #[must_use]
    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    fn cache_key(&self, url: &str) -> String {
        format!("{}{}", self.cache_prefix, url)
    }

    fn etag_key(&self, url: &str) -> String {
        format!("{}{}", self.etag_prefix, url)
    }

    pub async fn save_etag(&self, url: &str, etag: &str) -> Result<(), StorageError> {
        self.store.set(&self.etag_key(url), etag).await
    }

    pub async fn get_etag(&self, url: &str) -> Result<Option<String>, StorageError> {
        self.store.get(&self.etag_key(url)).await
    }

    /// Store `data` for `url`, replacing any previous entry and stamping it
    /// with the current time.
    pub async fn save_cache(&self, url: &str, data: Value, etag: &str) -> Result<(), StorageError> {
        let entry = CacheEntry {
            etag: etag.to_string(),
            data,
            timestamp: self.clock.now_millis(),
            url: url.to_string(),
        };
        let encoded = serde_json::to_string(&entry)?;
        self.store.set(&self.cache_key(url), &encoded).await?;
        debug!(url, etag, bytes = encoded.len(), "cached response");
        Ok(())
    }

    /// Read the entry for `url` and classify it without evicting anything.
    pub async fn lookup(&self, url: &str) -> Result<CacheLookup, StorageError> {
        let Some(raw) = self.store.get(&self.cache_key(url)).await? else {
            return Ok(CacheLookup::Missing);
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(url, error = %e, "discarding unreadable cache entry");
                self.remove_cache(url).await?;
                return Ok(CacheLookup::Missing);
            }
        };

        if entry.is_fresh(self.clock.now_millis(), self.ttl) {
            Ok(CacheLookup::Fresh(entry))
        } else {
            Ok(CacheLookup::Stale(entry))
        }
    }

    /// The entry for `url` if it is still fresh. A stale entry is evicted
    /// (payload and ETag) and reported as absent.
    pub async fn get_cache(&self, url: &str) -> Result<Option<CacheEntry>, StorageError> {
        match self.lookup(url).await? {
            CacheLookup::Fresh(entry) => {
                metrics::record_cache_lookup("hit");
                Ok(Some(entry))
            }
            CacheLookup::Stale(entry) => {
                debug!(url, age_ms = entry.age_millis(self.clock.now_millis()), "evicting stale cache entry");
                metrics::record_cache_lookup("expired");
                self.remove_cache(url).await?;
                Ok(None)
            }
            CacheLookup::Missing => {
                metrics::record_cache_lookup("miss");
                Ok(None)
            }
        }
    }

    /// Delete both the ETag and the payload record for `url`.
    pub async fn remove_cache(&self, url: &str) -> Result<(), StorageError> {
        self.store
            .remove_many(&[self.cache_key(url), self.etag_key(url)])
            .await
    }

    /// Delete every record in this cache's namespace. Other keys in a shared
    /// store are left alone.
    pub async fn clear_all_cache(&self) -> Result<(), StorageError> {
        let mut keys = self.store.keys_with_prefix(&self.cache_prefix).await?;
        keys.extend(self.store.keys_with_prefix(&self.etag_prefix).await?);
        if !keys.is_empty() {
            debug!(count = keys.len(), "clearing cache namespace");
            self.store.remove_many(&keys).await?;
        }
        Ok(())
    }

    /// Total serialized size of all payload records, in bytes.
    pub async fn cache_size(&self) -> Result<usize, StorageError> {
        let mut total = 0;
        for key in self.store.keys_with_prefix(&self.cache_prefix).await? {
            if let Some(value) = self.store.get(&key).await? {
                total += value.len();
            }
        }
        Ok(total)
    }
}
