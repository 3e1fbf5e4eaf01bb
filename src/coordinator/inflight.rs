// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Per-URL serialisation of identical fetches.
//!
//! A second caller for the same URL waits for the first to finish and then
//! runs its own fetch, which normally ends at the fresh cache entry the
//! first one wrote. One lock is kept per distinct URL; the set of URLs is
//! bounded by the number of chains.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::metrics;

pub(crate) struct InflightRequests {
    enabled: bool,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl InflightRequests {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            locks: DashMap::new(),
        }
    }

    /// Hold the returned guard for the duration of the fetch. `None` when
    /// de-duplication is disabled.
    pub(crate) async fn acquire(&self, url: &str, operation: &str) -> Option<OwnedMutexGuard<()>> {
        if !self.enabled {
            return None;
        }

        let lock = self
            .locks
            .entry(url.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        match lock.clone().try_lock_owned() {
            Ok(guard) => Some(guard),
            Err(_) => {
                debug!(url, operation, "waiting for in-flight request");
                metrics::record_inflight_wait(operation);
                Some(lock.lock_owned().await)
            }
        }
    }
}
