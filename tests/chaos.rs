// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Chaos Testing for Menu Sync
//!
//! This module tests failure scenarios using:
//! 1. **Failing wrappers** - precise error injection at specific call counts
//! 2. **Dead and slow servers** - connection refused, timeouts
//! 3. **Data corruption** - garbage data in the key-value backend
//!
//! # Running Chaos Tests
//! ```bash
//! cargo test --test chaos -- --nocapture
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use menu_sync::storage::memory::InMemoryKvStore;
use menu_sync::{
    ApiClient, DataOrigin, EtagCache, FetchOptions, FetchSource, KeyValueStore, MenuItem,
    MenuRepository, MenuSyncService, NutrientFilter, SqlMenuRepository, StorageError, SyncConfig,
    SyncError,
};

// =============================================================================
// Failing Wrappers - Precise Error Injection
// =============================================================================

/// Shared call counter deciding which calls fail.
struct Injector {
    call_count: AtomicU64,
    /// Fail on these call numbers (1-indexed)
    fail_on_calls: Vec<u64>,
    error_msg: String,
}

impl Injector {
    fn new(fail_on_calls: Vec<u64>, error_msg: &str) -> Self {
        Self {
            call_count: AtomicU64::new(0),
            fail_on_calls,
            error_msg: error_msg.to_string(),
        }
    }

    fn check(&self) -> Result<(), StorageError> {
        let call = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_calls.contains(&call) {
            return Err(StorageError::Backend(format!("{} (call {})", self.error_msg, call)));
        }
        Ok(())
    }

    fn calls(&self) -> u64 {
        self.call_count.load(Ordering::SeqCst)
    }
}

struct FailingKvStore {
    inner: InMemoryKvStore,
    injector: Injector,
}

impl FailingKvStore {
    fn new(fail_on_calls: Vec<u64>) -> Self {
        Self {
            inner: InMemoryKvStore::new(),
            injector: Injector::new(fail_on_calls, "injected kv failure"),
        }
    }
}

#[async_trait]
impl KeyValueStore for FailingKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.injector.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.injector.check()?;
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.injector.check()?;
        self.inner.remove(key).await
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.injector.check()?;
        self.inner.keys().await
    }
}

/// Fails writes or reads of the wrapped repository on demand.
struct FailingRepository {
    inner: SqlMenuRepository,
    writes: Injector,
    reads: Injector,
}

impl FailingRepository {
    async fn new(fail_writes: Vec<u64>, fail_reads: Vec<u64>) -> Self {
        Self {
            inner: SqlMenuRepository::connect("sqlite::memory:", 1)
                .await
                .expect("in-memory repository"),
            writes: Injector::new(fail_writes, "injected write failure"),
            reads: Injector::new(fail_reads, "injected read failure"),
        }
    }
}

#[async_trait]
impl MenuRepository for FailingRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<MenuItem>, StorageError> {
        self.reads.check()?;
        self.inner.find_by_id(id).await
    }

    async fn save(&self, item: &MenuItem) -> Result<(), StorageError> {
        self.writes.check()?;
        self.inner.save(item).await
    }

    async fn bulk_save(&self, items: &[MenuItem]) -> Result<(), StorageError> {
        self.writes.check()?;
        self.inner.bulk_save(items).await
    }

    async fn delete(&self, id: &str) -> Result<(), StorageError> {
        self.writes.check()?;
        self.inner.delete(id).await
    }

    async fn find_by_chain(&self, chain: &str) -> Result<Vec<MenuItem>, StorageError> {
        self.reads.check()?;
        self.inner.find_by_chain(chain).await
    }

    async fn search_by_name(&self, query: &str) -> Result<Vec<MenuItem>, StorageError> {
        self.reads.check()?;
        self.inner.search_by_name(query).await
    }

    async fn find_by_nutrient_filter(
        &self,
        filter: &NutrientFilter,
    ) -> Result<Vec<MenuItem>, StorageError> {
        self.reads.check()?;
        self.inner.find_by_nutrient_filter(filter).await
    }

    async fn get_available_chains(&self) -> Result<Vec<String>, StorageError> {
        self.reads.check()?;
        self.inner.get_available_chains().await
    }

    async fn get_last_updated_at(&self) -> Result<Option<String>, StorageError> {
        self.reads.check()?;
        self.inner.get_last_updated_at().await
    }

    async fn count(&self) -> Result<u64, StorageError> {
        self.reads.check()?;
        self.inner.count().await
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn menus_body() -> serde_json::Value {
    json!({
        "items": [{
            "id": "sukiya_gyudon_regular",
            "chain": "sukiya",
            "name": "牛丼（並盛）",
            "per": "serving",
            "nutrients": [{"type": "protein", "value": 22.9, "unit": "g"}],
            "lastSeenAt": "2025-08-30T00:00:00Z",
            "sourceUrl": "https://www.sukiya.jp/menu/in/gyudon/",
            "sourceHash": "sukiya_gyudon_regular_2025-08-30"
        }]
    })
}

async fn healthy_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "\"v1\"")
                .set_body_json(menus_body()),
        )
        .mount(&server)
        .await;
    server
}

fn service(
    base_url: &str,
    timeout: Duration,
    store: Arc<dyn KeyValueStore>,
    repository: Arc<dyn MenuRepository>,
) -> MenuSyncService {
    let config = SyncConfig {
        api_base_url: base_url.to_string(),
        ..Default::default()
    };
    let cache = EtagCache::new(store, &config.cache_namespace);
    let api = ApiClient::new(base_url, timeout).expect("api client");
    MenuSyncService::from_parts(config, api, cache, repository)
}

// =============================================================================
// Storage failures propagate
// =============================================================================

#[tokio::test]
async fn test_cache_read_failure_is_a_storage_error() {
    let server = healthy_server().await;
    let store = Arc::new(FailingKvStore::new(vec![1]));
    let repo = Arc::new(FailingRepository::new(vec![], vec![]).await);
    let service = service(&server.uri(), Duration::from_secs(5), store.clone(), repo);

    let err = service
        .fetch_menus_by_chain("sukiya", FetchOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Storage(StorageError::Backend(_))));
    assert_eq!(err.kind(), "storage");

    // Next call goes through
    let ok = service
        .fetch_menus_by_chain("sukiya", FetchOptions::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ok.source, FetchSource::Network);
    assert!(store.injector.calls() > 1);
}

#[tokio::test]
async fn test_cache_write_failure_is_a_storage_error() {
    let server = healthy_server().await;
    // get(cache), get(etag), then set(etag) fails
    let store = Arc::new(FailingKvStore::new(vec![3]));
    let repo = Arc::new(FailingRepository::new(vec![], vec![]).await);
    let service = service(&server.uri(), Duration::from_secs(5), store, repo);

    let err = service
        .fetch_menus_by_chain("sukiya", FetchOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Storage(_)));
}

#[tokio::test]
async fn test_bulk_save_failure_surfaces_from_sync() {
    let server = healthy_server().await;
    let store = Arc::new(InMemoryKvStore::new());
    let repo = Arc::new(FailingRepository::new(vec![1], vec![]).await);
    let service = service(&server.uri(), Duration::from_secs(5), store, repo.clone());

    let err = service
        .sync_chain("sukiya", FetchOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Storage(_)));
    assert_eq!(repo.inner.count().await.unwrap(), 0);

    // The payload was cached before the write failed; a plain sync retries it
    let report = service.sync_chain("sukiya", FetchOptions::default()).await.unwrap();
    assert_eq!(report.source, DataOrigin::Cache);
    assert_eq!(report.persisted, 1);
    assert_eq!(repo.inner.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_repository_fallback_read_failure_surfaces() {
    let store = Arc::new(InMemoryKvStore::new());
    let repo = Arc::new(FailingRepository::new(vec![], vec![1]).await);
    // Nothing listens on port 1
    let service = service("http://127.0.0.1:1", Duration::from_secs(2), store, repo);

    let err = service
        .sync_chain("sukiya", FetchOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Storage(_)));
}

// =============================================================================
// Transport failures degrade
// =============================================================================

#[tokio::test]
async fn test_connection_refused_degrades_to_absent() {
    let store = Arc::new(InMemoryKvStore::new());
    let repo = Arc::new(FailingRepository::new(vec![], vec![]).await);
    let service = service("http://127.0.0.1:1", Duration::from_secs(2), store, repo);

    let fetched = service
        .fetch_all_menus(FetchOptions::default())
        .await
        .unwrap();
    assert!(fetched.is_none());

    let report = service.sync_all(FetchOptions::default()).await.unwrap();
    assert_eq!(report.source, DataOrigin::Empty);

    assert_eq!(service.fetch_available_chains().await.len(), 10);
}

#[tokio::test]
async fn test_timeout_degrades_to_stale_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "\"v1\"")
                .set_body_json(menus_body()),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(menus_body())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryKvStore::new());
    let repo = Arc::new(FailingRepository::new(vec![], vec![]).await);
    let service = service(&server.uri(), Duration::from_millis(300), store, repo);

    service
        .fetch_menus_by_chain("sukiya", FetchOptions::default())
        .await
        .unwrap()
        .unwrap();

    // Forced refresh skips the fresh entry, times out, and falls back to it
    let response = service
        .fetch_menus_by_chain("sukiya", FetchOptions::forced())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(response.source, FetchSource::StaleCache);
    assert_eq!(response.items.len(), 1);
}

// =============================================================================
// Data corruption
// =============================================================================

#[tokio::test]
async fn test_garbage_cache_entry_is_refetched() {
    let server = healthy_server().await;
    let store = Arc::new(InMemoryKvStore::new());
    let url = format!("{}/menus/sukiya", server.uri());
    store
        .set(&format!("@protein_finder_cache:{}", url), "{not json")
        .await
        .unwrap();

    let repo = Arc::new(FailingRepository::new(vec![], vec![]).await);
    let service = service(&server.uri(), Duration::from_secs(5), store.clone(), repo);

    let response = service
        .fetch_menus_by_chain("sukiya", FetchOptions::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(response.source, FetchSource::Network);

    let raw = store
        .get(&format!("@protein_finder_cache:{}", url))
        .await
        .unwrap()
        .unwrap();
    assert!(raw.contains("sukiya_gyudon_regular"));
}

#[tokio::test]
async fn test_cached_payload_that_no_longer_validates_is_replaced() {
    let server = healthy_server().await;
    let store = Arc::new(InMemoryKvStore::new());
    let url = format!("{}/menus/sukiya", server.uri());
    let entry = json!({
        "etag": "\"old\"",
        "data": {"items": [{"id": "", "chain": "sukiya", "name": "x", "per": "serving",
                            "lastSeenAt": "t", "sourceUrl": "u", "sourceHash": "h"}]},
        "timestamp": i64::MAX / 2,
        "url": url
    });
    store
        .set(&format!("@protein_finder_cache:{}", url), &entry.to_string())
        .await
        .unwrap();

    let repo = Arc::new(FailingRepository::new(vec![], vec![]).await);
    let service = service(&server.uri(), Duration::from_secs(5), store, repo);

    let response = service
        .fetch_menus_by_chain("sukiya", FetchOptions::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(response.source, FetchSource::Network);
    assert_eq!(response.etag.as_deref(), Some("\"v1\""));
}
