// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! SQLite plumbing shared by the key-value cache backend and the menu
//! repository.
//!
//! Key-value schema:
//! ```sql
//! CREATE TABLE kv_store (
//!   key   TEXT PRIMARY KEY,
//!   value TEXT NOT NULL
//! )
//! ```
//!
//! File databases run in WAL mode. In-memory databases are pinned to a
//! single connection: every SQLite connection to `:memory:` opens its own
//! private database, so a larger pool would silently lose writes.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use sqlx::Row;
use tracing::debug;

use super::traits::{KeyValueStore, StorageError};
use crate::resilience::retry::{retry, RetryConfig};

/// Whether a connection string points at a private in-memory database.
#[must_use]
pub fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Open a SQLite pool with startup-mode retry.
pub async fn connect_sqlite(url: &str, max_connections: u32) -> Result<SqlitePool, StorageError> {
    let in_memory = is_memory_url(url);

    let mut options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);
    if !in_memory {
        options = options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
    }

    let pool = retry("sqlite_connect", &RetryConfig::startup(), || {
        let options = options.clone();
        async move {
            let mut pool_options = SqlitePoolOptions::new()
                .acquire_timeout(Duration::from_secs(10));
            pool_options = if in_memory {
                pool_options
                    .max_connections(1)
                    .min_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
            } else {
                pool_options
                    .max_connections(max_connections.max(1))
                    .idle_timeout(Duration::from_secs(300))
            };
            pool_options.connect_with(options).await
        }
    })
    .await?;

    debug!(url, in_memory, "sqlite pool ready");
    Ok(pool)
}

/// Key-value backend stored in a SQLite table.
pub struct SqliteKvStore {
    pool: SqlitePool,
}

impl SqliteKvStore {
    /// Open (or create) the database at `url` and ensure the table exists.
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        let pool = connect_sqlite(url, 2).await?;
        Self::with_pool(pool).await
    }

    /// Reuse an existing pool, e.g. the repository's.
    pub async fn with_pool(pool: SqlitePool) -> Result<Self, StorageError> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    #[must_use]
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    async fn init_schema(&self) -> Result<(), StorageError> {
        retry("kv_init_schema", &RetryConfig::startup(), || async {
            sqlx::query(
                "CREATE TABLE IF NOT EXISTS kv_store (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                )",
            )
            .execute(&self.pool)
            .await
        })
        .await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for SqliteKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(row.try_get::<String, _>("value")?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        retry("kv_set", &RetryConfig::query(), || async {
            sqlx::query(
                "INSERT INTO kv_store (key, value) VALUES (?, ?)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            )
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await
        })
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let rows = sqlx::query("SELECT key FROM kv_store ORDER BY key")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("key").map_err(StorageError::from))
            .collect()
    }

    async fn remove_many(&self, keys: &[String]) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        for key in keys {
            sqlx::query("DELETE FROM kv_store WHERE key = ?")
                .bind(key)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    // substr() instead of LIKE: URLs routinely contain `_` and `%`.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let rows = sqlx::query("SELECT key FROM kv_store WHERE substr(key, 1, length(?)) = ? ORDER BY key")
            .bind(prefix)
            .bind(prefix)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("key").map_err(StorageError::from))
            .collect()
    }
}
