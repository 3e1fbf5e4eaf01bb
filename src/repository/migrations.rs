// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Versioned schema for the menu database.
//!
//! Applied versions are recorded in `schema_migrations`. Each migration runs
//! in its own transaction, so a failure leaves the schema at the previous
//! version. Running [`migrate`] again is a no-op once every version is
//! applied.

use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tracing::{debug, info};

use crate::resilience::retry::{retry, RetryConfig};
use crate::storage::traits::StorageError;

pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub statements: &'static [&'static str],
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "menu_items_and_chains",
        statements: &[
            "CREATE TABLE IF NOT EXISTS menu_items (
                id TEXT PRIMARY KEY,
                chain TEXT NOT NULL,
                name TEXT NOT NULL,
                category TEXT,
                per TEXT NOT NULL CHECK (per IN ('serving', '100g')),
                protein_g REAL NOT NULL,
                fat_g REAL,
                carbs_g REAL,
                fiber_g REAL,
                sodium_mg REAL,
                energy_kcal REAL,
                calories_kcal REAL,
                serving_size TEXT,
                allergens TEXT,
                last_seen_at TEXT NOT NULL,
                source_url TEXT NOT NULL,
                source_hash TEXT NOT NULL,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT DEFAULT CURRENT_TIMESTAMP
            )",
            "CREATE TABLE IF NOT EXISTS chains (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                display_name TEXT NOT NULL,
                logo_url TEXT,
                website_url TEXT,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP
            )",
            "CREATE INDEX IF NOT EXISTS idx_menu_chain ON menu_items(chain)",
            "CREATE INDEX IF NOT EXISTS idx_menu_protein ON menu_items(protein_g DESC)",
            "CREATE INDEX IF NOT EXISTS idx_menu_per ON menu_items(per)",
            "CREATE INDEX IF NOT EXISTS idx_menu_name ON menu_items(name)",
        ],
    },
    Migration {
        version: 2,
        name: "chain_provenance",
        statements: &[
            "ALTER TABLE chains ADD COLUMN nutrition_page_url TEXT",
            "ALTER TABLE chains ADD COLUMN terms_url TEXT",
            "ALTER TABLE chains ADD COLUMN data_collection_method TEXT NOT NULL DEFAULT 'manual'",
            "ALTER TABLE chains ADD COLUMN legal_notice TEXT",
            "CREATE TABLE IF NOT EXISTS data_sources (
                id TEXT PRIMARY KEY,
                chain_id TEXT NOT NULL REFERENCES chains(id),
                source_type TEXT NOT NULL,
                source_url TEXT,
                last_fetched_at TEXT,
                fetch_method TEXT NOT NULL,
                data_accuracy_note TEXT,
                legal_compliance_note TEXT,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT DEFAULT CURRENT_TIMESTAMP
            )",
            "CREATE TABLE IF NOT EXISTS legal_notices (
                id TEXT PRIMARY KEY,
                type TEXT NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                version TEXT NOT NULL,
                effective_date TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP
            )",
        ],
    },
    Migration {
        version: 3,
        name: "menu_item_provenance",
        statements: &[
            "ALTER TABLE menu_items ADD COLUMN data_source_id TEXT",
            "ALTER TABLE menu_items ADD COLUMN last_manual_update TEXT",
            "CREATE INDEX IF NOT EXISTS idx_menu_data_source ON menu_items(data_source_id)",
        ],
    },
];

/// Latest version known to this build.
#[must_use]
pub fn latest_version() -> i64 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

/// Highest applied version, `0` for a fresh database.
pub async fn current_version(pool: &SqlitePool) -> Result<i64, StorageError> {
    let row = sqlx::query("SELECT COALESCE(MAX(version), 0) AS version FROM schema_migrations")
        .fetch_one(pool)
        .await?;
    Ok(row.try_get::<i64, _>("version")?)
}

/// Apply every pending migration in order. Returns the resulting version.
pub async fn migrate(pool: &SqlitePool) -> Result<i64, StorageError> {
    retry("schema_migrations_init", &RetryConfig::startup(), || async {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(pool)
        .await
    })
    .await?;

    let current = current_version(pool).await?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        apply(pool, migration).await.map_err(|e| StorageError::Migration {
            version: migration.version,
            reason: e.to_string(),
        })?;
        info!(version = migration.version, name = migration.name, "applied schema migration");
    }

    let version = current_version(pool).await?;
    debug!(version, "schema up to date");
    Ok(version)
}

async fn apply(pool: &SqlitePool, migration: &Migration) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for statement in migration.statements {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    sqlx::query("INSERT INTO schema_migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sql::connect_sqlite;

    #[test]
    fn test_versions_are_ascending() {
        let versions: Vec<i64> = MIGRATIONS.iter().map(|m| m.version).collect();
        assert_eq!(versions, vec![1, 2, 3]);
        assert_eq!(latest_version(), 3);
    }

    #[tokio::test]
    async fn test_migrate_fresh_database() {
        let pool = connect_sqlite("sqlite::memory:", 1).await.unwrap();
        assert_eq!(migrate(&pool).await.unwrap(), 3);

        // v2 and v3 columns exist
        sqlx::query("SELECT nutrition_page_url, legal_notice FROM chains")
            .fetch_all(&pool)
            .await
            .unwrap();
        sqlx::query("SELECT data_source_id, last_manual_update FROM menu_items")
            .fetch_all(&pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let pool = connect_sqlite("sqlite::memory:", 1).await.unwrap();
        migrate(&pool).await.unwrap();
        assert_eq!(migrate(&pool).await.unwrap(), 3);

        let row = sqlx::query("SELECT COUNT(*) AS n FROM schema_migrations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(row.try_get::<i64, _>("n").unwrap(), 3);
    }

    #[tokio::test]
    async fn test_upgrade_from_v1() {
        let pool = connect_sqlite("sqlite::memory:", 1).await.unwrap();
        sqlx::query(
            "CREATE TABLE schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&pool)
        .await
        .unwrap();
        apply(&pool, &MIGRATIONS[0]).await.unwrap();
        assert_eq!(current_version(&pool).await.unwrap(), 1);

        assert_eq!(migrate(&pool).await.unwrap(), 3);
    }
}
