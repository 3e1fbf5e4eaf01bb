// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! SQLite-backed [`MenuRepository`].
//!
//! Upserts use `INSERT ... ON CONFLICT(id) DO UPDATE`, which keeps
//! `created_at` and refreshes `updated_at`. Writes go through the query
//! retry preset; reads do not retry.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::sqlite::{Sqlite, SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::{debug, instrument};

use super::filter::{FilterTranslator, NutrientFilter, SqlParam};
use super::migrations;
use super::rows::{
    chain_from_row, data_source_from_row, encode_allergens, menu_item_from_row, NutrientColumns,
};
use super::MenuRepository;
use crate::domain::{Chain, DataSource, LegalNotice, MenuItem};
use crate::metrics;
use crate::resilience::retry::{retry, RetryConfig};
use crate::storage::sql::connect_sqlite;
use crate::storage::traits::StorageError;

const ORDER_BY: &str = "ORDER BY protein_g DESC, id ASC";

const UPSERT_MENU_ITEM: &str = "INSERT INTO menu_items (
        id, chain, name, category, per,
        protein_g, fat_g, carbs_g, fiber_g, sodium_mg, energy_kcal, calories_kcal,
        serving_size, allergens, last_seen_at, source_url, source_hash,
        data_source_id, last_manual_update, updated_at
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
    ON CONFLICT(id) DO UPDATE SET
        chain = excluded.chain,
        name = excluded.name,
        category = excluded.category,
        per = excluded.per,
        protein_g = excluded.protein_g,
        fat_g = excluded.fat_g,
        carbs_g = excluded.carbs_g,
        fiber_g = excluded.fiber_g,
        sodium_mg = excluded.sodium_mg,
        energy_kcal = excluded.energy_kcal,
        calories_kcal = excluded.calories_kcal,
        serving_size = excluded.serving_size,
        allergens = excluded.allergens,
        last_seen_at = excluded.last_seen_at,
        source_url = excluded.source_url,
        source_hash = excluded.source_hash,
        data_source_id = excluded.data_source_id,
        last_manual_update = excluded.last_manual_update,
        updated_at = CURRENT_TIMESTAMP";

/// Owned bind values for one `menu_items` upsert.
#[derive(Debug, Clone)]
struct MenuRow {
    id: String,
    chain: String,
    name: String,
    category: Option<String>,
    per: &'static str,
    nutrients: NutrientColumns,
    serving_size: Option<String>,
    allergens: Option<String>,
    last_seen_at: String,
    source_url: String,
    source_hash: String,
    data_source_id: Option<String>,
    last_manual_update: Option<String>,
}

impl MenuRow {
    fn from_item(item: &MenuItem) -> Result<Self, StorageError> {
        Ok(Self {
            id: item.id().to_string(),
            chain: item.chain().to_string(),
            name: item.name().to_string(),
            category: item.category().map(str::to_string),
            per: item.per().as_str(),
            nutrients: NutrientColumns::from_item(item),
            serving_size: item.serving_size().map(str::to_string),
            allergens: encode_allergens(item.allergens())?,
            last_seen_at: item.last_seen_at().to_string(),
            source_url: item.source_url().to_string(),
            source_hash: item.source_hash().to_string(),
            data_source_id: item.data_source_id().map(str::to_string),
            last_manual_update: item.last_manual_update().map(str::to_string),
        })
    }
}

async fn upsert<'c, E>(executor: E, row: &MenuRow) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'c, Database = Sqlite>,
{
    let n = row.nutrients;
    sqlx::query(UPSERT_MENU_ITEM)
        .bind(row.id.clone())
        .bind(row.chain.clone())
        .bind(row.name.clone())
        .bind(row.category.clone())
        .bind(row.per)
        .bind(n.protein_g)
        .bind(n.fat_g)
        .bind(n.carbs_g)
        .bind(n.fiber_g)
        .bind(n.sodium_mg)
        .bind(n.energy_kcal)
        .bind(n.calories_kcal)
        .bind(row.serving_size.clone())
        .bind(row.allergens.clone())
        .bind(row.last_seen_at.clone())
        .bind(row.source_url.clone())
        .bind(row.source_hash.clone())
        .bind(row.data_source_id.clone())
        .bind(row.last_manual_update.clone())
        .execute(executor)
        .await?;
    Ok(())
}

fn items_from_rows(rows: &[SqliteRow]) -> Result<Vec<MenuItem>, StorageError> {
    rows.iter().map(menu_item_from_row).collect()
}

fn escape_like(query: &str) -> String {
    query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub struct SqlMenuRepository {
    pool: SqlitePool,
}

impl SqlMenuRepository {
    /// Open the database at `url` and bring the schema up to date.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let pool = connect_sqlite(url, max_connections).await?;
        Self::with_pool(pool).await
    }

    /// Use an existing pool, running pending migrations first.
    pub async fn with_pool(pool: SqlitePool) -> Result<Self, StorageError> {
        migrations::migrate(&pool).await?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    pub async fn schema_version(&self) -> Result<i64, StorageError> {
        migrations::current_version(&self.pool).await
    }

    // ---- chain reference data ----

    pub async fn save_chain(&self, chain: &Chain) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO chains (
                id, name, display_name, logo_url, website_url, nutrition_page_url,
                terms_url, data_collection_method, legal_notice, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, COALESCE(NULLIF(?, ''), CURRENT_TIMESTAMP))
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                display_name = excluded.display_name,
                logo_url = excluded.logo_url,
                website_url = excluded.website_url,
                nutrition_page_url = excluded.nutrition_page_url,
                terms_url = excluded.terms_url,
                data_collection_method = excluded.data_collection_method,
                legal_notice = excluded.legal_notice",
        )
        .bind(&chain.id)
        .bind(&chain.name)
        .bind(&chain.display_name)
        .bind(&chain.logo_url)
        .bind(&chain.website_url)
        .bind(&chain.nutrition_page_url)
        .bind(&chain.terms_url)
        .bind(chain.data_collection_method.as_str())
        .bind(&chain.legal_notice)
        .bind(&chain.created_at)
        .execute(&self.pool)
        .await?;
        debug!(chain = %chain.id, "saved chain");
        Ok(())
    }

    pub async fn find_chain(&self, id: &str) -> Result<Option<Chain>, StorageError> {
        let row = sqlx::query("SELECT * FROM chains WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(chain_from_row).transpose()
    }

    pub async fn list_chains(&self) -> Result<Vec<Chain>, StorageError> {
        let rows = sqlx::query("SELECT * FROM chains ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(chain_from_row).collect()
    }

    /// Upsert a provenance record. The chain must already exist.
    pub async fn save_data_source(&self, source: &DataSource) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO data_sources (
                id, chain_id, source_type, source_url, last_fetched_at, fetch_method,
                data_accuracy_note, legal_compliance_note, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, COALESCE(NULLIF(?, ''), CURRENT_TIMESTAMP), CURRENT_TIMESTAMP)
            ON CONFLICT(id) DO UPDATE SET
                chain_id = excluded.chain_id,
                source_type = excluded.source_type,
                source_url = excluded.source_url,
                last_fetched_at = excluded.last_fetched_at,
                fetch_method = excluded.fetch_method,
                data_accuracy_note = excluded.data_accuracy_note,
                legal_compliance_note = excluded.legal_compliance_note,
                updated_at = CURRENT_TIMESTAMP",
        )
        .bind(&source.id)
        .bind(&source.chain_id)
        .bind(source.source_type.as_str())
        .bind(&source.source_url)
        .bind(&source.last_fetched_at)
        .bind(source.fetch_method.as_str())
        .bind(&source.data_accuracy_note)
        .bind(&source.legal_compliance_note)
        .bind(&source.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_data_sources(&self, chain_id: &str) -> Result<Vec<DataSource>, StorageError> {
        let rows = sqlx::query("SELECT * FROM data_sources WHERE chain_id = ? ORDER BY id")
            .bind(chain_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(data_source_from_row).collect()
    }

    pub async fn save_legal_notice(&self, notice: &LegalNotice) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO legal_notices (
                id, type, title, content, version, effective_date, is_active, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, COALESCE(NULLIF(?, ''), CURRENT_TIMESTAMP))
            ON CONFLICT(id) DO UPDATE SET
                type = excluded.type,
                title = excluded.title,
                content = excluded.content,
                version = excluded.version,
                effective_date = excluded.effective_date,
                is_active = excluded.is_active",
        )
        .bind(&notice.id)
        .bind(&notice.notice_type)
        .bind(&notice.title)
        .bind(&notice.content)
        .bind(&notice.version)
        .bind(&notice.effective_date)
        .bind(notice.is_active)
        .bind(&notice.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Active notices, newest effective date first.
    pub async fn active_legal_notices(&self) -> Result<Vec<LegalNotice>, StorageError> {
        let rows = sqlx::query(
            "SELECT * FROM legal_notices WHERE is_active = 1 ORDER BY effective_date DESC, id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|row| {
                Ok(LegalNotice {
                    id: row.try_get("id")?,
                    notice_type: row.try_get("type")?,
                    title: row.try_get("title")?,
                    content: row.try_get("content")?,
                    version: row.try_get("version")?,
                    effective_date: row.try_get("effective_date")?,
                    is_active: row.try_get("is_active")?,
                    created_at: row.try_get::<Option<String>, _>("created_at")?.unwrap_or_default(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl MenuRepository for SqlMenuRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<MenuItem>, StorageError> {
        let row = sqlx::query("SELECT * FROM menu_items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(menu_item_from_row).transpose()
    }

    #[instrument(skip(self, item), fields(id = %item.id()))]
    async fn save(&self, item: &MenuItem) -> Result<(), StorageError> {
        let start = Instant::now();
        let row = MenuRow::from_item(item)?;
        let result = retry("menu_item_save", &RetryConfig::query(), || upsert(&self.pool, &row)).await;
        metrics::record_repository_op("save", result.is_ok(), start.elapsed());
        result?;
        Ok(())
    }

    #[instrument(skip(self, items), fields(count = items.len()))]
    async fn bulk_save(&self, items: &[MenuItem]) -> Result<(), StorageError> {
        if items.is_empty() {
            return Ok(());
        }
        let start = Instant::now();
        let rows = items
            .iter()
            .map(MenuRow::from_item)
            .collect::<Result<Vec<_>, _>>()?;

        let result = retry("menu_item_bulk_save", &RetryConfig::query(), || async {
            let mut tx = self.pool.begin().await?;
            for row in &rows {
                upsert(&mut *tx, row).await?;
            }
            tx.commit().await
        })
        .await;

        metrics::record_repository_op("bulk_save", result.is_ok(), start.elapsed());
        result?;
        debug!(count = rows.len(), "bulk saved menu items");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM menu_items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_by_chain(&self, chain: &str) -> Result<Vec<MenuItem>, StorageError> {
        let sql = format!("SELECT * FROM menu_items WHERE chain = ? {}", ORDER_BY);
        let rows = sqlx::query(&sql).bind(chain).fetch_all(&self.pool).await?;
        items_from_rows(&rows)
    }

    async fn search_by_name(&self, query: &str) -> Result<Vec<MenuItem>, StorageError> {
        let sql = format!(
            "SELECT * FROM menu_items WHERE LOWER(name) LIKE LOWER(?) ESCAPE '\\' {}",
            ORDER_BY
        );
        let rows = sqlx::query(&sql)
            .bind(format!("%{}%", escape_like(query)))
            .fetch_all(&self.pool)
            .await?;
        items_from_rows(&rows)
    }

    async fn find_by_nutrient_filter(
        &self,
        filter: &NutrientFilter,
    ) -> Result<Vec<MenuItem>, StorageError> {
        let translated = FilterTranslator::translate(filter);
        let sql = format!("SELECT * FROM menu_items WHERE {} {}", translated.clause, ORDER_BY);
        debug!(clause = %translated.clause, "nutrient filter query");

        let mut query = sqlx::query(&sql);
        for param in translated.params {
            query = match param {
                SqlParam::Text(text) => query.bind(text),
                SqlParam::Real(value) => query.bind(value),
            };
        }
        let rows = query.fetch_all(&self.pool).await?;
        items_from_rows(&rows)
    }

    async fn get_available_chains(&self) -> Result<Vec<String>, StorageError> {
        let rows = sqlx::query("SELECT DISTINCT chain FROM menu_items ORDER BY chain")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("chain").map_err(StorageError::from))
            .collect()
    }

    async fn get_last_updated_at(&self) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT MAX(last_seen_at) AS last_updated FROM menu_items")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<Option<String>, _>("last_updated")?)
    }

    async fn count(&self) -> Result<u64, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM menu_items")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>("n")?.max(0) as u64)
    }
}
