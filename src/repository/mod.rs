// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Relational repository: the durable, queryable copy of every menu item.
//!
//! The repository is independent of network state. It is written by
//! [`MenuSyncService::sync_chain`](crate::MenuSyncService::sync_chain) and
//! queried directly for local search and filtering.
//!
//! Every list query orders by protein descending ("most protein first"),
//! with ties broken by `id` ascending.

pub mod filter;
pub mod migrations;
pub mod rows;
pub mod sql;

use async_trait::async_trait;

use crate::domain::MenuItem;
use crate::storage::traits::StorageError;

pub use filter::{FilterTranslator, NutrientFilter, SqlParam, SqlQuery};
pub use sql::SqlMenuRepository;

#[async_trait]
pub trait MenuRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<MenuItem>, StorageError>;

    /// Upsert by `id`, refreshing `updated_at`.
    async fn save(&self, item: &MenuItem) -> Result<(), StorageError>;

    /// Upsert every item in one transaction. Either all rows are written or
    /// none are.
    async fn bulk_save(&self, items: &[MenuItem]) -> Result<(), StorageError>;

    /// Delete by `id`. Deleting a missing row is not an error.
    async fn delete(&self, id: &str) -> Result<(), StorageError>;

    async fn find_by_chain(&self, chain: &str) -> Result<Vec<MenuItem>, StorageError>;

    /// Case-insensitive substring match on the item name.
    async fn search_by_name(&self, query: &str) -> Result<Vec<MenuItem>, StorageError>;

    async fn find_by_nutrient_filter(
        &self,
        filter: &NutrientFilter,
    ) -> Result<Vec<MenuItem>, StorageError>;

    /// Distinct chain ids, sorted.
    async fn get_available_chains(&self) -> Result<Vec<String>, StorageError>;

    /// Latest `last_seen_at` across all rows.
    async fn get_last_updated_at(&self) -> Result<Option<String>, StorageError>;

    async fn count(&self) -> Result<u64, StorageError>;
}
