// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! # Menu Sync
//!
//! Offline-first synchronization of restaurant-chain menu nutrition data.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     MenuSyncService                         │
//! │  • fetch_menus_by_chain / fetch_all_menus / chains          │
//! │  • sync_chain / sync_all write network data through         │
//! │  • Per-URL in-flight de-duplication                         │
//! └─────────────────────────────────────────────────────────────┘
//!          │                    │                     │
//!          ▼                    ▼                     ▼
//! ┌─────────────────┐ ┌──────────────────┐ ┌───────────────────┐
//! │   EtagCache     │ │    ApiClient     │ │  MenuRepository   │
//! │ • raw payloads  │ │ • If-None-Match  │ │ • SQLite (sqlx)   │
//! │ • 24h TTL       │ │ • 304 handling   │ │ • nutrient filter │
//! │ • KV backend    │ │ • never retried  │ │ • migrations      │
//! └─────────────────┘ └──────────────────┘ └───────────────────┘
//! ```
//!
//! A read degrades in a fixed order: fresh cache, network (200 or 304),
//! stale cache, repository, empty. Only storage failures and invalid
//! server payloads reach the caller as [`SyncError`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use menu_sync::{FetchOptions, MenuSyncService, NutrientFilter, SyncConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), menu_sync::SyncError> {
//!     let service = MenuSyncService::open(SyncConfig::from_env()).await?;
//!
//!     let report = service.sync_all(FetchOptions::default()).await?;
//!     println!("{} items ({})", report.items.len(), report.source);
//!
//!     let filter = NutrientFilter {
//!         min_protein: Some(25.0),
//!         ..Default::default()
//!     };
//!     for item in service.repository().find_by_nutrient_filter(&filter).await? {
//!         println!("{}: {}g protein", item.name(), item.protein_in_grams());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`coordinator`]: the [`MenuSyncService`] orchestrator
//! - [`cache`]: ETag cache over a key-value backend
//! - [`api`]: HTTP boundary and wire payloads
//! - [`repository`]: relational store for menu items and chains
//! - [`domain`]: menu items, nutrients, chains
//! - [`storage`]: key-value backends (memory, SQLite)
//! - [`seed`]: hand-transcribed reference data
//! - [`resilience`]: retry with backoff for storage startup and queries

pub mod api;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod domain;
pub mod metrics;
pub mod repository;
pub mod resilience;
pub mod seed;
pub mod storage;

// Note: We don't expose a `tracing` module to avoid conflict with the tracing crate

pub use api::{ApiClient, TransportError};
pub use cache::{CacheEntry, CacheLookup, EtagCache};
pub use config::{StorageBackend, SyncConfig};
pub use coordinator::{
    fallback_chains, DataOrigin, FetchOptions, FetchSource, MenuResponse, MenuSyncService,
    SyncError, SyncReport,
};
pub use domain::{
    Chain, ChainInfo, DataSource, LegalNotice, MenuItem, MenuItemData, NutrientType,
    NutrientUnit, NutrientValue, PerBasis, ValidationError,
};
pub use repository::{MenuRepository, NutrientFilter, SqlMenuRepository};
pub use resilience::retry::RetryConfig;
pub use storage::traits::{KeyValueStore, StorageError};
