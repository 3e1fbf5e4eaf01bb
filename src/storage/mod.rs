// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Key-value storage backends for the ETag cache.
//!
//! - [`memory::InMemoryKvStore`]: DashMap, volatile
//! - [`sql::SqliteKvStore`]: `kv_store` table in SQLite, durable
//!
//! Which one runs is decided once at startup from
//! [`StorageBackend`](crate::config::StorageBackend).

pub mod memory;
pub mod sql;
pub mod traits;
