// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Domain entities: menu items, nutrient values, chains.

pub mod chain;
pub mod menu_item;
pub mod nutrient;
pub mod serving_size;

pub use chain::{Chain, ChainInfo, DataCollectionMethod, DataSource, DataSourceType, FetchMethod, LegalNotice};
pub use menu_item::{MenuItem, MenuItemBuilder, MenuItemData, ValidationError};
pub use nutrient::{NutrientType, NutrientUnit, NutrientValue, PerBasis};
pub use serving_size::{extract_serving_grams, normalize_serving_text};
