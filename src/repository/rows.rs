// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Row ↔ entity mapping for `menu_items`, `chains` and `data_sources`.
//!
//! Nutrients are flattened into fixed columns, normalised to the column's
//! unit (grams, milligrams for sodium, kcal). Absent nutrients are stored as
//! NULL and omitted again on read. `protein_g` is NOT NULL, so an item
//! without a protein figure round-trips with `protein = 0g`.

use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::{
    Chain, DataCollectionMethod, DataSource, DataSourceType, FetchMethod, MenuItem, MenuItemData,
    NutrientType, NutrientUnit, NutrientValue, PerBasis,
};
use crate::storage::traits::StorageError;

/// Nutrient columns of one `menu_items` row.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NutrientColumns {
    pub protein_g: f64,
    pub fat_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fiber_g: Option<f64>,
    pub sodium_mg: Option<f64>,
    pub energy_kcal: Option<f64>,
    pub calories_kcal: Option<f64>,
}

impl NutrientColumns {
    #[must_use]
    pub fn from_item(item: &MenuItem) -> Self {
        Self {
            protein_g: item.protein_in_grams(),
            fat_g: item.nutrient_in_grams(NutrientType::Fat),
            carbs_g: item.nutrient_in_grams(NutrientType::Carbs),
            fiber_g: item.nutrient_in_grams(NutrientType::Fiber),
            sodium_mg: item.nutrient(NutrientType::Sodium).map(|n| match n.unit {
                NutrientUnit::G => n.value * 1000.0,
                NutrientUnit::Mg | NutrientUnit::Kcal => n.value,
            }),
            energy_kcal: item.nutrient(NutrientType::Energy).map(|n| n.value),
            calories_kcal: item.nutrient(NutrientType::Calories).map(|n| n.value),
        }
    }

    #[must_use]
    pub fn into_nutrients(self) -> Vec<NutrientValue> {
        let mut nutrients = vec![NutrientValue::grams(NutrientType::Protein, self.protein_g)];
        let optional = [
            (NutrientType::Fat, self.fat_g, NutrientUnit::G),
            (NutrientType::Carbs, self.carbs_g, NutrientUnit::G),
            (NutrientType::Fiber, self.fiber_g, NutrientUnit::G),
            (NutrientType::Sodium, self.sodium_mg, NutrientUnit::Mg),
            (NutrientType::Energy, self.energy_kcal, NutrientUnit::Kcal),
            (NutrientType::Calories, self.calories_kcal, NutrientUnit::Kcal),
        ];
        for (nutrient, value, unit) in optional {
            if let Some(value) = value {
                nutrients.push(NutrientValue::new(nutrient, value, unit));
            }
        }
        nutrients
    }
}

/// Serialise allergens for the TEXT column.
pub fn encode_allergens(allergens: Option<&[String]>) -> Result<Option<String>, StorageError> {
    allergens
        .map(|a| serde_json::to_string(a).map_err(StorageError::from))
        .transpose()
}

fn decode_allergens(raw: Option<String>) -> Result<Option<Vec<String>>, StorageError> {
    raw.map(|s| serde_json::from_str(&s).map_err(StorageError::from))
        .transpose()
}

/// Rebuild a [`MenuItem`] from a `SELECT *` row.
pub fn menu_item_from_row(row: &SqliteRow) -> Result<MenuItem, StorageError> {
    let per: String = row.try_get("per")?;
    let per = PerBasis::parse(&per)
        .ok_or_else(|| StorageError::Serialization(format!("unknown per basis: {}", per)))?;

    let nutrients = NutrientColumns {
        protein_g: row.try_get("protein_g")?,
        fat_g: row.try_get("fat_g")?,
        carbs_g: row.try_get("carbs_g")?,
        fiber_g: row.try_get("fiber_g")?,
        sodium_mg: row.try_get("sodium_mg")?,
        energy_kcal: row.try_get("energy_kcal")?,
        calories_kcal: row.try_get("calories_kcal")?,
    }
    .into_nutrients();

    let data = MenuItemData {
        id: row.try_get("id")?,
        chain: row.try_get("chain")?,
        name: row.try_get("name")?,
        category: row.try_get("category")?,
        per,
        nutrients,
        serving_size: row.try_get("serving_size")?,
        allergens: decode_allergens(row.try_get("allergens")?)?,
        last_seen_at: row.try_get("last_seen_at")?,
        source_url: row.try_get("source_url")?,
        source_hash: row.try_get("source_hash")?,
        data_source_id: row.try_get("data_source_id")?,
        last_manual_update: row.try_get("last_manual_update")?,
        updated_at: row.try_get("updated_at")?,
    };

    MenuItem::new(data).map_err(|e| StorageError::Serialization(format!("invalid stored row: {}", e)))
}

pub fn chain_from_row(row: &SqliteRow) -> Result<Chain, StorageError> {
    let method: String = row.try_get("data_collection_method")?;
    Ok(Chain {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        display_name: row.try_get("display_name")?,
        logo_url: row.try_get("logo_url")?,
        website_url: row.try_get("website_url")?,
        nutrition_page_url: row.try_get("nutrition_page_url")?,
        terms_url: row.try_get("terms_url")?,
        data_collection_method: DataCollectionMethod::parse(&method).ok_or_else(|| {
            StorageError::Serialization(format!("unknown data collection method: {}", method))
        })?,
        legal_notice: row.try_get("legal_notice")?,
        created_at: row.try_get::<Option<String>, _>("created_at")?.unwrap_or_default(),
    })
}

pub fn data_source_from_row(row: &SqliteRow) -> Result<DataSource, StorageError> {
    let source_type: String = row.try_get("source_type")?;
    let fetch_method: String = row.try_get("fetch_method")?;
    Ok(DataSource {
        id: row.try_get("id")?,
        chain_id: row.try_get("chain_id")?,
        source_type: DataSourceType::parse(&source_type).ok_or_else(|| {
            StorageError::Serialization(format!("unknown source type: {}", source_type))
        })?,
        source_url: row.try_get("source_url")?,
        last_fetched_at: row.try_get("last_fetched_at")?,
        fetch_method: FetchMethod::parse(&fetch_method).ok_or_else(|| {
            StorageError::Serialization(format!("unknown fetch method: {}", fetch_method))
        })?,
        data_accuracy_note: row.try_get("data_accuracy_note")?,
        legal_compliance_note: row.try_get("legal_compliance_note")?,
        created_at: row.try_get::<Option<String>, _>("created_at")?.unwrap_or_default(),
        updated_at: row.try_get::<Option<String>, _>("updated_at")?.unwrap_or_default(),
    })
}
