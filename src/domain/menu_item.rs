// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Menu item domain model.
//!
//! A [`MenuItem`] is an immutable value object. It is built from a network
//! payload, a repository row, or seed data, always through the validating
//! constructor [`MenuItem::new`]. Transformations such as
//! [`MenuItem::convert_to_per_serving`] return a new instance.
//!
//! # Example
//!
//! ```
//! use menu_sync::domain::{MenuItem, NutrientType, PerBasis};
//!
//! let item = MenuItem::builder("sukiya_gyudon", "sukiya", "牛丼（並盛）")
//!     .per(PerBasis::Per100g)
//!     .grams(NutrientType::Protein, 10.0)
//!     .grams(NutrientType::Fat, 5.0)
//!     .serving_size("1食（350g）")
//!     .build()
//!     .unwrap();
//!
//! let serving = item.convert_to_per_serving().unwrap();
//! assert_eq!(serving.protein_in_grams(), 35.0);
//! assert_eq!(item.per(), PerBasis::Per100g); // original untouched
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::nutrient::{NutrientType, NutrientUnit, NutrientValue, PerBasis};
use super::serving_size::extract_serving_grams;

/// Raised when a [`MenuItem`] would break one of its invariants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("nutrient values must be non-negative: {nutrient} = {value}")]
    NegativeNutrient { nutrient: NutrientType, value: f64 },
}

/// Unvalidated menu item fields.
///
/// This is also the `MenuItemPayload` wire shape served by `/menus`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemData {
    pub id: String,
    pub chain: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub per: PerBasis,
    #[serde(default)]
    pub nutrients: Vec<NutrientValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serving_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergens: Option<Vec<String>>,
    pub last_seen_at: String,
    pub source_url: String,
    pub source_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_manual_update: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// A validated menu item.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    data: MenuItemData,
}

impl MenuItem {
    /// Validate and wrap `data`.
    ///
    /// Fails when `id`, `chain` or `name` is empty, or when a nutrient value
    /// is negative (or NaN). If a nutrient type appears more than once the
    /// first occurrence is kept.
    pub fn new(mut data: MenuItemData) -> Result<Self, ValidationError> {
        if data.id.is_empty() {
            return Err(ValidationError::MissingField { field: "id" });
        }
        if data.chain.is_empty() {
            return Err(ValidationError::MissingField { field: "chain" });
        }
        if data.name.is_empty() {
            return Err(ValidationError::MissingField { field: "name" });
        }
        for n in &data.nutrients {
            if n.value.is_nan() || n.value < 0.0 {
                return Err(ValidationError::NegativeNutrient {
                    nutrient: n.nutrient,
                    value: n.value,
                });
            }
        }

        let mut seen = Vec::with_capacity(data.nutrients.len());
        data.nutrients.retain(|n| {
            if seen.contains(&n.nutrient) {
                false
            } else {
                seen.push(n.nutrient);
                true
            }
        });

        Ok(Self { data })
    }

    pub fn builder(
        id: impl Into<String>,
        chain: impl Into<String>,
        name: impl Into<String>,
    ) -> MenuItemBuilder {
        MenuItemBuilder::new(id, chain, name)
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.data.id
    }

    #[must_use]
    pub fn chain(&self) -> &str {
        &self.data.chain
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.data.name
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.data.category.as_deref()
    }

    #[must_use]
    pub fn per(&self) -> PerBasis {
        self.data.per
    }

    #[must_use]
    pub fn nutrients(&self) -> &[NutrientValue] {
        &self.data.nutrients
    }

    #[must_use]
    pub fn serving_size(&self) -> Option<&str> {
        self.data.serving_size.as_deref()
    }

    #[must_use]
    pub fn allergens(&self) -> Option<&[String]> {
        self.data.allergens.as_deref()
    }

    #[must_use]
    pub fn last_seen_at(&self) -> &str {
        &self.data.last_seen_at
    }

    #[must_use]
    pub fn source_url(&self) -> &str {
        &self.data.source_url
    }

    #[must_use]
    pub fn source_hash(&self) -> &str {
        &self.data.source_hash
    }

    #[must_use]
    pub fn data_source_id(&self) -> Option<&str> {
        self.data.data_source_id.as_deref()
    }

    #[must_use]
    pub fn last_manual_update(&self) -> Option<&str> {
        self.data.last_manual_update.as_deref()
    }

    /// Borrow the underlying field set.
    #[must_use]
    pub fn data(&self) -> &MenuItemData {
        &self.data
    }

    #[must_use]
    pub fn into_data(self) -> MenuItemData {
        self.data
    }

    /// The nutrient of the given type, if measured.
    #[must_use]
    pub fn nutrient(&self, nutrient: NutrientType) -> Option<&NutrientValue> {
        self.data.nutrients.iter().find(|n| n.nutrient == nutrient)
    }

    /// Value of a nutrient converted to grams. See [`NutrientValue::in_grams`].
    #[must_use]
    pub fn nutrient_in_grams(&self, nutrient: NutrientType) -> Option<f64> {
        self.nutrient(nutrient).map(NutrientValue::in_grams)
    }

    /// Protein in grams, `0.0` when not measured.
    #[must_use]
    pub fn protein_in_grams(&self) -> f64 {
        self.nutrient_in_grams(NutrientType::Protein).unwrap_or(0.0)
    }

    /// Calories in kcal, `0.0` when not measured.
    ///
    /// Reads the `calories` nutrient and falls back to `energy`; chains
    /// report the same figure under either name.
    #[must_use]
    pub fn calories_in_kcal(&self) -> f64 {
        self.nutrient(NutrientType::Calories)
            .or_else(|| self.nutrient(NutrientType::Energy))
            .map(|n| n.value)
            .unwrap_or(0.0)
    }

    /// Grams in one serving, parsed from the serving-size text.
    #[must_use]
    pub fn serving_grams(&self) -> Option<u32> {
        self.data.serving_size.as_deref().and_then(extract_serving_grams)
    }

    /// Convert a per-100g item to per-serving values.
    ///
    /// Returns `None` unless the item is measured per 100g and its serving
    /// size yields a non-zero gram quantity. An unparseable size is a normal outcome.
    #[must_use]
    pub fn convert_to_per_serving(&self) -> Option<MenuItem> {
        if self.data.per != PerBasis::Per100g {
            return None;
        }
        let grams = self.serving_grams().filter(|g| *g > 0)?;
        let factor = f64::from(grams) / 100.0;

        let mut data = self.data.clone();
        data.per = PerBasis::Serving;
        data.nutrients = self.data.nutrients.iter().map(|n| n.scaled(factor)).collect();
        Some(Self { data })
    }
}

/// Fluent builder for seed data and tests.
#[derive(Debug, Clone)]
pub struct MenuItemBuilder {
    data: MenuItemData,
}

impl MenuItemBuilder {
    pub fn new(id: impl Into<String>, chain: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            data: MenuItemData {
                id: id.into(),
                chain: chain.into(),
                name: name.into(),
                category: None,
                per: PerBasis::Serving,
                nutrients: Vec::new(),
                serving_size: None,
                allergens: None,
                last_seen_at: String::new(),
                source_url: String::new(),
                source_hash: String::new(),
                data_source_id: None,
                last_manual_update: None,
                updated_at: None,
            },
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.data.category = Some(category.into());
        self
    }

    pub fn per(mut self, per: PerBasis) -> Self {
        self.data.per = per;
        self
    }

    pub fn nutrient(mut self, value: NutrientValue) -> Self {
        self.data.nutrients.push(value);
        self
    }

    pub fn grams(self, nutrient: NutrientType, value: f64) -> Self {
        self.nutrient(NutrientValue::new(nutrient, value, NutrientUnit::G))
    }

    pub fn kcal(self, nutrient: NutrientType, value: f64) -> Self {
        self.nutrient(NutrientValue::new(nutrient, value, NutrientUnit::Kcal))
    }

    pub fn serving_size(mut self, serving_size: impl Into<String>) -> Self {
        self.data.serving_size = Some(serving_size.into());
        self
    }

    pub fn allergens(mut self, allergens: Vec<String>) -> Self {
        self.data.allergens = Some(allergens);
        self
    }

    pub fn last_seen_at(mut self, at: impl Into<String>) -> Self {
        self.data.last_seen_at = at.into();
        self
    }

    pub fn source(mut self, url: impl Into<String>, hash: impl Into<String>) -> Self {
        self.data.source_url = url.into();
        self.data.source_hash = hash.into();
        self
    }

    pub fn data_source_id(mut self, id: impl Into<String>) -> Self {
        self.data.data_source_id = Some(id.into());
        self
    }

    pub fn build(self) -> Result<MenuItem, ValidationError> {
        MenuItem::new(self.data)
    }
}
