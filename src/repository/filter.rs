// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Nutrient range filter and its SQL translation.
//!
//! # SQL Generated
//!
//! ```sql
//! protein_g BETWEEN ? AND ?                      -- min and max
//! carbs_g >= ?                                   -- min only
//! COALESCE(calories_kcal, energy_kcal) <= ?      -- max only
//! per = ?                                        -- basis
//! ```
//!
//! Conditions combine with `AND`. An empty filter translates to `1=1`.

use serde::{Deserialize, Serialize};

use crate::domain::PerBasis;

/// Range filter over the nutrient columns. All bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientFilter {
    pub min_protein: Option<f64>,
    pub max_protein: Option<f64>,
    pub min_carbs: Option<f64>,
    pub max_carbs: Option<f64>,
    pub min_fat: Option<f64>,
    pub max_fat: Option<f64>,
    pub min_calories: Option<f64>,
    pub max_calories: Option<f64>,
    pub per: Option<PerBasis>,
}

impl NutrientFilter {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Parameterized WHERE clause (without the `WHERE` keyword).
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub clause: String,
    pub params: Vec<SqlParam>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Real(f64),
}

pub struct FilterTranslator;

impl FilterTranslator {
    /// Translate a filter to a `?`-placeholder clause.
    #[must_use]
    pub fn translate(filter: &NutrientFilter) -> SqlQuery {
        let mut params = Vec::new();
        let mut parts = Vec::new();

        let ranges = [
            ("protein_g", filter.min_protein, filter.max_protein),
            ("carbs_g", filter.min_carbs, filter.max_carbs),
            ("fat_g", filter.min_fat, filter.max_fat),
            ("COALESCE(calories_kcal, energy_kcal)", filter.min_calories, filter.max_calories),
        ];
        for (column, min, max) in ranges {
            if let Some(part) = Self::range(column, min, max, &mut params) {
                parts.push(part);
            }
        }

        if let Some(per) = filter.per {
            params.push(SqlParam::Text(per.as_str().to_string()));
            parts.push("per = ?".to_string());
        }

        let clause = if parts.is_empty() {
            "1=1".to_string()
        } else {
            parts.join(" AND ")
        };
        SqlQuery { clause, params }
    }

    fn range(
        column: &str,
        min: Option<f64>,
        max: Option<f64>,
        params: &mut Vec<SqlParam>,
    ) -> Option<String> {
        match (min, max) {
            (Some(min), Some(max)) => {
                params.push(SqlParam::Real(min));
                params.push(SqlParam::Real(max));
                Some(format!("{} BETWEEN ? AND ?", column))
            }
            (Some(min), None) => {
                params.push(SqlParam::Real(min));
                Some(format!("{} >= ?", column))
            }
            (None, Some(max)) => {
                params.push(SqlParam::Real(max));
                Some(format!("{} <= ?", column))
            }
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter() {
        let filter = NutrientFilter::default();
        assert!(filter.is_empty());
        let query = FilterTranslator::translate(&filter);
        assert_eq!(query.clause, "1=1");
        assert!(query.params.is_empty());
    }

    #[test]
    fn test_min_only() {
        let query = FilterTranslator::translate(&NutrientFilter {
            min_protein: Some(25.0),
            ..Default::default()
        });
        assert_eq!(query.clause, "protein_g >= ?");
        assert_eq!(query.params, vec![SqlParam::Real(25.0)]);
    }

    #[test]
    fn test_between_and_per() {
        let query = FilterTranslator::translate(&NutrientFilter {
            min_carbs: Some(10.0),
            max_carbs: Some(60.0),
            max_fat: Some(20.0),
            per: Some(PerBasis::Per100g),
            ..Default::default()
        });
        assert_eq!(query.clause, "carbs_g BETWEEN ? AND ? AND fat_g <= ? AND per = ?");
        assert_eq!(
            query.params,
            vec![
                SqlParam::Real(10.0),
                SqlParam::Real(60.0),
                SqlParam::Real(20.0),
                SqlParam::Text("100g".to_string()),
            ]
        );
    }

    #[test]
    fn test_calories_reads_either_column() {
        let query = FilterTranslator::translate(&NutrientFilter {
            max_calories: Some(500.0),
            ..Default::default()
        });
        assert_eq!(query.clause, "COALESCE(calories_kcal, energy_kcal) <= ?");
    }

    #[test]
    fn test_filter_decodes_from_camel_case() {
        let filter: NutrientFilter =
            serde_json::from_str(r#"{"minProtein": 20, "per": "serving"}"#).unwrap();
        assert_eq!(filter.min_protein, Some(20.0));
        assert_eq!(filter.per, Some(PerBasis::Serving));
    }
}
