// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Nutrient value types.
//!
//! Wire strings match the server payload exactly (`"protein"`, `"mg"`, `"100g"`).

use std::fmt;
use serde::{Deserialize, Serialize};

/// Which nutrient a [`NutrientValue`] measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NutrientType {
    Protein,
    Fat,
    Carbs,
    Fiber,
    Sodium,
    Energy,
    Calories,
}

impl NutrientType {
    pub const ALL: [NutrientType; 7] = [
        NutrientType::Protein,
        NutrientType::Fat,
        NutrientType::Carbs,
        NutrientType::Fiber,
        NutrientType::Sodium,
        NutrientType::Energy,
        NutrientType::Calories,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            NutrientType::Protein => "protein",
            NutrientType::Fat => "fat",
            NutrientType::Carbs => "carbs",
            NutrientType::Fiber => "fiber",
            NutrientType::Sodium => "sodium",
            NutrientType::Energy => "energy",
            NutrientType::Calories => "calories",
        }
    }
}

impl fmt::Display for NutrientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit a nutrient value is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NutrientUnit {
    G,
    Mg,
    Kcal,
}

impl NutrientUnit {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            NutrientUnit::G => "g",
            NutrientUnit::Mg => "mg",
            NutrientUnit::Kcal => "kcal",
        }
    }
}

/// Basis the nutrient values of a menu item are measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PerBasis {
    #[serde(rename = "serving")]
    Serving,
    #[serde(rename = "100g")]
    Per100g,
}

impl PerBasis {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PerBasis::Serving => "serving",
            PerBasis::Per100g => "100g",
        }
    }

    /// Parse the column/wire representation. Unknown strings yield `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "serving" => Some(PerBasis::Serving),
            "100g" => Some(PerBasis::Per100g),
            _ => None,
        }
    }
}

impl fmt::Display for PerBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single measured nutrient. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutrientValue {
    #[serde(rename = "type")]
    pub nutrient: NutrientType,
    pub value: f64,
    pub unit: NutrientUnit,
}

impl NutrientValue {
    #[must_use]
    pub fn new(nutrient: NutrientType, value: f64, unit: NutrientUnit) -> Self {
        Self { nutrient, value, unit }
    }

    #[must_use]
    pub fn grams(nutrient: NutrientType, value: f64) -> Self {
        Self::new(nutrient, value, NutrientUnit::G)
    }

    /// Value expressed in grams.
    ///
    /// `mg` is divided by 1000. `kcal` is returned unchanged: a calorie count
    /// has no gram equivalent and callers must not display it as one.
    #[must_use]
    pub fn in_grams(&self) -> f64 {
        match self.unit {
            NutrientUnit::G => self.value,
            NutrientUnit::Mg => self.value / 1000.0,
            NutrientUnit::Kcal => self.value,
        }
    }

    /// Copy of this value scaled by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self { value: self.value * factor, ..*self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mg_converts_to_grams() {
        let v = NutrientValue::new(NutrientType::Protein, 5000.0, NutrientUnit::Mg);
        assert_eq!(v.in_grams(), 5.0);
    }

    #[test]
    fn test_kcal_passes_through() {
        let v = NutrientValue::new(NutrientType::Energy, 733.0, NutrientUnit::Kcal);
        assert_eq!(v.in_grams(), 733.0);
    }

    #[test]
    fn test_wire_format() {
        let v = NutrientValue::new(NutrientType::Sodium, 1200.0, NutrientUnit::Mg);
        let json = serde_json::to_value(v).unwrap();
        assert_eq!(json["type"], "sodium");
        assert_eq!(json["unit"], "mg");

        let basis: PerBasis = serde_json::from_str("\"100g\"").unwrap();
        assert_eq!(basis, PerBasis::Per100g);
        assert_eq!(PerBasis::parse("serving"), Some(PerBasis::Serving));
        assert_eq!(PerBasis::parse("bowl"), None);
    }

    #[test]
    fn test_unknown_unit_rejected_at_decode() {
        let result: Result<NutrientValue, _> =
            serde_json::from_str(r#"{"type":"protein","value":1,"unit":"oz"}"#);
        assert!(result.is_err());
    }
}
