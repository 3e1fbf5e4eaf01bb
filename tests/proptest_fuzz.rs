// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Property-based tests (fuzzing) for menu sync resilience.
//!
//! Uses proptest to generate random/malformed inputs and verify the crate
//! never panics, only returns clean errors, and keeps its ordering rules.
//!
//! Run with: `cargo test --test proptest_fuzz`

use proptest::prelude::*;
use serde_json::{json, Value};

use menu_sync::api::MenusResponse;
use menu_sync::domain::extract_serving_grams;
use menu_sync::repository::FilterTranslator;
use menu_sync::{MenuItem, MenuRepository, NutrientFilter, NutrientType, PerBasis, SqlMenuRepository};

// =============================================================================
// Strategies for generating test data
// =============================================================================

/// Generate a wire-shaped menu item with the given protein value
fn item_json(id: String, protein: f64) -> Value {
    json!({
        "id": id,
        "chain": "x",
        "name": format!("menu {}", id),
        "per": "serving",
        "nutrients": [{"type": "protein", "value": protein, "unit": "g"}],
        "lastSeenAt": "2025-08-30T00:00:00Z",
        "sourceUrl": "https://example.jp/",
        "sourceHash": "h"
    })
}

/// Generate arbitrary JSON values (including invalid structures)
fn arbitrary_json_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        ".*".prop_map(Value::String),
    ];

    leaf.prop_recursive(
        4,  // depth
        64, // max nodes
        10, // items per collection
        |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..10).prop_map(Value::Array),
                prop::collection::hash_map(".*", inner, 0..10)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        },
    )
}

fn optional_bound() -> impl Strategy<Value = Option<f64>> {
    prop::option::of(0.0f64..2000.0)
}

fn filter_strategy() -> impl Strategy<Value = NutrientFilter> {
    (
        (optional_bound(), optional_bound(), optional_bound(), optional_bound()),
        (optional_bound(), optional_bound(), optional_bound(), optional_bound()),
        prop::option::of(prop_oneof![Just(PerBasis::Serving), Just(PerBasis::Per100g)]),
    )
        .prop_map(
            |((min_protein, max_protein, min_carbs, max_carbs), (min_fat, max_fat, min_calories, max_calories), per)| {
                NutrientFilter {
                    min_protein,
                    max_protein,
                    min_carbs,
                    max_carbs,
                    min_fat,
                    max_fat,
                    min_calories,
                    max_calories,
                    per,
                }
            },
        )
}

// =============================================================================
// Serving Size Extraction
// =============================================================================

proptest! {
    /// Extraction should never panic on arbitrary text
    #[test]
    fn fuzz_serving_size_never_panics(text in ".*") {
        let _ = extract_serving_grams(&text);
    }

    /// Any integral gram count inside typical decoration is recovered
    #[test]
    fn prop_serving_size_recovers_grams(
        grams in 0u32..100_000,
        prefix in "(並盛|大盛|1食分 |約)?",
        unit in "(g|ｇ|グラム)",
    ) {
        let text = format!("{}（{}{}）", prefix, grams, unit);
        prop_assert_eq!(extract_serving_grams(&text), Some(grams));
    }

    /// Text without digits never yields a quantity
    #[test]
    fn prop_serving_size_without_digits_is_none(text in "[^0-9０-９]*") {
        prop_assert_eq!(extract_serving_grams(&text), None);
    }
}

// =============================================================================
// Payload Decoding Fuzz Tests
// =============================================================================

proptest! {
    /// Payload decoding should never panic on arbitrary bytes
    #[test]
    fn fuzz_menus_response_from_random_bytes(bytes in prop::collection::vec(any::<u8>(), 0..10000)) {
        let result: Result<MenusResponse, _> = serde_json::from_slice(&bytes);
        if let Ok(response) = result {
            let _ = response.into_items();
        }
    }

    /// Payload decoding should handle arbitrary JSON gracefully
    #[test]
    fn fuzz_menus_response_from_arbitrary_json(json in arbitrary_json_strategy()) {
        if let Ok(response) = serde_json::from_value::<MenusResponse>(json) {
            let _ = response.into_items();
        }
    }

    /// Validation accepts exactly the non-negative protein values
    #[test]
    fn prop_validation_rejects_negative_nutrients(protein in -1000.0f64..1000.0) {
        let response: MenusResponse = serde_json::from_value(json!({
            "items": [item_json("a".into(), protein)]
        })).unwrap();
        let result = response.into_items();
        prop_assert_eq!(result.is_ok(), protein >= 0.0);
    }
}

// =============================================================================
// Filter Translation
// =============================================================================

proptest! {
    /// Every placeholder in the clause has exactly one bound parameter
    #[test]
    fn prop_filter_placeholders_match_params(filter in filter_strategy()) {
        let query = FilterTranslator::translate(&filter);
        let placeholders = query.clause.matches('?').count();
        prop_assert_eq!(placeholders, query.params.len());
        if filter.is_empty() {
            prop_assert_eq!(query.clause.as_str(), "1=1");
        }
    }
}

// =============================================================================
// Repository Ordering
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Query results are ordered by protein descending, ties by id ascending
    #[test]
    fn prop_results_ordered_by_protein(
        proteins in prop::collection::vec(0u32..60, 1..20),
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let found = runtime.block_on(async {
            let repo = SqlMenuRepository::connect("sqlite::memory:", 1).await.unwrap();
            let items: Vec<MenuItem> = proteins
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    MenuItem::builder(format!("item{:02}", i), "x", format!("menu {}", i))
                        .grams(NutrientType::Protein, f64::from(*p))
                        .last_seen_at("2025-08-30T00:00:00Z")
                        .source("https://example.jp/", "h")
                        .build()
                        .unwrap()
                })
                .collect();
            repo.bulk_save(&items).await.unwrap();
            repo.find_by_chain("x").await.unwrap()
        });

        prop_assert_eq!(found.len(), proteins.len());
        for pair in found.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!(a.protein_in_grams() >= b.protein_in_grams());
            if a.protein_in_grams() == b.protein_in_grams() {
                prop_assert!(a.id() < b.id());
            }
        }
    }
}
