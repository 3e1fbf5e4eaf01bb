// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Gram extraction from free-text serving sizes.
//!
//! Chains describe portions as free text: `並盛（350g）`, `1食分 250g`,
//! `約300グラム`, `２００ｇ`. The text is normalized (full-width digits to
//! ASCII, `ｇ` and `グラム` to `g`) and the first `<integer> g` occurrence wins.
//!
//! Failing to find a quantity is an ordinary outcome, so the result is an
//! `Option`, never an error.

use std::sync::OnceLock;
use regex::Regex;

fn grams_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)([0-9]+)\s*g").expect("static regex is valid"))
}

/// Normalize full-width digits and gram tokens to their ASCII forms.
#[must_use]
pub fn normalize_serving_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '０'..='９' => {
                let ascii = (c as u32 - '０' as u32) as u8 + b'0';
                out.push(ascii as char);
            }
            'ｇ' => out.push('g'),
            _ => out.push(c),
        }
    }
    out.replace("グラム", "g")
}

/// Extract a gram quantity from a serving-size description.
///
/// ```
/// use menu_sync::domain::extract_serving_grams;
///
/// assert_eq!(extract_serving_grams("並盛（350g）"), Some(350));
/// assert_eq!(extract_serving_grams("約300グラム"), Some(300));
/// assert_eq!(extract_serving_grams("並盛"), None);
/// ```
#[must_use]
pub fn extract_serving_grams(text: &str) -> Option<u32> {
    let normalized = normalize_serving_text(text);
    let caps = grams_pattern().captures(&normalized)?;
    caps.get(1)?.as_str().parse::<u32>().ok()
}
