// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use crate::domain::ChainInfo;

/// Chains served when `GET /chains` is unavailable.
#[must_use]
pub fn fallback_chains() -> Vec<ChainInfo> {
    [
        ("sukiya", "すき家", "https://www.sukiya.jp/"),
        ("yoshinoya", "吉野家", "https://www.yoshinoya.com/"),
        ("matsuya", "松屋", "https://www.matsuyafoods.co.jp/"),
        ("nakau", "なか卯", "https://www.nakau.co.jp/"),
        ("mcdonalds", "マクドナルド", "https://www.mcdonalds.co.jp/"),
        ("mosburger", "モスバーガー", "https://www.mos.jp/"),
        ("subway", "サブウェイ", "https://www.subway.co.jp/"),
        ("ootoya", "大戸屋", "https://www.ootoya.com/"),
        ("gusto", "ガスト", "https://www.skylark.co.jp/gusto/"),
        ("kfc", "ケンタッキー", "https://www.kfc.co.jp/"),
    ]
    .into_iter()
    .map(|(id, display_name, website)| ChainInfo::new(id, display_name, website))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_list() {
        let chains = fallback_chains();
        assert_eq!(chains.len(), 10);
        assert_eq!(chains[0].id, "sukiya");
        assert_eq!(chains[0].name, "sukiya");
        assert_eq!(chains[9].display_name, "ケンタッキー");
        assert!(chains.iter().all(|c| c.website_url.is_some()));
    }
}
