// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Manually transcribed reference data.
//!
//! Chains whose nutrition tables were copied by hand from their official
//! sites, the provenance record for each transcription, and the legal
//! notices shown with the data, and the gyudon menus of each chain.
//! Seeding is an upsert, so running it on every start is harmless;
//! [`perform_initial_setup`] additionally records a flag so it runs once.

use tracing::info;

use crate::domain::{
    Chain, DataCollectionMethod, DataSource, DataSourceType, FetchMethod, LegalNotice, MenuItem,
    MenuItemData, NutrientType, NutrientUnit, NutrientValue, PerBasis,
};
use crate::repository::{MenuRepository, SqlMenuRepository};
use crate::storage::traits::{KeyValueStore, StorageError};

/// Date the reference tables were transcribed.
pub const DATA_COLLECTION_DATE: &str = "2025-08-30";

const CHAIN_NOTICE: &str = "栄養成分は公式サイトより手動転記（2025年8月30日時点）。実際の数値は調理方法や材料により異なる場合があります。";
const ACCURACY_NOTE: &str = "公式サイトの栄養成分表示を手動で転記。最新情報は公式サイトをご確認ください。";
const COMPLIANCE_NOTE: &str = "手動転記のため利用規約違反なし。教育・参考目的での使用に限定。";

// (id, display name, website, nutrition page, terms)
const CHAINS: [(&str, &str, &str, &str, &str); 3] = [
    (
        "sukiya",
        "すき家",
        "https://www.sukiya.jp/",
        "https://www.sukiya.jp/menu/",
        "https://www.sukiya.jp/terms.html",
    ),
    (
        "yoshinoya",
        "吉野家",
        "https://www.yoshinoya.com/",
        "https://www.yoshinoya.com/menu/",
        "https://www.yoshinoya.com/sitepolicy/",
    ),
    (
        "matsuya",
        "松屋",
        "https://www.matsuyafoods.co.jp/",
        "https://www.matsuyafoods.co.jp/menu/",
        "https://www.matsuyafoods.co.jp/",
    ),
];

/// Key-value flag written once the reference data has been seeded.
pub const SETUP_COMPLETE_KEY: &str = "@protein_finder:setup_complete";

// (size slug, size label, protein g, fat g, carbs g, kcal)
type Size = (&'static str, &'static str, f64, f64, f64, f64);

// (chain, menu slug, category, source page, sizes)
type MenuTable = (&'static str, &'static str, &'static str, &'static str, &'static [Size]);

const MENUS: [MenuTable; 3] = [
    (
        "sukiya",
        "gyudon",
        "牛丼",
        "https://www.sukiya.jp/menu/in/gyudon/",
        &[
            ("mini", "ミニ", 13.0, 15.1, 60.2, 430.0),
            ("regular", "並盛", 22.9, 25.0, 104.1, 733.0),
            ("large", "大盛", 27.7, 30.4, 137.9, 938.0),
            ("tokumori", "特盛", 40.8, 45.0, 139.6, 1133.0),
            ("mega", "メガ", 58.8, 64.9, 173.4, 1521.0),
        ],
    ),
    (
        "yoshinoya",
        "gyudon",
        "牛丼",
        "https://www.yoshinoya.com/menu/gyudon/",
        &[
            ("small", "小盛", 14.5, 16.5, 79.2, 528.0),
            ("regular", "並盛", 20.2, 23.4, 113.8, 752.0),
            ("atama", "アタマの大盛", 26.0, 30.3, 113.8, 847.0),
            ("large", "大盛", 25.9, 30.3, 148.4, 976.0),
            ("tokumori", "特盛", 37.5, 44.1, 148.4, 1166.0),
        ],
    ),
    (
        "matsuya",
        "gyumeshi",
        "牛めし",
        "https://www.matsuyafoods.co.jp/menu/",
        &[
            ("mini", "ミニ盛", 11.5, 16.2, 63.2, 448.0),
            ("regular", "並盛", 19.1, 26.5, 103.8, 735.0),
            ("large", "大盛", 23.5, 32.6, 137.8, 944.0),
            ("tokumori", "特盛", 34.7, 48.8, 139.5, 1149.0),
        ],
    ),
];

/// Chains with hand-transcribed nutrition tables.
///
/// `created_at` is left empty so the database stamps the first insert.
#[must_use]
pub fn reference_chains() -> Vec<Chain> {
    CHAINS
        .iter()
        .map(|(id, display_name, website, nutrition, terms)| Chain {
            id: (*id).to_string(),
            name: (*id).to_string(),
            display_name: (*display_name).to_string(),
            logo_url: None,
            website_url: Some((*website).to_string()),
            nutrition_page_url: Some((*nutrition).to_string()),
            terms_url: Some((*terms).to_string()),
            data_collection_method: DataCollectionMethod::Manual,
            legal_notice: Some(CHAIN_NOTICE.to_string()),
            created_at: String::new(),
        })
        .collect()
}

/// One manual-entry provenance record per reference chain, e.g.
/// `sukiya_manual_20250830`.
#[must_use]
pub fn reference_data_sources() -> Vec<DataSource> {
    let stamp = DATA_COLLECTION_DATE.replace('-', "");
    CHAINS
        .iter()
        .map(|(id, _, _, nutrition, _)| DataSource {
            id: format!("{}_manual_{}", id, stamp),
            chain_id: (*id).to_string(),
            source_type: DataSourceType::ManualEntry,
            source_url: Some((*nutrition).to_string()),
            last_fetched_at: Some(DATA_COLLECTION_DATE.to_string()),
            fetch_method: FetchMethod::Manual,
            data_accuracy_note: Some(ACCURACY_NOTE.to_string()),
            legal_compliance_note: Some(COMPLIANCE_NOTE.to_string()),
            created_at: String::new(),
            updated_at: String::new(),
        })
        .collect()
}

#[must_use]
pub fn reference_legal_notices() -> Vec<LegalNotice> {
    vec![
        LegalNotice {
            id: "disclaimer_v1".into(),
            notice_type: "disclaimer".into(),
            title: "免責事項".into(),
            content: format!(
                "本アプリケーションで提供される栄養成分情報は、各飲食チェーン店の公式サイトから手動で転記したものです。\n\
                 データは{}時点のものです。実際の栄養成分は調理方法、材料、季節により変動する可能性があります。\n\
                 最新かつ正確な情報は各チェーン店の公式サイトをご確認ください。",
                DATA_COLLECTION_DATE
            ),
            version: "1.0.0".into(),
            effective_date: DATA_COLLECTION_DATE.into(),
            is_active: true,
            created_at: String::new(),
        },
        LegalNotice {
            id: "data_usage_v1".into(),
            notice_type: "data_usage".into(),
            title: "データ利用について".into(),
            content: format!(
                "各飲食チェーン店の公式ウェブサイトから手動で転記しています。自動取得は一切行っていません。\n\
                 {}時点の情報です。栄養成分データの著作権は各飲食チェーン店に帰属します。",
                DATA_COLLECTION_DATE
            ),
            version: "1.0.0".into(),
            effective_date: DATA_COLLECTION_DATE.into(),
            is_active: true,
            created_at: String::new(),
        },
    ]
}

/// Per-serving gyudon menus, e.g. `sukiya_gyudon_mini` named `牛丼（ミニ）`.
///
/// Each item links to its chain's manual data source and is hashed by id and
/// collection date.
pub fn reference_menu_items() -> Result<Vec<MenuItem>, StorageError> {
    let stamp = DATA_COLLECTION_DATE.replace('-', "");
    let seen_at = format!("{}T00:00:00Z", DATA_COLLECTION_DATE);

    let mut items = Vec::new();
    for (chain, slug, category, source_url, sizes) in &MENUS {
        for (size, label, protein, fat, carbs, kcal) in sizes.iter() {
            let id = format!("{}_{}_{}", chain, slug, size);
            let data = MenuItemData {
                name: format!("{}（{}）", category, label),
                chain: (*chain).to_string(),
                category: Some((*category).to_string()),
                per: PerBasis::Serving,
                nutrients: vec![
                    NutrientValue::grams(NutrientType::Protein, *protein),
                    NutrientValue::grams(NutrientType::Fat, *fat),
                    NutrientValue::grams(NutrientType::Carbs, *carbs),
                    NutrientValue::new(NutrientType::Energy, *kcal, NutrientUnit::Kcal),
                ],
                serving_size: Some((*label).to_string()),
                allergens: None,
                last_seen_at: seen_at.clone(),
                source_url: (*source_url).to_string(),
                source_hash: format!("{}_{}", id, DATA_COLLECTION_DATE),
                data_source_id: Some(format!("{}_manual_{}", chain, stamp)),
                last_manual_update: Some(DATA_COLLECTION_DATE.to_string()),
                updated_at: None,
                id,
            };
            let item = MenuItem::new(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
            items.push(item);
        }
    }
    Ok(items)
}

/// Upsert all reference data. Chains go first so the data source and menu
/// item foreign keys resolve.
pub async fn seed_reference_data(repository: &SqlMenuRepository) -> Result<(), StorageError> {
    let chains = reference_chains();
    for chain in &chains {
        repository.save_chain(chain).await?;
    }
    let sources = reference_data_sources();
    for source in &sources {
        repository.save_data_source(source).await?;
    }
    let notices = reference_legal_notices();
    for notice in &notices {
        repository.save_legal_notice(notice).await?;
    }
    let items = reference_menu_items()?;
    repository.bulk_save(&items).await?;

    info!(
        chains = chains.len(),
        data_sources = sources.len(),
        legal_notices = notices.len(),
        menu_items = items.len(),
        "seeded reference data"
    );
    Ok(())
}

/// Seed the reference data unless `store` records that it already was.
///
/// Returns `true` when seeding ran. The flag is only written after every
/// upsert succeeded, so a failed setup is retried on the next call.
pub async fn perform_initial_setup(
    repository: &SqlMenuRepository,
    store: &dyn KeyValueStore,
) -> Result<bool, StorageError> {
    if store.get(SETUP_COMPLETE_KEY).await?.as_deref() == Some("true") {
        info!("initial setup already complete");
        return Ok(false);
    }

    seed_reference_data(repository).await?;
    store.set(SETUP_COMPLETE_KEY, "true").await?;
    info!("initial setup complete");
    Ok(true)
}

/// Forget the setup flag so the next [`perform_initial_setup`] seeds again.
pub async fn reset_setup_status(store: &dyn KeyValueStore) -> Result<(), StorageError> {
    store.remove(SETUP_COMPLETE_KEY).await?;
    info!("initial setup status reset");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::InMemoryKvStore;

    #[test]
    fn test_data_source_ids() {
        let ids: Vec<String> = reference_data_sources().into_iter().map(|s| s.id).collect();
        assert_eq!(
            ids,
            vec![
                "sukiya_manual_20250830",
                "yoshinoya_manual_20250830",
                "matsuya_manual_20250830"
            ]
        );
    }

    #[test]
    fn test_every_source_has_a_chain() {
        let chains: Vec<String> = reference_chains().into_iter().map(|c| c.id).collect();
        for source in reference_data_sources() {
            assert!(chains.contains(&source.chain_id));
        }
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let repo = SqlMenuRepository::connect("sqlite::memory:", 1).await.unwrap();
        seed_reference_data(&repo).await.unwrap();
        seed_reference_data(&repo).await.unwrap();

        let chains = repo.list_chains().await.unwrap();
        assert_eq!(chains.len(), 3);
        let sukiya = repo.find_chain("sukiya").await.unwrap().unwrap();
        assert_eq!(sukiya.display_name, "すき家");
        assert_eq!(sukiya.data_collection_method, DataCollectionMethod::Manual);
        assert!(!sukiya.created_at.is_empty());

        let sources = repo.find_data_sources("matsuya").await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].last_fetched_at.as_deref(), Some("2025-08-30"));

        assert_eq!(repo.active_legal_notices().await.unwrap().len(), 2);
        assert_eq!(repo.count().await.unwrap(), 14);
    }

    #[test]
    fn test_menu_items_link_to_their_source() {
        let items = reference_menu_items().unwrap();
        assert_eq!(items.len(), 14);

        let mini = items.iter().find(|i| i.id() == "matsuya_gyumeshi_mini").unwrap();
        assert_eq!(mini.data().name, "牛めし（ミニ盛）");
        assert_eq!(mini.data().serving_size.as_deref(), Some("ミニ盛"));
        assert_eq!(mini.data().source_hash, "matsuya_gyumeshi_mini_2025-08-30");
        assert_eq!(mini.data().data_source_id.as_deref(), Some("matsuya_manual_20250830"));
        assert_eq!(mini.data().last_manual_update.as_deref(), Some("2025-08-30"));
        assert_eq!(mini.protein_in_grams(), 11.5);
        assert_eq!(mini.calories_in_kcal(), 448.0);
    }

    #[tokio::test]
    async fn test_seeded_menus_sorted_by_protein() {
        let repo = SqlMenuRepository::connect("sqlite::memory:", 1).await.unwrap();
        seed_reference_data(&repo).await.unwrap();

        let sukiya = repo.find_by_chain("sukiya").await.unwrap();
        let ids: Vec<&str> = sukiya.iter().map(|i| i.id()).collect();
        assert_eq!(
            ids,
            vec![
                "sukiya_gyudon_mega",
                "sukiya_gyudon_tokumori",
                "sukiya_gyudon_large",
                "sukiya_gyudon_regular",
                "sukiya_gyudon_mini"
            ]
        );
        assert_eq!(
            repo.get_available_chains().await.unwrap(),
            vec!["matsuya".to_string(), "sukiya".to_string(), "yoshinoya".to_string()]
        );
    }

    #[tokio::test]
    async fn test_initial_setup_runs_once() {
        let repo = SqlMenuRepository::connect("sqlite::memory:", 1).await.unwrap();
        let store = InMemoryKvStore::new();

        assert!(perform_initial_setup(&repo, &store).await.unwrap());
        assert_eq!(store.get(SETUP_COMPLETE_KEY).await.unwrap().as_deref(), Some("true"));
        assert_eq!(repo.count().await.unwrap(), 14);

        // Flag set: a removed row is not restored
        repo.delete("sukiya_gyudon_mega").await.unwrap();
        assert!(!perform_initial_setup(&repo, &store).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 13);

        reset_setup_status(&store).await.unwrap();
        assert!(perform_initial_setup(&repo, &store).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 14);
    }
}
