// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Restaurant chain reference data and provenance records.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataCollectionMethod {
    Manual,
    Api,
    Scraping,
}

impl DataCollectionMethod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DataCollectionMethod::Manual => "manual",
            DataCollectionMethod::Api => "api",
            DataCollectionMethod::Scraping => "scraping",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(DataCollectionMethod::Manual),
            "api" => Some(DataCollectionMethod::Api),
            "scraping" => Some(DataCollectionMethod::Scraping),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceType {
    OfficialWebsite,
    Api,
    ManualEntry,
    UserSubmission,
}

impl DataSourceType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSourceType::OfficialWebsite => "official_website",
            DataSourceType::Api => "api",
            DataSourceType::ManualEntry => "manual_entry",
            DataSourceType::UserSubmission => "user_submission",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "official_website" => Some(DataSourceType::OfficialWebsite),
            "api" => Some(DataSourceType::Api),
            "manual_entry" => Some(DataSourceType::ManualEntry),
            "user_submission" => Some(DataSourceType::UserSubmission),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMethod {
    Manual,
    Automated,
}

impl FetchMethod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchMethod::Manual => "manual",
            FetchMethod::Automated => "automated",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(FetchMethod::Manual),
            "automated" => Some(FetchMethod::Automated),
            _ => None,
        }
    }
}

/// A restaurant chain. Static reference data, created at seed time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chain {
    pub id: String,
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub nutrition_page_url: Option<String>,
    #[serde(default)]
    pub terms_url: Option<String>,
    pub data_collection_method: DataCollectionMethod,
    #[serde(default)]
    pub legal_notice: Option<String>,
    pub created_at: String,
}

/// Where a chain's nutrition figures came from. Audit only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    pub id: String,
    pub chain_id: String,
    pub source_type: DataSourceType,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub last_fetched_at: Option<String>,
    pub fetch_method: FetchMethod,
    #[serde(default)]
    pub data_accuracy_note: Option<String>,
    #[serde(default)]
    pub legal_compliance_note: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Versioned legal text shown alongside the nutrition data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalNotice {
    pub id: String,
    #[serde(rename = "type")]
    pub notice_type: String,
    pub title: String,
    pub content: String,
    pub version: String,
    pub effective_date: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub created_at: String,
}

fn default_active() -> bool {
    true
}

/// Chain summary served by `GET /chains`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfo {
    pub id: String,
    pub name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
}

impl ChainInfo {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        website_url: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            display_name: display_name.into(),
            logo_url: None,
            website_url: Some(website_url.into()),
        }
    }
}

impl From<&Chain> for ChainInfo {
    fn from(chain: &Chain) -> Self {
        Self {
            id: chain.id.clone(),
            name: chain.name.clone(),
            display_name: chain.display_name.clone(),
            logo_url: chain.logo_url.clone(),
            website_url: chain.website_url.clone(),
        }
    }
}
