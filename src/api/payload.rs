// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Response bodies of the menu API.

use serde::{Deserialize, Serialize};

use crate::domain::{ChainInfo, MenuItem, MenuItemData, ValidationError};

/// Wire shape of one menu item. Identical to the domain field set.
pub type MenuItemPayload = MenuItemData;

/// `GET /menus` and `GET /menus/{chain}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenusResponse {
    #[serde(default)]
    pub items: Vec<MenuItemPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

impl MenusResponse {
    /// Validate every item. The first invalid item fails the whole payload.
    pub fn into_items(self) -> Result<Vec<MenuItem>, ValidationError> {
        self.items.into_iter().map(MenuItem::new).collect()
    }
}

/// `GET /chains`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainsResponse {
    #[serde(default)]
    pub chains: Vec<ChainInfo>,
}
