//! Category Entity
//!
//! Classification tags used to group items, read-only for this client.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub family_id: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    pub sort_order: i32,
    /// Aisle or section label in the store
    #[serde(default)]
    pub store_section: Option<String>,
}

impl Category {
    pub const TABLE: &'static str = "categories";

    /// Icon shown in section headers
    pub fn icon_or_default(&self) -> &str {
        self.icon.as_deref().unwrap_or("📦")
    }
}
