//! Member Entity
//!
//! A person belonging to a family (the `users` collection).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    #[default]
    Adult,
    Child,
}

/// Family member, shown as the "added by" badge on items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub family_id: String,
    #[serde(default)]
    pub email: Option<String>,
    pub display_name: String,
    #[serde(default)]
    pub role: MemberRole,
    #[serde(default)]
    pub color_primary: String,
    #[serde(default)]
    pub color_accent: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub avatar_emoji: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Member {
    pub const TABLE: &'static str = "users";

    /// Emoji shown on the badge, falling back to a generic silhouette
    pub fn badge(&self) -> &str {
        self.avatar_emoji.as_deref().unwrap_or("👤")
    }
}
