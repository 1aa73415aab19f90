//! Shopping Item Entity
//!
//! Items on the family list plus the read-side join with their category and
//! the member who added them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Category, Member};

/// Prefix of identifiers synthesized locally before the server assigns one
pub const PROVISIONAL_PREFIX: &str = "temp-";

fn default_true() -> bool {
    true
}

/// A row of the `shopping_items` collection
///
/// `completed_at` is present if and only if `is_completed` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub id: String,
    pub family_id: String,
    pub title: String,
    /// Free text, e.g. "2" or "a bunch"
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    /// None = uncategorized
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default = "default_true")]
    pub is_needed: bool,
    pub is_completed: bool,
    #[serde(default)]
    pub completed_by: Option<String>,
    #[serde(default)]
    pub added_by: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ShoppingItem {
    pub const TABLE: &'static str = "shopping_items";

    /// Whether this item only exists locally, waiting for its insert
    pub fn is_provisional(&self) -> bool {
        self.id.starts_with(PROVISIONAL_PREFIX)
    }

    /// Set the completion flag, keeping `completed_at` in step with it
    pub fn set_completion(&mut self, completed: bool, at: DateTime<Utc>) {
        self.is_completed = completed;
        self.completed_at = completed.then_some(at);
    }

    pub fn completion_consistent(&self) -> bool {
        self.is_completed == self.completed_at.is_some()
    }
}

/// Insert payload: everything except the server-assigned `id` and `created_at`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewShoppingItem {
    pub family_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_by: Option<String>,
    pub is_needed: bool,
    pub is_completed: bool,
}

impl NewShoppingItem {
    pub fn new(family_id: &str, title: &str) -> Self {
        Self {
            family_id: family_id.to_string(),
            title: title.to_string(),
            quantity: None,
            category_id: None,
            added_by: None,
            is_needed: true,
            is_completed: false,
        }
    }
}

/// A shopping item joined with its category and the member who added it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItemWithRelations {
    #[serde(flatten)]
    pub item: ShoppingItem,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub added_by_user: Option<Member>,
}

impl ShoppingItemWithRelations {
    /// Build the locally visible stand-in for an insert that is still in flight
    pub fn provisional(
        draft: &NewShoppingItem,
        added_by_user: Option<Member>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            item: ShoppingItem {
                id: format!("{}{}", PROVISIONAL_PREFIX, Uuid::new_v4()),
                family_id: draft.family_id.clone(),
                title: draft.title.clone(),
                quantity: draft.quantity.clone(),
                unit: None,
                category_id: draft.category_id.clone(),
                is_needed: draft.is_needed,
                is_completed: false,
                completed_by: None,
                added_by: draft.added_by.clone(),
                notes: None,
                completed_at: None,
                created_at,
            },
            category: None,
            added_by_user,
        }
    }

    pub fn id(&self) -> &str {
        &self.item.id
    }
}

/// Counters shown in the list header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ShoppingStats {
    pub total: usize,
    pub completed: usize,
    pub remaining: usize,
}

impl ShoppingStats {
    pub fn from_items(items: &[ShoppingItemWithRelations]) -> Self {
        let completed = items.iter().filter(|i| i.item.is_completed).count();
        Self {
            total: items.len(),
            completed,
            remaining: items.len() - completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_json() -> serde_json::Value {
        serde_json::json!({
            "id": "i1",
            "family_id": "f1",
            "title": "Milk",
            "quantity": "2",
            "category_id": "c1",
            "is_needed": true,
            "is_completed": false,
            "created_at": "2026-03-01T08:00:00Z",
            "category": {
                "id": "c1",
                "family_id": "f1",
                "name": "Dairy",
                "icon": "🥛",
                "sort_order": 1
            },
            "added_by_user": null
        })
    }

    #[test]
    fn test_relations_deserialize_from_expanded_row() {
        let item: ShoppingItemWithRelations = serde_json::from_value(row_json()).unwrap();
        assert_eq!(item.id(), "i1");
        assert_eq!(item.item.quantity.as_deref(), Some("2"));
        assert_eq!(item.category.as_ref().map(|c| c.name.as_str()), Some("Dairy"));
        assert!(item.added_by_user.is_none());
        assert!(item.item.completion_consistent());
    }

    #[test]
    fn test_set_completion_keeps_timestamp_in_step() {
        let mut item: ShoppingItemWithRelations = serde_json::from_value(row_json()).unwrap();
        let now = Utc::now();

        item.item.set_completion(true, now);
        assert_eq!(item.item.completed_at, Some(now));
        assert!(item.item.completion_consistent());

        item.item.set_completion(false, now);
        assert_eq!(item.item.completed_at, None);
        assert!(item.item.completion_consistent());
    }

    #[test]
    fn test_new_item_payload_omits_absent_fields() {
        let draft = NewShoppingItem::new("f1", "Bread");
        let json = serde_json::to_value(&draft).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("id"));
        assert!(!obj.contains_key("created_at"));
        assert!(!obj.contains_key("category_id"));
        assert_eq!(obj["is_needed"], true);
        assert_eq!(obj["is_completed"], false);
    }

    #[test]
    fn test_provisional_item() {
        let mut draft = NewShoppingItem::new("f1", "Eggs");
        draft.quantity = Some("12".to_string());
        let temp = ShoppingItemWithRelations::provisional(&draft, None, Utc::now());
        assert!(temp.item.is_provisional());
        assert!(!temp.item.is_completed);
        assert_eq!(temp.item.quantity.as_deref(), Some("12"));

        let other = ShoppingItemWithRelations::provisional(&draft, None, Utc::now());
        assert_ne!(temp.id(), other.id());
    }

    #[test]
    fn test_stats() {
        let mut done: ShoppingItemWithRelations = serde_json::from_value(row_json()).unwrap();
        done.item.set_completion(true, Utc::now());
        let open: ShoppingItemWithRelations = serde_json::from_value(row_json()).unwrap();

        let stats = ShoppingStats::from_items(&[done.clone(), done, open]);
        assert_eq!(
            stats,
            ShoppingStats {
                total: 3,
                completed: 2,
                remaining: 1
            }
        );
    }
}
