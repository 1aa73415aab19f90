//! Demo Data
//!
//! Seeds the in-memory store used when no hosted store is configured.

use chrono::{Duration, Utc};
use serde_json::{json, Value};
use shopping_sync::domain::{Category, Family, Member, ShoppingItem};
use shopping_sync::gateway::MemoryStore;

const FAMILY_ID: &str = "demo-family";

fn category(id: &str, name: &str, icon: &str, sort_order: i32) -> Value {
    json!({
        "id": id,
        "family_id": FAMILY_ID,
        "name": name,
        "icon": icon,
        "sort_order": sort_order,
    })
}

fn item(id: &str, title: &str, category_id: Option<&str>, added_by: &str, minutes_ago: i64) -> Value {
    json!({
        "id": id,
        "family_id": FAMILY_ID,
        "title": title,
        "category_id": category_id,
        "is_needed": true,
        "is_completed": false,
        "added_by": added_by,
        "created_at": (Utc::now() - Duration::minutes(minutes_ago)).to_rfc3339(),
    })
}

pub fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    let now = Utc::now().to_rfc3339();

    store.seed(
        Family::TABLE,
        vec![json!({"id": FAMILY_ID, "name": "Demo Household", "created_at": now})],
    );
    store.seed(
        Member::TABLE,
        vec![
            json!({
                "id": "demo-alex",
                "family_id": FAMILY_ID,
                "display_name": "Alex",
                "role": "adult",
                "color_primary": "#3b82f6",
                "color_accent": "#93c5fd",
                "avatar_emoji": "🧑",
                "created_at": now,
            }),
            json!({
                "id": "demo-robin",
                "family_id": FAMILY_ID,
                "display_name": "Robin",
                "role": "child",
                "color_primary": "#f59e0b",
                "color_accent": "#fcd34d",
                "age": 9,
                "avatar_emoji": "🧒",
                "created_at": now,
            }),
        ],
    );
    store.seed(
        Category::TABLE,
        vec![
            category("demo-produce", "Produce", "🥦", 1),
            category("demo-dairy", "Dairy", "🥛", 2),
            category("demo-bakery", "Bakery", "🍞", 3),
            category("demo-household", "Household", "🧽", 4),
        ],
    );
    store.seed(
        ShoppingItem::TABLE,
        vec![
            item("demo-1", "Bananas", Some("demo-produce"), "demo-alex", 50),
            item("demo-2", "Milk", Some("demo-dairy"), "demo-robin", 40),
            item("demo-3", "Sourdough", Some("demo-bakery"), "demo-alex", 30),
            item("demo-4", "Birthday candles", None, "demo-robin", 20),
        ],
    );
    store
}
