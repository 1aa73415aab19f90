//! Grouping Utilities
//!
//! Helper functions for rendering the list by category.

use std::collections::HashMap;

use shopping_sync::domain::{Category, ShoppingItemWithRelations};

/// Items of one category (or of none) in display order
#[derive(Debug, Clone, PartialEq)]
pub struct ItemGroup {
    /// None = uncategorized
    pub category: Option<Category>,
    pub items: Vec<ShoppingItemWithRelations>,
}

impl ItemGroup {
    pub fn key(&self) -> String {
        self.category
            .as_ref()
            .map_or_else(|| "uncategorized".to_string(), |c| c.id.clone())
    }

    pub fn open_count(&self) -> usize {
        self.items.iter().filter(|i| !i.item.is_completed).count()
    }

    pub fn completed_count(&self) -> usize {
        self.items.len() - self.open_count()
    }
}

/// Open items first, then newest first
pub fn sort_for_display(items: &mut [ShoppingItemWithRelations]) {
    items.sort_by(|a, b| {
        a.item
            .is_completed
            .cmp(&b.item.is_completed)
            .then_with(|| b.item.created_at.cmp(&a.item.created_at))
    });
}

/// Group items by category in category order, uncategorized last.
/// Items pointing at an unknown category count as uncategorized; empty groups are left out.
pub fn group_by_category(items: &[ShoppingItemWithRelations], categories: &[Category]) -> Vec<ItemGroup> {
    let mut by_category: HashMap<&str, Vec<ShoppingItemWithRelations>> = HashMap::new();
    let mut uncategorized = Vec::new();

    for item in items {
        match item.item.category_id.as_deref() {
            Some(id) if categories.iter().any(|c| c.id == id) => {
                by_category.entry(id).or_default().push(item.clone());
            }
            _ => uncategorized.push(item.clone()),
        }
    }

    let mut groups: Vec<ItemGroup> = categories
        .iter()
        .filter_map(|category| {
            by_category.remove(category.id.as_str()).map(|items| ItemGroup {
                category: Some(category.clone()),
                items,
            })
        })
        .collect();
    if !uncategorized.is_empty() {
        groups.push(ItemGroup {
            category: None,
            items: uncategorized,
        });
    }

    for group in groups.iter_mut() {
        sort_for_display(&mut group.items);
    }
    groups
}
