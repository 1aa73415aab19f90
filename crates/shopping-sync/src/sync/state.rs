//! Synchronizer State
//!
//! What the presentation layer reads. Stats are derived, never stored.

use crate::domain::{ShoppingItemWithRelations, ShoppingStats};

#[derive(Debug, Clone, PartialEq)]
pub struct ShoppingState {
    /// Server order (open first, newest first) with local overlays applied
    pub items: Vec<ShoppingItemWithRelations>,
    /// True until the first fetch completes
    pub loading: bool,
    /// Latest failure; cleared by the next successful operation
    pub error: Option<String>,
    pub is_online: bool,
    /// True only while a realtime-triggered refetch runs
    pub is_syncing: bool,
}

impl ShoppingState {
    pub fn new(is_online: bool) -> Self {
        Self {
            items: Vec::new(),
            loading: true,
            error: None,
            is_online,
            is_syncing: false,
        }
    }

    pub fn stats(&self) -> ShoppingStats {
        ShoppingStats::from_items(&self.items)
    }

    pub fn item(&self, id: &str) -> Option<&ShoppingItemWithRelations> {
        self.items.iter().find(|i| i.id() == id)
    }
}
