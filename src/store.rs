//! Global Application State Store
//!
//! Uses Leptos reactive_stores for fine-grained reactivity. The session
//! objects push their snapshots in here; components only read.

use leptos::prelude::*;
use reactive_stores::Store;
use shopping_sync::domain::{Category, Family, ShoppingItemWithRelations};
use shopping_sync::session::{CategoryState, FamilyState};
use shopping_sync::ShoppingState;

/// Global application state with field-level reactivity
#[derive(Clone, Debug, Default, Store)]
pub struct AppState {
    /// The household, once resolved
    pub family: Option<Family>,
    pub family_loading: bool,
    /// Items with local overlays, in server order
    pub items: Vec<ShoppingItemWithRelations>,
    pub items_loading: bool,
    /// Categories ordered by sort_order
    pub categories: Vec<Category>,
    pub categories_loading: bool,
    /// Latest item error
    pub error: Option<String>,
    pub category_error: Option<String>,
    pub is_online: bool,
    pub is_syncing: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            family_loading: true,
            items_loading: true,
            categories_loading: true,
            is_online: true,
            ..Default::default()
        }
    }
}

/// Type alias for the store
pub type AppStore = Store<AppState>;

/// Get the app store from context
pub fn use_app_store() -> AppStore {
    expect_context::<AppStore>()
}

// ========================
// Snapshot Mirroring
// ========================

pub fn store_apply_family(store: &AppStore, state: &FamilyState) {
    *store.family().write() = state.family.as_deref().cloned();
    *store.family_loading().write() = state.loading;
}

pub fn store_apply_categories(store: &AppStore, state: &CategoryState) {
    *store.categories().write() = state.categories.clone();
    *store.categories_loading().write() = state.loading;
    *store.category_error().write() = state.error.clone();
}

pub fn store_apply_shopping(store: &AppStore, state: &ShoppingState) {
    *store.items().write() = state.items.clone();
    *store.items_loading().write() = state.loading;
    *store.error().write() = state.error.clone();
    *store.is_online().write() = state.is_online;
    *store.is_syncing().write() = state.is_syncing;
}
