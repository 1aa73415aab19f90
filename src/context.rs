//! Application Context
//!
//! The session objects shared via Leptos Context API. Components call these
//! helpers; results arrive through the store.

use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::warn;
use shopping_sync::session::{first_family_member, CategoryDirectory, FamilyResolver};
use shopping_sync::ShoppingListSynchronizer;

use crate::remote::Backend;
use crate::store::{store_apply_categories, store_apply_family, store_apply_shopping, AppStore};

/// App-wide session handles provided via context
#[derive(Clone, Copy)]
pub struct AppContext {
    backend: StoredValue<Backend, LocalStorage>,
    resolver: StoredValue<Rc<FamilyResolver>, LocalStorage>,
    categories: StoredValue<Rc<CategoryDirectory>, LocalStorage>,
    sync: StoredValue<Rc<ShoppingListSynchronizer>, LocalStorage>,
}

impl AppContext {
    pub fn new(backend: Backend) -> Self {
        let resolver = Rc::new(FamilyResolver::new(backend.store.clone()));
        let categories = Rc::new(CategoryDirectory::new(backend.store.clone()));
        let sync = ShoppingListSynchronizer::new(
            backend.store.clone(),
            backend.feed.clone(),
            backend.connectivity.clone(),
        );
        Self {
            backend: StoredValue::new_local(backend),
            resolver: StoredValue::new_local(resolver),
            categories: StoredValue::new_local(categories),
            sync: StoredValue::new_local(sync),
        }
    }

    /// Mirror every session snapshot into the reactive store
    pub fn bind_store(&self, store: AppStore) {
        self.resolver
            .get_value()
            .on_change(move |state| store_apply_family(&store, state));
        self.categories
            .get_value()
            .on_change(move |state| store_apply_categories(&store, state));
        let sync = self.sync.get_value();
        store_apply_shopping(&store, &sync.state());
        sync.on_change(move |state| store_apply_shopping(&store, state));
    }

    /// Resolve the family, then load categories and start the list session
    pub fn start(&self) {
        let ctx = *self;
        spawn_local(async move {
            let Some(family) = ctx.resolver.get_value().resolve().await else {
                return;
            };

            let categories = ctx.categories.get_value();
            let bound = Rc::clone(&family);
            spawn_local(async move { categories.bind(bound).await });

            let store = ctx.backend.get_value().store;
            let member = match first_family_member(store.as_ref(), &family.id).await {
                Ok(member) => member,
                Err(e) => {
                    warn!("Could not load a family member: {}", e);
                    None
                }
            };
            ctx.sync.get_value().activate(family, member).await;
        });
    }

    /// Stop following remote changes
    pub fn stop(&self) {
        if let Some(sync) = self.sync.try_get_value() {
            sync.deactivate();
        }
    }

    pub fn add_item(&self, title: String, category_id: Option<String>, quantity: Option<String>) {
        let sync = self.sync.get_value();
        spawn_local(async move { sync.add_item(&title, category_id, quantity).await });
    }

    pub fn toggle_item(&self, id: String, is_completed: bool) {
        let sync = self.sync.get_value();
        spawn_local(async move { sync.toggle_item(&id, is_completed).await });
    }

    pub fn delete_item(&self, id: String) {
        let sync = self.sync.get_value();
        spawn_local(async move { sync.delete_item(&id).await });
    }

    pub fn clear_completed(&self) {
        let sync = self.sync.get_value();
        spawn_local(async move { sync.clear_completed().await });
    }

    pub fn refetch_categories(&self) {
        let categories = self.categories.get_value();
        spawn_local(async move { categories.refetch().await });
    }
}
