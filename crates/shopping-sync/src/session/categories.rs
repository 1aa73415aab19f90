//! Category Directory
//!
//! Read-only, family-scoped list of categories ordered by `sort_order`.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, warn};

use crate::domain::{Category, Family};
use crate::gateway::{select_as, RemoteStore, Select};
use crate::listeners::Listeners;

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryState {
    pub categories: Vec<Category>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for CategoryState {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            loading: true,
            error: None,
        }
    }
}

pub struct CategoryDirectory {
    store: Rc<dyn RemoteStore>,
    family: RefCell<Option<Rc<Family>>>,
    state: RefCell<CategoryState>,
    listeners: Listeners<CategoryState>,
}

impl CategoryDirectory {
    pub fn new(store: Rc<dyn RemoteStore>) -> Self {
        Self {
            store,
            family: RefCell::new(None),
            state: RefCell::new(CategoryState::default()),
            listeners: Listeners::new(),
        }
    }

    pub fn state(&self) -> CategoryState {
        self.state.borrow().clone()
    }

    pub fn on_change(&self, callback: impl Fn(&CategoryState) + 'static) {
        self.listeners.add(callback);
    }

    /// Point the directory at a family; a new family identity triggers a fetch
    pub async fn bind(&self, family: Rc<Family>) {
        let unchanged = self
            .family
            .borrow()
            .as_ref()
            .is_some_and(|current| Rc::ptr_eq(current, &family));
        if unchanged {
            return;
        }
        *self.family.borrow_mut() = Some(family);
        self.refetch().await;
    }

    pub async fn refetch(&self) {
        let Some(family) = self.family.borrow().clone() else {
            return;
        };

        self.update(|state| {
            state.loading = true;
            state.error = None;
        });

        let query = Select::from(Category::TABLE)
            .eq("family_id", family.id.as_str())
            .order_by("sort_order", true);
        let result = select_as::<Category>(&*self.store, &query).await;

        let current = self.family.borrow().clone();
        if !current.is_some_and(|f| Rc::ptr_eq(&f, &family)) {
            debug!("Dropping categories fetched for a previous family");
            return;
        }

        self.update(|state| {
            match result {
                Ok(categories) => state.categories = categories,
                Err(e) => {
                    warn!("Category fetch failed: {}", e);
                    state.categories.clear();
                    state.error = Some(e.to_string());
                }
            }
            state.loading = false;
        });
    }

    fn update(&self, f: impl FnOnce(&mut CategoryState)) {
        let snapshot = {
            let mut state = self.state.borrow_mut();
            f(&mut state);
            state.clone()
        };
        self.listeners.emit(&snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{MemoryStore, Operation};
    use chrono::Utc;
    use serde_json::json;

    fn family(id: &str) -> Rc<Family> {
        Rc::new(Family {
            id: id.to_string(),
            name: "Home".to_string(),
            created_at: Utc::now(),
        })
    }

    fn store() -> Rc<MemoryStore> {
        let store = Rc::new(MemoryStore::new());
        store.seed(
            "categories",
            vec![
                json!({"id": "c2", "family_id": "f1", "name": "Bakery", "sort_order": 2}),
                json!({"id": "c1", "family_id": "f1", "name": "Produce", "icon": "🥦", "sort_order": 1}),
                json!({"id": "c9", "family_id": "f2", "name": "Hardware", "sort_order": 0}),
            ],
        );
        store
    }

    #[tokio::test]
    async fn test_fetches_family_categories_in_sort_order() {
        let store = store();
        let directory = CategoryDirectory::new(store.clone());
        directory.bind(family("f1")).await;

        let state = directory.state();
        assert!(!state.loading);
        assert!(state.error.is_none());
        let names: Vec<&str> = state.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Produce", "Bakery"]);
    }

    #[tokio::test]
    async fn test_refetches_on_identity_change_only() {
        let store = store();
        let directory = CategoryDirectory::new(store.clone());
        let home = family("f1");

        directory.bind(home.clone()).await;
        directory.bind(home).await;
        assert_eq!(store.select_count("categories"), 1);

        // Same value, new resolution
        directory.bind(family("f1")).await;
        assert_eq!(store.select_count("categories"), 2);
    }

    #[tokio::test]
    async fn test_failure_surfaces_message_and_retry_recovers() {
        let store = store();
        let directory = CategoryDirectory::new(store.clone());
        directory.bind(family("f1")).await;
        assert_eq!(directory.state().categories.len(), 2);

        store.fail_next(Operation::Select, "relation \"categories\" does not exist");
        directory.refetch().await;

        let state = directory.state();
        assert!(state.categories.is_empty());
        assert_eq!(
            state.error.as_deref(),
            Some("relation \"categories\" does not exist")
        );
        assert!(!state.loading);

        // Retry from the error banner
        directory.refetch().await;
        assert!(directory.state().error.is_none());
        assert_eq!(directory.state().categories.len(), 2);
    }

    #[tokio::test]
    async fn test_listeners_see_loading_transition() {
        let store = store();
        let directory = CategoryDirectory::new(store);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        directory.on_change(move |state| log.borrow_mut().push(state.loading));

        directory.bind(family("f1")).await;
        assert_eq!(*seen.borrow(), vec![true, false]);
    }
}
