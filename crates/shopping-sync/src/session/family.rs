//! Family Resolution
//!
//! The client assumes a single family exists and looks it up without a
//! filter. Failing to find it ends the session; there is no retry.

use std::cell::RefCell;
use std::rc::Rc;

use log::{info, warn};

use crate::domain::Family;
use crate::error::{SyncError, SyncResult};
use crate::gateway::{select_as, RemoteStore, Select};
use crate::listeners::Listeners;

/// `family` is `None` both while loading and after a failed resolution
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyState {
    pub family: Option<Rc<Family>>,
    pub loading: bool,
}

impl Default for FamilyState {
    fn default() -> Self {
        Self {
            family: None,
            loading: true,
        }
    }
}

/// Single-row lookup of the family collection
pub async fn lookup_family(store: &dyn RemoteStore) -> SyncResult<Family> {
    let query = Select::from(Family::TABLE).single();
    select_as::<Family>(store, &query)
        .await?
        .pop()
        .ok_or(SyncError::NoFamily)
}

pub struct FamilyResolver {
    store: Rc<dyn RemoteStore>,
    state: RefCell<FamilyState>,
    listeners: Listeners<FamilyState>,
}

impl FamilyResolver {
    pub fn new(store: Rc<dyn RemoteStore>) -> Self {
        Self {
            store,
            state: RefCell::new(FamilyState::default()),
            listeners: Listeners::new(),
        }
    }

    pub fn state(&self) -> FamilyState {
        self.state.borrow().clone()
    }

    pub fn on_change(&self, callback: impl Fn(&FamilyState) + 'static) {
        self.listeners.add(callback);
    }

    /// Each successful resolution yields a fresh `Rc`, i.e. a new identity
    pub async fn resolve(&self) -> Option<Rc<Family>> {
        let family = match lookup_family(&*self.store).await {
            Ok(family) => {
                info!("Resolved family {} ({})", family.name, family.id);
                Some(Rc::new(family))
            }
            Err(e) => {
                warn!("Family resolution failed: {}", e);
                None
            }
        };

        let snapshot = {
            let mut state = self.state.borrow_mut();
            state.family = family.clone();
            state.loading = false;
            state.clone()
        };
        self.listeners.emit(&snapshot);
        family
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{MemoryStore, Operation};
    use serde_json::json;
    use std::cell::Cell;

    fn family_row(id: &str) -> serde_json::Value {
        json!({"id": id, "name": "Home", "created_at": "2026-01-01T00:00:00Z"})
    }

    #[tokio::test]
    async fn test_resolves_single_family() {
        let store = Rc::new(MemoryStore::new());
        store.seed("family", vec![family_row("f1")]);
        let resolver = FamilyResolver::new(store);
        assert!(resolver.state().loading);

        let notified = Rc::new(Cell::new(0));
        let counter = notified.clone();
        resolver.on_change(move |_| counter.set(counter.get() + 1));

        let family = resolver.resolve().await.unwrap();
        assert_eq!(family.id, "f1");
        let state = resolver.state();
        assert!(!state.loading);
        assert_eq!(state.family.as_deref().map(|f| f.id.as_str()), Some("f1"));
        assert_eq!(notified.get(), 1);
    }

    #[tokio::test]
    async fn test_missing_family_is_terminal() {
        let store = Rc::new(MemoryStore::new());
        let resolver = FamilyResolver::new(store.clone());

        assert!(resolver.resolve().await.is_none());
        let state = resolver.state();
        assert!(!state.loading);
        assert!(state.family.is_none());
        assert_eq!(store.select_count("family"), 1);
    }

    #[tokio::test]
    async fn test_failed_lookup_and_ambiguous_family() {
        let store = Rc::new(MemoryStore::new());
        store.seed("family", vec![family_row("f1")]);
        store.fail_next(Operation::Select, "connection refused");
        assert!(lookup_family(&*store).await.is_err());

        store.seed("family", vec![family_row("f2")]);
        assert!(lookup_family(&*store).await.is_err());
    }

    #[tokio::test]
    async fn test_each_resolution_is_a_new_identity() {
        let store = Rc::new(MemoryStore::new());
        store.seed("family", vec![family_row("f1")]);
        let resolver = FamilyResolver::new(store);

        let first = resolver.resolve().await.unwrap();
        let second = resolver.resolve().await.unwrap();
        assert_eq!(first, second);
        assert!(!Rc::ptr_eq(&first, &second));
    }
}
