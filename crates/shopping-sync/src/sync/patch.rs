//! Item Patches
//!
//! Local edits to the item list. Every optimistic mutation is described by a
//! forward patch and the inverse that undoes it. Patches are idempotent so
//! they can be re-applied on top of a freshly fetched snapshot.

use chrono::{DateTime, Utc};

use crate::domain::ShoppingItemWithRelations;

#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    Noop,
    /// Insert at the front unless the id is already present
    Prepend(ShoppingItemWithRelations),
    /// Insert at the end, skipping ids already present
    Append(Vec<ShoppingItemWithRelations>),
    Remove(Vec<String>),
    SetCompletion {
        id: String,
        is_completed: bool,
        completed_at: Option<DateTime<Utc>>,
    },
    /// Swap a provisional item for the row the server created
    Replace {
        provisional_id: String,
        item: ShoppingItemWithRelations,
    },
}

impl Patch {
    pub fn apply(&self, items: &mut Vec<ShoppingItemWithRelations>) {
        match self {
            Patch::Noop => {}
            Patch::Prepend(item) => {
                if !contains(items, item.id()) {
                    items.insert(0, item.clone());
                }
            }
            Patch::Append(extra) => {
                for item in extra {
                    if !contains(items, item.id()) {
                        items.push(item.clone());
                    }
                }
            }
            Patch::Remove(ids) => items.retain(|i| !ids.iter().any(|id| id == i.id())),
            Patch::SetCompletion {
                id,
                is_completed,
                completed_at,
            } => {
                if let Some(item) = items.iter_mut().find(|i| i.id() == id) {
                    item.item.is_completed = *is_completed;
                    item.item.completed_at = *completed_at;
                }
            }
            Patch::Replace {
                provisional_id,
                item,
            } => {
                if contains(items, item.id()) {
                    items.retain(|i| i.id() != provisional_id);
                } else if let Some(slot) = items.iter_mut().find(|i| i.id() == provisional_id) {
                    *slot = item.clone();
                } else {
                    items.insert(0, item.clone());
                }
            }
        }
    }
}

impl Patch {
    /// Point the patch at `to` wherever it names item `from`
    pub fn rename(&mut self, from: &str, to: &str) {
        let retarget = |id: &mut String| {
            if id == from {
                *id = to.to_string();
            }
        };
        match self {
            Patch::Noop | Patch::Replace { .. } => {}
            Patch::Prepend(item) => retarget(&mut item.item.id),
            Patch::Append(items) => items.iter_mut().for_each(|i| retarget(&mut i.item.id)),
            Patch::Remove(ids) => ids.iter_mut().for_each(retarget),
            Patch::SetCompletion { id, .. } => retarget(id),
        }
    }
}

fn contains(items: &[ShoppingItemWithRelations], id: &str) -> bool {
    items.iter().any(|i| i.id() == id)
}
