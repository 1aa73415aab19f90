//! Pending Mutations
//!
//! An optimistic write is a forward patch shown at once, an inverse patch
//! used on failure and the remote operation itself. The ledger keeps the
//! writes a fetched snapshot may not reflect yet and re-applies them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::warn;
use serde_json::{json, Value};

use super::patch::Patch;
use crate::domain::{NewShoppingItem, ShoppingItem, ShoppingItemWithRelations, PROVISIONAL_PREFIX};
use crate::error::StoreResult;
use crate::gateway::{Filter, Mutation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MutationKind {
    Add,
    Toggle,
    Delete,
    ClearCompleted,
}

impl MutationKind {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            MutationKind::Add => "add item",
            MutationKind::Toggle => "toggle item",
            MutationKind::Delete => "delete item",
            MutationKind::ClearCompleted => "clear completed",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PendingMutation {
    pub(crate) kind: MutationKind,
    /// Item ids whose remote writes must stay in issue order
    pub(crate) keys: Vec<String>,
    pub(crate) forward: Patch,
    pub(crate) inverse: Patch,
    pub(crate) remote: Mutation,
}

impl PendingMutation {
    pub(crate) fn add(draft: &NewShoppingItem, provisional: ShoppingItemWithRelations) -> StoreResult<Self> {
        let row = serde_json::to_value(draft)?;
        Ok(Self {
            kind: MutationKind::Add,
            keys: vec![provisional.id().to_string()],
            inverse: Patch::Remove(vec![provisional.id().to_string()]),
            forward: Patch::Prepend(provisional),
            remote: Mutation::Insert {
                table: ShoppingItem::TABLE.to_string(),
                row,
            },
        })
    }

    /// `existing` is the item as currently shown; without it there is nothing to restore
    pub(crate) fn toggle(
        id: &str,
        current_is_completed: bool,
        existing: Option<&ShoppingItemWithRelations>,
        now: DateTime<Utc>,
    ) -> Self {
        let is_completed = !current_is_completed;
        let completed_at = is_completed.then_some(now);
        let inverse = existing.map_or(Patch::Noop, |item| Patch::SetCompletion {
            id: id.to_string(),
            is_completed: item.item.is_completed,
            completed_at: item.item.completed_at,
        });
        Self {
            kind: MutationKind::Toggle,
            keys: vec![id.to_string()],
            forward: Patch::SetCompletion {
                id: id.to_string(),
                is_completed,
                completed_at,
            },
            inverse,
            remote: Mutation::Update {
                table: ShoppingItem::TABLE.to_string(),
                filter: target_filter(MutationKind::Toggle, &[id.to_string()]),
                patch: json!({
                    "is_completed": is_completed,
                    "completed_at": completed_at,
                }),
            },
        }
    }

    pub(crate) fn delete(id: &str, existing: Option<ShoppingItemWithRelations>) -> Self {
        Self {
            kind: MutationKind::Delete,
            keys: vec![id.to_string()],
            forward: Patch::Remove(vec![id.to_string()]),
            inverse: existing.map_or(Patch::Noop, |item| Patch::Append(vec![item])),
            remote: Mutation::Delete {
                table: ShoppingItem::TABLE.to_string(),
                filter: target_filter(MutationKind::Delete, &[id.to_string()]),
            },
        }
    }

    pub(crate) fn clear_completed(completed: Vec<ShoppingItemWithRelations>) -> Self {
        let ids: Vec<String> = completed.iter().map(|i| i.id().to_string()).collect();
        Self {
            kind: MutationKind::ClearCompleted,
            keys: ids.clone(),
            forward: Patch::Remove(ids.clone()),
            inverse: Patch::Append(completed),
            remote: Mutation::Delete {
                table: ShoppingItem::TABLE.to_string(),
                filter: target_filter(MutationKind::ClearCompleted, &ids),
            },
        }
    }

    /// Aim the write at server ids. Items added locally are only known by
    /// their provisional id until their insert commits; `resolve` maps an id
    /// to the one the store knows, or `None` for an insert that never landed.
    /// Returns `None` when nothing is left to send.
    pub(crate) fn retarget(mut self, resolve: impl Fn(&str) -> Option<String>) -> Option<Self> {
        if self.kind == MutationKind::Add {
            return Some(self);
        }
        let resolved: Vec<(String, String)> = self
            .keys
            .iter()
            .filter_map(|key| resolve(key.as_str()).map(|id| (key.clone(), id)))
            .collect();
        if resolved.is_empty() {
            return None;
        }
        if resolved.len() == self.keys.len() && resolved.iter().all(|(key, id)| key == id) {
            return Some(self);
        }

        for (key, id) in resolved.iter().filter(|(key, id)| key != id) {
            self.forward.rename(key, id);
            self.inverse.rename(key, id);
        }
        let targets: Vec<String> = resolved.into_iter().map(|(_, id)| id).collect();
        if let Patch::Append(items) = &mut self.inverse {
            items.retain(|item| targets.iter().any(|id| id == item.id()));
        }
        let filter = target_filter(self.kind, &targets);
        self.remote = match self.remote {
            Mutation::Update { table, patch, .. } => Mutation::Update { table, filter, patch },
            Mutation::Delete { table, .. } => Mutation::Delete { table, filter },
            insert => insert,
        };
        self.keys = targets;
        Some(self)
    }

    /// The patch that describes the write once the store accepted it.
    /// For an insert that is the returned row taking the provisional item's place.
    pub(crate) fn committed_patch(&self, rows: &[Value]) -> Patch {
        let Patch::Prepend(provisional) = &self.forward else {
            return self.forward.clone();
        };
        let Some(row) = rows.first() else {
            warn!("Insert returned no row, keeping provisional item {}", provisional.id());
            return self.forward.clone();
        };
        match serde_json::from_value::<ShoppingItem>(row.clone()) {
            Ok(item) => Patch::Replace {
                provisional_id: provisional.id().to_string(),
                item: ShoppingItemWithRelations {
                    item,
                    category: provisional.category.clone(),
                    added_by_user: provisional.added_by_user.clone(),
                },
            },
            Err(e) => {
                warn!("Malformed insert response: {}", e);
                self.forward.clone()
            }
        }
    }
}

fn target_filter(kind: MutationKind, ids: &[String]) -> Filter {
    match (kind, ids) {
        (MutationKind::ClearCompleted, _) | (_, []) => Filter::is_in("id", ids.iter().map(String::as_str)),
        (_, [id, ..]) => Filter::eq("id", id.as_str()),
    }
}

/// Marks a fetch started at some epoch of one ledger generation
pub(crate) struct FetchTicket {
    epoch: u64,
    generation: u64,
}

/// Local writes a fetched snapshot may predate.
///
/// In-flight writes are re-applied to every snapshot. A committed write is
/// re-applied only to snapshots whose fetch began before the commit, and is
/// forgotten once no fetch is outstanding. Fetches started before a reset
/// no longer count as outstanding.
pub(crate) struct MutationLedger {
    next_seq: u64,
    epoch: u64,
    generation: u64,
    in_flight: Vec<(u64, Patch)>,
    committed: Vec<(u64, Patch)>,
    active_fetches: usize,
    /// Provisional id to server id, for writes queued behind an insert
    aliases: HashMap<String, String>,
}

impl MutationLedger {
    pub(crate) fn new() -> Self {
        Self {
            next_seq: 0,
            epoch: 0,
            generation: 0,
            in_flight: Vec::new(),
            committed: Vec::new(),
            active_fetches: 0,
            aliases: HashMap::new(),
        }
    }

    pub(crate) fn begin(&mut self, forward: Patch) -> u64 {
        self.next_seq += 1;
        self.in_flight.push((self.next_seq, forward));
        self.next_seq
    }

    pub(crate) fn commit(&mut self, seq: u64, patch: Patch) {
        if !self.take(seq) {
            return;
        }
        if let Patch::Replace { provisional_id, item } = &patch {
            if !self.in_flight.is_empty() {
                for (_, pending) in self.in_flight.iter_mut() {
                    pending.rename(provisional_id, item.id());
                }
                self.aliases.insert(provisional_id.clone(), item.id().to_string());
            }
        }
        self.epoch += 1;
        if self.active_fetches > 0 {
            self.committed.push((self.epoch, patch));
        }
    }

    pub(crate) fn abandon(&mut self, seq: u64) {
        self.take(seq);
    }

    /// The id the store knows `id` by; `None` for a provisional item whose
    /// insert has not committed
    pub(crate) fn resolve(&self, id: &str) -> Option<String> {
        match self.aliases.get(id) {
            Some(real) => Some(real.clone()),
            None if id.starts_with(PROVISIONAL_PREFIX) => None,
            None => Some(id.to_string()),
        }
    }

    /// Re-apply writes still in flight, e.g. after a commit replaced an item they touch
    pub(crate) fn overlay(&self, items: &mut Vec<ShoppingItemWithRelations>) {
        for (_, patch) in &self.in_flight {
            patch.apply(items);
        }
    }

    pub(crate) fn begin_fetch(&mut self) -> FetchTicket {
        self.active_fetches += 1;
        FetchTicket {
            epoch: self.epoch,
            generation: self.generation,
        }
    }

    /// Close a fetch that produced no snapshot
    pub(crate) fn end_fetch(&mut self, ticket: &FetchTicket) {
        if ticket.generation != self.generation {
            return;
        }
        self.active_fetches = self.active_fetches.saturating_sub(1);
        if self.active_fetches == 0 {
            self.committed.clear();
        }
    }

    /// Overlay local writes on a fetched snapshot and close the fetch
    pub(crate) fn reconcile(
        &mut self,
        ticket: FetchTicket,
        mut items: Vec<ShoppingItemWithRelations>,
    ) -> Vec<ShoppingItemWithRelations> {
        if ticket.generation == self.generation {
            for (epoch, patch) in &self.committed {
                if *epoch > ticket.epoch {
                    patch.apply(&mut items);
                }
            }
        }
        self.overlay(&mut items);
        self.end_fetch(&ticket);
        items
    }

    /// Forget everything, e.g. when the list switches to another family
    pub(crate) fn reset(&mut self) {
        self.generation += 1;
        self.in_flight.clear();
        self.committed.clear();
        self.aliases.clear();
        self.active_fetches = 0;
    }

    fn take(&mut self, seq: u64) -> bool {
        let before = self.in_flight.len();
        self.in_flight.retain(|(s, _)| *s != seq);
        if self.in_flight.is_empty() {
            self.aliases.clear();
        }
        self.in_flight.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, completed: bool) -> ShoppingItemWithRelations {
        let mut item: ShoppingItemWithRelations = serde_json::from_value(json!({
            "id": id,
            "family_id": "f1",
            "title": id,
            "is_completed": false,
            "created_at": "2026-03-01T08:00:00Z"
        }))
        .unwrap();
        item.item.set_completion(completed, Utc::now());
        item
    }

    #[test]
    fn test_toggle_update_payload() {
        let now = Utc::now();
        let done = PendingMutation::toggle("a", false, Some(&item("a", false)), now);
        let Mutation::Update { patch, .. } = &done.remote else {
            panic!("expected update");
        };
        assert_eq!(patch["is_completed"], true);
        assert!(patch["completed_at"].is_string());
        assert_eq!(
            done.inverse,
            Patch::SetCompletion {
                id: "a".to_string(),
                is_completed: false,
                completed_at: None
            }
        );

        let undone = PendingMutation::toggle("a", true, None, now);
        let Mutation::Update { patch, .. } = &undone.remote else {
            panic!("expected update");
        };
        assert_eq!(patch["is_completed"], false);
        assert!(patch["completed_at"].is_null());
        assert_eq!(undone.inverse, Patch::Noop);
    }

    #[test]
    fn test_add_commit_replaces_provisional_with_returned_row() {
        let draft = NewShoppingItem::new("f1", "Milk");
        let temp = ShoppingItemWithRelations::provisional(&draft, None, Utc::now());
        let add = PendingMutation::add(&draft, temp.clone()).unwrap();

        let returned = json!({
            "id": "real-1",
            "family_id": "f1",
            "title": "Milk",
            "is_needed": true,
            "is_completed": false,
            "created_at": "2026-03-01T09:00:00Z"
        });
        match add.committed_patch(&[returned]) {
            Patch::Replace { provisional_id, item } => {
                assert_eq!(provisional_id, temp.id());
                assert_eq!(item.id(), "real-1");
            }
            other => panic!("unexpected patch {:?}", other),
        }

        assert_eq!(add.committed_patch(&[]), add.forward);
    }

    #[test]
    fn test_ledger_reapplies_commits_newer_than_fetch() {
        let mut ledger = MutationLedger::new();
        let ticket = ledger.begin_fetch();

        let toggle = PendingMutation::toggle("a", false, Some(&item("a", false)), Utc::now());
        let seq = ledger.begin(toggle.forward.clone());
        ledger.commit(seq, toggle.forward.clone());

        // Snapshot read before the commit landed
        let items = ledger.reconcile(ticket, vec![item("a", false)]);
        assert!(items[0].item.is_completed);

        // Nothing outstanding any more
        let ticket = ledger.begin_fetch();
        let items = ledger.reconcile(ticket, vec![item("a", false)]);
        assert!(!items[0].item.is_completed);
    }

    #[test]
    fn test_ledger_keeps_in_flight_until_resolved() {
        let mut ledger = MutationLedger::new();
        let delete = PendingMutation::delete("a", Some(item("a", false)));
        let seq = ledger.begin(delete.forward.clone());

        let ticket = ledger.begin_fetch();
        let items = ledger.reconcile(ticket, vec![item("a", false), item("b", false)]);
        assert_eq!(items.len(), 1);

        ledger.abandon(seq);
        let ticket = ledger.begin_fetch();
        let items = ledger.reconcile(ticket, vec![item("a", false), item("b", false)]);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_reset_ignores_fetches_of_previous_generation() {
        let mut ledger = MutationLedger::new();
        let old = ledger.begin_fetch();
        ledger.reset();

        let current = ledger.begin_fetch();
        let toggle = PendingMutation::toggle("a", false, Some(&item("a", false)), Utc::now());
        let seq = ledger.begin(toggle.forward.clone());
        ledger.commit(seq, toggle.forward.clone());

        // The old fetch finishing must not close the current one
        ledger.end_fetch(&old);
        let items = ledger.reconcile(current, vec![item("a", false)]);
        assert!(items[0].item.is_completed);
    }

    #[test]
    fn test_writes_queued_behind_add_follow_server_id() {
        let mut ledger = MutationLedger::new();
        let draft = NewShoppingItem::new("f1", "Milk");
        let temp = ShoppingItemWithRelations::provisional(&draft, None, Utc::now());
        let temp_id = temp.id().to_string();
        let add = PendingMutation::add(&draft, temp.clone()).unwrap();
        let add_seq = ledger.begin(add.forward.clone());

        let delete = PendingMutation::delete(&temp_id, Some(temp.clone()));
        let delete_seq = ledger.begin(delete.forward.clone());
        assert_eq!(ledger.resolve(&temp_id), None);

        let returned = json!({
            "id": "real-1",
            "family_id": "f1",
            "title": "Milk",
            "is_completed": false,
            "created_at": "2026-03-01T09:00:00Z"
        });
        ledger.commit(add_seq, add.committed_patch(&[returned]));
        assert_eq!(ledger.resolve(&temp_id).as_deref(), Some("real-1"));
        assert_eq!(ledger.resolve("b").as_deref(), Some("b"));

        let delete = delete.retarget(|id| ledger.resolve(id)).unwrap();
        assert_eq!(delete.keys, vec!["real-1".to_string()]);
        assert_eq!(delete.forward, Patch::Remove(vec!["real-1".to_string()]));
        let Mutation::Delete { filter, .. } = &delete.remote else {
            panic!("expected delete");
        };
        assert_eq!(filter, &Filter::eq("id", "real-1"));

        // A fetched snapshot with the new row still hides it
        let ticket = ledger.begin_fetch();
        let mut returned_item = item("real-1", false);
        returned_item.item.title = "Milk".to_string();
        let items = ledger.reconcile(ticket, vec![returned_item, item("b", false)]);
        assert_eq!(items.len(), 1);

        ledger.commit(delete_seq, delete.forward.clone());
        assert_eq!(ledger.resolve(&temp_id), None);
    }

    #[test]
    fn test_retarget_drops_items_that_never_landed() {
        let ledger = MutationLedger::new();
        let temp = ShoppingItemWithRelations::provisional(&NewShoppingItem::new("f1", "Milk"), None, Utc::now());

        let toggle = PendingMutation::toggle(temp.id(), false, Some(&temp), Utc::now());
        assert!(toggle.retarget(|id| ledger.resolve(id)).is_none());

        let mut done = temp.clone();
        done.item.set_completion(true, Utc::now());
        let clear = PendingMutation::clear_completed(vec![done, item("b", true)]);
        let clear = clear.retarget(|id| ledger.resolve(id)).unwrap();
        assert_eq!(clear.keys, vec!["b".to_string()]);
        let Mutation::Delete { filter, .. } = &clear.remote else {
            panic!("expected delete");
        };
        assert_eq!(filter, &Filter::is_in("id", ["b"]));
        let Patch::Append(restore) = &clear.inverse else {
            panic!("expected append");
        };
        assert_eq!(restore.len(), 1);
    }

    #[test]
    fn test_clear_completed_targets_all_ids() {
        let clear = PendingMutation::clear_completed(vec![item("a", true), item("c", true)]);
        let Mutation::Delete { filter, .. } = &clear.remote else {
            panic!("expected delete");
        };
        assert_eq!(filter, &Filter::is_in("id", ["a", "c"]));
        assert_eq!(clear.keys, vec!["a".to_string(), "c".to_string()]);
    }
}
