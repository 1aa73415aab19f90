//! Shopping List Synchronizer
//!
//! Keeps the local item list in step with the remote store for one family.
//! Writes show up at once and are rolled back if the store rejects them;
//! remote changes and reconnection trigger a full refetch.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use chrono::Utc;
use futures::stream::{self, AbortHandle, AbortRegistration, Abortable, LocalBoxStream, SelectAll, StreamExt};
use log::{debug, info, warn};

use super::connectivity::{ConnectivityEvent, ConnectivityObserver};
use super::keyed::KeyedTurns;
use super::mutation::{MutationLedger, PendingMutation};
use super::state::ShoppingState;
use crate::domain::{
    Category, Family, Member, NewShoppingItem, ShoppingItem, ShoppingItemWithRelations,
    ShoppingStats,
};
use crate::error::SyncError;
use crate::gateway::{
    select_as, ChangeFeed, ChangeKind, ChangeNotice, ChannelSpec, Filter, RemoteStore, Select,
};
use crate::listeners::Listeners;

/// Name of the realtime channel carrying item changes
pub const CHANNEL_NAME: &str = "shopping_changes";

/// Items of a family with their category and author, open items first, newest first
pub fn items_query(family_id: &str) -> Select {
    Select::from(ShoppingItem::TABLE)
        .eq("family_id", family_id)
        .embed("category", Category::TABLE, "category_id")
        .embed("added_by_user", Member::TABLE, "added_by")
        .order_by("is_completed", true)
        .order_by("created_at", false)
}

#[derive(Clone)]
struct Session {
    family: Rc<Family>,
    member: Option<Member>,
    generation: u64,
}

enum Signal {
    Changed(ChangeNotice),
    /// The realtime subscription ended, e.g. its socket closed
    FeedLost,
    Connectivity(ConnectivityEvent),
}

pub struct ShoppingListSynchronizer {
    store: Rc<dyn RemoteStore>,
    feed: Rc<dyn ChangeFeed>,
    connectivity: Rc<dyn ConnectivityObserver>,
    state: RefCell<ShoppingState>,
    session: RefCell<Option<Session>>,
    /// Family the held items belong to; outlives deactivation
    items_family: RefCell<Option<String>>,
    /// Bumped on every activation and deactivation; older fetches are discarded
    generation: Cell<u64>,
    signals: RefCell<Option<AbortHandle>>,
    ledger: RefCell<MutationLedger>,
    turns: KeyedTurns,
    listeners: Listeners<ShoppingState>,
}

impl ShoppingListSynchronizer {
    pub fn new(
        store: Rc<dyn RemoteStore>,
        feed: Rc<dyn ChangeFeed>,
        connectivity: Rc<dyn ConnectivityObserver>,
    ) -> Rc<Self> {
        let is_online = connectivity.is_online();
        Rc::new(Self {
            store,
            feed,
            connectivity,
            state: RefCell::new(ShoppingState::new(is_online)),
            session: RefCell::new(None),
            items_family: RefCell::new(None),
            generation: Cell::new(0),
            signals: RefCell::new(None),
            ledger: RefCell::new(MutationLedger::new()),
            turns: KeyedTurns::new(),
            listeners: Listeners::new(),
        })
    }

    pub fn state(&self) -> ShoppingState {
        self.state.borrow().clone()
    }

    pub fn stats(&self) -> ShoppingStats {
        self.state.borrow().stats()
    }

    pub fn family(&self) -> Option<Rc<Family>> {
        self.session.borrow().as_ref().map(|s| Rc::clone(&s.family))
    }

    pub fn on_change(&self, callback: impl Fn(&ShoppingState) + 'static) {
        self.listeners.add(callback);
    }

    /// Start synchronizing `family`, acting as `member` for new items.
    ///
    /// Any previous session is closed first. The returned future fetches the
    /// list, then follows remote changes and connectivity until the session
    /// is deactivated or replaced; the host spawns it on its local executor.
    pub fn activate(
        self: &Rc<Self>,
        family: Rc<Family>,
        member: Option<Member>,
    ) -> impl Future<Output = ()> + 'static {
        let switched = self.items_family.borrow().as_deref() != Some(family.id.as_str());
        self.close_signals();

        let generation = self.generation.get() + 1;
        self.generation.set(generation);

        if switched {
            self.ledger.borrow_mut().reset();
            self.update(|state| {
                state.items.clear();
                state.loading = true;
                state.error = None;
            });
        }

        *self.items_family.borrow_mut() = Some(family.id.clone());
        *self.session.borrow_mut() = Some(Session {
            family: Rc::clone(&family),
            member,
            generation,
        });

        let (handle, registration) = AbortHandle::new_pair();
        *self.signals.borrow_mut() = Some(handle);

        info!("Activating shopping list for family {}", family.id);
        let this = Rc::clone(self);
        async move { this.run_session(family, generation, registration).await }
    }

    /// Close the realtime subscription and ignore fetches still in flight.
    /// Writes already sent finish and still roll back on failure, until
    /// another family is activated.
    pub fn deactivate(&self) {
        self.close_signals();
        self.generation.set(self.generation.get() + 1);
        if let Some(session) = self.session.borrow_mut().take() {
            info!("Deactivated shopping list for family {}", session.family.id);
        }
    }

    async fn run_session(
        self: Rc<Self>,
        family: Rc<Family>,
        generation: u64,
        registration: AbortRegistration,
    ) {
        let channel = ChannelSpec {
            name: CHANNEL_NAME.to_string(),
            table: ShoppingItem::TABLE.to_string(),
            filter: Filter::eq("family_id", family.id.as_str()),
            events: ChangeKind::ALL.to_vec(),
        };

        let mut sources = SelectAll::new();
        let mut feed_lost = true;
        if let Some(notices) = self.subscribe(&channel).await {
            sources.push(notices);
            feed_lost = false;
        }
        sources.push(self.connectivity.watch().map(Signal::Connectivity).boxed_local());
        let mut signals = Abortable::new(sources, registration);

        if self.generation.get() != generation {
            return;
        }
        self.fetch_items().await;

        while let Some(signal) = signals.next().await {
            match signal {
                Signal::Changed(notice) => {
                    debug!(
                        "Change on {} ({})",
                        notice.table,
                        notice.kind.map_or("unknown", |k| k.as_str())
                    );
                    self.refresh_after_change().await;
                }
                Signal::FeedLost => {
                    info!("Realtime subscription for family {} ended", family.id);
                    feed_lost = true;
                    if self.state.borrow().is_online {
                        let resubscribed = self.subscribe(&channel).await;
                        if self.generation.get() != generation {
                            break;
                        }
                        if let Some(notices) = resubscribed {
                            signals.get_mut().push(notices);
                            feed_lost = false;
                            self.refresh_after_change().await;
                        }
                    }
                }
                Signal::Connectivity(event) => {
                    // Coming back online refetches, which covers what the feed missed
                    if event == ConnectivityEvent::Online && feed_lost {
                        let resubscribed = self.subscribe(&channel).await;
                        if self.generation.get() != generation {
                            break;
                        }
                        if let Some(notices) = resubscribed {
                            signals.get_mut().push(notices);
                            feed_lost = false;
                        }
                    }
                    self.apply_connectivity(event).await;
                }
            }
        }
        debug!("Session for family {} closed", family.id);
    }

    /// Notices of `channel`, followed by `FeedLost` when the subscription ends
    async fn subscribe(&self, channel: &ChannelSpec) -> Option<LocalBoxStream<'static, Signal>> {
        match self.feed.subscribe(channel).await {
            Ok(subscription) => {
                debug!("Subscribed to {} ({})", channel.name, channel.table);
                Some(
                    subscription
                        .map(Signal::Changed)
                        .chain(stream::once(async { Signal::FeedLost }))
                        .boxed_local(),
                )
            }
            Err(e) => {
                warn!("Realtime subscription failed, retrying once back online: {}", e);
                None
            }
        }
    }

    /// Replace the item list with the current server state
    pub async fn fetch_items(&self) {
        let Some(session) = self.session.borrow().clone() else {
            return;
        };

        let ticket = self.ledger.borrow_mut().begin_fetch();
        let query = items_query(&session.family.id);
        let result = select_as::<ShoppingItemWithRelations>(self.store.as_ref(), &query).await;

        if self.generation.get() != session.generation {
            self.ledger.borrow_mut().end_fetch(&ticket);
            debug!("Discarding items fetched for a closed session");
            return;
        }

        match result {
            Ok(rows) => {
                let items = self.ledger.borrow_mut().reconcile(ticket, rows);
                debug!("Fetched {} items", items.len());
                self.update(|state| {
                    state.items = items;
                    state.error = None;
                    state.loading = false;
                });
            }
            Err(e) => {
                self.ledger.borrow_mut().end_fetch(&ticket);
                warn!("Failed to fetch items: {}", e);
                self.update(|state| {
                    state.error = Some(e.to_string());
                    state.loading = false;
                });
            }
        }
    }

    /// Refetch after a remote change, flagging the sync in progress
    pub async fn refresh_after_change(&self) {
        self.update(|state| state.is_syncing = true);
        self.fetch_items().await;
        self.update(|state| state.is_syncing = false);
    }

    /// Track connectivity; coming back online refetches once
    pub async fn apply_connectivity(&self, event: ConnectivityEvent) {
        let was_online = self.state.borrow().is_online;
        match event {
            ConnectivityEvent::Online => {
                self.update(|state| state.is_online = true);
                if !was_online {
                    info!("Back online, refreshing items");
                    self.fetch_items().await;
                }
            }
            ConnectivityEvent::Offline => {
                if was_online {
                    info!("Gone offline");
                }
                self.update(|state| state.is_online = false);
            }
        }
    }

    /// Add an item. Empty category and quantity count as absent.
    pub async fn add_item(&self, title: &str, category_id: Option<String>, quantity: Option<String>) {
        let Some(session) = self.session.borrow().clone() else {
            warn!("Cannot add {:?} without a family", title);
            self.update(|state| state.error = Some(SyncError::NoFamily.to_string()));
            return;
        };

        let mut draft = NewShoppingItem::new(&session.family.id, title.trim());
        draft.category_id = category_id.filter(|c| !c.is_empty());
        draft.quantity = quantity
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());
        draft.added_by = session.member.as_ref().map(|m| m.id.clone());

        let provisional =
            ShoppingItemWithRelations::provisional(&draft, session.member.clone(), Utc::now());
        match PendingMutation::add(&draft, provisional) {
            Ok(mutation) => self.run(mutation).await,
            Err(e) => self.update(|state| state.error = Some(e.to_string())),
        }
    }

    /// Flip completion of an item given the completion state the caller saw
    pub async fn toggle_item(&self, id: &str, current_is_completed: bool) {
        let existing = self.state.borrow().item(id).cloned();
        let mutation =
            PendingMutation::toggle(id, current_is_completed, existing.as_ref(), Utc::now());
        self.run(mutation).await
    }

    pub async fn delete_item(&self, id: &str) {
        let existing = self.state.borrow().item(id).cloned();
        self.run(PendingMutation::delete(id, existing)).await
    }

    /// Delete every completed item in one remote call
    pub async fn clear_completed(&self) {
        let completed: Vec<ShoppingItemWithRelations> = self
            .state
            .borrow()
            .items
            .iter()
            .filter(|i| i.item.is_completed)
            .cloned()
            .collect();
        if completed.is_empty() {
            return;
        }
        self.run(PendingMutation::clear_completed(completed)).await
    }

    async fn run(&self, mutation: PendingMutation) {
        let family_id = self.items_family.borrow().clone();
        let seq = self.ledger.borrow_mut().begin(mutation.forward.clone());
        self.update(|state| mutation.forward.apply(&mut state.items));

        let mut turn = self.turns.enter(&mutation.keys);
        turn.ready().await;

        let label = mutation.kind.label();
        let retargeted = {
            let ledger = self.ledger.borrow();
            mutation.retarget(|id| ledger.resolve(id))
        };
        let Some(mutation) = retargeted else {
            self.ledger.borrow_mut().abandon(seq);
            debug!("Skipping {}, its item was never created", label);
            return;
        };
        let result = self.store.execute(&mutation.remote).await;

        if *self.items_family.borrow() != family_id {
            self.ledger.borrow_mut().abandon(seq);
            debug!("Dropping result of {} for a previous family", label);
            return;
        }

        match result {
            Ok(rows) => {
                let committed = mutation.committed_patch(&rows);
                debug!("Committed {}", label);
                // The forward patch is already visible; re-applying it could
                // undo a later write on the same item.
                let replace = (committed != mutation.forward).then(|| committed.clone());
                self.ledger.borrow_mut().commit(seq, committed);
                self.update(|state| {
                    if let Some(patch) = &replace {
                        patch.apply(&mut state.items);
                        // Queued writes on the replaced item stay visible
                        self.ledger.borrow().overlay(&mut state.items);
                    }
                    state.error = None;
                });
            }
            Err(e) => {
                self.ledger.borrow_mut().abandon(seq);
                warn!("Failed to {}: {}", label, e);
                self.update(|state| {
                    mutation.inverse.apply(&mut state.items);
                    state.error = Some(e.to_string());
                });
            }
        }
        drop(turn);
    }

    fn close_signals(&self) {
        if let Some(handle) = self.signals.borrow_mut().take() {
            handle.abort();
        }
    }

    fn update(&self, f: impl FnOnce(&mut ShoppingState)) {
        let snapshot = {
            let mut state = self.state.borrow_mut();
            f(&mut state);
            state.clone()
        };
        self.listeners.emit(&snapshot);
    }
}
