//! In-Memory Store
//!
//! `RemoteStore` + `ChangeFeed` over JSON rows held in memory. Serves as the
//! demo backend when no remote is configured and as the test double for the
//! synchronizer: it journals every call and can be told to fail.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::channel::mpsc::{self, UnboundedSender};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::feed::{ChangeFeed, ChangeKind, ChangeNotice, ChannelSpec, Subscription};
use super::query::{Mutation, Order, Select};
use super::store::RemoteStore;
use crate::error::{StoreError, StoreResult};

/// Store call categories, used for fault injection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
    Subscribe,
}

struct Subscriber {
    id: u64,
    channel: ChannelSpec,
    sender: UnboundedSender<ChangeNotice>,
}

type Subscribers = Rc<RefCell<Vec<Subscriber>>>;

pub struct MemoryStore {
    tables: RefCell<BTreeMap<String, Vec<Value>>>,
    selects: RefCell<Vec<Select>>,
    journal: RefCell<Vec<Mutation>>,
    faults: RefCell<VecDeque<(Operation, StoreError)>>,
    offline: Cell<bool>,
    notify_on_write: Cell<bool>,
    subscribers: Subscribers,
    next_subscriber: Cell<u64>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RefCell::new(BTreeMap::new()),
            selects: RefCell::new(Vec::new()),
            journal: RefCell::new(Vec::new()),
            faults: RefCell::new(VecDeque::new()),
            offline: Cell::new(false),
            notify_on_write: Cell::new(true),
            subscribers: Rc::new(RefCell::new(Vec::new())),
            next_subscriber: Cell::new(0),
        }
    }

    /// Insert rows as-is, without notifying subscribers
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Value>) {
        self.tables
            .borrow_mut()
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables.borrow().get(table).cloned().unwrap_or_default()
    }

    /// Make the next call of the given kind fail with `message`
    pub fn fail_next(&self, operation: Operation, message: &str) {
        self.faults
            .borrow_mut()
            .push_back((operation, StoreError::request(message)));
    }

    /// While offline every call fails with a network error
    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    /// Whether successful writes push notices to matching subscribers
    pub fn set_notify_on_write(&self, notify: bool) {
        self.notify_on_write.set(notify);
    }

    /// Every mutation attempted so far, failed ones included
    pub fn journal(&self) -> Vec<Mutation> {
        self.journal.borrow().clone()
    }

    /// Number of reads issued against a table
    pub fn select_count(&self, table: &str) -> usize {
        self.selects.borrow().iter().filter(|q| q.table == table).count()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    /// End every open subscription, as a dropped realtime connection would
    pub fn drop_subscriptions(&self) {
        self.subscribers.borrow_mut().clear();
    }

    /// Push a notice for `row` to every matching subscriber
    pub fn emit(&self, table: &str, kind: ChangeKind, row: &Value) {
        let mut subscribers = self.subscribers.borrow_mut();
        subscribers.retain(|sub| !sub.sender.is_closed());
        for sub in subscribers.iter() {
            let channel = &sub.channel;
            if channel.table == table && channel.events.contains(&kind) && channel.filter.matches(row) {
                let _ = sub.sender.unbounded_send(ChangeNotice {
                    table: table.to_string(),
                    kind: Some(kind),
                });
            }
        }
    }

    fn check(&self, operation: Operation) -> StoreResult<()> {
        if self.offline.get() {
            return Err(StoreError::Network("Failed to fetch".to_string()));
        }
        let mut faults = self.faults.borrow_mut();
        if let Some(pos) = faults.iter().position(|(op, _)| *op == operation) {
            if let Some((_, err)) = faults.remove(pos) {
                return Err(err);
            }
        }
        Ok(())
    }

    fn run_select(&self, query: &Select) -> StoreResult<Vec<Value>> {
        let tables = self.tables.borrow();
        let mut rows: Vec<Value> = tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.filters.iter().all(|f| f.matches(row)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        rows.sort_by(|a, b| compare_rows(a, b, &query.order));

        for row in rows.iter_mut() {
            for relation in &query.relations {
                let key = row.get(&relation.foreign_key).cloned().unwrap_or(Value::Null);
                let related = if key.is_null() {
                    Value::Null
                } else {
                    tables
                        .get(&relation.table)
                        .and_then(|rows| rows.iter().find(|r| r.get("id") == Some(&key)))
                        .cloned()
                        .unwrap_or(Value::Null)
                };
                if let Some(obj) = row.as_object_mut() {
                    obj.insert(relation.alias.clone(), related);
                }
            }
        }

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        if query.single && rows.len() != 1 {
            return Err(StoreError::Request {
                code: Some("PGRST116".to_string()),
                message: "JSON object requested, multiple (or no) rows returned".to_string(),
            });
        }
        Ok(rows)
    }

    fn apply(&self, mutation: &Mutation) -> StoreResult<Vec<Value>> {
        let mut tables = self.tables.borrow_mut();
        let rows = tables.entry(mutation.table().to_string()).or_default();

        let affected = match mutation {
            Mutation::Insert { row, .. } => {
                let mut obj: Map<String, Value> = row
                    .as_object()
                    .cloned()
                    .ok_or_else(|| StoreError::request("insert payload must be an object"))?;
                obj.entry("id")
                    .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
                obj.entry("created_at")
                    .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
                let row = Value::Object(obj);
                rows.push(row.clone());
                vec![row]
            }
            Mutation::Update { filter, patch, .. } => {
                let fields = patch
                    .as_object()
                    .ok_or_else(|| StoreError::request("update payload must be an object"))?;
                let mut updated = Vec::new();
                for row in rows.iter_mut().filter(|row| filter.matches(row)) {
                    if let Some(obj) = row.as_object_mut() {
                        for (key, value) in fields {
                            obj.insert(key.clone(), value.clone());
                        }
                    }
                    updated.push(row.clone());
                }
                updated
            }
            Mutation::Delete { filter, .. } => {
                let (deleted, kept): (Vec<Value>, Vec<Value>) =
                    rows.drain(..).partition(|row| filter.matches(row));
                *rows = kept;
                deleted
            }
        };
        Ok(affected)
    }
}

#[async_trait(?Send)]
impl RemoteStore for MemoryStore {
    async fn select(&self, query: &Select) -> StoreResult<Vec<Value>> {
        self.selects.borrow_mut().push(query.clone());
        self.check(Operation::Select)?;
        self.run_select(query)
    }

    async fn execute(&self, mutation: &Mutation) -> StoreResult<Vec<Value>> {
        self.journal.borrow_mut().push(mutation.clone());
        let operation = match mutation {
            Mutation::Insert { .. } => Operation::Insert,
            Mutation::Update { .. } => Operation::Update,
            Mutation::Delete { .. } => Operation::Delete,
        };
        self.check(operation)?;

        let affected = self.apply(mutation)?;
        if self.notify_on_write.get() {
            for row in &affected {
                self.emit(mutation.table(), mutation.kind(), row);
            }
        }
        Ok(affected)
    }
}

#[async_trait(?Send)]
impl ChangeFeed for MemoryStore {
    async fn subscribe(&self, channel: &ChannelSpec) -> StoreResult<Subscription> {
        self.check(Operation::Subscribe)?;

        let id = self.next_subscriber.get();
        self.next_subscriber.set(id + 1);
        let (sender, notices) = mpsc::unbounded();
        self.subscribers.borrow_mut().push(Subscriber {
            id,
            channel: channel.clone(),
            sender,
        });

        let subscribers = Rc::clone(&self.subscribers);
        Ok(Subscription::new(notices, move || {
            subscribers.borrow_mut().retain(|sub| sub.id != id);
        }))
    }
}

fn compare_rows(a: &Value, b: &Value, order: &[Order]) -> Ordering {
    for o in order {
        let left = a.get(&o.column).unwrap_or(&Value::Null);
        let right = b.get(&o.column).unwrap_or(&Value::Null);
        // Nulls sort last ascending and first descending, as in Postgres
        let ord = match (left.is_null(), right.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => compare_values(left, right),
        };
        let ord = if o.ascending { ord } else { ord.reverse() };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or_default(), y.as_f64().unwrap_or_default());
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => {
            match (x.parse::<DateTime<Utc>>(), y.parse::<DateTime<Utc>>()) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        _ => Ordering::Equal,
    }
}
