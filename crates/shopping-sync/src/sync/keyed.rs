//! Per-key ordering of remote writes.
//!
//! Writes touching the same item reach the store in the order they were
//! issued. Writes on unrelated items do not wait for each other.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use futures::channel::oneshot;
use futures::future::{join_all, LocalBoxFuture, Shared};
use futures::FutureExt;

type Done = Shared<LocalBoxFuture<'static, ()>>;

pub(crate) struct KeyedTurns {
    next_seq: Cell<u64>,
    tails: RefCell<HashMap<String, (u64, Done)>>,
}

/// A place in line for a set of keys; releases them on drop
pub(crate) struct Turn<'a> {
    turns: &'a KeyedTurns,
    seq: u64,
    keys: Vec<String>,
    predecessors: Vec<Done>,
    _done: oneshot::Sender<()>,
}

impl KeyedTurns {
    pub(crate) fn new() -> Self {
        Self {
            next_seq: Cell::new(0),
            tails: RefCell::new(HashMap::new()),
        }
    }

    /// Queue behind every earlier turn that shares a key. Registration is
    /// immediate, so call order decides the order of the line.
    pub(crate) fn enter(&self, keys: &[String]) -> Turn<'_> {
        let seq = self.next_seq.get() + 1;
        self.next_seq.set(seq);

        let mut keys = keys.to_vec();
        keys.sort();
        keys.dedup();

        let (tx, rx) = oneshot::channel::<()>();
        let done: Done = rx.map(|_| ()).boxed_local().shared();

        let mut predecessors = Vec::new();
        let mut tails = self.tails.borrow_mut();
        for key in &keys {
            if let Some((_, previous)) = tails.insert(key.clone(), (seq, done.clone())) {
                predecessors.push(previous);
            }
        }

        Turn {
            turns: self,
            seq,
            keys,
            predecessors,
            _done: tx,
        }
    }

    #[cfg(test)]
    fn queued_keys(&self) -> usize {
        self.tails.borrow().len()
    }
}

impl Turn<'_> {
    /// Wait until every earlier turn on the same keys has been released
    pub(crate) async fn ready(&mut self) {
        let predecessors = std::mem::take(&mut self.predecessors);
        join_all(predecessors).await;
    }
}

impl Drop for Turn<'_> {
    fn drop(&mut self) {
        let mut tails = self.turns.tails.borrow_mut();
        for key in &self.keys {
            if tails.get(key).is_some_and(|(seq, _)| *seq == self.seq) {
                tails.remove(key);
            }
        }
    }
}
