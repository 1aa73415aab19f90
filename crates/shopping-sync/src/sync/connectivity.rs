//! Connectivity
//!
//! The host tells the synchronizer when the device goes online or offline.

use std::cell::{Cell, RefCell};

use futures::channel::mpsc::{self, UnboundedSender};
use futures::stream::{LocalBoxStream, StreamExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    Online,
    Offline,
}

pub trait ConnectivityObserver {
    /// Current connectivity as reported by the host
    fn is_online(&self) -> bool;

    /// Transitions from now on; the stream ends when the observer goes away
    fn watch(&self) -> LocalBoxStream<'static, ConnectivityEvent>;
}

/// Observer driven by hand, for hosts without a connectivity signal and for tests
pub struct ManualConnectivity {
    online: Cell<bool>,
    watchers: RefCell<Vec<UnboundedSender<ConnectivityEvent>>>,
}

impl ManualConnectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: Cell::new(online),
            watchers: RefCell::new(Vec::new()),
        }
    }

    /// Report a connectivity change; repeating the current value is ignored
    pub fn set_online(&self, online: bool) {
        if self.online.replace(online) == online {
            return;
        }
        let event = if online {
            ConnectivityEvent::Online
        } else {
            ConnectivityEvent::Offline
        };
        self.watchers
            .borrow_mut()
            .retain(|tx| tx.unbounded_send(event).is_ok());
    }

    pub fn watcher_count(&self) -> usize {
        let mut watchers = self.watchers.borrow_mut();
        watchers.retain(|tx| !tx.is_closed());
        watchers.len()
    }
}

impl Default for ManualConnectivity {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivityObserver for ManualConnectivity {
    fn is_online(&self) -> bool {
        self.online.get()
    }

    fn watch(&self) -> LocalBoxStream<'static, ConnectivityEvent> {
        let (tx, rx) = mpsc::unbounded();
        self.watchers.borrow_mut().push(tx);
        rx.boxed_local()
    }
}
