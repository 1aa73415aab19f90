//! Change Feed
//!
//! Live "something changed" notifications for one collection. Payloads are
//! treated as cache invalidation signals only.

use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::channel::mpsc::UnboundedReceiver;
use futures::{Stream, StreamExt};

use super::query::Filter;
use crate::error::StoreResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 3] = [ChangeKind::Insert, ChangeKind::Update, ChangeKind::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Insert => "INSERT",
            ChangeKind::Update => "UPDATE",
            ChangeKind::Delete => "DELETE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INSERT" => Some(ChangeKind::Insert),
            "UPDATE" => Some(ChangeKind::Update),
            "DELETE" => Some(ChangeKind::Delete),
            _ => None,
        }
    }
}

/// What to listen to
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSpec {
    pub name: String,
    pub table: String,
    pub filter: Filter,
    pub events: Vec<ChangeKind>,
}

/// One server-side write matched the channel
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeNotice {
    pub table: String,
    pub kind: Option<ChangeKind>,
}

/// An open channel; dropping it closes the channel
pub struct Subscription {
    notices: UnboundedReceiver<ChangeNotice>,
    on_close: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(notices: UnboundedReceiver<ChangeNotice>, on_close: impl FnOnce() + 'static) -> Self {
        Self {
            notices,
            on_close: Some(Box::new(on_close)),
        }
    }
}

impl Stream for Subscription {
    type Item = ChangeNotice;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<ChangeNotice>> {
        self.notices.poll_next_unpin(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(close) = self.on_close.take() {
            close();
        }
    }
}

/// Opens change subscriptions
#[async_trait(?Send)]
pub trait ChangeFeed {
    async fn subscribe(&self, channel: &ChannelSpec) -> StoreResult<Subscription>;
}
