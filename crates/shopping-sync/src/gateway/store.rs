//! Remote Store Trait
//!
//! Defines the abstract interface of the hosted relational store.
//! Implementations: PostgREST over HTTP (UI crate), in-memory (`MemoryStore`).

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::query::{Mutation, Select};
use crate::error::StoreResult;

/// Query and mutation access to named collections
///
/// Futures are not `Send`: the client runs on a single-threaded event loop.
#[async_trait(?Send)]
pub trait RemoteStore {
    /// Run a read; single-row queries yield exactly one element
    async fn select(&self, query: &Select) -> StoreResult<Vec<Value>>;

    /// Run a write and return the affected rows as the store reports them
    async fn execute(&self, mutation: &Mutation) -> StoreResult<Vec<Value>>;
}

/// Decode raw rows into entities
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> StoreResult<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(Into::into))
        .collect()
}

/// Run a read and decode the result
pub async fn select_as<T: DeserializeOwned>(
    store: &dyn RemoteStore,
    query: &Select,
) -> StoreResult<Vec<T>> {
    decode_rows(store.select(query).await?)
}
