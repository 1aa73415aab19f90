//! Shopping Sync Core
//!
//! Layered architecture:
//! - domain: Entities of the household shopping list
//! - gateway: Remote store abstraction, query model and wire helpers
//! - session: Family, identity and category resolution
//! - sync: The optimistic shopping list synchronizer

pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
mod listeners;
pub mod session;
pub mod sync;

pub use config::RemoteConfig;
pub use error::{StoreError, StoreResult, SyncError, SyncResult};
pub use sync::{ShoppingListSynchronizer, ShoppingState};
