//! Sync Layer
//!
//! The shopping list synchronizer: optimistic mutations with rollback,
//! realtime-triggered refetch and connectivity tracking.

mod connectivity;
mod keyed;
mod mutation;
mod patch;
mod state;
mod synchronizer;


pub use connectivity::{ConnectivityEvent, ConnectivityObserver, ManualConnectivity};
pub use patch::Patch;
pub use state::ShoppingState;
pub use synchronizer::{items_query, ShoppingListSynchronizer, CHANNEL_NAME};
