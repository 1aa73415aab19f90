//! Gateway Layer
//!
//! Abstract interfaces for the hosted store plus the pieces shared by every
//! binding: the query model, PostgREST rendering, realtime frames and an
//! in-memory implementation.

mod feed;
mod memory;
pub mod postgrest;
mod query;
pub mod realtime;
mod store;

pub use feed::{ChangeFeed, ChangeKind, ChangeNotice, ChannelSpec, Subscription};
pub use memory::{MemoryStore, Operation};
pub use query::{Filter, Mutation, Order, Relation, Select};
pub use store::{decode_rows, select_as, RemoteStore};
