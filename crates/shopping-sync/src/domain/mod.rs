//! Domain Layer
//!
//! Entities of the household shopping list as stored by the remote backend.
//! This layer only depends on serde, chrono and uuid.

mod category;
mod family;
mod item;
mod member;

pub use category::Category;
pub use family::Family;
pub use item::{
    NewShoppingItem, ShoppingItem, ShoppingItemWithRelations, ShoppingStats, PROVISIONAL_PREFIX,
};
pub use member::{Member, MemberRole};
