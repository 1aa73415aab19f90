//! Session Layer
//!
//! Everything resolved once per family: the family itself, the acting
//! member and the category directory.

mod categories;
mod family;
mod identity;

pub use categories::{CategoryDirectory, CategoryState};
pub use family::{lookup_family, FamilyResolver, FamilyState};
pub use identity::first_family_member;
