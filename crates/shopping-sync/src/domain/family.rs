//! Family Entity
//!
//! The household that owns every other row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A household; exactly one is resolved per running client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Family {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Family {
    pub const TABLE: &'static str = "family";
}
