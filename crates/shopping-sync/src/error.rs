//! Error Types
//!
//! Gateway failures carry a human-readable message that ends up in the
//! synchronizer's error banner verbatim.

use thiserror::Error;

/// Failure reported by a remote store call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store answered with a structured error
    #[error("{message}")]
    Request {
        code: Option<String>,
        message: String,
    },
    /// The request never reached the store
    #[error("{0}")]
    Network(String),
    /// The store answered with something we could not decode
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn request(message: impl Into<String>) -> Self {
        StoreError::Request {
            code: None,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the session and sync layers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("No family found")]
    NoFamily,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type SyncResult<T> = Result<T, SyncError>;
