//! Synchronous key-value persistence, the browser-local storage analogue.
//!
//! No transactionality is assumed across keys. Callers that need isolation
//! between scopes (for example one key per identity) own that discipline.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::{DEFAULT_BUSY_TIMEOUT, SqliteStore};

use thiserror::Error;

use crate::error::ErrorCode;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite key-value store: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("store i/o at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("encode value for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Sqlite(_) | Self::Io { .. } => ErrorCode::StorageUnavailable,
            Self::Encode { .. } => ErrorCode::InternalUnexpected,
        }
    }
}

/// String-keyed, string-valued storage.
pub trait KeyValueStore {
    /// Read the value under `key`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`. Deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<K: KeyValueStore + ?Sized> KeyValueStore for std::rc::Rc<K> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}
