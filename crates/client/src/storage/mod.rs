//! Durable key-value storage for client state.
//!
//! The client persists two documents: the cart (`cartItems`) and the auth
//! tokens (`tokens`). Both are stored as JSON strings under fixed keys,
//! mirroring browser local storage.
//!
//! # Backends
//!
//! - [`FileStore`] - one JSON file per key inside a state directory
//! - [`MemoryStore`] - process-local map, used by tests and ephemeral sessions

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Fixed storage keys.
pub mod keys {
    /// Serialized product id to quantity map.
    pub const CART_ITEMS: &str = "cartItems";
    /// Serialized access/refresh token pair.
    pub const TOKENS: &str = "tokens";
}

/// Errors that can occur when reading or writing durable storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("storage I/O error for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// A stored document could not be parsed.
    #[error("corrupt value for key '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be serialized.
    #[error("failed to serialize value: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The key contains characters that cannot be used as a storage name.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// Synchronous string key-value storage.
///
/// Implementations must be safe to share between tasks; every call is a
/// complete read or write of one key.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read and parse the JSON document stored under `key`.
///
/// # Errors
///
/// Returns [`StorageError::Corrupt`] if the stored text is not valid JSON for `T`.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StorageError::Corrupt {
            key: key.to_string(),
            source,
        })
}

/// Serialize `value` as JSON and store it under `key`.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}
