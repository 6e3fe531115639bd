//! Persisted session state.
//!
//! The kiosk keeps four small string values between page loads (access
//! credential, selected building, workshop-day preference, kiosk flag).
//! Components receive a shared [`SessionStore`] instead of reaching for a
//! global.

mod file;
mod memory;

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

pub use file::{FileStore, default_store_path};
pub use memory::MemoryStore;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt store: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Key/value storage for session state.
pub trait SessionStore: Send + Sync {
    /// Read a value; `Ok(None)` when the key is unset.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Insert or overwrite a value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a value. Removing an unset key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Shared handle passed to every component.
pub type SharedStore = Arc<dyn SessionStore>;

/// Read a value, treating storage failures as "unset".
pub fn read_or_none(store: &dyn SessionStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            debug!(key, "storage read failed: {e}");
            None
        }
    }
}

/// Write a value, ignoring storage failures.
pub fn write_best_effort(store: &dyn SessionStore, key: &str, value: &str) {
    if let Err(e) = store.set(key, value) {
        debug!(key, "storage write failed: {e}");
    }
}

/// Remove a value, ignoring storage failures.
pub fn remove_best_effort(store: &dyn SessionStore, key: &str) {
    if let Err(e) = store.remove(key) {
        debug!(key, "storage remove failed: {e}");
    }
}
