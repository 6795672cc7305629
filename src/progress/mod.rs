//! Persisted learner progress.
//!
//! A [`ProgressStore`] is a small key-value capability (get/set/remove of JSON
//! text). [`Persisted`] layers a typed record with a default value on top of
//! it, and refuses to write until the first read has completed so the
//! in-memory default never clobbers stored data.

pub mod records;
pub mod store;

pub use records::{MasteredRecord, SavedProgress};
pub use store::{MemoryStore, SqliteStore};

use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

use crate::db::LogOnError;

/// Durable key-value storage for one learner.
pub trait ProgressStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Storage backend failure.
#[derive(Debug)]
pub enum StoreError {
    Unavailable,
    Backend(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Unavailable => write!(f, "Progress store unavailable"),
            StoreError::Backend(e) => write!(f, "Progress store error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

/// A typed JSON record stored under a fixed key.
pub struct Persisted<T> {
    store: Arc<dyn ProgressStore>,
    key: &'static str,
    default: T,
    value: T,
    loaded: bool,
}

impl<T> Persisted<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    pub fn new(store: Arc<dyn ProgressStore>, key: &'static str, default: T) -> Self {
        Self {
            store,
            key,
            value: default.clone(),
            default,
            loaded: false,
        }
    }

    /// Read the stored value (or the default) and open the record for writes.
    pub fn read(&mut self) -> &T {
        let stored = self
            .store
            .get(self.key)
            .log_warn(&format!("Failed to read {}", self.key))
            .flatten();

        self.value = match stored {
            Some(text) => serde_json::from_str(&text)
                .log_warn(&format!("Discarding malformed {}", self.key))
                .unwrap_or_else(|| self.default.clone()),
            None => self.default.clone(),
        };
        self.loaded = true;
        &self.value
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Replace the value; persisted only once [`Persisted::read`] has run.
    pub fn write(&mut self, value: T) {
        self.value = value;
        if !self.loaded {
            return;
        }
        match serde_json::to_string(&self.value) {
            Ok(text) => {
                self.store
                    .set(self.key, &text)
                    .log_warn(&format!("Failed to write {}", self.key));
            }
            Err(e) => tracing::warn!("Failed to serialize {}: {}", self.key, e),
        }
    }

    /// Modify the value in place and write it back.
    pub fn update(&mut self, f: impl FnOnce(&mut T)) {
        let mut value = self.value.clone();
        f(&mut value);
        self.write(value);
    }

    /// Reset to the default and delete the stored record.
    pub fn clear(&mut self) {
        self.value = self.default.clone();
        self.store
            .remove(self.key)
            .log_warn(&format!("Failed to clear {}", self.key));
    }
}
