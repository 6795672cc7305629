//! [`ProgressStore`] backends.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{ProgressStore, StoreError};
use crate::db::{self, try_lock, DbPool};

/// SQLite-backed store scoped to one learner.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
    scope: String,
}

impl SqliteStore {
    pub fn new(pool: DbPool, scope: impl Into<String>) -> Self {
        Self {
            pool,
            scope: scope.into(),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }
}

impl ProgressStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = try_lock(&self.pool).map_err(|_| StoreError::Unavailable)?;
        Ok(db::get_record(&conn, &self.scope, key)?)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = try_lock(&self.pool).map_err(|_| StoreError::Unavailable)?;
        Ok(db::set_record(&conn, &self.scope, key, value)?)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let conn = try_lock(&self.pool).map_err(|_| StoreError::Unavailable)?;
        Ok(db::delete_record(&conn, &self.scope, key)?)
    }
}

/// Process-local store; nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.lock().map_err(|_| StoreError::Unavailable)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Unavailable)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Unavailable)?;
        values.remove(key);
        Ok(())
    }
}
