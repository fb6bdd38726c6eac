//! Database connections the database probe can exercise

pub mod connection;

pub use connection::SqliteDatabase;

use crate::error::{Result, WatchmanError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

#[async_trait]
pub trait DatabaseBackend: Send + Sync {
    /// Runs `sql` on a connection acquired for this call only. The connection
    /// goes back to its pool whether the statement succeeds or fails.
    async fn execute(&self, sql: &str) -> Result<u64>;
}

/// Database handles addressed by their configured alias.
#[derive(Clone, Default)]
pub struct DatabaseRegistry {
    databases: BTreeMap<String, Arc<dyn DatabaseBackend>>,
}

impl DatabaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database<D: DatabaseBackend + 'static>(mut self, alias: impl Into<String>, database: D) -> Self {
        self.insert(alias, Arc::new(database));
        self
    }

    pub fn insert(&mut self, alias: impl Into<String>, database: Arc<dyn DatabaseBackend>) {
        self.databases.insert(alias.into(), database);
    }

    pub fn get(&self, alias: &str) -> Result<Arc<dyn DatabaseBackend>> {
        self.databases
            .get(alias)
            .cloned()
            .ok_or_else(|| WatchmanError::UnknownDatabase(alias.to_string()))
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.databases.keys().map(String::as_str)
    }
}
