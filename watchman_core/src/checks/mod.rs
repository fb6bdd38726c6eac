//! Probe execution and result aggregation

pub mod guard;
pub mod probes;
pub mod result;


pub use guard::{guard, guard_with_timeout};
pub use probes::{
    build_test_message, caches, check_cache, check_caches, check_database, check_databases,
    check_email, check_storage_file, databases, email, storage, STORAGE_TEST_CONTENT,
};
pub use result::{Category, CategoryResult, CheckResult, NamedResult, Report};

use crate::cache::{CacheRegistry, MemoryCache};
use crate::config::{MailBackendKind, StorageBackendKind, WatchmanConfig};
use crate::database::{DatabaseRegistry, SqliteDatabase};
use crate::error::Result;
use crate::mail::{FileTransport, MailTransport, MemoryOutbox};
use crate::storage::{FileSystemStorage, MemoryStorage, Storage};
use std::sync::Arc;
use tracing::info;

/// Handles to every dependency the probes can reach.
#[derive(Clone)]
pub struct Backends {
    pub caches: CacheRegistry,
    pub databases: DatabaseRegistry,
    pub mailer: Arc<dyn MailTransport>,
    pub storage: Arc<dyn Storage>,
}

impl Default for Backends {
    fn default() -> Self {
        Self {
            caches: CacheRegistry::new(),
            databases: DatabaseRegistry::new(),
            mailer: Arc::new(MemoryOutbox::new()),
            storage: Arc::new(MemoryStorage::new()),
        }
    }
}

impl Backends {
    pub fn from_config(config: &WatchmanConfig) -> Result<Self> {
        let mut caches = CacheRegistry::new();
        for (name, cache_config) in &config.caches {
            caches.insert(name.clone(), Arc::new(MemoryCache::new(cache_config.clone())));
        }

        let mut databases = DatabaseRegistry::new();
        for (alias, database_config) in &config.databases {
            databases.insert(alias.clone(), Arc::new(SqliteDatabase::connect_lazy(database_config)?));
        }

        let mailer: Arc<dyn MailTransport> = match config.email.backend {
            MailBackendKind::Memory => Arc::new(MemoryOutbox::new()),
            MailBackendKind::File => Arc::new(FileTransport::new(config.email.file_path.clone())),
        };

        let storage: Arc<dyn Storage> = match config.storage.backend {
            StorageBackendKind::Filesystem => Arc::new(FileSystemStorage::new()),
            StorageBackendKind::Memory => Arc::new(MemoryStorage::new()),
        };

        info!(
            "Initialized backends: caches {:?}, databases {:?}, {:?} storage, {:?} mail",
            caches.names().collect::<Vec<_>>(),
            databases.aliases().collect::<Vec<_>>(),
            config.storage.backend,
            config.email.backend
        );

        Ok(Self {
            caches,
            databases,
            mailer,
            storage,
        })
    }

    pub fn with_caches(mut self, caches: CacheRegistry) -> Self {
        self.caches = caches;
        self
    }

    pub fn with_databases(mut self, databases: DatabaseRegistry) -> Self {
        self.databases = databases;
        self
    }

    pub fn with_mailer<M: MailTransport + 'static>(mut self, mailer: M) -> Self {
        self.mailer = Arc::new(mailer);
        self
    }

    pub fn with_storage<S: Storage + 'static>(mut self, storage: S) -> Self {
        self.storage = Arc::new(storage);
        self
    }
}
