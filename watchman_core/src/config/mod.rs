pub mod settings;

pub use settings::{
    CacheConfig, ChecksConfig, DatabaseConfig, EmailConfig, MailBackendKind, ServerConfig,
    StorageBackendKind, StorageConfig, WatchmanConfig,
};
