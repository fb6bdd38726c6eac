use crate::checks::Category;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchmanConfig {
    pub server: ServerConfig,
    pub checks: ChecksConfig,
    pub caches: BTreeMap<String, CacheConfig>,
    pub databases: BTreeMap<String, DatabaseConfig>,
    pub storage: StorageConfig,
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Which probes run and how their outcome maps onto the HTTP status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecksConfig {
    pub enabled: Vec<String>,
    pub enable_paid_checks: bool,
    /// Cache names to probe. Empty means every configured cache.
    pub caches: Vec<String>,
    /// Database aliases to probe. Empty means every configured database.
    pub databases: Vec<String>,
    pub error_code: u16,
    /// Zero disables the per-probe timeout.
    pub probe_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub max_size: usize,
    pub default_ttl_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    Filesystem,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackendKind,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailBackendKind {
    Memory,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub backend: MailBackendKind,
    pub file_path: PathBuf,
    pub sender: String,
    pub recipients: Vec<String>,
    pub headers: BTreeMap<String, String>,
}

impl Default for WatchmanConfig {
    fn default() -> Self {
        let mut caches = BTreeMap::new();
        caches.insert("default".to_string(), CacheConfig::default());

        let mut databases = BTreeMap::new();
        databases.insert("default".to_string(), DatabaseConfig::default());

        Self {
            server: ServerConfig::default(),
            checks: ChecksConfig::default(),
            caches,
            databases,
            storage: StorageConfig::default(),
            email: EmailConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            enabled: Category::DEFAULTS
                .iter()
                .map(|category| category.as_str().to_string())
                .collect(),
            enable_paid_checks: false,
            caches: Vec::new(),
            databases: Vec::new(),
            error_code: 500,
            probe_timeout_seconds: 0,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            default_ttl_seconds: 300,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 5,
            connection_timeout_seconds: 30,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::Filesystem,
            path: PathBuf::from("./watchman-storage"),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            backend: MailBackendKind::Memory,
            file_path: PathBuf::from("./watchman-mail"),
            sender: "watchman@example.com".to_string(),
            recipients: vec!["to@example.com".to_string()],
            headers: BTreeMap::new(),
        }
    }
}

impl WatchmanConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&WatchmanConfig::default())?);

        if std::path::Path::new("watchman.toml").exists() {
            builder = builder.add_source(File::with_name("watchman"));
        }

        builder = builder.add_source(
            Environment::with_prefix("WATCHMAN")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("checks.enabled")
                .with_list_parse_key("checks.caches")
                .with_list_parse_key("checks.databases")
                .with_list_parse_key("email.recipients")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let watchman_config: WatchmanConfig = config.try_deserialize()?;

        watchman_config.validate()?;

        Ok(watchman_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        if !(400..=599).contains(&self.checks.error_code) {
            return Err(ConfigError::Message(format!(
                "Error code must be a 4xx or 5xx status, got {}",
                self.checks.error_code
            )));
        }

        for name in &self.checks.enabled {
            if name.parse::<Category>().is_err() {
                return Err(ConfigError::Message(format!("Unknown check: {}", name)));
            }
        }

        for (name, cache) in &self.caches {
            if cache.max_size == 0 {
                return Err(ConfigError::Message(format!(
                    "Cache '{}' max size must be greater than 0",
                    name
                )));
            }
        }

        for (alias, database) in &self.databases {
            if database.url.is_empty() {
                return Err(ConfigError::Message(format!(
                    "Database '{}' URL cannot be empty",
                    alias
                )));
            }
            if database.max_connections == 0 {
                return Err(ConfigError::Message(format!(
                    "Database '{}' max connections must be greater than 0",
                    alias
                )));
            }
        }

        if self.storage.path.as_os_str().is_empty() {
            return Err(ConfigError::Message(
                "Storage path cannot be empty".to_string(),
            ));
        }

        if self.email.sender.is_empty() {
            tracing::warn!("No email sender configured - the email check will likely fail");
        }

        Ok(())
    }

    /// Cache names to probe on this invocation, sorted and deduplicated.
    pub fn cache_names(&self) -> Vec<String> {
        if self.checks.caches.is_empty() {
            self.caches.keys().cloned().collect()
        } else {
            sorted_unique(&self.checks.caches)
        }
    }

    pub fn database_names(&self) -> Vec<String> {
        if self.checks.databases.is_empty() {
            self.databases.keys().cloned().collect()
        } else {
            sorted_unique(&self.checks.databases)
        }
    }

    /// Enabled categories in the order they were configured, paid checks last.
    pub fn enabled_categories(&self) -> Vec<Category> {
        let mut categories: Vec<Category> = Vec::new();
        for name in &self.checks.enabled {
            match name.parse::<Category>() {
                Ok(category) if !categories.contains(&category) => categories.push(category),
                Ok(_) => {}
                Err(_) => tracing::warn!("Ignoring unknown check: {}", name),
            }
        }

        if self.checks.enable_paid_checks {
            for category in Category::PAID {
                if !categories.contains(category) {
                    categories.push(*category);
                }
            }
        }

        categories
    }

    pub fn probe_timeout(&self) -> Option<Duration> {
        match self.checks.probe_timeout_seconds {
            0 => None,
            seconds => Some(Duration::from_secs(seconds)),
        }
    }

    pub fn create_directories(&self) -> Result<(), std::io::Error> {
        if self.storage.backend == StorageBackendKind::Filesystem {
            std::fs::create_dir_all(&self.storage.path)?;
        }
        if self.email.backend == MailBackendKind::File {
            std::fs::create_dir_all(&self.email.file_path)?;
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn sorted_unique(names: &[String]) -> Vec<String> {
    let mut names = names.to_vec();
    names.sort();
    names.dedup();
    names
}
