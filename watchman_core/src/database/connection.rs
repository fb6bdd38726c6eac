use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::time::Duration;
use async_trait::async_trait;
use tracing::{debug, error};
use crate::config::DatabaseConfig;
use crate::error::{WatchmanError, Result};
use super::DatabaseBackend;

/// A SQLite pool behind the [`DatabaseBackend`] capability.
#[derive(Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Builds a pool without opening a connection, so an unreachable
    /// database shows up as a failed probe instead of a startup error.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .connect_lazy(&config.url)
            .map_err(|e| {
                error!("Invalid database URL {}: {}", config.url, e);
                WatchmanError::from(e)
            })?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl DatabaseBackend for SqliteDatabase {
    async fn execute(&self, sql: &str) -> Result<u64> {
        let mut connection = self.pool.acquire().await?;
        let outcome = sqlx::query(sql).execute(&mut *connection).await?;
        debug!("Executed {:?} ({} rows affected)", sql, outcome.rows_affected());
        Ok(outcome.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn config_for(url: String) -> DatabaseConfig {
        DatabaseConfig {
            url,
            max_connections: 2,
            connection_timeout_seconds: 2,
        }
    }

    #[tokio::test]
    async fn test_database_connection() {
        let temp_file = NamedTempFile::new().unwrap();
        let config = config_for(format!("sqlite:{}", temp_file.path().display()));

        let database = SqliteDatabase::connect_lazy(&config).unwrap();
        assert_eq!(database.pool().size(), 0);

        database.execute("SELECT 1").await.unwrap();
        assert!(database.pool().size() > 0);
    }

    #[tokio::test]
    async fn test_lazy_pool_reports_unreachable_database_on_use() {
        let config = config_for("sqlite:/this/path/does/not/exist/watchman.db".to_string());

        let database = SqliteDatabase::connect_lazy(&config).unwrap();
        let result = database.execute("SELECT 1").await;

        assert!(matches!(result, Err(WatchmanError::Database(_))));
    }

    #[tokio::test]
    async fn test_connection_released_after_failed_statement() {
        let mut config = config_for("sqlite::memory:".to_string());
        config.max_connections = 1;
        let database = SqliteDatabase::connect_lazy(&config).unwrap();

        assert!(database.execute("SELECT * FROM missing_table").await.is_err());
        // A leaked connection would make this acquire time out with a pool of one.
        assert!(database.execute("SELECT 1").await.is_ok());
        assert!(database.execute("SELECT 1").await.is_ok());
    }
}
