//! Error types shared by probes, backends and the HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WatchmanError>;

#[derive(Error, Debug)]
pub enum WatchmanError {
    #[error("Unknown cache: {0}")]
    UnknownCache(String),

    #[error("Unknown database: {0}")]
    UnknownDatabase(String),

    #[error("Attempted path traversal detected: {}", path.display())]
    TraversalRejected { path: PathBuf },

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Mail error: {0}")]
    Mail(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Check timed out after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WatchmanError {
    pub fn is_traversal(&self) -> bool {
        matches!(self, WatchmanError::TraversalRejected { .. })
    }
}

impl IntoResponse for WatchmanError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            WatchmanError::TraversalRejected { .. } => {
                tracing::error!("{}", self);
                (StatusCode::BAD_REQUEST, "Suspicious file operation".to_string())
            }
            WatchmanError::Config(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Configuration error".to_string())
            }
            other => {
                tracing::error!("Unexpected error: {:?}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for WatchmanError {
    fn from(err: sqlx::Error) -> Self {
        WatchmanError::Database(err.to_string())
    }
}

impl From<config::ConfigError> for WatchmanError {
    fn from(err: config::ConfigError) -> Self {
        WatchmanError::Config(err.to_string())
    }
}
