//! Dependency probes (caches, databases, email, storage) and the HTTP
//! endpoints that report on them.

pub mod cache;
pub mod checks;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod mail;
pub mod middleware;
pub mod registry;
pub mod storage;

pub use cache::{CacheBackend, CacheRegistry, MemoryCache};
pub use checks::{Backends, Category, CategoryResult, CheckResult, NamedResult, Report};
pub use config::WatchmanConfig;
pub use database::{DatabaseBackend, DatabaseRegistry, SqliteDatabase};
pub use error::{Result, WatchmanError};
pub use handlers::create_routes;
pub use mail::{EmailMessage, FileTransport, MailTransport, MemoryOutbox};
pub use registry::{CheckFilter, CheckRegistry};
pub use storage::{safe_join, FileSystemStorage, MemoryStorage, Storage};

use axum::Router;
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub version: String,
    pub registry: Arc<CheckRegistry>,
}

impl AppState {
    pub fn new(registry: Arc<CheckRegistry>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            registry,
        }
    }

    pub fn from_config(config: WatchmanConfig) -> Result<Self> {
        let backends = Backends::from_config(&config)?;
        Ok(Self::new(Arc::new(CheckRegistry::new(backends, config))))
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}

pub fn create_app(state: AppState) -> Router {
    let router = Router::new().merge(create_routes());
    middleware::logging::with_request_logging(router).with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
