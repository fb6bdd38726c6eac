//! Report, bare status and ping endpoints

use crate::{checks::Report, registry::CheckFilter, AppState};
use axum::{
    extract::{Query, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, warn};

pub const VERSION_HEADER: HeaderName = HeaderName::from_static("x-watchman-version");

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/watchman", get(handle_status))
        .route("/watchman/bare", get(handle_bare_status))
        .route("/ping", get(handle_ping))
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckQuery {
    pub check: Option<String>,
    pub skip: Option<String>,
}

impl CheckQuery {
    fn filter(&self) -> CheckFilter {
        CheckFilter::parse(self.check.as_deref(), self.skip.as_deref())
    }
}

fn status_for(state: &AppState, report: &Report) -> StatusCode {
    if report.has_errors() {
        let code = state.registry.config().checks.error_code;
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    } else {
        StatusCode::OK
    }
}

fn with_version(state: &AppState, mut response: Response) -> Response {
    if let Ok(version) = HeaderValue::from_str(&state.version) {
        response.headers_mut().insert(VERSION_HEADER, version);
    }
    response
}

pub async fn handle_status(
    State(state): State<AppState>,
    Query(query): Query<CheckQuery>,
) -> Response {
    info!("GET /watchman - check: {:?}, skip: {:?}", query.check, query.skip);

    let report = state.registry.run(&query.filter()).await;
    let status_code = status_for(&state, &report);
    if status_code != StatusCode::OK {
        warn!("Reporting failed checks with status {}", status_code);
    }

    with_version(&state, (status_code, Json(report)).into_response())
}

pub async fn handle_bare_status(
    State(state): State<AppState>,
    Query(query): Query<CheckQuery>,
) -> Response {
    info!("GET /watchman/bare");

    let report = state.registry.run(&query.filter()).await;
    let status_code = status_for(&state, &report);

    with_version(&state, status_code.into_response())
}

pub async fn handle_ping() -> &'static str {
    "pong"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cache::{CacheRegistry, MemoryCache},
        checks::Backends,
        config::WatchmanConfig,
        registry::CheckRegistry,
        storage::MemoryStorage,
    };
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(config: WatchmanConfig) -> Router {
        let backends = Backends::default()
            .with_caches(CacheRegistry::new().with_cache("default", MemoryCache::default()))
            .with_storage(MemoryStorage::new());
        let state = AppState::new(Arc::new(CheckRegistry::new(backends, config)));
        create_routes().with_state(state)
    }

    fn caches_and_storage() -> WatchmanConfig {
        let mut config = WatchmanConfig::default();
        config.checks.enabled = vec!["caches".to_string(), "storage".to_string()];
        config.storage.path = "/data/watchman".into();
        config
    }

    async fn send_get(app: Router, uri: &str) -> (StatusCode, Response) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        (response.status(), response)
    }

    #[tokio::test]
    async fn test_status_all_ok() {
        let (status, response) = send_get(app(caches_and_storage()), "/watchman").await;
        assert_eq!(status, StatusCode::OK);
        assert!(response.headers().contains_key(VERSION_HEADER));

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["caches"], serde_json::json!([{"default": {"ok": true}}]));
        assert_eq!(json["storage"], serde_json::json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_status_with_error_uses_error_code() {
        let mut config = caches_and_storage();
        config.checks.caches = vec!["default".to_string(), "missing".to_string()];

        let (status, response) = send_get(app(config.clone()), "/watchman").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["caches"][0], serde_json::json!({"default": {"ok": true}}));
        assert!(json["caches"][1]["missing"]["error"].is_string());

        config.checks.error_code = 503;
        let (status, _) = send_get(app(config), "/watchman").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_status_check_and_skip_filters() {
        let (_, response) = send_get(app(caches_and_storage()), "/watchman?check=storage").await;
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json.get("caches").is_none());
        assert!(json.get("storage").is_some());

        let (_, response) = send_get(app(caches_and_storage()), "/watchman?skip=storage").await;
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json.get("caches").is_some());
        assert!(json.get("storage").is_none());
    }

    #[tokio::test]
    async fn test_status_check_with_unknown_name_runs_nothing() {
        let (status, response) = send_get(app(caches_and_storage()), "/watchman?check=queues").await;
        assert_eq!(status, StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_bare_status_has_empty_body() {
        let (status, response) = send_get(app(caches_and_storage()), "/watchman/bare").await;
        assert_eq!(status, StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());

        let mut config = caches_and_storage();
        config.checks.caches = vec!["missing".to_string()];
        let (status, _) = send_get(app(config), "/watchman/bare").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_ping() {
        let (status, response) = send_get(app(caches_and_storage()), "/ping").await;
        assert_eq!(status, StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"pong");
    }
}
