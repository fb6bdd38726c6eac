use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use tempfile::{NamedTempFile, TempDir};
use tower::ServiceExt;
use watchman_core::{
    config::{DatabaseConfig, MailBackendKind, StorageBackendKind},
    create_app, AppState, Backends, Category, CategoryResult, CheckRegistry, CheckResult,
    WatchmanConfig,
};

struct Fixture {
    config: WatchmanConfig,
    _database: NamedTempFile,
    storage_dir: TempDir,
    mail_dir: TempDir,
}

fn setup_fixture() -> Fixture {
    let database = NamedTempFile::new().unwrap();
    let storage_dir = TempDir::new().unwrap();
    let mail_dir = TempDir::new().unwrap();

    let mut config = WatchmanConfig::default();
    config.databases.insert(
        "default".to_string(),
        DatabaseConfig {
            url: format!("sqlite:{}", database.path().display()),
            ..DatabaseConfig::default()
        },
    );
    config.storage.backend = StorageBackendKind::Filesystem;
    config.storage.path = storage_dir.path().to_path_buf();
    config.email.backend = MailBackendKind::File;
    config.email.file_path = mail_dir.path().to_path_buf();
    config.checks.enable_paid_checks = true;

    Fixture {
        config,
        _database: database,
        storage_dir,
        mail_dir,
    }
}

#[tokio::test]
async fn test_full_report_all_ok() {
    let fixture = setup_fixture();
    let backends = Backends::from_config(&fixture.config).unwrap();
    let registry = CheckRegistry::new(backends, fixture.config.clone());

    let report = registry.run_all().await;

    assert!(!report.has_errors(), "unexpected failures: {:?}", report);
    assert_eq!(
        report.categories().collect::<Vec<_>>(),
        vec!["caches", "databases", "email", "storage"]
    );
    assert_eq!(
        report.get(Category::Databases),
        Some(&CategoryResult::instances(vec![watchman_core::NamedResult::new(
            "default",
            CheckResult::Ok
        )]))
    );

    assert_eq!(std::fs::read_dir(fixture.storage_dir.path()).unwrap().count(), 0);
    assert_eq!(std::fs::read_dir(fixture.mail_dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn test_unreachable_database_does_not_hide_other_checks() {
    let mut fixture = setup_fixture();
    fixture.config.databases.insert(
        "reporting".to_string(),
        DatabaseConfig {
            url: "sqlite:/this/path/does/not/exist/reporting.db".to_string(),
            connection_timeout_seconds: 2,
            ..DatabaseConfig::default()
        },
    );

    let backends = Backends::from_config(&fixture.config).unwrap();
    let registry = CheckRegistry::new(backends, fixture.config.clone());
    let report = registry.run_all().await;

    assert!(report.has_errors());

    let databases = report.get(Category::Databases).unwrap();
    assert_eq!(databases.get("default"), Some(&CheckResult::Ok));
    assert!(databases.get("reporting").unwrap().error_message().is_some());

    assert!(!report.get(Category::Caches).unwrap().has_errors());
    assert!(!report.get(Category::Storage).unwrap().has_errors());
    assert!(!report.get(Category::Email).unwrap().has_errors());
}

#[tokio::test]
async fn test_http_report_shape() {
    let fixture = setup_fixture();
    let state = AppState::from_config(fixture.config.clone()).unwrap();
    let app = create_app(state);

    let request = Request::builder()
        .uri("/watchman?skip=email")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(
        json,
        serde_json::json!({
            "caches": [{"default": {"ok": true}}],
            "databases": [{"default": {"ok": true}}],
            "storage": {"ok": true}
        })
    );
}

#[tokio::test]
async fn test_http_report_missing_storage_directory_fails() {
    let mut fixture = setup_fixture();
    fixture.config.storage.path = "/proc/watchman-not-writable".into();

    let state = AppState::from_config(fixture.config.clone()).unwrap();
    let app = create_app(state);

    let request = Request::builder()
        .uri("/watchman?check=storage")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(json["storage"]["error"].is_string());
}
