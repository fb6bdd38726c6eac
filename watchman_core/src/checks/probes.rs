//! The probes themselves and the per-category entry points
//!
//! Probe bodies propagate every failure with `?` and leave the conversion
//! into a [`CheckResult`] to [`guard_with_timeout`]. The one exception is a
//! rejected storage path, which is returned to the caller as
//! [`WatchmanError::TraversalRejected`] before any storage call is made.

use super::guard::guard_with_timeout;
use super::result::{Category, CategoryResult, CheckResult, NamedResult, Report};
use super::Backends;
use crate::cache::CacheRegistry;
use crate::config::{EmailConfig, WatchmanConfig};
use crate::database::DatabaseRegistry;
use crate::error::{Result, WatchmanError};
use crate::mail::{EmailMessage, MailTransport};
use crate::storage::{safe_join, Storage};
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

pub const STORAGE_TEST_CONTENT: &[u8] = b"django-watchman test file";

const EMAIL_SUBJECT: &str = "watchman email check";
const EMAIL_BODY: &str = "This is an automated test of the email system.";
const EMAIL_MARKER_HEADER: &str = "X-WATCHMAN";

fn log_outcome(category: Category, name: &str, result: &CheckResult) {
    match result {
        CheckResult::Ok => info!("Check '{}' ({}) passed", name, category),
        CheckResult::Error(message) => warn!("Check '{}' ({}) failed: {}", name, category, message),
    }
}

pub async fn check_cache(caches: &CacheRegistry, name: &str, timeout: Option<Duration>) -> CheckResult {
    let result = guard_with_timeout(
        async {
            let key = format!("watchman-{}", Uuid::new_v4());
            let value = format!("watchman-{}", Uuid::new_v4());

            let cache = caches.get(name)?;

            cache.set(&key, &value).await?;
            cache.get(&key).await?;
            cache.delete(&key).await?;
            Ok(())
        },
        timeout,
    )
    .await;

    log_outcome(Category::Caches, name, &result);
    result
}

pub async fn check_caches(caches: &CacheRegistry, names: &[String], timeout: Option<Duration>) -> CategoryResult {
    let mut names = names.to_vec();
    names.sort();
    names.dedup();

    let mut entries = Vec::with_capacity(names.len());
    for name in names {
        let result = check_cache(caches, &name, timeout).await;
        entries.push(NamedResult::new(name, result));
    }
    CategoryResult::instances(entries)
}

pub async fn check_database(databases: &DatabaseRegistry, alias: &str, timeout: Option<Duration>) -> CheckResult {
    let result = guard_with_timeout(
        async {
            let database = databases.get(alias)?;
            database.execute("SELECT 1").await?;
            Ok(())
        },
        timeout,
    )
    .await;

    log_outcome(Category::Databases, alias, &result);
    result
}

pub async fn check_databases(
    databases: &DatabaseRegistry,
    aliases: &[String],
    timeout: Option<Duration>,
) -> CategoryResult {
    let mut aliases = aliases.to_vec();
    aliases.sort();
    aliases.dedup();

    let mut entries = Vec::with_capacity(aliases.len());
    for alias in aliases {
        let result = check_database(databases, &alias, timeout).await;
        entries.push(NamedResult::new(alias, result));
    }
    CategoryResult::instances(entries)
}

/// The fixed test message, with configured headers layered over the marker header.
pub fn build_test_message(email: &EmailConfig) -> EmailMessage {
    let mut headers = std::collections::BTreeMap::new();
    headers.insert(EMAIL_MARKER_HEADER.to_string(), "True".to_string());
    headers.extend(email.headers.clone());

    EmailMessage {
        subject: EMAIL_SUBJECT.to_string(),
        body: EMAIL_BODY.to_string(),
        from: email.sender.clone(),
        to: email.recipients.clone(),
        headers,
    }
}

pub async fn check_email(mailer: &dyn MailTransport, email: &EmailConfig, timeout: Option<Duration>) -> CheckResult {
    let result = guard_with_timeout(
        async {
            let message = build_test_message(email);
            mailer.send(&message).await?;
            Ok(())
        },
        timeout,
    )
    .await;

    log_outcome(Category::Email, "email", &result);
    result
}

/// Writes, sizes, reads back and deletes `filename` under `base_dir`.
///
/// A name that would land outside `base_dir` is returned as
/// `Err(TraversalRejected)` and no storage operation is attempted. Every
/// other failure ends up in the returned [`CheckResult`].
pub async fn check_storage_file(
    storage: &dyn Storage,
    base_dir: &Path,
    filename: &str,
    timeout: Option<Duration>,
) -> Result<CheckResult> {
    let path = safe_join(base_dir, filename).map_err(|e| {
        error!("Storage check rejected {:?}: {}", filename, e);
        e
    })?;

    if !path.starts_with(base_dir) {
        error!("Storage check path {} escapes {}", path.display(), base_dir.display());
        return Err(WatchmanError::TraversalRejected { path });
    }

    let result = guard_with_timeout(
        async {
            let stored = storage.save(&path, STORAGE_TEST_CONTENT).await?;
            storage.size(&stored).await?;
            storage.open(&stored).await?;
            storage.delete(&stored).await?;
            Ok(())
        },
        timeout,
    )
    .await;

    log_outcome(Category::Storage, "storage", &result);
    Ok(result)
}

pub async fn caches(backends: &Backends, config: &WatchmanConfig) -> Report {
    let result = check_caches(&backends.caches, &config.cache_names(), config.probe_timeout()).await;
    Report::single(Category::Caches, result)
}

pub async fn databases(backends: &Backends, config: &WatchmanConfig) -> Report {
    let result = check_databases(&backends.databases, &config.database_names(), config.probe_timeout()).await;
    Report::single(Category::Databases, result)
}

pub async fn email(backends: &Backends, config: &WatchmanConfig) -> Report {
    let result = check_email(backends.mailer.as_ref(), &config.email, config.probe_timeout()).await;
    Report::single(Category::Email, CategoryResult::Single(result))
}

pub async fn storage(backends: &Backends, config: &WatchmanConfig) -> Result<Report> {
    let filename = format!("watchman-{}.txt", Uuid::new_v4());
    let result = check_storage_file(
        backends.storage.as_ref(),
        &config.storage.path,
        &filename,
        config.probe_timeout(),
    )
    .await?;
    Ok(Report::single(Category::Storage, CategoryResult::Single(result)))
}
