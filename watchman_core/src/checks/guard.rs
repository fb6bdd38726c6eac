//! Fault isolation for probes
//!
//! Probe bodies are written to simply fail with `?`; the wrappers here turn
//! every way a probe can end (success, error, panic, timeout) into exactly
//! one [`CheckResult`].

use super::result::CheckResult;
use crate::error::{Result, WatchmanError};
use futures_util::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::debug;

pub async fn guard<F>(probe: F) -> CheckResult
where
    F: Future<Output = Result<()>>,
{
    match AssertUnwindSafe(probe).catch_unwind().await {
        Ok(Ok(())) => CheckResult::Ok,
        Ok(Err(e)) => {
            debug!("Probe failed: {}", e);
            CheckResult::error(e.to_string())
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            debug!("Probe panicked: {}", message);
            CheckResult::error(message)
        }
    }
}

/// Like [`guard`], but a probe still running after `timeout` is dropped and
/// reported as an error. `None` waits for the probe however long it takes.
pub async fn guard_with_timeout<F>(probe: F, timeout: Option<Duration>) -> CheckResult
where
    F: Future<Output = Result<()>>,
{
    match timeout {
        None => guard(probe).await,
        Some(limit) => {
            guard(async move {
                tokio::time::timeout(limit, probe)
                    .await
                    .map_err(|_| WatchmanError::Timeout(limit))?
            })
            .await
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("check panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("check panicked: {}", message)
    } else {
        "check panicked".to_string()
    }
}
