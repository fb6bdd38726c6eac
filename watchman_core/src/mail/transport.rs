use std::path::PathBuf;
use std::sync::Arc;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tokio::fs as async_fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, WatchmanError};
use super::{EmailMessage, MailTransport};

fn ensure_deliverable(message: &EmailMessage) -> Result<bool> {
    if message.from.trim().is_empty() {
        return Err(WatchmanError::Mail("message has no sender".to_string()));
    }
    if message.to.is_empty() {
        debug!("Message {:?} has no recipients, nothing to send", message.subject);
        return Ok(false);
    }
    Ok(true)
}

/// Keeps sent messages in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryOutbox {
    messages: Arc<RwLock<Vec<EmailMessage>>>,
}

impl MemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<EmailMessage> {
        self.messages.read().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }

    pub fn clear(&self) {
        self.messages.write().clear();
    }
}

#[async_trait]
impl MailTransport for MemoryOutbox {
    async fn send(&self, message: &EmailMessage) -> Result<usize> {
        if !ensure_deliverable(message)? {
            return Ok(0);
        }
        self.messages.write().push(message.clone());
        Ok(1)
    }
}

/// Writes each message to its own file in a directory.
#[derive(Debug, Clone)]
pub struct FileTransport {
    directory: PathBuf,
}

impl FileTransport {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &PathBuf {
        &self.directory
    }
}

#[async_trait]
impl MailTransport for FileTransport {
    async fn send(&self, message: &EmailMessage) -> Result<usize> {
        if !ensure_deliverable(message)? {
            return Ok(0);
        }

        if !self.directory.is_dir() {
            return Err(WatchmanError::Mail(format!(
                "mail directory {} does not exist",
                self.directory.display()
            )));
        }

        let filename = format!(
            "{}-{}.log",
            Utc::now().format("%Y%m%d-%H%M%S"),
            Uuid::new_v4()
        );
        let path = self.directory.join(filename);
        async_fs::write(&path, message.render()).await?;

        info!("Wrote message {:?} to {}", message.subject, path.display());
        Ok(1)
    }
}
