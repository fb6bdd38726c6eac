use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use async_trait::async_trait;
use tokio::fs as async_fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Result, WatchmanError};
use super::{alternative_name, Storage};

const MAX_NAME_ATTEMPTS: usize = 8;

/// Stores files on the local filesystem at the paths it is given.
#[derive(Debug, Clone, Default)]
pub struct FileSystemStorage;

impl FileSystemStorage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Storage for FileSystemStorage {
    async fn save(&self, path: &Path, content: &[u8]) -> Result<PathBuf> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                async_fs::create_dir_all(parent).await?;
            }
        }

        let mut candidate = path.to_path_buf();
        for _ in 0..MAX_NAME_ATTEMPTS {
            let opened = async_fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await;

            match opened {
                Ok(mut file) => {
                    file.write_all(content).await?;
                    file.sync_all().await?;
                    debug!("Stored {} bytes at {}", content.len(), candidate.display());
                    return Ok(candidate);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    warn!("{} already exists, trying another name", candidate.display());
                    let suffix = Uuid::new_v4().simple().to_string();
                    candidate = alternative_name(path, &suffix[..7]);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(WatchmanError::Storage(format!(
            "no available name for {}",
            path.display()
        )))
    }

    async fn size(&self, path: &Path) -> Result<u64> {
        Ok(async_fs::metadata(path).await?.len())
    }

    async fn open(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(async_fs::read(path).await?)
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        match async_fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        Ok(async_fs::try_exists(path).await?)
    }
}
