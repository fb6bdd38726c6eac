use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{Result, WatchmanError};
use super::{alternative_name, Storage};

/// Keeps stored files in memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: Arc<RwLock<HashMap<PathBuf, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }

    fn not_found(path: &Path) -> WatchmanError {
        WatchmanError::Storage(format!("No such file: {}", path.display()))
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn save(&self, path: &Path, content: &[u8]) -> Result<PathBuf> {
        let mut files = self.files.write();

        let mut candidate = path.to_path_buf();
        while files.contains_key(&candidate) {
            let suffix = Uuid::new_v4().simple().to_string();
            candidate = alternative_name(path, &suffix[..7]);
        }

        files.insert(candidate.clone(), content.to_vec());
        Ok(candidate)
    }

    async fn size(&self, path: &Path) -> Result<u64> {
        self.files
            .read()
            .get(path)
            .map(|content| content.len() as u64)
            .ok_or_else(|| Self::not_found(path))
    }

    async fn open(&self, path: &Path) -> Result<Vec<u8>> {
        self.files
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| Self::not_found(path))
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        self.files.write().remove(path);
        Ok(())
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        Ok(self.files.read().contains_key(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_and_delete() {
        let storage = MemoryStorage::new();
        let path = Path::new("/data/watchman/file.txt");

        let stored = storage.save(path, b"content").await.unwrap();
        assert_eq!(storage.size(&stored).await.unwrap(), 7);
        assert_eq!(storage.open(&stored).await.unwrap(), b"content".to_vec());

        storage.delete(&stored).await.unwrap();
        assert!(!storage.exists(&stored).await.unwrap());
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_taken_name_gets_alternative() {
        let storage = MemoryStorage::new();
        let path = Path::new("/data/watchman/file.txt");

        let first = storage.save(path, b"one").await.unwrap();
        let second = storage.save(path, b"two").await.unwrap();

        assert_eq!(first, path);
        assert_ne!(second, path);
        assert_eq!(storage.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let storage = MemoryStorage::new();
        let err = storage.size(Path::new("/nope")).await.unwrap_err();
        assert!(err.to_string().contains("No such file"));
    }
}
