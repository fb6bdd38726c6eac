//! File storage backends used by the storage probe

pub mod filesystem;
pub mod memory;
pub mod path;

pub use filesystem::FileSystemStorage;
pub use memory::MemoryStorage;
pub use path::safe_join;

use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

#[async_trait]
pub trait Storage: Send + Sync {
    /// Stores `content` and returns the path it was actually stored under,
    /// which differs from `path` when that name is already taken.
    async fn save(&self, path: &Path, content: &[u8]) -> Result<PathBuf>;
    async fn size(&self, path: &Path) -> Result<u64>;
    async fn open(&self, path: &Path) -> Result<Vec<u8>>;
    async fn delete(&self, path: &Path) -> Result<()>;
    async fn exists(&self, path: &Path) -> Result<bool>;
}

/// `name.ext` -> `name_<suffix>.ext`, used when the requested name is taken.
pub(crate) fn alternative_name(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let filename = match path.extension() {
        Some(extension) => format!("{}_{}.{}", stem, suffix, extension.to_string_lossy()),
        None => format!("{}_{}", stem, suffix),
    };
    path.with_file_name(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alternative_name_keeps_extension() {
        assert_eq!(
            alternative_name(Path::new("/data/report.txt"), "ab12"),
            PathBuf::from("/data/report_ab12.txt")
        );
        assert_eq!(
            alternative_name(Path::new("/data/report"), "ab12"),
            PathBuf::from("/data/report_ab12")
        );
    }
}
