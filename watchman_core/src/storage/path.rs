use std::path::{Component, Path, PathBuf};
use crate::error::{Result, WatchmanError};

/// Joins an untrusted `name` onto `base` without touching the filesystem.
///
/// The name must be relative, free of NUL bytes, and must not climb above
/// `base` at any point through `..` components.
pub fn safe_join(base: &Path, name: &str) -> Result<PathBuf> {
    let rejected = || WatchmanError::TraversalRejected {
        path: base.join(name),
    };

    if name.contains('\0') {
        return Err(rejected());
    }

    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(rejected());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(rejected()),
        }
    }

    let mut joined = base.to_path_buf();
    joined.extend(parts);
    Ok(joined)
}
