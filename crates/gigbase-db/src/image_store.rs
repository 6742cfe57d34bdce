use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use gigbase_core::{ImageStore, StorageError};

/// Image files kept under a root directory. Paths are relative to the root.
pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a stored path into the root, refusing anything that would leave it.
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        let inside = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !inside {
            return Err(StorageError::ImageStorage(format!(
                "path outside image directory: {}",
                path
            )));
        }
        Ok(self.root.join(relative))
    }

    fn delete_one(&self, path: &str) -> Result<(), StorageError> {
        let full = self.resolve(path)?;
        match std::fs::remove_file(&full) {
            Ok(()) => tracing::debug!(path = %full.display(), "deleted image"),
            // Already gone.
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(StorageError::ImageStorage(format!("{}: {}", path, e))),
        }
        Ok(())
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    /// Every path is attempted. Returns the first failure, if any.
    async fn delete_images(&self, paths: &[String]) -> Result<(), StorageError> {
        let mut first_error = None;
        for path in paths {
            if let Err(e) = self.delete_one(path) {
                tracing::warn!(path = %path, error = %e, "failed to delete image");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
