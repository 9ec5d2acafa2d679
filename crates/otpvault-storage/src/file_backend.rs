//! File-per-key cache backend — the production default.
//!
//! Each key is stored as a single file inside a scoped cache directory. All
//! filesystem calls are dispatched to a blocking thread via
//! [`tokio::task::spawn_blocking`].
//!
//! Writes are atomic: the value is written to a temporary file in the same
//! directory, flushed to disk, then renamed over the target. A reader never
//! observes a partial write, and the temporary file is cleaned up on every
//! exit path (including failure) because `tempfile` unlinks it on drop.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::{CacheBackend, StorageError};

/// A cache backend storing one file per key under a scoped directory.
///
/// # Examples
///
/// ```no_run
/// # use otpvault_storage::FileBackend;
/// let backend = FileBackend::open("/home/user/.cache/otpvault").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Open a cache directory, creating it if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the directory cannot be created.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| StorageError::Open {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;
        tracing::debug!(path = %dir.display(), "opened cache directory");
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Return the cache directory path.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.dir.join(key))
    }
}

/// Keys become file names, so anything that could escape the cache
/// directory is rejected.
fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey {
            key: key.to_owned(),
            reason: "key must not be empty".to_owned(),
        });
    }
    if key.contains(['/', '\\']) || key == "." || key == ".." {
        return Err(StorageError::InvalidKey {
            key: key.to_owned(),
            reason: "key must not contain path separators or traversal".to_owned(),
        });
    }
    Ok(())
}

#[async_trait::async_trait]
impl CacheBackend for FileBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.entry_path(key)?;
        let key = key.to_owned();
        let task_key = key.clone();
        tokio::task::spawn_blocking(move || match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Read {
                key: task_key,
                reason: e.to_string(),
            }),
        })
        .await
        .map_err(|e| StorageError::Read {
            key,
            reason: format!("blocking task failed: {e}"),
        })?
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let path = self.entry_path(key)?;
        let dir = self.dir.clone();
        let key = key.to_owned();
        let task_key = key.clone();
        let value = value.to_vec();
        tokio::task::spawn_blocking(move || {
            let write_err = |reason: String| StorageError::Write {
                key: task_key.clone(),
                reason,
            };

            let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| write_err(e.to_string()))?;
            tmp.write_all(&value).map_err(|e| write_err(e.to_string()))?;
            tmp.as_file()
                .sync_all()
                .map_err(|e| write_err(e.to_string()))?;
            tmp.persist(&path).map_err(|e| write_err(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| StorageError::Write {
            key,
            reason: format!("blocking task failed: {e}"),
        })?
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.entry_path(key)?;
        let key = key.to_owned();
        let task_key = key.clone();
        tokio::task::spawn_blocking(move || match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Delete {
                key: task_key,
                reason: e.to_string(),
            }),
        })
        .await
        .map_err(|e| StorageError::Delete {
            key,
            reason: format!("blocking task failed: {e}"),
        })?
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn make_backend() -> (tempfile::TempDir, FileBackend) {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();
        (dir, backend)
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let (_dir, backend) = make_backend();
        assert_eq!(backend.get("passphrase").await.unwrap(), None);
    }

    #[tokio::test]
    async fn put_get_roundtrip() {
        let (_dir, backend) = make_backend();
        backend.put("passphrase", b"fingerprint").await.unwrap();
        assert_eq!(
            backend.get("passphrase").await.unwrap(),
            Some(b"fingerprint".to_vec())
        );
    }

    #[tokio::test]
    async fn put_atomically_overwrites() {
        let (_dir, backend) = make_backend();
        backend.put("passphrase", b"old-value").await.unwrap();
        backend.put("passphrase", b"new-value").await.unwrap();
        assert_eq!(
            backend.get("passphrase").await.unwrap(),
            Some(b"new-value".to_vec())
        );
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_dir, backend) = make_backend();
        backend.put("passphrase", b"val").await.unwrap();
        backend.delete("passphrase").await.unwrap();
        backend.delete("passphrase").await.unwrap();
        assert_eq!(backend.get("passphrase").await.unwrap(), None);
    }

    #[tokio::test]
    async fn rejects_path_traversal_keys() {
        let (_dir, backend) = make_backend();
        let result = backend.put("../escape", b"val").await;
        assert!(matches!(result, Err(StorageError::InvalidKey { .. })));

        let result = backend.get("a/b").await;
        assert!(matches!(result, Err(StorageError::InvalidKey { .. })));
    }

    #[tokio::test]
    async fn rejects_empty_key() {
        let (_dir, backend) = make_backend();
        let result = backend.put("", b"val").await;
        assert!(matches!(result, Err(StorageError::InvalidKey { .. })));
    }

    #[tokio::test]
    async fn no_temp_files_left_behind() {
        let (dir, backend) = make_backend();
        backend.put("passphrase", b"val").await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("passphrase")]);
    }
}
