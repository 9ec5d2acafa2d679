//! Local cache backend abstraction for `otpvault`.
//!
//! This crate defines the [`CacheBackend`] trait — a small key-value cache
//! interface that knows nothing about passphrases, fingerprints, or tokens.
//! The lock manager in `otpvault-core` uses a cache backend to persist the
//! local passphrase fingerprint between application launches. The cache only
//! ever holds non-authoritative convenience values; losing it is always safe.
//!
//! Two implementations are provided:
//!
//! - [`FileBackend`] — production default, one file per key with atomic
//!   writes (temp file + rename)
//! - [`MemoryBackend`] — in-memory, for testing only

mod error;
mod file_backend;
mod memory;

pub use error::StorageError;
pub use file_backend::FileBackend;
pub use memory::MemoryBackend;

/// A pluggable key-value cache backend.
///
/// Keys are short UTF-8 names (e.g. `passphrase`). Values are opaque byte
/// arrays. Implementations must be safe to share across async tasks
/// (`Send + Sync`).
#[async_trait::async_trait]
pub trait CacheBackend: Send + Sync + 'static {
    /// Retrieve a value by key.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the underlying backend fails.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store a key-value pair, overwriting any existing value.
    ///
    /// The write must be atomic: a concurrent reader observes either the
    /// previous value or the new one, never a partial write.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] if the underlying backend fails, or
    /// [`StorageError::InvalidKey`] if the key is not a valid cache name.
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Delete a key. This is idempotent — deleting a non-existent key is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Delete`] if the underlying backend fails.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}
