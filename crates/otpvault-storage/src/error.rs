//! Cache storage error types.
//!
//! Every error variant carries enough context to diagnose the problem
//! without a debugger. Values are never included in error messages — the
//! cache may hold passphrase fingerprints.

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Failed to open or create the cache directory.
    #[error("failed to open cache at '{path}': {reason}")]
    Open { path: String, reason: String },

    /// Failed to read a value from the cache.
    #[error("failed to read cache key '{key}': {reason}")]
    Read { key: String, reason: String },

    /// Failed to write a value to the cache.
    #[error("failed to write cache key '{key}': {reason}")]
    Write { key: String, reason: String },

    /// Failed to delete a key from the cache.
    #[error("failed to delete cache key '{key}': {reason}")]
    Delete { key: String, reason: String },

    /// The key is not a valid cache name (empty, or contains path syntax).
    #[error("invalid cache key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },
}
