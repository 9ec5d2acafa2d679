//! Error types for `otpvault-core`.
//!
//! Each error variant carries enough context to diagnose the problem without
//! a debugger. Errors never include key material, plaintext secrets, or
//! passphrases — only field names and operation descriptions.
//!
//! Per-record errors ([`RecordParseError`]) are non-fatal: the pipeline
//! accumulates them and keeps processing the rest of the batch. Unlock
//! errors keep the vault locked. No error in this crate panics.

use otpvault_storage::StorageError;

/// Errors from cipher engine operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// AES-256-GCM encryption failed.
    #[error("encryption failed: {reason}")]
    Encryption { reason: String },

    /// AES-256-GCM decryption failed (wrong key, corrupted ciphertext, or tampered tag).
    #[error("decryption failed: {reason}")]
    Decryption { reason: String },

    /// The ciphertext string is not valid base64.
    #[error("ciphertext is not valid base64: {reason}")]
    InvalidEncoding { reason: String },

    /// Ciphertext is too short to contain a valid nonce + tag.
    #[error("ciphertext too short: expected at least {expected} bytes, got {actual}")]
    CiphertextTooShort { expected: usize, actual: usize },

    /// Decrypted bytes are not valid UTF-8.
    #[error("decrypted value is not valid UTF-8")]
    InvalidUtf8,

    /// HKDF key derivation failed.
    #[error("key derivation failed for context '{context}': {reason}")]
    KeyDerivation { context: String, reason: String },
}

/// Errors from passphrase hashing and verification.
#[derive(Debug, thiserror::Error)]
pub enum PassphraseError {
    /// Producing the durable Argon2id hash failed.
    #[error("durable hash failed: {reason}")]
    Hash { reason: String },

    /// The stored durable hash string is not a valid PHC-format hash.
    #[error("stored passphrase hash is malformed: {reason}")]
    MalformedHash { reason: String },

    /// The configured work factor is out of the acceptable range.
    #[error("invalid hash cost: {reason}")]
    InvalidCost { reason: String },
}

/// Errors from TOTP token generation.
#[derive(Debug, thiserror::Error)]
pub enum TotpError {
    /// The shared seed failed base32 decoding or decoded to nothing.
    #[error("invalid TOTP secret: {reason}")]
    InvalidSecret { reason: String },

    /// The record declares an HMAC algorithm the generator does not support.
    #[error("unsupported TOTP algorithm '{name}'")]
    UnsupportedAlgorithm { name: String },

    /// Digit count cannot be used as a modulus (zero, or wider than u64).
    #[error("invalid digit count {digits}: must be between 1 and 19")]
    InvalidDigits { digits: u32 },

    /// The time step must be a positive number of seconds.
    #[error("invalid period: must be greater than 0 seconds")]
    InvalidPeriod,
}

/// Per-record failures from the vault record pipeline.
///
/// These are accumulated per batch — one bad record never aborts the rest.
#[derive(Debug, thiserror::Error)]
pub enum RecordParseError {
    /// A sensitive field failed decryption.
    #[error("field '{field}' failed decryption: {source}")]
    Decrypt {
        field: &'static str,
        source: CryptoError,
    },

    /// A sensitive field decrypted to empty plaintext — the record is invalid.
    #[error("field '{field}' decrypted to empty plaintext")]
    EmptyField { field: &'static str },

    /// Token generation failed for this record.
    #[error("token generation failed: {0}")]
    Token(#[from] TotpError),

    /// The record declares a token type the generator does not implement.
    #[error("unsupported token type '{token_type}'")]
    UnsupportedTokenType { token_type: String },

    /// The per-record task could not be joined.
    #[error("record task failed")]
    TaskFailed,
}

/// Errors from unlock attempts. The vault stays locked on every variant.
#[derive(Debug, thiserror::Error)]
pub enum UnlockError {
    /// The passphrase is empty or a single character.
    #[error("passphrase required")]
    EmptyInput,

    /// The passphrase did not match the durable hash.
    #[error("invalid passphrase")]
    InvalidPassphrase,

    /// The durable hash could not be verified (malformed hash, hasher failure).
    #[error("passphrase verification failed: {0}")]
    Hasher(#[from] PassphraseError),

    /// The verification task could not be joined.
    #[error("unlock task failed: {reason}")]
    TaskFailed { reason: String },
}

/// Errors from reading the cached fingerprint.
#[derive(Debug, thiserror::Error)]
pub enum FingerprintCacheError {
    /// The cache backend failed.
    #[error("fingerprint cache error: {0}")]
    Storage(#[from] StorageError),

    /// The cached value is not valid UTF-8.
    #[error("cached fingerprint is corrupted")]
    Corrupted,
}
