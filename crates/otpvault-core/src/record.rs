//! Collection record types.
//!
//! [`EncryptedCollectionRecord`] is the stored shape, owned by a single user
//! account and read-only to this crate — the core decrypts and derives but
//! never mutates or re-encrypts stored fields. [`DecryptedCollectionItem`]
//! is its ephemeral, process-local counterpart: constructed fresh on every
//! display refresh cycle, never persisted.
//!
//! Typing is strict at the boundary: a record missing a required field fails
//! deserialization here instead of surfacing later as a token-generation
//! failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::totp::{TokenType, TotpAlgorithm};

/// One stored TOTP entry as it arrives from the storage collaborator.
///
/// The four sensitive fields (`issuer`, `account_label`, `secret_key`,
/// `backup_code`) are base64 ciphertext strings produced by the cipher
/// engine. Every one of them must decrypt to non-empty plaintext or the
/// record is invalid and excluded from token generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedCollectionRecord {
    /// Opaque identifier of the owning user account.
    pub owner_id: String,
    /// Display name of the service, encrypted.
    pub issuer: String,
    /// The account identity shown to the human, encrypted.
    pub account_label: String,
    /// The shared TOTP seed (base32 once decrypted), encrypted.
    pub secret_key: String,
    /// Recovery code, encrypted.
    pub backup_code: String,
    /// HMAC algorithm declared for this entry.
    pub algorithm: TotpAlgorithm,
    /// Code length, typically 6 or 8.
    pub digits: u32,
    /// Time step in seconds, typically 30.
    pub period_seconds: u64,
    /// Token family. HOTP is declared but unsupported by the generator.
    pub token_type: TokenType,
}

/// The decrypted counterpart of a record plus its freshly computed code.
///
/// Ephemeral and process-local. Holds live secret material — never log,
/// serialize to disk, or otherwise persist one of these.
#[derive(Debug, Clone)]
pub struct DecryptedCollectionItem {
    /// Opaque identifier of the owning user account.
    pub owner_id: String,
    /// Display name of the service, plaintext.
    pub issuer: String,
    /// The account identity shown to the human, plaintext.
    pub account_label: String,
    /// The shared TOTP seed, base32 plaintext.
    pub secret_key: String,
    /// Recovery code, plaintext.
    pub backup_code: String,
    /// HMAC algorithm declared for this entry.
    pub algorithm: TotpAlgorithm,
    /// Code length.
    pub digits: u32,
    /// Time step in seconds.
    pub period_seconds: u64,
    /// Token family.
    pub token_type: TokenType,
    /// The current TOTP code.
    pub token: String,
    /// When the current code rotates out.
    pub token_expires_at: DateTime<Utc>,
}
