//! Cipher engine for `otpvault`.
//!
//! Stored collection records carry their sensitive fields as base64 strings
//! of AES-256-GCM output. This module decrypts those fields back to plaintext
//! and derives the field key from session-supplied material. Key material is
//! always an explicit input — the engine never reads it from ambient global
//! state, so calls are stateless, independently retryable, and safe to run
//! concurrently across a batch of records.
//!
//! # Security model
//!
//! - Field format: `base64(nonce (12 bytes) || ciphertext || tag (16 bytes))`.
//! - Every encryption generates a fresh 96-bit nonce via `OsRng`.
//! - Key derivation uses HKDF-SHA256 with a per-purpose `info` string.
//! - All key types derive `Zeroize` + `ZeroizeOnDrop`.

use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

/// Minimum raw ciphertext length: 12-byte nonce + 16-byte AES-GCM tag.
const MIN_CIPHERTEXT_LEN: usize = 12 + 16;

/// Nonce length for AES-256-GCM (96 bits).
const NONCE_LEN: usize = 12;

/// A 256-bit field encryption key that is zeroized on drop.
///
/// Derived from the authenticated session context by the caller. The inner
/// bytes are never exposed in `Debug` output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; 32]);

impl EncryptionKey {
    /// Create a key from raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Generate a new random key using the OS CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let key = Aes256Gcm::generate_key(OsRng);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&key);
        Self(bytes)
    }

    /// Borrow the raw key bytes.
    ///
    /// Use with care — the caller must not log or persist these bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Encrypt a plaintext field value.
///
/// Returns `base64(nonce || ciphertext || tag)`. The vault core never
/// re-encrypts stored records — this exists for the registration side and
/// for building test fixtures.
///
/// # Errors
///
/// Returns [`CryptoError::Encryption`] if the AEAD operation fails.
pub fn encrypt_field(key: &EncryptionKey, plaintext: &str) -> Result<String, CryptoError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|e| CryptoError::Encryption {
            reason: e.to_string(),
        })?;

    // nonce || ciphertext (includes tag appended by aes-gcm)
    let mut combined = Vec::with_capacity(NONCE_LEN.saturating_add(ciphertext.len()));
    combined.extend_from_slice(&nonce);
    combined.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(combined))
}

/// Decrypt a stored field value produced by [`encrypt_field`].
///
/// # Errors
///
/// Returns [`CryptoError::InvalidEncoding`] if the input is not valid base64.
///
/// Returns [`CryptoError::CiphertextTooShort`] if the decoded bytes are
/// shorter than 28 bytes (nonce + tag minimum).
///
/// Returns [`CryptoError::Decryption`] if authentication fails (wrong key,
/// corrupted data, or tampered tag).
///
/// Returns [`CryptoError::InvalidUtf8`] if the plaintext is not UTF-8.
pub fn decrypt_field(key: &EncryptionKey, ciphertext: &str) -> Result<String, CryptoError> {
    let combined = BASE64
        .decode(ciphertext)
        .map_err(|e| CryptoError::InvalidEncoding {
            reason: e.to_string(),
        })?;

    if combined.len() < MIN_CIPHERTEXT_LEN {
        return Err(CryptoError::CiphertextTooShort {
            expected: MIN_CIPHERTEXT_LEN,
            actual: combined.len(),
        });
    }

    let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| CryptoError::Decryption {
            reason: e.to_string(),
        })?;

    String::from_utf8(plaintext).map_err(|_| CryptoError::InvalidUtf8)
}

/// Derive a field encryption key from session key material using HKDF-SHA256.
///
/// The `salt` should be unique per user. The `info` string must be unique
/// per purpose (e.g. `b"otpvault-fields-v1"`).
///
/// # Errors
///
/// Returns [`CryptoError::KeyDerivation`] if HKDF expansion fails (should
/// only happen if output length exceeds 255 * hash length).
pub fn derive_key(
    session_material: &[u8],
    salt: Option<&[u8]>,
    info: &[u8],
) -> Result<EncryptionKey, CryptoError> {
    let hk = Hkdf::<Sha256>::new(salt, session_material);
    let mut derived = [0u8; 32];
    hk.expand(info, &mut derived)
        .map_err(|e| CryptoError::KeyDerivation {
            context: String::from_utf8_lossy(info).into_owned(),
            reason: e.to_string(),
        })?;
    Ok(EncryptionKey::from_bytes(derived))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let key = EncryptionKey::generate();
        let ciphertext = encrypt_field(&key, "GitHub").unwrap();
        let decrypted = decrypt_field(&key, &ciphertext).unwrap();
        assert_eq!(decrypted, "GitHub");
    }

    #[test]
    fn encrypt_decrypt_empty_plaintext() {
        let key = EncryptionKey::generate();
        let ciphertext = encrypt_field(&key, "").unwrap();
        let decrypted = decrypt_field(&key, &ciphertext).unwrap();
        assert!(decrypted.is_empty());
    }

    #[test]
    fn decrypt_wrong_key_fails() {
        let key1 = EncryptionKey::generate();
        let key2 = EncryptionKey::generate();
        let ciphertext = encrypt_field(&key1, "secret").unwrap();
        let result = decrypt_field(&key2, &ciphertext);
        assert!(matches!(result, Err(CryptoError::Decryption { .. })));
    }

    #[test]
    fn decrypt_invalid_base64_fails() {
        let key = EncryptionKey::generate();
        let result = decrypt_field(&key, "not base64 !!!");
        assert!(matches!(result, Err(CryptoError::InvalidEncoding { .. })));
    }

    #[test]
    fn decrypt_too_short_fails() {
        let key = EncryptionKey::generate();
        let short = BASE64.encode([0u8; 10]);
        let result = decrypt_field(&key, &short);
        assert!(matches!(
            result,
            Err(CryptoError::CiphertextTooShort {
                expected: 28,
                actual: 10
            })
        ));
    }

    #[test]
    fn decrypt_tampered_ciphertext_fails() {
        let key = EncryptionKey::generate();
        let ciphertext = encrypt_field(&key, "secret").unwrap();
        let mut raw = BASE64.decode(&ciphertext).unwrap();
        // Flip a byte in the ciphertext portion (after the nonce).
        if let Some(byte) = raw.get_mut(NONCE_LEN) {
            *byte ^= 0xFF;
        }
        let result = decrypt_field(&key, &BASE64.encode(raw));
        assert!(matches!(result, Err(CryptoError::Decryption { .. })));
    }

    #[test]
    fn two_encryptions_produce_different_ciphertext() {
        let key = EncryptionKey::generate();
        let ct1 = encrypt_field(&key, "same data").unwrap();
        let ct2 = encrypt_field(&key, "same data").unwrap();
        // Different nonces → different ciphertext.
        assert_ne!(ct1, ct2);
    }

    #[test]
    fn derive_key_produces_deterministic_output() {
        let material = b"session key material";
        let k1 = derive_key(material, Some(b"user-1"), b"otpvault-fields-v1").unwrap();
        let k2 = derive_key(material, Some(b"user-1"), b"otpvault-fields-v1").unwrap();
        assert_eq!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn derive_key_different_info_produces_different_keys() {
        let material = b"session key material";
        let k1 = derive_key(material, Some(b"user-1"), b"otpvault-fields-v1").unwrap();
        let k2 = derive_key(material, Some(b"user-1"), b"otpvault-other-v1").unwrap();
        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn derived_key_encrypts_and_decrypts() {
        let derived = derive_key(b"material", None, b"otpvault-fields-v1").unwrap();
        let ciphertext = encrypt_field(&derived, "alice@example.com").unwrap();
        assert_eq!(
            decrypt_field(&derived, &ciphertext).unwrap(),
            "alice@example.com"
        );
    }

    #[test]
    fn encryption_key_debug_redacts_bytes() {
        let key = EncryptionKey::generate();
        let debug = format!("{key:?}");
        assert!(debug.contains("[REDACTED]"));
    }
}
