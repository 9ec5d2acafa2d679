//! Passphrase hashing for the vault lock.
//!
//! Two deliberately different hashes, never interchangeable:
//!
//! - **Durable hash** ([`hash_durable`] / [`verify_durable`]): Argon2id in
//!   PHC string format, salted, with a configurable work factor. This is the
//!   value stored in the user's remote profile at registration time and the
//!   only hash the unlock path may trust. Verification is delegated to the
//!   Argon2 verifier, which compares in constant time — it never
//!   short-circuits on the first differing byte.
//! - **Fast fingerprint** ([`fingerprint_fast`]): a plain SHA-256 digest,
//!   cached locally after a successful unlock so later launches can do a
//!   quick secondary check without a remote round trip. It is explicitly
//!   weaker than the durable hash and must NEVER be used as a substitute for
//!   [`verify_durable`] on the authoritative unlock path.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::PassphraseError;

/// Work factor for the durable Argon2id hash.
///
/// The defaults follow the argon2 crate's recommended parameters. Raising
/// them slows every unlock attempt equally for the user and an attacker.
#[derive(Debug, Clone, Copy)]
pub struct DurableHashCost {
    /// Memory cost in KiB.
    pub mem_cost_kib: u32,
    /// Number of iterations.
    pub time_cost: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl Default for DurableHashCost {
    fn default() -> Self {
        Self {
            mem_cost_kib: Params::DEFAULT_M_COST,
            time_cost: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl DurableHashCost {
    fn hasher(self) -> Result<Argon2<'static>, PassphraseError> {
        let params = Params::new(self.mem_cost_kib, self.time_cost, self.parallelism, None)
            .map_err(|e| PassphraseError::InvalidCost {
                reason: e.to_string(),
            })?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Hash a passphrase for durable storage with the default work factor.
///
/// Returns a salted PHC-format Argon2id hash string. One-way by
/// construction — there is no corresponding decrypt.
///
/// # Errors
///
/// Returns [`PassphraseError::Hash`] if hashing fails.
pub fn hash_durable(passphrase: &str) -> Result<String, PassphraseError> {
    hash_durable_with(passphrase, DurableHashCost::default())
}

/// Hash a passphrase for durable storage with an explicit work factor.
///
/// # Errors
///
/// Returns [`PassphraseError::InvalidCost`] if the work factor is out of
/// range, or [`PassphraseError::Hash`] if hashing fails.
pub fn hash_durable_with(
    passphrase: &str,
    cost: DurableHashCost,
) -> Result<String, PassphraseError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = cost
        .hasher()?
        .hash_password(passphrase.as_bytes(), &salt)
        .map_err(|e| PassphraseError::Hash {
            reason: e.to_string(),
        })?;
    Ok(hash.to_string())
}

/// Verify a passphrase against a stored durable hash.
///
/// The Argon2 parameters (including the work factor the hash was created
/// with) are read from the PHC string itself. Comparison happens inside the
/// verifier in constant time.
///
/// # Errors
///
/// Returns [`PassphraseError::MalformedHash`] if the stored hash is not a
/// valid PHC string. A passphrase that simply does not match is `Ok(false)`,
/// not an error.
pub fn verify_durable(passphrase: &str, hash: &str) -> Result<bool, PassphraseError> {
    let parsed = PasswordHash::new(hash).map_err(|e| PassphraseError::MalformedHash {
        reason: e.to_string(),
    })?;

    match Argon2::default().verify_password(passphrase.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PassphraseError::MalformedHash {
            reason: e.to_string(),
        }),
    }
}

/// Compute the fast local fingerprint of a passphrase.
///
/// SHA-256, hex-encoded. This is a local convenience cache marker only —
/// it proves "this device has already passed [`verify_durable`] once", and
/// nothing more. Do not use it to authorize an unlock.
#[must_use]
pub fn fingerprint_fast(passphrase: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(passphrase.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compare a passphrase against a cached fingerprint in constant time.
#[must_use]
pub fn fingerprint_matches(passphrase: &str, fingerprint: &str) -> bool {
    let computed = fingerprint_fast(passphrase);
    computed.as_bytes().ct_eq(fingerprint.as_bytes()).into()
}
