//! Lock manager: the gate in front of the vault.
//!
//! Process-wide state machine with two states, `Locked` → `Unlocked` →
//! `Locked`, cycling until the process exits. The vault starts `Locked`;
//! the only way in is [`LockManager::attempt_unlock`] with a passphrase
//! verified against the durable hash supplied by the auth collaborator.
//!
//! On a successful unlock the manager caches a fast fingerprint of the
//! passphrase in local scoped storage so later launches can run a quick
//! secondary check without a remote round trip. The fingerprint is
//! best-effort and never authoritative: one durable verification per
//! application session start is always required, and a failed cache write
//! does not fail the unlock.
//!
//! Unlock attempts are serialized — a second attempt queues behind the one
//! in flight. The manager never races its own state.

use std::sync::Arc;

use otpvault_storage::CacheBackend;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::error::{FingerprintCacheError, UnlockError};
use crate::passphrase;

/// Cache key under which the local passphrase fingerprint is stored.
pub const FINGERPRINT_CACHE_KEY: &str = "passphrase";

/// Whether the vault is currently viewable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Locked,
    Unlocked,
}

/// Result of a successful unlock.
#[derive(Debug, Clone, Copy)]
pub struct UnlockOutcome {
    /// Whether the fast fingerprint reached the local cache. `false` means
    /// the unlock succeeded but the cache write failed — the next launch
    /// will simply skip the fast path. Surface this as a warning so a stale
    /// cache doesn't silently mask future checks.
    pub fingerprint_persisted: bool,
}

/// Orchestrates unlock attempts and owns the process-wide [`LockState`].
///
/// Collaborators receive a shared reference to this manager instead of
/// touching ambient global state.
pub struct LockManager {
    state: RwLock<LockState>,
    /// Serializes unlock attempts; concurrent unlock races are unsupported.
    attempt: Mutex<()>,
    cache: Arc<dyn CacheBackend>,
}

impl std::fmt::Debug for LockManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockManager").finish_non_exhaustive()
    }
}

impl LockManager {
    /// Create a manager in the `Locked` state.
    #[must_use]
    pub fn new(cache: Arc<dyn CacheBackend>) -> Self {
        Self {
            state: RwLock::new(LockState::Locked),
            attempt: Mutex::new(()),
            cache,
        }
    }

    /// Current lock state.
    pub async fn state(&self) -> LockState {
        *self.state.read().await
    }

    /// Whether the vault is unlocked.
    pub async fn is_unlocked(&self) -> bool {
        matches!(*self.state.read().await, LockState::Unlocked)
    }

    /// Attempt to unlock the vault.
    ///
    /// `durable_hash` is the Argon2id PHC hash from the authenticated user's
    /// remote profile. Verification runs on a blocking task — the slow hash
    /// must not stall the async executor.
    ///
    /// On success the fast fingerprint is written to the local cache
    /// (overwriting any previous value) and the state flips to `Unlocked`.
    ///
    /// # Errors
    ///
    /// - [`UnlockError::EmptyInput`] if the passphrase has length 0 or 1;
    ///   the hasher is never invoked.
    /// - [`UnlockError::InvalidPassphrase`] if verification fails; the
    ///   vault stays locked.
    /// - [`UnlockError::Hasher`] if the stored hash is malformed.
    pub async fn attempt_unlock(
        &self,
        passphrase: &str,
        durable_hash: &str,
    ) -> Result<UnlockOutcome, UnlockError> {
        let _attempt = self.attempt.lock().await;

        if passphrase.chars().count() <= 1 {
            return Err(UnlockError::EmptyInput);
        }

        let pass = passphrase.to_owned();
        let hash = durable_hash.to_owned();
        let valid = tokio::task::spawn_blocking(move || passphrase::verify_durable(&pass, &hash))
            .await
            .map_err(|e| UnlockError::TaskFailed {
                reason: e.to_string(),
            })??;

        if !valid {
            info!("unlock attempt rejected: passphrase mismatch");
            return Err(UnlockError::InvalidPassphrase);
        }

        let fingerprint = passphrase::fingerprint_fast(passphrase);
        let fingerprint_persisted = match self
            .cache
            .put(FINGERPRINT_CACHE_KEY, fingerprint.as_bytes())
            .await
        {
            Ok(()) => true,
            Err(e) => {
                // Best-effort: durable verification already succeeded.
                warn!(%e, "failed to persist passphrase fingerprint");
                false
            }
        };

        *self.state.write().await = LockState::Unlocked;
        info!("vault unlocked");

        Ok(UnlockOutcome {
            fingerprint_persisted,
        })
    }

    /// Force the vault back to `Locked`. Idempotent — safe for any
    /// collaborator to call on user lock, app backgrounding, or session end.
    pub async fn set_locked(&self) {
        let mut state = self.state.write().await;
        if *state != LockState::Locked {
            info!("vault locked");
        }
        *state = LockState::Locked;
    }

    /// Fast secondary check of a passphrase against the cached fingerprint.
    ///
    /// Returns `Ok(false)` when no fingerprint has been cached yet. This
    /// check is a local convenience only — it must never authorize an
    /// unlock by itself.
    ///
    /// # Errors
    ///
    /// Returns [`FingerprintCacheError`] if the cache cannot be read or the
    /// cached value is corrupted.
    pub async fn cached_fingerprint_matches(
        &self,
        passphrase: &str,
    ) -> Result<bool, FingerprintCacheError> {
        let Some(bytes) = self.cache.get(FINGERPRINT_CACHE_KEY).await? else {
            return Ok(false);
        };
        let cached = String::from_utf8(bytes).map_err(|_| FingerprintCacheError::Corrupted)?;
        Ok(passphrase::fingerprint_matches(passphrase, &cached))
    }

    /// Remove the cached fingerprint (logout / session teardown).
    ///
    /// # Errors
    ///
    /// Returns [`FingerprintCacheError`] if the cache delete fails.
    pub async fn clear_cached_fingerprint(&self) -> Result<(), FingerprintCacheError> {
        self.cache.delete(FINGERPRINT_CACHE_KEY).await?;
        Ok(())
    }
}
