//! Core library for `otpvault`.
//!
//! A personal secrets vault for TOTP seeds: stored records stay encrypted at
//! rest, live authentication codes are derived on demand, and everything is
//! gated behind a local passphrase lock that is independent of the remote
//! account password.
//!
//! The crate covers the vault cryptography and token pipeline — field
//! decryption, RFC 6238 token generation, passphrase hashing, and the
//! lock/unlock flow. The remote auth provider, UI rendering, and network
//! plumbing are external collaborators: key material and durable hashes
//! arrive as explicit inputs, never from ambient state.

pub mod crypto;
pub mod error;
pub mod lock;
pub mod passphrase;
pub mod pipeline;
pub mod record;
pub mod totp;
