//! RFC 6238 time-based one-time password generation.
//!
//! Token computation is a pure function of
//! `(secret, algorithm, digits, period, time)` — no hidden state, fully
//! deterministic, unit-testable by fixing the timestamp. The generator never
//! suspends; it is always cheap enough to run inline.
//!
//! HOTP (the counter-based variant) exists as a declared [`TokenType`] on
//! stored records but is not implemented here.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use data_encoding::{BASE32, BASE32_NOPAD};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::error::TotpError;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

/// HMAC algorithms supported by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TotpAlgorithm {
    #[serde(rename = "SHA1")]
    Sha1,
    #[serde(rename = "SHA256")]
    Sha256,
    #[serde(rename = "SHA512")]
    Sha512,
}

impl fmt::Display for TotpAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1 => write!(f, "SHA1"),
            Self::Sha256 => write!(f, "SHA256"),
            Self::Sha512 => write!(f, "SHA512"),
        }
    }
}

impl FromStr for TotpAlgorithm {
    type Err = TotpError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            other => Err(TotpError::UnsupportedAlgorithm {
                name: other.to_owned(),
            }),
        }
    }
}

/// Token family declared on a stored record.
///
/// `Hotp` is a recognized variant so records carrying it deserialize
/// cleanly, but the generator does not implement it — the pipeline excludes
/// such records with an explicit error instead of rendering a wrong code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    #[serde(rename = "TOTP")]
    Totp,
    #[serde(rename = "HOTP")]
    Hotp,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Totp => write!(f, "TOTP"),
            Self::Hotp => write!(f, "HOTP"),
        }
    }
}

/// Generate an N-digit TOTP code for the given unix timestamp.
///
/// Implements the standard algorithm: time counter, HMAC over its 8-byte
/// big-endian encoding keyed by the base32-decoded seed, dynamic truncation
/// to a 31-bit integer, reduction modulo `10^digits`, zero-padded to exactly
/// `digits` characters. Any digit count from 1 to 19 works generically via
/// the modulo — there is no silent truncation to 6.
///
/// # Errors
///
/// - [`TotpError::InvalidPeriod`] if `period_seconds` is 0.
/// - [`TotpError::InvalidDigits`] if `digits` is 0 or above 19.
/// - [`TotpError::InvalidSecret`] if the seed is not valid base32 or decodes
///   to nothing.
pub fn generate_totp(
    secret_base32: &str,
    algorithm: TotpAlgorithm,
    digits: u32,
    period_seconds: u64,
    unix_time: i64,
) -> Result<String, TotpError> {
    if period_seconds == 0 {
        return Err(TotpError::InvalidPeriod);
    }
    let modulus = modulus_for(digits)?;
    let secret = decode_secret(secret_base32)?;

    let counter = u64::try_from(unix_time).unwrap_or(0) / period_seconds;
    let counter_bytes = counter.to_be_bytes();

    let invalid_secret = || TotpError::InvalidSecret {
        reason: "secret rejected by HMAC".to_owned(),
    };
    let digest = match algorithm {
        TotpAlgorithm::Sha1 => {
            let mut mac = HmacSha1::new_from_slice(&secret).map_err(|_| invalid_secret())?;
            mac.update(&counter_bytes);
            mac.finalize().into_bytes().to_vec()
        }
        TotpAlgorithm::Sha256 => {
            let mut mac = HmacSha256::new_from_slice(&secret).map_err(|_| invalid_secret())?;
            mac.update(&counter_bytes);
            mac.finalize().into_bytes().to_vec()
        }
        TotpAlgorithm::Sha512 => {
            let mut mac = HmacSha512::new_from_slice(&secret).map_err(|_| invalid_secret())?;
            mac.update(&counter_bytes);
            mac.finalize().into_bytes().to_vec()
        }
    };

    // Dynamic truncation (RFC 4226 §5.3): low 4 bits of the last byte pick
    // the offset, 4 bytes from there form a 31-bit integer.
    let offset = usize::from(digest[digest.len() - 1] & 0x0f);
    let binary = (u32::from(digest[offset] & 0x7f) << 24)
        | (u32::from(digest[offset + 1]) << 16)
        | (u32::from(digest[offset + 2]) << 8)
        | u32::from(digest[offset + 3]);

    let code = u64::from(binary) % modulus;
    let width = digits as usize;
    Ok(format!("{code:0width$}"))
}

/// Seconds until the current code rotates.
#[must_use]
pub fn seconds_remaining(period_seconds: u64, unix_time: i64) -> u64 {
    if period_seconds == 0 {
        return 0;
    }
    let elapsed = u64::try_from(unix_time).unwrap_or(0) % period_seconds;
    period_seconds - elapsed
}

/// The wall-clock instant at which the current time-step bucket ends.
#[must_use]
pub fn token_expires_at(period_seconds: u64, now: DateTime<Utc>) -> DateTime<Utc> {
    if period_seconds == 0 {
        return now;
    }
    let ts = u64::try_from(now.timestamp()).unwrap_or(0);
    let bucket_end = (ts / period_seconds + 1).saturating_mul(period_seconds);
    i64::try_from(bucket_end)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or(now)
}

fn modulus_for(digits: u32) -> Result<u64, TotpError> {
    if digits == 0 {
        return Err(TotpError::InvalidDigits { digits });
    }
    10u64
        .checked_pow(digits)
        .ok_or(TotpError::InvalidDigits { digits })
}

/// Decode a base32 seed, accepting both padded and unpadded forms as well
/// as the space/dash grouping some issuers display.
fn decode_secret(secret_base32: &str) -> Result<Vec<u8>, TotpError> {
    let normalized = secret_base32
        .trim()
        .replace([' ', '-'], "")
        .to_ascii_uppercase();

    if normalized.is_empty() {
        return Err(TotpError::InvalidSecret {
            reason: "secret is empty".to_owned(),
        });
    }

    let decoded = BASE32_NOPAD
        .decode(normalized.as_bytes())
        .or_else(|_| BASE32.decode(normalized.as_bytes()))
        .map_err(|_| TotpError::InvalidSecret {
            reason: "secret is not valid base32".to_owned(),
        })?;

    if decoded.is_empty() {
        return Err(TotpError::InvalidSecret {
            reason: "secret decodes to empty bytes".to_owned(),
        });
    }

    Ok(decoded)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // RFC 6238 appendix B seeds: the ASCII digits repeated to the natural
    // key length of each algorithm.
    fn rfc_seed(len: usize) -> String {
        let ascii: Vec<u8> = b"1234567890".iter().copied().cycle().take(len).collect();
        BASE32_NOPAD.encode(&ascii)
    }

    #[test]
    fn rfc6238_sha1_vectors() {
        let secret = rfc_seed(20);
        let cases = [
            (59, "94287082"),
            (1_111_111_109, "07081804"),
            (1_111_111_111, "14050471"),
            (1_234_567_890, "89005924"),
            (2_000_000_000, "69279037"),
            (20_000_000_000, "65353130"),
        ];
        for (time, expected) in cases {
            assert_eq!(
                generate_totp(&secret, TotpAlgorithm::Sha1, 8, 30, time).unwrap(),
                expected,
                "SHA1 at t={time}"
            );
        }
    }

    #[test]
    fn rfc6238_sha256_vectors() {
        let secret = rfc_seed(32);
        let cases = [
            (59, "46119246"),
            (1_111_111_109, "68084774"),
            (2_000_000_000, "90698825"),
        ];
        for (time, expected) in cases {
            assert_eq!(
                generate_totp(&secret, TotpAlgorithm::Sha256, 8, 30, time).unwrap(),
                expected,
                "SHA256 at t={time}"
            );
        }
    }

    #[test]
    fn rfc6238_sha512_vectors() {
        let secret = rfc_seed(64);
        let cases = [
            (59, "90693936"),
            (1_111_111_109, "25091201"),
            (2_000_000_000, "38618901"),
        ];
        for (time, expected) in cases {
            assert_eq!(
                generate_totp(&secret, TotpAlgorithm::Sha512, 8, 30, time).unwrap(),
                expected,
                "SHA512 at t={time}"
            );
        }
    }

    #[test]
    fn deterministic_for_fixed_time() {
        let secret = rfc_seed(20);
        let a = generate_totp(&secret, TotpAlgorithm::Sha1, 6, 30, 1_700_000_000).unwrap();
        let b = generate_totp(&secret, TotpAlgorithm::Sha1, 6, 30, 1_700_000_000).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn stable_within_bucket_changes_across_boundary() {
        let secret = rfc_seed(20);
        // 1_700_000_010 and 1_700_000_029 share the bucket starting at
        // 1_700_000_010 (counter 56_666_667); 1_700_000_030 starts the next.
        let within_a = generate_totp(&secret, TotpAlgorithm::Sha1, 6, 30, 1_700_000_010).unwrap();
        let within_b = generate_totp(&secret, TotpAlgorithm::Sha1, 6, 30, 1_700_000_029).unwrap();
        let next = generate_totp(&secret, TotpAlgorithm::Sha1, 6, 30, 1_700_000_030).unwrap();
        assert_eq!(within_a, within_b);
        assert_ne!(within_a, next);
    }

    #[test]
    fn uncommon_digit_counts_work_via_modulo() {
        let secret = rfc_seed(20);
        let five = generate_totp(&secret, TotpAlgorithm::Sha1, 5, 30, 59).unwrap();
        let ten = generate_totp(&secret, TotpAlgorithm::Sha1, 10, 30, 59).unwrap();
        assert_eq!(five.len(), 5);
        assert_eq!(ten.len(), 10);
        // The 8-digit RFC vector is the low 8 digits of the same 31-bit value.
        assert_eq!(five, "87082");
    }

    #[test]
    fn leading_zeros_are_preserved() {
        let secret = rfc_seed(20);
        // SHA1 vector at t=1111111109 is 07081804 — confirms zero padding.
        let code = generate_totp(&secret, TotpAlgorithm::Sha1, 8, 30, 1_111_111_109).unwrap();
        assert!(code.starts_with('0'));
    }

    #[test]
    fn zero_digits_rejected() {
        let result = generate_totp(&rfc_seed(20), TotpAlgorithm::Sha1, 0, 30, 59);
        assert!(matches!(result, Err(TotpError::InvalidDigits { digits: 0 })));
    }

    #[test]
    fn oversized_digits_rejected() {
        let result = generate_totp(&rfc_seed(20), TotpAlgorithm::Sha1, 20, 30, 59);
        assert!(matches!(result, Err(TotpError::InvalidDigits { .. })));
    }

    #[test]
    fn zero_period_rejected() {
        let result = generate_totp(&rfc_seed(20), TotpAlgorithm::Sha1, 6, 0, 59);
        assert!(matches!(result, Err(TotpError::InvalidPeriod)));
    }

    #[test]
    fn garbage_secret_rejected() {
        let result = generate_totp("not!base32!!", TotpAlgorithm::Sha1, 6, 30, 59);
        assert!(matches!(result, Err(TotpError::InvalidSecret { .. })));
    }

    #[test]
    fn empty_secret_rejected() {
        let result = generate_totp("   ", TotpAlgorithm::Sha1, 6, 30, 59);
        assert!(matches!(result, Err(TotpError::InvalidSecret { .. })));
    }

    #[test]
    fn padded_and_grouped_secrets_accepted() {
        let canonical = generate_totp("JBSWY3DPEHPK3PXP", TotpAlgorithm::Sha1, 6, 30, 59).unwrap();
        let grouped = generate_totp("jbsw y3dp-ehpk 3pxp", TotpAlgorithm::Sha1, 6, 30, 59).unwrap();
        assert_eq!(canonical, grouped);
    }

    #[test]
    fn algorithm_parsing() {
        assert_eq!(
            "sha256".parse::<TotpAlgorithm>().unwrap(),
            TotpAlgorithm::Sha256
        );
        assert_eq!(
            "SHA512".parse::<TotpAlgorithm>().unwrap(),
            TotpAlgorithm::Sha512
        );
        assert!(matches!(
            "md5".parse::<TotpAlgorithm>(),
            Err(TotpError::UnsupportedAlgorithm { .. })
        ));
    }

    #[test]
    fn seconds_remaining_at_boundaries() {
        assert_eq!(seconds_remaining(30, 59), 1);
        assert_eq!(seconds_remaining(30, 60), 30);
        assert_eq!(seconds_remaining(30, 0), 30);
        assert_eq!(seconds_remaining(0, 59), 0);
    }

    #[test]
    fn expiry_is_end_of_current_bucket() {
        let now = DateTime::from_timestamp(59, 0).unwrap();
        let expires = token_expires_at(30, now);
        assert_eq!(expires.timestamp(), 60);

        let now = DateTime::from_timestamp(60, 0).unwrap();
        assert_eq!(token_expires_at(30, now).timestamp(), 90);
    }
}
