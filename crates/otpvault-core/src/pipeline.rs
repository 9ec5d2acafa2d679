//! Vault record pipeline: decrypt, tokenize, sort, group.
//!
//! Takes the raw encrypted batch from the storage collaborator and produces
//! the grouped, display-ready mapping the UI consumes. Each record is
//! processed on its own task — decryption has no ordering dependency between
//! records — and the results are rejoined by input index before sorting, so
//! output is deterministic regardless of completion order.
//!
//! Partial failure is the norm, not the exception: a record with corrupted
//! ciphertext is excluded and reported in the accumulated failure list while
//! the rest of the batch still renders. The pipeline never writes to durable
//! storage, so an abandoned batch (caller navigated away and dropped the
//! future) cannot corrupt anything.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;
use tracing::warn;

use crate::crypto::{self, EncryptionKey};
use crate::error::RecordParseError;
use crate::record::{DecryptedCollectionItem, EncryptedCollectionRecord};
use crate::totp::{self, TokenType};

/// The result of parsing a batch of records.
#[derive(Debug, Default)]
pub struct ParsedCollections {
    /// Display buckets keyed by the uppercase first character of `issuer`
    /// (non-alphabetic leading characters keep their literal character).
    /// Items within a bucket are sorted case-insensitively by issuer.
    pub groups: BTreeMap<char, Vec<DecryptedCollectionItem>>,
    /// Records excluded from the output, with the reason for each.
    pub failures: Vec<RecordFailure>,
}

/// One excluded record.
#[derive(Debug)]
pub struct RecordFailure {
    /// Position of the record in the input batch.
    pub index: usize,
    /// Owner of the failed record (an opaque identifier, safe to log).
    pub owner_id: String,
    /// Why the record was excluded.
    pub error: RecordParseError,
}

/// Decrypt a batch of records and attach fresh tokens, using wall-clock time.
pub async fn parse_records(
    key: &EncryptionKey,
    records: Vec<EncryptedCollectionRecord>,
) -> ParsedCollections {
    parse_records_at(key, records, Utc::now()).await
}

/// Decrypt a batch of records and attach tokens computed at `now`.
///
/// Exposed separately so callers (and tests) can pin the timestamp; token
/// generation is a pure function of it.
pub async fn parse_records_at(
    key: &EncryptionKey,
    records: Vec<EncryptedCollectionRecord>,
    now: DateTime<Utc>,
) -> ParsedCollections {
    let owner_ids: Vec<String> = records.iter().map(|r| r.owner_id.clone()).collect();

    let mut tasks = JoinSet::new();
    for (index, record) in records.into_iter().enumerate() {
        let key = key.clone();
        tasks.spawn(async move { (index, decrypt_record(&key, &record, now)) });
    }

    let mut slots: Vec<Option<Result<DecryptedCollectionItem, RecordParseError>>> =
        (0..owner_ids.len()).map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        if let Ok((index, result)) = joined {
            slots[index] = Some(result);
        }
        // A join error means the task itself died; the slot stays empty and
        // is reported below against its input index.
    }

    let mut items = Vec::new();
    let mut failures = Vec::new();
    for (index, slot) in slots.into_iter().enumerate() {
        match slot {
            Some(Ok(item)) => items.push(item),
            Some(Err(error)) => {
                warn!(index, owner_id = %owner_ids[index], %error, "excluding record from batch");
                failures.push(RecordFailure {
                    index,
                    owner_id: owner_ids[index].clone(),
                    error,
                });
            }
            None => {
                warn!(index, owner_id = %owner_ids[index], "record task died");
                failures.push(RecordFailure {
                    index,
                    owner_id: owner_ids[index].clone(),
                    error: RecordParseError::TaskFailed,
                });
            }
        }
    }

    // Sort and group only after every decryption task has completed.
    items.sort_by(|a, b| a.issuer.to_uppercase().cmp(&b.issuer.to_uppercase()));

    let mut groups: BTreeMap<char, Vec<DecryptedCollectionItem>> = BTreeMap::new();
    for item in items {
        let Some(first) = item.issuer.chars().next() else {
            // Unreachable: empty issuers are rejected during decryption.
            continue;
        };
        let bucket = first.to_uppercase().next().unwrap_or(first);
        groups.entry(bucket).or_default().push(item);
    }

    ParsedCollections { groups, failures }
}

/// Decrypt all four sensitive fields of one record and compute its token.
fn decrypt_record(
    key: &EncryptionKey,
    record: &EncryptedCollectionRecord,
    now: DateTime<Utc>,
) -> Result<DecryptedCollectionItem, RecordParseError> {
    if record.token_type == TokenType::Hotp {
        return Err(RecordParseError::UnsupportedTokenType {
            token_type: record.token_type.to_string(),
        });
    }

    let issuer = decrypt_nonempty(key, &record.issuer, "issuer")?;
    let account_label = decrypt_nonempty(key, &record.account_label, "account_label")?;
    let secret_key = decrypt_nonempty(key, &record.secret_key, "secret_key")?;
    let backup_code = decrypt_nonempty(key, &record.backup_code, "backup_code")?;

    let token = totp::generate_totp(
        &secret_key,
        record.algorithm,
        record.digits,
        record.period_seconds,
        now.timestamp(),
    )?;
    let token_expires_at = totp::token_expires_at(record.period_seconds, now);

    Ok(DecryptedCollectionItem {
        owner_id: record.owner_id.clone(),
        issuer,
        account_label,
        secret_key,
        backup_code,
        algorithm: record.algorithm,
        digits: record.digits,
        period_seconds: record.period_seconds,
        token_type: record.token_type,
        token,
        token_expires_at,
    })
}

fn decrypt_nonempty(
    key: &EncryptionKey,
    ciphertext: &str,
    field: &'static str,
) -> Result<String, RecordParseError> {
    let plaintext = crypto::decrypt_field(key, ciphertext)
        .map_err(|source| RecordParseError::Decrypt { field, source })?;
    if plaintext.is_empty() {
        return Err(RecordParseError::EmptyField { field });
    }
    Ok(plaintext)
}
