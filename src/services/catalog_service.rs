//! Builds a date-sorted `Catalog` from raw object keys.
//!
//! Keys follow `<prefix>-YYYYMMDD-<free text><extension>`. The free text is
//! usually a time of day or a hash and is never interpreted. Keys that do
//! not fit are skipped, never fatal.

use crate::models::backup::{BackupRecord, Catalog};
use chrono::NaiveDate;
use std::collections::HashSet;
use thiserror::Error;
use tracing::trace;

const DATE_DIGITS: usize = 8;

/// Why a listed key was left out of the catalog.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeySkip {
    #[error("key does not start with the backup prefix")]
    PrefixMismatch,
    #[error("expected 8 date digits after the prefix")]
    MissingDate,
    #[error("expected `-` after the date digits")]
    MissingSeparator,
    #[error("key does not end with the backup extension")]
    ExtensionMismatch,
    #[error("{year:04}-{month:02}-{day:02} is not a calendar date")]
    InvalidDate { year: i32, month: u32, day: u32 },
}

/// Parse one key into a dated record.
pub fn parse_backup_key(
    key: &str,
    prefix: &str,
    extension: &str,
) -> Result<BackupRecord, KeySkip> {
    let rest = key
        .strip_prefix(prefix)
        .and_then(|r| r.strip_prefix('-'))
        .ok_or(KeySkip::PrefixMismatch)?;

    let (digits, rest) = rest
        .split_at_checked(DATE_DIGITS)
        .ok_or(KeySkip::MissingDate)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(KeySkip::MissingDate);
    }

    let tail = rest.strip_prefix('-').ok_or(KeySkip::MissingSeparator)?;
    if !tail.ends_with(extension) {
        return Err(KeySkip::ExtensionMismatch);
    }

    let year: i32 = digits[0..4].parse().map_err(|_| KeySkip::MissingDate)?;
    let month: u32 = digits[4..6].parse().map_err(|_| KeySkip::MissingDate)?;
    let day: u32 = digits[6..8].parse().map_err(|_| KeySkip::MissingDate)?;
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or(KeySkip::InvalidDate { year, month, day })?;

    Ok(BackupRecord::new(key, date))
}

/// Scan `keys` once, keep the ones that parse, then sort newest first.
///
/// Duplicate keys keep their first occurrence. Backups sharing a date stay
/// in listing order.
pub fn build_catalog<I, S>(keys: I, prefix: &str, extension: &str) -> Catalog
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for key in keys {
        let key = key.as_ref();
        match parse_backup_key(key, prefix, extension) {
            Ok(record) => {
                if seen.insert(record.identifier.clone()) {
                    records.push(record);
                } else {
                    trace!("skipping duplicate key {}", key);
                }
            }
            Err(reason) => trace!("skipping {}: {}", key, reason),
        }
    }

    Catalog::from_unsorted(records)
}
