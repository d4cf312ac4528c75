//! Represents a dated backup archive discovered in a bucket listing.

use chrono::NaiveDate;
use std::ops::Deref;

/// A single backup object whose key encodes its calendar date.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackupRecord {
    /// Full object key (unique within a catalog).
    pub identifier: String,

    /// Date encoded in the key. Time of day is never parsed.
    pub date: NaiveDate,
}

impl BackupRecord {
    pub fn new(identifier: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            identifier: identifier.into(),
            date,
        }
    }
}

/// Backups ordered newest first (index 0 is the most recent).
///
/// Immutable once built: the policy engine reads it and computes a removal
/// set instead of splicing records out.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    records: Vec<BackupRecord>,
}

impl Catalog {
    /// Sort `records` by date descending and wrap them. The sort is stable,
    /// so records sharing a date keep their relative input order.
    pub fn from_unsorted(mut records: Vec<BackupRecord>) -> Self {
        records.sort_by(|a, b| b.date.cmp(&a.date));
        Self { records }
    }
}

impl Deref for Catalog {
    type Target = [BackupRecord];

    fn deref(&self) -> &Self::Target {
        &self.records
    }
}
