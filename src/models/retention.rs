//! Retention settings and the per-run removal decision.

use chrono::{Duration, NaiveDate};
use std::fmt;

/// Minimum spacing a backup must keep from the next older one to survive
/// the move from the daily tier into the weekly tier.
pub const WEEKLY_MIN_GAP_DAYS: i64 = 7;

/// Minimum spacing for the move from the weekly tier into the monthly tier.
pub const MONTHLY_MIN_GAP_DAYS: i64 = 30;

/// Default number of daily snapshots kept untouched.
pub const DEFAULT_DAILY_BACKUPS: usize = 7;

/// Default number of weekly snapshots kept before the monthly tier.
pub const DEFAULT_WEEKLY_BACKUPS: usize = 4;

/// Coarser tier a backup enters when it crosses a boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tier {
    Weekly,
    Monthly,
}

impl Tier {
    pub fn min_gap(self) -> Duration {
        match self {
            Tier::Weekly => Duration::days(WEEKLY_MIN_GAP_DAYS),
            Tier::Monthly => Duration::days(MONTHLY_MIN_GAP_DAYS),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Weekly => write!(f, "weekly"),
            Tier::Monthly => write!(f, "monthly"),
        }
    }
}

/// How many snapshots each fine-grained tier keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetentionConfig {
    pub daily_backups: usize,
    pub weekly_backups: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            daily_backups: DEFAULT_DAILY_BACKUPS,
            weekly_backups: DEFAULT_WEEKLY_BACKUPS,
        }
    }
}

impl RetentionConfig {
    pub fn new(daily_backups: usize, weekly_backups: usize) -> Self {
        Self {
            daily_backups,
            weekly_backups,
        }
    }

    /// Index where monthly-tier logic begins.
    pub fn monthly_offset(&self) -> usize {
        self.daily_backups.saturating_add(self.weekly_backups)
    }

    /// Tier boundaries in evaluation order: daily→weekly, then weekly→monthly.
    pub fn boundaries(&self) -> [(Tier, usize); 2] {
        [
            (Tier::Weekly, self.daily_backups),
            (Tier::Monthly, self.monthly_offset()),
        ]
    }
}

/// A backup found redundant at a tier boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Removal {
    pub identifier: String,
    pub date: NaiveDate,
    pub tier: Tier,
    /// Days between this backup and the next older one.
    pub gap_days: i64,
}

/// What a single run will delete (or only report, under dry-run).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemovalDecision {
    pub removals: Vec<Removal>,
    pub dry_run: bool,
}

impl RemovalDecision {
    pub fn is_empty(&self) -> bool {
        self.removals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.removals.len()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.removals.iter().map(|r| r.identifier.as_str())
    }
}
