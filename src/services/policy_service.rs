//! Grandfather-father-son rotation policy.
//!
//! The newest `daily_backups` records are never touched. At each tier
//! boundary the record sitting on the boundary is compared with the next
//! older one; if the two are closer than the tier's minimum gap the boundary
//! record is redundant. One check per boundary per run, so repeated runs
//! converge on the target spacing one deletion at a time.
//!
//! Boundaries are evaluated against a working view of the catalog. On a real
//! run a record removed at the daily→weekly boundary leaves the view, so the
//! weekly→monthly check sees the shifted indices the delete produces. A dry
//! run deletes nothing and therefore checks both boundaries unshifted.

use crate::models::{
    backup::{BackupRecord, Catalog},
    retention::{Removal, RemovalDecision, RetentionConfig, Tier},
};

/// Decide which backups become redundant this run. Pure: the catalog is
/// only read, and the same inputs always yield the same decision.
pub fn plan_removals(
    catalog: &Catalog,
    config: &RetentionConfig,
    dry_run: bool,
) -> RemovalDecision {
    let mut working: Vec<&BackupRecord> = catalog.iter().collect();
    let mut removals: Vec<Removal> = Vec::new();

    for (tier, index) in config.boundaries() {
        let Some(removal) = check_boundary(&working, index, tier) else {
            continue;
        };
        // Unshifted dry runs can land both boundaries on the same record.
        if removals.iter().any(|r| r.identifier == removal.identifier) {
            continue;
        }
        if !dry_run {
            working.remove(index);
        }
        removals.push(removal);
    }

    RemovalDecision { removals, dry_run }
}

/// Compare `records[index]` with its older neighbour. Catalogs too short to
/// have both are left alone.
fn check_boundary(records: &[&BackupRecord], index: usize, tier: Tier) -> Option<Removal> {
    let current = records.get(index)?;
    let next = records.get(index.checked_add(1)?)?;
    let gap = current.date - next.date;
    if gap >= tier.min_gap() {
        return None;
    }
    Some(Removal {
        identifier: current.identifier.clone(),
        date: current.date,
        tier,
        gap_days: gap.num_days(),
    })
}
