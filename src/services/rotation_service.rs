//! RotationService: one rotation pass against a bucket.
//!
//! List every key under the prefix, build the catalog, plan removals, then
//! delete (or only report, under dry-run). Nothing is kept between runs; the
//! bucket listing is the only state.

use crate::{
    models::{
        backup::Catalog,
        retention::{RemovalDecision, RetentionConfig},
    },
    services::{catalog_service::build_catalog, policy_service::plan_removals},
    storage::{ObjectStore, StorageResult},
};
use std::sync::Arc;
use tracing::{debug, info};

/// Everything that identifies one rotation run.
#[derive(Clone, Debug)]
pub struct RotationJob {
    pub bucket: String,
    pub prefix: String,
    pub extension: String,
    pub retention: RetentionConfig,
    pub dry_run: bool,
}

/// Outcome of a completed run.
#[derive(Debug)]
pub struct RotationReport {
    /// Keys returned by the listing, before filtering.
    pub scanned: usize,
    /// Keys that parsed as dated backups.
    pub catalog_len: usize,
    pub decision: RemovalDecision,
    /// Keys actually deleted. Always empty under dry-run.
    pub deleted: Vec<String>,
}

#[derive(Clone)]
pub struct RotationService {
    store: Arc<dyn ObjectStore>,
    job: RotationJob,
}

impl RotationService {
    pub fn new(store: Arc<dyn ObjectStore>, job: RotationJob) -> Self {
        Self { store, job }
    }

    /// Fetch the current catalog for this job's bucket and prefix.
    pub async fn catalog(&self) -> StorageResult<(usize, Catalog)> {
        let keys = self
            .store
            .list_objects(&self.job.bucket, &self.job.prefix)
            .await?;
        let catalog = build_catalog(&keys, &self.job.prefix, &self.job.extension);
        Ok((keys.len(), catalog))
    }

    /// Run one rotation pass. The first failed delete aborts the run.
    pub async fn run(&self) -> StorageResult<RotationReport> {
        let job = &self.job;
        if job.dry_run {
            info!("Dry run, backups will not actually be rotated or deleted");
        }

        let (scanned, catalog) = self.catalog().await?;
        debug!(
            "Number of backups: {} ({} keys listed from {}/{})",
            catalog.len(),
            scanned,
            self.store.describe(),
            job.bucket
        );

        let decision = plan_removals(&catalog, &job.retention, job.dry_run);
        if decision.is_empty() {
            debug!("nothing to rotate");
        }

        let mut deleted = Vec::new();
        for removal in &decision.removals {
            info!(
                key = %removal.identifier,
                tier = %removal.tier,
                gap_days = removal.gap_days,
                "rotating out backup"
            );
            if job.dry_run {
                continue;
            }
            self.store
                .delete_object(&job.bucket, &removal.identifier)
                .await?;
            deleted.push(removal.identifier.clone());
        }

        Ok(RotationReport {
            scanned,
            catalog_len: catalog.len(),
            decision,
            deleted,
        })
    }
}
