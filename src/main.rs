use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod models;
mod services;
mod storage;

use config::{AppConfig, Args, Backend};
use services::rotation_service::RotationService;
use storage::{ObjectStore, fs_store::FsStore, s3_store::S3Store};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // --- Logging setup ---
    let filter = match args.verbosity {
        Some(level) => EnvFilter::new(level.as_filter()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // --- Resolve config before touching storage ---
    let cfg = AppConfig::from_env_and_args(args).context("invalid configuration")?;
    tracing::debug!("Starting backup rotation with config: {:?}", cfg);

    // --- Storage collaborator ---
    let store: Arc<dyn ObjectStore> = match cfg.backend {
        Backend::S3 => Arc::new(
            S3Store::connect(&cfg.s3)
                .with_context(|| format!("configuring S3 client for bucket `{}`", cfg.bucket))?,
        ),
        Backend::Fs => Arc::new(FsStore::new(&cfg.storage_dir)),
    };

    // --- Rotate ---
    let report = RotationService::new(store, cfg.job())
        .run()
        .await
        .with_context(|| format!("rotating backups in bucket `{}`", cfg.bucket))?;

    tracing::info!(
        scanned = report.scanned,
        backups = report.catalog_len,
        planned = report.decision.len(),
        deleted = report.deleted.len(),
        dry_run = cfg.dry_run,
        "Rotation complete"
    );

    Ok(())
}
