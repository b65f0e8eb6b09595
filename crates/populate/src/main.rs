//! RoastingReels populate command
//!
//! Imports the metadata provider's popular movies into the database.
//! Safe to re-run: titles already stored are skipped.

use anyhow::Context;
use roastingreels_common::{
    config::AppConfig,
    db::{DbPool, Repository},
    metadata::TmdbClient,
    sync::{MovieSync, SyncReport},
    VERSION,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level)),
        )
        .with_target(true)
        .init();

    info!("Starting RoastingReels populate v{}", VERSION);

    let db = DbPool::new(&config.database).await?;
    if config.database.run_migrations {
        db.run_migrations().await?;
    }

    let provider = TmdbClient::from_config(&config.metadata, &config.tls)
        .context("Failed to build metadata client")?;
    let sync = MovieSync::new(Arc::new(provider), Arc::new(Repository::new(db)));

    let report = sync.fetch_and_store_popular().await?;
    println!("{}", report);

    match report {
        SyncReport::Stored { stored, skipped } => {
            info!(stored, skipped, "Populate finished");
            Ok(())
        }
        SyncReport::Failed { reason } => anyhow::bail!("popular movie import failed: {}", reason),
    }
}
