pub mod cache;
pub mod cli;
pub mod logging;
pub mod metrics;
pub mod settings;
pub mod util;

use std::time::{Duration, SystemTime};

use anyhow::{Context, Result, anyhow, ensure};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::Command;
use crate::settings::Settings;

pub use crate::cache::{CacheEntry, CacheRequest, CacheResponse, RequestCache};

pub async fn run(settings: Settings, command: Command) -> Result<()> {
    let cache = RequestCache::open(&settings.cache_dir)?;
    match command {
        Command::Stats => {
            let stats = json!({
                "cache_dir": settings.cache_dir.display().to_string(),
                "entries": cache.entry_count()?,
            });
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Wipe => {
            let removed = cache.delete_all().await?;
            println!("{removed}");
        }
        Command::Evict { older_than_secs } => {
            let cutoff = SystemTime::now()
                .checked_sub(Duration::from_secs(older_than_secs))
                .unwrap_or(SystemTime::UNIX_EPOCH);
            let removed = cache.delete_older_than(cutoff).await?;
            info!(removed, older_than_secs, "eviction finished");
            println!("{removed}");
        }
        Command::Sweep {
            interval_secs,
            max_age_secs,
        } => {
            ensure!(interval_secs > 0, "interval_secs must be greater than 0");
            let token = CancellationToken::new();
            let handle = cache::spawn_eviction_sweeper(
                cache,
                Duration::from_secs(interval_secs),
                Duration::from_secs(max_age_secs),
                token.clone(),
            );
            info!(interval_secs, max_age_secs, "eviction sweeper running");
            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for shutdown signal")?;
            info!("shutting down sweeper");
            token.cancel();
            handle
                .await
                .map_err(|err| anyhow!("sweeper task failed: {err}"))?;
        }
    }
    Ok(())
}
