use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::RequestCache;

/// Spawns a task that evicts entries unused for longer than `max_age`,
/// once per `interval`. The first sweep runs a full interval after spawn.
/// The task exits when the token fires; a zero interval never sweeps.
pub fn spawn_eviction_sweeper(
    cache: RequestCache,
    interval: Duration,
    max_age: Duration,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if interval.is_zero() {
            return;
        }
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = ticker.tick() => {}
            }
            let cutoff = SystemTime::now()
                .checked_sub(max_age)
                .unwrap_or(SystemTime::UNIX_EPOCH);
            match cache.delete_older_than(cutoff).await {
                Ok(removed) => {
                    crate::metrics::record_cache_sweep_run();
                    if removed > 0 {
                        debug!(removed, "cache sweep evicted entries");
                    }
                }
                Err(err) => {
                    warn!(error = %err, "cache sweep failed");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheRequest, CacheResponse};

    use anyhow::Result;
    use http::{HeaderMap, Method, StatusCode};
    use tempfile::TempDir;

    async fn save_body(cache: &RequestCache, uri: &str, id: &str) {
        let request = CacheRequest {
            method: Method::GET,
            uri: Some(uri.parse().expect("valid uri")),
            headers: HeaderMap::new(),
        };
        let response = CacheResponse {
            status: StatusCode::OK,
            final_uri: None,
            body: format!("body of {id}").into_bytes(),
        };
        cache
            .save(&request, &response, id, &CancellationToken::new())
            .await;
    }

    #[tokio::test]
    async fn sweeper_evicts_stale_entries_and_spares_fresh_ones() -> Result<()> {
        let dir = TempDir::new()?;
        let cache = RequestCache::open(dir.path())?;

        save_body(&cache, "https://example.com/stale", "stale").await;
        save_body(&cache, "https://example.com/fresh", "fresh").await;
        // One entry stuck in 1970, one touched just now.
        cache.state.index.touch_usage("stale", 10)?;
        cache
            .update_usage_time("fresh", &CancellationToken::new())
            .await;
        let stale_path = cache.find_entry("stale")?.expect("row").relative_path;

        let token = CancellationToken::new();
        let handle = spawn_eviction_sweeper(
            cache.clone(),
            Duration::from_millis(20),
            Duration::from_secs(3600),
            token.clone(),
        );

        let mut evicted = false;
        for _ in 0..100 {
            if cache.find_entry("stale")?.is_none() {
                evicted = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        token.cancel();
        handle.await.expect("sweeper task");

        assert!(evicted, "stale entry should be swept");
        assert!(!dir.path().join(stale_path).exists());
        assert!(cache.find_entry("fresh")?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn sweeper_exits_when_the_token_fires() -> Result<()> {
        let dir = TempDir::new()?;
        let cache = RequestCache::open(dir.path())?;

        let token = CancellationToken::new();
        let handle = spawn_eviction_sweeper(
            cache,
            Duration::from_secs(3600),
            Duration::from_secs(3600),
            token.clone(),
        );
        token.cancel();
        handle.await.expect("sweeper task");
        Ok(())
    }
}
