use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::{Context, Result, anyhow};
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{info, trace, warn};

mod admission;
mod entry;
mod index;
mod maintenance;
mod request;
mod sniff;
mod store;

pub use admission::{SECURITY_KEY_HEADER, SECURITY_KEY_HEX_HEADER};
pub use entry::CacheEntry;
pub use maintenance::spawn_eviction_sweeper;
pub use request::{CacheRequest, CacheResponse};

use index::CacheIndex;
use store::ContentStore;

pub mod fuzzing {
    pub use super::sniff::PayloadKind;
}

const DB_FILE_NAME: &str = "request_cache.sqlite3";

/// Disk cache for HTTP response bodies, addressed by caller-chosen ids.
/// Payload bytes live in content-addressed files; an SQLite index maps each
/// id to its file together with the method, URI and last-use time of the
/// exchange that produced it. Clones share state.
#[derive(Clone)]
pub struct RequestCache {
    state: Arc<CacheState>,
}

struct CacheState {
    index: CacheIndex,
    store: ContentStore,
}

impl RequestCache {
    /// Opens the cache rooted at `root`, creating the directory tree and
    /// index database as needed. An index that cannot be opened is fatal
    /// here; past this point index trouble degrades to misses.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let store = ContentStore::new(root);
        let cache_dir = store.cache_dir();
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("failed to create cache dir {}", cache_dir.display()))?;
        let index = CacheIndex::open(&cache_dir.join(DB_FILE_NAME))?;
        Ok(Self {
            state: Arc::new(CacheState { index, store }),
        })
    }

    /// Saves a response body under `id`. Responses that fail admission are
    /// skipped, I/O trouble is swallowed after logging, and a token that
    /// fires mid-save aborts without an index row. Never fails the caller:
    /// saving is an optimization, not an obligation.
    pub async fn save(
        &self,
        request: &CacheRequest,
        response: &CacheResponse,
        id: &str,
        token: &CancellationToken,
    ) {
        if let Some(reason) = admission::save_skip_reason(request, response) {
            trace!(id = %id, reason = reason.label(), "not caching response");
            crate::metrics::record_cache_store_skipped(reason.label());
            return;
        }

        let relative_path = match self.state.store.store_payload(&response.body, token).await {
            Ok(Some(path)) => path,
            Ok(None) => return,
            Err(err) => {
                warn!(error = %err, id = %id, "failed to save cache payload");
                crate::metrics::record_cache_store_error();
                return;
            }
        };

        // The payload is on disk but not yet indexed. A token firing here
        // leaves the file behind; a later save of the same body adopts it.
        if token.is_cancelled() {
            return;
        }

        let entry = CacheEntry {
            id: id.to_string(),
            http_method: request.method.to_string(),
            request_uri: request::effective_uri(request, response),
            relative_path,
            usage_time: 0,
        };
        let index = self.state.index.clone();
        match task::spawn_blocking(move || index.upsert(&entry)).await {
            Ok(Ok(())) => {
                trace!(id = %id, "cached response");
                crate::metrics::record_cache_store();
            }
            Ok(Err(err)) => {
                warn!(error = %err, id = %id, "failed to index cached response");
                crate::metrics::record_cache_store_error();
            }
            Err(err) => {
                warn!(error = %err, "cache index task failed");
                crate::metrics::record_cache_store_error();
            }
        }
    }

    /// Looks up the body saved under `id` for this request. The row must
    /// match the request's method and URI as well as the id; anything else,
    /// including a missing or unreadable payload file, is a miss. Misses
    /// come back as an empty body, never as an error.
    pub async fn fetch(
        &self,
        request: &CacheRequest,
        id: &str,
        token: &CancellationToken,
    ) -> Vec<u8> {
        if token.is_cancelled() {
            return Vec::new();
        }

        let index = self.state.index.clone();
        let id_owned = id.to_string();
        let method = request.method.to_string();
        let uri = request::request_uri(request);
        let lookup = task::spawn_blocking(move || index.query(&id_owned, &method, &uri)).await;
        let entry = match lookup {
            Ok(Ok(Some(entry))) => entry,
            Ok(Ok(None)) => {
                trace!(id = %id, "cache miss");
                crate::metrics::record_cache_lookup(false);
                return Vec::new();
            }
            Ok(Err(err)) => {
                warn!(error = %err, id = %id, "cache index lookup failed");
                crate::metrics::record_cache_lookup(false);
                return Vec::new();
            }
            Err(err) => {
                warn!(error = %err, "cache index task failed");
                crate::metrics::record_cache_lookup(false);
                return Vec::new();
            }
        };

        let Some(bytes) = self.state.store.read_payload(&entry.relative_path).await else {
            crate::metrics::record_cache_lookup(false);
            return Vec::new();
        };

        // Bump the recency marker off the read path. The task carries the
        // caller's token so a cancelled fetch leaves the row untouched.
        let cache = self.clone();
        let touch_token = token.clone();
        let hit_id = entry.id;
        task::spawn(async move {
            cache.update_usage_time(&hit_id, &touch_token).await;
        });

        crate::metrics::record_cache_lookup(true);
        bytes
    }

    /// Marks the entry `id` as used now. Unlike `fetch` this needs no
    /// request context, and a missing row is a no-op.
    pub async fn update_usage_time(&self, id: &str, token: &CancellationToken) {
        if token.is_cancelled() {
            return;
        }
        let index = self.state.index.clone();
        let id_owned = id.to_string();
        let now = crate::util::now_ticks();
        match task::spawn_blocking(move || index.touch_usage(&id_owned, now)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(error = %err, id = %id, "failed to update cache usage time");
            }
            Err(err) => {
                warn!(error = %err, "cache index task failed");
            }
        }
    }

    /// Drops every entry and removes the payload directories wholesale.
    /// Returns the number of index rows removed. The index database itself
    /// stays in place.
    pub async fn delete_all(&self) -> Result<usize> {
        let index = self.state.index.clone();
        let removed = task::spawn_blocking(move || index.delete_all())
            .await
            .map_err(|err| anyhow!("cache index task failed: {err}"))??;
        self.state.store.remove_category_dirs().await;
        crate::metrics::record_cache_wipe(removed as u64);
        info!(removed, "request cache wiped");
        Ok(removed)
    }

    /// Removes entries whose last use predates `older_than`, then deletes
    /// their payload files one by one. Returns how many entries went away.
    pub async fn delete_older_than(&self, older_than: SystemTime) -> Result<usize> {
        let threshold = crate::util::ticks_at(older_than);
        let index = self.state.index.clone();
        let evicted = task::spawn_blocking(move || index.delete_older_than(threshold))
            .await
            .map_err(|err| anyhow!("cache index task failed: {err}"))??;
        for entry in &evicted {
            trace!(path = %entry.relative_path, "removing evicted cache file");
            self.state.store.remove_payload(&entry.relative_path).await;
        }
        crate::metrics::record_cache_evictions(evicted.len() as u64);
        Ok(evicted.len())
    }

    /// Row for `id`, regardless of method and URI.
    pub fn find_entry(&self, id: &str) -> Result<Option<CacheEntry>> {
        self.state.index.find_by_id(id)
    }

    pub fn entry_count(&self) -> Result<u64> {
        self.state.index.count()
    }
}
