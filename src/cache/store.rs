use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha384};
use tokio::fs as async_fs;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::sniff::PayloadKind;

/// Directory under the cache root that holds everything this crate owns.
pub(super) const CACHE_DIR_NAME: &str = "Http";
const IMAGES_DIR: &str = "Images";
const BINARIES_DIR: &str = "Binaries";

/// Content-addressed payload files on disk. Payloads are named by the
/// SHA-384 of their bytes and sharded two levels deep, so the same body
/// stored under many ids occupies one file.
#[derive(Debug, Clone)]
pub(super) struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    pub(super) fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub(super) fn cache_dir(&self) -> PathBuf {
        self.root.join(CACHE_DIR_NAME)
    }

    /// Relative paths are stored with forward slashes; `Path::join` maps
    /// them onto the platform separator.
    pub(super) fn absolute_path(&self, relative_path: &str) -> PathBuf {
        self.root.join(relative_path)
    }

    /// Writes `bytes` to its content-addressed location and returns the
    /// relative path to record in the index. Returns `Ok(None)` when the
    /// token fired first; a partially written file is removed on the way
    /// out. An existing file of the same length is left untouched.
    pub(super) async fn store_payload(
        &self,
        bytes: &[u8],
        token: &CancellationToken,
    ) -> Result<Option<String>> {
        if token.is_cancelled() {
            return Ok(None);
        }

        let hash = hex::encode(Sha384::digest(bytes));
        let kind = PayloadKind::sniff(bytes);
        let category = if kind.is_image() {
            IMAGES_DIR
        } else {
            BINARIES_DIR
        };
        let (first, remainder) = hash.split_at(2);
        let (second, _) = remainder.split_at(2);
        let relative_path = format!(
            "{CACHE_DIR_NAME}/{category}/{first}/{second}/{hash}{ext}",
            ext = kind.extension()
        );
        let path = self.absolute_path(&relative_path);

        match async_fs::metadata(&path).await {
            // Same hash, same length: nothing to do.
            Ok(meta) if meta.len() == bytes.len() as u64 => return Ok(Some(relative_path)),
            Ok(_) => {
                async_fs::remove_file(&path).await.with_context(|| {
                    format!("failed to replace cache payload {}", path.display())
                })?;
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to stat cache payload {}", path.display()));
            }
        }

        if let Some(parent) = path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create cache shard {}", parent.display()))?;
        }

        tokio::select! {
            _ = token.cancelled() => {
                let _ = async_fs::remove_file(&path).await;
                return Ok(None);
            }
            result = async_fs::write(&path, bytes) => {
                if let Err(err) = result {
                    let _ = async_fs::remove_file(&path).await;
                    return Err(err).with_context(|| {
                        format!("failed to write cache payload {}", path.display())
                    });
                }
            }
        }
        if token.is_cancelled() {
            let _ = async_fs::remove_file(&path).await;
            return Ok(None);
        }

        Ok(Some(relative_path))
    }

    /// Reads a payload back; every failure is a miss.
    pub(super) async fn read_payload(&self, relative_path: &str) -> Option<Vec<u8>> {
        let path = self.absolute_path(relative_path);
        match async_fs::read(&path).await {
            Ok(bytes) => Some(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "cache payload missing");
                None
            }
            Err(err) => {
                warn!(error = %err, path = %path.display(), "failed to read cache payload");
                None
            }
        }
    }

    pub(super) async fn remove_payload(&self, relative_path: &str) {
        let path = self.absolute_path(relative_path);
        let _ = async_fs::remove_file(&path).await;
    }

    /// Removes the category directories under the cache dir, leaving any
    /// plain files (the index database lives there) in place. Best effort:
    /// a directory that cannot be removed is logged and skipped.
    pub(super) async fn remove_category_dirs(&self) {
        let cache_dir = self.cache_dir();
        let mut entries = match async_fs::read_dir(&cache_dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return,
            Err(err) => {
                warn!(error = %err, path = %cache_dir.display(), "failed to list cache dir");
                return;
            }
        };
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(err) => {
                    warn!(error = %err, path = %cache_dir.display(), "failed to list cache dir");
                    break;
                }
            };
            let path = entry.path();
            match entry.file_type().await {
                Ok(file_type) if file_type.is_dir() => {
                    if let Err(err) = async_fs::remove_dir_all(&path).await {
                        warn!(error = %err, path = %path.display(), "failed to remove cache dir");
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(error = %err, path = %path.display(), "failed to stat cache dir entry");
                }
            }
        }
    }
}
