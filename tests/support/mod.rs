#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, anyhow};
use http::{HeaderMap, Method, StatusCode};
use tempfile::TempDir;
use tokio::time::sleep;

use reqstash::{CacheRequest, CacheResponse, RequestCache};

pub const DB_FILE_PREFIX: &str = "request_cache.sqlite3";

pub const PNG_BODY: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D', b'R',
];

pub struct CacheFixture {
    _temp: TempDir,
    pub root: PathBuf,
    pub cache: RequestCache,
}

impl CacheFixture {
    pub fn new() -> Result<Self> {
        let temp = TempDir::new()?;
        let root = temp.path().to_path_buf();
        let cache = RequestCache::open(&root)?;
        Ok(Self {
            _temp: temp,
            root,
            cache,
        })
    }

    /// Second handle onto the same on-disk cache, as a restart would get.
    pub fn reopen(&self) -> Result<RequestCache> {
        RequestCache::open(&self.root)
    }

    pub fn payload_path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Every payload file currently on disk, ignoring the index database.
    pub fn payload_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let cache_dir = self.root.join("Http");
        if cache_dir.exists() {
            collect_files(&cache_dir, &mut files)?;
        }
        files.retain(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| !name.starts_with(DB_FILE_PREFIX))
                .unwrap_or(true)
        });
        Ok(files)
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

pub fn get_request(uri: &str) -> CacheRequest {
    CacheRequest {
        method: Method::GET,
        uri: Some(uri.parse().expect("valid test uri")),
        headers: HeaderMap::new(),
    }
}

pub fn request_with_header(uri: &str, name: &'static str, value: &str) -> CacheRequest {
    let mut request = get_request(uri);
    request
        .headers
        .insert(name, value.parse().expect("valid test header"));
    request
}

pub fn ok_response(body: &[u8]) -> CacheResponse {
    CacheResponse {
        status: StatusCode::OK,
        final_uri: None,
        body: body.to_vec(),
    }
}

pub fn response_with_status(status: StatusCode, body: &[u8]) -> CacheResponse {
    CacheResponse {
        status,
        final_uri: None,
        body: body.to_vec(),
    }
}

/// Polls `condition` until it holds or two seconds pass.
pub async fn wait_until<F>(mut condition: F, what: &str) -> Result<()>
where
    F: FnMut() -> Result<bool>,
{
    for _ in 0..200 {
        if condition()? {
            return Ok(());
        }
        sleep(Duration::from_millis(10)).await;
    }
    Err(anyhow!("timed out waiting for {what}"))
}
