/// One row of the cache index.
///
/// `id` is the caller-supplied cache key. `relative_path` points at the
/// content-addressed payload file, relative to the cache root. `usage_time`
/// is the tick count of the last successful read (see [`crate::util`]); rows
/// that have never been read carry `0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub id: String,
    pub http_method: String,
    pub request_uri: String,
    pub relative_path: String,
    pub usage_time: i64,
}
