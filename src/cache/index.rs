use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::{Connection, Row, params};

use super::entry::CacheEntry;

const DDL: &str = "
CREATE TABLE IF NOT EXISTS request_cache (
    id            TEXT PRIMARY KEY,
    http_method   TEXT NOT NULL,
    request_uri   TEXT NOT NULL,
    relative_path TEXT NOT NULL,
    usage_time    INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_request_cache_usage_time
    ON request_cache(usage_time);
";

/// Persistent key→metadata table behind the cache, backed by a single SQLite
/// file. Cloning shares the underlying connection; the mutex serializes
/// statement execution.
#[derive(Clone)]
pub struct CacheIndex {
    conn: Arc<Mutex<Connection>>,
}

impl CacheIndex {
    /// Opens (creating if needed) the index database at `path`. A database
    /// that cannot be opened or migrated is a hard error: a broken index
    /// cannot be worked around row-by-row.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open cache index {}", path.display()))?;
        Self::from_connection(conn)
    }

    /// In-memory index for tests.
    #[cfg(test)]
    pub fn memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory cache index")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(DDL)
            .context("failed to initialize cache index schema")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<CacheEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, http_method, request_uri, relative_path, usage_time
             FROM request_cache WHERE id = ?1",
        )?;
        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(row) => Ok(Some(row_to_entry(row)?)),
            None => Ok(None),
        }
    }

    /// Point lookup that matches on all three fields at once. A row with the
    /// right id but a different method or URI stays invisible; the caller
    /// treats that as a miss, not as a conflict to resolve.
    pub fn query(
        &self,
        id: &str,
        http_method: &str,
        request_uri: &str,
    ) -> Result<Option<CacheEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, http_method, request_uri, relative_path, usage_time
             FROM request_cache
             WHERE id = ?1 AND http_method = ?2 AND request_uri = ?3",
        )?;
        let mut rows = stmt.query(params![id, http_method, request_uri])?;
        match rows.next()? {
            Some(row) => Ok(Some(row_to_entry(row)?)),
            None => Ok(None),
        }
    }

    /// Insert the entry, or update method/URI/path in place when the id is
    /// already present. `usage_time` is never written here: fresh rows start
    /// at 0 and existing rows keep whatever the last hit set.
    pub fn upsert(&self, entry: &CacheEntry) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO request_cache (id, http_method, request_uri, relative_path)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                 http_method = excluded.http_method,
                 request_uri = excluded.request_uri,
                 relative_path = excluded.relative_path",
            params![
                entry.id,
                entry.http_method,
                entry.request_uri,
                entry.relative_path
            ],
        )?;
        Ok(())
    }

    /// Sets `usage_time` for the row matching `id`; no-op when absent.
    pub fn touch_usage(&self, id: &str, now: i64) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE request_cache SET usage_time = ?1 WHERE id = ?2",
            params![now, id],
        )?;
        Ok(())
    }

    pub fn delete_all(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let removed = conn.execute("DELETE FROM request_cache", [])?;
        Ok(removed)
    }

    /// Removes every row with `usage_time < threshold` and returns the
    /// removed rows, so the caller can delete the backing files afterwards.
    /// Select and delete run in one transaction; file deletion does not.
    pub fn delete_older_than(&self, threshold: i64) -> Result<Vec<CacheEntry>> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let evicted = {
            let mut stmt = tx.prepare(
                "SELECT id, http_method, request_uri, relative_path, usage_time
                 FROM request_cache WHERE usage_time < ?1",
            )?;
            let rows = stmt.query_map(params![threshold], row_to_entry)?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            out
        };
        if !evicted.is_empty() {
            tx.execute(
                "DELETE FROM request_cache WHERE usage_time < ?1",
                params![threshold],
            )?;
        }
        tx.commit()?;
        Ok(evicted)
    }

    pub fn count(&self) -> Result<u64> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM request_cache", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<CacheEntry> {
    Ok(CacheEntry {
        id: row.get(0)?,
        http_method: row.get(1)?,
        request_uri: row.get(2)?,
        relative_path: row.get(3)?,
        usage_time: row.get(4)?,
    })
}
