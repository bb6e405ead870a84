//! SQLite-backed thumbnail store.
//!
//! One table keyed by tab ID, with a secondary index on capture time so
//! count and age eviction walk the index instead of scanning. All SQLite
//! calls run on tokio's blocking pool; the shared connection sits behind a
//! mutex and each operation holds it for exactly one transaction.

// ============================================================================
// Imports
// ============================================================================

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::identifiers::TabId;

use super::{StoredThumbnail, ThumbnailStore, duration_ms, epoch_ms};

// ============================================================================
// Constants
// ============================================================================

/// Conventional database file name inside a data directory.
pub const DATABASE_FILE: &str = "thumbnails.db";

/// Bound parameters per `IN (...)` query, below SQLite's variable limit.
const MAX_BATCH: usize = 500;

const SCHEMA_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS thumbnails (
        tab_id INTEGER PRIMARY KEY,
        data_url TEXT NOT NULL,
        captured_at INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_thumbnails_captured_at ON thumbnails(captured_at);
"#;

const FILE_PRAGMAS: &str = "PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;";

// ============================================================================
// Location
// ============================================================================

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

impl Location {
    fn open(&self) -> Result<Connection> {
        match self {
            Self::File(path) => {
                if let Some(parent) = path.parent()
                    && !parent.as_os_str().is_empty()
                {
                    std::fs::create_dir_all(parent)?;
                }
                let conn = Connection::open(path)?;
                conn.execute_batch(FILE_PRAGMAS)?;
                Ok(conn)
            }
            Self::Memory => Ok(Connection::open_in_memory()?),
        }
    }
}

// ============================================================================
// SqliteThumbnailStore
// ============================================================================

/// Durable [`ThumbnailStore`] on an embedded SQLite database.
///
/// # Example
///
/// ```ignore
/// let store = SqliteThumbnailStore::open(data_dir.join(DATABASE_FILE));
/// store.init().await?;
/// store.put(StoredThumbnail::new(TabId::new(5), data_url)).await?;
/// ```
pub struct SqliteThumbnailStore {
    /// Where the database lives.
    location: Location,

    /// Shared connection, `None` until init.
    conn: Arc<Mutex<Option<Connection>>>,

    /// Set once init has succeeded.
    initialized: AtomicBool,

    /// Serializes concurrent init calls.
    init_lock: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for SqliteThumbnailStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteThumbnailStore")
            .field("location", &self.location)
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SqliteThumbnailStore - Constructors
// ============================================================================

impl SqliteThumbnailStore {
    /// Creates a store for a database file. Nothing is opened until init.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::with_location(Location::File(path.into()))
    }

    /// Creates a store on a private in-memory database.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_location(Location::Memory)
    }

    fn with_location(location: Location) -> Self {
        Self {
            location,
            conn: Arc::new(Mutex::new(None)),
            initialized: AtomicBool::new(false),
            init_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Returns the database path, or `None` for in-memory stores.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            Location::File(path) => Some(path),
            Location::Memory => None,
        }
    }
}

// ============================================================================
// SqliteThumbnailStore - Internal
// ============================================================================

impl SqliteThumbnailStore {
    /// Runs `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            let conn = guard.as_mut().ok_or(Error::NotInitialized)?;
            f(conn).map_err(Error::from)
        })
        .await?
    }

    /// Like [`with_conn`](Self::with_conn), but degrades to `fallback` on
    /// any failure, including use before init.
    async fn with_conn_or<T, F>(&self, operation: &'static str, fallback: T, f: F) -> T
    where
        F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        if !self.is_initialized() {
            return fallback;
        }

        match self.with_conn(f).await {
            Ok(value) => value,
            Err(e) => {
                warn!(operation, error = %e, "Thumbnail store operation failed");
                fallback
            }
        }
    }
}

fn row_to_thumbnail(row: &Row<'_>) -> rusqlite::Result<StoredThumbnail> {
    Ok(StoredThumbnail {
        tab_id: TabId::new(row.get(0)?),
        data_url: row.get(1)?,
        captured_at: row.get(2)?,
    })
}

// ============================================================================
// SqliteThumbnailStore - ThumbnailStore
// ============================================================================

#[async_trait]
impl ThumbnailStore for SqliteThumbnailStore {
    async fn init(&self) -> Result<()> {
        if self.is_initialized() {
            return Ok(());
        }

        let _guard = self.init_lock.lock().await;
        if self.is_initialized() {
            return Ok(());
        }

        let location = self.location.clone();
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || -> Result<()> {
            let connection = location.open()?;
            connection.execute_batch(SCHEMA_SQL)?;
            *conn.lock() = Some(connection);
            Ok(())
        })
        .await??;

        self.initialized.store(true, Ordering::Release);
        info!(location = ?self.location, "Thumbnail store initialized");
        Ok(())
    }

    #[inline]
    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    async fn get(&self, tab_id: TabId) -> Option<StoredThumbnail> {
        self.with_conn_or("get", None, move |conn| {
            conn.query_row(
                "SELECT tab_id, data_url, captured_at FROM thumbnails WHERE tab_id = ?1",
                params![tab_id.as_i64()],
                row_to_thumbnail,
            )
            .optional()
        })
        .await
    }

    async fn get_many(&self, tab_ids: &[TabId]) -> FxHashMap<TabId, StoredThumbnail> {
        if tab_ids.is_empty() {
            return FxHashMap::default();
        }

        let ids: Vec<i64> = tab_ids.iter().map(|id| id.as_i64()).collect();
        self.with_conn_or("get_many", FxHashMap::default(), move |conn| {
            let tx = conn.transaction()?;
            let mut found = FxHashMap::default();
            for chunk in ids.chunks(MAX_BATCH) {
                let placeholders = vec!["?"; chunk.len()].join(",");
                let sql = format!(
                    "SELECT tab_id, data_url, captured_at FROM thumbnails WHERE tab_id IN ({placeholders})"
                );
                let mut stmt = tx.prepare(&sql)?;
                let rows = stmt.query_map(params_from_iter(chunk.iter()), row_to_thumbnail)?;
                for row in rows {
                    let record = row?;
                    found.insert(record.tab_id, record);
                }
            }
            tx.commit()?;
            Ok(found)
        })
        .await
    }

    async fn put(&self, record: StoredThumbnail) -> Result<()> {
        if !self.is_initialized() {
            debug!(tab_id = %record.tab_id, "Store not initialized, dropping thumbnail");
            return Ok(());
        }

        let tab_id = record.tab_id;
        let bytes = record.data_url.len();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO thumbnails (tab_id, data_url, captured_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(tab_id) DO UPDATE SET
                     data_url = excluded.data_url,
                     captured_at = excluded.captured_at",
                params![record.tab_id.as_i64(), record.data_url, record.captured_at],
            )
        })
        .await?;

        debug!(tab_id = %tab_id, bytes, "Stored thumbnail");
        Ok(())
    }

    async fn delete(&self, tab_id: TabId) {
        let removed = self
            .with_conn_or("delete", 0, move |conn| {
                conn.execute(
                    "DELETE FROM thumbnails WHERE tab_id = ?1",
                    params![tab_id.as_i64()],
                )
            })
            .await;

        debug!(tab_id = %tab_id, removed = removed > 0, "Deleted thumbnail");
    }

    async fn prune(&self, max_count: usize) {
        let limit = i64::try_from(max_count).unwrap_or(i64::MAX);
        let deleted = self
            .with_conn_or("prune", 0, move |conn| {
                let tx = conn.transaction()?;
                let count: i64 =
                    tx.query_row("SELECT COUNT(*) FROM thumbnails", [], |row| row.get(0))?;
                if count <= limit {
                    return Ok(0);
                }

                let deleted = tx.execute(
                    "DELETE FROM thumbnails WHERE tab_id IN (
                         SELECT tab_id FROM thumbnails
                         ORDER BY captured_at ASC, tab_id ASC
                         LIMIT ?1
                     )",
                    params![count - limit],
                )?;
                tx.commit()?;
                Ok(deleted)
            })
            .await;

        if deleted > 0 {
            debug!(deleted, max_count, "Pruned oldest thumbnails");
        }
    }

    async fn delete_expired(&self, max_age: Duration) -> usize {
        let cutoff = epoch_ms().saturating_sub(duration_ms(max_age));
        self.with_conn_or("delete_expired", 0, move |conn| {
            conn.execute(
                "DELETE FROM thumbnails WHERE captured_at < ?1",
                params![cutoff],
            )
        })
        .await
    }

    async fn count(&self) -> usize {
        self.with_conn_or("count", 0, |conn| {
            conn.query_row("SELECT COUNT(*) FROM thumbnails", [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|n| n as usize)
        })
        .await
    }
}

// ============================================================================
// Tests
// ============================================================================
