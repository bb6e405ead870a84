//! Thumbnail persistence.
//!
//! The [`ThumbnailStore`] trait is the only way services touch stored
//! thumbnails. One store instance is created at startup and shared (as
//! `Arc<dyn ThumbnailStore>`) by the cache and cleanup services.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SqliteThumbnailStore`] | Durable store backed by an embedded SQLite database |
//! | [`MemoryThumbnailStore`] | In-process store for tests and ephemeral sessions |
//!
//! # Failure policy
//!
//! Reads and evictions never fail: before [`ThumbnailStore::init`] they see an
//! empty store, and I/O errors are logged and treated as "nothing there".
//! Only [`ThumbnailStore::put`] reports I/O errors, so a failed write is never
//! mistaken for a thumbnail that simply has not been captured yet.

// ============================================================================
// Submodules
// ============================================================================

mod memory;
mod sqlite;

// ============================================================================
// Imports
// ============================================================================

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::identifiers::TabId;

// ============================================================================
// Re-exports
// ============================================================================

pub use memory::MemoryThumbnailStore;
pub use sqlite::{DATABASE_FILE, SqliteThumbnailStore};

// ============================================================================
// StoredThumbnail
// ============================================================================

/// One cached thumbnail. At most one exists per tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredThumbnail {
    /// Tab the thumbnail belongs to.
    pub tab_id: TabId,
    /// Self-contained encoded image (`data:image/jpeg;base64,...`).
    pub data_url: String,
    /// Capture time in epoch milliseconds.
    pub captured_at: i64,
}

impl StoredThumbnail {
    /// Creates a record captured now.
    #[must_use]
    pub fn new(tab_id: TabId, data_url: impl Into<String>) -> Self {
        Self::at(tab_id, data_url, epoch_ms())
    }

    /// Creates a record with an explicit capture time.
    #[must_use]
    pub fn at(tab_id: TabId, data_url: impl Into<String>, captured_at: i64) -> Self {
        Self {
            tab_id,
            data_url: data_url.into(),
            captured_at,
        }
    }

    /// Returns `true` if the record is older than `max_age` at `now_ms`.
    #[inline]
    #[must_use]
    pub fn is_expired(&self, max_age: Duration, now_ms: i64) -> bool {
        now_ms.saturating_sub(self.captured_at) > duration_ms(max_age)
    }
}

// ============================================================================
// ThumbnailStore
// ============================================================================

/// Asynchronous key-value persistence for thumbnails, keyed by tab.
///
/// Each operation is atomic on its own; there is no locking across
/// operations.
#[async_trait]
pub trait ThumbnailStore: Send + Sync {
    /// Opens the backing storage and creates the schema.
    ///
    /// Idempotent: calls after a successful init return immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be opened.
    async fn init(&self) -> Result<()>;

    /// Returns `true` once [`init`](Self::init) has succeeded.
    fn is_initialized(&self) -> bool;

    /// Looks up one tab's thumbnail.
    async fn get(&self, tab_id: TabId) -> Option<StoredThumbnail>;

    /// Looks up several tabs at once. Absent tabs are missing from the map.
    async fn get_many(&self, tab_ids: &[TabId]) -> FxHashMap<TabId, StoredThumbnail>;

    /// Inserts or replaces the thumbnail for `record.tab_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails. Before init this is a silent no-op.
    async fn put(&self, record: StoredThumbnail) -> Result<()>;

    /// Removes a tab's thumbnail if present.
    async fn delete(&self, tab_id: TabId);

    /// Deletes the oldest thumbnails (by capture time) until at most
    /// `max_count` remain.
    async fn prune(&self, max_count: usize);

    /// Deletes every thumbnail older than `max_age`. Returns the number deleted.
    async fn delete_expired(&self, max_age: Duration) -> usize;

    /// Number of stored thumbnails.
    async fn count(&self) -> usize;
}

// ============================================================================
// Helpers
// ============================================================================

/// Current time in epoch milliseconds.
#[must_use]
pub fn epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Duration in whole milliseconds, saturating at `i64::MAX`.
#[inline]
pub(crate) fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_expired_strictly_older() {
        let record = StoredThumbnail::at(TabId::new(1), "x", 1_000);
        let max_age = Duration::from_millis(500);
        assert!(!record.is_expired(max_age, 1_500));
        assert!(record.is_expired(max_age, 1_501));
    }

    #[test]
    fn test_new_uses_current_time() {
        let before = epoch_ms();
        let record = StoredThumbnail::new(TabId::new(1), "x");
        assert!(record.captured_at >= before);
        assert!(record.captured_at <= epoch_ms());
    }

    #[test]
    fn test_serde_field_names() {
        let record = StoredThumbnail::at(TabId::new(5), "data:", 42);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["tabId"], 5);
        assert_eq!(json["dataUrl"], "data:");
        assert_eq!(json["capturedAt"], 42);
    }

    #[test]
    fn test_duration_ms_saturates() {
        assert_eq!(duration_ms(Duration::MAX), i64::MAX);
        assert_eq!(duration_ms(Duration::from_secs(1)), 1_000);
    }
}
