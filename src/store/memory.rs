//! In-process thumbnail store.
//!
//! Same contract as the SQLite store, held in a hash map. Nothing survives
//! the process; useful for private windows and as a test double.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::Result;
use crate::identifiers::TabId;

use super::{StoredThumbnail, ThumbnailStore, epoch_ms};

// ============================================================================
// MemoryThumbnailStore
// ============================================================================

/// [`ThumbnailStore`] kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryThumbnailStore {
    records: RwLock<FxHashMap<TabId, StoredThumbnail>>,
    initialized: AtomicBool,
}

impl MemoryThumbnailStore {
    /// Creates an empty, uninitialized store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ThumbnailStore for MemoryThumbnailStore {
    async fn init(&self) -> Result<()> {
        self.initialized.store(true, Ordering::Release);
        Ok(())
    }

    #[inline]
    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    async fn get(&self, tab_id: TabId) -> Option<StoredThumbnail> {
        if !self.is_initialized() {
            return None;
        }
        self.records.read().get(&tab_id).cloned()
    }

    async fn get_many(&self, tab_ids: &[TabId]) -> FxHashMap<TabId, StoredThumbnail> {
        if !self.is_initialized() || tab_ids.is_empty() {
            return FxHashMap::default();
        }

        let records = self.records.read();
        tab_ids
            .iter()
            .filter_map(|id| records.get(id).map(|r| (*id, r.clone())))
            .collect()
    }

    async fn put(&self, record: StoredThumbnail) -> Result<()> {
        if !self.is_initialized() {
            return Ok(());
        }
        self.records.write().insert(record.tab_id, record);
        Ok(())
    }

    async fn delete(&self, tab_id: TabId) {
        if self.is_initialized() {
            self.records.write().remove(&tab_id);
        }
    }

    async fn prune(&self, max_count: usize) {
        if !self.is_initialized() {
            return;
        }

        let mut records = self.records.write();
        if records.len() <= max_count {
            return;
        }

        let mut by_age: Vec<(i64, TabId)> = records
            .values()
            .map(|r| (r.captured_at, r.tab_id))
            .collect();
        by_age.sort_unstable();

        let excess = records.len() - max_count;
        for (_, tab_id) in by_age.into_iter().take(excess) {
            records.remove(&tab_id);
        }
        debug!(deleted = excess, max_count, "Pruned oldest thumbnails");
    }

    async fn delete_expired(&self, max_age: Duration) -> usize {
        if !self.is_initialized() {
            return 0;
        }

        let now = epoch_ms();
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|_, r| !r.is_expired(max_age, now));
        before - records.len()
    }

    async fn count(&self) -> usize {
        if !self.is_initialized() {
            return 0;
        }
        self.records.read().len()
    }
}

// ============================================================================
// Tests
// ============================================================================
