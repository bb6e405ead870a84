//! Thumbnail cache service.
//!
//! Policy layer over a [`ThumbnailStore`]: decides when a capture happens,
//! turns it into a thumbnail, and keeps the store under its count cap.
//! Capturing is best effort. A failed capture (restricted page, corrupt
//! image, timeout, write failure) leaves the previous thumbnail in place and
//! is only logged.

use std::sync::Arc;
use std::time::Duration;

use rustc_hash::FxHashMap;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::debug;

use crate::browser::{CaptureOptions, TabCapture};
use crate::error::{Error, Result};
use crate::identifiers::{TabId, WindowId};
use crate::imaging::ImageTransform;
use crate::store::{StoredThumbnail, ThumbnailStore};

use super::ThumbnailConfig;

// ============================================================================
// Constants
// ============================================================================

/// Maximum number of thumbnails kept after each capture.
pub const MAX_THUMBNAILS: usize = 100;

/// Default bound on each of the capture and transform steps.
pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default wait between tab activation and capture, giving the page time
/// to render.
pub const DEFAULT_CAPTURE_DELAY: Duration = Duration::from_millis(300);

// ============================================================================
// ThumbnailCache
// ============================================================================

/// Captures, stores and serves tab thumbnails.
///
/// # Example
///
/// ```ignore
/// let store: Arc<dyn ThumbnailStore> = Arc::new(SqliteThumbnailStore::open(path));
/// let cache = Arc::new(ThumbnailCache::new(store, capture));
/// cache.initialize().await?;
///
/// // On tab activation; the handle can be dropped.
/// cache.schedule_capture(tab_id, window_id, None);
///
/// // In the tab switcher.
/// let thumbnails = cache.get_thumbnails_for_tabs(&visible_tabs).await;
/// ```
pub struct ThumbnailCache {
    store: Arc<dyn ThumbnailStore>,
    capture: Arc<dyn TabCapture>,
    transform: ImageTransform,
    max_thumbnails: usize,
    capture_timeout: Duration,
    capture_delay: Duration,
}

impl std::fmt::Debug for ThumbnailCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThumbnailCache")
            .field("initialized", &self.store.is_initialized())
            .field("max_thumbnails", &self.max_thumbnails)
            .field("capture_timeout", &self.capture_timeout)
            .field("capture_delay", &self.capture_delay)
            .finish_non_exhaustive()
    }
}

impl ThumbnailCache {
    /// Creates a cache over `store`, capturing through `capture`.
    #[must_use]
    pub fn new(store: Arc<dyn ThumbnailStore>, capture: Arc<dyn TabCapture>) -> Self {
        Self {
            store,
            capture,
            transform: ImageTransform::new(),
            max_thumbnails: MAX_THUMBNAILS,
            capture_timeout: DEFAULT_CAPTURE_TIMEOUT,
            capture_delay: DEFAULT_CAPTURE_DELAY,
        }
    }

    /// Sets the count cap enforced after each capture.
    #[must_use]
    pub fn with_max_thumbnails(mut self, max: usize) -> Self {
        self.max_thumbnails = max;
        self
    }

    /// Sets the bound on each of the capture and transform steps.
    #[must_use]
    pub fn with_capture_timeout(mut self, timeout: Duration) -> Self {
        self.capture_timeout = timeout;
        self
    }

    /// Sets the delay used by [`schedule_capture`](Self::schedule_capture).
    #[must_use]
    pub fn with_capture_delay(mut self, delay: Duration) -> Self {
        self.capture_delay = delay;
        self
    }

    /// Returns the underlying store.
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ThumbnailStore> {
        &self.store
    }

    /// Returns the count cap.
    #[inline]
    #[must_use]
    pub fn max_thumbnails(&self) -> usize {
        self.max_thumbnails
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Initializes the store. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened.
    pub async fn initialize(&self) -> Result<()> {
        self.store.init().await
    }

    // ========================================================================
    // Capture
    // ========================================================================

    /// Captures the visible tab of `window_id` and stores it for `tab_id`.
    ///
    /// Does nothing if the store is not initialized yet; it does not wait
    /// for initialization. Uses [`ThumbnailConfig::DEFAULT`] when `config`
    /// is `None`. Never fails: every error is logged and dropped.
    pub async fn capture_and_store(
        &self,
        tab_id: TabId,
        window_id: WindowId,
        config: Option<ThumbnailConfig>,
    ) {
        if !self.store.is_initialized() {
            debug!(tab_id = %tab_id, "Store not initialized, skipping capture");
            return;
        }

        let config = config.unwrap_or_default();
        if let Err(e) = self.try_capture_and_store(tab_id, window_id, config).await {
            debug!(tab_id = %tab_id, window_id = %window_id, error = %e, "Thumbnail capture skipped");
        }
    }

    /// Runs [`capture_and_store`](Self::capture_and_store) on a detached task
    /// after the configured capture delay.
    ///
    /// The caller does not need to await the handle. A later read may still
    /// see the previous thumbnail if it runs before the task completes.
    pub fn schedule_capture(
        self: &Arc<Self>,
        tab_id: TabId,
        window_id: WindowId,
        config: Option<ThumbnailConfig>,
    ) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(cache.capture_delay).await;
            cache.capture_and_store(tab_id, window_id, config).await;
        })
    }

    async fn try_capture_and_store(
        &self,
        tab_id: TabId,
        window_id: WindowId,
        config: ThumbnailConfig,
    ) -> Result<()> {
        config.validate()?;

        let options = CaptureOptions::jpeg(config.capture_quality);
        let screenshot = self
            .bounded("capture", self.capture.capture_visible_tab(window_id, options))
            .await?;
        let data_url = self
            .bounded("transform", self.transform.process(screenshot, config))
            .await?;

        let size = data_url.len();
        self.store.put(StoredThumbnail::new(tab_id, data_url)).await?;
        self.store.prune(self.max_thumbnails).await;

        debug!(tab_id = %tab_id, bytes = size, "Thumbnail stored");
        Ok(())
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        future: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        timeout(self.capture_timeout, future)
            .await
            .map_err(|_| Error::timeout(operation, self.capture_timeout.as_millis() as u64))?
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Returns the stored thumbnail data URL for `tab_id`.
    pub async fn get_thumbnail(&self, tab_id: TabId) -> Option<String> {
        self.store.get(tab_id).await.map(|record| record.data_url)
    }

    /// Returns data URLs for every tab in `tab_ids` that has a thumbnail.
    pub async fn get_thumbnails_for_tabs(&self, tab_ids: &[TabId]) -> FxHashMap<TabId, String> {
        self.store
            .get_many(tab_ids)
            .await
            .into_iter()
            .map(|(tab_id, record)| (tab_id, record.data_url))
            .collect()
    }

    /// Removes the thumbnail of a closed tab.
    pub async fn delete(&self, tab_id: TabId) {
        self.store.delete(tab_id).await;
    }
}

// ============================================================================
// Tests
// ============================================================================
