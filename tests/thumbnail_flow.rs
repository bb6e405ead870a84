//! End-to-end thumbnail flows against an on-disk SQLite store.
//!
//! Each test gets its own temporary database. The browser is replaced by a
//! capture fake that renders a small JPEG screenshot.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use tempfile::TempDir;

use tab_thumbnails::store::{DATABASE_FILE, epoch_ms};
use tab_thumbnails::{
    CaptureOptions, DataUrl, Error, Result, Settings, SharedSettings, SqliteThumbnailStore,
    StoredThumbnail, TabCapture, TabId, ThumbnailCache, ThumbnailCleanup, ThumbnailConfig,
    ThumbnailStore, ThumbnailTtl, TokioAlarms, WindowId,
};

const MINUTE_MS: i64 = 60 * 1000;

// ============================================================================
// Fixtures
// ============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Captures a 160x100 gradient; refuses window 0 like a restricted page.
#[derive(Default)]
struct FakeBrowser {
    captures: AtomicUsize,
}

#[async_trait]
impl TabCapture for FakeBrowser {
    async fn capture_visible_tab(
        &self,
        window_id: WindowId,
        _options: CaptureOptions,
    ) -> Result<String> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        if window_id.as_i64() == 0 {
            return Err(Error::capture("Cannot access contents of the page"));
        }

        let img = RgbImage::from_fn(160, 100, |x, y| Rgb([x as u8, y as u8 * 2, 200]));
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, 70).encode_image(&img)?;
        Ok(DataUrl::new("image/jpeg", jpeg).to_string())
    }
}

async fn open_store(dir: &TempDir) -> anyhow::Result<Arc<SqliteThumbnailStore>> {
    let store = Arc::new(SqliteThumbnailStore::open(dir.path().join(DATABASE_FILE)));
    store.init().await?;
    Ok(store)
}

// ============================================================================
// Cache
// ============================================================================

#[tokio::test]
async fn test_capture_then_delete_tab() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let store = open_store(&dir).await?;
    let cache = ThumbnailCache::new(store.clone(), Arc::new(FakeBrowser::default()));
    cache.initialize().await?;

    let before = epoch_ms();
    let config = ThumbnailConfig::new()
        .with_size(200)
        .with_capture_quality(70)
        .with_resize_quality(0.8);
    cache
        .capture_and_store(TabId::new(5), WindowId::new(2), Some(config))
        .await;

    assert_eq!(store.count().await, 1);
    let record = store.get(TabId::new(5)).await.expect("thumbnail stored");
    assert_eq!(record.tab_id, TabId::new(5));
    assert!(record.data_url.starts_with("data:image/jpeg;base64,"));
    assert!(record.captured_at >= before && record.captured_at <= epoch_ms());

    let decoded = image::load_from_memory(DataUrl::parse(&record.data_url)?.bytes())?;
    assert_eq!((decoded.width(), decoded.height()), (200, 125));

    cache.delete(TabId::new(5)).await;
    assert_eq!(cache.get_thumbnail(TabId::new(5)).await, None);
    Ok(())
}

#[tokio::test]
async fn test_restricted_page_leaves_no_record() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let store = open_store(&dir).await?;
    let browser = Arc::new(FakeBrowser::default());
    let cache = ThumbnailCache::new(store.clone(), browser.clone());

    cache
        .capture_and_store(TabId::new(1), WindowId::new(0), None)
        .await;

    assert_eq!(browser.captures.load(Ordering::SeqCst), 1);
    assert_eq!(store.count().await, 0);
    Ok(())
}

#[tokio::test]
async fn test_blurred_capture_is_stored() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let store = open_store(&dir).await?;
    let cache = ThumbnailCache::new(store.clone(), Arc::new(FakeBrowser::default()));

    cache
        .capture_and_store(
            TabId::new(3),
            WindowId::new(1),
            Some(ThumbnailConfig::new().with_size(64).with_blur()),
        )
        .await;

    let url = cache.get_thumbnail(TabId::new(3)).await.expect("thumbnail stored");
    let decoded = image::load_from_memory(DataUrl::parse(&url)?.bytes())?;
    assert_eq!(decoded.width(), 64);
    Ok(())
}

#[tokio::test]
async fn test_thumbnails_for_tabs_after_reopen() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    {
        let store = open_store(&dir).await?;
        let cache = ThumbnailCache::new(store, Arc::new(FakeBrowser::default()));
        for tab in [1, 2, 3] {
            cache
                .capture_and_store(TabId::new(tab), WindowId::new(1), None)
                .await;
        }
    }

    let store = open_store(&dir).await?;
    let cache = ThumbnailCache::new(store, Arc::new(FakeBrowser::default()));
    let urls = cache
        .get_thumbnails_for_tabs(&[TabId::new(1), TabId::new(3), TabId::new(42)])
        .await;

    assert_eq!(urls.len(), 2);
    assert!(urls.contains_key(&TabId::new(1)));
    assert!(urls.contains_key(&TabId::new(3)));
    Ok(())
}

#[tokio::test]
async fn test_count_cap_after_many_captures() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let store = open_store(&dir).await?;
    let cache = ThumbnailCache::new(store.clone(), Arc::new(FakeBrowser::default()))
        .with_max_thumbnails(3);

    for tab in 1..=5 {
        cache
            .capture_and_store(TabId::new(tab), WindowId::new(1), None)
            .await;
    }

    assert_eq!(store.count().await, 3);
    assert!(cache.get_thumbnail(TabId::new(5)).await.is_some());
    Ok(())
}

#[tokio::test]
async fn test_scheduled_capture() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let store = open_store(&dir).await?;
    let cache = Arc::new(
        ThumbnailCache::new(store, Arc::new(FakeBrowser::default()))
            .with_capture_delay(Duration::from_millis(10)),
    );

    cache
        .schedule_capture(TabId::new(7), WindowId::new(1), None)
        .await?;

    assert!(cache.get_thumbnail(TabId::new(7)).await.is_some());
    Ok(())
}

// ============================================================================
// Cleanup
// ============================================================================

#[tokio::test]
async fn test_cleanup_one_hour_ttl() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let store = open_store(&dir).await?;
    let now = epoch_ms();
    store
        .put(StoredThumbnail::at(TabId::new(1), "data:old", now - 120 * MINUTE_MS))
        .await?;
    store
        .put(StoredThumbnail::at(TabId::new(2), "data:new", now - 5 * MINUTE_MS))
        .await?;

    let settings = SharedSettings::new(Settings {
        thumbnail_ttl: ThumbnailTtl::OneHour,
        ..Settings::default()
    });
    let cleanup = ThumbnailCleanup::new(
        store.clone(),
        Arc::new(TokioAlarms::new()),
        Arc::new(settings),
    );

    assert_eq!(cleanup.run_cleanup().await, 1);
    assert!(store.get(TabId::new(1)).await.is_none());
    assert!(store.get(TabId::new(2)).await.is_some());
    Ok(())
}

#[tokio::test]
async fn test_cleanup_with_default_ttl_keeps_recent() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let store = open_store(&dir).await?;
    let now = epoch_ms();
    store
        .put(StoredThumbnail::at(TabId::new(1), "data:day", now - 24 * 60 * MINUTE_MS))
        .await?;

    let cleanup = ThumbnailCleanup::new(
        store.clone(),
        Arc::new(TokioAlarms::new()),
        Arc::new(Settings::default()),
    );

    assert_eq!(cleanup.run_cleanup().await, 0);
    assert_eq!(store.count().await, 1);
    Ok(())
}
