//! Tab Thumbnails - Thumbnail cache for a browser tab switcher.
//!
//! This library captures the visible tab of a browser window, shrinks it to
//! a small JPEG (optionally blurred for privacy), and keeps the result in an
//! embedded database keyed by tab, so a tab switcher can show a preview of
//! every recently used tab.
//!
//! # Architecture
//!
//! The host environment owns the browser. This crate sees it through three
//! seams in [`browser`]:
//!
//! - **[`TabCapture`]**: captures a window's visible tab as a data URL
//! - **[`AlarmScheduler`]**: named recurring timers
//! - **[`SettingsSource`]**: current user settings
//!
//! On top of a shared [`ThumbnailStore`]:
//!
//! - [`ThumbnailCache`] captures on tab activation and enforces a count cap
//! - [`ThumbnailCleanup`] evicts by age on a recurring alarm
//!
//! Captures are best effort. A tab that cannot be captured simply has no
//! thumbnail; nothing is surfaced to the caller.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use tab_thumbnails::{
//!     JsonSettingsFile, Result, SqliteThumbnailStore, TabId, ThumbnailCache, ThumbnailCleanup,
//!     ThumbnailStore, TokioAlarms, WindowId,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let store: Arc<dyn ThumbnailStore> =
//!         Arc::new(SqliteThumbnailStore::open("/var/lib/switcher/thumbnails.db"));
//!
//!     let cache = Arc::new(ThumbnailCache::new(store.clone(), Arc::new(MyCapture::new())));
//!     cache.initialize().await?;
//!
//!     let cleanup = Arc::new(ThumbnailCleanup::new(
//!         store,
//!         Arc::new(TokioAlarms::new()),
//!         Arc::new(JsonSettingsFile::new("/var/lib/switcher/settings.json")),
//!     ));
//!     cleanup.initialize();
//!
//!     // On tab activation.
//!     cache.schedule_capture(TabId::new(5), WindowId::new(2), None);
//!
//!     // When rendering the switcher.
//!     let preview = cache.get_thumbnail(TabId::new(5)).await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`browser`] | Capture, alarm and settings seams |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`imaging`] | Stack blur, data URLs, thumbnail rendering |
//! | [`store`] | Thumbnail persistence |
//! | [`thumbnail`] | Cache and cleanup services |

// ============================================================================
// Modules
// ============================================================================

/// Browser-facing seams: capture, alarms, settings.
pub mod browser;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for browser entities.
///
/// Newtype wrappers prevent mixing tab and window IDs at compile time.
pub mod identifiers;

/// Image processing: blur, data URLs, thumbnail rendering.
pub mod imaging;

/// Thumbnail persistence.
pub mod store;

/// Thumbnail cache and cleanup services.
pub mod thumbnail;

// ============================================================================
// Re-exports
// ============================================================================

// Browser types
pub use browser::{
    AlarmSchedule, AlarmScheduler, CaptureOptions, JsonSettingsFile, Settings, SettingsSource,
    SharedSettings, TabCapture, ThumbnailQuality, ThumbnailTtl, TokioAlarms,
};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{TabId, WindowId};

// Imaging
pub use imaging::{DataUrl, ImageTransform, stack_blur};

// Store types
pub use store::{MemoryThumbnailStore, SqliteThumbnailStore, StoredThumbnail, ThumbnailStore};

// Thumbnail services
pub use thumbnail::{MAX_THUMBNAILS, ThumbnailCache, ThumbnailCleanup, ThumbnailConfig};
