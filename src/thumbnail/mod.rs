//! Thumbnail services.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ThumbnailConfig`] | Size and quality of one capture |
//! | [`ThumbnailCache`] | Capture, store and serve thumbnails |
//! | [`ThumbnailCleanup`] | Periodic TTL sweep |

// ============================================================================
// Submodules
// ============================================================================

/// Capture and storage policy.
pub mod cache;

/// Recurring TTL eviction.
pub mod cleanup;

/// Per-capture configuration.
pub mod config;

// ============================================================================
// Re-exports
// ============================================================================

pub use cache::{DEFAULT_CAPTURE_DELAY, DEFAULT_CAPTURE_TIMEOUT, MAX_THUMBNAILS, ThumbnailCache};
pub use cleanup::{CLEANUP_ALARM_NAME, CLEANUP_DELAY, CLEANUP_PERIOD, ThumbnailCleanup};
pub use config::ThumbnailConfig;
