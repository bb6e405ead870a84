//! Browser-facing boundaries.
//!
//! The thumbnail services never call browser APIs directly. They go through
//! these seams, which the host wires to the real extension APIs (or to fakes
//! in tests):
//!
//! | Type | Description |
//! |------|-------------|
//! | [`TabCapture`] | Captures a window's visible tab as a data URL |
//! | [`AlarmScheduler`] | Named recurring alarms |
//! | [`SettingsSource`] | Current user settings |

// ============================================================================
// Submodules
// ============================================================================

/// Named recurring alarms.
pub mod alarms;

/// Visible-tab capture.
pub mod capture;

/// Thumbnail-related user settings.
pub mod settings;

// ============================================================================
// Re-exports
// ============================================================================

pub use alarms::{AlarmSchedule, AlarmScheduler, TokioAlarms};
pub use capture::{CaptureOptions, TabCapture};
pub use settings::{
    JsonSettingsFile, Settings, SettingsSource, SharedSettings, ThumbnailQuality, ThumbnailTtl,
};
