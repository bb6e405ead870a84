//! User settings consumed by the thumbnail services.
//!
//! Only the thumbnail-related keys are modelled. Settings are read through
//! the [`SettingsSource`] trait so the services always see the current value
//! rather than a copy taken at startup.
//!
//! | Source | Description |
//! |--------|-------------|
//! | [`Settings`] | Fixed value |
//! | [`SharedSettings`] | In-memory value the host updates when the user changes it |
//! | [`JsonSettingsFile`] | JSON file on disk; missing file means defaults |

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::thumbnail::ThumbnailConfig;

// ============================================================================
// ThumbnailQuality
// ============================================================================

/// Thumbnail size/quality preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailQuality {
    /// 200px, capture 70, re-encode 0.8.
    #[default]
    Standard,
    /// 320px, capture 80, re-encode 0.85.
    High,
    /// 480px, capture 90, re-encode 0.92.
    Ultra,
}

impl ThumbnailQuality {
    /// Concrete configuration for this preset, without blur.
    #[must_use]
    pub const fn config(self) -> ThumbnailConfig {
        match self {
            Self::Standard => ThumbnailConfig::DEFAULT,
            Self::High => ThumbnailConfig::DEFAULT
                .with_size(320)
                .with_capture_quality(80)
                .with_resize_quality(0.85),
            Self::Ultra => ThumbnailConfig::DEFAULT
                .with_size(480)
                .with_capture_quality(90)
                .with_resize_quality(0.92),
        }
    }
}

// ============================================================================
// ThumbnailTtl
// ============================================================================

/// Maximum thumbnail age before the cleanup sweep evicts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ThumbnailTtl {
    /// One hour.
    #[serde(rename = "1h")]
    OneHour,
    /// 24 hours.
    #[serde(rename = "24h")]
    OneDay,
    /// Seven days.
    #[default]
    #[serde(rename = "7d")]
    SevenDays,
    /// Thirty days.
    #[serde(rename = "30d")]
    ThirtyDays,
}

impl ThumbnailTtl {
    /// TTL in milliseconds.
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        const HOUR: u64 = 60 * 60 * 1000;
        match self {
            Self::OneHour => HOUR,
            Self::OneDay => 24 * HOUR,
            Self::SevenDays => 7 * 24 * HOUR,
            Self::ThirtyDays => 30 * 24 * HOUR,
        }
    }

    /// TTL as a [`Duration`].
    #[must_use]
    pub const fn as_duration(self) -> Duration {
        Duration::from_millis(self.as_millis())
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Thumbnail-related user settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Size/quality preset.
    pub thumbnail_quality: ThumbnailQuality,
    /// Age limit for cached thumbnails.
    pub thumbnail_ttl: ThumbnailTtl,
    /// Blur thumbnails for privacy.
    pub blur_thumbnails: bool,
}

impl Settings {
    /// Capture configuration implied by these settings.
    #[must_use]
    pub fn thumbnail_config(&self) -> ThumbnailConfig {
        self.thumbnail_quality
            .config()
            .with_blur_enabled(self.blur_thumbnails)
    }
}

// ============================================================================
// SettingsSource
// ============================================================================

/// Reads the current settings.
#[async_trait]
pub trait SettingsSource: Send + Sync {
    /// Loads the current settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing source cannot be read or parsed.
    async fn load(&self) -> Result<Settings>;
}

#[async_trait]
impl SettingsSource for Settings {
    async fn load(&self) -> Result<Settings> {
        Ok(*self)
    }
}

// ============================================================================
// SharedSettings
// ============================================================================

/// Settings held in memory and updated by the host.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<Settings>>,
}

impl SharedSettings {
    /// Creates a shared value starting at `settings`.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Replaces the settings. Clones of this handle observe the change.
    pub fn set(&self, settings: Settings) {
        *self.inner.write() = settings;
    }

    /// Returns a snapshot of the settings.
    #[must_use]
    pub fn get(&self) -> Settings {
        *self.inner.read()
    }
}

#[async_trait]
impl SettingsSource for SharedSettings {
    async fn load(&self) -> Result<Settings> {
        Ok(self.get())
    }
}

// ============================================================================
// JsonSettingsFile
// ============================================================================

/// Settings stored as a JSON object on disk.
///
/// Unknown keys are ignored and missing keys take their defaults, so the file
/// can be shared with unrelated settings.
#[derive(Debug, Clone)]
pub struct JsonSettingsFile {
    path: PathBuf,
}

impl JsonSettingsFile {
    /// Creates a source reading `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the file path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `settings` to the file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) or
    /// [`Error::Json`](crate::Error::Json) on failure.
    pub async fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl SettingsSource for JsonSettingsFile {
    async fn load(&self) -> Result<Settings> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Settings file missing, using defaults");
                return Ok(Settings::default());
            }
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_str(&content)?)
    }
}

// ============================================================================
// Tests
// ============================================================================
