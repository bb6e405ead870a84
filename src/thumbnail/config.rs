//! Per-capture thumbnail configuration.
//!
//! A [`ThumbnailConfig`] travels with each capture request. It is built from
//! the user's quality preset (see [`crate::browser::ThumbnailQuality`]) or
//! falls back to [`ThumbnailConfig::DEFAULT`].
//!
//! # Example
//!
//! ```
//! use tab_thumbnails::ThumbnailConfig;
//!
//! let config = ThumbnailConfig::new()
//!     .with_size(320)
//!     .with_capture_quality(80)
//!     .with_resize_quality(0.85)
//!     .with_blur();
//!
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// ThumbnailConfig
// ============================================================================

/// Size and quality settings for one capture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailConfig {
    /// Target length of the longer edge, in pixels.
    pub size: u32,

    /// JPEG quality requested from the tab capture (0-100).
    pub capture_quality: u8,

    /// JPEG quality of the re-encoded thumbnail (0.0-1.0).
    pub resize_quality: f32,

    /// Blur the thumbnail before storing it.
    #[serde(default)]
    pub blur: bool,
}

// ============================================================================
// Constructors
// ============================================================================

impl ThumbnailConfig {
    /// Configuration used when a capture request carries none.
    pub const DEFAULT: Self = Self {
        size: 200,
        capture_quality: 70,
        resize_quality: 0.8,
        blur: false,
    };

    /// Largest accepted long edge, in pixels.
    pub const MAX_SIZE: u32 = 4096;

    /// Creates a configuration with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self::DEFAULT
    }
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ThumbnailConfig {
    /// Sets the long-edge size in pixels.
    #[inline]
    #[must_use]
    pub const fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    /// Sets the capture-time JPEG quality (0-100).
    #[inline]
    #[must_use]
    pub const fn with_capture_quality(mut self, quality: u8) -> Self {
        self.capture_quality = quality;
        self
    }

    /// Sets the re-encode JPEG quality (0.0-1.0).
    #[inline]
    #[must_use]
    pub const fn with_resize_quality(mut self, quality: f32) -> Self {
        self.resize_quality = quality;
        self
    }

    /// Enables blurring.
    #[inline]
    #[must_use]
    pub const fn with_blur(mut self) -> Self {
        self.blur = true;
        self
    }

    /// Sets blurring explicitly.
    #[inline]
    #[must_use]
    pub const fn with_blur_enabled(mut self, blur: bool) -> Self {
        self.blur = blur;
        self
    }
}

// ============================================================================
// Conversion Methods
// ============================================================================

impl ThumbnailConfig {
    /// Re-encode quality on the encoder's 1-100 scale.
    #[must_use]
    pub fn jpeg_quality(&self) -> u8 {
        (self.resize_quality * 100.0).round().clamp(1.0, 100.0) as u8
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the size is zero or above
    /// [`Self::MAX_SIZE`], the capture quality is above 100, or the resize
    /// quality is outside `0.0..=1.0`.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(Error::config("Thumbnail size must be greater than zero"));
        }
        if self.size > Self::MAX_SIZE {
            return Err(Error::config(format!(
                "Thumbnail size must be at most {}, got {}",
                Self::MAX_SIZE,
                self.size
            )));
        }
        if self.capture_quality > 100 {
            return Err(Error::config(format!(
                "Capture quality must be at most 100, got {}",
                self.capture_quality
            )));
        }
        if !(0.0..=1.0).contains(&self.resize_quality) {
            return Err(Error::config(format!(
                "Resize quality must be within 0.0..=1.0, got {}",
                self.resize_quality
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
