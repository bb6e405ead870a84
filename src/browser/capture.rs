//! Visible-tab capture boundary.
//!
//! The host environment owns the actual capture call (an extension's
//! `tabs.captureVisibleTab`, a WebDriver session, a test fake). This crate
//! only describes what it asks for and what comes back: a data URL.

use async_trait::async_trait;
use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::error::Result;
use crate::identifiers::WindowId;

// ============================================================================
// CaptureOptions
// ============================================================================

/// Options passed to [`TabCapture::capture_visible_tab`].
///
/// Captures are always JPEG. Serializes to the browser's
/// `{ "format": "jpeg", "quality": 70 }` shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    /// JPEG quality (0-100).
    pub quality: u8,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self::jpeg(crate::ThumbnailConfig::DEFAULT.capture_quality)
    }
}

impl CaptureOptions {
    /// Wire value of the `format` field.
    pub const FORMAT: &'static str = "jpeg";

    /// JPEG capture at `quality` (clamped to 100).
    #[inline]
    #[must_use]
    pub const fn jpeg(quality: u8) -> Self {
        Self {
            quality: if quality > 100 { 100 } else { quality },
        }
    }
}

impl Serialize for CaptureOptions {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CaptureOptions", 2)?;
        state.serialize_field("format", Self::FORMAT)?;
        state.serialize_field("quality", &self.quality)?;
        state.end()
    }
}

// ============================================================================
// TabCapture
// ============================================================================

/// Captures the visible tab of a browser window.
///
/// # Example
///
/// ```ignore
/// struct ExtensionCapture { /* bridge to the extension */ }
///
/// #[async_trait]
/// impl TabCapture for ExtensionCapture {
///     async fn capture_visible_tab(
///         &self,
///         window_id: WindowId,
///         options: CaptureOptions,
///     ) -> Result<String> {
///         self.bridge.call("tabs.captureVisibleTab", (window_id, options)).await
///     }
/// }
/// ```
#[async_trait]
pub trait TabCapture: Send + Sync {
    /// Returns the window's visible tab as a data URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Capture`](crate::Error::Capture) when the browser
    /// refuses (restricted pages, missing permission).
    async fn capture_visible_tab(&self, window_id: WindowId, options: CaptureOptions)
    -> Result<String>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jpeg_quality_clamped() {
        assert_eq!(CaptureOptions::jpeg(150).quality, 100);
        assert_eq!(CaptureOptions::jpeg(85).quality, 85);
    }

    #[test]
    fn test_default_is_jpeg_70() {
        assert_eq!(CaptureOptions::default(), CaptureOptions::jpeg(70));
    }

    #[test]
    fn test_serialize_jpeg_options() {
        let json = serde_json::to_value(CaptureOptions::jpeg(70)).unwrap();
        assert_eq!(json, serde_json::json!({ "format": "jpeg", "quality": 70 }));
    }

    #[test]
    fn test_serialize_always_jpeg() {
        for quality in [0, 100, 255] {
            let json = serde_json::to_value(CaptureOptions::jpeg(quality)).unwrap();
            assert_eq!(json["format"], "jpeg");
            assert_eq!(json.as_object().map(|o| o.len()), Some(2));
        }
    }
}
