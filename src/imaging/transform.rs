//! Screenshot to thumbnail conversion.
//!
//! Decodes a captured screenshot, scales it so the longer edge matches the
//! configured size, optionally blurs it, and re-encodes it as a JPEG data
//! URL. The CPU-heavy part runs on tokio's blocking pool so the async
//! executor keeps serving other work while a thumbnail renders.

use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use tracing::debug;

use crate::error::{Error, Result};
use crate::thumbnail::ThumbnailConfig;

use super::blur::stack_blur;
use super::data_url::DataUrl;

// ============================================================================
// Constants
// ============================================================================

/// Blur radius applied to privacy thumbnails.
pub const BLUR_RADIUS: u32 = 10;

/// MIME type of every produced thumbnail.
pub const THUMBNAIL_MIME: &str = "image/jpeg";

// ============================================================================
// ImageTransform
// ============================================================================

/// Renders captured screenshots into stored-ready thumbnails.
///
/// # Example
///
/// ```ignore
/// let transform = ImageTransform::new();
/// let thumbnail = transform.process(screenshot, ThumbnailConfig::new()).await?;
/// assert!(thumbnail.starts_with("data:image/jpeg;base64,"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageTransform;

impl ImageTransform {
    /// Creates a transform.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Converts a screenshot data URL into a thumbnail data URL.
    ///
    /// Runs on the blocking pool. Not cancellable once started.
    ///
    /// # Errors
    ///
    /// - [`Error::Decode`] / [`Error::Base64`] / [`Error::Image`] if the
    ///   screenshot cannot be decoded
    /// - [`Error::Encode`] if JPEG encoding fails
    /// - [`Error::TaskJoin`] if the blocking task panics
    pub async fn process(&self, screenshot: String, config: ThumbnailConfig) -> Result<String> {
        tokio::task::spawn_blocking(move || render_thumbnail(&screenshot, &config)).await?
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Output size for a `width` x `height` source whose longer edge becomes
/// `size`. The shorter edge is rounded to the nearest pixel, never below 1.
#[must_use]
pub fn thumbnail_dimensions(width: u32, height: u32, size: u32) -> (u32, u32) {
    let scale = |short: u32, long: u32| -> u32 {
        let scaled = (short as f64 * size as f64 / long as f64).round();
        (scaled as u32).max(1)
    };

    if width >= height {
        (size, scale(height, width))
    } else {
        (scale(width, height), size)
    }
}

/// Synchronous core of [`ImageTransform::process`].
///
/// # Errors
///
/// See [`ImageTransform::process`].
pub fn render_thumbnail(screenshot: &str, config: &ThumbnailConfig) -> Result<String> {
    config.validate()?;

    let source = DataUrl::parse(screenshot)?;
    let decoded = image::load_from_memory(source.bytes())?;
    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(Error::decode("screenshot has no pixels"));
    }

    let (width, height) = thumbnail_dimensions(decoded.width(), decoded.height(), config.size);
    let mut resized = imageops::resize(&decoded.to_rgba8(), width, height, FilterType::Triangle);

    if config.blur {
        stack_blur(&mut resized, width, height, BLUR_RADIUS)?;
    }

    let rgb = DynamicImage::ImageRgba8(resized).to_rgb8();
    let mut jpeg = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, config.jpeg_quality());
    encoder
        .encode_image(&rgb)
        .map_err(|e| Error::encode(format!("JPEG encoding failed: {e}")))?;

    debug!(
        source_width = decoded.width(),
        source_height = decoded.height(),
        width,
        height,
        blur = config.blur,
        bytes = jpeg.len(),
        "Rendered thumbnail"
    );

    Ok(DataUrl::new(THUMBNAIL_MIME, jpeg).to_string())
}

// ============================================================================
// Tests
// ============================================================================
