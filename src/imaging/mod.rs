//! Image processing for thumbnails.
//!
//! | Module | Description |
//! |--------|-------------|
//! | `blur` | In-place stack blur over RGBA buffers |
//! | `data_url` | Base64 data URL parsing and formatting |
//! | `transform` | Decode, resize, blur, re-encode |

// ============================================================================
// Submodules
// ============================================================================

mod blur;
mod data_url;
mod transform;

// ============================================================================
// Re-exports
// ============================================================================

pub use blur::{MAX_RADIUS, MIN_RADIUS, clamp_radius, stack_blur};
pub use data_url::DataUrl;
pub use transform::{
    BLUR_RADIUS, ImageTransform, THUMBNAIL_MIME, render_thumbnail, thumbnail_dimensions,
};
