//! Error types for tab thumbnails.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use tab_thumbnails::{Result, ThumbnailConfig};
//!
//! fn example() -> Result<()> {
//!     ThumbnailConfig::new().with_size(320).validate()?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidPixelBuffer`] |
//! | Capture | [`Error::Capture`], [`Error::Timeout`] |
//! | Image | [`Error::Decode`], [`Error::Encode`], [`Error::Image`], [`Error::Base64`] |
//! | Storage | [`Error::NotInitialized`], [`Error::Database`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::TaskJoin`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio::task::JoinError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when a thumbnail configuration or setting is out of range.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Pixel buffer length does not match its dimensions.
    ///
    /// RGBA buffers must hold exactly `width * height * 4` bytes.
    #[error("Invalid pixel buffer: {width}x{height} needs {expected} bytes, got {actual}")]
    InvalidPixelBuffer {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// Expected buffer length.
        expected: usize,
        /// Actual buffer length.
        actual: usize,
    },

    // ========================================================================
    // Capture Errors
    // ========================================================================
    /// Tab capture refused or failed.
    ///
    /// Expected for restricted pages (browser internal pages, permission denied).
    #[error("Capture failed: {message}")]
    Capture {
        /// Description of the capture failure.
        message: String,
    },

    /// Operation timeout.
    ///
    /// Returned when a capture or transform exceeds its time bound.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Image Errors
    // ========================================================================
    /// Captured image could not be decoded.
    #[error("Decode error: {message}")]
    Decode {
        /// Description of the decode failure.
        message: String,
    },

    /// Thumbnail could not be encoded.
    #[error("Encode error: {message}")]
    Encode {
        /// Description of the encode failure.
        message: String,
    },

    // ========================================================================
    // Storage Errors
    // ========================================================================
    /// Store used before `init()` completed.
    #[error("Thumbnail store not initialized")]
    NotInitialized,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// SQLite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Image codec error.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Base64 payload error.
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Blocking task panicked or was cancelled.
    #[error("Task join error: {0}")]
    TaskJoin(#[from] JoinError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid pixel buffer error.
    #[inline]
    pub fn invalid_pixel_buffer(width: u32, height: u32, actual: usize) -> Self {
        Self::InvalidPixelBuffer {
            width,
            height,
            expected: width as usize * height as usize * 4,
            actual,
        }
    }

    /// Creates a capture error.
    #[inline]
    pub fn capture(message: impl Into<String>) -> Self {
        Self::Capture {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Creates a decode error.
    #[inline]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates an encode error.
    #[inline]
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if this error belongs to the capture pipeline.
    ///
    /// These are the expected, silently discarded failures: restricted pages,
    /// undecodable screenshots, timeouts.
    #[inline]
    #[must_use]
    pub fn is_capture_error(&self) -> bool {
        matches!(
            self,
            Self::Capture { .. }
                | Self::Timeout { .. }
                | Self::Decode { .. }
                | Self::Encode { .. }
                | Self::Image(_)
                | Self::Base64(_)
        )
    }

    /// Returns `true` if this is a storage error.
    #[inline]
    #[must_use]
    pub fn is_storage_error(&self) -> bool {
        matches!(self, Self::NotInitialized | Self::Database(_))
    }
}

// ============================================================================
// Tests
// ============================================================================
