//! Base64 data URL parsing and formatting.
//!
//! Captures arrive as `data:image/jpeg;base64,...` strings and thumbnails
//! leave in the same shape, ready to use as an image source.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;

use crate::error::{Error, Result};

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64";

// ============================================================================
// DataUrl
// ============================================================================

/// A decoded base64 data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    mime_type: String,
    bytes: Vec<u8>,
}

impl DataUrl {
    /// Wraps raw bytes with their MIME type.
    #[must_use]
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Parses a `data:<mime>;base64,<payload>` string.
    ///
    /// # Errors
    ///
    /// - [`Error::Decode`] if the scheme, base64 marker, or comma is missing
    /// - [`Error::Base64`] if the payload is not valid base64
    pub fn parse(input: &str) -> Result<Self> {
        let rest = input
            .strip_prefix(SCHEME)
            .ok_or_else(|| Error::decode("not a data URL"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| Error::decode("data URL has no payload separator"))?;
        let mime_type = header
            .strip_suffix(BASE64_MARKER)
            .ok_or_else(|| Error::decode("data URL is not base64-encoded"))?;

        let bytes = Base64Standard.decode(payload.trim())?;
        if bytes.is_empty() {
            return Err(Error::decode("data URL payload is empty"));
        }

        Ok(Self::new(mime_type, bytes))
    }

    /// Returns the MIME type, e.g. `image/jpeg`.
    #[inline]
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Returns the decoded payload.
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Display for DataUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{SCHEME}{}{BASE64_MARKER},{}",
            self.mime_type,
            Base64Standard.encode(&self.bytes)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
