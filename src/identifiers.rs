//! Type-safe identifiers for browser entities.
//!
//! Newtype wrappers prevent mixing tab and window IDs at compile time.
//! Both wrap the integer IDs the browser hands out.
//!
//! # Example
//!
//! ```
//! use tab_thumbnails::{TabId, WindowId};
//!
//! let tab = TabId::new(5);
//! let window = WindowId::new(2);
//! assert_eq!(tab.as_i64(), 5);
//! assert_eq!(window.to_string(), "2");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Macro
// ============================================================================

macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw browser ID.
            #[inline]
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw browser ID.
            #[inline]
            #[must_use]
            pub const fn as_i64(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            #[inline]
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            #[inline]
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ============================================================================
// Identifiers
// ============================================================================

integer_id!(
    /// Browser tab identifier. Primary key of stored thumbnails.
    TabId
);

integer_id!(
    /// Browser window identifier. Capture always targets a window's visible tab.
    WindowId
);

// ============================================================================
// Tests
// ============================================================================
