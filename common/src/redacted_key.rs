//! Secure database key handling with redacted Debug output.

use crate::{ErrorLocation, RedactError};

use std::fmt;
use std::panic::Location;

use serde::ser::Error;
use zeroize::Zeroize;

/// A hex-encoded database key that never exposes its value in logs or
/// debug output.
///
/// The decrypt protocol carries the key by value across the worker thread
/// boundary, so this type is `Clone`; every copy zeroizes its buffer on drop.
#[derive(Clone)]
pub struct RedactedHexKey {
    inner: String,
}

impl RedactedHexKey {
    /// Create a new redacted key from its hex encoding.
    pub fn new(hex_key: String) -> Self {
        Self { inner: hex_key }
    }

    /// Get the actual hex string for handoff to the native library.
    ///
    /// # Security Note
    /// Only call this when actually passing the key to the decrypt call.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Get the key length in hex characters (safe to log).
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if the key is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for RedactedHexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RedactedHexKey([REDACTED])")
    }
}

impl fmt::Display for RedactedHexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED DB KEY]")
    }
}

impl Drop for RedactedHexKey {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

// Prevent accidental serialization
impl serde::Serialize for RedactedHexKey {
    fn serialize<S>(&self, _serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        Err(S::Error::custom(RedactError::Serialization {
            message: String::from(
                "RedactedHexKey cannot be serialized - use as_str() explicitly",
            ),
            location: ErrorLocation::from(Location::caller()),
        }))
    }
}
