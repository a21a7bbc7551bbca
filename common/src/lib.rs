//! Shared support types for chatvault.
//!
//! This crate contains the small, dependency-light types used by every other
//! crate in the workspace. It holds no business logic - just data and the
//! plumbing that keeps errors traceable and key material out of logs.
//!
//! ## Architecture
//!
//! - **common** (this crate): error locations, redacted key material
//! - **vault-core**: the decrypt bridge operating on these types
//!
//! This layered architecture keeps concerns separated and makes testing easier.

pub mod error;
pub mod redacted_key;

#[cfg(test)]
mod tests;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use redacted_key::RedactedHexKey;
