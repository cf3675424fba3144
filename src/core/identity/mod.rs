//! # Identity Module
//!
//! Maps a source locator (path or URL) to a stable content-identity token.
//!
//! The identity is a 256-bit BLAKE3 hash of the locator string. It is the
//! key component for the result cache and for any stored image metadata.
//! Two different locators may reference identical bytes; the identity makes
//! no attempt to detect that - it identifies the *source*, not the content.

use serde::{Serialize, Serializer};
use std::fmt;

/// A 256-bit content-identity token derived from a source locator.
///
/// Deterministic: the same locator always yields the same identity.
/// Collisions between distinct locators are cryptographically negligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageIdentity([u8; 32]);

impl ImageIdentity {
    /// Get the raw hash bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render as a 64-character lowercase hex string
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for ImageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for ImageIdentity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Compute the identity of a source locator.
///
/// Pure function: no I/O, no failure mode.
pub fn identity(locator: &str) -> ImageIdentity {
    ImageIdentity(*blake3::hash(locator.as_bytes()).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_deterministic() {
        let a = identity("https://example.com/photo.jpg");
        let b = identity("https://example.com/photo.jpg");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_locators_hash_distinctly() {
        let a = identity("/photos/a.jpg");
        let b = identity("/photos/b.jpg");
        assert_ne!(a, b);
    }

    #[test]
    fn hex_is_64_lowercase_chars() {
        let id = identity("anything");
        let hex = id.to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn display_matches_hex() {
        let id = identity("x");
        assert_eq!(id.to_string(), id.to_hex());
    }
}
