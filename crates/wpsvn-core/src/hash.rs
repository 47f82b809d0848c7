//! BLAKE3 digests of cache entries.
//!
//! A provider map is written back only when its serialized form hashes
//! differently from what was read, so an unchanged listing never touches
//! the cache file.

use std::fmt;

/// Digest of a cache entry's bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Digest of raw bytes.
    #[must_use]
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Digest of a string's UTF-8 bytes.
    #[must_use]
    pub fn from_str_content(data: &str) -> Self {
        Self::from_bytes(data.as_bytes())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|byte| write!(f, "{byte:02x}"))
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_string();
        write!(f, "ContentHash({})", &hex[..12])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_content_equal_digest() {
        let a = ContentHash::from_str_content(r#"{"foo":"https://x.test/foo"}"#);
        let b = ContentHash::from_bytes(br#"{"foo":"https://x.test/foo"}"#);
        assert_eq!(a, b);
        assert_ne!(a, ContentHash::from_str_content("{}"));
    }

    #[test]
    fn renders_as_lowercase_hex() {
        let digest = ContentHash::from_bytes(b"providers").to_string();
        assert_eq!(digest.len(), 64);
        assert!(digest.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
        assert!(format!("{:?}", ContentHash::from_bytes(b"providers")).starts_with("ContentHash("));
    }
}
