//! Fast content hashing using xxHash3.
//!
//! Used for change detection on compiled render-function output so hosts can
//! invalidate cached compilations by content rather than by timestamp.

use xxhash_rust::xxh3::xxh3_64;

/// Compute a 64-bit hash of the given bytes using xxHash3.
#[inline]
pub fn hash_bytes(data: &[u8]) -> u64 {
    xxh3_64(data)
}

/// Compute a 64-bit hash of the given string using xxHash3.
#[inline]
pub fn hash_str(data: &str) -> u64 {
    xxh3_64(data.as_bytes())
}

/// Compute hash of a string and return as a 16-character hex string.
#[inline]
pub fn content_hash(content: &str) -> String {
    format!("{:016x}", hash_str(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_consistency() {
        assert_eq!(hash_str("render"), hash_str("render"));
        assert_ne!(hash_str("render"), hash_str("render2"));
    }

    #[test]
    fn test_content_hash_format() {
        assert_eq!(content_hash("x").len(), 16);
    }
}
