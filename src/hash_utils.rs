//! Content hashing helpers for integrity comparison and digest display.

use sha2::{Digest, Sha256};

/// SHA-256 digest of a byte slice, hex-encoded.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Byte-for-byte comparison of two hash strings. Anchored hashes are
/// compared exactly; a casing difference counts as a mismatch, and an empty
/// stored hash never matches anything.
pub fn hashes_match(stored: &str, calculated: &str) -> bool {
    !stored.is_empty() && stored == calculated
}
