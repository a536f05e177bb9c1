//! Cryptographic utilities for session token hashing.

use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input and returns it as a hex string.
///
/// Session tokens are never stored in the clear; the server only keeps
/// this digest and compares digests on lookup.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
