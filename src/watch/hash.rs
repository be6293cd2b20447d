// src/watch/hash.rs

use blake3::Hasher;

/// Hex blake3 digest of file contents.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize().to_hex().to_string()
}
