//! Hash primitive for Gossamer.
//!
//! Everything that needs a digest goes through SHA-256: announce hashes,
//! hop advancement, and the keyed happiness check in `admission`.

use sha2::{Digest, Sha256};

/// A 32-byte SHA-256 digest.
pub type Digest32 = [u8; 32];

/// Hash a byte slice, returning a 32-byte SHA-256 digest.
pub fn hash(data: &[u8]) -> Digest32 {
    Sha256::digest(data).into()
}

/// Hash the concatenation `a || b` without building the joined buffer.
///
///   hash_pair(a, b) == hash(&[a, b].concat())
pub fn hash_pair(a: &[u8], b: &[u8]) -> Digest32 {
    Sha256::new().chain_update(a).chain_update(b).finalize().into()
}

/// Incremental SHA-256 hasher for inputs that arrive in pieces.
///
/// # Example
/// ```
/// use gossamer_core::crypto::Hasher;
/// let mut h = Hasher::new();
/// h.update(b"hello ");
/// h.update(b"world");
/// let digest = h.finalize();
/// assert_eq!(digest, gossamer_core::crypto::hash(b"hello world"));
/// ```
pub struct Hasher(Sha256);

impl Hasher {
    pub fn new() -> Self {
        Self(Sha256::new())
    }

    pub fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    pub fn finalize(self) -> Digest32 {
        self.0.finalize().into()
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}
