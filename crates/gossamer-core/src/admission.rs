//! Admission proof of work: diameter-scaled "happy hash" search.
//!
//! A hash is happy when its top three bits are zero, which a uniformly random
//! digest satisfies with probability 1/8. The originator of an announcement
//! searches for a nonce that keeps the announce hash happy at every hop of
//! the network:
//!
//!   for i in 0..diam:  is_hash_happy(sha256^i(announce_hash), nonce)
//!
//! Expected search cost is 8^diam keyed hashes. A relay at hop `i` only
//! rehashes the announce hash `i` times and runs one happiness check, so
//! verification stays cheap no matter how large the diameter is.
//!
//! Candidate nonces are the minimal big-endian encodings of 0, 1, 2, ...;
//! the encoding of 0 is the empty byte string, which checks the hash unkeyed.

use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::AdmissionConfig;
use crate::crypto::{self, Digest32};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Bits of the first hash byte that must be zero.
pub const HAPPINESS_MASK: u8 = 0b1110_0000;

/// Hard cap on candidate nonces per search.
pub const ATTEMPTS_TO_FIND_HAPPY_NONCE: u64 = 10_000_000;

/// Candidates handed to one rayon task in a parallel search.
const PARALLEL_BATCH: u64 = 4096;

// ── Nonce ─────────────────────────────────────────────────────────────────────

/// Search-derived bytes appended to a hash before the happiness check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nonce(Vec<u8>);

impl Nonce {
    /// Minimal big-endian encoding of `counter`. Zero encodes as no bytes.
    pub fn from_counter(counter: u64) -> Self {
        let mut buf = [0u8; 8];
        Self(counter_bytes(counter, &mut buf).to_vec())
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        hex::decode(s).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Nonce {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Nonce {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

/// Write the minimal big-endian bytes of `counter` into `buf` and return them.
fn counter_bytes(counter: u64, buf: &mut [u8; 8]) -> &[u8] {
    *buf = counter.to_be_bytes();
    let skip = (counter.leading_zeros() / 8) as usize;
    &buf[skip..]
}

// ── Predicate ─────────────────────────────────────────────────────────────────

/// Single-step admission predicate.
///
/// With a non-empty `nonce` the checked value is `sha256(hash || nonce)`;
/// with an empty one it is `hash` itself.
pub fn is_hash_happy(hash: &Digest32, nonce: &[u8]) -> bool {
    if nonce.is_empty() {
        return hash[0] & HAPPINESS_MASK == 0;
    }
    crypto::hash_pair(hash, nonce)[0] & HAPPINESS_MASK == 0
}

/// Apply the unkeyed hash `rounds` times. Zero rounds returns `hash` unchanged.
pub fn repeated_hash(hash: &Digest32, rounds: usize) -> Digest32 {
    let mut h = *hash;
    for _ in 0..rounds {
        h = crypto::hash(&h);
    }
    h
}

/// The check a relay at `hop` performs: one happiness test on its own
/// hop-advanced copy of the announce hash.
pub fn verify_at_hop(announce_hash: &Digest32, nonce: &[u8], hop: usize) -> bool {
    is_hash_happy(&repeated_hash(announce_hash, hop), nonce)
}

/// True iff `nonce` keeps `announce_hash` happy at every hop in `0..diam`.
pub fn verify_chain(announce_hash: &Digest32, nonce: &[u8], diam: usize) -> bool {
    survives_chain(&HappyHash, announce_hash, nonce, diam)
}

/// Happiness predicate used by `AdmissionSearch`.
///
/// Production code uses `HappyHash`; tests substitute their own.
pub trait HappinessCheck: Sync {
    fn is_happy(&self, hash: &Digest32, nonce: &[u8]) -> bool;
}

/// The network's predicate: `is_hash_happy`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HappyHash;

impl HappinessCheck for HappyHash {
    fn is_happy(&self, hash: &Digest32, nonce: &[u8]) -> bool {
        is_hash_happy(hash, nonce)
    }
}

impl<T: HappinessCheck + ?Sized> HappinessCheck for &T {
    fn is_happy(&self, hash: &Digest32, nonce: &[u8]) -> bool {
        (**self).is_happy(hash, nonce)
    }
}

fn survives_chain<C: HappinessCheck>(
    check: &C,
    announce_hash: &Digest32,
    nonce: &[u8],
    diam: usize,
) -> bool {
    let mut hash = *announce_hash;
    for round in 0..diam {
        if !check.is_happy(&hash, nonce) {
            return false;
        }
        if round + 1 < diam {
            hash = crypto::hash(&hash);
        }
    }
    true
}

// ── Search ────────────────────────────────────────────────────────────────────

/// Nonce search with a configurable cap, predicate, and parallelism.
///
/// Both modes return the lowest qualifying candidate, so a parallel search
/// yields the same nonce as a sequential one.
#[derive(Debug, Clone)]
pub struct AdmissionSearch<C = HappyHash> {
    check: C,
    max_attempts: u64,
    parallel: bool,
}

impl AdmissionSearch<HappyHash> {
    pub fn new() -> Self {
        Self {
            check: HappyHash,
            max_attempts: ATTEMPTS_TO_FIND_HAPPY_NONCE,
            parallel: false,
        }
    }

    pub fn from_config(config: &AdmissionConfig) -> Self {
        Self::new()
            .max_attempts(config.max_attempts)
            .parallel(config.parallel)
    }
}

impl Default for AdmissionSearch<HappyHash> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: HappinessCheck> AdmissionSearch<C> {
    /// Replace the happiness predicate.
    pub fn with_check<D: HappinessCheck>(self, check: D) -> AdmissionSearch<D> {
        AdmissionSearch {
            check,
            max_attempts: self.max_attempts,
            parallel: self.parallel,
        }
    }

    pub fn max_attempts(mut self, attempts: u64) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    pub fn attempt_cap(&self) -> u64 {
        self.max_attempts
    }

    /// Find the first nonce that survives all `diam` rounds.
    ///
    /// A diameter of zero is satisfied vacuously by the empty nonce.
    pub fn find(&self, announce_hash: &Digest32, diam: usize) -> Result<Nonce, AdmissionError> {
        let found = if self.parallel {
            self.find_parallel(announce_hash, diam)
        } else {
            self.find_sequential(announce_hash, diam)
        };

        match found {
            Some(counter) => {
                let nonce = Nonce::from_counter(counter);
                tracing::debug!(
                    announce_hash = hex::encode(announce_hash),
                    diam,
                    attempts = counter + 1,
                    nonce = %nonce,
                    "admission proof found"
                );
                Ok(nonce)
            }
            None => {
                tracing::warn!(
                    announce_hash = hex::encode(announce_hash),
                    diam,
                    attempts = self.max_attempts,
                    "admission proof search exhausted"
                );
                Err(AdmissionError::ProofNotFound {
                    diam,
                    attempts: self.max_attempts,
                })
            }
        }
    }

    fn survives(&self, announce_hash: &Digest32, counter: u64, diam: usize) -> bool {
        let mut buf = [0u8; 8];
        survives_chain(&self.check, announce_hash, counter_bytes(counter, &mut buf), diam)
    }

    fn find_sequential(&self, announce_hash: &Digest32, diam: usize) -> Option<u64> {
        (0..self.max_attempts).find(|&counter| self.survives(announce_hash, counter, diam))
    }

    fn find_parallel(&self, announce_hash: &Digest32, diam: usize) -> Option<u64> {
        let batches = self.max_attempts.div_ceil(PARALLEL_BATCH);
        (0..batches).into_par_iter().find_map_first(|batch| {
            let start = batch * PARALLEL_BATCH;
            let end = (start + PARALLEL_BATCH).min(self.max_attempts);
            (start..end).find(|&counter| self.survives(announce_hash, counter, diam))
        })
    }
}

/// Mint an admission nonce with the default cap, sequentially.
pub fn find_happy_announce_hash_nonce(
    announce_hash: &Digest32,
    diam: usize,
) -> Result<Nonce, AdmissionError> {
    AdmissionSearch::new().find(announce_hash, diam)
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionError {
    #[error("admission proof not found: diameter {diam}, {attempts} attempts")]
    ProofNotFound { diam: usize, attempts: u64 },
}

// ── Tests ─────────────────────────────────────────────────────────────────────
