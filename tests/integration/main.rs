//! Gossamer integration test harness.
//!
//! Tests in this crate drive the public APIs of gossamer-core and
//! gossamer-relay together: an originator mints an announcement, encodes it
//! onto the wire, and a line of in-process relays decodes, admits and
//! forwards it hop by hop. No sockets are involved; frames are handed from
//! one relay to the next as byte buffers.

use anyhow::{bail, Result};

use gossamer_core::admission::AdmissionSearch;
use gossamer_core::time::NANOS_PER_HOUR;
use gossamer_core::wire::Address;
use gossamer_relay::{mint, Admission, AnnounceEnvelope, Announcement, AnnouncementFilter};

mod concurrency;
mod framing;
mod propagation;

// ── Harness ───────────────────────────────────────────────────────────────────

/// Fixed epoch so tests do not depend on the wall clock.
pub const EPOCH: u64 = 490_000 * NANOS_PER_HOUR;

/// Deterministic address for relay `i`.
pub fn address(i: usize) -> Address {
    let mut a = [0u8; 32];
    a[..8].copy_from_slice(&(i as u64).to_be_bytes());
    a[31] = 0xee;
    a
}

/// A line of relays: the originator talks to relay 0, relay i to relay i+1.
pub struct RelayLine {
    pub relays: Vec<AnnouncementFilter>,
}

impl RelayLine {
    pub fn new(len: usize, diameter: usize) -> Self {
        Self {
            relays: (0..len).map(|_| AnnouncementFilter::new(diameter, 2)).collect(),
        }
    }

    /// Push an encoded frame down the line. Returns each relay's decision
    /// until one stops forwarding.
    pub fn propagate(&self, mut frame: Vec<u8>) -> Result<Vec<Admission>> {
        let mut decisions = Vec::new();
        for (i, relay) in self.relays.iter().enumerate() {
            let (envelope, receiver, used) = AnnounceEnvelope::from_frame(&frame)?;
            if receiver != address(i) {
                bail!("frame for relay {i} was addressed elsewhere");
            }
            if used != frame.len() {
                bail!("frame for relay {i} has {} trailing bytes", frame.len() - used);
            }

            let decision = relay.admit_at(&envelope, EPOCH);
            decisions.push(decision);
            if decision != Admission::Forward {
                break;
            }
            frame = envelope.forwarded().to_frame(address(i + 1))?;
        }
        Ok(decisions)
    }
}

/// Mint an announcement with the default search.
pub fn minted(body: &[u8], diam: usize) -> Result<AnnounceEnvelope> {
    let announcement = Announcement::at_epoch([0xa1; 32], EPOCH, body.to_vec());
    Ok(mint(&AdmissionSearch::new(), announcement, diam)?)
}
