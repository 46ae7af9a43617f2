//! Relay-side admission filter.
//!
//! A relay never re-runs the nonce search. For an envelope at hop `i` it
//! rehashes the announce hash `i` times, runs a single happiness check, and
//! consults its seen-cache. The cache is keyed by announce hash and shared
//! between clones, so every task on a node sees the same history. Entries
//! expire once their epoch is older than the configured TTL. Epochs more than
//! `MAX_CLOCK_SKEW_HOURS` ahead of the relay's clock are never cached.

use std::sync::Arc;
use std::time::Instant;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use gossamer_core::admission::verify_at_hop;
use gossamer_core::config::GossamerConfig;
use gossamer_core::crypto::Digest32;
use gossamer_core::time;

use crate::announcement::AnnounceEnvelope;

/// How far ahead of the local hour an announcement epoch may be.
pub const MAX_CLOCK_SKEW_HOURS: u64 = 1;

/// What a relay should do with an incoming envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Accepted and cached; send `forwarded()` copies to neighbours.
    Forward,
    /// Accepted and cached at the last hop the proof covers. Do not forward.
    Deliver,
    /// Already seen. Drop silently.
    Duplicate,
    /// Hop is at or past the diameter the proof was minted for.
    BeyondDiameter,
    /// The nonce does not make this hop's hash happy.
    Unhappy,
    /// Epoch is older than the cache TTL.
    Stale,
    /// Epoch is further ahead of the local clock than `MAX_CLOCK_SKEW_HOURS`.
    FromFuture,
}

impl Admission {
    pub fn is_accepted(self) -> bool {
        matches!(self, Admission::Forward | Admission::Deliver)
    }
}

/// A cached announcement.
#[derive(Debug, Clone)]
pub struct SeenEntry {
    pub epoch_hour_ns: u64,
    /// Hop at which this relay first accepted it.
    pub hop: u8,
    pub first_seen: Instant,
}

#[derive(Clone)]
pub struct AnnouncementFilter {
    diameter: usize,
    ttl_hours: u64,
    seen: Arc<DashMap<Digest32, SeenEntry>>,
}

impl AnnouncementFilter {
    pub fn new(diameter: usize, ttl_hours: u64) -> Self {
        Self {
            diameter,
            ttl_hours,
            seen: Arc::new(DashMap::new()),
        }
    }

    pub fn from_config(config: &GossamerConfig) -> Self {
        Self::new(config.admission.diameter, config.relay.cache_ttl_hours)
    }

    pub fn diameter(&self) -> usize {
        self.diameter
    }

    /// Decide on an envelope using the wall clock.
    pub fn admit(&self, envelope: &AnnounceEnvelope) -> Admission {
        self.admit_at(envelope, time::current_hour_start_ns())
    }

    /// Decide on an envelope as of the hour starting at `now_hour_ns`.
    pub fn admit_at(&self, envelope: &AnnounceEnvelope, now_hour_ns: u64) -> Admission {
        let announcement = &envelope.announcement;
        let announce_hash = announcement.announce_hash();
        let hop = usize::from(envelope.hop);
        let short_hash = hex::encode(&announce_hash[..8]);

        if hop >= self.diameter {
            tracing::debug!(
                hash = %short_hash,
                hop,
                diameter = self.diameter,
                "announcement past diameter"
            );
            return Admission::BeyondDiameter;
        }

        let ahead_hours = time::hours_between(now_hour_ns, announcement.epoch_hour_ns);
        if ahead_hours > MAX_CLOCK_SKEW_HOURS {
            tracing::debug!(hash = %short_hash, ahead_hours, "announcement from the future");
            return Admission::FromFuture;
        }

        let age_hours = time::hours_between(announcement.epoch_hour_ns, now_hour_ns);
        if age_hours > self.ttl_hours {
            tracing::debug!(hash = %short_hash, age_hours, "stale announcement");
            return Admission::Stale;
        }

        if !verify_at_hop(&announce_hash, envelope.nonce.as_bytes(), hop) {
            tracing::debug!(
                hash = %short_hash,
                hop,
                nonce = %envelope.nonce,
                "unhappy announcement rejected"
            );
            return Admission::Unhappy;
        }

        match self.seen.entry(announce_hash) {
            Entry::Occupied(_) => {
                tracing::trace!(hash = %short_hash, hop, "duplicate announcement");
                return Admission::Duplicate;
            }
            Entry::Vacant(slot) => {
                slot.insert(SeenEntry {
                    epoch_hour_ns: announcement.epoch_hour_ns,
                    hop: envelope.hop,
                    first_seen: Instant::now(),
                });
            }
        }

        let decision = if hop + 1 < self.diameter {
            Admission::Forward
        } else {
            Admission::Deliver
        };
        tracing::debug!(hash = %short_hash, hop, ?decision, "announcement accepted");
        decision
    }

    pub fn has_seen(&self, announce_hash: &Digest32) -> bool {
        self.seen.contains_key(announce_hash)
    }

    pub fn get(&self, announce_hash: &Digest32) -> Option<SeenEntry> {
        self.seen.get(announce_hash).map(|e| e.clone())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Drop cache entries older than the TTL or dated beyond the clock skew
    /// bound. Returns how many were removed.
    pub fn expire(&self, now_hour_ns: u64) -> usize {
        let before = self.seen.len();
        self.seen.retain(|_, entry| {
            time::hours_between(entry.epoch_hour_ns, now_hour_ns) <= self.ttl_hours
                && time::hours_between(now_hour_ns, entry.epoch_hour_ns) <= MAX_CLOCK_SKEW_HOURS
        });
        let removed = before - self.seen.len();
        if removed > 0 {
            tracing::debug!(removed, "expired seen-cache entries");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::announcement::{mint, Announcement};
    use gossamer_core::admission::{AdmissionSearch, Nonce};
    use gossamer_core::time::NANOS_PER_HOUR;

    const EPOCH: u64 = 1_000 * NANOS_PER_HOUR;

    fn minted(diam: usize, body: &[u8]) -> AnnounceEnvelope {
        let announcement = Announcement::at_epoch([0x5a; 32], EPOCH, body.to_vec());
        mint(&AdmissionSearch::new(), announcement, diam).unwrap()
    }

    fn minted_at(diam: usize, body: &[u8], epoch: u64) -> AnnounceEnvelope {
        let announcement = Announcement::at_epoch([0x5a; 32], epoch, body.to_vec());
        mint(&AdmissionSearch::new(), announcement, diam).unwrap()
    }

    #[test]
    fn each_hop_accepts_until_the_last() {
        let diam = 3;
        let mut envelope = minted(diam, b"walk");
        for hop in 0..diam {
            // a fresh relay at every hop
            let relay = AnnouncementFilter::new(diam, 2);
            let expected = if hop + 1 < diam {
                Admission::Forward
            } else {
                Admission::Deliver
            };
            assert_eq!(relay.admit_at(&envelope, EPOCH), expected, "hop {hop}");
            envelope = envelope.forwarded();
        }
        let relay = AnnouncementFilter::new(diam, 2);
        assert_eq!(relay.admit_at(&envelope, EPOCH), Admission::BeyondDiameter);
    }

    #[test]
    fn second_copy_is_a_duplicate() {
        let relay = AnnouncementFilter::new(2, 2);
        let envelope = minted(2, b"dup");
        assert_eq!(relay.admit_at(&envelope, EPOCH), Admission::Forward);
        assert_eq!(relay.admit_at(&envelope, EPOCH), Admission::Duplicate);
        // arriving later via a longer path is still the same announcement
        assert_eq!(relay.admit_at(&envelope.forwarded(), EPOCH), Admission::Duplicate);
        assert_eq!(relay.len(), 1);
    }

    #[test]
    fn clones_share_the_cache() {
        let relay = AnnouncementFilter::new(2, 2);
        let other = relay.clone();
        let envelope = minted(2, b"shared");
        assert!(relay.admit_at(&envelope, EPOCH).is_accepted());
        assert_eq!(other.admit_at(&envelope, EPOCH), Admission::Duplicate);
        assert!(other.has_seen(&envelope.announcement.announce_hash()));
    }

    #[test]
    fn unhappy_nonce_is_rejected_and_not_cached() {
        let announcement = Announcement::at_epoch([0x66; 32], EPOCH, b"forged".to_vec());
        let hash = announcement.announce_hash();
        let bad = (0u64..)
            .map(Nonce::from_counter)
            .find(|n| !verify_at_hop(&hash, n.as_bytes(), 0))
            .unwrap();
        let envelope = AnnounceEnvelope {
            hop: 0,
            nonce: bad,
            announcement,
        };

        let relay = AnnouncementFilter::new(2, 2);
        assert_eq!(relay.admit_at(&envelope, EPOCH), Admission::Unhappy);
        assert!(relay.is_empty());
    }

    #[test]
    fn old_epoch_is_stale() {
        let relay = AnnouncementFilter::new(2, 2);
        let envelope = minted(2, b"old news");
        assert!(relay.admit_at(&envelope, EPOCH + 2 * NANOS_PER_HOUR).is_accepted());

        let relay = AnnouncementFilter::new(2, 2);
        assert_eq!(relay.admit_at(&envelope, EPOCH + 3 * NANOS_PER_HOUR), Admission::Stale);
    }

    #[test]
    fn expire_removes_only_old_entries() {
        let relay = AnnouncementFilter::new(1, 2);
        let old = minted(1, b"old");
        let mut fresh = minted(1, b"fresh");
        fresh.announcement.epoch_hour_ns = EPOCH + 2 * NANOS_PER_HOUR;
        fresh.nonce = AdmissionSearch::new()
            .find(&fresh.announcement.announce_hash(), 1)
            .unwrap();

        assert!(relay.admit_at(&old, EPOCH).is_accepted());
        assert!(relay.admit_at(&fresh, EPOCH + 2 * NANOS_PER_HOUR).is_accepted());
        assert_eq!(relay.len(), 2);

        assert_eq!(relay.expire(EPOCH + 3 * NANOS_PER_HOUR), 1);
        assert!(!relay.has_seen(&old.announcement.announce_hash()));
        assert!(relay.has_seen(&fresh.announcement.announce_hash()));
        assert_eq!(relay.expire(EPOCH + 3 * NANOS_PER_HOUR), 0);
    }

    #[test]
    fn far_future_epoch_is_refused_and_not_cached() {
        let relay = AnnouncementFilter::new(2, 2);
        let envelope = minted_at(2, b"tomorrow's news", EPOCH + 1_000_000 * NANOS_PER_HOUR);

        assert_eq!(relay.admit_at(&envelope, EPOCH), Admission::FromFuture);
        assert!(relay.is_empty());
        assert_eq!(relay.expire(EPOCH + 100 * NANOS_PER_HOUR), 0);
    }

    #[test]
    fn epoch_within_clock_skew_is_accepted() {
        let relay = AnnouncementFilter::new(2, 2);
        let ahead = minted_at(2, b"slightly early", EPOCH + MAX_CLOCK_SKEW_HOURS * NANOS_PER_HOUR);
        assert_eq!(relay.admit_at(&ahead, EPOCH), Admission::Forward);

        let too_far =
            minted_at(2, b"too early", EPOCH + (MAX_CLOCK_SKEW_HOURS + 1) * NANOS_PER_HOUR);
        assert_eq!(relay.admit_at(&too_far, EPOCH), Admission::FromFuture);
    }

    #[test]
    fn expire_drops_entries_dated_past_the_skew_bound() {
        let relay = AnnouncementFilter::new(2, 2);
        let later = EPOCH + 10 * NANOS_PER_HOUR;
        let envelope = minted_at(2, b"clock stepped back", later);
        assert!(relay.admit_at(&envelope, later).is_accepted());

        assert_eq!(relay.expire(later), 0);
        assert_eq!(relay.expire(EPOCH), 1);
        assert!(relay.is_empty());
    }

    #[test]
    fn cache_records_first_hop() {
        let relay = AnnouncementFilter::new(3, 2);
        let envelope = minted(3, b"hop record").forwarded();
        assert_eq!(relay.admit_at(&envelope, EPOCH), Admission::Forward);
        let entry = relay.get(&envelope.announcement.announce_hash()).unwrap();
        assert_eq!(entry.hop, 1);
        assert_eq!(entry.epoch_hour_ns, EPOCH);
    }

    #[test]
    fn from_config_uses_admission_diameter() {
        let mut config = GossamerConfig::default();
        config.admission.diameter = 6;
        assert_eq!(AnnouncementFilter::from_config(&config).diameter(), 6);
    }
}
