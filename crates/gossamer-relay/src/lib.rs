//! gossamer-relay: announcement admission for relaying nodes.
//!
//! The originator mints an admission nonce once (`mint`). Every relay decodes
//! the envelope, re-checks happiness at its own hop, and decides whether to
//! forward, deliver, or drop (`AnnouncementFilter`).

pub mod announcement;
pub mod filter;

pub use announcement::{mint, AnnounceEnvelope, Announcement, RelayError, ANNOUNCE_TYPE};
pub use filter::{Admission, AnnouncementFilter, SeenEntry, MAX_CLOCK_SKEW_HOURS};
