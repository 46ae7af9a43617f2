//! Announcements and the envelope that carries them between relays.
//!
//! An envelope travels as the payload of an `A` message:
//!
//!   [hop: 1][nonce_len: 1][nonce][origin: 32][epoch_hour_ns: 8, LE][body]
//!
//! `hop` is the only field a relay changes. The nonce is minted once by the
//! originator and must never be altered in transit.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use gossamer_core::admission::{AdmissionError, AdmissionSearch, HappinessCheck, Nonce};
use gossamer_core::crypto::{Digest32, Hasher};
use gossamer_core::time;
use gossamer_core::wire::{self, Address, Message, MessageType, WireError, RECEIVER_LEN};

/// Message type carrying announce envelopes. Uppercase, so it gets the
/// 4-byte length field.
pub const ANNOUNCE_TYPE: MessageType = match MessageType::from_byte(b'A') {
    Some(t) => t,
    None => panic!("announce type must be printable"),
};

/// hop + nonce_len + origin + epoch
const FIXED_LEN: usize = 1 + 1 + RECEIVER_LEN + 8;

// ── Announcement ──────────────────────────────────────────────────────────────

/// What an originating node broadcasts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    /// Address of the originating node.
    pub origin: Address,
    /// Start of the UTC hour the announcement was made in.
    pub epoch_hour_ns: u64,
    /// Opaque application payload.
    pub body: Vec<u8>,
}

impl Announcement {
    /// Announcement stamped with the current hour.
    pub fn new(origin: Address, body: impl Into<Vec<u8>>) -> Self {
        Self::at_epoch(origin, time::current_hour_start_ns(), body)
    }

    /// Announcement stamped with the hour containing `time_ns`.
    pub fn at_epoch(origin: Address, time_ns: u64, body: impl Into<Vec<u8>>) -> Self {
        Self {
            origin,
            epoch_hour_ns: time::hour_start_ns(time_ns),
            body: body.into(),
        }
    }

    /// The proof-of-work target: sha256(origin || epoch_le || body).
    pub fn announce_hash(&self) -> Digest32 {
        let mut h = Hasher::new();
        h.update(&self.origin);
        h.update(&self.epoch_hour_ns.to_le_bytes());
        h.update(&self.body);
        h.finalize()
    }
}

// ── Envelope ──────────────────────────────────────────────────────────────────

/// An announcement plus its admission nonce and current hop count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnounceEnvelope {
    pub hop: u8,
    pub nonce: Nonce,
    pub announcement: Announcement,
}

impl AnnounceEnvelope {
    /// The copy a relay sends onward: same nonce, hop advanced by one.
    pub fn forwarded(&self) -> Self {
        Self {
            hop: self.hop.saturating_add(1),
            nonce: self.nonce.clone(),
            announcement: self.announcement.clone(),
        }
    }

    pub fn encode(&self) -> Result<Bytes, RelayError> {
        let nonce_len =
            u8::try_from(self.nonce.len()).map_err(|_| RelayError::NonceTooLong(self.nonce.len()))?;

        let body = &self.announcement.body;
        let mut buf = BytesMut::with_capacity(FIXED_LEN + self.nonce.len() + body.len());
        buf.put_u8(self.hop);
        buf.put_u8(nonce_len);
        buf.put_slice(self.nonce.as_bytes());
        buf.put_slice(&self.announcement.origin);
        buf.put_u64_le(self.announcement.epoch_hour_ns);
        buf.put_slice(body);
        Ok(buf.freeze())
    }

    pub fn decode(mut buf: &[u8]) -> Result<Self, RelayError> {
        ensure_remaining(buf, 2)?;
        let hop = buf.get_u8();
        let nonce_len = usize::from(buf.get_u8());

        ensure_remaining(buf, nonce_len + RECEIVER_LEN + 8)?;
        let nonce = Nonce::from(buf[..nonce_len].to_vec());
        buf.advance(nonce_len);

        let mut origin = [0u8; RECEIVER_LEN];
        buf.copy_to_slice(&mut origin);
        let epoch_hour_ns = buf.get_u64_le();

        Ok(Self {
            hop,
            nonce,
            announcement: Announcement {
                origin,
                epoch_hour_ns,
                body: buf.to_vec(),
            },
        })
    }

    /// Wrap the envelope in an `A` message addressed to `receiver`.
    pub fn to_message(&self, receiver: Address) -> Result<Message, RelayError> {
        Ok(Message::new(ANNOUNCE_TYPE, receiver, self.encode()?.to_vec()))
    }

    pub fn from_message(message: &Message) -> Result<Self, RelayError> {
        if message.message_type != ANNOUNCE_TYPE {
            return Err(RelayError::NotAnnouncement(message.message_type));
        }
        Self::decode(&message.payload)
    }

    /// Encode straight to a wire frame.
    pub fn to_frame(&self, receiver: Address) -> Result<Vec<u8>, RelayError> {
        Ok(wire::serialize(&self.to_message(receiver)?)?)
    }

    /// Decode the frame at the start of `bytes`; also returns the receiver
    /// and how many bytes the frame used.
    pub fn from_frame(bytes: &[u8]) -> Result<(Self, Address, usize), RelayError> {
        let (message, used) = wire::deserialize_prefix(bytes)?;
        let envelope = Self::from_message(&message)?;
        Ok((envelope, message.receiver, used))
    }
}

fn ensure_remaining(buf: &[u8], needed: usize) -> Result<(), RelayError> {
    if buf.remaining() < needed {
        return Err(RelayError::Truncated {
            needed,
            available: buf.remaining(),
        });
    }
    Ok(())
}

/// Mint the admission nonce for a fresh announcement. Runs the full search,
/// so only the originator calls this.
pub fn mint<C: HappinessCheck>(
    search: &AdmissionSearch<C>,
    announcement: Announcement,
    diam: usize,
) -> Result<AnnounceEnvelope, AdmissionError> {
    let nonce = search.find(&announcement.announce_hash(), diam)?;
    tracing::info!(
        origin = hex::encode(announcement.origin),
        diam,
        nonce = %nonce,
        "announcement minted"
    );
    Ok(AnnounceEnvelope {
        hop: 0,
        nonce,
        announcement,
    })
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("expected announce message type '{}', got '{0}'", ANNOUNCE_TYPE)]
    NotAnnouncement(MessageType),

    #[error("announce payload truncated: needed {needed} more bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("nonce of {0} bytes exceeds the 255-byte envelope limit")]
    NonceTooLong(usize),
}

// ── Tests ─────────────────────────────────────────────────────────────────────
