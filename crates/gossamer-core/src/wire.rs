//! Gossamer wire format: point-to-point message framing.
//!
//! Every message on the wire is a single frame:
//!
//!   [type: 1][length: 1 or 4, little-endian][receiver: 32][payload]
//!
//! The length field counts everything after itself, i.e. the 32-byte
//! receiver plus the payload. Its width is chosen by the casing of the type
//! character: lowercase letters get a compact 1-byte field, every other
//! printable character a 4-byte field. Both rules are part of the protocol;
//! changing either one breaks every node on the network.

use std::fmt;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Receiver address length in bytes.
pub const RECEIVER_LEN: usize = 32;

/// Type field length in bytes.
pub const TYPE_LEN: usize = 1;

/// A node address, the fixed 32-byte `receiver` of every frame.
pub type Address = [u8; RECEIVER_LEN];

// ── Message type ──────────────────────────────────────────────────────────────

/// One-character message kind.
///
/// Always exactly one printable ASCII byte, so what `serialize` writes is
/// exactly what `deserialize` reads back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageType(u8);

impl MessageType {
    /// Wrap a raw type byte. Returns `None` unless it is printable ASCII.
    pub const fn from_byte(byte: u8) -> Option<Self> {
        if byte.is_ascii_graphic() {
            Some(Self(byte))
        } else {
            None
        }
    }

    pub const fn as_byte(self) -> u8 {
        self.0
    }

    pub const fn as_char(self) -> char {
        self.0 as char
    }

    /// Width of the length field for this kind.
    ///
    /// A character that title-cases to itself (uppercase letters, digits,
    /// punctuation) gets the 4-byte field; lowercase letters get 1 byte.
    pub const fn length_field(self) -> LengthField {
        if self.0.is_ascii_lowercase() {
            LengthField::Short
        } else {
            LengthField::Long
        }
    }
}

impl TryFrom<char> for MessageType {
    type Error = WireError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        u8::try_from(c)
            .ok()
            .and_then(MessageType::from_byte)
            .ok_or(WireError::InvalidType(c))
    }
}

impl From<MessageType> for char {
    fn from(t: MessageType) -> char {
        t.as_char()
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

// ── Length field ──────────────────────────────────────────────────────────────

/// Width of the frame length field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthField {
    /// 1 byte, lowercase kinds. Frames carry at most 223 payload bytes.
    Short,
    /// 4 bytes, every other kind.
    Long,
}

impl LengthField {
    pub const fn width(self) -> usize {
        match self {
            LengthField::Short => 1,
            LengthField::Long => 4,
        }
    }

    /// Largest value the field can hold.
    pub const fn max_value(self) -> u64 {
        match self {
            LengthField::Short => u8::MAX as u64,
            LengthField::Long => u32::MAX as u64,
        }
    }

    /// Largest payload a frame with this field can carry.
    pub const fn max_payload(self) -> u64 {
        self.max_value() - RECEIVER_LEN as u64
    }

    fn encode(self, value: u64, out: &mut Vec<u8>) {
        match self {
            LengthField::Short => out.push(value as u8),
            LengthField::Long => out.extend_from_slice(&(value as u32).to_le_bytes()),
        }
    }

    /// `bytes` must be exactly `self.width()` long.
    fn decode(self, bytes: &[u8]) -> u32 {
        match self {
            LengthField::Short => u32::from(bytes[0]),
            LengthField::Long => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        }
    }
}

// ── Message ───────────────────────────────────────────────────────────────────

/// A point-to-point message as carried by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub message_type: MessageType,
    pub receiver: Address,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(message_type: MessageType, receiver: Address, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            message_type,
            receiver,
            payload: payload.into(),
        }
    }

    /// Total encoded size of this message, header included.
    pub fn frame_len(&self) -> usize {
        TYPE_LEN + self.message_type.length_field().width() + RECEIVER_LEN + self.payload.len()
    }
}

// ── Encoding ──────────────────────────────────────────────────────────────────

/// Encode a message into a fresh buffer.
pub fn serialize(message: &Message) -> Result<Vec<u8>, WireError> {
    let mut out = Vec::with_capacity(message.frame_len());
    serialize_into(message, &mut out)?;
    Ok(out)
}

/// Append the encoded frame to `out`. Nothing is written on error.
pub fn serialize_into(message: &Message, out: &mut Vec<u8>) -> Result<(), WireError> {
    let field = message.message_type.length_field();
    let declared = message.payload.len() as u64 + RECEIVER_LEN as u64;
    if declared > field.max_value() {
        return Err(WireError::PayloadTooLarge {
            len: message.payload.len(),
            max: field.max_payload(),
        });
    }

    out.reserve(message.frame_len());
    out.push(message.message_type.as_byte());
    field.encode(declared, out);
    out.extend_from_slice(&message.receiver);
    out.extend_from_slice(&message.payload);
    Ok(())
}

// ── Decoding ──────────────────────────────────────────────────────────────────

/// Decode the frame at the start of `bytes`. Trailing bytes are ignored.
pub fn deserialize(bytes: &[u8]) -> Result<Message, WireError> {
    deserialize_prefix(bytes).map(|(message, _)| message)
}

/// Decode the frame at the start of `bytes` and report how many bytes it
/// occupied, so a caller can walk a buffer of concatenated frames.
pub fn deserialize_prefix(bytes: &[u8]) -> Result<(Message, usize), WireError> {
    let &type_byte = bytes.first().ok_or(Malformed::Truncated {
        needed: TYPE_LEN,
        available: 0,
    })?;
    let message_type = MessageType::from_byte(type_byte).ok_or(Malformed::InvalidType(type_byte))?;

    let field = message_type.length_field();
    let receiver_start = TYPE_LEN + field.width();
    let payload_start = receiver_start + RECEIVER_LEN;
    if bytes.len() < payload_start {
        return Err(Malformed::Truncated {
            needed: payload_start,
            available: bytes.len(),
        }
        .into());
    }

    let declared = field.decode(&bytes[TYPE_LEN..receiver_start]);
    let payload_len = (declared as usize)
        .checked_sub(RECEIVER_LEN)
        .ok_or(Malformed::LengthBelowReceiver(declared))?;

    // A declared length near u32::MAX can overflow a 32-bit usize.
    let frame_end = payload_start.checked_add(payload_len).ok_or(Malformed::Truncated {
        needed: usize::MAX,
        available: bytes.len(),
    })?;
    if bytes.len() < frame_end {
        return Err(Malformed::Truncated {
            needed: frame_end,
            available: bytes.len(),
        }
        .into());
    }

    let mut receiver = [0u8; RECEIVER_LEN];
    receiver.copy_from_slice(&bytes[receiver_start..payload_start]);

    let message = Message {
        message_type,
        receiver,
        payload: bytes[payload_start..frame_end].to_vec(),
    };
    Ok((message, frame_end))
}

/// Iterator over the frames of a buffer holding concatenated messages.
///
/// Yields one `Err` and then stops if a frame fails to decode.
pub fn frames(bytes: &[u8]) -> Frames<'_> {
    Frames { rest: bytes }
}

pub struct Frames<'a> {
    rest: &'a [u8],
}

impl Iterator for Frames<'_> {
    type Item = Result<Message, WireError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        match deserialize_prefix(self.rest) {
            Ok((message, used)) => {
                self.rest = &self.rest[used..];
                Some(Ok(message))
            }
            Err(e) => {
                self.rest = &[];
                Some(Err(e))
            }
        }
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Structural problems found while decoding a frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Malformed {
    #[error("frame truncated: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("type byte 0x{0:02x} is not a printable ASCII character")]
    InvalidType(u8),

    #[error("length field {0} is shorter than the {}-byte receiver", RECEIVER_LEN)]
    LengthBelowReceiver(u32),
}

/// Errors that can arise when encoding or decoding wire-format data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("malformed message: {0}")]
    Malformed(#[from] Malformed),

    #[error("payload length {len} exceeds maximum {max} for this message type")]
    PayloadTooLarge { len: usize, max: u64 },

    #[error("message type {0:?} is not a single printable ASCII character")]
    InvalidType(char),
}

impl WireError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, WireError::Malformed(_))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
