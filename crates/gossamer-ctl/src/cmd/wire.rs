//! Wire commands: encode a message, decode a buffer of frames.

use anyhow::{Context, Result};
use serde::Serialize;

use gossamer_core::wire::{self, Message, MessageType};
use gossamer_relay::{AnnounceEnvelope, ANNOUNCE_TYPE};

use super::parse_digest;

#[derive(Serialize)]
struct DecodedFrame {
    message_type: char,
    receiver: String,
    payload_len: usize,
    payload_hex: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    announcement: Option<DecodedAnnouncement>,
}

#[derive(Serialize)]
struct DecodedAnnouncement {
    hop: u8,
    nonce: String,
    origin: String,
    epoch_hour_ns: u64,
    announce_hash: String,
    body: String,
}

pub fn cmd_encode(type_arg: &str, receiver_hex: &str, payload: &str) -> Result<()> {
    let mut chars = type_arg.chars();
    let message_type = match (chars.next(), chars.next()) {
        (Some(c), None) => MessageType::try_from(c)?,
        _ => anyhow::bail!("message type must be exactly one character, got '{type_arg}'"),
    };
    let receiver = parse_digest(receiver_hex).context("receiver")?;
    let message = Message::new(message_type, receiver, payload.as_bytes().to_vec());

    let frame = wire::serialize(&message)?;
    println!("{}", hex::encode(frame));
    Ok(())
}

pub fn cmd_decode(frame_hex: &str) -> Result<()> {
    let bytes = hex::decode(frame_hex).context("frame is not valid hex")?;

    let mut decoded = Vec::new();
    for (index, frame) in wire::frames(&bytes).enumerate() {
        let message = frame.with_context(|| format!("frame {index}"))?;
        decoded.push(describe(&message)?);
    }

    println!("{}", serde_json::to_string_pretty(&decoded)?);
    Ok(())
}

fn describe(message: &Message) -> Result<DecodedFrame> {
    let announcement = if message.message_type == ANNOUNCE_TYPE {
        let envelope = AnnounceEnvelope::from_message(message)?;
        Some(DecodedAnnouncement {
            hop: envelope.hop,
            nonce: envelope.nonce.to_string(),
            origin: hex::encode(envelope.announcement.origin),
            epoch_hour_ns: envelope.announcement.epoch_hour_ns,
            announce_hash: hex::encode(envelope.announcement.announce_hash()),
            body: String::from_utf8_lossy(&envelope.announcement.body).into_owned(),
        })
    } else {
        None
    };

    Ok(DecodedFrame {
        message_type: message.message_type.as_char(),
        receiver: hex::encode(message.receiver),
        payload_len: message.payload.len(),
        payload_hex: hex::encode(&message.payload),
        announcement,
    })
}
