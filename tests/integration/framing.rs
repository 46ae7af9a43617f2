use crate::*;

use gossamer_core::wire::{self, Malformed, Message, MessageType, WireError};

/// Mixed short and long frames written back to back decode in order.
#[test]
fn concatenated_stream_decodes_frame_by_frame() -> Result<()> {
    let announce = minted(b"in a stream", 2)?.to_message(address(1))?;
    let chat = Message::new(MessageType::try_from('m')?, address(2), b"hey".to_vec());
    let bulk = Message::new(MessageType::try_from('B')?, address(3), vec![0x42; 1000]);

    let mut stream = Vec::new();
    for m in [&announce, &chat, &bulk] {
        wire::serialize_into(m, &mut stream)?;
    }

    let decoded: Vec<Message> = wire::frames(&stream).collect::<Result<_, _>>()?;
    assert_eq!(decoded, [announce, chat, bulk]);
    Ok(())
}

#[test]
fn frame_cut_mid_payload_is_malformed() -> Result<()> {
    let message = Message::new(MessageType::try_from('C')?, address(0), b"cut short".to_vec());
    let bytes = wire::serialize(&message)?;

    let err = wire::deserialize(&bytes[..bytes.len() - 1]).unwrap_err();
    assert_eq!(
        err,
        WireError::Malformed(Malformed::Truncated {
            needed: bytes.len(),
            available: bytes.len() - 1
        })
    );
    Ok(())
}

#[test]
fn announce_frames_use_the_long_length_field() -> Result<()> {
    let envelope = minted(b"long field", 1)?;
    let frame = envelope.to_frame(address(0))?;
    let payload_len = envelope.encode()?.len();

    assert_eq!(frame[0], b'A');
    let declared = u32::from_le_bytes([frame[1], frame[2], frame[3], frame[4]]);
    assert_eq!(declared as usize, payload_len + 32);
    assert_eq!(frame.len(), 1 + 4 + 32 + payload_len);
    Ok(())
}
