use crate::*;

use gossamer_core::admission::{is_hash_happy, repeated_hash, verify_at_hop, Nonce};

/// A minted announcement crosses exactly `diam` relays.
#[test]
fn announcement_travels_the_full_diameter() -> Result<()> {
    let diam = 4;
    let line = RelayLine::new(6, diam);
    let envelope = minted(b"service: storage", diam)?;

    let decisions = line.propagate(envelope.to_frame(address(0))?)?;
    assert_eq!(
        decisions,
        [Admission::Forward, Admission::Forward, Admission::Forward, Admission::Deliver]
    );
    for (i, relay) in line.relays.iter().enumerate() {
        assert_eq!(relay.has_seen(&envelope.announcement.announce_hash()), i < diam);
    }
    Ok(())
}

/// Each relay recomputes its own hop hash; the nonce must satisfy all of them.
#[test]
fn proof_holds_for_every_minted_hop() -> Result<()> {
    let diam = 3;
    let envelope = minted(b"hop check", diam)?;
    let hash = envelope.announcement.announce_hash();

    for hop in 0..diam {
        let at_hop = repeated_hash(&hash, hop);
        assert!(is_hash_happy(&at_hop, envelope.nonce.as_bytes()), "hop {hop}");
    }
    Ok(())
}

#[test]
fn resending_the_same_announcement_is_deduplicated() -> Result<()> {
    let line = RelayLine::new(3, 3);
    let envelope = minted(b"twice", 3)?;
    let frame = envelope.to_frame(address(0))?;

    assert!(line.propagate(frame.clone())?[0].is_accepted());
    assert_eq!(line.propagate(frame)?, [Admission::Duplicate]);
    Ok(())
}

#[test]
fn tampered_body_is_stopped_at_the_first_relay() -> Result<()> {
    let line = RelayLine::new(3, 3);
    let mut envelope = minted(b"original", 3)?;

    // find a body the minted nonce does not cover at hop 0
    let tampered = (0u32..)
        .map(|i| format!("forged {i}").into_bytes())
        .find(|body| {
            let mut a = envelope.announcement.clone();
            a.body = body.clone();
            !verify_at_hop(&a.announce_hash(), envelope.nonce.as_bytes(), 0)
        })
        .expect("some body must be unhappy");
    envelope.announcement.body = tampered;

    assert_eq!(line.propagate(envelope.to_frame(address(0))?)?, [Admission::Unhappy]);
    assert!(line.relays[0].is_empty());
    Ok(())
}

#[test]
fn skipped_hop_count_past_diameter_is_refused() -> Result<()> {
    let line = RelayLine::new(1, 2);
    let mut envelope = minted(b"liar", 2)?;
    envelope.hop = 2;
    assert_eq!(line.propagate(envelope.to_frame(address(0))?)?, [Admission::BeyondDiameter]);
    Ok(())
}

#[test]
fn empty_nonce_is_a_valid_proof_when_the_hash_is_already_happy() -> Result<()> {
    // Search bodies until the announce hash itself is happy at hop 0.
    let announcement = (0u32..)
        .map(|i| Announcement::at_epoch([0xb2; 32], EPOCH, format!("lucky {i}").into_bytes()))
        .find(|a| is_hash_happy(&a.announce_hash(), &[]))
        .expect("one in eight bodies is happy");

    let envelope = mint(&AdmissionSearch::new(), announcement, 1)?;
    assert_eq!(envelope.nonce, Nonce::default());

    let line = RelayLine::new(1, 1);
    assert_eq!(line.propagate(envelope.to_frame(address(0))?)?, [Admission::Deliver]);
    Ok(())
}
