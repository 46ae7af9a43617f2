use crate::*;

use gossamer_core::admission::verify_chain;

/// Independent searches share no state and can run side by side.
#[tokio::test]
async fn concurrent_mints_are_independent() -> Result<()> {
    let diam = 3;
    let tasks: Vec<_> = (0..8)
        .map(|i| tokio::task::spawn_blocking(move || minted(format!("node {i}").as_bytes(), diam)))
        .collect();

    let mut envelopes = Vec::new();
    for task in tasks {
        envelopes.push(task.await??);
    }

    for envelope in &envelopes {
        let hash = envelope.announcement.announce_hash();
        assert!(verify_chain(&hash, envelope.nonce.as_bytes(), diam));
        // same input, same nonce
        assert_eq!(minted(&envelope.announcement.body, diam)?.nonce, envelope.nonce);
    }
    Ok(())
}

/// Relay clones on different tasks share one seen-cache: exactly one wins.
#[tokio::test]
async fn shared_cache_admits_an_announcement_once() -> Result<()> {
    let relay = AnnouncementFilter::new(2, 2);
    let envelope = minted(b"race", 2)?;

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let relay = relay.clone();
            let envelope = envelope.clone();
            tokio::spawn(async move { relay.admit_at(&envelope, EPOCH) })
        })
        .collect();

    let mut accepted = 0;
    for task in tasks {
        match task.await? {
            Admission::Forward => accepted += 1,
            Admission::Duplicate => {}
            other => bail!("unexpected decision {other:?}"),
        }
    }
    assert_eq!(accepted, 1);
    assert_eq!(relay.len(), 1);
    Ok(())
}
