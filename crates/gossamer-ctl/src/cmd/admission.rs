//! Admission proof commands: mint, verify, announce.

use anyhow::{bail, Context, Result};

use gossamer_core::admission::{verify_at_hop, verify_chain, AdmissionSearch, Nonce};
use gossamer_core::config::GossamerConfig;
use gossamer_core::crypto::Digest32;
use gossamer_relay::{mint, Announcement};

use super::{parse_digest, Options};

/// Run a nonce search off the async runtime. Ctrl-C abandons it; the search
/// has no side effects, so there is nothing to undo.
async fn search_blocking(
    config: &GossamerConfig,
    announce_hash: Digest32,
    diam: usize,
) -> Result<Nonce> {
    let search = AdmissionSearch::from_config(&config.admission);
    let task = tokio::task::spawn_blocking(move || search.find(&announce_hash, diam));

    tokio::select! {
        joined = task => Ok(joined.context("search task panicked")??),
        _ = tokio::signal::ctrl_c() => bail!("search interrupted"),
    }
}

pub async fn cmd_mint(config: &GossamerConfig, options: &Options, hash_hex: &str) -> Result<()> {
    let announce_hash = parse_digest(hash_hex)?;
    let diam = options.diam.unwrap_or(config.admission.diameter);

    let nonce = search_blocking(config, announce_hash, diam).await?;

    println!("═══════════════════════════════════════");
    println!("  Admission Proof");
    println!("═══════════════════════════════════════");
    println!("  Announce hash : {}", hash_hex);
    println!("  Diameter      : {}", diam);
    println!("  Nonce         : {}", display_nonce(&nonce));
    Ok(())
}

pub fn cmd_verify(
    config: &GossamerConfig,
    options: &Options,
    hash_hex: &str,
    nonce_hex: &str,
) -> Result<()> {
    let announce_hash = parse_digest(hash_hex)?;
    let nonce = Nonce::from_hex(nonce_hex).context("nonce is not valid hex")?;

    let diam = options.diam.unwrap_or(config.admission.diameter);
    let (scope, ok) = match options.hop {
        // each hop costs one rehash; no relay checks past the diameter
        Some(hop) if hop >= diam => bail!("--hop {hop} is outside the diameter {diam}"),
        Some(hop) => (format!("hop {hop}"), verify_at_hop(&announce_hash, nonce.as_bytes(), hop)),
        None => (format!("hops 0..{diam}"), verify_chain(&announce_hash, nonce.as_bytes(), diam)),
    };

    if ok {
        println!("✓ nonce {} is happy at {}", display_nonce(&nonce), scope);
        Ok(())
    } else {
        bail!("nonce {} is not happy at {}", display_nonce(&nonce), scope)
    }
}

/// Build a fresh announcement, mint its proof, and print the wire frame.
pub async fn cmd_announce(
    config: &GossamerConfig,
    options: &Options,
    origin_hex: &str,
    body: &str,
) -> Result<()> {
    let origin = parse_digest(origin_hex).context("origin")?;
    let diam = options.diam.unwrap_or(config.admission.diameter);
    let receiver = options.receiver.unwrap_or([0u8; 32]);
    let announcement = Announcement::new(origin, body.as_bytes().to_vec());

    let search = AdmissionSearch::from_config(&config.admission);
    let task = tokio::task::spawn_blocking(move || mint(&search, announcement, diam));
    let envelope = tokio::select! {
        joined = task => joined.context("search task panicked")??,
        _ = tokio::signal::ctrl_c() => bail!("search interrupted"),
    };

    let frame = envelope.to_frame(receiver)?;
    println!("announce hash : {}", hex::encode(envelope.announcement.announce_hash()));
    println!("nonce         : {}", display_nonce(&envelope.nonce));
    println!("frame         : {}", hex::encode(frame));
    Ok(())
}

fn display_nonce(nonce: &Nonce) -> String {
    if nonce.is_empty() {
        "(empty)".to_string()
    } else {
        nonce.to_string()
    }
}
