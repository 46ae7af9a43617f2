//! CLI command modules.

pub mod admission;
pub mod batch;
pub mod wire;

use anyhow::{bail, Context, Result};

use gossamer_core::crypto::Digest32;

#[derive(Debug, thiserror::Error)]
#[error("unknown command: {0}")]
pub struct UnknownCommand(pub String);

/// Options that may appear anywhere on the command line.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub diam: Option<usize>,
    pub hop: Option<usize>,
    pub receiver: Option<Digest32>,
}

/// Split `args` into recognised options and positional words.
pub fn parse_args<S: AsRef<str>>(args: &[S]) -> Result<(Options, Vec<String>)> {
    let mut options = Options::default();
    let mut remaining = Vec::new();
    let mut iter = args.iter().map(|s| AsRef::<str>::as_ref(s));

    while let Some(arg) = iter.next() {
        match arg {
            "--diam" => {
                let v = iter.next().context("--diam requires a value")?;
                options.diam = Some(v.parse().context("--diam must be a number")?);
            }
            "--hop" => {
                let v = iter.next().context("--hop requires a value")?;
                options.hop = Some(v.parse().context("--hop must be a number")?);
            }
            "--receiver" => {
                let v = iter.next().context("--receiver requires a value")?;
                options.receiver = Some(parse_digest(v).context("--receiver")?);
            }
            other => remaining.push(other.to_string()),
        }
    }

    Ok((options, remaining))
}

/// Parse a 64-character hex string into a 32-byte value.
pub fn parse_digest(s: &str) -> Result<Digest32> {
    let bytes = hex::decode(s).with_context(|| format!("'{s}' is not valid hex"))?;
    match <Digest32>::try_from(bytes.as_slice()) {
        Ok(digest) => Ok(digest),
        Err(_) => bail!("expected 32 bytes of hex, got {}", bytes.len()),
    }
}
