//! Run commands from a file, one per line.
//!
//! Lines are split with the quote-aware tokenizer, so a payload containing
//! spaces can be written as `encode m <receiver> "hello there"`. Blank lines
//! and lines starting with `#` are skipped. The first failing line stops the
//! batch.

use anyhow::{bail, Context, Result};

use gossamer_core::config::GossamerConfig;
use gossamer_core::text::{split_ignore_quotes, unquote};

use super::parse_args;

/// Tokenize one batch line into unquoted words.
pub fn line_words(line: &str) -> Vec<&str> {
    split_ignore_quotes(line).into_iter().map(unquote).collect()
}

pub async fn cmd_batch(config: &GossamerConfig, path: &str) -> Result<()> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read batch file {path}"))?;

    for (number, line) in text.lines().enumerate().map(|(i, l)| (i + 1, l.trim())) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let words = line_words(line);
        let (options, positional) = parse_args(&words).with_context(|| format!("line {number}"))?;
        if positional.first().map(String::as_str) == Some("batch") {
            bail!("line {number}: batch files cannot nest");
        }

        tracing::debug!(line = number, command = line, "batch command");
        let positional: Vec<&str> = positional.iter().map(String::as_str).collect();
        crate::run_command(config, &options, &positional)
            .await
            .with_context(|| format!("line {number}: {line}"))?;
    }

    Ok(())
}
