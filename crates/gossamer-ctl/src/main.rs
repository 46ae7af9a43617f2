//! gossamer-ctl: command-line tool for Gossamer frames and admission proofs.

use anyhow::Result;

use gossamer_core::config::GossamerConfig;

mod cmd;

use cmd::Options;

fn print_usage() {
    println!("Usage: gossamer-ctl [options] <command>");
    println!();
    println!("Commands:");
    println!("  mint <hash>                    Find an admission nonce for an announce hash");
    println!("  verify <hash> <nonce>          Check a nonce at one hop (--hop) or every hop");
    println!("  announce <origin> <body>       Mint an announcement and print its wire frame");
    println!("  encode <type> <receiver> <payload>");
    println!("                                 Encode a message frame");
    println!("  decode <frame>                 Decode one or more concatenated frames as JSON");
    println!("  batch <file>                   Run commands from a file, one per line");
    println!("  config                         Print the effective configuration");
    println!("  config init                    Write a default config file if none exists");
    println!();
    println!("Options:");
    println!("  --diam <n>         Diameter (default: admission.diameter from config)");
    println!("  --hop <i>          Verify a single hop instead of the whole chain");
    println!("  --receiver <hex>   Receiver address for announce (default: all zeros)");
    println!();
    println!("Hashes, nonces, addresses and frames are hex. An empty nonce is written as \"\".");
}

/// Run one non-batch command.
pub(crate) async fn run_command(
    config: &GossamerConfig,
    options: &Options,
    args: &[&str],
) -> Result<()> {
    match args {
        ["mint", hash] => cmd::admission::cmd_mint(config, options, hash).await,
        ["verify", hash, nonce] => cmd::admission::cmd_verify(config, options, hash, nonce),
        ["verify", hash] => cmd::admission::cmd_verify(config, options, hash, ""),
        ["announce", origin, body] => {
            cmd::admission::cmd_announce(config, options, origin, body).await
        }
        ["encode", t, receiver, payload] => cmd::wire::cmd_encode(t, receiver, payload),
        ["encode", t, receiver] => cmd::wire::cmd_encode(t, receiver, ""),
        ["decode", frame] => cmd::wire::cmd_decode(frame),
        ["config"] => {
            println!("{}", serde_json::to_string_pretty(config)?);
            Ok(())
        }
        ["config", "init"] => {
            let path = GossamerConfig::write_default_if_missing()?;
            println!("config: {}", path.display());
            Ok(())
        }
        other => Err(cmd::UnknownCommand(other.join(" ")).into()),
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = GossamerConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        GossamerConfig::default()
    });

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (options, remaining) = cmd::parse_args(&args)?;
    let remaining: Vec<&str> = remaining.iter().map(String::as_str).collect();

    match remaining.as_slice() {
        [] | ["help"] | ["--help"] | ["-h"] => {
            print_usage();
            Ok(())
        }
        ["batch", path] => cmd::batch::cmd_batch(&config, path).await,
        other => match run_command(&config, &options, other).await {
            Err(e) if e.is::<cmd::UnknownCommand>() => {
                eprintln!("{}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
            result => result,
        },
    }
}
