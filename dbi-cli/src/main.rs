//! CLI serving NSP/NSZ/XCI packages to a console over USB.

#![allow(clippy::print_stderr, clippy::missing_docs_in_private_items)]

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use dbi::{HostConfig, MissPolicy, SessionConfig, TitleCatalog};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "dbi",
    version,
    about = "Serve NSP/NSZ/XCI packages to a console over USB"
)]
struct Cli {
    /// Directory containing the packages to serve.
    dir: PathBuf,

    /// USB vendor id (hex).
    #[arg(long, default_value = "057e", value_parser = parse_hex_u16)]
    vendor_id: u16,

    /// USB product id (hex).
    #[arg(long, default_value = "3000", value_parser = parse_hex_u16)]
    product_id: u16,

    /// Handling of requested names missing from the listed titles (reject, literal).
    #[arg(long, default_value_t = MissPolicy::Reject)]
    on_miss: MissPolicy,

    /// Pause between connection attempts, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    retry_delay_ms: u64,

    /// Print the titles found in DIR and exit.
    #[arg(long)]
    list: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if let Err(e) = cli.run() {
        eprintln!("dbi: {e:#}");
        std::process::exit(1);
    }
}

impl Cli {
    fn run(self) -> Result<()> {
        let session = SessionConfig::new(&self.dir).miss_policy(self.on_miss);
        session.validate()?;

        if self.list {
            return write_titles(&self.dir, &mut io::stdout().lock());
        }

        let config = HostConfig::new(session)
            .device(self.vendor_id, self.product_id)
            .reconnect_delay(Duration::from_millis(self.retry_delay_ms));
        dbi::serve(&config).context("serving device")?;
        tracing::info!("device requested exit");
        Ok(())
    }
}

/// Writes the titles found in `dir`, one per line, or `No titles.`.
fn write_titles(dir: &Path, out: &mut impl Write) -> Result<()> {
    let catalog =
        TitleCatalog::scan(dir).with_context(|| format!("scanning {}", dir.display()))?;
    if catalog.is_empty() {
        writeln!(out, "No titles.")?;
    }
    for name in catalog.names() {
        writeln!(out, "{name}")?;
    }
    Ok(())
}

/// Logs to stderr. `RUST_LOG` takes precedence over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Parses a 16-bit hex id, with or without a `0x` prefix.
fn parse_hex_u16(s: &str) -> Result<u16, String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid hex id {s:?}: {e}"))
}
