//! Recv command implementation

use anyhow::Result;
use clap::Args;
use maildrop_core::config::ConfigOverrides;
use maildrop_core::{ReceiveOrder, Transport};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Take the next message from this mailbox
#[derive(Args, Debug)]
pub struct RecvArgs {
    /// Block until a message arrives
    #[arg(long)]
    wait: bool,

    /// Give up waiting after this many seconds (implies --wait)
    #[arg(long)]
    timeout: Option<u64>,

    /// Milliseconds between checks while waiting
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    interval_ms: Option<u64>,

    /// Which message to take first: oldest or listing
    #[arg(long)]
    order: Option<ReceiveOrder>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Execute the recv command
pub fn execute(args: RecvArgs, home: &Path, config_path: Option<PathBuf>) -> Result<()> {
    let overrides = ConfigOverrides {
        interval_ms: args.interval_ms,
        timeout_secs: args.timeout,
        order: args.order,
        ..Default::default()
    };
    let config = super::load_config(home, overrides, config_path)?;
    let transport = Transport::from_config(home, &config);

    let body = if args.wait || args.timeout.is_some() {
        transport.wait_and_recv()?
    } else {
        transport.recv_once()?
    };

    let mut stdout = std::io::stdout().lock();
    if args.json {
        let output = serde_json::json!({ "body": body });
        writeln!(stdout, "{}", serde_json::to_string_pretty(&output)?)?;
    } else {
        // Body is printed verbatim; no newline is added
        stdout.write_all(body.as_bytes())?;
    }
    stdout.flush()?;

    Ok(())
}
