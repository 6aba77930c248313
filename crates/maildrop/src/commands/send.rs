//! Send command implementation

use anyhow::{bail, Context, Result};
use clap::Args;
use maildrop_core::config::ConfigOverrides;
use maildrop_core::Transport;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Deliver a message to a sibling mailbox
#[derive(Args, Debug)]
pub struct SendArgs {
    /// Recipient name; the mailbox is ../<RECIPIENT>
    recipient: String,

    /// Message text (or omit to use --stdin)
    #[arg(conflicts_with = "stdin")]
    message: Option<String>,

    /// Read the message body from stdin
    #[arg(long)]
    stdin: bool,

    /// fsync the message file and mailbox directory
    #[arg(long)]
    sync: bool,

    /// Print the delivered file path
    #[arg(long, short)]
    verbose: bool,

    /// Print the delivered file as JSON
    #[arg(long, conflicts_with = "verbose")]
    json: bool,
}

/// Execute the send command
pub fn execute(args: SendArgs, home: &Path, config_path: Option<PathBuf>) -> Result<()> {
    let overrides = ConfigOverrides {
        sync: args.sync.then_some(true),
        ..Default::default()
    };
    let config = super::load_config(home, overrides, config_path)?;

    let body = match (args.message, args.stdin) {
        (Some(text), _) => text,
        (None, true) => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read message from stdin")?;
            buf
        }
        (None, false) => bail!("No message given: pass MESSAGE or --stdin"),
    };

    let transport = Transport::from_config(home, &config);
    let path = transport.send(&args.recipient, &body)?;
    tracing::debug!("delivered {} bytes to {}", body.len(), path.display());

    if args.json {
        let output = serde_json::json!({
            "recipient": args.recipient,
            "path": path.display().to_string(),
            "bytes": body.len(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if args.verbose {
        println!("{}", path.display());
    }

    Ok(())
}
