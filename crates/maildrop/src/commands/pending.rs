//! Pending command implementation

use anyhow::Result;
use clap::Args;
use maildrop_core::config::ConfigOverrides;
use maildrop_core::{MessageId, ReceiveOrder, Transport};
use std::path::{Path, PathBuf};

/// List undelivered messages without consuming them
#[derive(Args, Debug)]
pub struct PendingArgs {
    /// Listing order: oldest or listing
    #[arg(long)]
    order: Option<ReceiveOrder>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Execute the pending command
pub fn execute(args: PendingArgs, home: &Path, config_path: Option<PathBuf>) -> Result<()> {
    let overrides = ConfigOverrides {
        order: args.order,
        ..Default::default()
    };
    let config = super::load_config(home, overrides, config_path)?;
    let transport = Transport::from_config(home, &config);

    let names: Vec<String> = transport
        .pending()?
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect();

    if args.json {
        let entries: Vec<serde_json::Value> = names
            .iter()
            .map(|name| {
                let id = MessageId::from_file_name(name);
                serde_json::json!({
                    "file": name,
                    "id": id.map(|id| id.to_string()),
                    "sent_at_ns": id.map(|id| id.ticks()),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if names.is_empty() {
        println!("No pending messages");
    } else {
        for name in &names {
            println!("{name}");
        }
    }

    Ok(())
}
