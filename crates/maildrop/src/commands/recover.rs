//! Recover command implementation

use anyhow::Result;
use clap::Args;
use maildrop_core::Mailbox;
use std::path::Path;

/// Revive messages claimed by a receiver that exited before deleting them
///
/// Run only while no receiver is active on this mailbox.
#[derive(Args, Debug)]
pub struct RecoverArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Execute the recover command
pub fn execute(args: RecoverArgs, home: &Path) -> Result<()> {
    let revived = Mailbox::new(home).recover_claims()?;

    if args.json {
        println!("{}", serde_json::json!({ "revived": revived }));
    } else {
        println!("Recovered {revived} message(s)");
    }

    Ok(())
}
