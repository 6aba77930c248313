//! CLI command dispatch and execution

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use maildrop_core::config::{resolve_config, Config, ConfigOverrides};
use std::path::{Path, PathBuf};

mod pending;
mod recover;
mod recv;
mod send;

/// maildrop - directory mailboxes for test fixtures
#[derive(Parser, Debug)]
#[command(
    name = "maildrop",
    version,
    about = "Send and receive messages through directory mailboxes",
    long_about = "Each participant owns a directory. `send NAME` drops a message into ../NAME; \
                  `recv` takes the next message from the current directory."
)]
pub struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand
#[derive(Args, Debug)]
struct GlobalArgs {
    /// Act as if started in this directory (default: current directory)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Read configuration from this file instead of searching for .maildrop.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Deliver a message to a sibling mailbox
    Send(send::SendArgs),

    /// Take the next message from this mailbox
    Recv(recv::RecvArgs),

    /// List undelivered messages in this mailbox without consuming them
    Pending(pending::PendingArgs),

    /// Return messages left claimed by a crashed receiver to the mailbox
    Recover(recover::RecoverArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        let home = match self.global.dir {
            Some(ref dir) => std::path::absolute(dir)?,
            None => std::env::current_dir()?,
        };
        match self.command {
            Commands::Send(args) => send::execute(args, &home, self.global.config),
            Commands::Recv(args) => recv::execute(args, &home, self.global.config),
            Commands::Pending(args) => pending::execute(args, &home, self.global.config),
            Commands::Recover(args) => recover::execute(args, &home),
        }
    }
}

/// Resolve configuration for `home` with command-specific overrides
fn load_config(
    home: &Path,
    mut overrides: ConfigOverrides,
    config_path: Option<PathBuf>,
) -> Result<Config> {
    overrides.config_path = config_path;
    Ok(resolve_config(&overrides, home)?)
}
