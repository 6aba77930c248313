//! maildrop - send and receive messages through directory mailboxes
//!
//! A thin CLI over `maildrop-core` so test harnesses in any language can
//! drop messages into a sibling directory and pick them up from their own.

use clap::Parser;

mod commands;

use commands::Cli;

fn main() {
    maildrop_core::logging::init();

    let cli = Cli::parse();

    if let Err(e) = cli.execute() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
