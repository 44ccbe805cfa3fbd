//! ## pcapwatch-cli
//! **Controller entrypoint**
//!
//! `run` listens for probe capture streams and logs one report per window;
//! `replay` pushes a capture file through the same pipeline offline.

use clap::Parser;

mod commands;

use commands::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    commands::run_command(cli).await
}
