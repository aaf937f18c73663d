//! Development tasks for the hologram workspace
//!
//! This binary provides development utilities using the cargo-xtask pattern.
//! Run with: `cargo xtask <command>`

mod commands;
mod utils;

use anyhow::Result;
use clap::Parser;
use commands::{Check, ReadStore};

/// Development tasks for the hologram workspace
#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development tools for hologram stores", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Print every hologram record in a store file
    ReadStore(ReadStore),

    /// Load a store file through the registry and report what survives
    Check(Check),
}

fn main() -> Result<()> {
    // Load .env file if it exists (for HOLOGRAMS_DATA_DIR and friends)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.command {
        Command::ReadStore(cmd) => cmd.execute(),
        Command::Check(cmd) => cmd.execute(),
    }
}
