//! Weights command - inspect the local weights directory.

use anyhow::Result;
use clap::{Args, Subcommand};
use gazenet_adapters::{list_weights as adapter_list_weights, weights_dir};

/// Arguments for the weights command
#[derive(Args, Clone)]
pub struct WeightsArgs {
    #[command(subcommand)]
    pub command: WeightsCommand,
}

/// Weights subcommands
#[derive(Subcommand, Clone)]
pub enum WeightsCommand {
    /// Print weights directory path
    Dir,
    /// List installed weight files
    List,
}

/// Run the weights command.
pub fn run(args: &WeightsArgs) -> Result<()> {
    match args.command {
        WeightsCommand::Dir => {
            println!("{}", weights_dir().display());
            Ok(())
        }
        WeightsCommand::List => list_weights(),
    }
}

fn list_weights() -> Result<()> {
    let dir = weights_dir();
    let files = adapter_list_weights(&dir)?;

    println!("Weights directory: {}", dir.display());
    println!();

    if files.is_empty() {
        println!("No weights installed");
        return Ok(());
    }

    for file in &files {
        println!("  {} ({} bytes)", file.name, file.size);
    }

    println!();
    println!("{} weight files", files.len());

    Ok(())
}
