//! chirpsync CLI - command-line host for the sync engine.
//!
//! Runs the engine against a simulated network client for development
//! and soak testing, and manages the host configuration file.

use clap::{Parser, Subcommand};
use std::process;

mod commands;
mod error;
mod simulation;

#[derive(Parser)]
#[command(name = "chirpsync")]
#[command(version = chirpsync::VERSION)]
#[command(about = "Background sync engine host", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sync daemon against a simulated service.
    Run(commands::run::RunArgs),
    /// Show or create the configuration file.
    Config(commands::config::ConfigArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args).await,
        Commands::Config(args) => commands::config::execute(args),
    };

    if let Err(error) = result {
        eprintln!("Error: {error}");
        process::exit(1);
    }
}
