//! Modelyard CLI - Command-line interface
//!
//! This binary provides a command-line interface to the Modelyard library.

use clap::{Parser, Subcommand};

mod commands;
mod error;
mod runner;

use commands::{abort, config, gc, models, registry, train};

#[derive(Parser)]
#[command(name = "modelyard")]
#[command(version = modelyard::VERSION)]
#[command(about = "Supervise external model training jobs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one training request to completion
    Train(train::TrainArgs),

    /// Abort a queued or running training request
    Abort(abort::AbortArgs),

    /// Model artifact management
    Models {
        #[command(subcommand)]
        command: models::ModelCommands,
    },

    /// Sweep stale artifact cache entries
    Gc,

    /// Run registry management
    Registry {
        #[command(subcommand)]
        command: registry::RegistryCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Train(args) => train::run(args).await,
        Commands::Abort(args) => abort::run(args).await,
        Commands::Models { command } => models::run(command),
        Commands::Gc => gc::run(),
        Commands::Registry { command } => registry::run(command),
        Commands::Config { command } => config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
