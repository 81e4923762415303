//! Run registry management CLI commands.

use clap::Subcommand;
use chrono::DateTime;

use modelyard::config::ConfigFile;
use modelyard::registry::{RunRegistry, PID_NONE};

use crate::error::CliError;

/// Registry action subcommands.
#[derive(Debug, Subcommand)]
pub enum RegistryCommands {
    /// List live run entries
    Inspect,
    /// Remove every run entry
    Purge,
}

/// Run a registry subcommand.
///
/// Attaches to the registry without resetting it so entries owned by a
/// running modelyard process stay intact.
pub fn run(command: RegistryCommands) -> Result<(), CliError> {
    let config = ConfigFile::load().unwrap_or_default();
    let registry =
        RunRegistry::attach(&config.supervisor.registry_path).map_err(CliError::Registry)?;

    match command {
        RegistryCommands::Inspect => {
            let records = registry.inspect().map_err(CliError::Registry)?;
            if records.is_empty() {
                println!("Registry is empty.");
                return Ok(());
            }
            for record in records {
                let pid = if record.process_id == PID_NONE {
                    "pending".to_string()
                } else {
                    record.process_id.to_string()
                };
                println!(
                    "{}  pid={}  started={}  metadata={}",
                    record.request_id,
                    pid,
                    format_timestamp(record.created_at),
                    record.metadata
                );
            }
            Ok(())
        }
        RegistryCommands::Purge => {
            registry.purge().map_err(CliError::Registry)?;
            println!("Registry purged.");
            Ok(())
        }
    }
}

fn format_timestamp(seconds: f64) -> String {
    DateTime::from_timestamp_millis((seconds * 1000.0) as i64)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "-".to_string())
}
