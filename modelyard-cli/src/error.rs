//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use modelyard::artifact::StoreError;
use modelyard::orchestrator::TrainError;
use modelyard::registry::RegistryError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Training request error
    Train(TrainError),
    /// Run registry error
    Registry(RegistryError),
    /// Artifact store error
    Store(StoreError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Train(TrainError::DuplicateRequest { request_id }) => {
                eprintln!();
                eprintln!("A run with this id is already queued or running.");
                eprintln!("Abort it first with: modelyard abort {}", request_id);
            }
            CliError::Train(TrainError::RequestNotFound { .. }) => {
                eprintln!();
                eprintln!("No live run has this id. List live runs with:");
                eprintln!("  modelyard registry inspect");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Train(e) => write!(f, "Training request failed: {}", e),
            CliError::Registry(e) => write!(f, "Run registry error: {}", e),
            CliError::Store(e) => write!(f, "Artifact store error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Train(e) => Some(e),
            CliError::Registry(e) => Some(e),
            CliError::Store(e) => Some(e),
            _ => None,
        }
    }
}
