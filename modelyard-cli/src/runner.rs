//! CLI runner for common setup and operations.
//!
//! Encapsulates logging initialization, configuration loading, and
//! orchestrator construction to reduce duplication across command handlers.

use std::sync::Arc;

use tracing::info;

use modelyard::artifact::ArtifactStore;
use modelyard::config::{ConfigFile, SupervisorConfig};
use modelyard::logging::{default_log_dir, default_log_file, init_logging, LoggingGuard};
use modelyard::orchestrator::TrainingOrchestrator;
use modelyard::process::{TrainCommand, UnixProcessController};
use modelyard::registry::RunRegistry;

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    pub fn new() -> Result<Self, CliError> {
        let config = ConfigFile::load().map_err(|e| CliError::Config(e.to_string()))?;

        let logging_guard = init_logging(default_log_dir(), default_log_file())
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded supervisor configuration.
    pub fn supervisor(&self) -> &SupervisorConfig {
        &self.config.supervisor
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("Modelyard v{}", modelyard::VERSION);
        info!("Modelyard CLI: {} command", command);
    }

    /// Create the artifact store for the configured directories.
    pub fn store(&self) -> ArtifactStore {
        ArtifactStore::new(
            &self.config.supervisor.models_dir,
            &self.config.supervisor.cache_dir,
        )
    }

    /// Create an orchestrator attached to an existing registry.
    ///
    /// Unlike [`TrainingOrchestrator::from_config`], the registry is not
    /// reset; this is the path for commands that act on runs started by a
    /// sibling process (abort from a second terminal).
    pub fn attach_orchestrator(&self) -> Result<TrainingOrchestrator, CliError> {
        let config = self.supervisor();

        let registry = RunRegistry::attach(&config.registry_path).map_err(CliError::Registry)?;
        let controller = UnixProcessController::new().with_grace_period(config.grace_period);

        let mut command = TrainCommand::new(&config.train_program);
        for arg in &config.train_args {
            command = command.arg(arg);
        }

        Ok(TrainingOrchestrator::new(
            Arc::new(registry),
            Arc::new(controller),
            self.store(),
            command,
            config.persist_assets.clone(),
        ))
    }
}
