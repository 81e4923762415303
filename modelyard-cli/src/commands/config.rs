//! Configuration management CLI commands.

use clap::Subcommand;

use modelyard::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,
    /// List effective settings (file values merged over defaults)
    List,
    /// Write a configuration file with the current defaults
    Init,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => {
            println!("{}", config_file_path().display());
            Ok(())
        }
        ConfigCommands::List => {
            let config = ConfigFile::load().map_err(|e| CliError::Config(e.to_string()))?;
            let s = &config.supervisor;
            println!("paths.registry          = {}", s.registry_path.display());
            println!("paths.models_dir        = {}", s.models_dir.display());
            println!("paths.cache_dir         = {}", s.cache_dir.display());
            println!("trainer.program         = {}", s.train_program);
            println!("trainer.args            = {}", s.train_args.join(" "));
            println!(
                "trainer.grace_period    = {}s",
                s.grace_period.as_secs()
            );
            Ok(())
        }
        ConfigCommands::Init => {
            let path = config_file_path();
            if path.exists() {
                return Err(CliError::Config(format!(
                    "configuration file already exists at {}",
                    path.display()
                )));
            }
            ConfigFile::default()
                .save()
                .map_err(|e| CliError::Config(e.to_string()))?;
            println!("Wrote default configuration to {}", path.display());
            Ok(())
        }
    }
}
