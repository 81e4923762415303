//! Supervisor configuration.
//!
//! Typed settings with defaults, plus an INI config file under
//! `~/.modelyard/config.ini` for the CLI. Settings structs live in
//! [`settings`], constants in [`defaults`], file handling in [`file`].

mod defaults;
mod file;
mod settings;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFile, ConfigFileError};
pub use settings::SupervisorConfig;
