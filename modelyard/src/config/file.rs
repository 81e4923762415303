//! Configuration file handling for `~/.modelyard/config.ini`.
//!
//! Loads and saves user configuration with sensible defaults. Absent file
//! means defaults; absent keys fall back individually.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use super::settings::SupervisorConfig;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read or parse the config file.
    #[error("failed to read config file: {0}")]
    Read(#[from] ini::Error),

    /// Failed to write the config file.
    #[error("failed to write config file: {0}")]
    Write(String),

    /// Failed to create the config directory.
    #[error("failed to create config directory: {0}")]
    Directory(std::io::Error),
}

/// On-disk configuration, an INI rendering of [`SupervisorConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    /// The settings this file carries.
    pub supervisor: SupervisorConfig,
}

impl ConfigFile {
    /// Loads from the default path, falling back to defaults when absent.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Loads from a specific path, falling back to defaults when absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        let mut config = SupervisorConfig::default();

        if let Some(section) = ini.section(Some("paths")) {
            if let Some(v) = section.get("registry") {
                config.registry_path = PathBuf::from(v);
            }
            if let Some(v) = section.get("models_dir") {
                config.models_dir = PathBuf::from(v);
            }
            if let Some(v) = section.get("cache_dir") {
                config.cache_dir = PathBuf::from(v);
            }
        }

        if let Some(section) = ini.section(Some("trainer")) {
            if let Some(v) = section.get("program") {
                config.train_program = v.to_string();
            }
            if let Some(v) = section.get("args") {
                config.train_args = v.split_whitespace().map(String::from).collect();
            }
            if let Some(v) = section.get("grace_period_secs") {
                if let Ok(secs) = v.parse::<u64>() {
                    config.grace_period = Duration::from_secs(secs);
                }
            }
        }

        Ok(Self { supervisor: config })
    }

    /// Saves to the default path.
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Saves to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::Directory)?;
        }

        let config = &self.supervisor;
        let mut ini = Ini::new();
        ini.with_section(Some("paths"))
            .set("registry", config.registry_path.display().to_string())
            .set("models_dir", config.models_dir.display().to_string())
            .set("cache_dir", config.cache_dir.display().to_string());
        ini.with_section(Some("trainer"))
            .set("program", config.train_program.clone())
            .set("args", config.train_args.join(" "))
            .set(
                "grace_period_secs",
                config.grace_period.as_secs().to_string(),
            );

        ini.write_to_file(path)
            .map_err(|e| ConfigFileError::Write(e.to_string()))
    }
}

/// Path of the config directory (`~/.modelyard`).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".modelyard")
}

/// Path of the config file (`~/.modelyard/config.ini`).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
