//! Supervisor settings struct.

use std::path::PathBuf;
use std::time::Duration;

use super::defaults::*;
use super::file::config_directory;

/// Configuration for one supervisor instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Path of the registry SQLite database.
    pub registry_path: PathBuf,
    /// Canonical models directory the trainer writes archives into.
    pub models_dir: PathBuf,
    /// Artifact cache directory (one subdirectory per artifact).
    pub cache_dir: PathBuf,
    /// Trainer executable.
    pub train_program: String,
    /// Trainer arguments.
    pub train_args: Vec<String>,
    /// Grace period for process tree termination.
    pub grace_period: Duration,
    /// Auxiliary asset paths persisted next to each finished artifact.
    pub persist_assets: Vec<PathBuf>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        let data_dir = config_directory();
        Self {
            registry_path: data_dir.join(DEFAULT_REGISTRY_FILE),
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
            cache_dir: data_dir.join(DEFAULT_CACHE_DIR),
            train_program: DEFAULT_TRAIN_PROGRAM.to_string(),
            train_args: DEFAULT_TRAIN_ARGS.iter().map(|s| s.to_string()).collect(),
            grace_period: Duration::from_secs(DEFAULT_GRACE_PERIOD_SECS),
            persist_assets: Vec::new(),
        }
    }
}

impl SupervisorConfig {
    /// Roots every relative path under the given directory.
    ///
    /// Useful for tests and for running against a project checkout rather
    /// than the home directory.
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            registry_path: root.join(DEFAULT_REGISTRY_FILE),
            models_dir: root.join(DEFAULT_MODELS_DIR),
            cache_dir: root.join(DEFAULT_CACHE_DIR),
            ..Self::default()
        }
    }

    /// Overrides the trainer command line.
    pub fn with_trainer(mut self, program: impl Into<String>, args: Vec<String>) -> Self {
        self.train_program = program.into();
        self.train_args = args;
        self
    }

    /// Overrides the termination grace period.
    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace_period = grace;
        self
    }

    /// Adds auxiliary asset paths persisted alongside finished artifacts.
    pub fn with_persist_assets(mut self, assets: Vec<PathBuf>) -> Self {
        self.persist_assets = assets;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_trainer_command() {
        let config = SupervisorConfig::default();
        assert_eq!(config.train_program, "rasa");
        assert_eq!(config.train_args, vec!["train".to_string()]);
        assert_eq!(config.grace_period, Duration::from_secs(5));
    }

    #[test]
    fn test_rooted_at_rebases_paths() {
        let config = SupervisorConfig::rooted_at("/tmp/yard");
        assert_eq!(
            config.registry_path,
            PathBuf::from("/tmp/yard/training_queue.db")
        );
        assert_eq!(config.models_dir, PathBuf::from("/tmp/yard/models"));
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/yard/modelstore"));
    }

    #[test]
    fn test_builder_overrides() {
        let config = SupervisorConfig::default()
            .with_trainer("python", vec!["-m".into(), "trainer".into()])
            .with_grace_period(Duration::from_secs(1));
        assert_eq!(config.train_program, "python");
        assert_eq!(config.train_args.len(), 2);
        assert_eq!(config.grace_period, Duration::from_secs(1));
    }
}
