//! Default configuration values.

/// Registry database filename inside the data directory.
pub const DEFAULT_REGISTRY_FILE: &str = "training_queue.db";

/// Canonical models directory, relative to the project root.
pub const DEFAULT_MODELS_DIR: &str = "models";

/// Artifact cache directory name inside the data directory.
pub const DEFAULT_CACHE_DIR: &str = "modelstore";

/// Default trainer executable.
pub const DEFAULT_TRAIN_PROGRAM: &str = "rasa";

/// Default trainer arguments.
pub const DEFAULT_TRAIN_ARGS: &[&str] = &["train"];

/// Default termination grace period in seconds.
pub const DEFAULT_GRACE_PERIOD_SECS: u64 = 5;
