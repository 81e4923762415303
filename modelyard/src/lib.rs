//! Modelyard - Single-node control plane for external model training jobs
//!
//! This library supervises long-running training subprocesses: it keys each
//! run in a SQLite-backed registry, spawns and terminates whole process
//! trees, and keeps an artifact cache reconciled against the canonical
//! models directory.
//!
//! # High-Level API
//!
//! Most callers go through the [`orchestrator`] facade:
//!
//! ```ignore
//! use modelyard::config::SupervisorConfig;
//! use modelyard::orchestrator::TrainingOrchestrator;
//!
//! let config = SupervisorConfig::default();
//! let orchestrator = TrainingOrchestrator::from_config(&config)?;
//!
//! let report = orchestrator.submit("req-1", "{}").await?;
//! println!("new artifact: {}", report.model);
//! ```

pub mod artifact;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod process;
pub mod registry;

/// Version of the Modelyard library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
