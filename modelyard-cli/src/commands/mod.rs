//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`abort`] - Abort a queued or running training request
//! - [`config`] - Configuration management (path, list, init)
//! - [`gc`] - Sweep stale artifact cache entries
//! - [`models`] - Model artifact management (list, latest, performance, delete)
//! - [`registry`] - Run registry management (inspect, purge)
//! - [`train`] - Run one training request to completion

pub mod abort;
pub mod config;
pub mod gc;
pub mod models;
pub mod registry;
pub mod train;
