//! Request orchestration facade.
//!
//! Sequences one training request end to end: registry insert, process
//! spawn, wait for exit, registry removal, artifact persistence, and cache
//! reconciliation. Also exposes abort, which tears down the running process
//! tree and cleans up the registry entry.
//!
//! # State machine
//!
//! A request moves through `PENDING` (registered with a sentinel pid),
//! `RUNNING` (real pid recorded), and then one of three terminal outcomes:
//! completed, failed, or aborted. Terminal states are not stored; the
//! absence of a registry row is the only externally observable terminal
//! marker.
//!
//! Registry mutations for a single request id are totally ordered
//! (push, update_pid, remove) because the orchestrator performs them
//! sequentially within one request's lifetime.

mod outcome;
mod service;

pub use outcome::Outcome;
pub use service::{TrainError, TrainReport, TrainingOrchestrator};
