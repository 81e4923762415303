//! External training process lifecycle control.
//!
//! The controller spawns the trainer as a detached process group, waits for
//! it to exit while capturing its output streams, and can terminate the
//! entire descendant tree as one unit.
//!
//! # Architecture
//!
//! The [`ProcessController`] trait abstracts the platform-specific pieces
//! (spawn / wait / terminate-tree) so the orchestrator never branches on
//! platform and test suites can substitute scripted doubles. The production
//! backend is [`UnixProcessController`].
//!
//! A non-zero exit status is a normal terminal outcome of the job, reported
//! through [`TrainingOutcome`], never as a controller-internal failure.

mod controller;
#[cfg(unix)]
mod unix;

pub use controller::{
    BoxedWait, ProcessController, ProcessError, RunningProcess, TerminationReport,
    TrainCommand, TrainingOutcome,
};
#[cfg(unix)]
pub use unix::UnixProcessController;
