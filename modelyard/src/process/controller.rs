//! Process controller trait and shared types.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

/// Boxed future returned by trait methods that must stay object-safe.
pub type BoxedWait<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Errors from process lifecycle operations.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The trainer process could not be started.
    #[error("failed to spawn training process '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// The spawned process reported no OS-level pid.
    #[error("training process exited before a pid could be captured")]
    NoPid,

    /// Waiting on the process failed at the OS level.
    #[error("failed to wait on training process: {0}")]
    Wait(#[from] std::io::Error),

    /// The process tree could not be confirmed dead within the grace period.
    #[error("process {pid} still alive {grace:?} after termination signal")]
    Termination { pid: i64, grace: Duration },
}

/// Command line for one training run.
///
/// The trainer is an opaque long-running executable: it accepts no stdin,
/// writes diagnostics to its standard streams, and exits 0 on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainCommand {
    /// Executable to run (e.g. `rasa`).
    pub program: String,
    /// Arguments (e.g. `["train"]`).
    pub args: Vec<String>,
    /// Working directory for the trainer; inherited when `None`.
    pub current_dir: Option<PathBuf>,
}

impl TrainCommand {
    /// Creates a command with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Appends an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Sets the working directory.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }
}

/// Terminal outcome of a finished training process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingOutcome {
    /// Process exit code (`-1` if killed by a signal).
    pub exit_code: i32,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl TrainingOutcome {
    /// True if the trainer exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Result of a tree termination sweep.
///
/// Terminating an already-dead tree is a success that simply finds zero
/// descendants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerminationReport {
    /// Whether the root process was alive when the sweep started.
    pub root_was_alive: bool,
    /// Number of descendant processes signaled.
    pub descendants_signaled: usize,
    /// Whether any process needed a forced kill after the polite signal.
    pub forced: bool,
}

/// A spawned trainer that has not exited yet.
pub trait RunningProcess: Send {
    /// OS-level process id, captured immediately after spawn.
    fn pid(&self) -> i64;

    /// Waits for the process to exit, capturing exit status and output.
    ///
    /// Consumes the handle; the exit status can only be collected once.
    fn wait(self: Box<Self>) -> BoxedWait<Result<TrainingOutcome, ProcessError>>;
}

/// Platform capability for spawning and terminating training process trees.
pub trait ProcessController: Send + Sync + 'static {
    /// Spawns the trainer detached into its own process group.
    fn spawn(&self, command: &TrainCommand) -> Result<Box<dyn RunningProcess>, ProcessError>;

    /// Terminates the process tree rooted at `pid`.
    ///
    /// Signals every descendant, then the root, and waits up to a bounded
    /// grace period for the root to die, escalating to a forced kill.
    /// Idempotent: a dead tree yields an empty [`TerminationReport`].
    fn terminate_tree(
        &self,
        pid: i64,
    ) -> BoxedWait<Result<TerminationReport, ProcessError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_command_builder() {
        let cmd = TrainCommand::new("rasa").arg("train").current_dir("/tmp");
        assert_eq!(cmd.program, "rasa");
        assert_eq!(cmd.args, vec!["train".to_string()]);
        assert_eq!(cmd.current_dir, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn test_outcome_success() {
        let ok = TrainingOutcome {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        };
        let failed = TrainingOutcome {
            exit_code: 1,
            ..ok.clone()
        };
        assert!(ok.success());
        assert!(!failed.success());
    }

    #[test]
    fn test_termination_report_default_is_empty() {
        let report = TerminationReport::default();
        assert!(!report.root_was_alive);
        assert_eq!(report.descendants_signaled, 0);
        assert!(!report.forced);
    }
}
