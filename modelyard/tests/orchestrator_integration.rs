//! Integration tests for the training orchestrator.
//!
//! These tests drive full request lifecycles through a scripted process
//! controller:
//! - submit → spawn → pid recorded → exit 0 → artifact persisted
//! - submit → exit non-zero → failure surfaced, registry cleaned
//! - abort mid-run → tree terminated, registry cleaned, cache reconciled
//! - duplicate and unknown request ids
//!
//! Run with: `cargo test --test orchestrator_integration`

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::oneshot;

use modelyard::artifact::{archive_name, ArtifactStore};
use modelyard::orchestrator::{Outcome, TrainError, TrainingOrchestrator};
use modelyard::process::{
    BoxedWait, ProcessController, ProcessError, RunningProcess, TerminationReport, TrainCommand,
    TrainingOutcome,
};
use modelyard::registry::{RunRegistry, PID_NONE};

// ============================================================================
// Test Helpers
// ============================================================================

/// What the scripted trainer should do once spawned.
#[derive(Clone)]
enum Script {
    /// Exit immediately with this status.
    Exit(i32),
    /// Block until the controller's terminate path fires, then report the
    /// signalled exit status.
    RunUntilTerminated,
}

/// Scripted stand-in for the platform process controller.
struct ScriptedController {
    script: Script,
    pid: i64,
    /// Sender handed to the blocked process; terminate_tree fires it.
    release: Mutex<Option<oneshot::Sender<()>>>,
    terminated: Mutex<Vec<i64>>,
}

impl ScriptedController {
    fn new(script: Script) -> Self {
        Self {
            script,
            pid: 31337,
            release: Mutex::new(None),
            terminated: Mutex::new(Vec::new()),
        }
    }

    fn terminated_pids(&self) -> Vec<i64> {
        self.terminated.lock().unwrap().clone()
    }
}

struct ScriptedProcess {
    pid: i64,
    script: Script,
    release: Option<oneshot::Receiver<()>>,
}

impl RunningProcess for ScriptedProcess {
    fn pid(&self) -> i64 {
        self.pid
    }

    fn wait(self: Box<Self>) -> BoxedWait<Result<TrainingOutcome, ProcessError>> {
        Box::pin(async move {
            let exit_code = match self.script {
                Script::Exit(code) => code,
                Script::RunUntilTerminated => {
                    if let Some(release) = self.release {
                        let _ = release.await;
                    }
                    // SIGTERM as observed through the exit status.
                    -15
                }
            };
            Ok(TrainingOutcome {
                exit_code,
                stdout: "scripted stdout".to_string(),
                stderr: "scripted stderr".to_string(),
            })
        })
    }
}

impl ProcessController for ScriptedController {
    fn spawn(&self, _command: &TrainCommand) -> Result<Box<dyn RunningProcess>, ProcessError> {
        let release = match self.script {
            Script::RunUntilTerminated => {
                let (tx, rx) = oneshot::channel();
                *self.release.lock().unwrap() = Some(tx);
                Some(rx)
            }
            Script::Exit(_) => None,
        };
        Ok(Box::new(ScriptedProcess {
            pid: self.pid,
            script: self.script.clone(),
            release,
        }))
    }

    fn terminate_tree(&self, pid: i64) -> BoxedWait<Result<TerminationReport, ProcessError>> {
        self.terminated.lock().unwrap().push(pid);
        let release = self.release.lock().unwrap().take();
        Box::pin(async move {
            if let Some(release) = release {
                let _ = release.send(());
            }
            Ok(TerminationReport {
                root_was_alive: true,
                descendants_signaled: 1,
                forced: false,
            })
        })
    }
}

struct Harness {
    _dir: TempDir,
    models_dir: PathBuf,
    cache_dir: PathBuf,
    controller: Arc<ScriptedController>,
    orchestrator: TrainingOrchestrator,
}

fn harness(script: Script) -> Harness {
    let dir = TempDir::new().unwrap();
    let models_dir = dir.path().join("models");
    let cache_dir = dir.path().join("modelstore");
    fs::create_dir_all(&models_dir).unwrap();

    let controller = Arc::new(ScriptedController::new(script));
    let orchestrator = TrainingOrchestrator::new(
        Arc::new(RunRegistry::in_memory().unwrap()),
        controller.clone(),
        ArtifactStore::new(&models_dir, &cache_dir),
        TrainCommand::new("trainer").arg("fit"),
        Vec::new(),
    );

    Harness {
        _dir: dir,
        models_dir,
        cache_dir,
        controller,
        orchestrator,
    }
}

fn seed_model(h: &Harness, name: &str) {
    fs::write(h.models_dir.join(name), b"archive bytes").unwrap();
}

// ============================================================================
// Submit Lifecycle
// ============================================================================

#[tokio::test]
async fn successful_run_persists_artifact_and_clears_registry() {
    let h = harness(Script::Exit(0));
    seed_model(&h, "20240607-101500.tar.gz");

    let report = h.orchestrator.submit("req-1", "{}").await.unwrap();

    assert_eq!(report.request_id, "req-1");
    assert_eq!(report.model, "20240607-101500.tar.gz");
    assert!(h
        .cache_dir
        .join("20240607-101500/20240607-101500.tar.gz")
        .exists());
    assert!(!h.orchestrator.registry().check_existence("req-1").unwrap());
}

#[tokio::test]
async fn successful_run_picks_newest_of_several_archives() {
    let h = harness(Script::Exit(0));
    seed_model(&h, "20240101-000000.tar.gz");
    seed_model(&h, "20240607-235959.tar.gz");
    seed_model(&h, "20240301-120000.tar.gz");

    let report = h.orchestrator.submit("req-1", "{}").await.unwrap();

    assert_eq!(report.model, "20240607-235959.tar.gz");
}

#[tokio::test]
async fn failed_run_surfaces_captured_output() {
    let h = harness(Script::Exit(3));
    seed_model(&h, "20240607-101500.tar.gz");

    let err = h.orchestrator.submit("req-1", "{}").await.unwrap_err();

    match &err {
        TrainError::TrainingFailed {
            exit_code,
            stdout,
            stderr,
        } => {
            assert_eq!(*exit_code, 3);
            assert_eq!(stdout, "scripted stdout");
            assert_eq!(stderr, "scripted stderr");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(Outcome::from(&err), Outcome::FailedModel);

    // No artifact was persisted and the registry row is gone.
    assert!(!h.cache_dir.join("20240607-101500").exists());
    assert!(!h.orchestrator.registry().check_existence("req-1").unwrap());
}

#[tokio::test]
async fn duplicate_submit_is_rejected_without_touching_live_entry() {
    let h = harness(Script::Exit(0));
    seed_model(&h, "20240607-101500.tar.gz");
    h.orchestrator
        .registry()
        .push(555, "req-1", 42.0, "{\"epochs\":5}")
        .unwrap();

    let err = h.orchestrator.submit("req-1", "{}").await.unwrap_err();

    assert!(matches!(err, TrainError::DuplicateRequest { .. }));
    assert_eq!(h.orchestrator.registry().get_pid("req-1").unwrap(), 555);
    assert_eq!(
        h.orchestrator.registry().get_metadata("req-1").unwrap(),
        "{\"epochs\":5}"
    );
}

#[tokio::test]
async fn submit_reconciles_stale_cache_entries_first() {
    let h = harness(Script::Exit(0));
    seed_model(&h, "20240607-101500.tar.gz");

    // Orphan entry with no backing archive.
    fs::create_dir_all(h.cache_dir.join("20230101-000000")).unwrap();

    h.orchestrator.submit("req-1", "{}").await.unwrap();

    assert!(!h.cache_dir.join("20230101-000000").exists());
    assert!(h.cache_dir.join("20240607-101500").exists());
}

// ============================================================================
// Abort Lifecycle
// ============================================================================

#[tokio::test]
async fn abort_terminates_running_tree_and_cleans_up() {
    let h = harness(Script::RunUntilTerminated);
    seed_model(&h, "20240607-101500.tar.gz");

    let handle = h.orchestrator.submit_detached("req-1", "{}");

    // Wait until the orchestrator has recorded the real pid.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        match h.orchestrator.registry().get_pid("req-1") {
            Ok(pid) if pid != PID_NONE => break,
            _ => {
                assert!(tokio::time::Instant::now() < deadline, "pid never recorded");
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    }

    let report = h.orchestrator.abort("req-1").await.unwrap();

    assert!(report.root_was_alive);
    assert_eq!(h.controller.terminated_pids(), vec![31337]);
    assert!(!h.orchestrator.registry().check_existence("req-1").unwrap());

    // The submit task observes the termination as a non-zero exit.
    let err = handle.await.unwrap().unwrap_err();
    assert!(matches!(err, TrainError::TrainingFailed { exit_code, .. } if exit_code != 0));
}

#[tokio::test]
async fn abort_unknown_request_is_an_error_and_signals_nothing() {
    let h = harness(Script::Exit(0));

    let err = h.orchestrator.abort("no-such-request").await.unwrap_err();

    assert!(matches!(err, TrainError::RequestNotFound { .. }));
    assert!(h.controller.terminated_pids().is_empty());
}

#[tokio::test]
async fn abort_removes_stale_entry_for_dead_pid() {
    // Entry whose pid was never updated past the sentinel; abort must not
    // signal anything but still clears the row.
    let h = harness(Script::Exit(0));
    h.orchestrator
        .registry()
        .push(PID_NONE, "req-1", 42.0, "{}")
        .unwrap();

    let report = h.orchestrator.abort("req-1").await.unwrap();

    assert_eq!(report, TerminationReport::default());
    assert!(h.controller.terminated_pids().is_empty());
    assert!(!h.orchestrator.registry().check_existence("req-1").unwrap());
}

// ============================================================================
// Naming
// ============================================================================

#[test]
fn archive_names_round_trip_through_stems() {
    assert_eq!(archive_name("20240607-101500"), "20240607-101500.tar.gz");
}
