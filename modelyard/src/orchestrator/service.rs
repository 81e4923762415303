//! The training orchestrator itself.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::task::{self, JoinHandle};
use tracing::{error, info, warn};

use crate::artifact::{ArtifactStore, ReconcileReport, StoreError};
#[cfg(unix)]
use crate::config::SupervisorConfig;
use crate::process::{
    ProcessController, ProcessError, TerminationReport, TrainCommand,
};
use crate::registry::{RegistryError, RunRegistry, PID_NONE};

/// Errors surfaced by [`TrainingOrchestrator`] operations.
#[derive(Debug, Error)]
pub enum TrainError {
    /// A run with this request id is already queued or running.
    #[error("request '{request_id}' is already queued")]
    DuplicateRequest { request_id: String },

    /// No run with this request id is registered.
    #[error("request '{request_id}' not found")]
    RequestNotFound { request_id: String },

    /// The trainer ran and exited non-zero. A normal terminal outcome of
    /// the job, carrying its captured output for diagnosis.
    #[error("trainer exited with status {exit_code}")]
    TrainingFailed {
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    /// Spawning, waiting on, or terminating the trainer failed.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// The registry store failed.
    #[error(transparent)]
    Registry(RegistryError),

    /// The artifact store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A background task was cancelled or panicked.
    #[error("internal task failure: {0}")]
    Internal(String),
}

impl From<RegistryError> for TrainError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Duplicate { request_id } => TrainError::DuplicateRequest { request_id },
            RegistryError::NotFound { request_id } => TrainError::RequestNotFound { request_id },
            other => TrainError::Registry(other),
        }
    }
}

/// Result of a completed training request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainReport {
    /// Request id the run was keyed by.
    pub request_id: String,
    /// Archive name of the freshly persisted artifact.
    pub model: String,
}

/// Facade that drives one training request end to end.
///
/// Cheap to clone; clones share the registry and the process controller.
#[derive(Clone)]
pub struct TrainingOrchestrator {
    registry: Arc<RunRegistry>,
    controller: Arc<dyn ProcessController>,
    store: ArtifactStore,
    command: TrainCommand,
    persist_assets: Vec<PathBuf>,
}

impl TrainingOrchestrator {
    /// Creates an orchestrator from its collaborators.
    pub fn new(
        registry: Arc<RunRegistry>,
        controller: Arc<dyn ProcessController>,
        store: ArtifactStore,
        command: TrainCommand,
        persist_assets: Vec<PathBuf>,
    ) -> Self {
        Self {
            registry,
            controller,
            store,
            command,
            persist_assets,
        }
    }

    /// Creates an orchestrator with the platform process controller.
    ///
    /// Opens (and resets) the registry database named by the configuration.
    #[cfg(unix)]
    pub fn from_config(config: &SupervisorConfig) -> Result<Self, TrainError> {
        use crate::process::UnixProcessController;

        let registry = RunRegistry::open(&config.registry_path)?;
        let controller =
            UnixProcessController::new().with_grace_period(config.grace_period);
        let store = ArtifactStore::new(&config.models_dir, &config.cache_dir);

        let mut command = TrainCommand::new(&config.train_program);
        for arg in &config.train_args {
            command = command.arg(arg);
        }

        Ok(Self::new(
            Arc::new(registry),
            Arc::new(controller),
            store,
            command,
            config.persist_assets.clone(),
        ))
    }

    /// Read access to the shared registry.
    pub fn registry(&self) -> &RunRegistry {
        &self.registry
    }

    /// Read access to the artifact store.
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Drives one training request to a terminal state.
    ///
    /// Flow: reconcile the cache, register the request with a sentinel pid,
    /// spawn the trainer, record the real pid, wait for exit, remove the
    /// registry entry, then persist the newest artifact and reconcile again.
    ///
    /// Every failure path removes the registry entry for `request_id`, with
    /// one exception: [`TrainError::DuplicateRequest`] leaves the existing
    /// entry untouched, since it belongs to the run already in flight.
    pub async fn submit(&self, request_id: &str, metadata: &str) -> Result<TrainReport, TrainError> {
        info!(request_id = %request_id, "Submitting training request");

        self.reconcile().await?;

        if self.registry.check_existence(request_id)? {
            warn!(request_id = %request_id, "Request already queued");
            return Err(TrainError::DuplicateRequest {
                request_id: request_id.to_string(),
            });
        }

        self.registry
            .push(PID_NONE, request_id, now_ts(), metadata)?;

        match self.run_to_completion(request_id).await {
            Ok(report) => Ok(report),
            Err(err) => {
                error!(request_id = %request_id, error = %err, "Training request failed");
                if let Err(cleanup) = self.registry.remove(request_id) {
                    error!(request_id = %request_id, error = %cleanup, "Registry cleanup failed");
                }
                Err(err)
            }
        }
    }

    /// Spawns `submit` onto the runtime and returns its handle.
    ///
    /// Training runs for minutes to hours; callers serving inbound requests
    /// must not hold a connection open across the wait.
    pub fn submit_detached(
        &self,
        request_id: impl Into<String>,
        metadata: impl Into<String>,
    ) -> JoinHandle<Result<TrainReport, TrainError>> {
        let orchestrator = self.clone();
        let request_id = request_id.into();
        let metadata = metadata.into();
        tokio::spawn(async move { orchestrator.submit(&request_id, &metadata).await })
    }

    /// Aborts a registered request by terminating its process tree.
    ///
    /// Fails with [`TrainError::RequestNotFound`] when no entry exists.
    /// The registry entry is removed whether or not termination succeeds,
    /// so a pid that died without deregistering cannot leave a stale row.
    pub async fn abort(&self, request_id: &str) -> Result<TerminationReport, TrainError> {
        if !self.registry.check_existence(request_id)? {
            return Err(TrainError::RequestNotFound {
                request_id: request_id.to_string(),
            });
        }

        let pid = self.registry.get_pid(request_id)?;
        info!(request_id = %request_id, pid, "Aborting training request");

        let termination = if pid == PID_NONE {
            // Spawn had not recorded a real pid yet; nothing to signal.
            Ok(TerminationReport::default())
        } else {
            self.controller
                .terminate_tree(pid)
                .await
                .map_err(TrainError::from)
        };

        self.registry.remove(request_id)?;
        let reconcile = self.reconcile().await;

        let report = termination?;
        reconcile?;

        info!(
            request_id = %request_id,
            descendants = report.descendants_signaled,
            forced = report.forced,
            "Training request aborted"
        );
        Ok(report)
    }

    /// Runs a cache reconciliation pass off the async runtime.
    pub async fn reconcile(&self) -> Result<ReconcileReport, TrainError> {
        let store = self.store.clone();
        let report = task::spawn_blocking(move || store.reconcile())
            .await
            .map_err(|e| TrainError::Internal(e.to_string()))??;
        Ok(report)
    }

    async fn run_to_completion(&self, request_id: &str) -> Result<TrainReport, TrainError> {
        let child = self.controller.spawn(&self.command)?;
        let pid = child.pid();
        self.registry.update_pid(pid, request_id, now_ts())?;
        info!(request_id = %request_id, pid, "Trainer started");

        let outcome = child.wait().await?;
        self.registry.remove(request_id)?;

        if !outcome.success() {
            warn!(
                request_id = %request_id,
                exit_code = outcome.exit_code,
                "Trainer exited non-zero"
            );
            return Err(TrainError::TrainingFailed {
                exit_code: outcome.exit_code,
                stdout: outcome.stdout,
                stderr: outcome.stderr,
            });
        }

        let model = self.persist_latest().await?;
        info!(request_id = %request_id, model = %model, "Training request completed");
        Ok(TrainReport {
            request_id: request_id.to_string(),
            model,
        })
    }

    /// Persists the newest archive plus configured assets, then sweeps the
    /// cache of entries with no backing archive.
    async fn persist_latest(&self) -> Result<String, TrainError> {
        let store = self.store.clone();
        let assets = self.persist_assets.clone();
        let model = task::spawn_blocking(move || -> Result<String, StoreError> {
            let model = store.latest_model()?;
            store.persist_model(&model, &assets)?;
            store.reconcile()?;
            Ok(model)
        })
        .await
        .map_err(|e| TrainError::Internal(e.to_string()))??;
        Ok(model)
    }
}

/// Seconds since the Unix epoch with sub-second precision.
fn now_ts() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}
