//! Artifact store over the canonical models directory and the cache.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::metrics::{MetricsError, MetricsReader};

use super::name::{archive_name, is_model_archive, model_stem, timestamp_key};

/// Errors from artifact store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Cache reconciliation could not enumerate a directory.
    #[error("cache reconciliation failed: {0}")]
    Reconcile(std::io::Error),

    /// Persisting an artifact into the cache failed. The cache entry may be
    /// partially written; callers retry from scratch.
    #[error("failed to persist artifact '{name}': {source}")]
    Persist {
        name: String,
        source: std::io::Error,
    },

    /// Deleting an artifact from the models directory failed.
    #[error("failed to delete artifact '{name}': {source}")]
    Delete {
        name: String,
        source: std::io::Error,
    },

    /// The models directory holds no valid artifact.
    #[error("no valid model artifact found in {}", dir.display())]
    NoModelFound { dir: PathBuf },
}

/// Per-artifact scalar series for dashboard consumption.
///
/// Empty vectors are the placeholder when the metrics reader has no data
/// for the artifact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelScores {
    /// Archive name of the artifact.
    pub model_id: String,
    /// Validation accuracy per epoch.
    pub test_acc: Vec<f64>,
    /// Training accuracy per epoch.
    pub train_acc: Vec<f64>,
    /// Validation loss per epoch.
    pub test_loss: Vec<f64>,
    /// Training loss per epoch.
    pub train_loss: Vec<f64>,
    /// Epoch numbers, 1-based.
    pub epochs: Vec<u32>,
}

/// Store for completed model artifacts and their cache directories.
///
/// Cheaply clonable; holds only the two directory paths. All operations are
/// blocking filesystem work, wrapped in `spawn_blocking` by async callers.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    models_dir: PathBuf,
    cache_dir: PathBuf,
}

impl ArtifactStore {
    /// Creates a store over the given models and cache directories.
    pub fn new(models_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
            cache_dir: cache_dir.into(),
        }
    }

    /// Canonical models directory.
    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Cache directory holding one subdirectory per artifact.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Enumerates valid model archives in the models directory (set V).
    ///
    /// A missing models directory yields an empty set rather than an error:
    /// no training run has completed yet.
    pub fn valid_models(&self) -> Result<Vec<String>, StoreError> {
        if !self.models_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.models_dir).map_err(StoreError::Reconcile)?;
        let mut models: Vec<String> = entries
            .flatten()
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|name| is_model_archive(name))
            .collect();
        models.sort();
        Ok(models)
    }

    /// Returns the newest valid archive by timestamp.
    pub fn latest_model(&self) -> Result<String, StoreError> {
        self.valid_models()?
            .into_iter()
            .max_by_key(|name| timestamp_key(name).unwrap_or(0))
            .ok_or_else(|| StoreError::NoModelFound {
                dir: self.models_dir.clone(),
            })
    }

    /// True if the archive exists in the models directory.
    pub fn model_exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.valid_models()?.iter().any(|m| m == name))
    }

    /// Full path of an archive inside the models directory.
    pub fn model_path(&self, name: &str) -> PathBuf {
        self.models_dir.join(name)
    }

    /// Copies a finished artifact plus optional auxiliary assets into the
    /// cache under `cache_dir/<stem>/`.
    ///
    /// Parent directories are created as needed. On failure the cache entry
    /// may be partially written; the caller treats failure as retry from
    /// scratch (the next reconcile sweeps a half-written orphan only if its
    /// archive is also gone).
    pub fn persist_model(&self, name: &str, assets: &[PathBuf]) -> Result<(), StoreError> {
        let persist = |source: std::io::Error| StoreError::Persist {
            name: name.to_string(),
            source,
        };

        let entry_dir = self.cache_dir.join(model_stem(name));
        std::fs::create_dir_all(&entry_dir).map_err(persist)?;

        let archive = self.models_dir.join(name);
        std::fs::copy(&archive, entry_dir.join(name)).map_err(persist)?;

        for asset in assets {
            let Some(basename) = asset.file_name() else {
                continue;
            };
            let dest = entry_dir.join(basename);
            if asset.is_dir() {
                copy_dir_recursive(asset, &dest).map_err(persist)?;
            } else {
                std::fs::copy(asset, &dest).map_err(persist)?;
            }
        }

        info!(
            model = %name,
            assets = assets.len(),
            cache_entry = %entry_dir.display(),
            "Persisted model artifact into cache"
        );
        Ok(())
    }

    /// Removes the archive from the models directory only.
    ///
    /// The caller runs [`reconcile`](Self::reconcile) afterward so the
    /// now-orphaned cache entry is swept.
    pub fn delete_model(&self, name: &str) -> Result<(), StoreError> {
        std::fs::remove_file(self.models_dir.join(name)).map_err(|source| {
            StoreError::Delete {
                name: name.to_string(),
                source,
            }
        })?;
        info!(model = %name, "Deleted model artifact");
        Ok(())
    }

    /// Sweeps cache entries that no longer correspond to a valid artifact.
    ///
    /// See [`super::reconcile`] for the set-difference algorithm.
    pub fn reconcile(&self) -> Result<super::ReconcileReport, StoreError> {
        super::reconcile::reconcile(self)
    }

    /// Scalar series for one artifact, with empty placeholders when the
    /// metrics reader has no data.
    pub fn model_performance(
        &self,
        metrics: &dyn MetricsReader,
        name: &str,
    ) -> ModelScores {
        match metrics.fetch_series(model_stem(name)) {
            Ok(series) => ModelScores {
                model_id: name.to_string(),
                epochs: (1..=series.epoch_count).collect(),
                test_acc: series.test_acc,
                train_acc: series.train_acc,
                test_loss: series.test_loss,
                train_loss: series.train_loss,
            },
            Err(MetricsError::NoData { .. }) => {
                debug!(model = %name, "No metric data recorded, using placeholders");
                ModelScores {
                    model_id: name.to_string(),
                    ..ModelScores::default()
                }
            }
        }
    }

    /// Scalar series for every valid artifact, newest first.
    pub fn all_model_performance(
        &self,
        metrics: &dyn MetricsReader,
    ) -> Result<Vec<ModelScores>, StoreError> {
        let mut models = self.valid_models()?;
        models.sort_by_key(|name| std::cmp::Reverse(timestamp_key(name).unwrap_or(0)));
        Ok(models
            .iter()
            .map(|name| self.model_performance(metrics, name))
            .collect())
    }
}

/// Recursively copies a directory tree.
fn copy_dir_recursive(src: &Path, dest: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dest)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.path().is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

// Used by reconcile.rs for the observed-set normalization.
pub(super) fn observed_cache_entries(store: &ArtifactStore) -> Result<Vec<String>, StoreError> {
    if !store.cache_dir.exists() {
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(&store.cache_dir).map_err(StoreError::Reconcile)?;
    Ok(entries
        .flatten()
        .filter_map(|e| e.file_name().into_string().ok())
        .map(|stem| archive_name(&stem))
        .collect())
}
