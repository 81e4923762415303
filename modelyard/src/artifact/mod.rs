//! Model artifact store and cache reconciliation.
//!
//! A completed training run leaves one archive in the canonical models
//! directory, named by a timestamp pattern (`YYYYMMDD-HHMMSS.tar.gz`). The
//! store keeps an unpacked cache directory per artifact so metric and config
//! queries never reopen the archive, and reconciles that cache against the
//! models directory by deleting orphaned entries.

mod name;
mod reconcile;
mod store;

pub use name::{archive_name, is_model_archive, model_stem, timestamp_key, MODEL_SUFFIX};
pub use reconcile::ReconcileReport;
pub use store::{ArtifactStore, ModelScores, StoreError};
