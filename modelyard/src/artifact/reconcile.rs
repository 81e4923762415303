//! Cache reconciliation sweep.
//!
//! Computes the set difference between observed cache entries and valid
//! model archives, then deletes every orphan. Pure set difference with no
//! ordering requirements, so running it twice with an unchanged filesystem
//! deletes nothing the second time.
//!
//! Deletion is best-effort: a failed removal is counted and logged but never
//! rolls back removals that already happened, and the sweep continues with
//! the remaining orphans.

use std::collections::HashSet;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::name::model_stem;
use super::store::{observed_cache_entries, ArtifactStore, StoreError};

/// Result of one reconciliation sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Orphaned cache entries deleted.
    pub entries_deleted: usize,
    /// Orphans that could not be deleted.
    pub delete_failures: usize,
    /// Sweep duration in milliseconds.
    pub duration_ms: u64,
}

/// Sweeps cache entries whose archive no longer exists.
pub(super) fn reconcile(store: &ArtifactStore) -> Result<ReconcileReport, StoreError> {
    let start = Instant::now();

    // Valid set V: archives present in the models directory.
    let valid: HashSet<String> = store.valid_models()?.into_iter().collect();

    // Observed set O: cache entries normalized to archive names.
    let observed = observed_cache_entries(store)?;

    let orphans: Vec<&String> = observed.iter().filter(|name| !valid.contains(*name)).collect();
    if orphans.is_empty() {
        debug!(
            valid = valid.len(),
            observed = observed.len(),
            "Cache reconcile found no orphans"
        );
        return Ok(ReconcileReport {
            duration_ms: start.elapsed().as_millis() as u64,
            ..ReconcileReport::default()
        });
    }

    let mut entries_deleted = 0usize;
    let mut delete_failures = 0usize;

    for orphan in orphans {
        let entry = store.cache_dir().join(model_stem(orphan));
        match remove_entry(&entry) {
            Ok(()) => {
                entries_deleted += 1;
                debug!(entry = %entry.display(), "Deleted orphaned cache entry");
            }
            Err(e) => {
                // Best-effort: count, log, keep sweeping.
                delete_failures += 1;
                warn!(
                    entry = %entry.display(),
                    error = %e,
                    "Failed to delete orphaned cache entry"
                );
            }
        }
    }

    let report = ReconcileReport {
        entries_deleted,
        delete_failures,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        entries_deleted = report.entries_deleted,
        delete_failures = report.delete_failures,
        duration_ms = report.duration_ms,
        "Cache reconcile complete"
    );

    Ok(report)
}

/// Removes a cache entry, directory tree or stray file alike.
fn remove_entry(path: &std::path::Path) -> std::io::Result<()> {
    if path.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
}
