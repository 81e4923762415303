//! Gc command - sweep stale artifact cache entries.

use modelyard::artifact::ArtifactStore;
use modelyard::config::ConfigFile;

use crate::error::CliError;

/// Run the gc command.
pub fn run() -> Result<(), CliError> {
    let config = ConfigFile::load().unwrap_or_default();
    let store = ArtifactStore::new(&config.supervisor.models_dir, &config.supervisor.cache_dir);

    println!("Reconciling artifact cache at: {}", store.cache_dir().display());

    let report = store.reconcile().map_err(CliError::Store)?;

    if report.entries_deleted == 0 {
        println!("Cache is clean, nothing to sweep.");
    } else {
        println!(
            "Swept {} stale entries in {} ms",
            report.entries_deleted, report.duration_ms
        );
    }
    if report.delete_failures > 0 {
        println!(
            "Warning: {} entries could not be deleted; see the log for details.",
            report.delete_failures
        );
    }
    Ok(())
}
