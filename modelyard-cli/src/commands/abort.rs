//! Abort command - terminate a run started by a sibling process.

use clap::Args;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the abort command.
#[derive(Debug, Args)]
pub struct AbortArgs {
    /// Request identifier of the run to abort
    pub request_id: String,
}

/// Run the abort command.
///
/// Attaches to the shared registry rather than resetting it, so runs
/// registered by another modelyard process remain visible.
pub async fn run(args: AbortArgs) -> Result<(), CliError> {
    let runner = CliRunner::new()?;
    runner.log_startup("abort");

    let orchestrator = runner.attach_orchestrator()?;

    let report = orchestrator
        .abort(&args.request_id)
        .await
        .map_err(CliError::Train)?;

    if report.root_was_alive {
        if report.forced {
            println!("Trainer did not exit within the grace period and was force-killed.");
        }
        println!(
            "Aborted {} ({} descendant processes signaled).",
            args.request_id, report.descendants_signaled
        );
    } else {
        println!(
            "Process for {} was already dead; stale registry entry removed.",
            args.request_id
        );
    }
    Ok(())
}
