//! Train command - run one training request to completion.

use clap::Args;

use modelyard::orchestrator::{Outcome, TrainError, TrainingOrchestrator};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the train command.
#[derive(Debug, Args)]
pub struct TrainArgs {
    /// Request identifier keying this run
    pub request_id: String,

    /// Opaque metadata stored alongside the run (JSON recommended)
    #[arg(long, default_value = "{}")]
    pub metadata: String,
}

/// Run the train command.
///
/// Drives the request to a terminal state. Ctrl-C aborts the run, which
/// terminates the trainer's whole process tree before exiting.
pub async fn run(args: TrainArgs) -> Result<(), CliError> {
    let runner = CliRunner::new()?;
    runner.log_startup("train");

    let orchestrator =
        TrainingOrchestrator::from_config(runner.supervisor()).map_err(CliError::Train)?;

    println!("Training request: {}", args.request_id);
    println!(
        "Trainer: {} {}",
        runner.supervisor().train_program,
        runner.supervisor().train_args.join(" ")
    );
    println!();

    let handle = orchestrator.submit_detached(args.request_id.clone(), args.metadata.clone());

    tokio::select! {
        joined = handle => {
            let result = joined
                .map_err(|e| CliError::Train(TrainError::Internal(e.to_string())))?;
            report_result(result)
        }
        _ = tokio::signal::ctrl_c() => {
            println!();
            println!("Interrupt received, aborting {}...", args.request_id);
            abort_on_interrupt(&orchestrator, &args.request_id).await
        }
    }
}

fn report_result(
    result: Result<modelyard::orchestrator::TrainReport, TrainError>,
) -> Result<(), CliError> {
    match result {
        Ok(report) => {
            println!("Outcome:  {}", Outcome::Ok);
            println!("Artifact: {}", report.model);
            Ok(())
        }
        Err(err) => {
            println!("Outcome:  {}", Outcome::from(&err));
            if let TrainError::TrainingFailed { stderr, .. } = &err {
                if !stderr.is_empty() {
                    eprintln!();
                    eprintln!("--- trainer stderr ---");
                    eprintln!("{}", stderr.trim_end());
                }
            }
            Err(CliError::Train(err))
        }
    }
}

async fn abort_on_interrupt(
    orchestrator: &TrainingOrchestrator,
    request_id: &str,
) -> Result<(), CliError> {
    let report = orchestrator
        .abort(request_id)
        .await
        .map_err(CliError::Train)?;

    if report.forced {
        println!("Trainer did not exit within the grace period and was force-killed.");
    }
    println!(
        "Aborted {} ({} descendant processes signaled).",
        request_id, report.descendants_signaled
    );
    Ok(())
}
