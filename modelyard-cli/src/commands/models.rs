//! Model artifact management CLI commands.

use clap::Subcommand;

use modelyard::artifact::{ArtifactStore, ModelScores};
use modelyard::config::ConfigFile;
use modelyard::metrics::NoopMetricsReader;

use crate::error::CliError;

/// Model action subcommands.
#[derive(Debug, Subcommand)]
pub enum ModelCommands {
    /// List valid model archives, newest first
    List,
    /// Show the newest model archive
    Latest,
    /// Show recorded performance for one model, or all models when omitted
    Performance {
        /// Archive name (e.g. 20240607-101500.tar.gz)
        name: Option<String>,
    },
    /// Delete a model archive and sweep its cache entry
    Delete {
        /// Archive name to delete
        name: String,
    },
}

/// Run a models subcommand.
pub fn run(command: ModelCommands) -> Result<(), CliError> {
    let config = ConfigFile::load().unwrap_or_default();
    let store = ArtifactStore::new(&config.supervisor.models_dir, &config.supervisor.cache_dir);

    match command {
        ModelCommands::List => {
            let mut models = store.valid_models().map_err(CliError::Store)?;
            if models.is_empty() {
                println!(
                    "No model archives in {}",
                    store.models_dir().display()
                );
                return Ok(());
            }
            models.reverse();
            for name in models {
                println!("{}", name);
            }
            Ok(())
        }
        ModelCommands::Latest => {
            let name = store.latest_model().map_err(CliError::Store)?;
            println!("{}", name);
            Ok(())
        }
        ModelCommands::Performance { name } => {
            let metrics = NoopMetricsReader;
            match name {
                Some(name) => print_scores(&store.model_performance(&metrics, &name)),
                None => {
                    for scores in store
                        .all_model_performance(&metrics)
                        .map_err(CliError::Store)?
                    {
                        print_scores(&scores);
                        println!();
                    }
                }
            }
            Ok(())
        }
        ModelCommands::Delete { name } => {
            store.delete_model(&name).map_err(CliError::Store)?;
            let report = store.reconcile().map_err(CliError::Store)?;
            println!(
                "Deleted {} ({} cache entries swept)",
                name, report.entries_deleted
            );
            Ok(())
        }
    }
}

fn print_scores(scores: &ModelScores) {
    println!("{}", scores.model_id);
    if scores.epochs.is_empty() {
        println!("  no metric data recorded");
        return;
    }
    println!("  epochs:     {}", scores.epochs.len());
    println!("  test acc:   {:?}", scores.test_acc);
    println!("  train acc:  {:?}", scores.train_acc);
    println!("  test loss:  {:?}", scores.test_loss);
    println!("  train loss: {:?}", scores.train_loss);
}
