//! Coarse request outcomes for outer surfaces.
//!
//! Callers outside the crate (web layers, CLIs) receive one of a small set
//! of outcome labels rather than raw error detail; the specific error kind
//! stays in the logs for diagnosis.

use std::fmt;

use super::TrainError;

/// Coarse classification of a finished training request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The trainer exited 0 and the new artifact was persisted.
    Ok,
    /// The trainer itself ran and reported failure (non-zero exit).
    FailedModel,
    /// Anything else went wrong before, around, or after the trainer.
    FailedUnknown,
}

impl Outcome {
    /// Stable label for serialization toward outer surfaces.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::FailedModel => "failed:model",
            Outcome::FailedUnknown => "failed:unknown",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&TrainError> for Outcome {
    fn from(err: &TrainError) -> Self {
        match err {
            TrainError::TrainingFailed { .. } => Outcome::FailedModel,
            _ => Outcome::FailedUnknown,
        }
    }
}
