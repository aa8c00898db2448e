use thiserror::Error;

use crate::config::ConfigError;
use crate::scoring::ScoringError;

/// Failures that abort a whole ranking run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("candidate batch is empty")]
    EmptyBatch,

    #[error("query is empty")]
    EmptyQuery,

    #[error("duplicate candidate id: {id}")]
    DuplicateCandidate { id: String },

    #[error("scoring model unavailable: {0}")]
    ModelUnavailable(#[source] ScoringError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("deadline exceeded before stage 1 produced any score")]
    DeadlineExceeded,
}

impl From<ScoringError> for PipelineError {
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::EmptyQuery => PipelineError::EmptyQuery,
            ScoringError::DeadlineExceeded { .. } => PipelineError::DeadlineExceeded,
            other => PipelineError::ModelUnavailable(other),
        }
    }
}

impl PipelineError {
    /// `true` for errors caused by the caller's input.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PipelineError::EmptyBatch
                | PipelineError::EmptyQuery
                | PipelineError::DuplicateCandidate { .. }
        )
    }
}
