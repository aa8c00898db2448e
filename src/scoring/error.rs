use thiserror::Error;

use crate::embedding::{EmbeddingError, RerankerError};

/// Stage-level failures. Per-candidate problems never surface here; they
/// become soft failures on the candidate's score instead.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("embedding model unavailable: {0}")]
    EmbedderUnavailable(#[source] EmbeddingError),

    #[error("reranker unavailable: {0}")]
    ScorerUnavailable(#[source] RerankerError),

    #[error("query has no scorable content")]
    EmptyQuery,

    #[error("deadline exceeded before {stage} produced any score")]
    DeadlineExceeded { stage: &'static str },
}
