//! Scoring models behind fixed contracts.
//!
//! - [`encoder`] produces per-text embeddings for stage 1 ([`TextEmbedder`]).
//! - [`reranker`] scores (query, candidate) pairs for stage 2 ([`PairScorer`]).
//!
//! Both load a BERT checkpoint through candle when a model directory is
//! configured and otherwise fall back to a deterministic stub.

/// BERT heads (mean-pooled encoder, single-logit classifier).
pub mod bert;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
/// Bi-encoder used by stage 1.
pub mod encoder;
mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
/// Cross-encoder used by stage 2.
pub mod reranker;
/// Tokenizer loading and vector helpers.
pub mod utils;

use serde::{Deserialize, Serialize};

pub use encoder::{BiEncoder, EncoderConfig};
pub use error::EmbeddingError;
pub use reranker::{CrossEncoder, RerankerConfig, RerankerError};

/// Whether a scorer runs a real checkpoint or the deterministic stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelMode {
    Model,
    Stub,
}

impl ModelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelMode::Model => "model",
            ModelMode::Stub => "stub",
        }
    }
}

/// Maps a text to a fixed-length embedding.
///
/// Implementations are synchronous and may block; callers run them on the
/// blocking pool. A fatal error ([`EmbeddingError::is_fatal`]) means the
/// model can serve no further input.
pub trait TextEmbedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    fn mode(&self) -> ModelMode;
}

/// Scores a (query, candidate) pair jointly.
///
/// Returns a relevance probability. Values outside `[0, 1]` are treated as
/// out-of-contract by the stage that consumes them.
pub trait PairScorer: Send + Sync {
    fn score_pair(&self, query: &str, candidate: &str) -> Result<f32, RerankerError>;

    fn mode(&self) -> ModelMode;
}
