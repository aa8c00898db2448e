//! Shortlist library crate (used by the server and integration tests).
//!
//! Ranks a batch of resumes against one job description in two stages and
//! blends the result with reputation signals fetched from public profiles.
//!
//! # Public API Surface
//!
//! ## Pipeline
//! - [`RankingPipeline`], [`RankingRequest`], [`RankingOutcome`] - One ranking run
//! - [`RankingConfig`], [`ReputationScope`] - Run-level knobs
//!
//! ## Scoring
//! - [`CandidateGenerator`] - Stage 1 (bi-encoder similarity)
//! - [`Reranker`] - Stage 2 (cross-encoder relevance)
//! - [`ScoreCombiner`] - Weighted relevance/reputation blend
//!
//! ## Models
//! - [`BiEncoder`], [`CrossEncoder`] - BERT-backed models with deterministic stubs
//! - [`TextEmbedder`], [`PairScorer`] - Seams used by the scoring stages
//!
//! ## Reputation
//! - [`ReputationAggregator`], [`ReputationSource`], [`ReputationConfig`]
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod embedding;
pub mod model;
pub mod pipeline;
pub mod reputation;
pub mod scoring;

pub use config::{Config, ConfigError, RankingConfig, ReputationScope};
pub use embedding::{
    BiEncoder, CrossEncoder, EmbeddingError, EncoderConfig, ModelMode, PairScorer, RerankerConfig,
    RerankerError, TextEmbedder,
};
#[cfg(any(test, feature = "mock"))]
pub use embedding::mock::{MockEmbedder, MockScorer};
pub use model::{
    Candidate, FetchStatus, Metrics, RankedResult, RankingEntry, RelevanceScore,
    ReputationProfile, ReputationScore, SoftFailure, SoftFailureKind, StageScore,
};
pub use pipeline::{
    PipelineError, PipelineStage, RankingOutcome, RankingPipeline, RankingRequest, StageTiming,
};
#[cfg(any(test, feature = "mock"))]
pub use reputation::mock::{ScriptedFetcher, ScriptedResponse};
pub use reputation::{
    FetchError, KNOWN_SOURCES, ProfileFetcher, ReputationAggregator, ReputationBatch,
    ReputationConfig, ReputationSource, RetryPolicy, SourceTokens,
};
pub use scoring::{CandidateGenerator, Reranker, ScoreCombiner, ScoringError, StageOutput};
