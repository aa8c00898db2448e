//! Relevance stages and the final score blend.
//!
//! - [`CandidateGenerator`] (stage 1) scores every candidate with a bi-encoder.
//! - [`Reranker`] (stage 2) rescores the top-K survivors with a cross-encoder.
//! - [`ScoreCombiner`] merges relevance with reputation.
//!
//! Both stages isolate per-candidate failures as [`SoftFailure`](crate::model::SoftFailure)s
//! and only return [`ScoringError`] when the whole stage cannot proceed.

pub mod combiner;
pub mod error;
pub mod generator;
pub mod normalize;
pub mod reranker;


pub use combiner::ScoreCombiner;
pub use error::ScoringError;
pub use generator::{CandidateGenerator, StageOutput};
pub use reranker::Reranker;
