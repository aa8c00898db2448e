//! Cross-cutting, shared constants.
//!
//! Every tunable here has a matching configuration field; these values are the
//! documented defaults used when no `SHORTLIST_*` override is present.

use std::time::Duration;

/// Number of stage-1 survivors promoted to cross-encoder scoring.
pub const DEFAULT_TOP_K: usize = 20;

/// Number of rows in the final ranking.
pub const DEFAULT_TOP_N: usize = 10;

pub const DEFAULT_RELEVANCE_WEIGHT: f64 = 0.7;
pub const DEFAULT_REPUTATION_WEIGHT: f64 = 0.3;

/// Share of stage-1 score mixed into the relevance component (0 disables).
pub const DEFAULT_STAGE1_BLEND: f64 = 0.0;

/// Upper bound on in-flight tasks within one stage.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 8;

pub const DEFAULT_PIPELINE_DEADLINE: Duration = Duration::from_secs(60);

pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(5);

pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// At most one retry is ever permitted per (candidate, source) fetch.
pub const MAX_FETCH_RETRIES: u32 = 1;

/// Tolerance used when checking that weight sets sum to one.
pub const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// Upper bound of every score produced by the pipeline.
pub const SCORE_MAX: f64 = 100.0;

/// Embedding width of the default bi-encoder (MiniLM-L6).
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Token window shared by the bi-encoder and the cross-encoder.
pub const DEFAULT_MAX_SEQ_LEN: usize = 512;

/// Decimal places kept on combined scores.
pub const COMBINED_SCORE_DECIMALS: i32 = 4;
