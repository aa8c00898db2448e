//! Shared data model for one ranking run.
//!
//! Candidates are created by the caller before the run and never mutated;
//! every stage attaches derived scores keyed by [`Candidate::id`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One resume as handed over by the extraction/translation collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub filename: String,
    /// Plain text in the scoring language.
    pub normalized_text: String,
    pub detected_language: String,
    pub was_translated: bool,
}

impl Candidate {
    /// Builds an untranslated English candidate.
    pub fn new(
        id: impl Into<String>,
        filename: impl Into<String>,
        normalized_text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            filename: filename.into(),
            normalized_text: normalized_text.into(),
            detected_language: "en".to_string(),
            was_translated: false,
        }
    }

    pub fn with_language(mut self, detected_language: impl Into<String>, was_translated: bool) -> Self {
        self.detected_language = detected_language.into();
        self.was_translated = was_translated;
        self
    }

    /// `true` when the text has nothing to score.
    pub fn is_blank(&self) -> bool {
        self.normalized_text.trim().is_empty()
    }
}

/// Why a single candidate's score was forced to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoftFailureKind {
    EmptyText,
    ModelError,
    InvalidOutput,
    DeadlineExceeded,
    TaskAborted,
}

impl SoftFailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoftFailureKind::EmptyText => "empty_text",
            SoftFailureKind::ModelError => "model_error",
            SoftFailureKind::InvalidOutput => "invalid_output",
            SoftFailureKind::DeadlineExceeded => "deadline_exceeded",
            SoftFailureKind::TaskAborted => "task_aborted",
        }
    }
}

/// Per-candidate failure that was isolated instead of aborting the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftFailure {
    pub kind: SoftFailureKind,
    pub detail: String,
}

impl SoftFailure {
    pub fn new(kind: SoftFailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn empty_text() -> Self {
        Self::new(SoftFailureKind::EmptyText, "candidate text is empty")
    }

    pub fn deadline() -> Self {
        Self::new(
            SoftFailureKind::DeadlineExceeded,
            "pipeline deadline exceeded before scoring finished",
        )
    }

    pub fn aborted() -> Self {
        Self::new(SoftFailureKind::TaskAborted, "scoring task aborted")
    }
}

impl fmt::Display for SoftFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.detail)
    }
}

/// Score for one candidate from a single stage, in [0,100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageScore {
    pub candidate_id: String,
    pub score: f64,
    pub failure: Option<SoftFailure>,
}

impl StageScore {
    pub fn scored(candidate_id: impl Into<String>, score: f64) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            score,
            failure: None,
        }
    }

    pub fn failed(candidate_id: impl Into<String>, failure: SoftFailure) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            score: 0.0,
            failure: Some(failure),
        }
    }

    pub fn is_soft_failure(&self) -> bool {
        self.failure.is_some()
    }
}

/// Relevance of one candidate across both stages.
///
/// `stage2_score` is `None` when the candidate did not survive the top-K
/// cutoff. That is distinct from `Some(0.0)`, which is a real (or failed)
/// stage-2 score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceScore {
    pub candidate_id: String,
    pub stage1_score: f64,
    pub stage2_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage1_failure: Option<SoftFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage2_failure: Option<SoftFailure>,
}

impl RelevanceScore {
    pub fn survived_cutoff(&self) -> bool {
        self.stage2_score.is_some()
    }
}

/// Outcome of one (candidate, source) fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Ok,
    Timeout,
    NotFound,
    RateLimited,
    Error,
}

impl FetchStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, FetchStatus::Ok)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FetchStatus::Ok => "ok",
            FetchStatus::Timeout => "timeout",
            FetchStatus::NotFound => "not_found",
            FetchStatus::RateLimited => "rate_limited",
            FetchStatus::Error => "error",
        }
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metric name to value, ordered for stable serialization.
pub type Metrics = BTreeMap<String, f64>;

/// Statistics fetched from one external platform for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReputationProfile {
    pub candidate_id: String,
    pub source_name: String,
    /// Profile identifier found in the resume, if any.
    pub handle: Option<String>,
    pub metrics: Metrics,
    pub fetch_status: FetchStatus,
    /// Normalized [0,100] contribution before weighting; 0 unless `Ok`.
    pub sub_score: f64,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ReputationProfile {
    /// Profile for a source that produced no data.
    pub fn failed(
        candidate_id: impl Into<String>,
        source_name: impl Into<String>,
        handle: Option<String>,
        fetch_status: FetchStatus,
        attempts: u32,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            source_name: source_name.into(),
            handle,
            metrics: Metrics::new(),
            fetch_status,
            sub_score: 0.0,
            attempts,
            detail: Some(detail.into()),
        }
    }
}

/// Aggregated reputation of one candidate, in [0,100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReputationScore {
    pub candidate_id: String,
    pub value: f64,
    /// Number of sources that returned data.
    pub sources_ok: usize,
    /// `false` means the value reflects missing data, not low metrics.
    pub has_data: bool,
    /// `false` when the candidate was outside the reputation scope.
    pub fetched: bool,
    pub profiles: Vec<ReputationProfile>,
}

impl ReputationScore {
    /// Placeholder for a candidate whose sources were never queried.
    pub fn not_fetched(candidate_id: impl Into<String>) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            value: 0.0,
            sources_ok: 0,
            has_data: false,
            fetched: false,
            profiles: Vec::new(),
        }
    }
}

/// One row of the final ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub candidate: Candidate,
    pub stage1_score: f64,
    pub stage2_score: Option<f64>,
    pub reputation_score: f64,
    pub reputation_has_data: bool,
    pub reputation_sources: Vec<ReputationProfile>,
    pub combined_score: f64,
    /// 1-based.
    pub rank: usize,
}

/// One row of an intermediate (stage-1 or stage-2) ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub candidate_id: String,
    pub filename: String,
    pub detected_language: String,
    pub was_translated: bool,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<SoftFailure>,
}

impl RankingEntry {
    pub fn from_stage(candidate: &Candidate, stage: &StageScore) -> Self {
        Self {
            candidate_id: candidate.id.clone(),
            filename: candidate.filename.clone(),
            detected_language: candidate.detected_language.clone(),
            was_translated: candidate.was_translated,
            score: stage.score,
            failure: stage.failure.clone(),
        }
    }
}
