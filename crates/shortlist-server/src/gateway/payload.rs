use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shortlist::reputation::config::GITHUB;
use shortlist::{Candidate, RankingOutcome, RankingRequest};

fn default_language() -> String {
    "en".to_string()
}

/// Body of `POST /v1/rank`.
#[derive(Debug, Clone, Deserialize)]
pub struct RankRequest {
    pub job_description: String,
    pub candidates: Vec<CandidatePayload>,
    /// Shorthand for `source_tokens.github`.
    #[serde(default)]
    pub github_token: Option<String>,
    #[serde(default)]
    pub source_tokens: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidatePayload {
    #[serde(default)]
    pub id: Option<String>,
    pub filename: String,
    pub text: String,
    #[serde(default = "default_language")]
    pub detected_language: String,
    #[serde(default)]
    pub was_translated: bool,
}

impl CandidatePayload {
    /// Missing or blank ids get a fresh UUID v4.
    pub fn into_candidate(self) -> Candidate {
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Candidate::new(id, self.filename, self.text)
            .with_language(self.detected_language, self.was_translated)
    }
}

impl RankRequest {
    pub fn into_ranking_request(self) -> RankingRequest {
        let candidates = self
            .candidates
            .into_iter()
            .map(CandidatePayload::into_candidate)
            .collect();

        let mut request = RankingRequest::new(self.job_description, candidates);
        request.source_tokens = self.source_tokens;
        if let Some(token) = self.github_token.filter(|t| !t.is_empty()) {
            request.source_tokens.entry(GITHUB.to_string()).or_insert(token);
        }
        request
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankResponse {
    pub success: bool,
    pub request_id: String,
    /// RFC 3339.
    pub generated_at: String,
    #[serde(flatten)]
    pub outcome: RankingOutcome,
}
