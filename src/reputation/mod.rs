//! External reputation signal.
//!
//! Each candidate is looked up on every configured [`ReputationSource`]
//! concurrently. Failures are isolated per (candidate, source): a source that
//! times out, has no profile or is rate limited contributes 0 and the others
//! still count.

pub mod codechef;
pub mod config;
pub mod error;
pub mod github;
pub mod leetcode;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod retry;
pub mod source;


pub use config::{KNOWN_SOURCES, ReputationConfig};
pub use error::FetchError;
pub use retry::RetryPolicy;
pub use source::{ProfileFetcher, ReputationSource};

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::constants::SCORE_MAX;
use crate::model::{Candidate, FetchStatus, ReputationProfile, ReputationScore};
use crate::pipeline::executor::run_bounded;

/// Request-scoped tokens keyed by source name; override configured tokens.
pub type SourceTokens = HashMap<String, String>;

/// Output of [`ReputationAggregator::aggregate_batch`], in input order.
#[derive(Debug, Clone)]
pub struct ReputationBatch {
    pub scores: Vec<ReputationScore>,
    pub deadline_hit: bool,
}

#[derive(Clone)]
pub struct ReputationAggregator {
    client: reqwest::Client,
    sources: Arc<[ReputationSource]>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for ReputationAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReputationAggregator")
            .field("sources", &self.sources)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ReputationAggregator {
    pub fn new(sources: Vec<ReputationSource>, retry: RetryPolicy) -> Self {
        Self {
            client: reqwest::Client::new(),
            sources: sources.into(),
            retry,
        }
    }

    /// Builds every configured source from `config`.
    pub fn from_config(config: &ReputationConfig) -> Result<Self, crate::config::ConfigError> {
        Ok(Self::new(config.build_sources()?, config.retry))
    }

    /// No sources: every candidate gets a zero with `has_data = false`.
    pub fn disabled() -> Self {
        Self::new(Vec::new(), RetryPolicy::none())
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn sources(&self) -> &[ReputationSource] {
        &self.sources
    }

    /// Fetches every source for one candidate and returns the weighted sum.
    ///
    /// Never fails; each source reports its own status in the breakdown.
    pub async fn aggregate(&self, candidate: &Candidate, tokens: &SourceTokens) -> ReputationScore {
        let profiles = join_all(
            self.sources
                .iter()
                .map(|source| self.fetch_profile(source, candidate, tokens)),
        )
        .await;

        let value: f64 = self
            .sources
            .iter()
            .zip(&profiles)
            .map(|(source, profile)| source.weight * profile.sub_score)
            .sum();
        let sources_ok = profiles.iter().filter(|p| p.fetch_status.is_ok()).count();

        let score = ReputationScore {
            candidate_id: candidate.id.clone(),
            value: value.clamp(0.0, SCORE_MAX),
            sources_ok,
            has_data: sources_ok > 0,
            fetched: true,
            profiles,
        };

        debug!(
            candidate_id = %candidate.id,
            value = score.value,
            sources_ok,
            sources = self.sources.len(),
            "Reputation aggregated"
        );

        score
    }

    /// Aggregates a batch with bounded concurrency. Candidates still pending
    /// at the deadline get `timeout` on every source.
    pub async fn aggregate_batch(
        &self,
        candidates: &[Candidate],
        tokens: &SourceTokens,
        concurrency_limit: usize,
        deadline: Instant,
    ) -> ReputationBatch {
        let tokens = Arc::new(tokens.clone());

        let run = run_bounded(candidates.to_vec(), concurrency_limit, deadline, |candidate| {
            let aggregator = self.clone();
            let tokens = Arc::clone(&tokens);
            async move { aggregator.aggregate(&candidate, &tokens).await }
        })
        .await;

        let scores: Vec<ReputationScore> = candidates
            .iter()
            .zip(run.results)
            .map(|(candidate, slot)| slot.unwrap_or_else(|| self.timed_out(candidate)))
            .collect();

        info!(
            candidates = scores.len(),
            with_data = scores.iter().filter(|s| s.has_data).count(),
            deadline_hit = run.deadline_hit,
            "Reputation batch complete"
        );

        ReputationBatch {
            scores,
            deadline_hit: run.deadline_hit,
        }
    }

    /// Zero score recording a timeout on every source.
    pub fn timed_out(&self, candidate: &Candidate) -> ReputationScore {
        let profiles = self
            .sources
            .iter()
            .map(|source| {
                ReputationProfile::failed(
                    candidate.id.clone(),
                    source.name.clone(),
                    None,
                    FetchStatus::Timeout,
                    0,
                    "pipeline deadline exceeded",
                )
            })
            .collect();

        ReputationScore {
            candidate_id: candidate.id.clone(),
            value: 0.0,
            sources_ok: 0,
            has_data: false,
            fetched: true,
            profiles,
        }
    }

    async fn fetch_profile(
        &self,
        source: &ReputationSource,
        candidate: &Candidate,
        tokens: &SourceTokens,
    ) -> ReputationProfile {
        let Some(handle) = source.fetcher.locate_handle(&candidate.normalized_text) else {
            return ReputationProfile::failed(
                candidate.id.clone(),
                source.name.clone(),
                None,
                FetchStatus::NotFound,
                0,
                "no profile handle",
            );
        };

        let token = tokens
            .get(&source.name)
            .map(String::as_str)
            .or(source.token.as_deref());

        let (result, attempts) = self
            .retry
            .run(source.timeout, || {
                source.fetcher.fetch(&self.client, &handle, token)
            })
            .await;

        match result {
            Ok(metrics) => {
                let sub_score = source.fetcher.sub_score(&metrics).clamp(0.0, SCORE_MAX);
                ReputationProfile {
                    candidate_id: candidate.id.clone(),
                    source_name: source.name.clone(),
                    handle: Some(handle),
                    metrics,
                    fetch_status: FetchStatus::Ok,
                    sub_score,
                    attempts,
                    detail: None,
                }
            }
            Err(e) => {
                debug!(
                    candidate_id = %candidate.id,
                    source = %source.name,
                    handle = %handle,
                    attempts,
                    error = %e,
                    "Reputation fetch failed"
                );
                ReputationProfile::failed(
                    candidate.id.clone(),
                    source.name.clone(),
                    Some(handle),
                    e.status(),
                    attempts,
                    e.to_string(),
                )
            }
        }
    }
}
