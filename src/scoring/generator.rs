//! Stage 1: bi-encoder similarity between the query and every candidate.

use std::sync::Arc;

use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

use crate::embedding::utils::cosine_similarity;
use crate::embedding::{EmbeddingError, TextEmbedder};
use crate::model::{Candidate, SoftFailure, SoftFailureKind, StageScore};
use crate::pipeline::executor::run_bounded;

use super::error::ScoringError;
use super::normalize::cosine_to_score;

/// Scores of one stage, in input order.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub scores: Vec<StageScore>,
    pub deadline_hit: bool,
}

impl StageOutput {
    pub fn soft_failures(&self) -> usize {
        self.scores.iter().filter(|s| s.is_soft_failure()).count()
    }
}

/// Maps the unfinished slots of a bounded run onto soft failures.
pub(crate) fn fill_missing(
    ids: Vec<String>,
    results: Vec<Option<StageScore>>,
    deadline_hit: bool,
) -> Vec<StageScore> {
    ids.into_iter()
        .zip(results)
        .map(|(id, slot)| {
            slot.unwrap_or_else(|| {
                let failure = if deadline_hit {
                    SoftFailure::deadline()
                } else {
                    SoftFailure::aborted()
                };
                StageScore::failed(id, failure)
            })
        })
        .collect()
}

pub struct CandidateGenerator {
    embedder: Arc<dyn TextEmbedder>,
    concurrency_limit: usize,
}

impl std::fmt::Debug for CandidateGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateGenerator")
            .field("mode", &self.embedder.mode())
            .field("concurrency_limit", &self.concurrency_limit)
            .finish()
    }
}

enum Embedded {
    Score(StageScore),
    Fatal(EmbeddingError),
}

impl CandidateGenerator {
    pub fn new(embedder: Arc<dyn TextEmbedder>, concurrency_limit: usize) -> Self {
        Self {
            embedder,
            concurrency_limit,
        }
    }

    /// Returns exactly one score per candidate, in input order.
    ///
    /// Fails only when the model is unavailable, the query cannot be embedded,
    /// or the deadline passes before any candidate was scored.
    pub async fn generate(
        &self,
        query: &str,
        candidates: &[Candidate],
        deadline: Instant,
    ) -> Result<StageOutput, ScoringError> {
        let query_embedding = Arc::new(self.embed_query(query, deadline).await?);

        let ids: Vec<String> = candidates.iter().map(|c| c.id.clone()).collect();
        let inputs: Vec<(String, String)> = candidates
            .iter()
            .map(|c| (c.id.clone(), c.normalized_text.clone()))
            .collect();

        let run = run_bounded(inputs, self.concurrency_limit, deadline, |(id, text)| {
            let embedder = Arc::clone(&self.embedder);
            let query_embedding = Arc::clone(&query_embedding);
            async move { score_one(embedder, query_embedding, id, text).await }
        })
        .await;

        let mut fatal = None;
        let results: Vec<Option<StageScore>> = run
            .results
            .into_iter()
            .map(|slot| match slot {
                Some(Embedded::Score(score)) => Some(score),
                Some(Embedded::Fatal(e)) => {
                    fatal.get_or_insert(e);
                    None
                }
                None => None,
            })
            .collect();

        if let Some(e) = fatal {
            warn!(error = %e, "Embedding model became unavailable during stage 1");
            return Err(ScoringError::EmbedderUnavailable(e));
        }

        let completed = results.iter().filter(|r| r.is_some()).count();
        if run.deadline_hit && completed == 0 {
            return Err(ScoringError::DeadlineExceeded { stage: "stage 1" });
        }

        let output = StageOutput {
            scores: fill_missing(ids, results, run.deadline_hit),
            deadline_hit: run.deadline_hit,
        };

        info!(
            candidates = output.scores.len(),
            soft_failures = output.soft_failures(),
            deadline_hit = output.deadline_hit,
            "Stage 1 scoring complete"
        );

        Ok(output)
    }

    async fn embed_query(&self, query: &str, deadline: Instant) -> Result<Vec<f32>, ScoringError> {
        if query.trim().is_empty() {
            return Err(ScoringError::EmptyQuery);
        }

        let embedder = Arc::clone(&self.embedder);
        let text = query.to_string();
        let task = tokio::task::spawn_blocking(move || embedder.embed(&text));

        match timeout_at(deadline, task).await {
            Err(_) => Err(ScoringError::DeadlineExceeded { stage: "stage 1" }),
            Ok(Err(e)) => Err(ScoringError::EmbedderUnavailable(
                EmbeddingError::InferenceFailed {
                    reason: format!("query embedding task failed: {e}"),
                },
            )),
            Ok(Ok(Err(EmbeddingError::EmptyInput))) => Err(ScoringError::EmptyQuery),
            Ok(Ok(Err(e))) => Err(ScoringError::EmbedderUnavailable(e)),
            Ok(Ok(Ok(embedding))) => Ok(embedding),
        }
    }
}

async fn score_one(
    embedder: Arc<dyn TextEmbedder>,
    query_embedding: Arc<Vec<f32>>,
    id: String,
    text: String,
) -> Embedded {
    if text.trim().is_empty() {
        debug!(candidate_id = %id, "Empty candidate text, scoring 0");
        return Embedded::Score(StageScore::failed(id, SoftFailure::empty_text()));
    }

    let embedded = tokio::task::spawn_blocking(move || embedder.embed(&text)).await;

    let embedding = match embedded {
        Ok(Ok(embedding)) => embedding,
        Ok(Err(e)) if e.is_fatal() => return Embedded::Fatal(e),
        Ok(Err(EmbeddingError::EmptyInput)) => {
            return Embedded::Score(StageScore::failed(id, SoftFailure::empty_text()));
        }
        Ok(Err(e)) => {
            warn!(candidate_id = %id, error = %e, "Candidate embedding failed");
            return Embedded::Score(StageScore::failed(
                id,
                SoftFailure::new(SoftFailureKind::ModelError, e.to_string()),
            ));
        }
        Err(e) => {
            warn!(candidate_id = %id, error = %e, "Candidate embedding task aborted");
            return Embedded::Score(StageScore::failed(id, SoftFailure::aborted()));
        }
    };

    let score = cosine_similarity(&query_embedding, &embedding)
        .ok_or_else(|| {
            SoftFailure::new(
                SoftFailureKind::InvalidOutput,
                "embedding has mismatched length or zero norm",
            )
        })
        .and_then(cosine_to_score);

    match score {
        Ok(score) => Embedded::Score(StageScore::scored(id, score)),
        Err(failure) => {
            warn!(candidate_id = %id, failure = %failure, "Invalid stage-1 score");
            Embedded::Score(StageScore::failed(id, failure))
        }
    }
}
