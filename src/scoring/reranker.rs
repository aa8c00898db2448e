//! Stage 2: joint (query, candidate) scoring of the top-K survivors.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::embedding::{PairScorer, RerankerError};
use crate::model::{Candidate, SoftFailure, SoftFailureKind, StageScore};
use crate::pipeline::executor::run_bounded;

use super::error::ScoringError;
use super::generator::{StageOutput, fill_missing};
use super::normalize::probability_to_score;

pub struct Reranker {
    scorer: Arc<dyn PairScorer>,
    concurrency_limit: usize,
}

impl std::fmt::Debug for Reranker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reranker")
            .field("mode", &self.scorer.mode())
            .field("concurrency_limit", &self.concurrency_limit)
            .finish()
    }
}

enum Scored {
    Score(StageScore),
    Fatal(RerankerError),
}

impl Reranker {
    pub fn new(scorer: Arc<dyn PairScorer>, concurrency_limit: usize) -> Self {
        Self {
            scorer,
            concurrency_limit,
        }
    }

    /// Scores every survivor, in input order.
    ///
    /// The deadline never fails this stage: unfinished pairs become
    /// `deadline_exceeded` soft failures.
    pub async fn rerank(
        &self,
        query: &str,
        survivors: &[Candidate],
        deadline: Instant,
    ) -> Result<StageOutput, ScoringError> {
        if query.trim().is_empty() {
            return Err(ScoringError::EmptyQuery);
        }

        let query: Arc<str> = Arc::from(query);
        let ids: Vec<String> = survivors.iter().map(|c| c.id.clone()).collect();
        let inputs: Vec<(String, String)> = survivors
            .iter()
            .map(|c| (c.id.clone(), c.normalized_text.clone()))
            .collect();

        let run = run_bounded(inputs, self.concurrency_limit, deadline, |(id, text)| {
            let scorer = Arc::clone(&self.scorer);
            let query = Arc::clone(&query);
            async move { score_pair(scorer, query, id, text).await }
        })
        .await;

        let mut fatal = None;
        let results: Vec<Option<StageScore>> = run
            .results
            .into_iter()
            .map(|slot| match slot {
                Some(Scored::Score(score)) => Some(score),
                Some(Scored::Fatal(e)) => {
                    fatal.get_or_insert(e);
                    None
                }
                None => None,
            })
            .collect();

        if let Some(e) = fatal {
            warn!(error = %e, "Pair scorer became unavailable during stage 2");
            return Err(ScoringError::ScorerUnavailable(e));
        }

        let output = StageOutput {
            scores: fill_missing(ids, results, run.deadline_hit),
            deadline_hit: run.deadline_hit,
        };

        info!(
            survivors = output.scores.len(),
            soft_failures = output.soft_failures(),
            deadline_hit = output.deadline_hit,
            "Stage 2 scoring complete"
        );

        Ok(output)
    }
}

async fn score_pair(
    scorer: Arc<dyn PairScorer>,
    query: Arc<str>,
    id: String,
    text: String,
) -> Scored {
    if text.trim().is_empty() {
        debug!(candidate_id = %id, "Empty candidate text, stage-2 score 0");
        return Scored::Score(StageScore::failed(id, SoftFailure::empty_text()));
    }

    let scored = tokio::task::spawn_blocking(move || scorer.score_pair(&query, &text)).await;

    let probability = match scored {
        Ok(Ok(probability)) => probability,
        Ok(Err(e)) if e.is_fatal() => return Scored::Fatal(e),
        Ok(Err(RerankerError::EmptyInput)) => {
            return Scored::Score(StageScore::failed(id, SoftFailure::empty_text()));
        }
        Ok(Err(e)) => {
            warn!(candidate_id = %id, error = %e, "Pair scoring failed");
            return Scored::Score(StageScore::failed(
                id,
                SoftFailure::new(SoftFailureKind::ModelError, e.to_string()),
            ));
        }
        Err(e) => {
            warn!(candidate_id = %id, error = %e, "Pair scoring task aborted");
            return Scored::Score(StageScore::failed(id, SoftFailure::aborted()));
        }
    };

    match probability_to_score(probability) {
        Ok(score) => Scored::Score(StageScore::scored(id, score)),
        Err(failure) => {
            warn!(candidate_id = %id, failure = %failure, "Invalid stage-2 score");
            Scored::Score(StageScore::failed(id, failure))
        }
    }
}
