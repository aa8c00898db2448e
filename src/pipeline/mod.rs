//! Stage sequencing for one ranking run.
//!
//! `Extracted → Stage1Scored → TopKSelected → Stage2Scored → ReputationScored
//! → Combined → Ranked`. Every stage is total over its input: a candidate that
//! fails is scored 0 with a soft-failure flag and stays in the batch.
//!
//! Reputation runs concurrently with stage 2 (scope `top_k`) or with both
//! relevance stages (scope `all`).

pub mod error;
pub mod executor;


pub use error::PipelineError;

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::{RankingConfig, ReputationScope};
use crate::embedding::{PairScorer, TextEmbedder};
use crate::model::{
    Candidate, RankedResult, RankingEntry, RelevanceScore, ReputationScore, StageScore,
};
use crate::reputation::{ReputationAggregator, ReputationBatch, SourceTokens};
use crate::scoring::{CandidateGenerator, Reranker, ScoreCombiner, StageOutput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Extracted,
    Stage1Scored,
    TopKSelected,
    Stage2Scored,
    ReputationScored,
    Combined,
    Ranked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTiming {
    pub stage: PipelineStage,
    pub elapsed_ms: f64,
}

/// Input of one run: the query and the candidates, in caller order.
#[derive(Debug, Clone, Default)]
pub struct RankingRequest {
    pub query: String,
    pub candidates: Vec<Candidate>,
    pub source_tokens: SourceTokens,
}

impl RankingRequest {
    pub fn new(query: impl Into<String>, candidates: Vec<Candidate>) -> Self {
        Self {
            query: query.into(),
            candidates,
            source_tokens: SourceTokens::new(),
        }
    }

    /// Token used for `source` on this request only.
    pub fn with_source_token(mut self, source: impl Into<String>, token: impl Into<String>) -> Self {
        self.source_tokens.insert(source.into(), token.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingOutcome {
    pub total_processed: usize,
    /// Every candidate, stage-1 score descending.
    pub stage1_ranking: Vec<RankingEntry>,
    /// Top-K survivors, stage-2 score descending.
    pub stage2_ranking: Vec<RankingEntry>,
    /// Final top-N.
    pub top_candidates: Vec<RankedResult>,
    /// One per candidate, in input order.
    pub relevance_scores: Vec<RelevanceScore>,
    /// One per candidate, in input order.
    pub reputation_scores: Vec<ReputationScore>,
    /// Set when the deadline cut any stage short.
    pub incomplete: bool,
    pub stage_timings: Vec<StageTiming>,
}

struct RelevancePhase {
    stage1: StageOutput,
    /// Input indices of the top-K survivors, stage-1 order.
    survivors: Vec<usize>,
    stage2: StageOutput,
    /// Survivor reputation when scope is `top_k`.
    reputation: Option<ReputationBatch>,
    timings: Vec<StageTiming>,
}

pub struct RankingPipeline {
    config: RankingConfig,
    generator: CandidateGenerator,
    reranker: Reranker,
    reputation: ReputationAggregator,
    combiner: ScoreCombiner,
}

impl std::fmt::Debug for RankingPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RankingPipeline")
            .field("config", &self.config)
            .field("generator", &self.generator)
            .field("reranker", &self.reranker)
            .field("reputation", &self.reputation)
            .finish()
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}

fn timing(stage: PipelineStage, elapsed: Duration) -> StageTiming {
    debug!(?stage, elapsed_ms = elapsed.as_secs_f64() * 1000.0, "Pipeline stage complete");
    StageTiming {
        stage,
        elapsed_ms: elapsed.as_secs_f64() * 1000.0,
    }
}

async fn timed<F: Future>(fut: F) -> (F::Output, Duration) {
    let started = Instant::now();
    let output = fut.await;
    (output, started.elapsed())
}

/// Input indices ordered by score descending; equal scores keep input order.
fn stable_order(scores: &[StageScore]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].score.total_cmp(&scores[a].score));
    order
}

impl RankingPipeline {
    pub fn new(
        config: RankingConfig,
        embedder: Arc<dyn TextEmbedder>,
        scorer: Arc<dyn PairScorer>,
        reputation: ReputationAggregator,
    ) -> Result<Self, PipelineError> {
        config.validate()?;

        Ok(Self {
            generator: CandidateGenerator::new(embedder, config.concurrency_limit),
            reranker: Reranker::new(scorer, config.concurrency_limit),
            combiner: ScoreCombiner::from_config(&config),
            reputation,
            config,
        })
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    pub fn reputation(&self) -> &ReputationAggregator {
        &self.reputation
    }

    pub async fn rank(&self, request: RankingRequest) -> Result<RankingOutcome, PipelineError> {
        let run_started = Instant::now();
        let deadline = run_started + self.config.deadline;
        let RankingRequest {
            query,
            candidates,
            source_tokens,
        } = request;

        Self::validate_batch(&query, &candidates)?;
        let mut timings = vec![timing(PipelineStage::Extracted, run_started.elapsed())];

        info!(
            candidates = candidates.len(),
            top_k = self.config.effective_top_k(candidates.len()),
            top_n = self.config.top_n,
            scope = ?self.config.reputation_scope,
            "Ranking run started"
        );

        let (mut phase, reputation_all) = match self.config.reputation_scope {
            ReputationScope::TopK => {
                let phase = self
                    .relevance_phase(&query, &candidates, &source_tokens, true, deadline)
                    .await?;
                (phase, None)
            }
            ReputationScope::All => {
                let (phase, (batch, elapsed)) = tokio::join!(
                    self.relevance_phase(&query, &candidates, &source_tokens, false, deadline),
                    timed(self.reputation.aggregate_batch(
                        &candidates,
                        &source_tokens,
                        self.config.concurrency_limit,
                        deadline,
                    )),
                );
                let mut phase = phase?;
                phase
                    .timings
                    .push(timing(PipelineStage::ReputationScored, elapsed));
                (phase, Some(batch))
            }
        };
        timings.extend(phase.timings.iter().cloned());

        let combine_started = Instant::now();
        let reputation_batch = reputation_all.or(phase.reputation.take());
        let reputation_deadline_hit = reputation_batch.as_ref().is_some_and(|b| b.deadline_hit);
        let reputation_scores = self.reputation_for_all(&candidates, reputation_batch);

        let mut ranked: Vec<RankedResult> = phase
            .survivors
            .iter()
            .zip(&phase.stage2.scores)
            .map(|(&idx, stage2)| {
                let stage1 = phase.stage1.scores[idx].score;
                let reputation = &reputation_scores[idx];
                RankedResult {
                    candidate: candidates[idx].clone(),
                    stage1_score: stage1,
                    stage2_score: Some(stage2.score),
                    reputation_score: reputation.value,
                    reputation_has_data: reputation.has_data,
                    reputation_sources: reputation.profiles.clone(),
                    combined_score: self.combiner.combine(stage1, stage2.score, reputation.value),
                    rank: 0,
                }
            })
            .collect();
        timings.push(timing(PipelineStage::Combined, combine_started.elapsed()));

        let rank_started = Instant::now();
        ranked.sort_by(|a, b| {
            b.combined_score
                .total_cmp(&a.combined_score)
                .then_with(|| {
                    b.stage2_score
                        .unwrap_or(0.0)
                        .total_cmp(&a.stage2_score.unwrap_or(0.0))
                })
                .then_with(|| a.candidate.id.cmp(&b.candidate.id))
        });
        ranked.truncate(self.config.top_n);
        for (position, result) in ranked.iter_mut().enumerate() {
            result.rank = position + 1;
        }

        let outcome = RankingOutcome {
            total_processed: candidates.len(),
            stage1_ranking: stable_order(&phase.stage1.scores)
                .into_iter()
                .map(|idx| RankingEntry::from_stage(&candidates[idx], &phase.stage1.scores[idx]))
                .collect(),
            stage2_ranking: Self::stage2_ranking(&candidates, &phase.survivors, &phase.stage2),
            top_candidates: ranked,
            relevance_scores: Self::relevance_scores(&phase),
            reputation_scores,
            incomplete: phase.stage1.deadline_hit
                || phase.stage2.deadline_hit
                || reputation_deadline_hit,
            stage_timings: {
                timings.push(timing(PipelineStage::Ranked, rank_started.elapsed()));
                timings
            },
        };

        info!(
            total = outcome.total_processed,
            returned = outcome.top_candidates.len(),
            incomplete = outcome.incomplete,
            elapsed_ms = elapsed_ms(run_started),
            "Ranking run complete"
        );

        Ok(outcome)
    }

    fn validate_batch(query: &str, candidates: &[Candidate]) -> Result<(), PipelineError> {
        if candidates.is_empty() {
            return Err(PipelineError::EmptyBatch);
        }
        if query.trim().is_empty() {
            return Err(PipelineError::EmptyQuery);
        }

        let mut seen = HashSet::with_capacity(candidates.len());
        for candidate in candidates {
            if !seen.insert(candidate.id.as_str()) {
                return Err(PipelineError::DuplicateCandidate {
                    id: candidate.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Stage 1, top-K cutoff and stage 2, with survivor reputation alongside
    /// stage 2 when `with_reputation` is set.
    async fn relevance_phase(
        &self,
        query: &str,
        candidates: &[Candidate],
        tokens: &SourceTokens,
        with_reputation: bool,
        deadline: Instant,
    ) -> Result<RelevancePhase, PipelineError> {
        let mut timings = Vec::new();

        let (stage1, elapsed) = timed(self.generator.generate(query, candidates, deadline)).await;
        let stage1 = stage1?;
        timings.push(timing(PipelineStage::Stage1Scored, elapsed));

        let cutoff_started = Instant::now();
        let k = self.config.effective_top_k(candidates.len());
        let survivors: Vec<usize> = stable_order(&stage1.scores).into_iter().take(k).collect();
        let survivor_candidates: Vec<Candidate> =
            survivors.iter().map(|&idx| candidates[idx].clone()).collect();
        timings.push(timing(PipelineStage::TopKSelected, cutoff_started.elapsed()));

        let stage2_fut = timed(self.reranker.rerank(query, &survivor_candidates, deadline));

        let (stage2, reputation) = if with_reputation {
            let ((stage2, stage2_elapsed), (batch, rep_elapsed)) = tokio::join!(
                stage2_fut,
                timed(self.reputation.aggregate_batch(
                    &survivor_candidates,
                    tokens,
                    self.config.concurrency_limit,
                    deadline,
                )),
            );
            timings.push(timing(PipelineStage::Stage2Scored, stage2_elapsed));
            timings.push(timing(PipelineStage::ReputationScored, rep_elapsed));
            (stage2?, Some(batch))
        } else {
            let (stage2, elapsed) = stage2_fut.await;
            timings.push(timing(PipelineStage::Stage2Scored, elapsed));
            (stage2?, None)
        };

        Ok(RelevancePhase {
            stage1,
            survivors,
            stage2,
            reputation,
            timings,
        })
    }

    /// One reputation score per input candidate, in input order.
    ///
    /// The batch is keyed by candidate id: in `top_k` scope it arrives in
    /// survivor order, in `all` scope in input order.
    fn reputation_for_all(
        &self,
        candidates: &[Candidate],
        batch: Option<ReputationBatch>,
    ) -> Vec<ReputationScore> {
        let mut by_id: HashMap<String, ReputationScore> = batch
            .map(|b| {
                b.scores
                    .into_iter()
                    .map(|score| (score.candidate_id.clone(), score))
                    .collect()
            })
            .unwrap_or_default();

        candidates
            .iter()
            .map(|c| {
                by_id
                    .remove(&c.id)
                    .unwrap_or_else(|| ReputationScore::not_fetched(c.id.clone()))
            })
            .collect()
    }

    fn stage2_ranking(
        candidates: &[Candidate],
        survivors: &[usize],
        stage2: &StageOutput,
    ) -> Vec<RankingEntry> {
        let mut entries: Vec<RankingEntry> = survivors
            .iter()
            .zip(&stage2.scores)
            .map(|(&idx, score)| RankingEntry::from_stage(&candidates[idx], score))
            .collect();
        // Same tie-break as the final ranking, so a zero reputation leaves
        // the order unchanged.
        entries.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.candidate_id.cmp(&b.candidate_id))
        });
        entries
    }

    fn relevance_scores(phase: &RelevancePhase) -> Vec<RelevanceScore> {
        let mut scores: Vec<RelevanceScore> = phase
            .stage1
            .scores
            .iter()
            .map(|s1| RelevanceScore {
                candidate_id: s1.candidate_id.clone(),
                stage1_score: s1.score,
                stage2_score: None,
                stage1_failure: s1.failure.clone(),
                stage2_failure: None,
            })
            .collect();

        for (&idx, s2) in phase.survivors.iter().zip(&phase.stage2.scores) {
            scores[idx].stage2_score = Some(s2.score);
            scores[idx].stage2_failure = s2.failure.clone();
        }
        scores
    }
}
