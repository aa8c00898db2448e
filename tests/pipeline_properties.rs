//! Property tests for ranking-run invariants.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;

use shortlist::{
    Candidate, FetchError, MockEmbedder, MockScorer, RankingConfig, RankingOutcome,
    RankingPipeline, RankingRequest, ReputationAggregator, ReputationScope, ReputationSource,
    RetryPolicy, ScriptedFetcher, ScriptedResponse,
};

const QUERY: &str = "Backend engineer: Go, Rust, distributed systems, Kubernetes, Postgres";

const WORDS: &[&str] = &[
    "go", "rust", "java", "kubernetes", "postgres", "distributed", "systems", "backend",
    "engineer", "marketing", "brand", "sales", "design", "figma", "kafka", "terraform",
    "the", "and", "with",
];

fn candidates_strategy() -> impl Strategy<Value = Vec<Candidate>> {
    prop::collection::vec(prop::collection::vec(prop::sample::select(WORDS), 0..12), 1..12)
        .prop_map(|texts| {
            texts
                .into_iter()
                .enumerate()
                .map(|(i, words)| {
                    Candidate::new(format!("c{i:02}"), format!("c{i:02}.pdf"), words.join(" "))
                })
                .collect()
        })
}

fn run(pipeline: &RankingPipeline, candidates: Vec<Candidate>) -> RankingOutcome {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    rt.block_on(pipeline.rank(RankingRequest::new(QUERY, candidates)))
        .unwrap()
}

fn stub_pipeline(config: RankingConfig, reputation: ReputationAggregator) -> RankingPipeline {
    RankingPipeline::new(
        config,
        Arc::new(MockEmbedder::new()),
        Arc::new(MockScorer::new()),
        reputation,
    )
    .unwrap()
}

/// Every candidate carries `github: h` and every lookup fails.
fn failing_reputation() -> ReputationAggregator {
    let fetcher = ScriptedFetcher::new("github").respond(
        "h",
        ScriptedResponse::Fail(FetchError::Transient {
            reason: "upstream 502".to_string(),
        }),
    );
    ReputationAggregator::new(
        vec![ReputationSource::new(
            "github",
            Arc::new(fetcher),
            1.0,
            Duration::from_millis(200),
        )],
        RetryPolicy::none(),
    )
}

/// Candidate `i` carries `alpha: h<i>`, which scores a distinct value.
fn distinct_reputation(n: usize) -> ReputationAggregator {
    let fetcher = (0..n).fold(ScriptedFetcher::new("alpha"), |fetcher, i| {
        fetcher.respond(&format!("h{i}"), ScriptedResponse::Score(handle_score(i)))
    });
    ReputationAggregator::new(
        vec![ReputationSource::new(
            "alpha",
            Arc::new(fetcher),
            1.0,
            Duration::from_millis(200),
        )],
        RetryPolicy::none(),
    )
}

fn handle_score(i: usize) -> f64 {
    (i * 9 % 100) as f64
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_stage1_covers_every_candidate(candidates in candidates_strategy()) {
        let n = candidates.len();
        let pipeline = stub_pipeline(RankingConfig::default(), ReputationAggregator::disabled());
        let outcome = run(&pipeline, candidates);

        prop_assert_eq!(outcome.total_processed, n);
        prop_assert_eq!(outcome.stage1_ranking.len(), n);
        for entry in &outcome.stage1_ranking {
            prop_assert!((0.0..=100.0).contains(&entry.score));
        }
    }

    #[test]
    fn prop_stage2_is_stable_top_k(candidates in candidates_strategy(), k in 1usize..8) {
        let n = candidates.len();
        let pipeline = stub_pipeline(
            RankingConfig::default().with_top_k(k),
            ReputationAggregator::disabled(),
        );
        let outcome = run(&pipeline, candidates);

        prop_assert_eq!(outcome.stage2_ranking.len(), k.min(n));

        let top_stage1: HashSet<&str> = outcome
            .stage1_ranking
            .iter()
            .take(k)
            .map(|e| e.candidate_id.as_str())
            .collect();
        let stage2: HashSet<&str> = outcome
            .stage2_ranking
            .iter()
            .map(|e| e.candidate_id.as_str())
            .collect();
        prop_assert_eq!(top_stage1, stage2);
    }

    #[test]
    fn prop_combined_is_bounded_weighted_sum(candidates in candidates_strategy()) {
        let pipeline = stub_pipeline(RankingConfig::default(), ReputationAggregator::disabled());
        let outcome = run(&pipeline, candidates);

        for result in &outcome.top_candidates {
            prop_assert!((0.0..=100.0).contains(&result.combined_score));
            let expected = 0.7 * result.stage2_score.unwrap_or(0.0) + 0.3 * result.reputation_score;
            prop_assert!((result.combined_score - expected).abs() < 1e-4);
        }
    }

    #[test]
    fn prop_identical_input_identical_output(candidates in candidates_strategy()) {
        let pipeline = stub_pipeline(RankingConfig::default(), ReputationAggregator::disabled());
        let first = run(&pipeline, candidates.clone());
        let second = run(&pipeline, candidates);

        prop_assert_eq!(first.stage1_ranking, second.stage1_ranking);
        prop_assert_eq!(first.stage2_ranking, second.stage2_ranking);
        prop_assert_eq!(first.top_candidates, second.top_candidates);
    }

    #[test]
    fn prop_failing_sources_keep_stage2_order(candidates in candidates_strategy()) {
        let candidates: Vec<Candidate> = candidates
            .into_iter()
            .map(|mut c| {
                c.normalized_text.push_str("\ngithub: h");
                c
            })
            .collect();
        let pipeline = stub_pipeline(RankingConfig::default(), failing_reputation());
        let outcome = run(&pipeline, candidates);

        let stage2: Vec<&str> = outcome
            .stage2_ranking
            .iter()
            .map(|e| e.candidate_id.as_str())
            .collect();
        let combined: Vec<&str> = outcome
            .top_candidates
            .iter()
            .map(|r| r.candidate.id.as_str())
            .collect();
        prop_assert_eq!(&stage2[..combined.len()], &combined[..]);
        prop_assert!(outcome.reputation_scores.iter().all(|r| !r.has_data));
    }

    #[test]
    fn prop_reputation_stays_with_its_candidate(
        candidates in candidates_strategy(),
        k in 1usize..14,
        all_scope in any::<bool>(),
    ) {
        let n = candidates.len();
        let candidates: Vec<Candidate> = candidates
            .into_iter()
            .enumerate()
            .map(|(i, mut c)| {
                c.normalized_text.push_str(&format!("\nalpha: h{i}"));
                c
            })
            .collect();
        let ids: Vec<String> = candidates.iter().map(|c| c.id.clone()).collect();
        let scope = if all_scope { ReputationScope::All } else { ReputationScope::TopK };
        let pipeline = stub_pipeline(
            RankingConfig::default()
                .with_top_k(k)
                .with_top_n(n)
                .with_reputation_scope(scope),
            distinct_reputation(n),
        );
        let outcome = run(&pipeline, candidates);

        prop_assert_eq!(outcome.reputation_scores.len(), n);
        for (i, score) in outcome.reputation_scores.iter().enumerate() {
            prop_assert_eq!(&score.candidate_id, &ids[i]);
            if score.fetched {
                prop_assert_eq!(score.value, handle_score(i));
            }
        }
        for result in &outcome.top_candidates {
            let i = ids.iter().position(|id| *id == result.candidate.id).unwrap();
            prop_assert_eq!(result.reputation_score, handle_score(i));
            prop_assert!(result
                .reputation_sources
                .iter()
                .all(|p| p.candidate_id == result.candidate.id));
        }
    }
}
