//! End-to-end ranking scenarios against stub models.

use std::sync::Arc;
use std::time::Duration;

use shortlist::{
    Candidate, FetchStatus, MockEmbedder, MockScorer, RankingConfig, RankingPipeline,
    RankingRequest, ReputationAggregator, ReputationSource, RetryPolicy, ScriptedFetcher,
    ScriptedResponse,
};

const GO_JOB: &str = "We are hiring a backend engineer with strong Go experience who has \
                      built distributed systems, microservices and Kubernetes deployments";

#[tokio::test]
async fn test_go_resume_beats_marketing_resume() {
    let pipeline = RankingPipeline::new(
        RankingConfig::default(),
        Arc::new(MockEmbedder::new()),
        Arc::new(MockScorer::new()),
        ReputationAggregator::disabled(),
    )
    .unwrap();

    let candidates = vec![
        Candidate::new(
            "marketing",
            "marketing.pdf",
            "Marketing manager with ten years of brand strategy, social media campaigns \
             and event planning",
        ),
        Candidate::new(
            "gopher",
            "gopher.pdf",
            "Backend engineer: five years of Go, designed distributed systems and \
             microservices, operated Kubernetes deployments",
        ),
    ];

    let outcome = pipeline
        .rank(RankingRequest::new(GO_JOB, candidates))
        .await
        .unwrap();

    assert_eq!(outcome.stage1_ranking[0].candidate_id, "gopher");
    assert_eq!(outcome.top_candidates[0].candidate.id, "gopher");
    assert!(outcome.stage1_ranking[0].score > outcome.stage1_ranking[1].score);
}

#[tokio::test]
async fn test_reputation_timeout_ranks_below_success() {
    let fetcher = ScriptedFetcher::new("github")
        .respond("stalled", ScriptedResponse::Slow(Duration::from_secs(5), 100.0))
        .respond("prompt", ScriptedResponse::Score(60.0));
    let reputation = ReputationAggregator::new(
        vec![ReputationSource::new(
            "github",
            Arc::new(fetcher),
            1.0,
            Duration::from_millis(100),
        )],
        RetryPolicy::none(),
    );
    let pipeline = RankingPipeline::new(
        RankingConfig::default(),
        Arc::new(MockEmbedder::new()),
        Arc::new(MockScorer::new().scoring("Go engineer", 0.75)),
        reputation,
    )
    .unwrap();

    let candidates = vec![
        Candidate::new("a", "a.pdf", "Go engineer, distributed systems\ngithub: stalled"),
        Candidate::new("b", "b.pdf", "Go engineer, distributed systems\ngithub: prompt"),
    ];
    let outcome = pipeline
        .rank(RankingRequest::new(GO_JOB, candidates))
        .await
        .unwrap();

    let first = &outcome.top_candidates[0];
    let second = &outcome.top_candidates[1];
    assert_eq!(first.candidate.id, "b");
    assert_eq!(second.candidate.id, "a");
    assert_eq!(first.stage2_score, second.stage2_score);
    assert_eq!(second.reputation_sources[0].fetch_status, FetchStatus::Timeout);
    assert!(!second.reputation_has_data);
    // The per-source timeout is a soft failure, not a degraded run.
    assert!(!outcome.incomplete);
}

#[tokio::test]
async fn test_reference_blend() {
    let fetcher = ScriptedFetcher::new("github").respond("dev", ScriptedResponse::Score(50.0));
    let reputation = ReputationAggregator::new(
        vec![ReputationSource::new(
            "github",
            Arc::new(fetcher),
            1.0,
            Duration::from_millis(200),
        )],
        RetryPolicy::none(),
    );
    let pipeline = RankingPipeline::new(
        RankingConfig::default(),
        Arc::new(MockEmbedder::new()),
        Arc::new(MockScorer::new().scoring("Go", 0.8)),
        reputation,
    )
    .unwrap();

    let outcome = pipeline
        .rank(RankingRequest::new(
            GO_JOB,
            vec![Candidate::new("c", "c.pdf", "Go developer\ngithub: dev")],
        ))
        .await
        .unwrap();

    let result = &outcome.top_candidates[0];
    assert!((result.stage2_score.unwrap() - 80.0).abs() < 1e-4);
    assert_eq!(result.reputation_score, 50.0);
    assert_eq!(result.combined_score, 71.0);
}
