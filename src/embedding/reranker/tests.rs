use super::*;
use std::path::PathBuf;

#[test]
fn test_config_default() {
    let config = RerankerConfig::default();

    assert!(config.model_path.is_none());
    assert_eq!(config.max_seq_len, MAX_SEQ_LEN);
}

#[test]
fn test_config_new() {
    let config = RerankerConfig::new("/models/ms-marco-MiniLM-L-6-v2");

    assert_eq!(
        config.model_path,
        Some(PathBuf::from("/models/ms-marco-MiniLM-L-6-v2"))
    );
}

#[test]
fn test_config_validate() {
    assert!(RerankerConfig::default().validate().is_ok());

    let invalid = RerankerConfig {
        max_seq_len: 0,
        ..Default::default()
    };
    assert!(invalid.validate().is_err());

    let empty_path = RerankerConfig {
        model_path: Some(PathBuf::new()),
        ..Default::default()
    };
    assert!(empty_path.validate().is_err());
}

#[test]
fn test_load_without_path_is_stub() {
    let reranker = CrossEncoder::load(RerankerConfig::stub()).unwrap();
    assert!(!reranker.is_model_loaded());
    assert_eq!(PairScorer::mode(&reranker), ModelMode::Stub);
}

#[test]
fn test_load_missing_path_is_fatal() {
    let err = CrossEncoder::load(RerankerConfig::new("/nonexistent/reranker")).unwrap_err();
    assert!(matches!(err, RerankerError::ModelNotFound { .. }));
    assert!(err.is_fatal());
}

#[test]
fn test_load_incomplete_directory_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = CrossEncoder::load(RerankerConfig::new(dir.path())).unwrap_err();
    assert!(matches!(err, RerankerError::ModelLoadFailed { .. }));
    assert!(err.is_fatal());
}

#[test]
fn test_stub_score_is_probability() {
    let reranker = CrossEncoder::stub();
    for (q, c) in [
        ("rust tokio", "rust tokio axum"),
        ("go kubernetes", "marketing brand"),
        ("the a an", "anything at all"),
    ] {
        let score = reranker.score(q, c).unwrap();
        assert!((0.0..=1.0).contains(&score), "{q} / {c} -> {score}");
    }
}

#[test]
fn test_stub_prefers_keyword_overlap() {
    let reranker = CrossEncoder::stub();
    let query = "Backend engineer with Go and distributed systems";

    let relevant = reranker
        .score(query, "Go backend engineer, distributed systems at scale")
        .unwrap();
    let irrelevant = reranker
        .score(query, "Marketing manager focused on brand campaigns")
        .unwrap();

    assert!(relevant > irrelevant);
}

#[test]
fn test_stub_is_deterministic() {
    let reranker = CrossEncoder::stub();
    let a = reranker.score("rust", "rust developer").unwrap();
    let b = reranker.score("rust", "rust developer").unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_empty_pair_is_rejected() {
    let reranker = CrossEncoder::stub();
    assert!(matches!(
        reranker.score("query", "  "),
        Err(RerankerError::EmptyInput)
    ));
    assert!(!RerankerError::EmptyInput.is_fatal());
}
