use super::*;
use serial_test::serial;
use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

fn clear_shortlist_env() {
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    unsafe {
        env::remove_var("SHORTLIST_PORT");
        env::remove_var("SHORTLIST_BIND_ADDR");
        env::remove_var("SHORTLIST_ENCODER_PATH");
        env::remove_var("SHORTLIST_RERANKER_PATH");
        env::remove_var("SHORTLIST_TOP_K");
        env::remove_var("SHORTLIST_TOP_N");
        env::remove_var("SHORTLIST_RELEVANCE_WEIGHT");
        env::remove_var("SHORTLIST_REPUTATION_WEIGHT");
        env::remove_var("SHORTLIST_STAGE1_BLEND");
        env::remove_var("SHORTLIST_CONCURRENCY");
        env::remove_var("SHORTLIST_DEADLINE_MS");
        env::remove_var("SHORTLIST_REPUTATION_SCOPE");
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.port, 8080);
    assert_eq!(
        config.bind_addr,
        IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1))
    );
    assert!(config.encoder_path.is_none());
    assert!(config.reranker_path.is_none());
}

#[test]
fn test_socket_addr() {
    let config = Config::default();
    assert_eq!(config.socket_addr(), "127.0.0.1:8080");

    let config = Config {
        port: 3000,
        bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0)),
        ..Default::default()
    };
    assert_eq!(config.socket_addr(), "0.0.0.0:3000");
}

#[test]
#[serial]
fn test_from_env_with_defaults() {
    clear_shortlist_env();

    let config = Config::from_env().expect("should parse with defaults");

    assert_eq!(config.port, 8080);
    assert!(config.encoder_path.is_none());
}

#[test]
#[serial]
fn test_from_env_custom_port_and_paths() {
    clear_shortlist_env();

    with_env_vars(
        &[
            ("SHORTLIST_PORT", "3000"),
            ("SHORTLIST_ENCODER_PATH", "/models/all-MiniLM-L6-v2"),
            ("SHORTLIST_RERANKER_PATH", " /models/ms-marco-MiniLM-L-6-v2 "),
        ],
        || {
            let config = Config::from_env().expect("should parse");
            assert_eq!(config.port, 3000);
            assert_eq!(
                config.encoder_path,
                Some(PathBuf::from("/models/all-MiniLM-L6-v2"))
            );
            assert_eq!(
                config.reranker_path,
                Some(PathBuf::from("/models/ms-marco-MiniLM-L-6-v2"))
            );
        },
    );
}

#[test]
#[serial]
fn test_invalid_port_zero() {
    clear_shortlist_env();

    with_env_vars(&[("SHORTLIST_PORT", "0")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { .. }));
        assert!(err.to_string().contains("invalid port"));
    });
}

#[test]
#[serial]
fn test_invalid_port_not_number() {
    clear_shortlist_env();

    with_env_vars(&[("SHORTLIST_PORT", "not_a_port")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::PortParseError { .. }));
    });
}

#[test]
#[serial]
fn test_invalid_bind_addr() {
    clear_shortlist_env();

    with_env_vars(&[("SHORTLIST_BIND_ADDR", "not.an.ip.address")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBindAddr { .. }));
    });
}

#[test]
fn test_validate_nonexistent_encoder_path() {
    let config = Config {
        encoder_path: Some(PathBuf::from("/nonexistent/path/to/encoder")),
        ..Default::default()
    };

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::PathNotFound { .. }));
}

#[test]
fn test_validate_reranker_path_is_file() {
    let config = Config {
        reranker_path: Some(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml")),
        ..Default::default()
    };

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::NotADirectory { .. }));
}

#[test]
fn test_validate_success_with_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Config {
        encoder_path: Some(dir.path().to_path_buf()),
        reranker_path: Some(dir.path().to_path_buf()),
        ..Default::default()
    };

    assert!(config.validate().is_ok());
}

#[test]
fn test_ranking_defaults() {
    let config = RankingConfig::default();

    assert_eq!(config.top_k, 20);
    assert_eq!(config.top_n, 10);
    assert_eq!(config.relevance_weight, 0.7);
    assert_eq!(config.reputation_weight, 0.3);
    assert_eq!(config.stage1_blend, 0.0);
    assert_eq!(config.concurrency_limit, 8);
    assert_eq!(config.deadline, Duration::from_secs(60));
    assert_eq!(config.reputation_scope, ReputationScope::TopK);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_ranking_from_env_overrides() {
    clear_shortlist_env();

    with_env_vars(
        &[
            ("SHORTLIST_TOP_K", "5"),
            ("SHORTLIST_TOP_N", "3"),
            ("SHORTLIST_RELEVANCE_WEIGHT", "0.6"),
            ("SHORTLIST_REPUTATION_WEIGHT", "0.4"),
            ("SHORTLIST_CONCURRENCY", "2"),
            ("SHORTLIST_DEADLINE_MS", "1500"),
            ("SHORTLIST_REPUTATION_SCOPE", "all"),
        ],
        || {
            let config = RankingConfig::from_env().expect("should parse");
            assert_eq!(config.top_k, 5);
            assert_eq!(config.top_n, 3);
            assert_eq!(config.relevance_weight, 0.6);
            assert_eq!(config.reputation_weight, 0.4);
            assert_eq!(config.concurrency_limit, 2);
            assert_eq!(config.deadline, Duration::from_millis(1500));
            assert_eq!(config.reputation_scope, ReputationScope::All);
        },
    );
}

#[test]
#[serial]
fn test_ranking_from_env_rejects_bad_number() {
    clear_shortlist_env();

    with_env_vars(&[("SHORTLIST_TOP_K", "twenty")], || {
        let err = RankingConfig::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidNumber {
                name: "SHORTLIST_TOP_K",
                ..
            }
        ));
    });
}

#[test]
#[serial]
fn test_ranking_from_env_rejects_unbalanced_weights() {
    clear_shortlist_env();

    with_env_vars(&[("SHORTLIST_RELEVANCE_WEIGHT", "0.9")], || {
        let err = RankingConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::WeightsDoNotSumToOne { .. }));
    });
}

#[test]
fn test_ranking_validate_rejects_zero_cutoffs() {
    assert!(RankingConfig::default().with_top_k(0).validate().is_err());
    assert!(RankingConfig::default().with_top_n(0).validate().is_err());
    assert!(
        RankingConfig::default()
            .with_concurrency_limit(0)
            .validate()
            .is_err()
    );
    assert!(
        RankingConfig::default()
            .with_deadline(Duration::ZERO)
            .validate()
            .is_err()
    );
}

#[test]
fn test_ranking_validate_rejects_blend_out_of_range() {
    let config = RankingConfig {
        stage1_blend: 1.5,
        ..Default::default()
    };
    let err = config.validate().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidValue {
            field: "stage1_blend",
            ..
        }
    ));
}

#[test]
fn test_top_k_larger_than_batch_is_clamped() {
    let config = RankingConfig::default().with_top_k(50);
    assert!(config.validate().is_ok());
    assert_eq!(config.effective_top_k(3), 3);
    assert_eq!(config.effective_top_k(80), 50);
}

#[test]
fn test_reputation_scope_parse() {
    assert_eq!("top_k".parse::<ReputationScope>(), Ok(ReputationScope::TopK));
    assert_eq!("TopK".parse::<ReputationScope>(), Ok(ReputationScope::TopK));
    assert_eq!("ALL".parse::<ReputationScope>(), Ok(ReputationScope::All));
    assert!("some".parse::<ReputationScope>().is_err());
}

#[test]
fn test_error_messages_are_descriptive() {
    let err = ConfigError::InvalidPort {
        value: "0".to_string(),
    };
    assert!(err.to_string().contains("1 and 65535"));

    let err = ConfigError::WeightsDoNotSumToOne {
        what: "source",
        sum: 0.9,
    };
    assert!(err.to_string().contains("source weights must sum to 1.0"));

    let err = ConfigError::UnknownSource {
        name: "myspace".to_string(),
    };
    assert!(err.to_string().contains("myspace"));
}
