use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ConfigError;
use crate::config::env;
use crate::constants::{DEFAULT_SOURCE_TIMEOUT, MAX_FETCH_RETRIES, WEIGHT_SUM_EPSILON};

use super::codechef::{CODECHEF_URL, CodechefFetcher};
use super::github::{GITHUB_API_URL, GithubFetcher};
use super::leetcode::{LEETCODE_URL, LeetcodeFetcher};
use super::retry::RetryPolicy;
use super::source::{ProfileFetcher, ReputationSource};

pub const GITHUB: &str = "github";
pub const LEETCODE: &str = "leetcode";
pub const CODECHEF: &str = "codechef";

/// Source names this build knows how to fetch.
pub const KNOWN_SOURCES: [&str; 3] = [GITHUB, LEETCODE, CODECHEF];

/// Reputation sources, their weights and fetch limits.
///
/// The keys of `weights` select which sources are active.
#[derive(Debug, Clone, PartialEq)]
pub struct ReputationConfig {
    /// Default: github=0.4, leetcode=0.4, codechef=0.2.
    pub weights: BTreeMap<String, f64>,

    /// Per-attempt timeout for sources without an override. Default: 5s.
    pub default_timeout: Duration,

    pub timeouts: BTreeMap<String, Duration>,

    pub retry: RetryPolicy,

    pub github_token: Option<String>,

    /// Sent as the `LEETCODE_SESSION` cookie.
    pub leetcode_session: Option<String>,

    pub github_url: String,
    pub leetcode_url: String,
    pub codechef_url: String,
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            weights: BTreeMap::from([
                (GITHUB.to_string(), 0.4),
                (LEETCODE.to_string(), 0.4),
                (CODECHEF.to_string(), 0.2),
            ]),
            default_timeout: DEFAULT_SOURCE_TIMEOUT,
            timeouts: BTreeMap::new(),
            retry: RetryPolicy::default(),
            github_token: None,
            leetcode_session: None,
            github_url: GITHUB_API_URL.to_string(),
            leetcode_url: LEETCODE_URL.to_string(),
            codechef_url: CODECHEF_URL.to_string(),
        }
    }
}

impl ReputationConfig {
    const ENV_SOURCE_TIMEOUT_MS: &'static str = "SHORTLIST_SOURCE_TIMEOUT_MS";
    const ENV_SOURCE_TIMEOUTS: &'static str = "SHORTLIST_SOURCE_TIMEOUTS";
    const ENV_SOURCE_WEIGHTS: &'static str = "SHORTLIST_SOURCE_WEIGHTS";
    const ENV_RETRY_BACKOFF_MS: &'static str = "SHORTLIST_RETRY_BACKOFF_MS";
    const ENV_MAX_RETRIES: &'static str = "SHORTLIST_MAX_RETRIES";
    const ENV_GITHUB_TOKEN: &'static str = "SHORTLIST_GITHUB_TOKEN";
    const ENV_LEETCODE_SESSION: &'static str = "SHORTLIST_LEETCODE_SESSION";
    const ENV_GITHUB_URL: &'static str = "SHORTLIST_GITHUB_URL";
    const ENV_LEETCODE_URL: &'static str = "SHORTLIST_LEETCODE_URL";
    const ENV_CODECHEF_URL: &'static str = "SHORTLIST_CODECHEF_URL";

    /// Loads `SHORTLIST_*` overrides on top of defaults and validates the result.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let weights = match env::read(Self::ENV_SOURCE_WEIGHTS) {
            Some(raw) => env::parse_map(Self::ENV_SOURCE_WEIGHTS, &raw)?,
            None => defaults.weights,
        };

        let timeouts = match env::read(Self::ENV_SOURCE_TIMEOUTS) {
            Some(raw) => env::parse_map::<u64>(Self::ENV_SOURCE_TIMEOUTS, &raw)?
                .into_iter()
                .map(|(name, ms)| (name, Duration::from_millis(ms)))
                .collect(),
            None => defaults.timeouts,
        };

        let retry = RetryPolicy {
            max_retries: env::parse_or(Self::ENV_MAX_RETRIES, defaults.retry.max_retries)?,
            backoff: env::millis_or(Self::ENV_RETRY_BACKOFF_MS, defaults.retry.backoff)?,
        };

        let config = Self {
            weights,
            default_timeout: env::millis_or(Self::ENV_SOURCE_TIMEOUT_MS, defaults.default_timeout)?,
            timeouts,
            retry,
            github_token: env::read(Self::ENV_GITHUB_TOKEN),
            leetcode_session: env::read(Self::ENV_LEETCODE_SESSION),
            github_url: env::read(Self::ENV_GITHUB_URL).unwrap_or(defaults.github_url),
            leetcode_url: env::read(Self::ENV_LEETCODE_URL).unwrap_or(defaults.leetcode_url),
            codechef_url: env::read(Self::ENV_CODECHEF_URL).unwrap_or(defaults.codechef_url),
        };

        config.validate()?;
        Ok(config)
    }

    /// Replaces the active source set.
    pub fn with_weights<I, S>(mut self, weights: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        self.weights = weights
            .into_iter()
            .map(|(name, weight)| (name.into(), weight))
            .collect();
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn timeout_for(&self, name: &str) -> Duration {
        self.timeouts
            .get(name)
            .copied()
            .unwrap_or(self.default_timeout)
    }

    /// Rejects unknown sources, bad weights, zero timeouts and >1 retry.
    ///
    /// An empty source set is valid: every candidate then scores 0 reputation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for name in self.weights.keys().chain(self.timeouts.keys()) {
            if !KNOWN_SOURCES.contains(&name.as_str()) {
                return Err(ConfigError::UnknownSource { name: name.clone() });
            }
        }

        for (name, weight) in &self.weights {
            if !weight.is_finite() || !(0.0..=1.0).contains(weight) {
                return Err(ConfigError::InvalidValue {
                    field: "source_weight",
                    reason: format!("{name} weight must be between 0.0 and 1.0, got {weight}"),
                });
            }
        }

        if !self.weights.is_empty() {
            let sum: f64 = self.weights.values().sum();
            if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
                return Err(ConfigError::WeightsDoNotSumToOne {
                    what: "source",
                    sum,
                });
            }
        }

        if self.default_timeout.is_zero() || self.timeouts.values().any(Duration::is_zero) {
            return Err(ConfigError::InvalidValue {
                field: "source_timeout",
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.retry.max_retries > MAX_FETCH_RETRIES {
            return Err(ConfigError::InvalidValue {
                field: "max_retries",
                reason: format!(
                    "at most {MAX_FETCH_RETRIES} retry is allowed, got {}",
                    self.retry.max_retries
                ),
            });
        }

        Ok(())
    }

    /// Resolves source names to fetchers once, in name order.
    pub fn build_sources(&self) -> Result<Vec<ReputationSource>, ConfigError> {
        self.validate()?;

        self.weights
            .iter()
            .map(|(name, weight)| {
                let (fetcher, token): (Arc<dyn ProfileFetcher>, Option<String>) =
                    match name.as_str() {
                        GITHUB => (
                            Arc::new(GithubFetcher::new(self.github_url.clone())),
                            self.github_token.clone(),
                        ),
                        LEETCODE => (
                            Arc::new(LeetcodeFetcher::new(self.leetcode_url.clone())),
                            self.leetcode_session.clone(),
                        ),
                        CODECHEF => (
                            Arc::new(CodechefFetcher::new(self.codechef_url.clone())),
                            None,
                        ),
                        other => {
                            return Err(ConfigError::UnknownSource {
                                name: other.to_string(),
                            });
                        }
                    };

                Ok(
                    ReputationSource::new(name.clone(), fetcher, *weight, self.timeout_for(name))
                        .with_token(token),
                )
            })
            .collect()
    }
}
