use std::time::Duration;

use crate::constants::{
    DEFAULT_CONCURRENCY_LIMIT, DEFAULT_PIPELINE_DEADLINE, DEFAULT_RELEVANCE_WEIGHT,
    DEFAULT_REPUTATION_WEIGHT, DEFAULT_STAGE1_BLEND, DEFAULT_TOP_K, DEFAULT_TOP_N,
    WEIGHT_SUM_EPSILON,
};

use super::env;
use super::error::ConfigError;

/// Which candidates get reputation fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReputationScope {
    /// Only top-K survivors; the rest receive a not-fetched zero.
    #[default]
    TopK,
    /// Every candidate, fetched alongside the relevance stages.
    All,
}

impl std::str::FromStr for ReputationScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "top_k" | "topk" | "top-k" => Ok(Self::TopK),
            "all" => Ok(Self::All),
            _ => Err(format!("unknown reputation scope: {}", s)),
        }
    }
}

/// Knobs for one ranking run.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingConfig {
    /// Stage-1 survivors promoted to stage 2. Default: `20`. Clamped to N.
    pub top_k: usize,

    /// Rows in the final ranking. Default: `10`.
    pub top_n: usize,

    /// Default: `0.7`.
    pub relevance_weight: f64,

    /// Default: `0.3`.
    pub reputation_weight: f64,

    /// Share of stage-1 score in the relevance component. Default: `0.0`.
    pub stage1_blend: f64,

    /// Max in-flight tasks within a stage. Default: `8`.
    pub concurrency_limit: usize,

    /// Overall deadline for one run. Default: 60s.
    pub deadline: Duration,

    /// Default: [`ReputationScope::TopK`].
    pub reputation_scope: ReputationScope,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            top_n: DEFAULT_TOP_N,
            relevance_weight: DEFAULT_RELEVANCE_WEIGHT,
            reputation_weight: DEFAULT_REPUTATION_WEIGHT,
            stage1_blend: DEFAULT_STAGE1_BLEND,
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            deadline: DEFAULT_PIPELINE_DEADLINE,
            reputation_scope: ReputationScope::TopK,
        }
    }
}

impl RankingConfig {
    const ENV_TOP_K: &'static str = "SHORTLIST_TOP_K";
    const ENV_TOP_N: &'static str = "SHORTLIST_TOP_N";
    const ENV_RELEVANCE_WEIGHT: &'static str = "SHORTLIST_RELEVANCE_WEIGHT";
    const ENV_REPUTATION_WEIGHT: &'static str = "SHORTLIST_REPUTATION_WEIGHT";
    const ENV_STAGE1_BLEND: &'static str = "SHORTLIST_STAGE1_BLEND";
    const ENV_CONCURRENCY: &'static str = "SHORTLIST_CONCURRENCY";
    const ENV_DEADLINE_MS: &'static str = "SHORTLIST_DEADLINE_MS";
    const ENV_REPUTATION_SCOPE: &'static str = "SHORTLIST_REPUTATION_SCOPE";

    /// Loads `SHORTLIST_*` overrides on top of defaults and validates the result.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let reputation_scope = match env::read(Self::ENV_REPUTATION_SCOPE) {
            Some(value) => value
                .parse()
                .map_err(|reason| ConfigError::InvalidValue {
                    field: "reputation_scope",
                    reason,
                })?,
            None => defaults.reputation_scope,
        };

        let config = Self {
            top_k: env::parse_or(Self::ENV_TOP_K, defaults.top_k)?,
            top_n: env::parse_or(Self::ENV_TOP_N, defaults.top_n)?,
            relevance_weight: env::parse_or(Self::ENV_RELEVANCE_WEIGHT, defaults.relevance_weight)?,
            reputation_weight: env::parse_or(
                Self::ENV_REPUTATION_WEIGHT,
                defaults.reputation_weight,
            )?,
            stage1_blend: env::parse_or(Self::ENV_STAGE1_BLEND, defaults.stage1_blend)?,
            concurrency_limit: env::parse_or(Self::ENV_CONCURRENCY, defaults.concurrency_limit)?,
            deadline: env::millis_or(Self::ENV_DEADLINE_MS, defaults.deadline)?,
            reputation_scope,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_weights(mut self, relevance: f64, reputation: f64) -> Self {
        self.relevance_weight = relevance;
        self.reputation_weight = reputation;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    pub fn with_reputation_scope(mut self, scope: ReputationScope) -> Self {
        self.reputation_scope = scope;
        self
    }

    /// Checks weights, cutoffs and limits. `top_k > N` is not an error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                field: "top_k",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.top_n == 0 {
            return Err(ConfigError::InvalidValue {
                field: "top_n",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.concurrency_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "concurrency_limit",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.deadline.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "deadline",
                reason: "must be greater than zero".to_string(),
            });
        }

        for (field, weight) in [
            ("relevance_weight", self.relevance_weight),
            ("reputation_weight", self.reputation_weight),
            ("stage1_blend", self.stage1_blend),
        ] {
            if !(0.0..=1.0).contains(&weight) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("must be between 0.0 and 1.0, got {}", weight),
                });
            }
        }

        let sum = self.relevance_weight + self.reputation_weight;
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(ConfigError::WeightsDoNotSumToOne {
                what: "relevance/reputation",
                sum,
            });
        }

        Ok(())
    }

    /// Effective cutoff for a batch of `n` candidates.
    pub fn effective_top_k(&self, n: usize) -> usize {
        self.top_k.min(n)
    }
}
