//! Blends relevance and reputation into the final score.

use crate::config::RankingConfig;
use crate::constants::{COMBINED_SCORE_DECIMALS, SCORE_MAX};

use super::normalize::round_to;

/// Pure weighted blend; independent of every other candidate in the batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreCombiner {
    relevance_weight: f64,
    reputation_weight: f64,
    stage1_blend: f64,
}

impl Default for ScoreCombiner {
    fn default() -> Self {
        Self::from_config(&RankingConfig::default())
    }
}

impl ScoreCombiner {
    /// Weights are taken as validated by [`RankingConfig::validate`].
    pub fn from_config(config: &RankingConfig) -> Self {
        Self {
            relevance_weight: config.relevance_weight,
            reputation_weight: config.reputation_weight,
            stage1_blend: config.stage1_blend,
        }
    }

    /// `(1 - b)·stage2 + b·stage1`; equals `stage2` with the default blend.
    pub fn relevance_component(&self, stage1: f64, stage2: f64) -> f64 {
        (1.0 - self.stage1_blend) * stage2 + self.stage1_blend * stage1
    }

    /// Combined score in [0,100], rounded to four decimals.
    pub fn combine(&self, stage1: f64, stage2: f64, reputation: f64) -> f64 {
        let relevance = self.relevance_component(stage1, stage2);
        let combined = self.relevance_weight * relevance + self.reputation_weight * reputation;
        round_to(combined.clamp(0.0, SCORE_MAX), COMBINED_SCORE_DECIMALS)
    }
}
