//! Maps raw model outputs onto the shared [0,100] score scale.

use tracing::warn;

use crate::constants::SCORE_MAX;
use crate::model::{SoftFailure, SoftFailureKind};

/// `clamp(cosine, 0, 1) × 100`. Negative similarity saturates to 0.
pub fn cosine_to_score(cosine: f64) -> Result<f64, SoftFailure> {
    if !cosine.is_finite() {
        return Err(SoftFailure::new(
            SoftFailureKind::InvalidOutput,
            format!("non-finite cosine similarity {cosine}"),
        ));
    }
    Ok(cosine.clamp(0.0, 1.0) * SCORE_MAX)
}

/// Relevance probability × 100. Out-of-range values are clamped with a warning.
pub fn probability_to_score(probability: f32) -> Result<f64, SoftFailure> {
    if !probability.is_finite() {
        return Err(SoftFailure::new(
            SoftFailureKind::InvalidOutput,
            format!("non-finite relevance probability {probability}"),
        ));
    }

    let probability = probability as f64;
    if !(0.0..=1.0).contains(&probability) {
        warn!(
            probability,
            "Pair scorer returned a value outside [0, 1], clamping"
        );
    }
    Ok(probability.clamp(0.0, 1.0) * SCORE_MAX)
}

/// Rounds half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
