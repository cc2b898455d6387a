//! Risk scoring model.
//!
//! NIR (numeric risk index) = gravity × probability, both on a 1–5 scale.
//! The bucket thresholds are fixed so that AI-derived and deterministic
//! registers land in the same risk levels for the same scores.

use crate::types::RiskLevel;

/// Lowest valid gravity or probability.
pub const MIN_SCORE: u8 = 1;

/// Highest valid gravity or probability.
pub const MAX_SCORE: u8 = 5;

/// NIR at or above which a hazard is critical.
pub const CRITICAL_THRESHOLD: u8 = 15;

/// NIR at or above which a hazard is high.
pub const HIGH_THRESHOLD: u8 = 10;

/// NIR at or above which a hazard is medium.
pub const MEDIUM_THRESHOLD: u8 = 5;

/// NIR at or above which a step is listed as a critical step.
pub const CRITICAL_STEP_NIR: u8 = 12;

/// Numeric risk index.
pub fn nir(gravity: u8, probability: u8) -> u8 {
    gravity * probability
}

/// Map a NIR to a risk level.
pub fn bucket(nir: u8) -> RiskLevel {
    if nir >= CRITICAL_THRESHOLD {
        RiskLevel::Critical
    } else if nir >= HIGH_THRESHOLD {
        RiskLevel::High
    } else if nir >= MEDIUM_THRESHOLD {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Whether a gravity or probability value is on the 1–5 scale.
pub fn is_valid_score(value: u8) -> bool {
    (MIN_SCORE..=MAX_SCORE).contains(&value)
}

/// Highest initial probability allowed by the procedure's declared risk level.
///
/// Template probabilities are capped by this ceiling and never raised by it.
pub fn probability_ceiling(level: RiskLevel) -> u8 {
    match level {
        RiskLevel::Low => 2,
        RiskLevel::Medium => 3,
        RiskLevel::High => 4,
        RiskLevel::Critical => 5,
    }
}

/// Residual probability once preventive measures apply.
///
/// Without measures the probability is left untouched.
pub fn residual_probability(initial: u8, reduction: u8, has_measures: bool) -> u8 {
    if !has_measures {
        return initial;
    }
    initial.saturating_sub(reduction).max(MIN_SCORE)
}
