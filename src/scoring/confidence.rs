use serde::{Deserialize, Serialize};

use super::domain::ConfidenceLevel;

const MARGIN_WEIGHT: f64 = 0.5;
const EVIDENCE_WEIGHT: f64 = 0.3;
const COVERAGE_WEIGHT: f64 = 0.2;

const HIGH_CONFIDENCE: f64 = 0.7;
const MEDIUM_CONFIDENCE: f64 = 0.4;

/// A margin this far from the threshold counts as fully decisive.
pub const DECISIVE_MARGIN: f64 = 0.15;

/// Inputs to a confidence estimate, each already on [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceFactors {
    pub margin: f64,
    pub evidence: f64,
    pub coverage: f64,
}

impl ConfidenceFactors {
    /// Distance of the achieved ratio from the threshold, saturating at [`DECISIVE_MARGIN`].
    pub fn margin_factor(ratio: f64, threshold: f64) -> f64 {
        ((ratio - threshold).abs() / DECISIVE_MARGIN).min(1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceEstimate {
    pub confidence: f64,
    pub level: ConfidenceLevel,
    pub message: String,
}

pub fn estimate(factors: ConfidenceFactors, passed: bool) -> ConfidenceEstimate {
    let confidence = (MARGIN_WEIGHT * unit(factors.margin)
        + EVIDENCE_WEIGHT * unit(factors.evidence)
        + COVERAGE_WEIGHT * unit(factors.coverage))
    .clamp(0.0, 1.0);

    let level = if confidence >= HIGH_CONFIDENCE {
        ConfidenceLevel::High
    } else if confidence >= MEDIUM_CONFIDENCE {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    };

    ConfidenceEstimate {
        confidence,
        level,
        message: message(passed, level),
    }
}

pub fn message(passed: bool, level: ConfidenceLevel) -> String {
    let verdict = if passed { "Passed" } else { "Did not pass" };
    format!(
        "{verdict} the role threshold with {} confidence.",
        level.label()
    )
}

fn unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
