//! Prediction result data structures

use serde::{Deserialize, Serialize};
use std::fmt;

/// Probability at or above which an applicant is approved
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Confidence classification by distance from the decision boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    /// High: `p >= 0.8 || p <= 0.2`.
    /// Medium: `0.6 <= p < 0.8 || 0.2 < p <= 0.4`.
    /// Low: `0.4 < p < 0.6`.
    pub fn from_probability(probability: f64) -> Self {
        if probability >= 0.8 || probability <= 0.2 {
            ConfidenceBand::High
        } else if probability >= 0.6 || probability <= 0.4 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceBand::High => "high",
            ConfidenceBand::Medium => "medium",
            ConfidenceBand::Low => "low",
        }
    }
}

impl fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary credit decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Rejected,
    Approved,
}

impl Decision {
    pub fn from_probability(probability: f64) -> Self {
        if probability >= DECISION_THRESHOLD {
            Decision::Approved
        } else {
            Decision::Rejected
        }
    }

    /// 1 for approved, 0 for rejected
    pub fn class(&self) -> u8 {
        match self {
            Decision::Rejected => 0,
            Decision::Approved => 1,
        }
    }
}

/// Advice shown to the analyst for a decision at a given confidence
pub fn recommendation(decision: Decision, band: ConfidenceBand) -> &'static str {
    match (decision, band) {
        (Decision::Approved, ConfidenceBand::High) => "Aprovação recomendada",
        (Decision::Approved, ConfidenceBand::Medium) => "Aprovação recomendada com ressalvas",
        (Decision::Approved, ConfidenceBand::Low) => "Analisar com cuidado",
        (Decision::Rejected, ConfidenceBand::Low) => "Analisar com cuidado: risco próximo ao limite",
        (Decision::Rejected, ConfidenceBand::Medium | ConfidenceBand::High) => "Não recomendado",
    }
}

/// Outcome of scoring one applicant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    /// 1 = approved, 0 = rejected
    pub predicted_class: u8,

    /// Probability of the approved class (0.0 - 1.0)
    pub probability: f64,

    pub confidence_band: ConfidenceBand,

    /// Registry key of the model that produced the score
    pub model_key: String,

    pub model_display_name: String,

    pub recommendation: String,
}

impl PredictionResult {
    /// Derive class, band and recommendation from a probability
    pub fn from_probability(probability: f64, model_key: &str, model_display_name: &str) -> Self {
        let decision = Decision::from_probability(probability);
        let band = ConfidenceBand::from_probability(probability);

        Self {
            predicted_class: decision.class(),
            probability,
            confidence_band: band,
            model_key: model_key.to_string(),
            model_display_name: model_display_name.to_string(),
            recommendation: recommendation(decision, band).to_string(),
        }
    }
}
