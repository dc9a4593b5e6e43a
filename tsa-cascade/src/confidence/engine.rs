//! Confidence Engine
//!
//! Unifies detector output into one explainable confidence per strategy.
//!
//! # Formula
//! ```text
//! feature_bonus       = Σ w_i · v_i            (v_i → 1 − v_i when w_i < 0)
//! semantic_multiplier = clamp(1 + (sim − 0.5) · semantic_multiplier_weight, 0.5, 1.5)
//! quality_adjustment  = −Σ violation penalties (each ≤ 0.1) + evidence-quality term
//! final = clamp((base + feature_bonus + custom + enhancement) · multiplier
//!               + quality_adjustment, 0, 1)
//! ```
//! Feature values are clamped to [0, 1] before weighting.
//!
//! # Rejection
//! Applied in order, both always evaluated:
//! 1. Semantic veto: similarity < 0.2 forces 0
//! 2. Minimum confidence: final below the profile minimum is forced to 0
//!
//! Unknown codes yield a zero explanation marked "no profile available".

use super::profiles::{profile, QualityThreshold, StrategyProfile};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Similarity below which no strategy is trusted
pub const SEMANTIC_VETO_THRESHOLD: f64 = 0.2;
/// Contribution per custom or enhancement factor unit
const EXTRA_FACTOR_WEIGHT: f64 = 0.05;
/// Cap on the custom and enhancement contributions (each)
const EXTRA_FACTOR_CAP: f64 = 0.15;
/// Cap on a single threshold-violation penalty
const VIOLATION_PENALTY_CAP: f64 = 0.1;
const MAX_RECOMMENDATIONS: usize = 3;
/// Similarity assumed when the feature map has none (neutral multiplier)
const NEUTRAL_SIMILARITY: f64 = 0.5;

/// Strength of the evidence behind a detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceQuality {
    Weak,
    Standard,
    Strong,
}

impl EvidenceQuality {
    /// Grade a detection by its margin over the threshold and its examples
    ///
    /// Strong: margin ≥ 0.2 with at least two examples.
    /// Weak: margin < 0.05 or no examples at all.
    pub fn assess(margin: f64, example_count: usize) -> Self {
        if margin < 0.05 || example_count == 0 {
            EvidenceQuality::Weak
        } else if margin >= 0.2 && example_count >= 2 {
            EvidenceQuality::Strong
        } else {
            EvidenceQuality::Standard
        }
    }

    pub fn adjustment(&self) -> f64 {
        match self {
            EvidenceQuality::Weak => -0.1,
            EvidenceQuality::Standard => 0.0,
            EvidenceQuality::Strong => 0.1,
        }
    }
}

/// Confidence bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl ConfidenceLevel {
    pub fn from_score(score: f64) -> Self {
        if score < 0.25 {
            ConfidenceLevel::VeryLow
        } else if score < 0.45 {
            ConfidenceLevel::Low
        } else if score < 0.6 {
            ConfidenceLevel::Moderate
        } else if score < 0.8 {
            ConfidenceLevel::High
        } else {
            ConfidenceLevel::VeryHigh
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::VeryLow => "very_low",
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::Moderate => "moderate",
            ConfidenceLevel::High => "high",
            ConfidenceLevel::VeryHigh => "very_high",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a confidence was forced to zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    SemanticVeto,
    BelowMinimum,
}

/// One factor's share of the final confidence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorContribution {
    pub name: String,
    pub value: f64,
    pub weight: f64,
    pub contribution: f64,
}

/// Full breakdown of one strategy's confidence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceExplanation {
    pub strategy_code: String,
    pub final_confidence: f64,
    pub confidence_level: ConfidenceLevel,
    /// Clamped score before veto and minimum-confidence rejection
    pub score_before_rejection: f64,
    pub base_confidence: f64,
    pub feature_bonus: f64,
    pub semantic_multiplier: f64,
    pub quality_adjustment: f64,
    pub custom_contribution: f64,
    pub enhancement_contribution: f64,
    /// Contributions ranked by absolute size
    pub factors: Vec<FactorContribution>,
    pub recommendations: Vec<String>,
    pub evidence_quality: EvidenceQuality,
    pub profile_available: bool,
    pub rejection: Option<RejectionReason>,
    pub note: Option<String>,
}

impl ConfidenceExplanation {
    fn no_profile(code: &str, evidence_quality: EvidenceQuality) -> Self {
        Self {
            strategy_code: code.to_string(),
            final_confidence: 0.0,
            confidence_level: ConfidenceLevel::VeryLow,
            score_before_rejection: 0.0,
            base_confidence: 0.0,
            feature_bonus: 0.0,
            semantic_multiplier: 1.0,
            quality_adjustment: 0.0,
            custom_contribution: 0.0,
            enhancement_contribution: 0.0,
            factors: Vec::new(),
            recommendations: Vec::new(),
            evidence_quality,
            profile_available: false,
            rejection: None,
            note: Some("no profile available".to_string()),
        }
    }
}

/// Confidence engine over the static strategy profiles
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceEngine;

impl ConfidenceEngine {
    pub fn new() -> Self {
        Self
    }

    /// Compute the unified confidence of one strategy
    ///
    /// # Arguments
    /// * `strategy_code` - Taxonomy code
    /// * `features` - Feature map (see `StrategyFeatures::to_map`)
    /// * `evidence_quality` - Detector evidence strength
    /// * `custom_factors` - Extra detector-specific signals in [0, 1]
    /// * `enhancement_features` - Extra model-derived signals in [0, 1]
    pub fn calculate_confidence(
        &self,
        strategy_code: &str,
        features: &BTreeMap<String, f64>,
        evidence_quality: EvidenceQuality,
        custom_factors: Option<&BTreeMap<String, f64>>,
        enhancement_features: Option<&BTreeMap<String, f64>>,
    ) -> ConfidenceExplanation {
        let Some(profile) = profile(strategy_code) else {
            debug!(code = strategy_code, "No confidence profile");
            return ConfidenceExplanation::no_profile(strategy_code, evidence_quality);
        };

        let mut factors = Vec::new();

        // Feature bonus
        let mut feature_bonus = 0.0;
        for (name, weight) in profile.feature_weights {
            let value = unit(features.get(*name).copied().unwrap_or(0.0));
            let adjusted = if *weight < 0.0 { 1.0 - value } else { value };
            let contribution = weight.abs() * adjusted;
            feature_bonus += contribution;
            factors.push(FactorContribution {
                name: name.to_string(),
                value,
                weight: *weight,
                contribution,
            });
        }

        let (custom_contribution, custom) = extra_contribution("custom", custom_factors);
        let (enhancement_contribution, enhancement) =
            extra_contribution("enhancement", enhancement_features);
        factors.extend(custom);
        factors.extend(enhancement);

        // Semantic multiplier
        let similarity = features
            .get("semantic_similarity")
            .copied()
            .unwrap_or(NEUTRAL_SIMILARITY);
        let semantic_multiplier =
            (1.0 + (similarity - 0.5) * profile.semantic_multiplier_weight).clamp(0.5, 1.5);

        // Quality adjustment
        let violations = threshold_violations(profile, features);
        let penalty: f64 = violations.iter().map(|v| v.penalty).sum();
        let quality_adjustment = evidence_quality.adjustment() - penalty;

        let score = ((profile.base_confidence
            + feature_bonus
            + custom_contribution
            + enhancement_contribution)
            * semantic_multiplier
            + quality_adjustment)
            .clamp(0.0, 1.0);

        let rejection = if similarity < SEMANTIC_VETO_THRESHOLD {
            Some(RejectionReason::SemanticVeto)
        } else if score < profile.min_confidence {
            Some(RejectionReason::BelowMinimum)
        } else {
            None
        };
        let final_confidence = if rejection.is_some() { 0.0 } else { score };

        factors.sort_by(|a, b| {
            b.contribution
                .abs()
                .partial_cmp(&a.contribution.abs())
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });

        let recommendations =
            recommendations(similarity, &violations, evidence_quality, rejection);

        debug!(
            code = strategy_code,
            score,
            final_confidence,
            rejected = rejection.is_some(),
            "Confidence calculated"
        );

        ConfidenceExplanation {
            strategy_code: strategy_code.to_string(),
            final_confidence,
            confidence_level: ConfidenceLevel::from_score(final_confidence),
            score_before_rejection: score,
            base_confidence: profile.base_confidence,
            feature_bonus,
            semantic_multiplier,
            quality_adjustment,
            custom_contribution,
            enhancement_contribution,
            factors,
            recommendations,
            evidence_quality,
            profile_available: true,
            rejection,
            note: None,
        }
    }
}

fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Capped contribution of an optional factor map, plus its factor entries
fn extra_contribution(
    prefix: &str,
    extra: Option<&BTreeMap<String, f64>>,
) -> (f64, Vec<FactorContribution>) {
    let Some(extra) = extra else {
        return (0.0, Vec::new());
    };
    let factors: Vec<FactorContribution> = extra
        .iter()
        .map(|(name, value)| {
            let value = unit(*value);
            FactorContribution {
                name: format!("{}:{}", prefix, name),
                value,
                weight: EXTRA_FACTOR_WEIGHT,
                contribution: EXTRA_FACTOR_WEIGHT * value,
            }
        })
        .collect();
    let total = factors
        .iter()
        .map(|f| f.contribution)
        .sum::<f64>()
        .min(EXTRA_FACTOR_CAP);
    (total, factors)
}

#[derive(Debug, Clone, Copy)]
struct Violation {
    threshold: QualityThreshold,
    value: f64,
    penalty: f64,
}

fn threshold_violations(
    profile: &StrategyProfile,
    features: &BTreeMap<String, f64>,
) -> Vec<Violation> {
    profile
        .quality_thresholds
        .iter()
        .filter_map(|threshold| {
            let value = *features.get(threshold.feature)?;
            let below = threshold.min.map(|min| (min - value).max(0.0)).unwrap_or(0.0);
            let above = threshold.max.map(|max| (value - max).max(0.0)).unwrap_or(0.0);
            let violation = below + above;
            if violation <= 0.0 {
                return None;
            }
            Some(Violation {
                threshold: *threshold,
                value,
                penalty: (violation * threshold.penalty).min(VIOLATION_PENALTY_CAP),
            })
        })
        .collect()
}

fn recommendations(
    similarity: f64,
    violations: &[Violation],
    evidence_quality: EvidenceQuality,
    rejection: Option<RejectionReason>,
) -> Vec<String> {
    let mut out = Vec::new();

    if rejection == Some(RejectionReason::SemanticVeto) {
        out.push(format!(
            "Source and target are nearly unrelated (semantic similarity {:.2}); check that the texts are aligned",
            similarity
        ));
    }

    for violation in violations {
        let t = &violation.threshold;
        let message = match (t.min, t.max) {
            (Some(min), _) if violation.value < min => format!(
                "{} = {:.2} is below the expected minimum {:.2}",
                t.feature, violation.value, min
            ),
            (_, Some(max)) => format!(
                "{} = {:.2} is above the expected maximum {:.2}",
                t.feature, violation.value, max
            ),
            _ => continue,
        };
        out.push(message);
    }

    if evidence_quality == EvidenceQuality::Weak {
        out.push("Evidence is weak; review the examples before relying on this strategy".into());
    }

    if rejection != Some(RejectionReason::SemanticVeto) && similarity < 0.5 {
        out.push(format!(
            "Low semantic similarity ({:.2}); verify that the meaning was preserved",
            similarity
        ));
    }

    out.truncate(MAX_RECOMMENDATIONS);
    out
}
