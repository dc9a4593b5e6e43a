//! Per-strategy confidence profiles
//!
//! One profile per automatically detected strategy. Feature weights are
//! signed: a negative weight means a LOW feature value is evidence for the
//! strategy, and the feature contributes `|w| · (1 − value)`.

/// Bound on a feature value; violations reduce confidence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityThreshold {
    pub feature: &'static str,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Penalty per unit of violation (each violation capped at 0.1)
    pub penalty: f64,
}

/// Confidence profile of one strategy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyProfile {
    pub code: &'static str,
    pub base_confidence: f64,
    pub semantic_multiplier_weight: f64,
    pub feature_weights: &'static [(&'static str, f64)],
    pub quality_thresholds: &'static [QualityThreshold],
    /// Final confidence below this is rejected to 0
    pub min_confidence: f64,
}

const fn at_least(feature: &'static str, min: f64) -> QualityThreshold {
    QualityThreshold {
        feature,
        min: Some(min),
        max: None,
        penalty: 0.5,
    }
}

const fn at_most(feature: &'static str, max: f64) -> QualityThreshold {
    QualityThreshold {
        feature,
        min: None,
        max: Some(max),
        penalty: 0.5,
    }
}

static PROFILES: [StrategyProfile; 12] = [
    StrategyProfile {
        code: "RF+",
        base_confidence: 0.45,
        semantic_multiplier_weight: 0.6,
        feature_weights: &[
            ("lexical_overlap", -0.2),
            ("structure_change_score", 0.15),
            ("semantic_similarity", 0.1),
        ],
        quality_thresholds: &[
            at_least("semantic_similarity", 0.6),
            at_most("lexical_overlap", 0.35),
        ],
        min_confidence: 0.3,
    },
    StrategyProfile {
        code: "RD+",
        base_confidence: 0.45,
        semantic_multiplier_weight: 0.5,
        feature_weights: &[("structure_change_score", 0.25), ("semantic_similarity", 0.1)],
        quality_thresholds: &[at_least("structure_change_score", 0.3)],
        min_confidence: 0.3,
    },
    StrategyProfile {
        code: "MT+",
        base_confidence: 0.5,
        semantic_multiplier_weight: 0.3,
        feature_weights: &[("length_ratio", -0.1), ("semantic_similarity", 0.1)],
        quality_thresholds: &[],
        min_confidence: 0.3,
    },
    StrategyProfile {
        code: "AS+",
        base_confidence: 0.45,
        semantic_multiplier_weight: -0.4,
        feature_weights: &[("semantic_similarity", -0.2), ("lexical_overlap", -0.1)],
        quality_thresholds: &[at_most("semantic_similarity", 0.55)],
        min_confidence: 0.35,
    },
    StrategyProfile {
        code: "RP+",
        base_confidence: 0.5,
        semantic_multiplier_weight: 0.4,
        feature_weights: &[("complexity_reduction", 0.2), ("semantic_similarity", 0.1)],
        quality_thresholds: &[at_least("sentence_count_ratio", 1.1)],
        min_confidence: 0.3,
    },
    StrategyProfile {
        code: "MV+",
        base_confidence: 0.5,
        semantic_multiplier_weight: 0.4,
        feature_weights: &[("voice_change_score", 0.3), ("semantic_similarity", 0.1)],
        quality_thresholds: &[at_least("voice_change_score", 0.03)],
        min_confidence: 0.3,
    },
    StrategyProfile {
        code: "DL+",
        base_confidence: 0.5,
        semantic_multiplier_weight: 0.5,
        feature_weights: &[("semantic_similarity", 0.15), ("lexical_overlap", 0.1)],
        quality_thresholds: &[at_least("semantic_similarity", 0.7)],
        min_confidence: 0.3,
    },
    StrategyProfile {
        code: "MOD+",
        base_confidence: 0.45,
        semantic_multiplier_weight: 0.6,
        feature_weights: &[("semantic_similarity", 0.15), ("lexical_overlap", -0.15)],
        quality_thresholds: &[
            at_least("semantic_similarity", 0.7),
            at_most("lexical_overlap", 0.4),
        ],
        min_confidence: 0.35,
    },
    StrategyProfile {
        code: "EXP+",
        base_confidence: 0.45,
        semantic_multiplier_weight: 0.4,
        feature_weights: &[("explicitness_score", 0.25), ("semantic_similarity", 0.05)],
        quality_thresholds: &[at_least("explicitness_score", 0.3)],
        min_confidence: 0.3,
    },
    StrategyProfile {
        code: "IN+",
        base_confidence: 0.5,
        semantic_multiplier_weight: 0.4,
        feature_weights: &[("semantic_similarity", 0.1), ("complexity_reduction", 0.1)],
        quality_thresholds: &[],
        min_confidence: 0.3,
    },
    StrategyProfile {
        code: "SL+",
        base_confidence: 0.5,
        semantic_multiplier_weight: 0.5,
        feature_weights: &[("avg_word_length_ratio", -0.2), ("semantic_similarity", 0.1)],
        quality_thresholds: &[at_most("avg_word_length_ratio", 0.95)],
        min_confidence: 0.3,
    },
    StrategyProfile {
        code: "TA+",
        base_confidence: 0.5,
        semantic_multiplier_weight: 0.4,
        feature_weights: &[("pronoun_reduction_score", 0.25), ("semantic_similarity", 0.05)],
        quality_thresholds: &[at_least("pronoun_reduction_score", 0.2)],
        min_confidence: 0.3,
    },
];

/// Profile for a strategy code
pub fn profile(code: &str) -> Option<&'static StrategyProfile> {
    PROFILES.iter().find(|p| p.code == code)
}

/// All profiles
pub fn profiles() -> &'static [StrategyProfile] {
    &PROFILES
}
