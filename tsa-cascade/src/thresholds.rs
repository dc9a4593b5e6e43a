//! Adaptive Threshold Calculator
//!
//! Derives per-strategy detection thresholds from how complex the source text
//! is. Harder sources make simplification both more likely and more
//! necessary, so their thresholds are lower.
//!
//! # Complexity score
//! Weighted sum in [0, 1]:
//! - Average sentence length (tokens / 40, capped): 0.30
//! - Lexical diversity (unique / total tokens): 0.30
//! - Technical-term density (×10, capped): 0.25
//! - Structural-connective density (×5, capped): 0.15
//!
//! # Tier adjustment
//! Starting from each strategy's base threshold:
//! - macro: `base − complexity·0.15 + compression_ratio·0.1`, in [0.30, 0.90]
//! - meso: `base − complexity·0.20 − max(0, sentence_ratio − 1)·0.1`, in [0.25, 0.85]
//! - micro: `base − complexity·0.25 − max(0, 1 − word_length_ratio)·0.15`, in [0.20, 0.80]
//!
//! Manual-only strategies get no threshold.

use crate::features::{ratio, TextProfile};
use crate::language::lexicon::{count_markers, SUBORDINATION_MARKERS, TECHNICAL_TERMS};
use crate::language::LanguageModels;
use crate::types::AdaptiveThresholds;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;
use tsa_common::taxonomy::{self, Tier};

/// Sentence length (tokens) treated as maximally complex
const MAX_SENTENCE_LENGTH: f64 = 40.0;
const TECHNICAL_DENSITY_SCALE: f64 = 10.0;
const CONNECTIVE_DENSITY_SCALE: f64 = 5.0;

const WEIGHT_SENTENCE_LENGTH: f64 = 0.30;
const WEIGHT_LEXICAL_DIVERSITY: f64 = 0.30;
const WEIGHT_TECHNICAL_DENSITY: f64 = 0.25;
const WEIGHT_CONNECTIVE_DENSITY: f64 = 0.15;

/// Base (unadjusted) threshold per strategy
const BASE_THRESHOLDS: &[(&str, f64)] = &[
    ("RF+", 0.60),
    ("RD+", 0.60),
    ("MT+", 0.55),
    ("AS+", 0.65),
    ("RP+", 0.55),
    ("MV+", 0.55),
    ("DL+", 0.55),
    ("MOD+", 0.60),
    ("EXP+", 0.55),
    ("IN+", 0.50),
    ("SL+", 0.50),
    ("TA+", 0.50),
];

/// Fallback threshold for codes without an adaptive entry
pub fn default_threshold(tier: Tier) -> f64 {
    match tier {
        Tier::Macro => 0.60,
        Tier::Meso => 0.55,
        Tier::Micro => 0.50,
    }
}

/// Source-text complexity signals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ComplexityProfile {
    /// Normalized average sentence length in [0, 1]
    pub sentence_length: f64,
    /// Unique / total tokens in [0, 1]
    pub lexical_diversity: f64,
    /// Normalized technical-term density in [0, 1]
    pub technical_density: f64,
    /// Normalized structural-connective density in [0, 1]
    pub connective_density: f64,
    /// Weighted complexity score in [0, 1]
    pub score: f64,
}

/// Target/source size ratios
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextRatios {
    pub length_ratio: f64,
    /// `1 − length_ratio` (negative when the target grew)
    pub compression_ratio: f64,
    pub sentence_ratio: f64,
    pub word_length_ratio: f64,
}

impl Default for TextRatios {
    fn default() -> Self {
        Self {
            length_ratio: 1.0,
            compression_ratio: 0.0,
            sentence_ratio: 1.0,
            word_length_ratio: 1.0,
        }
    }
}

/// Complete threshold computation, for inspection
#[derive(Debug, Clone, Serialize)]
pub struct ThresholdAnalysis {
    pub complexity: ComplexityProfile,
    pub ratios: TextRatios,
    pub thresholds: AdaptiveThresholds,
}

/// Adaptive threshold calculator
#[derive(Debug, Clone)]
pub struct AdaptiveThresholdCalculator {
    models: Arc<LanguageModels>,
}

impl AdaptiveThresholdCalculator {
    pub fn new(models: Arc<LanguageModels>) -> Self {
        Self { models }
    }

    /// Per-strategy thresholds for a (source, target) pair
    pub fn calculate(&self, source: &str, target: &str) -> AdaptiveThresholds {
        self.analyze(source, target).thresholds
    }

    /// Thresholds plus the complexity profile and ratios behind them
    pub fn analyze(&self, source: &str, target: &str) -> ThresholdAnalysis {
        let src = TextProfile::build(&self.models, source);
        let tgt = TextProfile::build(&self.models, target);

        let complexity = Self::complexity_profile(&src);
        let length_ratio = ratio(tgt.char_count as f64, src.char_count as f64);
        let ratios = TextRatios {
            length_ratio,
            compression_ratio: 1.0 - length_ratio,
            sentence_ratio: ratio(tgt.sentence_count() as f64, src.sentence_count() as f64),
            word_length_ratio: ratio(tgt.avg_word_length, src.avg_word_length),
        };
        let thresholds = Self::thresholds_for(&complexity, &ratios);

        debug!(
            complexity = complexity.score,
            compression = ratios.compression_ratio,
            sentence_ratio = ratios.sentence_ratio,
            "Adaptive thresholds computed"
        );

        ThresholdAnalysis {
            complexity,
            ratios,
            thresholds,
        }
    }

    /// Complexity signals of a source text
    pub fn complexity_profile(src: &TextProfile) -> ComplexityProfile {
        let total = src.token_count();
        if total == 0 {
            return ComplexityProfile::default();
        }

        let sentence_length = (src.avg_sentence_length() / MAX_SENTENCE_LENGTH).min(1.0);
        let unique: HashSet<&str> = src.tokens.iter().map(String::as_str).collect();
        let lexical_diversity = unique.len() as f64 / total as f64;
        let technical = src
            .tokens
            .iter()
            .filter(|t| TECHNICAL_TERMS.contains(t.as_str()))
            .count();
        let technical_density =
            (technical as f64 / total as f64 * TECHNICAL_DENSITY_SCALE).min(1.0);
        let connectives = count_markers(&src.tokens, SUBORDINATION_MARKERS);
        let connective_density =
            (connectives as f64 / total as f64 * CONNECTIVE_DENSITY_SCALE).min(1.0);

        let score = (WEIGHT_SENTENCE_LENGTH * sentence_length
            + WEIGHT_LEXICAL_DIVERSITY * lexical_diversity
            + WEIGHT_TECHNICAL_DENSITY * technical_density
            + WEIGHT_CONNECTIVE_DENSITY * connective_density)
            .clamp(0.0, 1.0);

        ComplexityProfile {
            sentence_length,
            lexical_diversity,
            technical_density,
            connective_density,
            score,
        }
    }

    /// Apply tier adjustments to every automatic strategy's base threshold
    pub fn thresholds_for(complexity: &ComplexityProfile, ratios: &TextRatios) -> AdaptiveThresholds {
        let mut thresholds = AdaptiveThresholds::default();
        for descriptor in taxonomy::automatic() {
            let base = base_threshold(descriptor.code);
            let adjusted = adjust_for_tier(descriptor.tier, base, complexity.score, ratios);
            thresholds.insert(descriptor.code, adjusted);
        }
        thresholds
    }
}

/// Base threshold of a strategy (tier default when not listed)
pub fn base_threshold(code: &str) -> f64 {
    BASE_THRESHOLDS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, t)| *t)
        .or_else(|| taxonomy::lookup(code).map(|d| default_threshold(d.tier)))
        .unwrap_or_else(|| default_threshold(Tier::Meso))
}

fn adjust_for_tier(tier: Tier, base: f64, complexity: f64, ratios: &TextRatios) -> f64 {
    match tier {
        Tier::Macro => {
            (base - complexity * 0.15 + ratios.compression_ratio * 0.1).clamp(0.30, 0.90)
        }
        Tier::Meso => (base
            - complexity * 0.20
            - (ratios.sentence_ratio - 1.0).max(0.0) * 0.1)
            .clamp(0.25, 0.85),
        Tier::Micro => (base
            - complexity * 0.25
            - (1.0 - ratios.word_length_ratio).max(0.0) * 0.15)
            .clamp(0.20, 0.80),
    }
}
