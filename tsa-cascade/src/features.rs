//! Feature Extractor
//!
//! Computes the fixed [`StrategyFeatures`] vector for a (source, target) pair.
//! Deterministic for fixed models; never fails. Segmentation and similarity
//! degrade to regex/Jaccard heuristics when models are absent (see
//! [`LanguageModels`]).
//!
//! # Features
//! - Ratios: length (chars), word count, sentence count, average word length
//! - `semantic_similarity`: full-text embedding cosine, Jaccard fallback
//! - `lexical_overlap`: Jaccard of token sets
//! - `complexity_reduction`: relative drop in subordination markers
//! - `voice_change_score`: passive-density difference
//! - `explicitness_score`: 0.5 · length increase + 0.5 · clarifying-marker increase
//! - `structure_change_score`: 0.5 · sequential-marker density change
//!   + 0.5 · paragraph-break density change
//! - `pronoun_reduction_score`: relative pronoun drop

use crate::language::lexicon::{
    count_markers, count_passive_constructions, EXPLICIT_MARKERS, PRONOUNS, SEQUENTIAL_MARKERS,
    SUBORDINATION_MARKERS,
};
use crate::language::{token_overlap, LanguageModels, SentenceSpan};
use crate::types::StrategyFeatures;
use std::sync::Arc;
use tracing::debug;

/// Explicit-marker increase that saturates the marker half of explicitness
const EXPLICIT_MARKER_SATURATION: f64 = 3.0;

/// Scale applied to sequential-marker density change (densities are small)
const SEQUENTIAL_DENSITY_SCALE: f64 = 10.0;

/// Per-text statistics shared by features, thresholds and detectors
#[derive(Debug, Clone, Default)]
pub struct TextProfile {
    pub char_count: usize,
    pub tokens: Vec<String>,
    pub sentences: Vec<SentenceSpan>,
    pub paragraph_count: usize,
    pub avg_word_length: f64,
    pub subordination_markers: usize,
    pub passive_constructions: usize,
    pub explicit_markers: usize,
    pub sequential_markers: usize,
    pub pronouns: usize,
}

impl TextProfile {
    pub fn build(models: &LanguageModels, text: &str) -> Self {
        let tokens = models.tokens(text);
        let sentences = models.sentences(text);
        let avg_word_length = if tokens.is_empty() {
            0.0
        } else {
            tokens.iter().map(|t| t.chars().count()).sum::<usize>() as f64 / tokens.len() as f64
        };

        Self {
            char_count: text.trim().chars().count(),
            paragraph_count: paragraphs(text).len(),
            avg_word_length,
            subordination_markers: count_markers(&tokens, SUBORDINATION_MARKERS),
            passive_constructions: count_passive_constructions(&tokens),
            explicit_markers: count_markers(&tokens, EXPLICIT_MARKERS),
            sequential_markers: count_markers(&tokens, SEQUENTIAL_MARKERS),
            pronouns: count_markers(&tokens, PRONOUNS),
            sentences,
            tokens,
        }
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }

    /// Average tokens per sentence
    pub fn avg_sentence_length(&self) -> f64 {
        ratio(self.token_count() as f64, self.sentence_count() as f64)
    }

    fn density(&self, count: usize) -> f64 {
        ratio(count as f64, self.token_count() as f64)
    }

    fn paragraph_break_density(&self) -> f64 {
        ratio(
            self.paragraph_count.saturating_sub(1) as f64,
            self.sentence_count() as f64,
        )
    }
}

/// Non-empty lines of a text (paragraph blocks)
pub fn paragraphs(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// `numerator / denominator`, 0.0 when the denominator is zero
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Feature extractor over injected language models
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    models: Arc<LanguageModels>,
}

impl FeatureExtractor {
    pub fn new(models: Arc<LanguageModels>) -> Self {
        Self { models }
    }

    /// Compute the feature vector for a (source, target) pair
    pub fn extract(&self, source: &str, target: &str) -> StrategyFeatures {
        let src = TextProfile::build(&self.models, source);
        let tgt = TextProfile::build(&self.models, target);
        let features = self.extract_from_profiles(source, target, &src, &tgt);

        debug!(
            length_ratio = features.length_ratio,
            semantic_similarity = features.semantic_similarity,
            lexical_overlap = features.lexical_overlap,
            structure_change = features.structure_change_score,
            "Features extracted"
        );
        features
    }

    /// Compute features from already-built profiles
    pub fn extract_from_profiles(
        &self,
        source: &str,
        target: &str,
        src: &TextProfile,
        tgt: &TextProfile,
    ) -> StrategyFeatures {
        let length_ratio = ratio(tgt.char_count as f64, src.char_count as f64);

        let complexity_reduction = if src.subordination_markers == 0 {
            0.0
        } else {
            clamp_unit(
                (src.subordination_markers as f64 - tgt.subordination_markers as f64)
                    / src.subordination_markers as f64,
            )
        };

        let voice_change_score = clamp_unit(
            (src.density(src.passive_constructions) - tgt.density(tgt.passive_constructions)).abs(),
        );

        let length_increase = clamp_unit(length_ratio - 1.0);
        let marker_increase = clamp_unit(
            (tgt.explicit_markers as f64 - src.explicit_markers as f64)
                / EXPLICIT_MARKER_SATURATION,
        );
        let explicitness_score = clamp_unit(0.5 * length_increase + 0.5 * marker_increase);

        let sequential_delta = clamp_unit(
            (tgt.density(tgt.sequential_markers) - src.density(src.sequential_markers)).abs()
                * SEQUENTIAL_DENSITY_SCALE,
        );
        let paragraph_delta =
            clamp_unit((tgt.paragraph_break_density() - src.paragraph_break_density()).abs());
        let structure_change_score = clamp_unit(0.5 * sequential_delta + 0.5 * paragraph_delta);

        let pronoun_reduction_score = if src.pronouns == 0 {
            0.0
        } else {
            clamp_unit((src.pronouns as f64 - tgt.pronouns as f64) / src.pronouns as f64)
        };

        StrategyFeatures {
            length_ratio,
            word_count_ratio: ratio(tgt.token_count() as f64, src.token_count() as f64),
            sentence_count_ratio: ratio(tgt.sentence_count() as f64, src.sentence_count() as f64),
            avg_word_length_ratio: ratio(tgt.avg_word_length, src.avg_word_length),
            semantic_similarity: clamp_unit(self.models.similarity(source, target)),
            lexical_overlap: token_overlap(&src.tokens, &tgt.tokens),
            complexity_reduction,
            voice_change_score,
            explicitness_score,
            structure_change_score,
            pronoun_reduction_score,
        }
    }
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
