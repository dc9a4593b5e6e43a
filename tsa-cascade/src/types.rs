//! Core Types and Trait Definitions for the classification cascade
//!
//! Defines the records that flow between the tiers:
//! - [`StrategyFeatures`]: pairwise feature vector, computed once per request
//! - [`AdaptiveThresholds`]: per-strategy gates, computed once per request
//! - [`StrategyEvidence`]: one detector's pre-confidence detection record
//! - [`Strategy`]: final output record with the unified confidence explanation
//!
//! and the [`StageEvaluator`] trait implemented by the macro, meso and micro
//! stages.

use crate::confidence::ConfidenceExplanation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tsa_common::taxonomy::{self, StrategyType, Tier};

// ============================================================================
// Features
// ============================================================================

/// Pairwise textual features of a (source, target) pair
///
/// Immutable once built; shared read-only by every stage of one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyFeatures {
    /// Target chars / source chars
    pub length_ratio: f64,
    /// Target tokens / source tokens
    pub word_count_ratio: f64,
    /// Target sentences / source sentences
    pub sentence_count_ratio: f64,
    /// Target average word length / source average word length
    pub avg_word_length_ratio: f64,
    /// Embedding cosine (or Jaccard fallback) in [0, 1]
    pub semantic_similarity: f64,
    /// Jaccard overlap of token sets in [0, 1]
    pub lexical_overlap: f64,
    /// Relative decrease of subordination markers in [0, 1]
    pub complexity_reduction: f64,
    /// Absolute passive-density difference in [0, 1]
    pub voice_change_score: f64,
    /// Length increase plus clarifying-marker increase in [0, 1]
    pub explicitness_score: f64,
    /// Sequential-marker and paragraph-break density change in [0, 1]
    pub structure_change_score: f64,
    /// Relative pronoun decrease in [0, 1]
    pub pronoun_reduction_score: f64,
}

impl StrategyFeatures {
    /// Feature names in a stable order
    pub const NAMES: [&'static str; 11] = [
        "length_ratio",
        "word_count_ratio",
        "sentence_count_ratio",
        "avg_word_length_ratio",
        "semantic_similarity",
        "lexical_overlap",
        "complexity_reduction",
        "voice_change_score",
        "explicitness_score",
        "structure_change_score",
        "pronoun_reduction_score",
    ];

    /// Feature map keyed by name (input format of the confidence engine)
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        let values = [
            self.length_ratio,
            self.word_count_ratio,
            self.sentence_count_ratio,
            self.avg_word_length_ratio,
            self.semantic_similarity,
            self.lexical_overlap,
            self.complexity_reduction,
            self.voice_change_score,
            self.explicitness_score,
            self.structure_change_score,
            self.pronoun_reduction_score,
        ];
        Self::NAMES
            .iter()
            .zip(values)
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }
}

// ============================================================================
// Thresholds
// ============================================================================

/// Per-strategy detection thresholds for one request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveThresholds {
    thresholds: BTreeMap<String, f64>,
}

impl AdaptiveThresholds {
    pub fn new(thresholds: BTreeMap<String, f64>) -> Self {
        Self { thresholds }
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        self.thresholds.get(code).copied()
    }

    pub fn insert(&mut self, code: impl Into<String>, threshold: f64) {
        self.thresholds.insert(code.into(), threshold);
    }

    pub fn contains(&self, code: &str) -> bool {
        self.thresholds.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.thresholds.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.thresholds
    }
}

// ============================================================================
// Evidence
// ============================================================================

/// Impact of an applied strategy on the text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ImpactLevel {
    #[serde(rename = "baixo")]
    Low,
    #[serde(rename = "medio")]
    Medium,
    #[serde(rename = "alto")]
    High,
}

impl ImpactLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImpactLevel::Low => "baixo",
            ImpactLevel::Medium => "medio",
            ImpactLevel::High => "alto",
        }
    }
}

impl fmt::Display for ImpactLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Original/simplified snippet pair supporting a detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceExample {
    pub original: String,
    pub simplified: String,
}

impl EvidenceExample {
    /// Maximum characters kept per snippet
    pub const MAX_SNIPPET_CHARS: usize = 240;

    /// Create example, truncating long snippets
    pub fn new(original: impl AsRef<str>, simplified: impl AsRef<str>) -> Self {
        Self {
            original: snippet(original.as_ref()),
            simplified: snippet(simplified.as_ref()),
        }
    }
}

fn snippet(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= EvidenceExample::MAX_SNIPPET_CHARS {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed
        .chars()
        .take(EvidenceExample::MAX_SNIPPET_CHARS)
        .collect();
    cut.push('…');
    cut
}

/// Character span (start inclusive, end exclusive) in the target text
pub type CharSpan = (usize, usize);

/// One detector's record for one strategy
///
/// Created by a single detector, never mutated afterwards. The raw
/// confidence only gates acceptance; the reported value comes from the
/// confidence engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyEvidence {
    pub strategy_code: String,
    pub tier: Tier,
    pub raw_confidence: f64,
    pub threshold: f64,
    pub impact: ImpactLevel,
    pub features: StrategyFeatures,
    pub examples: Vec<EvidenceExample>,
    pub positions: Vec<CharSpan>,
}

impl StrategyEvidence {
    /// Margin of the raw confidence over the gate that accepted it
    pub fn margin(&self) -> f64 {
        self.raw_confidence - self.threshold
    }
}

// ============================================================================
// Output
// ============================================================================

/// Sentence indices an evidence points to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentencePosition {
    pub source_sentence: Option<usize>,
    pub target_sentence: Option<usize>,
}

/// Final detected strategy
#[derive(Debug, Clone, Serialize)]
pub struct Strategy {
    pub code: String,
    pub name: String,
    pub description: String,
    pub strategy_type: StrategyType,
    pub tier: Tier,
    pub impact: ImpactLevel,
    pub confidence: f64,
    pub explanation: ConfidenceExplanation,
    pub examples: Vec<EvidenceExample>,
    pub target_spans: Vec<CharSpan>,
    pub position: Option<SentencePosition>,
}

impl Strategy {
    /// Assemble from evidence and its unified confidence explanation
    ///
    /// Returns `None` for codes missing from the taxonomy.
    pub fn from_evidence(
        evidence: StrategyEvidence,
        explanation: ConfidenceExplanation,
        position: Option<SentencePosition>,
    ) -> Option<Self> {
        let descriptor = taxonomy::lookup(&evidence.strategy_code)?;
        Some(Self {
            code: descriptor.code.to_string(),
            name: descriptor.name.to_string(),
            description: descriptor.description.to_string(),
            strategy_type: descriptor.strategy_type,
            tier: evidence.tier,
            impact: evidence.impact,
            confidence: explanation.final_confidence,
            explanation,
            examples: evidence.examples,
            target_spans: evidence.positions,
            position,
        })
    }
}

// ============================================================================
// Stage trait
// ============================================================================

/// Inputs shared by every stage of one request
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    pub features: &'a StrategyFeatures,
    pub source: &'a str,
    pub target: &'a str,
    pub thresholds: &'a AdaptiveThresholds,
    pub complete_analysis_mode: bool,
}

/// Stage output: accepted evidence plus the continue signal
#[derive(Debug, Clone, Default)]
pub struct StageOutcome {
    pub evidence: Vec<StrategyEvidence>,
    pub should_continue: bool,
}

/// Tier stage evaluator
///
/// Each stage owns a fixed detector set. A detector failure is isolated to
/// that detector; a stage failure is isolated to that stage by the caller.
pub trait StageEvaluator: Send + Sync {
    /// Stage name for provenance and logging
    fn name(&self) -> &'static str;

    /// Tier this stage evaluates
    fn tier(&self) -> Tier;

    /// Strategy codes owned by this stage's detectors
    fn strategy_codes(&self) -> Vec<&'static str>;

    /// Run all detectors against the request
    fn evaluate(&self, ctx: &StageContext<'_>) -> Result<StageOutcome, StageError>;
}

/// Stage or detector error
#[derive(Debug, Error)]
pub enum StageError {
    /// A single detector could not evaluate its signal
    #[error("Detector {code} failed: {reason}")]
    Detector { code: String, reason: String },

    /// Sentence segmentation produced unusable output
    #[error("Segmentation error: {0}")]
    Segmentation(String),

    /// Internal processing error
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_map_has_all_names() {
        let features = StrategyFeatures {
            semantic_similarity: 0.8,
            ..Default::default()
        };
        let map = features.to_map();
        assert_eq!(map.len(), 11);
        assert_eq!(map["semantic_similarity"], 0.8);
    }

    #[test]
    fn test_impact_serializes_in_portuguese() {
        assert_eq!(serde_json::to_string(&ImpactLevel::High).unwrap(), "\"alto\"");
        assert_eq!(ImpactLevel::Low.to_string(), "baixo");
    }

    #[test]
    fn test_example_truncates_long_snippets() {
        let long = "palavra ".repeat(100);
        let example = EvidenceExample::new(&long, "curto");
        assert_eq!(
            example.original.chars().count(),
            EvidenceExample::MAX_SNIPPET_CHARS + 1
        );
        assert_eq!(example.simplified, "curto");
    }

    #[test]
    fn test_thresholds_accessors() {
        let mut thresholds = AdaptiveThresholds::default();
        assert!(thresholds.is_empty());
        thresholds.insert("RP+", 0.5);
        assert_eq!(thresholds.get("RP+"), Some(0.5));
        assert!(thresholds.get("SL+").is_none());
        assert_eq!(thresholds.len(), 1);
    }
}
