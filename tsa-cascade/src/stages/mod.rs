//! Tier stage evaluators
//!
//! Each stage owns a fixed table of detectors. A detector is a plain function
//! of the shared per-run [`DetectorContext`] and its own adaptive threshold,
//! returning `Ok(Some(evidence))` only when its raw confidence meets the
//! threshold. Detector errors are logged and skipped; the stage still returns
//! whatever the other detectors found.
//!
//! # Early exit
//! In complete-analysis mode every stage signals continue. Otherwise macro
//! and meso stop the cascade once they accumulate enough evidence above the
//! early-exit confidence. Micro is terminal and never signals continue.

pub mod macro_stage;
pub mod meso;
pub mod micro;
pub mod positions;

pub use macro_stage::MacroStage;
pub use meso::MesoStage;
pub use micro::MicroStage;
pub use positions::{sentence_index_at, SentenceOffsetIndex};

use crate::features::TextProfile;
use crate::language::lexicon::is_content_word;
use crate::language::LanguageModels;
use crate::thresholds::default_threshold;
use crate::types::{
    AdaptiveThresholds, CharSpan, EvidenceExample, ImpactLevel, StageContext, StageError,
    StageOutcome, StrategyEvidence, StrategyFeatures,
};
use std::collections::HashSet;
use tracing::{debug, warn};
use tsa_common::config::CascadeSettings;
use tsa_common::taxonomy::Tier;

/// Per-stage execution settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageSettings {
    /// Raw confidence above which evidence counts toward early exit
    pub early_exit_confidence: f64,
    /// High-confidence evidence count that stops the cascade (legacy mode)
    pub early_exit_count: usize,
    /// Maximum examples attached to one evidence
    pub max_examples: usize,
}

impl StageSettings {
    pub fn for_tier(settings: &CascadeSettings, tier: Tier) -> Self {
        let early_exit_count = match tier {
            Tier::Macro => settings.macro_early_exit_count,
            Tier::Meso => settings.meso_early_exit_count,
            Tier::Micro => 0,
        };
        Self {
            early_exit_confidence: settings.early_exit_confidence,
            early_exit_count,
            max_examples: settings.max_examples,
        }
    }
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            early_exit_confidence: 0.95,
            early_exit_count: 3,
            max_examples: 3,
        }
    }
}

/// Threshold for a code, falling back to the tier default
pub fn threshold_for(thresholds: &AdaptiveThresholds, code: &str, tier: Tier) -> f64 {
    thresholds.get(code).unwrap_or_else(|| default_threshold(tier))
}

pub(crate) type DetectFn =
    fn(&mut DetectorContext<'_>, f64) -> Result<Option<StrategyEvidence>, StageError>;

/// Detector table entry
pub(crate) struct Detector {
    pub code: &'static str,
    pub detect: DetectFn,
}

/// Per-run state shared by the detectors of one stage
pub(crate) struct DetectorContext<'a> {
    pub models: &'a LanguageModels,
    pub features: &'a StrategyFeatures,
    pub source: &'a str,
    pub target: &'a str,
    pub src: TextProfile,
    pub tgt: TextProfile,
    pub offsets: SentenceOffsetIndex,
    pub tier: Tier,
    pub max_examples: usize,
}

impl<'a> DetectorContext<'a> {
    fn new(
        models: &'a LanguageModels,
        ctx: &StageContext<'a>,
        tier: Tier,
        max_examples: usize,
    ) -> Result<Self, StageError> {
        let src = TextProfile::build(models, ctx.source);
        let tgt = TextProfile::build(models, ctx.target);
        if src.sentences.is_empty() && !ctx.source.trim().is_empty() {
            return Err(StageError::Segmentation("source produced no sentences".into()));
        }
        if tgt.sentences.is_empty() && !ctx.target.trim().is_empty() {
            return Err(StageError::Segmentation("target produced no sentences".into()));
        }
        let offsets = SentenceOffsetIndex::build(&tgt.sentences);
        Ok(Self {
            models,
            features: ctx.features,
            source: ctx.source,
            target: ctx.target,
            src,
            tgt,
            offsets,
            tier,
            max_examples,
        })
    }

    /// Build evidence when `raw` meets `threshold`
    pub fn accept(
        &self,
        code: &str,
        raw: f64,
        threshold: f64,
        impact: ImpactLevel,
        examples: Vec<EvidenceExample>,
        positions: Vec<CharSpan>,
    ) -> Option<StrategyEvidence> {
        let raw = raw.clamp(0.0, 1.0);
        if raw < threshold {
            debug!(code, raw, threshold, "Below adaptive threshold");
            return None;
        }
        let mut examples = examples;
        examples.truncate(self.max_examples);
        Some(StrategyEvidence {
            strategy_code: code.to_string(),
            tier: self.tier,
            raw_confidence: raw,
            threshold,
            impact,
            features: self.features.clone(),
            examples,
            positions,
        })
    }

    /// Most similar target sentence for a text
    pub fn best_target(&self, text: &str) -> Option<(usize, f64)> {
        self.models.best_match(text, &self.tgt.sentences)
    }

    /// Pair a source sentence with its best target sentence and claim it
    ///
    /// Returns `None` when no target sentence reaches `min_similarity`.
    pub fn pair_source_sentence(
        &mut self,
        source_index: usize,
        min_similarity: f64,
    ) -> Option<(EvidenceExample, Option<CharSpan>)> {
        let original = self.src.sentences.get(source_index)?.text.clone();
        let (target_index, similarity) = self.best_target(&original)?;
        if similarity < min_similarity {
            return None;
        }
        let simplified = self.tgt.sentences[target_index].text.clone();
        let span = self.offsets.claim(&simplified);
        Some((EvidenceExample::new(original, simplified), span))
    }

    /// Pair each selected source sentence (up to `max_examples`)
    pub fn pair_source_sentences(
        &mut self,
        indices: impl IntoIterator<Item = usize>,
        min_similarity: f64,
    ) -> (Vec<EvidenceExample>, Vec<CharSpan>) {
        let mut examples = Vec::new();
        let mut positions = Vec::new();
        for index in indices {
            if examples.len() >= self.max_examples {
                break;
            }
            if let Some((example, span)) = self.pair_source_sentence(index, min_similarity) {
                examples.push(example);
                positions.extend(span);
            }
        }
        (examples, positions)
    }
}

/// Content-word set of a token list
pub(crate) fn content_set(tokens: &[String]) -> HashSet<&str> {
    tokens
        .iter()
        .map(String::as_str)
        .filter(|t| is_content_word(t))
        .collect()
}

/// Run a detector table and compute the continue signal
pub(crate) fn run_detectors(
    stage: &'static str,
    tier: Tier,
    detectors: &[Detector],
    models: &LanguageModels,
    ctx: &StageContext<'_>,
    settings: &StageSettings,
) -> Result<StageOutcome, StageError> {
    let mut dctx = DetectorContext::new(models, ctx, tier, settings.max_examples)?;
    let mut evidence = Vec::new();

    for detector in detectors {
        let threshold = threshold_for(ctx.thresholds, detector.code, tier);
        match (detector.detect)(&mut dctx, threshold) {
            Ok(Some(found)) => {
                debug!(
                    stage,
                    code = detector.code,
                    raw = found.raw_confidence,
                    threshold,
                    "Strategy detected"
                );
                evidence.push(found);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(stage, code = detector.code, error = %e, "Detector failed, skipping");
            }
        }
    }

    let high_confidence = evidence
        .iter()
        .filter(|e| e.raw_confidence > settings.early_exit_confidence)
        .count();
    let should_continue = match tier {
        Tier::Micro => false,
        _ => ctx.complete_analysis_mode || high_confidence < settings.early_exit_count,
    };

    Ok(StageOutcome {
        evidence,
        should_continue,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn context<'a>(
        features: &'a StrategyFeatures,
        source: &'a str,
        target: &'a str,
        thresholds: &'a AdaptiveThresholds,
    ) -> StageContext<'a> {
        StageContext {
            features,
            source,
            target,
            thresholds,
            complete_analysis_mode: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureExtractor;
    use std::sync::Arc;

    #[test]
    fn test_threshold_falls_back_to_tier_default() {
        let thresholds = AdaptiveThresholds::default();
        assert_eq!(
            threshold_for(&thresholds, "OM+", Tier::Macro),
            default_threshold(Tier::Macro)
        );
    }

    #[test]
    fn test_settings_per_tier() {
        let cascade = CascadeSettings::default();
        assert_eq!(StageSettings::for_tier(&cascade, Tier::Macro).early_exit_count, 3);
        assert_eq!(StageSettings::for_tier(&cascade, Tier::Meso).early_exit_count, 5);
    }

    fn detect_always(
        ctx: &mut DetectorContext<'_>,
        threshold: f64,
    ) -> Result<Option<StrategyEvidence>, StageError> {
        Ok(ctx.accept("MV+", 0.9, threshold, ImpactLevel::Medium, Vec::new(), Vec::new()))
    }

    fn detect_broken(
        _ctx: &mut DetectorContext<'_>,
        _threshold: f64,
    ) -> Result<Option<StrategyEvidence>, StageError> {
        Err(StageError::Detector {
            code: "DL+".to_string(),
            reason: "sentence alignment failed".to_string(),
        })
    }

    fn detect_inserted(
        ctx: &mut DetectorContext<'_>,
        threshold: f64,
    ) -> Result<Option<StrategyEvidence>, StageError> {
        Ok(ctx.accept("IN+", 0.8, threshold, ImpactLevel::Low, Vec::new(), Vec::new()))
    }

    #[test]
    fn test_failing_detector_is_skipped() {
        let models = LanguageModels::standard();
        let features = StrategyFeatures::default();
        let thresholds = AdaptiveThresholds::default();
        let ctx = test_support::context(&features, "Uma frase.", "Outra frase.", &thresholds);
        let detectors = [
            Detector { code: "MV+", detect: detect_always },
            Detector { code: "DL+", detect: detect_broken },
            Detector { code: "IN+", detect: detect_inserted },
        ];

        let outcome = run_detectors(
            "meso",
            Tier::Meso,
            &detectors,
            &models,
            &ctx,
            &StageSettings::default(),
        )
        .unwrap();

        let codes: Vec<&str> = outcome.evidence.iter().map(|e| e.strategy_code.as_str()).collect();
        assert_eq!(codes, vec!["MV+", "IN+"]);
        assert!(outcome.should_continue);
    }

    #[test]
    fn test_pairing_claims_target_spans() {
        let models = LanguageModels::standard();
        let source = "O gato dorme no sofá. O carro está na garagem.";
        let target = "O carro fica na garagem. O gato dorme no sofá.";
        let features = FeatureExtractor::new(Arc::new(models.clone())).extract(source, target);
        let thresholds = AdaptiveThresholds::default();
        let ctx = test_support::context(&features, source, target, &thresholds);
        let mut dctx = DetectorContext::new(&models, &ctx, Tier::Meso, 3).unwrap();

        let (examples, positions) = dctx.pair_source_sentences(0..2, 0.3);
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].simplified, "O gato dorme no sofá.");
        assert_eq!(positions[0], (25, 46));
    }
}
