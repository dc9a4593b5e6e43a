//! Micro Stage Evaluator
//!
//! Token and phrase level strategies:
//! - SL+ lexical simplification (shorter, more common vocabulary)
//! - TA+ referential clarity (pronouns replaced by explicit referents)
//!
//! Terminal stage: never signals continue.

use super::{content_set, run_detectors, Detector, DetectorContext, StageSettings};
use crate::language::lexicon::{count_markers, PRONOUNS};
use crate::language::LanguageModels;
use crate::types::{
    ImpactLevel, StageContext, StageError, StageEvaluator, StageOutcome, StrategyEvidence,
};
use std::collections::HashSet;
use std::sync::Arc;
use tsa_common::taxonomy::Tier;

/// Average-word-length ratio at or below which vocabulary counts as simplified
const MAX_WORD_LENGTH_RATIO: f64 = 0.95;
/// Minimum length of a removed word to count as a substituted "hard" word
const SUBSTITUTED_WORD_MIN_CHARS: usize = 7;
/// Minimum sentence similarity for substitution and pronoun alignment
const ALIGNMENT_MIN_SIMILARITY: f64 = 0.3;

const DETECTORS: &[Detector] = &[
    Detector {
        code: "SL+",
        detect: detect_lexical_simplification,
    },
    Detector {
        code: "TA+",
        detect: detect_referential_clarity,
    },
];

/// Micro tier stage
pub struct MicroStage {
    models: Arc<LanguageModels>,
    settings: StageSettings,
}

impl MicroStage {
    pub fn new(models: Arc<LanguageModels>, settings: StageSettings) -> Self {
        Self { models, settings }
    }
}

impl StageEvaluator for MicroStage {
    fn name(&self) -> &'static str {
        "micro"
    }

    fn tier(&self) -> Tier {
        Tier::Micro
    }

    fn strategy_codes(&self) -> Vec<&'static str> {
        DETECTORS.iter().map(|d| d.code).collect()
    }

    fn evaluate(&self, ctx: &StageContext<'_>) -> Result<StageOutcome, StageError> {
        run_detectors(
            self.name(),
            Tier::Micro,
            DETECTORS,
            &self.models,
            ctx,
            &self.settings,
        )
    }
}

/// Count of (long removed word, shorter added word) substitutions
pub(crate) fn substitution_count(source: &[String], target: &[String]) -> usize {
    let source_set: HashSet<&str> = source.iter().map(String::as_str).collect();
    let target_set: HashSet<&str> = target.iter().map(String::as_str).collect();

    let removed: Vec<usize> = content_set(source)
        .into_iter()
        .filter(|t| !target_set.contains(t))
        .map(|t| t.chars().count())
        .filter(|len| *len >= SUBSTITUTED_WORD_MIN_CHARS)
        .collect();
    let Some(longest_removed) = removed.iter().max().copied() else {
        return 0;
    };
    let added = content_set(target)
        .into_iter()
        .filter(|t| !source_set.contains(t) && t.chars().count() < longest_removed)
        .count();
    removed.len().min(added)
}

fn detect_lexical_simplification(
    ctx: &mut DetectorContext<'_>,
    threshold: f64,
) -> Result<Option<StrategyEvidence>, StageError> {
    let ratio = ctx.features.avg_word_length_ratio;
    if ratio <= 0.0 || ratio > MAX_WORD_LENGTH_RATIO {
        return Ok(None);
    }

    let mut substitutions = 0;
    let mut indices = Vec::new();
    for (i, sentence) in ctx.src.sentences.iter().enumerate() {
        let Some((j, similarity)) = ctx.best_target(&sentence.text) else {
            continue;
        };
        if similarity < ALIGNMENT_MIN_SIMILARITY {
            continue;
        }
        let count = substitution_count(
            &ctx.models.tokens(&sentence.text),
            &ctx.models.tokens(&ctx.tgt.sentences[j].text),
        );
        if count > 0 {
            substitutions += count;
            indices.push(i);
        }
    }

    let raw = 0.5 + ((1.0 - ratio) * 2.0).min(0.3) + (substitutions.min(5) as f64 / 5.0) * 0.15;
    let impact = if ratio < 0.85 {
        ImpactLevel::Medium
    } else {
        ImpactLevel::Low
    };
    let (examples, positions) = ctx.pair_source_sentences(indices, ALIGNMENT_MIN_SIMILARITY);
    Ok(ctx.accept("SL+", raw, threshold, impact, examples, positions))
}

fn detect_referential_clarity(
    ctx: &mut DetectorContext<'_>,
    threshold: f64,
) -> Result<Option<StrategyEvidence>, StageError> {
    let reduction = ctx.features.pronoun_reduction_score;
    if reduction <= 0.2 {
        return Ok(None);
    }

    let indices: Vec<usize> = ctx
        .src
        .sentences
        .iter()
        .enumerate()
        .filter(|(_, s)| {
            let pronouns = count_markers(&ctx.models.tokens(&s.text), PRONOUNS);
            pronouns > 0
                && ctx
                    .best_target(&s.text)
                    .map(|(j, _)| {
                        count_markers(&ctx.models.tokens(&ctx.tgt.sentences[j].text), PRONOUNS)
                            < pronouns
                    })
                    .unwrap_or(false)
        })
        .map(|(i, _)| i)
        .collect();

    let raw = 0.5 + reduction * 0.4;
    let impact = if reduction > 0.6 {
        ImpactLevel::Medium
    } else {
        ImpactLevel::Low
    };
    let (examples, positions) = ctx.pair_source_sentences(indices, 0.0);
    Ok(ctx.accept("TA+", raw, threshold, impact, examples, positions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureExtractor;
    use crate::stages::test_support::context;
    use crate::types::AdaptiveThresholds;

    fn toks(text: &str) -> Vec<String> {
        text.split_whitespace().map(|s| s.to_lowercase()).collect()
    }

    fn evaluate(source: &str, target: &str) -> StageOutcome {
        let models = Arc::new(LanguageModels::standard());
        let features = FeatureExtractor::new(models.clone()).extract(source, target);
        let thresholds = AdaptiveThresholds::default();
        let ctx = context(&features, source, target, &thresholds);
        MicroStage::new(models, StageSettings::default())
            .evaluate(&ctx)
            .unwrap()
    }

    #[test]
    fn test_substitution_count() {
        let source = toks("o paciente apresentou melhora significativa");
        let target = toks("o paciente teve melhora grande");
        assert_eq!(substitution_count(&source, &target), 2);
        assert_eq!(substitution_count(&source, &source), 0);
    }

    #[test]
    fn test_lexical_simplification() {
        let outcome = evaluate(
            "O paciente apresentou melhora significativa durante o tratamento no hospital.",
            "O paciente teve melhora grande durante o tratamento no hospital.",
        );
        let sl = outcome
            .evidence
            .iter()
            .find(|e| e.strategy_code == "SL+")
            .expect("SL+ detected");
        assert_eq!(sl.tier, Tier::Micro);
        assert_eq!(sl.impact, ImpactLevel::Medium);
        assert_eq!(sl.examples.len(), 1);
        assert!(!outcome.should_continue);
    }

    #[test]
    fn test_referential_clarity() {
        let outcome = evaluate(
            "O ministro chegou cedo. Ele falou com os jornalistas.",
            "O ministro chegou cedo. O ministro falou com os jornalistas.",
        );
        let ta = outcome
            .evidence
            .iter()
            .find(|e| e.strategy_code == "TA+")
            .expect("TA+ detected");
        assert_eq!(ta.impact, ImpactLevel::Medium);
        assert_eq!(ta.examples[0].original, "Ele falou com os jornalistas.");
        assert_eq!(ta.positions.len(), 1);
    }

    #[test]
    fn test_micro_never_continues() {
        let outcome = evaluate("Texto igual.", "Texto igual.");
        assert!(outcome.evidence.is_empty());
        assert!(!outcome.should_continue);
    }
}
