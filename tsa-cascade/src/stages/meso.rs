//! Meso Stage Evaluator
//!
//! Sentence level strategies:
//! - RP+ sentence fragmentation
//! - MV+ voice change (passive/active)
//! - DL+ positional reorganization within aligned sentences
//! - MOD+ perspective reinterpretation (same meaning, different wording)
//! - EXP+ explicitation (added clarifying material)
//! - IN+ insertion handling (parentheticals removed or integrated)
//!
//! PRO+ belongs to this tier but is manual-only and has no detector.

use super::{content_set, run_detectors, Detector, DetectorContext, StageSettings};
use crate::language::lexicon::{count_markers, count_passive_constructions, EXPLICIT_MARKERS};
use crate::language::LanguageModels;
use crate::types::{
    EvidenceExample, ImpactLevel, StageContext, StageError, StageEvaluator, StageOutcome,
    StrategyEvidence,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tsa_common::taxonomy::Tier;

/// Minimum relative sentence-count increase for fragmentation
const MIN_SENTENCE_INCREASE: f64 = 0.1;
/// Source sentences shorter than this are not fragmentation candidates
const MIN_FRAGMENT_SOURCE_TOKENS: usize = 12;
/// Content tokens a fragment must share with its source sentence
const MIN_SHARED_CONTENT: usize = 3;
/// Fraction of the source sentence's content tokens the fragments must cover
const MIN_FRAGMENT_COVERAGE: f64 = 0.6;

static PARENTHETICAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([^()]*\)").expect("parenthetical regex"));
static DASH_INSERTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[—–]\s[^—–]+?\s[—–]").expect("dash insertion regex"));

const DETECTORS: &[Detector] = &[
    Detector {
        code: "RP+",
        detect: detect_fragmentation,
    },
    Detector {
        code: "MV+",
        detect: detect_voice_change,
    },
    Detector {
        code: "DL+",
        detect: detect_reordering,
    },
    Detector {
        code: "MOD+",
        detect: detect_reinterpretation,
    },
    Detector {
        code: "EXP+",
        detect: detect_explicitation,
    },
    Detector {
        code: "IN+",
        detect: detect_insertion_handling,
    },
];

/// Meso tier stage
pub struct MesoStage {
    models: Arc<LanguageModels>,
    settings: StageSettings,
}

impl MesoStage {
    pub fn new(models: Arc<LanguageModels>, settings: StageSettings) -> Self {
        Self { models, settings }
    }
}

impl StageEvaluator for MesoStage {
    fn name(&self) -> &'static str {
        "meso"
    }

    fn tier(&self) -> Tier {
        Tier::Meso
    }

    fn strategy_codes(&self) -> Vec<&'static str> {
        DETECTORS.iter().map(|d| d.code).collect()
    }

    fn evaluate(&self, ctx: &StageContext<'_>) -> Result<StageOutcome, StageError> {
        run_detectors(
            self.name(),
            Tier::Meso,
            DETECTORS,
            &self.models,
            ctx,
            &self.settings,
        )
    }
}

fn detect_fragmentation(
    ctx: &mut DetectorContext<'_>,
    threshold: f64,
) -> Result<Option<StrategyEvidence>, StageError> {
    let src_count = ctx.src.sentence_count();
    if src_count == 0 {
        return Ok(None);
    }
    let increase = (ctx.tgt.sentence_count() as f64 - src_count as f64) / src_count as f64;
    if increase < MIN_SENTENCE_INCREASE {
        return Ok(None);
    }

    let tgt_tokens: Vec<Vec<String>> = ctx
        .tgt
        .sentences
        .iter()
        .map(|s| ctx.models.tokens(&s.text))
        .collect();

    // (source sentence, fragment indices) for every fragmented source sentence
    let mut matches: Vec<(String, Vec<usize>)> = Vec::new();
    let mut best_coverage = 0.0f64;

    for sentence in &ctx.src.sentences {
        let tokens = ctx.models.tokens(&sentence.text);
        if tokens.len() < MIN_FRAGMENT_SOURCE_TOKENS {
            continue;
        }
        let src_content = content_set(&tokens);
        if src_content.is_empty() {
            continue;
        }

        let fragments: Vec<usize> = tgt_tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| {
                t.len() < tokens.len()
                    && content_set(t).intersection(&src_content).count() >= MIN_SHARED_CONTENT
            })
            .map(|(j, _)| j)
            .collect();
        if fragments.len() < 2 {
            continue;
        }

        let covered: HashSet<&str> = fragments
            .iter()
            .flat_map(|&j| content_set(&tgt_tokens[j]))
            .filter(|t| src_content.contains(t))
            .collect();
        let coverage = covered.len() as f64 / src_content.len() as f64;
        if coverage < MIN_FRAGMENT_COVERAGE {
            continue;
        }

        best_coverage = best_coverage.max(coverage);
        matches.push((sentence.text.clone(), fragments));
    }

    if matches.is_empty() {
        return Ok(None);
    }

    let mut examples = Vec::new();
    let mut positions = Vec::new();
    for (original, fragments) in matches.into_iter().take(ctx.max_examples) {
        let pieces: Vec<String> = fragments
            .iter()
            .map(|&j| ctx.tgt.sentences[j].text.clone())
            .collect();
        for piece in &pieces {
            positions.extend(ctx.offsets.claim(piece));
        }
        examples.push(EvidenceExample::new(original, pieces.join(" ")));
    }

    let raw = 0.55 + increase.min(1.0) * 0.25 + best_coverage * 0.2;
    let impact = if increase > 0.5 {
        ImpactLevel::High
    } else if increase > 0.25 {
        ImpactLevel::Medium
    } else {
        ImpactLevel::Low
    };
    Ok(ctx.accept("RP+", raw, threshold, impact, examples, positions))
}

fn detect_voice_change(
    ctx: &mut DetectorContext<'_>,
    threshold: f64,
) -> Result<Option<StrategyEvidence>, StageError> {
    let voice = ctx.features.voice_change_score;
    let src_passives = ctx.src.passive_constructions;
    let tgt_passives = ctx.tgt.passive_constructions;
    if src_passives == tgt_passives || voice < 0.03 {
        return Ok(None);
    }

    let indices: Vec<usize> = ctx
        .src
        .sentences
        .iter()
        .enumerate()
        .filter(|(_, s)| {
            let passives = count_passive_constructions(&ctx.models.tokens(&s.text));
            let target_passives = ctx
                .best_target(&s.text)
                .map(|(j, _)| {
                    count_passive_constructions(&ctx.models.tokens(&ctx.tgt.sentences[j].text))
                })
                .unwrap_or(passives);
            passives != target_passives
        })
        .map(|(i, _)| i)
        .collect();

    let to_active = src_passives > tgt_passives;
    let raw = 0.5 + (voice * 3.0).min(0.3) + if to_active { 0.1 } else { 0.0 };
    let impact = if voice > 0.1 {
        ImpactLevel::Medium
    } else {
        ImpactLevel::Low
    };
    let (examples, positions) = ctx.pair_source_sentences(indices, 0.0);
    Ok(ctx.accept("MV+", raw, threshold, impact, examples, positions))
}

/// Normalized Spearman footrule over shared tokens (first occurrences)
///
/// 0.0 for identical order, 1.0 for maximal displacement.
pub(crate) fn order_displacement(source: &[String], target: &[String]) -> f64 {
    let target_set: HashSet<&str> = target.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    let source_order: Vec<&str> = source
        .iter()
        .map(String::as_str)
        .filter(|t| target_set.contains(t) && seen.insert(*t))
        .collect();
    let m = source_order.len();
    if m < 2 {
        return 0.0;
    }

    let shared: HashSet<&str> = source_order.iter().copied().collect();
    let mut seen = HashSet::new();
    let target_rank: HashMap<&str, usize> = target
        .iter()
        .map(String::as_str)
        .filter(|t| shared.contains(t) && seen.insert(*t))
        .enumerate()
        .map(|(rank, t)| (t, rank))
        .collect();

    let footrule: usize = source_order
        .iter()
        .enumerate()
        .map(|(rank, t)| rank.abs_diff(target_rank.get(t).copied().unwrap_or(rank)))
        .sum();
    footrule as f64 / (m * m / 2) as f64
}

fn detect_reordering(
    ctx: &mut DetectorContext<'_>,
    threshold: f64,
) -> Result<Option<StrategyEvidence>, StageError> {
    let n = ctx.src.sentence_count();
    if n == 0 || n != ctx.tgt.sentence_count() {
        return Ok(None);
    }

    let mut reordered: Vec<(usize, f64)> = Vec::new();
    for i in 0..n {
        let source = &ctx.src.sentences[i].text;
        let target = &ctx.tgt.sentences[i].text;
        if ctx.models.similarity(source, target) <= 0.75 {
            continue;
        }
        let displacement =
            order_displacement(&ctx.models.tokens(source), &ctx.models.tokens(target));
        if displacement > 0.3 {
            reordered.push((i, displacement));
        }
    }
    if reordered.is_empty() {
        return Ok(None);
    }

    let avg_displacement =
        reordered.iter().map(|(_, d)| d).sum::<f64>() / reordered.len() as f64;
    let fraction = reordered.len() as f64 / n as f64;
    let raw = 0.5 + avg_displacement * 0.3 + fraction * 0.2;
    let impact = if fraction >= 0.5 {
        ImpactLevel::Medium
    } else {
        ImpactLevel::Low
    };

    let mut examples = Vec::new();
    let mut positions = Vec::new();
    for (i, _) in reordered.into_iter().take(ctx.max_examples) {
        let original = ctx.src.sentences[i].text.clone();
        let simplified = ctx.tgt.sentences[i].text.clone();
        positions.extend(ctx.offsets.claim(&simplified));
        examples.push(EvidenceExample::new(original, simplified));
    }
    Ok(ctx.accept("DL+", raw, threshold, impact, examples, positions))
}

fn detect_reinterpretation(
    ctx: &mut DetectorContext<'_>,
    threshold: f64,
) -> Result<Option<StrategyEvidence>, StageError> {
    let f = ctx.features;
    if f.semantic_similarity <= 0.75 || f.lexical_overlap >= 0.35 {
        return Ok(None);
    }

    let raw = 0.5 + (f.semantic_similarity - 0.75) + (0.35 - f.lexical_overlap) * 0.8;
    let (examples, positions) = ctx.pair_source_sentences(0..ctx.src.sentence_count(), 0.0);
    Ok(ctx.accept("MOD+", raw, threshold, ImpactLevel::Medium, examples, positions))
}

fn detect_explicitation(
    ctx: &mut DetectorContext<'_>,
    threshold: f64,
) -> Result<Option<StrategyEvidence>, StageError> {
    let f = ctx.features;
    let gain = ctx.tgt.explicit_markers.saturating_sub(ctx.src.explicit_markers);
    if f.explicitness_score <= 0.3
        || f.semantic_similarity <= 0.5
        || (gain == 0 && f.length_ratio <= 1.2)
    {
        return Ok(None);
    }

    let raw = 0.45 + f.explicitness_score * 0.5 + (gain.min(3) as f64 / 3.0) * 0.15;
    let impact = if f.length_ratio > 1.5 {
        ImpactLevel::High
    } else {
        ImpactLevel::Medium
    };

    // Target sentences carrying clarifying markers, paired back to the source
    let marked: Vec<String> = ctx
        .tgt
        .sentences
        .iter()
        .filter(|s| count_markers(&ctx.models.tokens(&s.text), EXPLICIT_MARKERS) > 0)
        .map(|s| s.text.clone())
        .take(ctx.max_examples)
        .collect();
    let mut examples = Vec::new();
    let mut positions = Vec::new();
    for simplified in marked {
        let Some((i, _)) = ctx.models.best_match(&simplified, &ctx.src.sentences) else {
            continue;
        };
        let original = ctx.src.sentences[i].text.clone();
        positions.extend(ctx.offsets.claim(&simplified));
        examples.push(EvidenceExample::new(original, simplified));
    }
    Ok(ctx.accept("EXP+", raw, threshold, impact, examples, positions))
}

/// Parenthetical and dash-delimited insertions in a text
pub(crate) fn count_insertions(text: &str) -> usize {
    PARENTHETICAL_RE.find_iter(text).count() + DASH_INSERTION_RE.find_iter(text).count()
}

fn detect_insertion_handling(
    ctx: &mut DetectorContext<'_>,
    threshold: f64,
) -> Result<Option<StrategyEvidence>, StageError> {
    let src_insertions = count_insertions(ctx.source);
    let tgt_insertions = count_insertions(ctx.target);
    if src_insertions == 0 || tgt_insertions >= src_insertions {
        return Ok(None);
    }

    let reduction = (src_insertions - tgt_insertions) as f64 / src_insertions as f64;
    let raw = 0.5
        + reduction * 0.35
        + if ctx.features.semantic_similarity > 0.6 {
            0.1
        } else {
            0.0
        };
    let impact = if reduction >= 0.5 {
        ImpactLevel::Medium
    } else {
        ImpactLevel::Low
    };

    let indices: Vec<usize> = ctx
        .src
        .sentences
        .iter()
        .enumerate()
        .filter(|(_, s)| count_insertions(&s.text) > 0)
        .map(|(i, _)| i)
        .collect();
    let (examples, positions) = ctx.pair_source_sentences(indices, 0.0);
    Ok(ctx.accept("IN+", raw, threshold, impact, examples, positions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureExtractor;
    use crate::stages::test_support::context;
    use crate::types::{AdaptiveThresholds, StrategyFeatures};

    fn toks(text: &str) -> Vec<String> {
        text.split_whitespace().map(|s| s.to_lowercase()).collect()
    }

    fn evaluate(models: Arc<LanguageModels>, source: &str, target: &str) -> StageOutcome {
        let features = FeatureExtractor::new(models.clone()).extract(source, target);
        let thresholds = AdaptiveThresholds::default();
        let ctx = context(&features, source, target, &thresholds);
        MesoStage::new(models, StageSettings::default())
            .evaluate(&ctx)
            .unwrap()
    }

    fn find<'a>(outcome: &'a StageOutcome, code: &str) -> Option<&'a StrategyEvidence> {
        outcome.evidence.iter().find(|e| e.strategy_code == code)
    }

    #[test]
    fn test_order_displacement() {
        assert_eq!(order_displacement(&toks("a b c d"), &toks("a b c d")), 0.0);
        assert!((order_displacement(&toks("a b c d"), &toks("d c b a")) - 1.0).abs() < 1e-9);
        assert_eq!(order_displacement(&toks("a"), &toks("a")), 0.0);
    }

    #[test]
    fn test_fragmentation() {
        let source = "O prefeito anunciou ontem um novo plano de transporte que amplia as linhas de ônibus e reduz as tarifas para estudantes.";
        let target = "O prefeito anunciou ontem um novo plano de transporte. O plano amplia as linhas de ônibus. O plano também reduz as tarifas para estudantes.";
        let outcome = evaluate(Arc::new(LanguageModels::standard()), source, target);
        let rp = find(&outcome, "RP+").expect("RP+ detected");
        assert_eq!(rp.impact, ImpactLevel::High);
        assert_eq!(rp.positions.len(), 3);
        assert!(rp.raw_confidence > 0.9);
    }

    #[test]
    fn test_reordering() {
        let source = "Ontem o presidente visitou a escola nova.";
        let target = "O presidente visitou a escola nova ontem.";
        let outcome = evaluate(Arc::new(LanguageModels::standard()), source, target);
        let dl = find(&outcome, "DL+").expect("DL+ detected");
        assert_eq!(dl.impact, ImpactLevel::Medium);
        assert_eq!(dl.examples[0].simplified, target);
    }

    #[test]
    fn test_voice_change_to_active() {
        let source = "O projeto foi aprovado pelo conselho.";
        let target = "O conselho aprovou o projeto.";
        let outcome = evaluate(Arc::new(LanguageModels::standard()), source, target);
        let mv = find(&outcome, "MV+").expect("MV+ detected");
        assert!((mv.raw_confidence - 0.9).abs() < 1e-9);
        assert_eq!(mv.examples.len(), 1);
    }

    #[test]
    fn test_insertion_handling() {
        let source = "A agência (criada em 1999) regula o setor — e fiscaliza empresas — no país.";
        let target = "A agência regula o setor no país. Ela foi criada em 1999.";
        assert_eq!(count_insertions(source), 2);
        let outcome = evaluate(Arc::new(LanguageModels::standard()), source, target);
        let inserted = find(&outcome, "IN+").expect("IN+ detected");
        assert_eq!(inserted.impact, ImpactLevel::Medium);
    }

    #[test]
    fn test_reinterpretation_gate_from_features() {
        let models = Arc::new(LanguageModels::standard());
        let features = StrategyFeatures {
            semantic_similarity: 0.85,
            lexical_overlap: 0.2,
            ..Default::default()
        };
        let thresholds = AdaptiveThresholds::default();
        let ctx = context(&features, "O acordo foi firmado.", "As partes assinaram o trato.", &thresholds);
        let outcome = MesoStage::new(models, StageSettings::default())
            .evaluate(&ctx)
            .unwrap();
        let modified = find(&outcome, "MOD+").expect("MOD+ detected");
        assert!((modified.raw_confidence - 0.72).abs() < 1e-9);
    }

    #[test]
    fn test_early_exit_in_legacy_mode() {
        let models = Arc::new(LanguageModels::standard());
        let features = StrategyFeatures {
            semantic_similarity: 1.0,
            lexical_overlap: 0.0,
            ..Default::default()
        };
        let thresholds = AdaptiveThresholds::default();
        let mut ctx = context(&features, "Um texto.", "Outro.", &thresholds);
        ctx.complete_analysis_mode = false;
        let settings = StageSettings {
            early_exit_confidence: 0.5,
            early_exit_count: 1,
            max_examples: 3,
        };
        let outcome = MesoStage::new(models, settings).evaluate(&ctx).unwrap();
        assert!(find(&outcome, "MOD+").is_some());
        assert!(!outcome.should_continue);
    }
}
