//! Macro Stage Evaluator
//!
//! Document and paragraph level strategies:
//! - RF+ global rewriting: low lexical overlap, preserved meaning, changed structure
//! - RD+ content restructuring: paragraph/sequence reorganization with preserved meaning
//! - MT+ title optimization: first-line title rewritten
//! - AS+ meaning alteration: moderate-to-low similarity (needs embeddings)
//! - OM+ content omission: complex terms removed with length reduction
//!
//! OM+ is manual-only; its evidence is produced here but filtered out by the
//! orchestrator before output.

use super::{content_set, run_detectors, Detector, DetectorContext, StageSettings};
use crate::features::{paragraphs, ratio};
use crate::language::lexicon::is_complex_term;
use crate::language::LanguageModels;
use crate::types::{
    EvidenceExample, ImpactLevel, StageContext, StageError, StageEvaluator, StageOutcome,
    StrategyEvidence,
};
use std::collections::HashSet;
use std::sync::Arc;
use tsa_common::taxonomy::Tier;

/// Maximum tokens for a first line to be treated as a title
const TITLE_MAX_TOKENS: usize = 15;

const DETECTORS: &[Detector] = &[
    Detector {
        code: "RF+",
        detect: detect_global_rewrite,
    },
    Detector {
        code: "RD+",
        detect: detect_restructuring,
    },
    Detector {
        code: "MT+",
        detect: detect_title_change,
    },
    Detector {
        code: "AS+",
        detect: detect_meaning_alteration,
    },
    Detector {
        code: "OM+",
        detect: detect_omission,
    },
];

/// Macro tier stage
pub struct MacroStage {
    models: Arc<LanguageModels>,
    settings: StageSettings,
}

impl MacroStage {
    pub fn new(models: Arc<LanguageModels>, settings: StageSettings) -> Self {
        Self { models, settings }
    }
}

impl StageEvaluator for MacroStage {
    fn name(&self) -> &'static str {
        "macro"
    }

    fn tier(&self) -> Tier {
        Tier::Macro
    }

    fn strategy_codes(&self) -> Vec<&'static str> {
        DETECTORS.iter().map(|d| d.code).collect()
    }

    fn evaluate(&self, ctx: &StageContext<'_>) -> Result<StageOutcome, StageError> {
        run_detectors(
            self.name(),
            Tier::Macro,
            DETECTORS,
            &self.models,
            ctx,
            &self.settings,
        )
    }
}

fn detect_global_rewrite(
    ctx: &mut DetectorContext<'_>,
    threshold: f64,
) -> Result<Option<StrategyEvidence>, StageError> {
    let f = ctx.features;
    if f.lexical_overlap >= 0.3 || f.semantic_similarity <= 0.65 || f.structure_change_score <= 0.2
    {
        return Ok(None);
    }

    let raw = 0.5
        + (0.3 - f.lexical_overlap)
        + (f.semantic_similarity - 0.65) * 0.8
        + (f.structure_change_score - 0.2) * 0.5;
    let impact = if f.lexical_overlap < 0.15 {
        ImpactLevel::High
    } else {
        ImpactLevel::Medium
    };
    let (examples, positions) = ctx.pair_source_sentences(0..ctx.src.sentence_count(), 0.0);
    Ok(ctx.accept("RF+", raw, threshold, impact, examples, positions))
}

fn detect_restructuring(
    ctx: &mut DetectorContext<'_>,
    threshold: f64,
) -> Result<Option<StrategyEvidence>, StageError> {
    let f = ctx.features;
    if f.structure_change_score <= 0.3 || f.semantic_similarity <= 0.5 {
        return Ok(None);
    }

    let src_paragraphs = ctx.src.paragraph_count;
    let tgt_paragraphs = ctx.tgt.paragraph_count;
    let paragraph_change = (ratio(
        (tgt_paragraphs as f64 - src_paragraphs as f64).abs(),
        src_paragraphs.max(1) as f64,
    ))
    .min(1.0);
    let sequence_change = ctx.src.sequential_markers != ctx.tgt.sequential_markers;
    if paragraph_change == 0.0 && !sequence_change {
        return Ok(None);
    }

    let raw = 0.45
        + f.structure_change_score * 0.4
        + (f.semantic_similarity - 0.5) * 0.3
        + paragraph_change * 0.1;
    let impact = if f.structure_change_score > 0.6 {
        ImpactLevel::High
    } else {
        ImpactLevel::Medium
    };

    let examples = paragraphs(ctx.source)
        .into_iter()
        .zip(paragraphs(ctx.target))
        .map(|(s, t)| EvidenceExample::new(s, t))
        .take(ctx.max_examples)
        .collect();
    Ok(ctx.accept("RD+", raw, threshold, impact, examples, Vec::new()))
}

/// First paragraph when it looks like a title (short, no terminal period)
fn title_line(models: &LanguageModels, text: &str) -> Option<String> {
    let blocks = paragraphs(text);
    if blocks.len() < 2 {
        return None;
    }
    let first = blocks[0];
    if first.ends_with('.') || models.tokens(first).len() > TITLE_MAX_TOKENS {
        return None;
    }
    Some(first.to_string())
}

fn detect_title_change(
    ctx: &mut DetectorContext<'_>,
    threshold: f64,
) -> Result<Option<StrategyEvidence>, StageError> {
    let (Some(src_title), Some(tgt_title)) = (
        title_line(ctx.models, ctx.source),
        title_line(ctx.models, ctx.target),
    ) else {
        return Ok(None);
    };

    let title_similarity =
        strsim::normalized_levenshtein(&src_title.to_lowercase(), &tgt_title.to_lowercase());
    if title_similarity >= 0.95 {
        return Ok(None);
    }

    let shortened = tgt_title.chars().count() < src_title.chars().count();
    let raw = 0.5
        + (1.0 - title_similarity) * 0.3
        + if shortened { 0.1 } else { 0.0 }
        + if ctx.features.semantic_similarity > 0.5 {
            0.1
        } else {
            0.0
        };

    let positions = ctx.offsets.claim(&tgt_title).into_iter().collect();
    let examples = vec![EvidenceExample::new(&src_title, &tgt_title)];
    Ok(ctx.accept("MT+", raw, threshold, ImpactLevel::Low, examples, positions))
}

fn detect_meaning_alteration(
    ctx: &mut DetectorContext<'_>,
    threshold: f64,
) -> Result<Option<StrategyEvidence>, StageError> {
    // Surface similarity cannot separate paraphrase from drift
    if !ctx.models.has_semantic_embeddings() {
        return Ok(None);
    }
    let f = ctx.features;
    if f.semantic_similarity < 0.2 || f.semantic_similarity >= 0.5 || f.lexical_overlap >= 0.5 {
        return Ok(None);
    }

    let raw = 0.5 + (0.5 - f.semantic_similarity) * 0.6 + (0.5 - f.lexical_overlap) * 0.3;
    let (examples, positions) = ctx.pair_source_sentences(0..ctx.src.sentence_count(), 0.0);
    Ok(ctx.accept("AS+", raw, threshold, ImpactLevel::High, examples, positions))
}

fn detect_omission(
    ctx: &mut DetectorContext<'_>,
    threshold: f64,
) -> Result<Option<StrategyEvidence>, StageError> {
    let length_ratio = ctx.features.length_ratio;
    if length_ratio > 0.9 {
        return Ok(None);
    }

    let target_tokens: HashSet<&str> = ctx.tgt.tokens.iter().map(String::as_str).collect();
    let complex: HashSet<&str> = content_set(&ctx.src.tokens)
        .into_iter()
        .filter(|t| is_complex_term(t))
        .collect();
    let removed: HashSet<&str> = complex
        .iter()
        .copied()
        .filter(|t| !target_tokens.contains(t))
        .collect();
    if removed.is_empty() {
        return Ok(None);
    }

    let removed_fraction = removed.len() as f64 / complex.len() as f64;
    let raw = 0.5 + removed_fraction.min(1.0) * 0.3 + (1.0 - length_ratio).min(0.5) * 0.4;
    let impact = if length_ratio < 0.6 {
        ImpactLevel::High
    } else {
        ImpactLevel::Medium
    };

    let indices: Vec<usize> = ctx
        .src
        .sentences
        .iter()
        .enumerate()
        .filter(|(_, s)| {
            ctx.models
                .tokens(&s.text)
                .iter()
                .any(|t| removed.contains(t.as_str()))
        })
        .map(|(i, _)| i)
        .collect();
    let (examples, positions) = ctx.pair_source_sentences(indices, 0.0);
    Ok(ctx.accept("OM+", raw, threshold, impact, examples, positions))
}
