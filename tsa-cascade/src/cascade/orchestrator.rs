//! Cascade Orchestrator
//!
//! Runs one classification request end to end:
//! 1. Extract features once
//! 2. Compute adaptive thresholds once
//! 3. Macro stage, then meso and micro while the cascade continues
//! 4. Drop manual-only evidence
//! 5. Recompute every confidence through the confidence engine, map
//!    positions to sentence indices, sort
//!
//! # Error Handling
//! - Empty or blank input short-circuits to an empty result
//! - A stage error or panic is logged and the stage contributes no evidence
//! - Nothing here fails the request
//!
//! # Example
//! ```rust,ignore
//! let classifier = CascadeClassifier::new(Arc::new(LanguageModels::standard()), CascadeSettings::default());
//! let strategies = classifier.detect_strategies(source, target);
//! ```

use super::report::{CascadeReport, ModelInfo, StageStats};
use super::state::{CascadeState, StateTracker};
use crate::confidence::{ConfidenceEngine, EvidenceQuality};
use crate::features::FeatureExtractor;
use crate::language::{LanguageModels, SentenceSpan};
use crate::stages::{sentence_index_at, MacroStage, MesoStage, MicroStage, StageSettings};
use crate::thresholds::{AdaptiveThresholdCalculator, ComplexityProfile, TextRatios};
use crate::types::{
    AdaptiveThresholds, SentencePosition, StageContext, StageError, StageEvaluator, StageOutcome,
    Strategy, StrategyEvidence, StrategyFeatures,
};
use chrono::Utc;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn};
use tsa_common::config::{CascadeSettings, TomlConfig};
use tsa_common::taxonomy;
use uuid::Uuid;

/// Three-tier cascade classifier
pub struct CascadeClassifier {
    models: Arc<LanguageModels>,
    settings: CascadeSettings,
    extractor: FeatureExtractor,
    calculator: AdaptiveThresholdCalculator,
    stages: Vec<Box<dyn StageEvaluator>>,
    engine: ConfidenceEngine,
}

impl CascadeClassifier {
    /// Create classifier with the standard macro, meso and micro stages
    pub fn new(models: Arc<LanguageModels>, settings: CascadeSettings) -> Self {
        let stages: Vec<Box<dyn StageEvaluator>> = vec![
            Box::new(MacroStage::new(
                models.clone(),
                StageSettings::for_tier(&settings, taxonomy::Tier::Macro),
            )),
            Box::new(MesoStage::new(
                models.clone(),
                StageSettings::for_tier(&settings, taxonomy::Tier::Meso),
            )),
            Box::new(MicroStage::new(
                models.clone(),
                StageSettings::for_tier(&settings, taxonomy::Tier::Micro),
            )),
        ];
        Self::with_stages(models, settings, stages)
    }

    /// Create classifier with explicit stages (run in the given order)
    pub fn with_stages(
        models: Arc<LanguageModels>,
        settings: CascadeSettings,
        stages: Vec<Box<dyn StageEvaluator>>,
    ) -> Self {
        Self {
            extractor: FeatureExtractor::new(models.clone()),
            calculator: AdaptiveThresholdCalculator::new(models.clone()),
            engine: ConfidenceEngine::new(),
            models,
            settings,
            stages,
        }
    }

    /// Load models and settings from configuration
    pub fn from_config(config: &TomlConfig) -> Self {
        let models = Arc::new(LanguageModels::from_settings(&config.models));
        Self::new(models, config.cascade.clone())
    }

    pub fn models(&self) -> &Arc<LanguageModels> {
        &self.models
    }

    pub fn settings(&self) -> &CascadeSettings {
        &self.settings
    }

    /// Detected strategies for a (source, target) pair
    pub fn detect_strategies(&self, source: &str, target: &str) -> Vec<Strategy> {
        self.analyze(source, target).strategies
    }

    /// Adaptive thresholds for a (source, target) pair
    pub fn calculate_adaptive_thresholds(&self, source: &str, target: &str) -> AdaptiveThresholds {
        self.calculator.calculate(source, target)
    }

    /// Run the cascade and return the full report
    pub fn analyze(&self, source: &str, target: &str) -> CascadeReport {
        let analysis_id = Uuid::new_v4();
        let span = info_span!("cascade", %analysis_id);
        let _guard = span.enter();

        let started_at = Utc::now();
        let clock = Instant::now();
        let mut tracker = StateTracker::new();
        let mut report = CascadeReport {
            analysis_id,
            started_at,
            models: ModelInfo {
                pipeline: self.models.pipeline_name().to_string(),
                embedder: self.models.embedder_name().to_string(),
            },
            complete_analysis_mode: self.settings.complete_analysis_mode,
            states: Vec::new(),
            features: StrategyFeatures::default(),
            thresholds: AdaptiveThresholds::default(),
            complexity: ComplexityProfile::default(),
            ratios: TextRatios::default(),
            stages: Vec::new(),
            discarded_manual_only: Vec::new(),
            rejected: Vec::new(),
            strategies: Vec::new(),
            elapsed_ms: 0,
        };

        if source.trim().is_empty() || target.trim().is_empty() {
            info!("Empty input, no strategies");
            advance(&mut tracker, CascadeState::Done);
            report.states = tracker.into_visited();
            return report;
        }

        info!(
            source_chars = source.chars().count(),
            target_chars = target.chars().count(),
            "Cascade started"
        );

        // Features and thresholds, once per request
        let features = self.extractor.extract(source, target);
        advance(&mut tracker, CascadeState::FeaturesExtracted);

        let analysis = self.calculator.analyze(source, target);
        advance(&mut tracker, CascadeState::ThresholdsComputed);

        // Tier stages
        let ctx = StageContext {
            features: &features,
            source,
            target,
            thresholds: &analysis.thresholds,
            complete_analysis_mode: self.settings.complete_analysis_mode,
        };
        let mut evidence: Vec<StrategyEvidence> = Vec::new();
        let mut continuing = true;

        for stage in &self.stages {
            if !continuing {
                debug!(stage = stage.name(), "Stage skipped by early exit");
                report
                    .stages
                    .push(StageStats::skipped(stage.name(), stage.tier()));
                continue;
            }

            let stage_clock = Instant::now();
            let (outcome, failed) = match run_isolated(stage.as_ref(), &ctx) {
                Ok(outcome) => (outcome, false),
                Err(e) => {
                    warn!(stage = stage.name(), error = %e, "Stage failed, contributing no evidence");
                    (
                        StageOutcome {
                            evidence: Vec::new(),
                            should_continue: true,
                        },
                        true,
                    )
                }
            };

            let high_confidence_count = outcome
                .evidence
                .iter()
                .filter(|e| e.raw_confidence > self.settings.early_exit_confidence)
                .count();
            report.stages.push(StageStats {
                stage: stage.name().to_string(),
                tier: stage.tier(),
                evidence_count: outcome.evidence.len(),
                high_confidence_count,
                failed,
                skipped: false,
                should_continue: outcome.should_continue,
                elapsed_ms: stage_clock.elapsed().as_millis() as u64,
            });
            advance(&mut tracker, CascadeState::after_stage(stage.tier()));

            continuing = outcome.should_continue;
            evidence.extend(outcome.evidence);
        }

        // Manual-only filter
        let (manual, automatic): (Vec<_>, Vec<_>) = evidence
            .into_iter()
            .partition(|e| taxonomy::is_manual_only(&e.strategy_code));
        report.discarded_manual_only = manual.into_iter().map(|e| e.strategy_code).collect();
        if !report.discarded_manual_only.is_empty() {
            debug!(codes = ?report.discarded_manual_only, "Manual-only evidence discarded");
        }
        advance(&mut tracker, CascadeState::Filtered);

        // Confidence unification and position mapping
        let feature_map = features.to_map();
        let source_sentences = self.models.sentences(source);
        let target_sentences = self.models.sentences(target);
        let mut strategies = Vec::new();

        for found in automatic {
            let quality = EvidenceQuality::assess(found.margin(), found.examples.len());
            let custom = detector_factors(&found);
            let explanation = self.engine.calculate_confidence(
                &found.strategy_code,
                &feature_map,
                quality,
                Some(&custom),
                None,
            );

            if explanation.final_confidence == 0.0 && self.settings.drop_rejected {
                debug!(code = %found.strategy_code, rejection = ?explanation.rejection, "Strategy rejected");
                report.rejected.push(found.strategy_code);
                continue;
            }

            let position = self.locate(&found, &source_sentences, &target_sentences);
            match Strategy::from_evidence(found, explanation, position) {
                Some(strategy) => strategies.push(strategy),
                None => warn!("Evidence for unknown strategy code dropped"),
            }
        }
        advance(&mut tracker, CascadeState::Converted);

        strategies.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.code.cmp(&b.code))
        });
        advance(&mut tracker, CascadeState::Done);

        report.elapsed_ms = clock.elapsed().as_millis() as u64;
        info!(
            strategies = strategies.len(),
            rejected = report.rejected.len(),
            elapsed_ms = report.elapsed_ms,
            "Cascade complete"
        );

        report.features = features;
        report.thresholds = analysis.thresholds;
        report.complexity = analysis.complexity;
        report.ratios = analysis.ratios;
        report.strategies = strategies;
        report.states = tracker.into_visited();
        report
    }

    /// Sentence indices of an evidence in source and target
    fn locate(
        &self,
        evidence: &StrategyEvidence,
        source_sentences: &[SentenceSpan],
        target_sentences: &[SentenceSpan],
    ) -> Option<SentencePosition> {
        let target_sentence = evidence
            .positions
            .first()
            .and_then(|(start, _)| sentence_index_at(target_sentences, *start));
        let source_sentence = evidence.examples.first().and_then(|example| {
            source_sentences
                .iter()
                .position(|s| s.text == example.original)
                .or_else(|| {
                    self.models
                        .best_match(&example.original, source_sentences)
                        .map(|(i, _)| i)
                })
        });

        if source_sentence.is_none() && target_sentence.is_none() {
            return None;
        }
        Some(SentencePosition {
            source_sentence,
            target_sentence,
        })
    }
}

fn advance(tracker: &mut StateTracker, next: CascadeState) {
    if let Err(e) = tracker.advance(next) {
        warn!(error = %e, "Cascade state out of order");
    }
}

/// Detector-side signals passed to the confidence engine
fn detector_factors(evidence: &StrategyEvidence) -> BTreeMap<String, f64> {
    let mut factors = BTreeMap::new();
    factors.insert(
        "threshold_margin".to_string(),
        (evidence.margin() * 2.0).clamp(0.0, 1.0),
    );
    factors
}

/// Run a stage, turning a panic into a stage error
fn run_isolated(
    stage: &dyn StageEvaluator,
    ctx: &StageContext<'_>,
) -> Result<StageOutcome, StageError> {
    match panic::catch_unwind(AssertUnwindSafe(|| stage.evaluate(ctx))) {
        Ok(result) => result,
        Err(payload) => {
            let message = if let Some(s) = payload.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            Err(StageError::Internal(format!("stage panicked: {}", message)))
        }
    }
}
