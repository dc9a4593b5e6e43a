//! End-to-end cascade scenarios
//!
//! Runs the public classifier API against Portuguese sample pairs.

mod helpers;

use std::sync::Arc;

use helpers::*;
use tsa_cascade::stages::macro_stage::MacroStage;
use tsa_cascade::stages::StageSettings;
use tsa_cascade::types::{StageContext, StageEvaluator, StageError, StageOutcome};
use tsa_cascade::{
    AdaptiveThresholds, CascadeClassifier, CascadeState, ImpactLevel, LanguageModels,
    StrategyFeatures,
};
use tsa_common::config::{CascadeSettings, TomlConfig};
use tsa_common::taxonomy::Tier;

struct FailingStage;

impl StageEvaluator for FailingStage {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn tier(&self) -> Tier {
        Tier::Macro
    }

    fn strategy_codes(&self) -> Vec<&'static str> {
        Vec::new()
    }

    fn evaluate(&self, _ctx: &StageContext<'_>) -> Result<StageOutcome, StageError> {
        Err(StageError::Segmentation("unbalanced sentence split".to_string()))
    }
}

#[test]
fn test_fragmentation_reported_with_high_impact() {
    let classifier = standard_classifier();
    let strategies = classifier.detect_strategies(FRAGMENTATION_SOURCE, FRAGMENTATION_TARGET);

    let rp = strategies
        .iter()
        .find(|s| s.code == "RP+")
        .expect("fragmentation should be detected");
    assert_eq!(rp.impact, ImpactLevel::High);
    assert_eq!(rp.tier, Tier::Meso);
    assert!(rp.confidence > 0.5, "confidence {}", rp.confidence);
    assert!(!rp.examples.is_empty());

    let position = rp.position.expect("fragmentation has a position");
    assert_eq!(position.source_sentence, Some(0));
    assert!(position.target_sentence.is_some());

    let json = serde_json::to_value(rp).unwrap();
    assert_eq!(json["impact"], "alto");
}

#[test]
fn test_global_rewrite_from_features() {
    let models = Arc::new(LanguageModels::standard());
    let stage = MacroStage::new(models, StageSettings::default());

    let features = StrategyFeatures {
        lexical_overlap: 0.2,
        semantic_similarity: 0.75,
        structure_change_score: 0.35,
        ..StrategyFeatures::default()
    };
    let thresholds = AdaptiveThresholds::default();
    let ctx = StageContext {
        features: &features,
        source: "O comitê deliberou longamente sobre a proposta orçamentária.",
        target: "Depois de muita conversa, o grupo decidiu sobre o dinheiro.",
        thresholds: &thresholds,
        complete_analysis_mode: true,
    };

    let outcome = stage.evaluate(&ctx).unwrap();
    let rf = outcome
        .evidence
        .iter()
        .find(|e| e.strategy_code == "RF+")
        .expect("global rewrite should be detected");
    assert!(rf.raw_confidence > rf.threshold);
    assert_eq!(rf.impact, ImpactLevel::Medium);
    assert!(outcome.should_continue);
}

#[test]
fn test_paraphrase_is_not_reported_as_meaning_change() {
    let classifier = standard_classifier();
    assert!(classifier.models().has_embeddings());
    assert!(!classifier.models().has_semantic_embeddings());

    let pairs = [
        (PARAPHRASE_SOURCE, PARAPHRASE_TARGET),
        (
            "O comitê deliberou longamente sobre a proposta orçamentária.",
            "Depois de muita conversa, o grupo decidiu sobre o dinheiro.",
        ),
    ];
    for (source, target) in pairs {
        let strategies = classifier.detect_strategies(source, target);
        assert!(
            strategies.iter().all(|s| s.code != "AS+"),
            "meaning change reported for a paraphrase: {:?}",
            strategies.iter().map(|s| &s.code).collect::<Vec<_>>()
        );
    }
}

#[test]
fn test_manual_only_codes_never_reported() {
    let classifier = standard_classifier();

    let report = classifier.analyze(OMISSION_SOURCE, OMISSION_TARGET);
    assert!(report.discarded_manual_only.iter().any(|c| c == "OM+"));

    for (source, target) in sample_pairs() {
        for strategy in classifier.detect_strategies(source, target) {
            assert_ne!(strategy.code, "OM+");
            assert_ne!(strategy.code, "PRO+");
        }
    }
}

#[test]
fn test_confidences_within_unit_interval() {
    for classifier in [standard_classifier(), degraded_classifier()] {
        for (source, target) in sample_pairs() {
            for strategy in classifier.detect_strategies(source, target) {
                assert!(
                    (0.0..=1.0).contains(&strategy.confidence),
                    "{} confidence {}",
                    strategy.code,
                    strategy.confidence
                );
                assert!(strategy.confidence > 0.0, "rejected {} leaked", strategy.code);
            }
        }
    }
}

#[test]
fn test_output_is_deterministic() {
    let classifier = standard_classifier();
    for (source, target) in sample_pairs() {
        let first: Vec<(String, f64)> = classifier
            .detect_strategies(source, target)
            .into_iter()
            .map(|s| (s.code, s.confidence))
            .collect();
        let second: Vec<(String, f64)> = classifier
            .detect_strategies(source, target)
            .into_iter()
            .map(|s| (s.code, s.confidence))
            .collect();
        assert_eq!(first, second);
    }
}

#[test]
fn test_output_sorted_by_confidence() {
    let classifier = standard_classifier();
    for (source, target) in sample_pairs() {
        let strategies = classifier.detect_strategies(source, target);
        for pair in strategies.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
    }
}

#[test]
fn test_degraded_mode_still_classifies() {
    let classifier = degraded_classifier();
    assert!(!classifier.models().has_pipeline());
    assert!(!classifier.models().has_embeddings());

    let report = classifier.analyze(FRAGMENTATION_SOURCE, FRAGMENTATION_TARGET);
    assert_eq!(report.states.last(), Some(&CascadeState::Done));
    assert!(report.strategies.iter().all(|s| s.code != "AS+"));
    assert!(report.stages.iter().all(|s| !s.failed));
}

#[test]
fn test_report_walks_every_state_in_complete_mode() {
    let classifier = standard_classifier();
    let report = classifier.analyze(VOICE_SOURCE, VOICE_TARGET);

    assert_eq!(
        report.states,
        vec![
            CascadeState::Init,
            CascadeState::FeaturesExtracted,
            CascadeState::ThresholdsComputed,
            CascadeState::MacroDone,
            CascadeState::MesoDone,
            CascadeState::MicroDone,
            CascadeState::Filtered,
            CascadeState::Converted,
            CascadeState::Done,
        ]
    );
    assert_eq!(report.stages.len(), 3);
    assert!(report.stages.iter().all(|s| !s.skipped));
    assert_eq!(report.thresholds.len(), 12);
}

#[test]
fn test_failed_stage_is_logged_and_isolated() {
    let models = Arc::new(LanguageModels::standard());
    let stages: Vec<Box<dyn StageEvaluator>> = vec![Box::new(FailingStage)];
    let classifier = CascadeClassifier::with_stages(models, CascadeSettings::default(), stages);

    let (report, logs) = capture_logs(|| classifier.analyze(VOICE_SOURCE, VOICE_TARGET));

    logs.assert_contains("Stage failed");
    assert_eq!(report.stages.len(), 1);
    assert!(report.stages[0].failed);
    assert_eq!(report.stages[0].evidence_count, 0);
    assert!(report.strategies.is_empty());
    assert_eq!(report.states.last(), Some(&CascadeState::Done));
}

#[test]
fn test_from_config_respects_model_switches() {
    let mut config = TomlConfig::default();
    config.models.embeddings = false;
    let classifier = CascadeClassifier::from_config(&config);
    assert!(!classifier.models().has_embeddings());
    assert!(classifier.models().has_pipeline());
    assert!(classifier.settings().complete_analysis_mode);
}
