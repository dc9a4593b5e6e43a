//! Cascade run report
//!
//! Full diagnostic record of one classification. `detect_strategies` returns
//! only `strategies`; everything else is for inspection and the CLI.

use super::state::CascadeState;
use crate::thresholds::{ComplexityProfile, TextRatios};
use crate::types::{AdaptiveThresholds, Strategy, StrategyFeatures};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tsa_common::taxonomy::Tier;
use uuid::Uuid;

/// Execution statistics of one stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageStats {
    pub stage: String,
    pub tier: Tier,
    /// Evidence accepted by the stage's detectors
    pub evidence_count: usize,
    /// Evidence above the early-exit confidence
    pub high_confidence_count: usize,
    /// Stage failed (error or panic) and contributed nothing
    pub failed: bool,
    /// Stage not run because an earlier stage stopped the cascade
    pub skipped: bool,
    pub should_continue: bool,
    pub elapsed_ms: u64,
}

impl StageStats {
    pub fn skipped(stage: &str, tier: Tier) -> Self {
        Self {
            stage: stage.to_string(),
            tier,
            evidence_count: 0,
            high_confidence_count: 0,
            failed: false,
            skipped: true,
            should_continue: false,
            elapsed_ms: 0,
        }
    }
}

/// Language model configuration a run used
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub pipeline: String,
    pub embedder: String,
}

/// Complete record of one cascade run
#[derive(Debug, Clone, Serialize)]
pub struct CascadeReport {
    pub analysis_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub models: ModelInfo,
    pub complete_analysis_mode: bool,
    /// States visited, in order
    pub states: Vec<CascadeState>,
    pub features: StrategyFeatures,
    pub thresholds: AdaptiveThresholds,
    pub complexity: ComplexityProfile,
    pub ratios: TextRatios,
    pub stages: Vec<StageStats>,
    /// Manual-only codes detected and filtered out
    pub discarded_manual_only: Vec<String>,
    /// Codes whose unified confidence was rejected to zero
    pub rejected: Vec<String>,
    pub strategies: Vec<Strategy>,
    pub elapsed_ms: u64,
}

impl CascadeReport {
    /// Codes of the detected strategies, in output order
    pub fn strategy_codes(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.code.as_str()).collect()
    }

    /// Stats of the stage for a tier
    pub fn stage(&self, tier: Tier) -> Option<&StageStats> {
        self.stages.iter().find(|s| s.tier == tier)
    }
}
