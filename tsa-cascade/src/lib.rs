//! # tsa-cascade
//!
//! Three-tier cascade classifier for text-simplification strategies.
//! Given a source text and its simplified version, reports which of the
//! taxonomy's strategies were applied, each with an explainable confidence.
//!
//! # Architecture
//! - [`features`]: pairwise feature vector, computed once per request
//! - [`thresholds`]: per-strategy adaptive thresholds from source complexity
//! - [`stages`]: macro → meso → micro detector stages
//! - [`confidence`]: profile-based confidence unification and explanation
//! - [`cascade`]: orchestrator, state machine and run report
//! - [`language`]: injected segmentation, tokenization and embedding models
//!
//! # Example
//! ```rust,ignore
//! use std::sync::Arc;
//! use tsa_cascade::{CascadeClassifier, LanguageModels};
//! use tsa_common::config::CascadeSettings;
//!
//! let classifier = CascadeClassifier::new(Arc::new(LanguageModels::standard()), CascadeSettings::default());
//! for strategy in classifier.detect_strategies(source, target) {
//!     println!("{} {:.2}", strategy.code, strategy.confidence);
//! }
//! ```

pub mod cascade;
pub mod confidence;
pub mod features;
pub mod language;
pub mod stages;
pub mod thresholds;
pub mod types;

pub use cascade::{CascadeClassifier, CascadeReport, CascadeState, StageStats};
pub use confidence::{ConfidenceEngine, ConfidenceExplanation, ConfidenceLevel, EvidenceQuality};
pub use features::FeatureExtractor;
pub use language::LanguageModels;
pub use thresholds::AdaptiveThresholdCalculator;
pub use types::{
    AdaptiveThresholds, EvidenceExample, ImpactLevel, Strategy, StrategyEvidence,
    StrategyFeatures,
};
