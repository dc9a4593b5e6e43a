//! Confidence unification
//!
//! Detector raw confidences only gate acceptance. The reported confidence of
//! every strategy is recomputed here from its profile and the feature map.

pub mod engine;
pub mod profiles;

pub use engine::{
    ConfidenceEngine, ConfidenceExplanation, ConfidenceLevel, EvidenceQuality,
    FactorContribution, RejectionReason, SEMANTIC_VETO_THRESHOLD,
};
pub use profiles::{profile, profiles, QualityThreshold, StrategyProfile};
