//! Cascade orchestration

pub mod orchestrator;
pub mod report;
pub mod state;

pub use orchestrator::CascadeClassifier;
pub use report::{CascadeReport, ModelInfo, StageStats};
pub use state::{CascadeState, InvalidTransition, StateTracker};
