//! Cascade state machine
//!
//! INIT → FEATURES_EXTRACTED → THRESHOLDS_COMPUTED → MACRO_DONE → (MESO_DONE)
//! → (MICRO_DONE) → FILTERED → CONVERTED → DONE
//!
//! Strictly forward. Only MESO_DONE and MICRO_DONE may be skipped (early
//! exit); INIT may jump straight to DONE (empty input).

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tsa_common::taxonomy::Tier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CascadeState {
    Init,
    FeaturesExtracted,
    ThresholdsComputed,
    MacroDone,
    MesoDone,
    MicroDone,
    Filtered,
    Converted,
    Done,
}

impl CascadeState {
    const ORDER: [CascadeState; 9] = [
        CascadeState::Init,
        CascadeState::FeaturesExtracted,
        CascadeState::ThresholdsComputed,
        CascadeState::MacroDone,
        CascadeState::MesoDone,
        CascadeState::MicroDone,
        CascadeState::Filtered,
        CascadeState::Converted,
        CascadeState::Done,
    ];

    /// State reached after a tier's stage completes
    pub fn after_stage(tier: Tier) -> Self {
        match tier {
            Tier::Macro => CascadeState::MacroDone,
            Tier::Meso => CascadeState::MesoDone,
            Tier::Micro => CascadeState::MicroDone,
        }
    }

    fn is_optional(self) -> bool {
        matches!(self, CascadeState::MesoDone | CascadeState::MicroDone)
    }

    pub fn can_transition_to(self, next: CascadeState) -> bool {
        if next <= self {
            return false;
        }
        if self == CascadeState::Init && next == CascadeState::Done {
            return true;
        }
        Self::ORDER
            .iter()
            .filter(|s| **s > self && **s < next)
            .all(|s| s.is_optional())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CascadeState::Init => "INIT",
            CascadeState::FeaturesExtracted => "FEATURES_EXTRACTED",
            CascadeState::ThresholdsComputed => "THRESHOLDS_COMPUTED",
            CascadeState::MacroDone => "MACRO_DONE",
            CascadeState::MesoDone => "MESO_DONE",
            CascadeState::MicroDone => "MICRO_DONE",
            CascadeState::Filtered => "FILTERED",
            CascadeState::Converted => "CONVERTED",
            CascadeState::Done => "DONE",
        }
    }
}

impl fmt::Display for CascadeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid cascade transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: CascadeState,
    pub to: CascadeState,
}

/// Records the states one run visits
#[derive(Debug, Clone)]
pub struct StateTracker {
    visited: Vec<CascadeState>,
}

impl StateTracker {
    pub fn new() -> Self {
        Self {
            visited: vec![CascadeState::Init],
        }
    }

    pub fn current(&self) -> CascadeState {
        self.visited
            .last()
            .copied()
            .unwrap_or(CascadeState::Init)
    }

    pub fn advance(&mut self, next: CascadeState) -> Result<(), InvalidTransition> {
        let from = self.current();
        if !from.can_transition_to(next) {
            return Err(InvalidTransition { from, to: next });
        }
        self.visited.push(next);
        Ok(())
    }

    pub fn visited(&self) -> &[CascadeState] {
        &self.visited
    }

    pub fn into_visited(self) -> Vec<CascadeState> {
        self.visited
    }
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_forward_path() {
        let mut tracker = StateTracker::new();
        for state in &CascadeState::ORDER[1..] {
            tracker.advance(*state).unwrap();
        }
        assert_eq!(tracker.visited().len(), 9);
        assert_eq!(tracker.current(), CascadeState::Done);
    }

    #[test]
    fn test_early_exit_skips_optional_states() {
        assert!(CascadeState::MacroDone.can_transition_to(CascadeState::Filtered));
        assert!(CascadeState::MesoDone.can_transition_to(CascadeState::Filtered));
        assert!(!CascadeState::FeaturesExtracted.can_transition_to(CascadeState::MacroDone));
    }

    #[test]
    fn test_no_back_transitions() {
        let mut tracker = StateTracker::new();
        tracker.advance(CascadeState::FeaturesExtracted).unwrap();
        let err = tracker.advance(CascadeState::Init).unwrap_err();
        assert_eq!(err.from, CascadeState::FeaturesExtracted);
        assert!(tracker.advance(CascadeState::FeaturesExtracted).is_err());
    }

    #[test]
    fn test_empty_input_shortcut() {
        assert!(CascadeState::Init.can_transition_to(CascadeState::Done));
        assert!(!CascadeState::FeaturesExtracted.can_transition_to(CascadeState::Done));
        assert_eq!(CascadeState::MesoDone.to_string(), "MESO_DONE");
    }
}
