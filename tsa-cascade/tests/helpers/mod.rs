//! Test Helper Utilities
//!
//! Shared sample texts and utilities for testing tsa-cascade

#![allow(dead_code)]

pub mod log_capture;

pub use log_capture::{capture_logs, LogCapture};

use std::sync::Arc;
use tsa_cascade::{CascadeClassifier, LanguageModels};
use tsa_common::config::CascadeSettings;

/// One 20-word sentence
pub const FRAGMENTATION_SOURCE: &str = "O prefeito anunciou ontem um novo plano de transporte que amplia as linhas de ônibus e reduz as tarifas escolares.";

/// The same content split into three shorter sentences
pub const FRAGMENTATION_TARGET: &str = "O prefeito anunciou ontem um novo plano de transporte. O plano amplia as linhas de ônibus. O plano também reduz as tarifas escolares.";

pub const OMISSION_SOURCE: &str =
    "A metodologia adotada exige infraestrutura robusta. O projeto começa em março.";
pub const OMISSION_TARGET: &str = "O projeto começa em março.";

pub const VOICE_SOURCE: &str = "O projeto foi aprovado pelo conselho. Ele entra em vigor amanhã.";
pub const VOICE_TARGET: &str = "O conselho aprovou o projeto. O projeto entra em vigor amanhã.";

/// Same meaning, almost no shared wording
pub const PARAPHRASE_SOURCE: &str = "O paciente apresentou melhora significativa após a administração do medicamento prescrito pelo especialista.";
pub const PARAPHRASE_TARGET: &str =
    "O doente ficou bem melhor depois de tomar o remédio que o médico receitou.";

pub const SIMPLE_TEXT: &str = "O gato dorme. O cão late. A casa é azul.";

pub const COMPLEX_TEXT: &str = "A implementação da metodologia supracitada, cuja viabilidade depende de infraestrutura adequada e de regulamentação específica, exige que os parâmetros de governança sejam definidos concomitantemente com os protocolos de interoperabilidade.";

/// (source, target) pairs exercising every tier
pub fn sample_pairs() -> Vec<(&'static str, &'static str)> {
    vec![
        (FRAGMENTATION_SOURCE, FRAGMENTATION_TARGET),
        (OMISSION_SOURCE, OMISSION_TARGET),
        (VOICE_SOURCE, VOICE_TARGET),
        (COMPLEX_TEXT, SIMPLE_TEXT),
        (
            "Ontem o presidente visitou a escola nova.",
            "O presidente visitou a escola nova ontem.",
        ),
        (
            "O ministro chegou cedo. Ele falou com os jornalistas.",
            "O ministro chegou cedo. O ministro falou com os jornalistas.",
        ),
    ]
}

/// Classifier with built-in models and default settings
pub fn standard_classifier() -> CascadeClassifier {
    CascadeClassifier::new(Arc::new(LanguageModels::standard()), CascadeSettings::default())
}

/// Classifier with no language pipeline and no embedder
pub fn degraded_classifier() -> CascadeClassifier {
    CascadeClassifier::new(
        Arc::new(LanguageModels::heuristic_only()),
        CascadeSettings::default(),
    )
}
