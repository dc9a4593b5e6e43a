//! Simplification strategy taxonomy
//!
//! Static table of the 14 strategy codes. Each entry names the operation,
//! its linguistic type, the cascade tier whose stage owns its detector, and
//! whether the code is reserved for human annotation.
//!
//! Manual-only codes (`OM+`, `PRO+`) must never appear in automatic output.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Linguistic category of a strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    Lexical,
    Syntactic,
    Semantic,
    Structural,
}

/// Cascade tier (analysis granularity)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Document/paragraph level
    Macro,
    /// Sentence level
    Meso,
    /// Token/phrase level
    Micro,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Macro => "macro",
            Tier::Meso => "meso",
            Tier::Micro => "micro",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One taxonomy entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StrategyDescriptor {
    /// Strategy code (e.g. "RP+")
    pub code: &'static str,
    /// Canonical name
    pub name: &'static str,
    /// What the strategy does to the text
    pub description: &'static str,
    /// Linguistic category
    pub strategy_type: StrategyType,
    /// Tier that owns the detector and threshold profile
    pub tier: Tier,
    /// Reserved for human annotation, never produced automatically
    pub manual_only: bool,
}

const fn entry(
    code: &'static str,
    name: &'static str,
    description: &'static str,
    strategy_type: StrategyType,
    tier: Tier,
    manual_only: bool,
) -> StrategyDescriptor {
    StrategyDescriptor {
        code,
        name,
        description,
        strategy_type,
        tier,
        manual_only,
    }
}

static TAXONOMY: [StrategyDescriptor; 14] = [
    entry(
        "SL+",
        "Adequação de Vocabulário",
        "Substituição de palavras raras, técnicas ou longas por equivalentes mais simples e frequentes.",
        StrategyType::Lexical,
        Tier::Micro,
        false,
    ),
    entry(
        "TA+",
        "Clareza Referencial",
        "Substituição de pronomes e referências anafóricas por referentes explícitos.",
        StrategyType::Semantic,
        Tier::Micro,
        false,
    ),
    entry(
        "RP+",
        "Fragmentação Sintática",
        "Divisão de períodos longos em sentenças mais curtas e independentes.",
        StrategyType::Syntactic,
        Tier::Meso,
        false,
    ),
    entry(
        "MV+",
        "Alteração da Voz Verbal",
        "Conversão entre voz passiva e voz ativa para tornar o agente da ação explícito.",
        StrategyType::Syntactic,
        Tier::Meso,
        false,
    ),
    entry(
        "DL+",
        "Reorganização Posicional",
        "Reordenação dos constituintes da sentença mantendo o mesmo conteúdo.",
        StrategyType::Syntactic,
        Tier::Meso,
        false,
    ),
    entry(
        "MOD+",
        "Reinterpretação Perspectiva",
        "Paráfrase que mantém o sentido mas muda a perspectiva ou as palavras usadas.",
        StrategyType::Semantic,
        Tier::Meso,
        false,
    ),
    entry(
        "EXP+",
        "Explicitação e Detalhamento",
        "Acréscimo de explicações, exemplos ou definições para informação implícita.",
        StrategyType::Semantic,
        Tier::Meso,
        false,
    ),
    entry(
        "IN+",
        "Manejo de Inserções",
        "Remoção ou realocação de inserções parentéticas e intercaladas.",
        StrategyType::Structural,
        Tier::Meso,
        false,
    ),
    entry(
        "RF+",
        "Reescrita Global",
        "Reescrita ampla do texto com novas palavras e nova estrutura, preservando o sentido.",
        StrategyType::Structural,
        Tier::Macro,
        false,
    ),
    entry(
        "RD+",
        "Reestruturação do Conteúdo",
        "Reorganização de parágrafos e da progressão das informações no documento.",
        StrategyType::Structural,
        Tier::Macro,
        false,
    ),
    entry(
        "MT+",
        "Otimização de Título",
        "Reescrita do título para torná-lo mais curto, direto e informativo.",
        StrategyType::Structural,
        Tier::Macro,
        false,
    ),
    entry(
        "AS+",
        "Alteração de Sentido",
        "Mudança intencional de sentido para adequar o conteúdo ao público-alvo.",
        StrategyType::Semantic,
        Tier::Macro,
        false,
    ),
    entry(
        "OM+",
        "Supressão Seletiva",
        "Omissão de informações técnicas ou secundárias consideradas dispensáveis.",
        StrategyType::Structural,
        Tier::Macro,
        true,
    ),
    entry(
        "PRO+",
        "Desvio Semântico",
        "Anotação manual de desvio semântico introduzido na simplificação.",
        StrategyType::Semantic,
        Tier::Meso,
        true,
    ),
];

static BY_CODE: Lazy<HashMap<&'static str, &'static StrategyDescriptor>> =
    Lazy::new(|| TAXONOMY.iter().map(|d| (d.code, d)).collect());

/// Look up a strategy by code
pub fn lookup(code: &str) -> Option<&'static StrategyDescriptor> {
    BY_CODE.get(code).copied()
}

/// All 14 taxonomy entries, in table order
pub fn all() -> &'static [StrategyDescriptor] {
    &TAXONOMY
}

/// Entries eligible for automatic detection
pub fn automatic() -> impl Iterator<Item = &'static StrategyDescriptor> {
    TAXONOMY.iter().filter(|d| !d.manual_only)
}

/// True when the code is reserved for human annotation
///
/// Unknown codes are not manual-only.
pub fn is_manual_only(code: &str) -> bool {
    lookup(code).map(|d| d.manual_only).unwrap_or(false)
}

/// Automatic codes owned by a tier
pub fn codes_for_tier(tier: Tier) -> Vec<&'static str> {
    automatic()
        .filter(|d| d.tier == tier)
        .map(|d| d.code)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_taxonomy_has_fourteen_unique_codes() {
        let codes: HashSet<_> = all().iter().map(|d| d.code).collect();
        assert_eq!(all().len(), 14);
        assert_eq!(codes.len(), 14);
    }

    #[test]
    fn test_exactly_two_manual_only() {
        let manual: Vec<_> = all().iter().filter(|d| d.manual_only).map(|d| d.code).collect();
        assert_eq!(manual, vec!["OM+", "PRO+"]);
        assert!(is_manual_only("PRO+"));
        assert!(!is_manual_only("RP+"));
        assert!(!is_manual_only("XX+"));
    }

    #[test]
    fn test_lookup() {
        let rp = lookup("RP+").unwrap();
        assert_eq!(rp.name, "Fragmentação Sintática");
        assert_eq!(rp.strategy_type, StrategyType::Syntactic);
        assert_eq!(rp.tier, Tier::Meso);
        assert!(lookup("nope").is_none());
    }

    #[test]
    fn test_codes_for_tier_excludes_manual() {
        let macro_codes = codes_for_tier(Tier::Macro);
        assert!(macro_codes.contains(&"RF+"));
        assert!(!macro_codes.contains(&"OM+"));
        assert_eq!(codes_for_tier(Tier::Micro), vec!["SL+", "TA+"]);
        assert_eq!(automatic().count(), 12);
    }
}
