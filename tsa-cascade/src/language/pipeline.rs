//! Sentence segmentation and tokenization
//!
//! Two paths produce the same shapes:
//! - [`RuleBasedPipeline`]: UAX #29 word/sentence boundaries with Portuguese
//!   abbreviation repair (the "language pipeline")
//! - [`regex_tokens`] / [`regex_sentences`]: regex heuristics used when no
//!   pipeline was loaded, or when the pipeline returns nothing
//!
//! Both return non-empty output for non-empty input. Offsets are character
//! offsets (not bytes) into the text that was segmented.

use super::lexicon::ABBREVIATIONS;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

/// A sentence with its character span in the original text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentenceSpan {
    /// Sentence text, trimmed
    pub text: String,
    /// Start character offset (inclusive)
    pub start: usize,
    /// End character offset (exclusive)
    pub end: usize,
}

/// Language pipeline capability
///
/// Implementations are loaded once at startup and shared read-only across
/// concurrent classifications.
pub trait LanguagePipeline: Send + Sync {
    /// Pipeline name for logging
    fn name(&self) -> &'static str;

    /// Split text into sentences with character offsets
    fn sentences(&self, text: &str) -> Vec<SentenceSpan>;

    /// Lowercased word tokens, punctuation removed
    fn tokens(&self, text: &str) -> Vec<String>;
}

/// Rule-based pipeline over Unicode text segmentation
#[derive(Debug, Default, Clone)]
pub struct RuleBasedPipeline;

impl RuleBasedPipeline {
    pub fn new() -> Self {
        Self
    }
}

impl LanguagePipeline for RuleBasedPipeline {
    fn name(&self) -> &'static str {
        "RuleBased"
    }

    fn sentences(&self, text: &str) -> Vec<SentenceSpan> {
        // Collect raw UAX #29 segments as (byte_start, segment)
        let raw: Vec<(usize, &str)> = text.split_sentence_bound_indices().collect();

        // Merge segments that end in a known abbreviation ("Dr. Silva")
        let mut merged: Vec<(usize, usize)> = Vec::new();
        let mut pending: Option<(usize, usize)> = None;
        for (byte_start, segment) in raw {
            let byte_end = byte_start + segment.len();
            let span = match pending.take() {
                Some((start, _)) => (start, byte_end),
                None => (byte_start, byte_end),
            };
            if ends_with_abbreviation(&text[span.0..span.1]) {
                pending = Some(span);
            } else {
                merged.push(span);
            }
        }
        if let Some(span) = pending {
            merged.push(span);
        }

        let mut spans = Vec::new();
        for (byte_start, byte_end) in merged {
            if let Some(span) = trimmed_span(text, byte_start, byte_end) {
                spans.push(span);
            }
        }
        spans
    }

    fn tokens(&self, text: &str) -> Vec<String> {
        text.unicode_words().map(|w| w.to_lowercase()).collect()
    }
}

fn ends_with_abbreviation(segment: &str) -> bool {
    let trimmed = segment.trim_end();
    let Some(without_period) = trimmed.strip_suffix('.') else {
        return false;
    };
    without_period
        .rsplit(|c: char| c.is_whitespace() || c == '(')
        .next()
        .map(|word| ABBREVIATIONS.contains(word.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Build a trimmed sentence span from a byte range, converting to char offsets
fn trimmed_span(text: &str, byte_start: usize, byte_end: usize) -> Option<SentenceSpan> {
    let segment = &text[byte_start..byte_end];
    let trimmed = segment.trim();
    if trimmed.is_empty() {
        return None;
    }
    let leading = segment.len() - segment.trim_start().len();
    let trimmed_byte_start = byte_start + leading;
    let start = char_offset(text, trimmed_byte_start);
    let end = start + trimmed.chars().count();
    Some(SentenceSpan {
        text: trimmed.to_string(),
        start,
        end,
    })
}

/// Convert a byte offset into a character offset
pub fn char_offset(text: &str, byte_offset: usize) -> usize {
    text[..byte_offset].chars().count()
}

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").expect("token regex"));
static SENTENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)[^.!?\n]+(?:[.!?]+|$)").expect("sentence regex"));

/// Regex tokenizer fallback (`\b\w+\b`, lowercased)
pub fn regex_tokens(text: &str) -> Vec<String> {
    let tokens: Vec<String> = TOKEN_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect();
    if tokens.is_empty() && !text.trim().is_empty() {
        return vec![text.trim().to_lowercase()];
    }
    tokens
}

/// Regex sentence splitter fallback (terminal punctuation or line breaks)
pub fn regex_sentences(text: &str) -> Vec<SentenceSpan> {
    let spans: Vec<SentenceSpan> = SENTENCE_RE
        .find_iter(text)
        .filter_map(|m| trimmed_span(text, m.start(), m.end()))
        .collect();
    if spans.is_empty() && !text.trim().is_empty() {
        let byte_start = text.len() - text.trim_start().len();
        return trimmed_span(text, byte_start, text.len()).into_iter().collect();
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_based_sentences_with_offsets() {
        let text = "O sol nasceu. A cidade acordou!  Todos saíram?";
        let spans = RuleBasedPipeline::new().sentences(text);
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].text, "O sol nasceu.");
        assert_eq!(spans[1].text, "A cidade acordou!");
        let chars: Vec<char> = text.chars().collect();
        let third: String = chars[spans[2].start..spans[2].end].iter().collect();
        assert_eq!(third, "Todos saíram?");
    }

    #[test]
    fn test_abbreviation_does_not_split() {
        let spans = RuleBasedPipeline::new().sentences("O Dr. Silva chegou cedo. Ele saiu tarde.");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "O Dr. Silva chegou cedo.");
    }

    #[test]
    fn test_rule_based_tokens_drop_punctuation() {
        let tokens = RuleBasedPipeline::new().tokens("Olá, mundo! A ação é rápida.");
        assert_eq!(tokens, vec!["olá", "mundo", "a", "ação", "é", "rápida"]);
    }

    #[test]
    fn test_regex_fallback_tokens() {
        assert_eq!(regex_tokens("Água fria, café."), vec!["água", "fria", "café"]);
        // Non-empty input always yields output
        assert_eq!(regex_tokens("..."), vec!["..."]);
        assert!(regex_tokens("   ").is_empty());
    }

    #[test]
    fn test_regex_fallback_sentences() {
        let spans = regex_sentences("Primeira frase. Segunda frase!\nTerceira linha");
        let texts: Vec<_> = spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Primeira frase.", "Segunda frase!", "Terceira linha"]);
        assert_eq!(regex_sentences("...").len(), 1);
    }

    #[test]
    fn test_char_offsets_with_accents() {
        let text = "Ação rápida. Fim.";
        let spans = regex_sentences(text);
        assert_eq!(spans[1].start, 13);
        assert_eq!(spans[1].end, 17);
    }
}
