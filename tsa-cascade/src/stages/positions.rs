//! Sentence position tracking
//!
//! Built once per stage run over the target text. Detectors claim sentences
//! by text; duplicate sentence text is resolved first-seen, first-claimed.

use crate::language::SentenceSpan;
use crate::types::CharSpan;
use std::collections::{HashMap, VecDeque};

/// Sentence text → queue of unclaimed character spans
#[derive(Debug, Clone, Default)]
pub struct SentenceOffsetIndex {
    queues: HashMap<String, VecDeque<CharSpan>>,
}

impl SentenceOffsetIndex {
    pub fn build(spans: &[SentenceSpan]) -> Self {
        let mut queues: HashMap<String, VecDeque<CharSpan>> = HashMap::new();
        for span in spans {
            queues
                .entry(span.text.clone())
                .or_default()
                .push_back((span.start, span.end));
        }
        Self { queues }
    }

    /// Take the next unclaimed span for a sentence text
    pub fn claim(&mut self, text: &str) -> Option<CharSpan> {
        self.queues.get_mut(text.trim())?.pop_front()
    }

    /// Unclaimed spans left for a sentence text
    pub fn remaining(&self, text: &str) -> usize {
        self.queues.get(text.trim()).map(VecDeque::len).unwrap_or(0)
    }
}

/// Index of the sentence containing a character offset
pub fn sentence_index_at(spans: &[SentenceSpan], offset: usize) -> Option<usize> {
    spans
        .iter()
        .position(|span| offset >= span.start && offset < span.end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, start: usize) -> SentenceSpan {
        SentenceSpan {
            text: text.to_string(),
            start,
            end: start + text.chars().count(),
        }
    }

    #[test]
    fn test_duplicates_claimed_in_order() {
        let spans = vec![span("Sim.", 0), span("Não.", 5), span("Sim.", 10)];
        let mut index = SentenceOffsetIndex::build(&spans);
        assert_eq!(index.remaining("Sim."), 2);
        assert_eq!(index.claim("Sim."), Some((0, 4)));
        assert_eq!(index.claim("Sim."), Some((10, 14)));
        assert_eq!(index.claim("Sim."), None);
        assert_eq!(index.claim("Talvez."), None);
    }

    #[test]
    fn test_sentence_index_at() {
        let spans = vec![span("Um dois.", 0), span("Três.", 9)];
        assert_eq!(sentence_index_at(&spans, 3), Some(0));
        assert_eq!(sentence_index_at(&spans, 9), Some(1));
        assert_eq!(sentence_index_at(&spans, 8), None);
    }
}
