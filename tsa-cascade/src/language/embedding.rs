//! Text embedding capability
//!
//! The [`TextEmbedder`] trait is the seam for a dense sentence-embedding
//! model. [`HashedNgramEmbedder`] is the built-in provider: it hashes word and
//! character-trigram features into a fixed-size vector (feature hashing with
//! signed buckets), then L2-normalises it. Inference is pure and safe for
//! concurrent read-only use.

use sha2::{Digest, Sha256};
use unicode_segmentation::UnicodeSegmentation;

/// Text embedding capability
pub trait TextEmbedder: Send + Sync {
    /// Embedder name for logging
    fn name(&self) -> &'static str;

    /// Encode one text into a dense vector
    fn encode(&self, text: &str) -> Vec<f32>;

    /// Whether vector closeness tracks meaning rather than shared wording
    ///
    /// Paraphrases with little word overlap only score high under a
    /// semantic model. Surface-feature embedders must return `false`.
    fn is_semantic(&self) -> bool {
        false
    }

    /// Encode several texts
    fn encode_batch(&self, texts: &[&str]) -> Vec<Vec<f32>> {
        texts.iter().map(|t| self.encode(t)).collect()
    }
}

/// Cosine similarity of two vectors
///
/// Returns 0.0 for mismatched lengths or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Feature-hashing embedder over words and character trigrams
#[derive(Debug, Clone)]
pub struct HashedNgramEmbedder {
    dimensions: usize,
    word_weight: f32,
    trigram_weight: f32,
}

impl HashedNgramEmbedder {
    /// Create embedder with given dimensionality (minimum 16)
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(16),
            word_weight: 1.0,
            trigram_weight: 0.5,
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let digest = Sha256::digest(feature.as_bytes());
        let mut bucket_bytes = [0u8; 8];
        bucket_bytes.copy_from_slice(&digest[..8]);
        let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimensions as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Default for HashedNgramEmbedder {
    fn default() -> Self {
        Self::new(512)
    }
}

impl TextEmbedder for HashedNgramEmbedder {
    fn name(&self) -> &'static str {
        "HashedNgram"
    }

    fn encode(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for word in text.unicode_words() {
            let word = word.to_lowercase();
            self.add_feature(&mut vector, &format!("w:{}", word), self.word_weight);

            let padded: Vec<char> = format!("^{}$", word).chars().collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                self.add_feature(&mut vector, &format!("t:{}", trigram), self.trigram_weight);
            }
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in vector.iter_mut() {
                *v /= norm;
            }
        }
        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_texts_have_unit_similarity() {
        let embedder = HashedNgramEmbedder::default();
        let a = embedder.encode("O governo aprovou a nova lei.");
        let b = embedder.encode("O governo aprovou a nova lei.");
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_word_order_does_not_change_embedding() {
        let embedder = HashedNgramEmbedder::default();
        let a = embedder.encode("ontem o governo aprovou a lei");
        let b = embedder.encode("o governo aprovou a lei ontem");
        assert!(cosine_similarity(&a, &b) > 0.99);
    }

    #[test]
    fn test_related_closer_than_unrelated() {
        let embedder = HashedNgramEmbedder::default();
        let a = embedder.encode("Os alunos estudaram matemática na escola.");
        let b = embedder.encode("Os estudantes estudaram matemática no colégio.");
        let c = embedder.encode("Choveu muito durante a noite em Lisboa.");
        assert!(cosine_similarity(&a, &b) > cosine_similarity(&a, &c));
    }

    #[test]
    fn test_hashed_embedder_is_not_semantic() {
        assert!(!HashedNgramEmbedder::default().is_semantic());
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashedNgramEmbedder::new(32);
        let v = embedder.encode("");
        assert_eq!(v.len(), 32);
        assert_eq!(cosine_similarity(&v, &embedder.encode("algo")), 0.0);
    }
}
