//! Language models shared by the feature extractor and stage evaluators
//!
//! [`LanguageModels`] is constructed once at process startup and injected
//! (as `Arc<LanguageModels>`) into every component that needs segmentation,
//! tokenization or similarity. Both capabilities are optional:
//! - no pipeline: regex tokenization and sentence splitting
//! - no embedder: Jaccard token overlap instead of embedding cosine
//!
//! Missing models are never an error.

pub mod embedding;
pub mod lexicon;
pub mod pipeline;

pub use embedding::{cosine_similarity, HashedNgramEmbedder, TextEmbedder};
pub use pipeline::{LanguagePipeline, RuleBasedPipeline, SentenceSpan};

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::info;
use tsa_common::config::ModelSettings;

/// Injected, read-only language model bundle
#[derive(Clone)]
pub struct LanguageModels {
    pipeline: Option<Arc<dyn LanguagePipeline>>,
    embedder: Option<Arc<dyn TextEmbedder>>,
}

impl LanguageModels {
    /// Bundle explicit model implementations
    pub fn new(
        pipeline: Option<Arc<dyn LanguagePipeline>>,
        embedder: Option<Arc<dyn TextEmbedder>>,
    ) -> Self {
        Self { pipeline, embedder }
    }

    /// Built-in pipeline and embedder
    pub fn standard() -> Self {
        Self::new(
            Some(Arc::new(RuleBasedPipeline::new())),
            Some(Arc::new(HashedNgramEmbedder::default())),
        )
    }

    /// Fully degraded mode: regex segmentation and lexical similarity only
    pub fn heuristic_only() -> Self {
        Self::new(None, None)
    }

    /// Load models according to configuration
    pub fn from_settings(settings: &ModelSettings) -> Self {
        let pipeline: Option<Arc<dyn LanguagePipeline>> = if settings.language_pipeline {
            Some(Arc::new(RuleBasedPipeline::new()))
        } else {
            None
        };
        let embedder: Option<Arc<dyn TextEmbedder>> = if settings.embeddings {
            Some(Arc::new(HashedNgramEmbedder::new(settings.embedding_dimensions)))
        } else {
            None
        };
        let models = Self::new(pipeline, embedder);
        info!(
            pipeline = models.pipeline_name(),
            embedder = models.embedder_name(),
            "Language models loaded"
        );
        models
    }

    pub fn has_pipeline(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn has_embeddings(&self) -> bool {
        self.embedder.is_some()
    }

    /// Embedder similarity can be read as meaning similarity
    pub fn has_semantic_embeddings(&self) -> bool {
        self.embedder.as_ref().is_some_and(|e| e.is_semantic())
    }

    pub fn pipeline_name(&self) -> &'static str {
        self.pipeline.as_ref().map(|p| p.name()).unwrap_or("regex-fallback")
    }

    pub fn embedder_name(&self) -> &'static str {
        self.embedder.as_ref().map(|e| e.name()).unwrap_or("jaccard-fallback")
    }

    /// Sentence spans (pipeline, falling back to regex if it yields nothing)
    pub fn sentences(&self, text: &str) -> Vec<SentenceSpan> {
        if let Some(pipeline) = &self.pipeline {
            let spans = pipeline.sentences(text);
            if !spans.is_empty() || text.trim().is_empty() {
                return spans;
            }
        }
        pipeline::regex_sentences(text)
    }

    /// Lowercased tokens (pipeline, falling back to regex if it yields nothing)
    pub fn tokens(&self, text: &str) -> Vec<String> {
        if let Some(pipeline) = &self.pipeline {
            let tokens = pipeline.tokens(text);
            if !tokens.is_empty() || text.trim().is_empty() {
                return tokens;
            }
        }
        pipeline::regex_tokens(text)
    }

    /// Semantic similarity in [0, 1]
    ///
    /// Embedding cosine clamped to [0, 1] when an embedder is loaded,
    /// Jaccard token overlap otherwise.
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        match &self.embedder {
            Some(embedder) => {
                let vectors = embedder.encode_batch(&[a, b]);
                cosine_similarity(&vectors[0], &vectors[1]).clamp(0.0, 1.0)
            }
            None => token_overlap(&self.tokens(a), &self.tokens(b)),
        }
    }

    /// Index and similarity of the most similar candidate
    pub fn best_match(&self, text: &str, candidates: &[SentenceSpan]) -> Option<(usize, f64)> {
        candidates
            .iter()
            .enumerate()
            .map(|(i, c)| (i, self.similarity(text, &c.text)))
            .fold(None, |best, (i, sim)| match best {
                Some((_, best_sim)) if best_sim >= sim => best,
                _ => Some((i, sim)),
            })
    }
}

impl Default for LanguageModels {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for LanguageModels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageModels")
            .field("pipeline", &self.pipeline_name())
            .field("embedder", &self.embedder_name())
            .finish()
    }
}

/// Jaccard similarity of two token sets
pub fn token_overlap(a: &[String], b: &[String]) -> f64 {
    let set_a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let set_b: HashSet<&str> = b.iter().map(String::as_str).collect();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }
    set_a.intersection(&set_b).count() as f64 / union as f64
}
