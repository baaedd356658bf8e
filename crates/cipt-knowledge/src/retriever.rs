//! Semantic retriever: cosine-similarity ranking over the chunk store.

use std::sync::Arc;

use tracing::debug;

use cipt_core::error::Result;

use crate::embedding::DynEmbeddingService;
use crate::store::KnowledgeStore;

/// Cosine similarity between two vectors: `dot(a,b) / (|a| * |b|)`.
///
/// Returns 0.0 when either vector has zero magnitude or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut mag_a = 0.0f32;
    let mut mag_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        mag_a += x * x;
        mag_b += y * y;
    }
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a.sqrt() * mag_b.sqrt())
}

/// Ranks knowledge chunks against a query and returns the most relevant
/// ones joined into a single context block.
pub struct Retriever {
    store: Arc<KnowledgeStore>,
    embedder: Box<dyn DynEmbeddingService>,
    relevance_threshold: f32,
    max_chunks: usize,
}

impl Retriever {
    pub fn new(
        store: Arc<KnowledgeStore>,
        embedder: Box<dyn DynEmbeddingService>,
        relevance_threshold: f32,
        max_chunks: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            relevance_threshold,
            max_chunks,
        }
    }

    /// Retrieve the chunks most relevant to `query`, joined with blank lines.
    ///
    /// Chunks scoring above the relevance threshold are preferred; when none
    /// pass, the unfiltered top ranks are used instead so the composer always
    /// gets *something* when the store is non-empty. An empty store yields an
    /// empty string, which callers treat as "no relevant context found".
    pub async fn retrieve(&self, query: &str) -> Result<String> {
        if self.store.is_empty() {
            return Ok(String::new());
        }

        let query_vector = self.embedder.embed_boxed(query).await?;

        let mut scored: Vec<(f32, &str)> = self
            .store
            .chunks()
            .iter()
            .map(|chunk| (cosine_similarity(&query_vector, &chunk.vector), chunk.text.as_str()))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let above: Vec<&(f32, &str)> = scored
            .iter()
            .filter(|(score, _)| *score > self.relevance_threshold)
            .collect();

        let selected: Vec<&str> = if above.is_empty() {
            scored.iter().take(self.max_chunks).map(|(_, t)| *t).collect()
        } else {
            above.iter().take(self.max_chunks).map(|(_, t)| *t).collect()
        };

        debug!(selected = selected.len(), "Relevant chunks retrieved");
        Ok(selected.join("\n\n"))
    }
}
