//! Knowledge chunk store with a cache-or-build lifecycle.
//!
//! Chunks are built once at startup from the regulations text plus the
//! supplementary notes, embedded, and persisted to a JSON artifact. Later
//! startups load the artifact and skip recomputation entirely. This is a
//! pure cache-or-build decision, not a freshness check: edits to the source
//! documents are ignored until the cache file is deleted.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use cipt_core::config::KnowledgeConfig;
use cipt_core::error::{CiptError, Result};

use crate::chunker::{normalize_whitespace, split_overlapping};
use crate::embedding::DynEmbeddingService;

/// A retrieval unit: one window of normalized source text and its vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    pub text: String,
    pub vector: Vec<f32>,
}

/// Immutable collection of embedded chunks, built once at startup.
#[derive(Debug, Default)]
pub struct KnowledgeStore {
    chunks: Vec<KnowledgeChunk>,
}

impl KnowledgeStore {
    /// An empty store. Retrieval against it yields no context.
    pub fn empty() -> Self {
        Self { chunks: Vec::new() }
    }

    /// Build a store from already-embedded chunks.
    pub fn from_chunks(chunks: Vec<KnowledgeChunk>) -> Self {
        Self { chunks }
    }

    pub fn chunks(&self) -> &[KnowledgeChunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Load the store from the cache artifact, or build it from the source
    /// documents and persist the result.
    ///
    /// Building reads both sources, normalizes whitespace, splits each into
    /// overlapping windows (regulations chunks first, then notes), and embeds
    /// every window. Any I/O or embedding failure aborts the build; the
    /// caller decides whether to continue with an empty store.
    pub async fn build_or_load(
        config: &KnowledgeConfig,
        embedder: &dyn DynEmbeddingService,
    ) -> Result<Self> {
        let cache_path = Path::new(&config.cache_path);
        if cache_path.exists() {
            let raw = std::fs::read_to_string(cache_path)?;
            let chunks: Vec<KnowledgeChunk> = serde_json::from_str(&raw)?;
            info!(chunks = chunks.len(), "Knowledge base loaded from cache");
            return Ok(Self { chunks });
        }

        info!("Reading source documents for the knowledge base");
        let policy = std::fs::read_to_string(&config.policy_path)?;
        let notes = std::fs::read_to_string(&config.notes_path)?;

        let mut windows = split_overlapping(
            &normalize_whitespace(&policy),
            config.chunk_size,
            config.chunk_overlap,
        );
        windows.extend(split_overlapping(
            &normalize_whitespace(&notes),
            config.chunk_size,
            config.chunk_overlap,
        ));
        info!(windows = windows.len(), "Documents split into windows");

        let mut chunks = Vec::with_capacity(windows.len());
        for window in windows {
            let vector = embedder.embed_boxed(&window).await?;
            chunks.push(KnowledgeChunk {
                text: window,
                vector,
            });
        }

        if let Err(e) = Self::persist(&chunks, cache_path) {
            // A missing cache only costs recomputation on the next start.
            warn!(error = %e, "Failed to persist embeddings cache");
        } else {
            info!(path = %cache_path.display(), "Embeddings cached");
        }

        Ok(Self { chunks })
    }

    fn persist(chunks: &[KnowledgeChunk], path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let serialized =
            serde_json::to_string(chunks).map_err(|e| CiptError::Serialization(e.to_string()))?;
        std::fs::write(path, serialized)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbedding;

    fn test_config(dir: &Path) -> KnowledgeConfig {
        KnowledgeConfig {
            policy_path: dir.join("regimento.txt").to_string_lossy().into_owned(),
            notes_path: dir.join("fontes.txt").to_string_lossy().into_owned(),
            cache_path: dir.join("embeddings.json").to_string_lossy().into_owned(),
            chunk_size: 40,
            chunk_overlap: 10,
        }
    }

    fn write_sources(dir: &Path) {
        std::fs::write(
            dir.join("regimento.txt"),
            "Art. 37. O auditório do CIPT tem capacidade para 313 pessoas.\n\nArt. 38. As salas de reunião do térreo têm limite de 3 horas de uso.",
        )
        .unwrap();
        std::fs::write(
            dir.join("fontes.txt"),
            "Reservas do auditório são feitas por ofício com pagamento de taxa.",
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_build_from_sources() {
        let dir = tempfile::tempdir().unwrap();
        write_sources(dir.path());
        let config = test_config(dir.path());

        let store = KnowledgeStore::build_or_load(&config, &MockEmbedding::new())
            .await
            .unwrap();
        assert!(!store.is_empty());
        for chunk in store.chunks() {
            assert!(!chunk.text.is_empty());
            assert_eq!(chunk.vector.len(), 64);
        }
    }

    #[tokio::test]
    async fn test_build_persists_cache() {
        let dir = tempfile::tempdir().unwrap();
        write_sources(dir.path());
        let config = test_config(dir.path());

        let built = KnowledgeStore::build_or_load(&config, &MockEmbedding::new())
            .await
            .unwrap();
        assert!(Path::new(&config.cache_path).exists());

        // Second call must load the cache, even if sources disappear.
        std::fs::remove_file(dir.path().join("regimento.txt")).unwrap();
        std::fs::remove_file(dir.path().join("fontes.txt")).unwrap();
        let loaded = KnowledgeStore::build_or_load(&config, &MockEmbedding::new())
            .await
            .unwrap();
        assert_eq!(loaded.len(), built.len());
    }

    #[tokio::test]
    async fn test_cache_ignores_stale_sources() {
        let dir = tempfile::tempdir().unwrap();
        write_sources(dir.path());
        let config = test_config(dir.path());

        let built = KnowledgeStore::build_or_load(&config, &MockEmbedding::new())
            .await
            .unwrap();

        // Rewriting a source does not invalidate the cache.
        std::fs::write(dir.path().join("regimento.txt"), "Texto totalmente novo.").unwrap();
        let loaded = KnowledgeStore::build_or_load(&config, &MockEmbedding::new())
            .await
            .unwrap();
        assert_eq!(loaded.len(), built.len());
    }

    #[tokio::test]
    async fn test_missing_sources_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let result = KnowledgeStore::build_or_load(&config, &MockEmbedding::new()).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_store() {
        let store = KnowledgeStore::empty();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }
}
