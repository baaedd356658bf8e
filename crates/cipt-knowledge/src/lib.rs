//! Knowledge base for the CIPT assistant.
//!
//! Splits the regulations document and supplementary notes into overlapping
//! text windows, embeds each window once at startup (with a JSON cache so
//! later startups skip recomputation), and answers semantic queries by
//! cosine-similarity ranking.

pub mod chunker;
pub mod embedding;
pub mod retriever;
pub mod store;

pub use embedding::{DynEmbeddingService, EmbeddingService, MockEmbedding, RemoteEmbeddingService};
pub use retriever::Retriever;
pub use store::{KnowledgeChunk, KnowledgeStore};
