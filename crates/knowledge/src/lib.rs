//! Retrieval core of the helpdesk assistant.
//!
//! Source files are split into chunks, embedded and stored in a
//! [`SimilarityIndex`] that is mirrored to disk. The [`rag`] module turns
//! search results into grounded chat replies.

pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod index;
pub mod rag;
pub mod types;

#[cfg(test)]
mod tests;

pub use chunker::{Chunker, SourceKind};
pub use config::IndexConfig;
pub use embeddings::{create_provider, BatchEmbedder, EmbeddingConfig, EmbeddingProvider};
pub use index::{FlatIpIndex, SimilarityIndex};
pub use rag::{ChatHandler, ChatReply, QuestionCategory, SourceRef};
pub use types::{Chunk, DirectoryLoad, IndexStats, IndexedDocument, SearchResult};
