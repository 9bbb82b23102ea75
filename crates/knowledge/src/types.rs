//! Knowledge system type definitions.

use serde::{Deserialize, Serialize};

/// A bounded fragment of source text, the unit that gets embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Trimmed, non-empty content
    pub text: String,

    /// Base name of the originating file
    pub source_id: String,

    /// Position among the chunks of its source, 0-based
    pub chunk_index: usize,
}

/// A chunk together with its position in the index.
///
/// `global_id` equals the position of the paired vector in the vector
/// store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub text: String,
    pub source_id: String,
    pub chunk_index: usize,
    pub global_id: usize,
}

impl IndexedDocument {
    pub fn from_chunk(chunk: Chunk, global_id: usize) -> Self {
        Self {
            text: chunk.text,
            source_id: chunk.source_id,
            chunk_index: chunk.chunk_index,
            global_id,
        }
    }
}

/// One ranked match returned by a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub text: String,
    pub source_id: String,
    pub chunk_index: usize,
    pub global_id: usize,

    /// Inner product of unit vectors, i.e. cosine similarity
    pub similarity_score: f32,

    /// 1-based position in the result list
    pub rank: usize,
}

impl SearchResult {
    pub(crate) fn new(document: &IndexedDocument, similarity_score: f32, rank: usize) -> Self {
        Self {
            text: document.text.clone(),
            source_id: document.source_id.clone(),
            chunk_index: document.chunk_index,
            global_id: document.global_id,
            similarity_score,
            rank,
        }
    }
}

/// Read-only snapshot of the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Metadata records held
    pub total_documents: usize,

    /// Vectors held
    pub index_size: usize,

    pub embedding_model: String,
    pub embedding_dimension: usize,
}

/// Per-file outcome of a directory load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryLoad {
    /// Files that contributed chunks
    pub loaded: Vec<String>,

    /// Supported files that produced nothing or failed to embed
    pub failed: Vec<String>,

    /// Files with an unsupported extension
    pub skipped: Vec<String>,
}

impl DirectoryLoad {
    pub fn succeeded(&self) -> bool {
        !self.loaded.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_document_from_chunk() {
        let chunk = Chunk {
            text: "Returns are accepted within 30 days.".to_string(),
            source_id: "notes.txt".to_string(),
            chunk_index: 0,
        };

        let doc = IndexedDocument::from_chunk(chunk, 7);
        assert_eq!(doc.global_id, 7);
        assert_eq!(doc.source_id, "notes.txt");
    }

    #[test]
    fn test_stats_json_field_names() {
        let stats = IndexStats {
            total_documents: 2,
            index_size: 2,
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dimension: 1536,
        };

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["total_documents"], 2);
        assert_eq!(json["embedding_dimension"], 1536);
    }

    #[test]
    fn test_directory_load_success_flag() {
        let mut report = DirectoryLoad::default();
        report.skipped.push("manual.pdf".to_string());
        assert!(!report.succeeded());

        report.loaded.push("faq.txt".to_string());
        assert!(report.succeeded());
    }
}
