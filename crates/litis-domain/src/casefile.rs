//! Read models for a case and its documents, as the engine consumes them
//!
//! Upload, text extraction, classification, and embedding generation all
//! happen upstream; by the time the engine runs, a case is a list of
//! documents, each split into indexed text chunks that may carry a
//! semantic vector.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A case file: the unit the technical sheet is built for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseFile {
    /// Case identifier (assigned upstream)
    pub id: Uuid,
    /// Case title
    pub title: String,
    /// Documents attached to the case
    pub documents: Vec<Document>,
}

/// One uploaded document with its extracted chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document identifier (assigned upstream)
    pub id: Uuid,
    /// Original filename; used for type inference when the label is empty
    pub filename: String,
    /// Classifier output, possibly noisy or empty
    pub raw_doc_type: String,
    /// Indexed text chunks, in chunk order
    pub chunks: Vec<DocumentChunk>,
}

/// One text chunk of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Chunk identifier (assigned upstream)
    pub id: Uuid,
    /// Page the chunk was extracted from
    pub page_number: i32,
    /// Position of the chunk within its document
    pub chunk_index: i32,
    /// Extracted text
    pub text: String,
    /// Semantic vector, when one has been computed
    pub embedding: Option<Vec<f32>>,
}

impl DocumentChunk {
    /// Whether this chunk participates in semantic retrieval.
    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }
}

/// A chunk returned by semantic retrieval, ordered by ascending distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// Chunk identifier
    pub chunk_id: Uuid,
    /// Document the chunk belongs to
    pub document_id: Uuid,
    /// Page the chunk was extracted from
    pub page_number: i32,
    /// Extracted text
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_embedding_presence() {
        let mut chunk = DocumentChunk {
            id: Uuid::new_v4(),
            page_number: 1,
            chunk_index: 0,
            text: "salario diario $210.00".to_string(),
            embedding: None,
        };
        assert!(!chunk.has_embedding());
        chunk.embedding = Some(vec![0.1, 0.2]);
        assert!(chunk.has_embedding());
    }
}
