//! In-memory vector index over the knowledge corpus.
//!
//! Built once at startup and read-only afterwards, so it is shared without locking.

mod memory;

pub use memory::VectorIndex;

use crate::corpus::KnowledgeDocument;

/// A knowledge document together with its embedding.
#[derive(Debug, Clone)]
pub struct IndexedDocument {
    /// Position of the document in the corpus.
    pub position: usize,
    pub document: KnowledgeDocument,
    pub embedding: Vec<f32>,
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched document.
    pub document: KnowledgeDocument,
    /// Position of the document in the corpus.
    pub position: usize,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
