//! Exact nearest-neighbour index held in memory.

use super::{cosine_similarity, IndexedDocument, SearchResult};
use crate::corpus::KnowledgeDocument;
use crate::embedding::Embedder;
use crate::error::{DeskError, Result};
use tracing::{info, instrument};

/// Immutable similarity index over knowledge documents.
#[derive(Debug)]
pub struct VectorIndex {
    entries: Vec<IndexedDocument>,
    dimensions: usize,
}

impl VectorIndex {
    /// Embed every document and build the index.
    ///
    /// Placeholder documents stay in the index; they are embedded from a single space
    /// because the embedding API rejects empty input.
    #[instrument(skip_all, fields(documents = documents.len()))]
    pub async fn build(documents: Vec<KnowledgeDocument>, embedder: &dyn Embedder) -> Result<Self> {
        let inputs: Vec<String> = documents
            .iter()
            .map(|doc| {
                if doc.text.is_empty() {
                    " ".to_string()
                } else {
                    doc.text.clone()
                }
            })
            .collect();

        let embeddings = embedder.embed_batch(&inputs).await?;
        let index = Self::from_embeddings(documents, embeddings)?;

        info!(
            "Built vector index: {} documents, {} dimensions",
            index.len(),
            index.dimensions
        );
        Ok(index)
    }

    /// Build the index from precomputed embeddings, one per document.
    pub fn from_embeddings(
        documents: Vec<KnowledgeDocument>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<Self> {
        if documents.len() != embeddings.len() {
            return Err(DeskError::VectorStore(format!(
                "Got {} embeddings for {} documents",
                embeddings.len(),
                documents.len()
            )));
        }

        let dimensions = embeddings.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = embeddings.iter().position(|e| e.len() != dimensions) {
            return Err(DeskError::VectorStore(format!(
                "Embedding {} has {} dimensions, expected {}",
                bad,
                embeddings[bad].len(),
                dimensions
            )));
        }

        let entries = documents
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(position, (document, embedding))| IndexedDocument {
                position,
                document,
                embedding,
            })
            .collect();

        Ok(Self {
            entries,
            dimensions,
        })
    }

    /// Return up to `limit` documents ordered by similarity to the query embedding.
    /// Ties keep corpus order.
    pub fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        if !self.entries.is_empty() && query_embedding.len() != self.dimensions {
            return Err(DeskError::VectorStore(format!(
                "Query embedding has {} dimensions, index has {}",
                query_embedding.len(),
                self.dimensions
            )));
        }

        let mut results: Vec<SearchResult> = self
            .entries
            .iter()
            .map(|entry| SearchResult {
                document: entry.document.clone(),
                position: entry.position,
                score: cosine_similarity(query_embedding, &entry.embedding),
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        Ok(results)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}
