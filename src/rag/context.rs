//! Context retrieval for RAG responses.

use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{SearchResult, VectorIndex};
use std::sync::Arc;
use tracing::debug;

/// Retrieves the top-K knowledge documents for a query.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl Retriever {
    /// Create a new retriever returning up to 10 documents.
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            index,
            embedder,
            top_k: 10,
        }
    }

    /// Set the number of documents returned per query.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Embed the query and return the closest documents, best first.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedder.embed(query).await?;
        let results = self.index.search(&query_embedding, self.top_k)?;
        debug!("Retrieved {} documents", results.len());
        Ok(results)
    }
}

/// Join retrieved documents into the context block of the prompt.
pub fn format_context_for_prompt(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| r.document.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
