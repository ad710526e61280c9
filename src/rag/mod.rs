//! RAG (Retrieval-Augmented Generation) over the knowledge corpus.
//!
//! A question is embedded, the closest knowledge documents are retrieved and the
//! chat model answers from that context only.

pub mod context;
mod response;

pub use context::Retriever;
pub use response::{RagEngine, RagResponse, SourceRef};

/// Message returned to users whenever answer generation fails.
pub const APOLOGY_MESSAGE: &str =
    "Desculpe, estou com dificuldades técnicas no momento. Por favor, tente novamente.";
