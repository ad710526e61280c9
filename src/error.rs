//! Error types for Rosana Desk.

use thiserror::Error;

/// Library-level error type for Rosana Desk operations.
#[derive(Error, Debug)]
pub enum DeskError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database failures are flattened into their message; the driver error type is not kept.
    #[error("Database error: {0}")]
    Database(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector index error: {0}")]
    VectorStore(String),

    #[error("RAG error: {0}")]
    Rag(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl DeskError {
    /// Wrap a database driver error, keeping only its message.
    pub fn database(context: &str, err: impl std::fmt::Display) -> Self {
        DeskError::Database(format!("{}: {}", context, err))
    }
}

/// Result type alias for Rosana Desk operations.
pub type Result<T> = std::result::Result<T, DeskError>;
