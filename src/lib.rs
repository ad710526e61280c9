//! Rosana Desk - RAG chat backend
//!
//! Answers questions about the contents of a Postgres database with a hosted LLM.
//!
//! # Overview
//!
//! At startup a fixed list of tables is dumped to text, one knowledge document per
//! table, and every document is embedded into an in-memory vector index. Each chat
//! request embeds the question, retrieves the closest documents and asks the chat
//! model to answer from that context only.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `database` - Postgres access wrapper
//! - `corpus` - Table export and knowledge corpus construction
//! - `embedding` - Embedding generation
//! - `vector_store` - In-memory similarity index
//! - `llm` - Chat-completion models
//! - `rag` - Retrieval and answer generation
//! - `orchestrator` - Startup and shutdown
//! - `cli` - Command line and HTTP service
//!
//! # Example
//!
//! ```rust,no_run
//! use rosana_desk::config::Settings;
//! use rosana_desk::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::bootstrap(settings).await?;
//!
//!     let response = orchestrator.engine().ask("Quantas lojas existem?").await?;
//!     println!("{}", response.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod corpus;
pub mod database;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod vector_store;

pub use error::{DeskError, Result};
