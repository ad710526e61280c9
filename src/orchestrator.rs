//! Startup and shutdown of the knowledge base.
//!
//! Startup runs once, before the HTTP service accepts requests: probe the database,
//! export the corpus, embed it into the vector index and assemble the answer pipeline.
//! Everything built here is immutable for the rest of the process.

use crate::config::{Prompts, Settings};
use crate::corpus::{CorpusBuilder, KnowledgeCorpus, RowSource};
use crate::database::Database;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::llm::{ChatModel, OpenAIChatModel};
use crate::rag::{RagEngine, Retriever};
use crate::vector_store::VectorIndex;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The ready-to-serve knowledge base.
pub struct Orchestrator {
    settings: Settings,
    index: Arc<VectorIndex>,
    engine: Arc<RagEngine>,
    failed_tables: Vec<String>,
}

impl Orchestrator {
    /// Run the full startup phase against Postgres and the OpenAI API.
    ///
    /// An unreachable database or embedding provider is fatal. Individual tables that
    /// cannot be read only produce empty placeholder documents.
    #[instrument(skip_all)]
    pub async fn bootstrap(settings: Settings) -> Result<Self> {
        let params = settings.validate()?;
        let prompts = Prompts::load(settings.prompts.custom_dir.as_deref())?;

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::from_settings(
            &settings.openai,
            &settings.embedding,
        )?);
        let chat_model: Arc<dyn ChatModel> = Arc::new(OpenAIChatModel::from_settings(
            &settings.openai,
            &settings.rag,
        )?);

        let mut database = Database::new(&params)?;
        database.connect().await?;
        let corpus = Self::export_corpus(&settings, &mut database).await;
        database.disconnect().await;

        Self::with_components(settings, prompts, corpus, embedder, chat_model).await
    }

    /// Build the index and pipeline from an exported corpus and custom components.
    pub async fn with_components(
        settings: Settings,
        prompts: Prompts,
        corpus: KnowledgeCorpus,
        embedder: Arc<dyn Embedder>,
        chat_model: Arc<dyn ChatModel>,
    ) -> Result<Self> {
        let failed_tables = corpus.failed_tables().to_vec();
        if !failed_tables.is_empty() {
            warn!(
                "Tables exported as empty placeholders: {}",
                failed_tables.join(", ")
            );
        }

        info!("Indexing {} knowledge documents", corpus.len());
        let index = Arc::new(VectorIndex::build(corpus.into_documents(), embedder.as_ref()).await?);

        let retriever = Retriever::new(index.clone(), embedder).with_top_k(settings.rag.top_k);
        let engine = Arc::new(RagEngine::new(retriever, chat_model).with_prompts(prompts));

        info!("Knowledge base ready (model: {})", engine.model());

        Ok(Self {
            settings,
            index,
            engine,
            failed_tables,
        })
    }

    /// Export every configured table.
    pub async fn export_corpus<S: RowSource + ?Sized>(
        settings: &Settings,
        source: &mut S,
    ) -> KnowledgeCorpus {
        CorpusBuilder::new(settings.corpus.tables.clone())
            .build(source)
            .await
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Shared handle to the answer pipeline.
    pub fn engine(&self) -> Arc<RagEngine> {
        self.engine.clone()
    }

    pub fn index(&self) -> Arc<VectorIndex> {
        self.index.clone()
    }

    /// Tables that were replaced by empty placeholders.
    pub fn failed_tables(&self) -> &[String] {
        &self.failed_tables
    }

    /// Shutdown phase: release the knowledge base.
    pub fn shutdown(self) {
        info!(
            "Shutting down knowledge base ({} indexed documents)",
            self.index.len()
        );
    }
}
