//! RAG response generation.

use super::context::{format_context_for_prompt, Retriever};
use crate::config::Prompts;
use crate::error::Result;
use crate::llm::{ChatModel, ChatPrompt};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Answer pipeline: retrieve, render the prompt, ask the chat model.
pub struct RagEngine {
    retriever: Retriever,
    chat_model: Arc<dyn ChatModel>,
    prompts: Prompts,
}

impl RagEngine {
    /// Create a new RAG engine with the default prompts.
    pub fn new(retriever: Retriever, chat_model: Arc<dyn ChatModel>) -> Self {
        Self {
            retriever,
            chat_model,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts.
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Identifier of the chat model answering questions.
    pub fn model(&self) -> &str {
        self.chat_model.model()
    }

    /// Render the prompt for a question and its retrieved context.
    pub fn build_prompt(&self, question: &str, context: &str) -> ChatPrompt {
        ChatPrompt {
            system: self.prompts.render_system(context),
            user: self.prompts.render_user(question),
        }
    }

    /// Answer a single question. Stateless: no history is kept between calls.
    #[instrument(skip(self, question))]
    pub async fn ask(&self, question: &str) -> Result<RagResponse> {
        info!("Question received: {}", question);

        let results = self.retriever.retrieve(question).await?;
        let context = format_context_for_prompt(&results);
        let prompt = self.build_prompt(question, &context);

        let answer = self.chat_model.complete(&prompt).await?;
        debug!("Generated response with {} sources", results.len());

        Ok(RagResponse {
            answer,
            model: self.chat_model.model().to_string(),
            sources: results
                .into_iter()
                .map(|r| SourceRef {
                    table: r.document.table,
                    score: r.score,
                })
                .collect(),
        })
    }
}

/// The table a retrieved document came from.
#[derive(Debug, Clone)]
pub struct SourceRef {
    pub table: String,
    pub score: f32,
}

/// A RAG response with answer and sources.
#[derive(Debug, Clone)]
pub struct RagResponse {
    /// The generated answer.
    pub answer: String,
    /// Model that generated the answer.
    pub model: String,
    /// Documents used as context, best first.
    pub sources: Vec<SourceRef>,
}

impl RagResponse {
    /// Short single-line preview of the answer for logs.
    pub fn preview(&self, max_chars: usize) -> String {
        let flat = self.answer.replace('\n', " ");
        if flat.chars().count() <= max_chars {
            flat
        } else {
            format!("{}...", flat.chars().take(max_chars).collect::<String>())
        }
    }
}
