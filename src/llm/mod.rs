//! Chat-completion models used to generate answers.

mod openai;

pub use openai::OpenAIChatModel;

use crate::error::Result;
use async_trait::async_trait;

/// A rendered prompt: system instructions plus the user's turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
}

/// Trait for chat-completion backends.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate the plain-text completion for a prompt.
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String>;

    /// Identifier of the underlying model.
    fn model(&self) -> &str;
}
