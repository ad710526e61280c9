//! Configuration module for Rosana Desk.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    CorpusSettings, DatabaseParams, DatabaseSettings, EmbeddingSettings, GeneralSettings,
    OpenAISettings, PromptSettings, RagSettings, ServerSettings, Settings,
};
