//! OpenAI chat-completion implementation.

use super::{ChatModel, ChatPrompt};
use crate::config::{OpenAISettings, RagSettings};
use crate::error::{DeskError, Result};
use crate::openai::create_client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// OpenAI-based chat model with a fixed temperature.
pub struct OpenAIChatModel {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIChatModel {
    /// Create a chat model from the configured API and RAG settings.
    pub fn from_settings(openai: &OpenAISettings, rag: &RagSettings) -> Result<Self> {
        Ok(Self::with_client(
            create_client(openai)?,
            &rag.model,
            rag.temperature,
        ))
    }

    /// Create a chat model over an existing client.
    pub fn with_client(client: Client<OpenAIConfig>, model: &str, temperature: f32) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature,
        }
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(prompt.system.clone())
                .build()
                .map_err(|e| DeskError::Rag(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt.user.clone())
                .build()
                .map_err(|e| DeskError::Rag(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| DeskError::Rag(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            DeskError::OpenAI(format!("Failed to generate response: {}", e))
        })?;

        let answer = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| DeskError::Rag("Empty response from LLM".to_string()))?;

        debug!("Generated {} characters", answer.len());
        Ok(answer)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_model_creation() {
        let openai = OpenAISettings {
            api_key: Some("sk-test".to_string()),
            ..OpenAISettings::default()
        };
        let model = OpenAIChatModel::from_settings(&openai, &RagSettings::default()).unwrap();
        assert_eq!(model.model(), "gpt-4o-mini");
        assert!((model.temperature() - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_chat_model_requires_api_key() {
        let result = OpenAIChatModel::from_settings(&OpenAISettings::default(), &RagSettings::default());
        assert!(result.is_err());
    }
}
