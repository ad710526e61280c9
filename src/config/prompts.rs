//! Prompt templates for Rosana Desk.
//!
//! The RAG prompt can be customized by placing a `rag.toml` file in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub rag: RagPrompts,
}

/// Prompts for answer generation.
///
/// `system` receives `{{context}}`, `user` receives `{{question}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    pub system: String,
    pub user: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system: r#"Você é o Rosana Desk, assistente virtual especializado da empresa Verzel.

INSTRUÇÕES CRÍTICAS:
1. Use EXCLUSIVAMENTE as informações do contexto fornecido
2. Se a resposta não estiver no contexto, diga claramente que não sabe
3. Seja prestativo e ofereça alternativas quando possível
4. Mantenha linguagem profissional mas amigável
5. Formate respostas para melhor legibilidade

CONTEXTO DISPONÍVEL:
{{context}}"#
                .to_string(),

            user: "{{question}}".to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, overriding the defaults from an optional custom directory.
    pub fn load(custom_dir: Option<&str>) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render the system prompt around the retrieved context.
    pub fn render_system(&self, context: &str) -> String {
        let vars = HashMap::from([("context".to_string(), context.to_string())]);
        Self::render(&self.rag.system, &vars)
    }

    /// Render the user prompt around the verbatim question.
    pub fn render_user(&self, question: &str) -> String {
        let vars = HashMap::from([("question".to_string(), question.to_string())]);
        Self::render(&self.rag.user, &vars)
    }
}
