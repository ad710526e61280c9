//! Configuration settings for Rosana Desk.

use crate::error::{DeskError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub openai: OpenAISettings,
    pub embedding: EmbeddingSettings,
    pub rag: RagSettings,
    pub corpus: CorpusSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Title reported by `GET /`.
    pub title: String,
    /// Service name reported by `GET /health`.
    pub service_name: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            title: "Rosana Desk API".to_string(),
            service_name: "Rosana Desk RAG".to_string(),
        }
    }
}

/// Postgres connection parameters.
///
/// All of host, name, user, password and port are required before startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub host: Option<String>,
    pub name: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub port: Option<u16>,
    /// libpq-style SSL mode (disable, prefer, require, verify-ca, verify-full).
    pub ssl_mode: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            host: None,
            name: None,
            user: None,
            password: None,
            port: None,
            ssl_mode: "require".to_string(),
        }
    }
}

/// Validated connection parameters.
#[derive(Debug, Clone)]
pub struct DatabaseParams {
    pub host: String,
    pub name: String,
    pub user: String,
    pub password: String,
    pub port: u16,
    pub ssl_mode: String,
}

impl DatabaseSettings {
    /// Check that every required parameter is present.
    pub fn validate(&self) -> Result<DatabaseParams> {
        let missing: Vec<&str> = [
            ("DB_HOST", self.host.is_none()),
            ("DB_NAME", self.name.is_none()),
            ("DB_USER", self.user.is_none()),
            ("DB_PASS", self.password.is_none()),
            ("DB_PORT", self.port.is_none()),
        ]
        .into_iter()
        .filter(|(_, absent)| *absent)
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(DeskError::Config(format!(
                "Missing database configuration: {}",
                missing.join(", ")
            )));
        }

        Ok(DatabaseParams {
            host: self.host.clone().unwrap_or_default(),
            name: self.name.clone().unwrap_or_default(),
            user: self.user.clone().unwrap_or_default(),
            password: self.password.clone().unwrap_or_default(),
            port: self.port.unwrap_or_default(),
            ssl_mode: self.ssl_mode.clone(),
        })
    }
}

/// OpenAI-compatible API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAISettings {
    /// API key. Usually supplied through `OPENAI_API_KEY`.
    pub api_key: Option<String>,
    /// Override for the API base URL (e.g. a proxy or compatible provider).
    pub api_base: Option<String>,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for OpenAISettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: None,
            timeout_seconds: 300,
        }
    }
}

impl OpenAISettings {
    /// Return the API key, failing if it is missing or empty.
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            Some(_) => Err(DeskError::Config(
                "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
            )),
            None => Err(DeskError::Config(
                "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
            )),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// RAG (Retrieval-Augmented Generation) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Chat-completion model for answer generation.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Number of documents retrieved per question.
    pub top_k: usize,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            top_k: 10,
        }
    }
}

/// Knowledge corpus settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusSettings {
    /// Tables exported into the corpus, in order.
    pub tables: Vec<String>,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self {
            tables: ["categoria", "cliente", "loja", "operador", "produto", "venda"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
}

impl Settings {
    /// Load settings from the default configuration file, then apply the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Overlay values from the environment onto the loaded settings.
    ///
    /// The lookup is injected so tests don't have to mutate the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("DB_HOST") {
            self.database.host = Some(host);
        }
        if let Some(name) = lookup("DB_NAME") {
            self.database.name = Some(name);
        }
        if let Some(user) = lookup("DB_USER") {
            self.database.user = Some(user);
        }
        if let Some(password) = lookup("DB_PASS") {
            self.database.password = Some(password);
        }
        if let Some(port) = lookup("DB_PORT") {
            let port = port
                .trim()
                .parse::<u16>()
                .map_err(|_| DeskError::Config(format!("DB_PORT is not a valid port: {}", port)))?;
            self.database.port = Some(port);
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.openai.api_key = Some(key);
        }
        if let Some(base) = lookup("OPENAI_API_BASE") {
            self.openai.api_base = Some(base);
        }
        Ok(())
    }

    /// Validate everything required before the service can start.
    pub fn validate(&self) -> Result<DatabaseParams> {
        self.openai.require_api_key()?;
        if self.corpus.tables.is_empty() {
            return Err(DeskError::Config("corpus.tables must not be empty".to_string()));
        }
        self.database.validate()
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rosana-desk")
            .join("config.toml")
    }
}
