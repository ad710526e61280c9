//! OpenAI client configuration with sensible defaults.

use crate::config::OpenAISettings;
use crate::error::{DeskError, Result};
use async_openai::{config::OpenAIConfig, Client};
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::time::Duration;

/// Create an OpenAI client from the configured key, base URL and timeout.
pub fn create_client(settings: &OpenAISettings) -> Result<Client<OpenAIConfig>> {
    let mut config = OpenAIConfig::new().with_api_key(settings.require_api_key()?);
    if let Some(base) = settings.api_base.as_deref() {
        config = config.with_api_base(base.trim_end_matches('/'));
    }

    create_client_with_timeout(config, Duration::from_secs(settings.timeout_seconds))
}

/// Create an OpenAI client with a custom timeout.
///
/// Failed calls are never retried: a rate-limited or failing provider surfaces
/// as an error on the first attempt.
pub fn create_client_with_timeout(
    config: OpenAIConfig,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DeskError::OpenAI(format!("Failed to create HTTP client: {}", e)))?;

    Ok(Client::with_config(config)
        .with_http_client(http_client)
        .with_backoff(no_retries()))
}

/// A backoff policy whose retry window closes before the first retry.
fn no_retries() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}
