//! Completion client factory.
//!
//! Resolves a provider name from configuration into a ready client.

use crate::client::Completer;
use crate::providers::{OllamaClient, OpenAiClient, DEFAULT_OLLAMA_URL};
use crate::types::ProviderType;
use helpdesk_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create a completion client for the named provider.
///
/// # Arguments
/// * `provider` - Provider identifier ("openai", "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key, required by OpenAI
/// * `timeout` - Per-request timeout
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or its key is
/// missing, and `AppError::Llm` if the HTTP client cannot be built.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Duration,
) -> AppResult<Arc<dyn Completer>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown chat provider: {}", provider)))?;

    let api_key = api_key.filter(|key| !key.trim().is_empty());
    if provider_type.requires_api_key() && api_key.is_none() {
        return Err(AppError::Config(format!(
            "{} provider requires an API key",
            provider_type
        )));
    }

    tracing::debug!(provider = %provider_type, "Creating completion client");

    match provider_type {
        ProviderType::Ollama => {
            let base_url = endpoint.unwrap_or(DEFAULT_OLLAMA_URL);
            Ok(Arc::new(OllamaClient::with_base_url(base_url, timeout)?))
        }
        ProviderType::OpenAi => {
            let key = api_key.unwrap_or_default();
            Ok(Arc::new(OpenAiClient::new(key, endpoint, timeout)?))
        }
    }
}
