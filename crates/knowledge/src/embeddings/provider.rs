//! Embedding provider trait and factory.

use crate::embeddings::config::EmbeddingConfig;
use crate::embeddings::providers::{MockProvider, OllamaProvider, OpenAiProvider};
use helpdesk_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
///
/// `embed_batch` must return exactly one vector per input text, in input
/// order, each of `dimensions()` length.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "mock", "openai", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Create an embedding provider based on configuration.
///
/// Fails when the provider is unknown or when OpenAI is selected without
/// an API key. This is the one failure that stops the service at startup.
pub fn create_provider(
    config: &EmbeddingConfig,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    config.validate()?;

    match config.provider.as_str() {
        "mock" => Ok(Arc::new(MockProvider::with_model(
            config.dimensions,
            config.model.clone(),
        ))),

        "openai" => {
            let key = api_key.filter(|k| !k.trim().is_empty()).ok_or_else(|| {
                AppError::Config(
                    "OpenAI embedding provider requires an API key (set OPENAI_API_KEY)"
                        .to_string(),
                )
            })?;
            Ok(Arc::new(OpenAiProvider::new(config, key)?))
        }

        "ollama" => Ok(Arc::new(OllamaProvider::new(config)?)),

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: openai, ollama, mock",
            config.provider
        ))),
    }
}
