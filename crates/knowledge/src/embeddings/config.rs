//! Embedding configuration for the similarity index.

use helpdesk_core::{AppError, AppResult, EmbeddingSettings};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings a provider and the batch embedder need.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "openai", "ollama", "mock"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Maximum number of texts per provider request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Upper bound on one provider call, retries included
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for transient provider failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Custom endpoint URL
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_batch_size() -> usize {
    50
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::from(&EmbeddingSettings::default())
    }
}

impl From<&EmbeddingSettings> for EmbeddingConfig {
    fn from(settings: &EmbeddingSettings) -> Self {
        Self {
            provider: settings.provider.to_lowercase(),
            model: settings.model.clone(),
            dimensions: settings.dimensions,
            batch_size: settings.batch_size,
            timeout_secs: settings.timeout_secs,
            max_retries: settings.max_retries,
            endpoint: settings.endpoint.clone(),
        }
    }
}

impl EmbeddingConfig {
    /// Deterministic offline configuration.
    pub fn mock(dimensions: usize) -> Self {
        Self {
            provider: "mock".to_string(),
            model: "trigram-v1".to_string(),
            dimensions,
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check the values the index relies on.
    pub fn validate(&self) -> AppResult<()> {
        if self.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be greater than zero".to_string(),
            ));
        }

        if self.batch_size == 0 {
            return Err(AppError::Config(
                "Embedding batch size must be greater than zero".to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(AppError::Config(
                "Embedding timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
