//! OpenAI embedding provider (`POST /v1/embeddings`).

use crate::embeddings::{EmbeddingConfig, EmbeddingProvider};
use async_trait::async_trait;
use helpdesk_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";

/// OpenAI embeddings client.
///
/// Retries rate limits (429), server errors and network failures with
/// exponential backoff. Other client errors fail immediately.
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
    max_retries: u32,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

enum Attempt {
    Retry(AppError),
    Fail(AppError),
}

impl OpenAiProvider {
    pub fn new(config: &EmbeddingConfig, api_key: &str) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                AppError::Embedding(format!("Failed to create HTTP client for OpenAI: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config
                .endpoint
                .as_deref()
                .unwrap_or(DEFAULT_OPENAI_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            dimensions: config.dimensions,
            max_retries: config.max_retries,
        })
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Attempt> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                Attempt::Retry(AppError::Embedding(format!(
                    "Failed to send request to OpenAI: {}",
                    e
                )))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            let err = AppError::Embedding(format!("OpenAI API error {}: {}", status, body_text));
            return if status.as_u16() == 429 || status.is_server_error() {
                Err(Attempt::Retry(err))
            } else {
                Err(Attempt::Fail(err))
            };
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            Attempt::Fail(AppError::Embedding(format!(
                "Failed to parse OpenAI response: {}",
                e
            )))
        })?;

        self.into_ordered(parsed, texts.len()).map_err(Attempt::Fail)
    }

    /// Reorder by the response `index` field and check shape.
    fn into_ordered(&self, response: EmbeddingResponse, expected: usize) -> AppResult<Vec<Vec<f32>>> {
        let mut data = response.data;
        if data.len() != expected {
            return Err(AppError::Embedding(format!(
                "OpenAI returned {} embeddings for {} inputs",
                data.len(),
                expected
            )));
        }

        data.sort_by_key(|d| d.index);

        data.into_iter()
            .enumerate()
            .map(|(position, d)| {
                if d.index != position {
                    return Err(AppError::Embedding(format!(
                        "OpenAI response is missing embedding {}",
                        position
                    )));
                }
                if d.embedding.len() != self.dimensions {
                    return Err(AppError::Embedding(format!(
                        "OpenAI model '{}' returned {} dimensions, expected {}",
                        self.model,
                        d.embedding.len(),
                        self.dimensions
                    )));
                }
                Ok(d.embedding)
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), provider = "openai", model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut attempt = 0;
        loop {
            match self.request(texts).await {
                Ok(embeddings) => {
                    debug!("Received {} embeddings", embeddings.len());
                    return Ok(embeddings);
                }
                Err(Attempt::Retry(e)) if attempt < self.max_retries => {
                    attempt += 1;
                    let delay = super::backoff(attempt);
                    warn!(
                        "Embedding request failed (attempt {}/{}), retrying in {}ms: {}",
                        attempt,
                        self.max_retries + 1,
                        delay.as_millis(),
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(Attempt::Retry(e)) | Err(Attempt::Fail(e)) => return Err(e),
            }
        }
    }
}
