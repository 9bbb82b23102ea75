//! Embedding generation for the similarity index.
//!
//! Providers turn text into vectors. [`BatchEmbedder`] wraps one provider
//! with the batch size, timeout and shape checks the index relies on.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};

use helpdesk_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Order-preserving batched embedding with a per-call timeout.
#[derive(Debug, Clone)]
pub struct BatchEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    timeout: Duration,
}

impl BatchEmbedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, batch_size: usize, timeout: Duration) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
            timeout,
        }
    }

    pub fn from_config(provider: Arc<dyn EmbeddingProvider>, config: &EmbeddingConfig) -> Self {
        Self::new(provider, config.batch_size, config.timeout())
    }

    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Embed all texts and return unit-length vectors in input order.
    ///
    /// Any failing batch fails the whole call; nothing partial is returned.
    pub async fn embed_all(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());

        for (batch_no, batch) in texts.chunks(self.batch_size).enumerate() {
            tracing::debug!(
                batch = batch_no,
                size = batch.len(),
                provider = self.provider.provider_name(),
                "Embedding batch"
            );

            let embeddings = self.call(batch).await?;
            if embeddings.len() != batch.len() {
                return Err(AppError::Embedding(format!(
                    "Provider returned {} embeddings for a batch of {}",
                    embeddings.len(),
                    batch.len()
                )));
            }

            for mut embedding in embeddings {
                self.check_dimension(&embedding)?;
                normalize(&mut embedding);
                vectors.push(embedding);
            }
        }

        Ok(vectors)
    }

    /// Embed a single query and normalize it.
    pub async fn embed_query(&self, query: &str) -> AppResult<Vec<f32>> {
        let mut vectors = self.embed_all(&[query.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned for query".to_string()))
    }

    async fn call(&self, batch: &[String]) -> AppResult<Vec<Vec<f32>>> {
        match tokio::time::timeout(self.timeout, self.provider.embed_batch(batch)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Embedding(format!(
                "Embedding request timed out after {}s",
                self.timeout.as_secs_f32()
            ))),
        }
    }

    fn check_dimension(&self, embedding: &[f32]) -> AppResult<()> {
        let expected = self.provider.dimensions();
        if embedding.len() != expected {
            return Err(AppError::Embedding(format!(
                "Embedding has {} dimensions, expected {}",
                embedding.len(),
                expected
            )));
        }
        if embedding.iter().any(|v| !v.is_finite()) {
            return Err(AppError::Embedding(format!(
                "{} returned a non-finite embedding value",
                self.provider.provider_name()
            )));
        }
        Ok(())
    }
}

/// Scale a vector to unit L2 norm. Zero vectors are left unchanged.
pub fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 && norm.is_finite() {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// Inner product of two equal-length vectors.
pub(crate) fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns `[index, 1.0]` per text and records batch sizes.
    #[derive(Debug, Default)]
    struct CountingProvider {
        calls: AtomicUsize,
        seen: AtomicUsize,
        delay: Option<Duration>,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for CountingProvider {
        fn provider_name(&self) -> &str {
            "counting"
        }
        fn model_name(&self) -> &str {
            "counting-v1"
        }
        fn dimensions(&self) -> usize {
            2
        }
        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.calls.fetch_add(1, Ordering::SeqCst);
            let start = self.seen.fetch_add(texts.len(), Ordering::SeqCst);
            Ok((0..texts.len())
                .map(|i| vec![(start + i) as f32, 1.0])
                .collect())
        }
    }

    #[derive(Debug)]
    struct ShortProvider;

    #[async_trait::async_trait]
    impl EmbeddingProvider for ShortProvider {
        fn provider_name(&self) -> &str {
            "short"
        }
        fn model_name(&self) -> &str {
            "short"
        }
        fn dimensions(&self) -> usize {
            4
        }
        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    /// Yields a NaN component for any text containing "nan".
    #[derive(Debug)]
    struct NanProvider;

    #[async_trait::async_trait]
    impl EmbeddingProvider for NanProvider {
        fn provider_name(&self) -> &str {
            "nan"
        }
        fn model_name(&self) -> &str {
            "nan"
        }
        fn dimensions(&self) -> usize {
            2
        }
        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    if t.contains("nan") {
                        vec![f32::NAN, 1.0]
                    } else {
                        vec![1.0, 0.0]
                    }
                })
                .collect())
        }
    }

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("text {}", i)).collect()
    }

    #[test]
    fn test_normalize() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let mut zero = vec![0.0, 0.0];
        normalize(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_batches_preserve_order() {
        let provider = Arc::new(CountingProvider::default());
        let embedder = BatchEmbedder::new(provider.clone(), 50, Duration::from_secs(5));

        let vectors = embedder.embed_all(&texts(120)).await.unwrap();
        assert_eq!(vectors.len(), 120);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);

        // Later texts carry larger first components once normalized.
        for pair in vectors.windows(2) {
            assert!(pair[0][0] < pair[1][0]);
        }
        for v in &vectors {
            assert!((dot(v, v) - 1.0).abs() < 1e-5);
        }
    }

    #[tokio::test]
    async fn test_dimension_mismatch_fails() {
        let embedder = BatchEmbedder::new(Arc::new(ShortProvider), 10, Duration::from_secs(5));
        let result = embedder.embed_all(&texts(3)).await;
        assert!(matches!(result, Err(AppError::Embedding(_))));
    }

    #[tokio::test]
    async fn test_non_finite_embedding_fails() {
        let embedder = BatchEmbedder::new(Arc::new(NanProvider), 10, Duration::from_secs(5));
        let mut input = texts(3);
        input.push("nan here".to_string());

        match embedder.embed_all(&input).await {
            Err(AppError::Embedding(msg)) => assert!(msg.contains("non-finite")),
            other => panic!("Expected embedding error, got {:?}", other),
        }
        assert!(embedder.embed_query("fine").await.is_ok());
    }

    #[tokio::test]
    async fn test_timeout_is_embedding_error() {
        let provider = Arc::new(CountingProvider {
            delay: Some(Duration::from_millis(500)),
            ..CountingProvider::default()
        });
        let embedder = BatchEmbedder::new(provider, 10, Duration::from_millis(20));

        match embedder.embed_query("slow").await {
            Err(AppError::Embedding(msg)) => assert!(msg.contains("timed out")),
            other => panic!("Expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_calls() {
        let provider = Arc::new(CountingProvider::default());
        let embedder = BatchEmbedder::new(provider.clone(), 10, Duration::from_secs(1));
        assert!(embedder.embed_all(&[]).await.unwrap().is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}
