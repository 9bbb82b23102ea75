//! Deterministic offline embedding provider.

use crate::embeddings::provider::EmbeddingProvider;
use helpdesk_core::AppResult;
use std::collections::{HashMap, HashSet};

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "how", "does", "do", "what",
];

/// Trigram-hash provider for offline use and tests.
///
/// Vectors depend only on the words of the text, so identical texts map
/// to identical vectors and texts sharing vocabulary score higher.
#[derive(Debug)]
pub struct MockProvider {
    dimensions: usize,
    model: String,
}

impl MockProvider {
    pub fn new(dimensions: usize) -> Self {
        Self::with_model(dimensions, "trigram-v1")
    }

    pub fn with_model(dimensions: usize, model: impl Into<String>) -> Self {
        Self {
            dimensions,
            model: model.into(),
        }
    }

    fn generate(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];
        if self.dimensions == 0 {
            return embedding;
        }

        let stop_words: HashSet<&str> = STOP_WORDS.iter().copied().collect();
        let lower = text.to_lowercase();

        let mut word_freq: HashMap<&str, u32> = HashMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 2 && !stop_words.contains(w))
        {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let hash = window
                    .iter()
                    .fold(0u64, |acc, c| acc.wrapping_mul(37).wrapping_add(*c as u64));
                embedding[(hash as usize) % self.dimensions] += (*freq as f32).sqrt();
            }

            let word_hash = word
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            embedding[(word_hash as usize) % self.dimensions] += *freq as f32;
        }

        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.generate(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::{dot, normalize};

    #[tokio::test]
    async fn test_mock_provider_batch_shape() {
        let provider = MockProvider::new(128);
        let texts = vec![
            "Returns are accepted within 30 days.".to_string(),
            "Shipping takes 3-5 business days.".to_string(),
        ];

        let embeddings = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(embeddings.len(), 2);
        assert!(embeddings.iter().all(|e| e.len() == 128));
    }

    #[tokio::test]
    async fn test_mock_provider_deterministic() {
        let provider = MockProvider::new(128);
        let a = provider.embed("deterministic test").await.unwrap();
        let b = provider.embed("deterministic test").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_shared_vocabulary_scores_higher() {
        let provider = MockProvider::new(256);
        let mut query = provider.embed("shipping days").await.unwrap();
        let mut shipping = provider
            .embed("Shipping takes 3-5 business days.")
            .await
            .unwrap();
        let mut returns = provider
            .embed("Returns are accepted within 30 days of purchase.")
            .await
            .unwrap();
        normalize(&mut query);
        normalize(&mut shipping);
        normalize(&mut returns);

        assert!(dot(&query, &shipping) > dot(&query, &returns));
    }

    #[tokio::test]
    async fn test_mock_provider_empty_text() {
        let provider = MockProvider::new(32);
        let embedding = provider.embed("").await.unwrap();
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_mock_provider_utf8_safety() {
        let provider = MockProvider::new(64);
        let embedding = provider
            .embed("Livraison offerte dès 80€ 📦 kimono satiné")
            .await
            .unwrap();
        assert_eq!(embedding.len(), 64);
        assert!(embedding.iter().any(|&x| x > 0.0));
    }
}
