//! Deterministic test doubles.

use crate::config::IndexConfig;
use crate::embeddings::{EmbeddingConfig, EmbeddingProvider};
use crate::index::SimilarityIndex;
use helpdesk_core::{AppError, AppResult};
use helpdesk_llm::{Completer, LlmRequest, LlmResponse, LlmUsage};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const NOTES: &str = "Returns are accepted within 30 days.\n\nShipping takes 3-5 business days.";

/// Maps texts onto keyword axes; texts with no keyword land on the last axis.
#[derive(Debug)]
pub struct KeywordProvider {
    axes: Vec<&'static str>,
    fail_on: Option<&'static str>,
    pub calls: AtomicUsize,
}

impl KeywordProvider {
    pub fn new(axes: &[&'static str]) -> Self {
        Self {
            axes: axes.to_vec(),
            fail_on: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Support-desk axes: returns, shipping, sizing.
    pub fn support() -> Self {
        Self::new(&["return", "shipping", "size"])
    }

    pub fn failing_on(mut self, marker: &'static str) -> Self {
        self.fail_on = Some(marker);
        self
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let mut v: Vec<f32> = self
            .axes
            .iter()
            .map(|k| lower.matches(k).count() as f32)
            .collect();
        let other = if v.iter().all(|x| *x == 0.0) { 1.0 } else { 0.0 };
        v.push(other);
        v
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for KeywordProvider {
    fn provider_name(&self) -> &str {
        "keyword"
    }

    fn model_name(&self) -> &str {
        "keyword-test"
    }

    fn dimensions(&self) -> usize {
        self.axes.len() + 1
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(marker) = self.fail_on {
            if texts.iter().any(|t| t.contains(marker)) {
                return Err(AppError::Embedding("rate limited".to_string()));
            }
        }
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }
}

/// One-hot vector at the number ending each text, e.g. "item 17".
#[derive(Debug)]
pub struct NumberProvider {
    pub dims: usize,
    pub calls: AtomicUsize,
}

impl NumberProvider {
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for NumberProvider {
    fn provider_name(&self) -> &str {
        "number"
    }

    fn model_name(&self) -> &str {
        "number-test"
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        texts
            .iter()
            .map(|t| {
                let n: usize = t
                    .rsplit(' ')
                    .next()
                    .and_then(|w| w.parse().ok())
                    .ok_or_else(|| AppError::Embedding(format!("no number in {:?}", t)))?;
                let mut v = vec![0.0; self.dims];
                v[n % self.dims] = 1.0;
                Ok(v)
            })
            .collect()
    }
}

/// Records requests and answers with a canned reply or error.
pub struct FakeCompleter {
    reply: Result<String, String>,
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl FakeCompleter {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn recorded(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Completer for FakeCompleter {
    fn provider_name(&self) -> &str {
        "fake"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Ok(text) => Ok(LlmResponse {
                content: text.clone(),
                model: request.model.clone(),
                usage: LlmUsage::new(40, 10),
            }),
            Err(message) => Err(AppError::Llm(message.clone())),
        }
    }
}

pub fn index_config(storage: &Path, dims: usize, batch_size: usize) -> IndexConfig {
    let embedding = EmbeddingConfig {
        provider: "test".to_string(),
        model: "test".to_string(),
        dimensions: dims,
        batch_size,
        timeout_secs: 5,
        max_retries: 0,
        endpoint: None,
    };
    IndexConfig::new(storage, embedding)
}

pub fn keyword_index(storage: &Path, provider: Arc<KeywordProvider>) -> SimilarityIndex {
    let dims = provider.dimensions();
    SimilarityIndex::new(index_config(storage, dims, 50), provider)
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// `count` paragraphs "item {start}", "item {start + 1}", ...
pub fn numbered_paragraphs(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|n| format!("item {}", n))
        .collect::<Vec<_>>()
        .join("\n\n")
}
