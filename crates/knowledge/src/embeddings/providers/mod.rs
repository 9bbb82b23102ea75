//! Embedding provider implementations.

pub mod mock;
pub mod ollama;
pub mod openai;

pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use std::time::Duration;

/// Initial backoff duration in milliseconds
pub(crate) const INITIAL_BACKOFF_MS: u64 = 100;

/// Exponential backoff before retry `attempt` (1-based), capped at 32x.
pub(crate) fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(INITIAL_BACKOFF_MS << attempt.saturating_sub(1).min(5))
}
