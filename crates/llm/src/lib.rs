//! Completion providers for the helpdesk service.
//!
//! The chat flow hands a grounded prompt to a hosted model through the
//! [`Completer`] trait. Two providers are available:
//! - **OpenAI**: chat completions API (default)
//! - **Ollama**: local runtime
//!
//! # Example
//! ```no_run
//! use helpdesk_llm::{create_client, LlmRequest};
//! use std::time::Duration;
//!
//! # async fn example() -> helpdesk_core::AppResult<()> {
//! let client = create_client("ollama", None, None, Duration::from_secs(60))?;
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

pub use client::{Completer, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{OllamaClient, OpenAiClient};
pub use types::ProviderType;
