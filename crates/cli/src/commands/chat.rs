//! Chat command handler.

use super::{open_index, print_json};
use clap::Args;
use helpdesk_core::{config::AppConfig, AppError, AppResult};
use helpdesk_knowledge::ChatHandler;
use helpdesk_llm::create_client;
use helpdesk_prompt::load_prompt_or_default;
use std::sync::Arc;
use std::time::Duration;

/// Answer a customer message from the knowledge base
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// The customer message
    pub message: String,

    /// Use the shorter mobile answer budget
    #[arg(long)]
    pub mobile: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        if self.message.trim().is_empty() {
            return Err(AppError::Config("Message must not be empty".to_string()));
        }
        tracing::info!(mobile = self.mobile, "Executing chat command");

        let chat = &config.chat;
        let api_key = config.resolve_api_key(&chat.api_key_env);
        let completer = create_client(
            &chat.provider,
            chat.endpoint.as_deref(),
            api_key.as_deref(),
            Duration::from_secs(chat.timeout_secs),
        )?;

        let prompt = load_prompt_or_default(&config.workspace, &chat.prompt_id);
        let index = Arc::new(open_index(config, true).await?);
        let handler = ChatHandler::new(index, completer, chat.clone(), prompt);

        let reply = handler.respond(&self.message, self.mobile).await;

        if self.json {
            return print_json(&reply);
        }

        println!("{}", reply.answer);
        if !reply.sources.is_empty() {
            println!();
            println!("Sources:");
            for source in &reply.sources {
                println!(
                    "- {} #{} (relevance {:.2})",
                    source.source, source.chunk_index, source.score
                );
            }
        }
        Ok(())
    }
}
