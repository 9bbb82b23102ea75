//! Command handlers for the helpdesk CLI.

pub mod chat;
pub mod index;

pub use chat::ChatCommand;
pub use index::IndexCommand;

use helpdesk_core::{config::AppConfig, AppError, AppResult};
use helpdesk_knowledge::{create_provider, IndexConfig, SimilarityIndex};
use serde::Serialize;

/// Index configured from `config` with its embedding provider.
///
/// With `restore`, stored files are loaded and an empty index is
/// populated from the data directory.
pub async fn open_index(config: &AppConfig, restore: bool) -> AppResult<SimilarityIndex> {
    let index_config = IndexConfig::from_app(config);
    let api_key = config.resolve_api_key(&config.embedding.api_key_env);
    let provider = create_provider(&index_config.embedding, api_key.as_deref())?;

    if restore {
        SimilarityIndex::open(index_config, provider).await
    } else {
        Ok(SimilarityIndex::new(index_config, provider))
    }
}

pub fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Serialization(e.to_string()))?;
    println!("{}", json);
    Ok(())
}
