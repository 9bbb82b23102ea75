//! Index command handler.

use super::{open_index, print_json};
use clap::{Args, Subcommand};
use helpdesk_core::{config::AppConfig, AppError, AppResult};
use helpdesk_knowledge::SimilarityIndex;
use std::path::PathBuf;

/// Build and query the knowledge index
#[derive(Args, Debug)]
pub struct IndexCommand {
    #[command(subcommand)]
    pub action: IndexAction,
}

#[derive(Subcommand, Debug)]
pub enum IndexAction {
    /// Index every supported file of a directory
    Build(IndexBuildCommand),
    /// Search the index
    Search(IndexSearchCommand),
    /// Show index statistics
    Stats(IndexStatsCommand),
    /// Delete the stored index
    Clean,
}

/// Index a directory
#[derive(Args, Debug)]
pub struct IndexBuildCommand {
    /// Directory to index (default: the configured data directory)
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Drop the stored index before building
    #[arg(long)]
    pub reset: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexBuildCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let dir = self.dir.clone().unwrap_or_else(|| config.data_dir());
        tracing::info!(dir = %dir.display(), reset = self.reset, "Executing index build command");

        let index = open_index(config, false).await?;
        if self.reset {
            index.reset()?;
        } else if let Err(e) = index.restore() {
            tracing::warn!(error = %e, "Stored index discarded, rebuilding from scratch");
        }

        let report = index.load_directory(&dir).await;
        let stats = index.stats();

        if self.json {
            print_json(&serde_json::json!({
                "dir": dir,
                "loaded": report.loaded,
                "failed": report.failed,
                "skipped": report.skipped,
                "stats": stats,
            }))?;
        } else {
            println!(
                "Indexed {} file(s), {} failed, {} skipped",
                report.loaded.len(),
                report.failed.len(),
                report.skipped.len()
            );
            for name in &report.failed {
                println!("  failed: {}", name);
            }
            println!("Index now holds {} chunks", stats.total_documents);
        }

        if report.succeeded() {
            Ok(())
        } else {
            Err(AppError::Knowledge(format!(
                "No file could be indexed from {}",
                dir.display()
            )))
        }
    }
}

/// Search the index
#[derive(Args, Debug)]
pub struct IndexSearchCommand {
    /// Query text
    pub query: String,

    /// Number of chunks to retrieve
    #[arg(short = 'k', long, default_value = "5")]
    pub top_k: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexSearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!(top_k = self.top_k, "Executing index search command");

        let index = open_index(config, true).await?;
        let results = index.search(&self.query, self.top_k).await;

        if self.json {
            return print_json(&results);
        }

        if results.is_empty() {
            println!("No results");
        }
        for result in &results {
            println!(
                "{}. {} #{} (score {:.3})",
                result.rank, result.source_id, result.chunk_index, result.similarity_score
            );
            println!("   {}", result.text.replace('\n', "\n   "));
        }
        Ok(())
    }
}

/// Show index statistics
#[derive(Args, Debug)]
pub struct IndexStatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexStatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let index = open_index(config, false).await?;
        let restored = index.restore();
        let stats = index.stats();

        if self.json {
            return print_json(&stats);
        }

        if let Err(e) = restored {
            println!("Stored index is unusable: {}", e);
        }
        println!("Index: {}", config.index_dir().display());
        println!("  Documents: {}", stats.total_documents);
        println!("  Vectors: {}", stats.index_size);
        println!("  Model: {}", stats.embedding_model);
        println!("  Dimension: {}", stats.embedding_dimension);
        Ok(())
    }
}

impl IndexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.action {
            IndexAction::Build(cmd) => cmd.execute(config).await,
            IndexAction::Search(cmd) => cmd.execute(config).await,
            IndexAction::Stats(cmd) => cmd.execute(config).await,
            IndexAction::Clean => {
                let dir = config.index_dir();
                SimilarityIndex::clear_storage(&dir)?;
                println!("Index at {} cleaned", dir.display());
                Ok(())
            }
        }
    }
}
