//! Helpdesk CLI
//!
//! Main entry point for the helpdesk command-line tool.
//! Builds and queries the support knowledge index and answers customer
//! messages grounded on it.

mod commands;

use clap::{Parser, Subcommand};
use commands::{ChatCommand, IndexCommand};
use helpdesk_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Helpdesk - grounded customer support answers from local documents
#[derive(Parser, Debug)]
#[command(name = "helpdesk")]
#[command(about = "Grounded customer support answers from local documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "HELPDESK_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Source document directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build and query the knowledge index
    Index(IndexCommand),

    /// Answer a customer message
    Chat(ChatCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_with(cli.config)?.with_overrides(
        cli.workspace,
        cli.data_dir,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_format)?;
    config.validate()?;

    tracing::info!("Helpdesk CLI starting");
    tracing::debug!(
        workspace = %config.workspace.display(),
        data_dir = %config.data_dir().display(),
        index_dir = %config.index_dir().display(),
        "Resolved configuration"
    );

    config.ensure_helpdesk_dir()?;

    let command_name = match &cli.command {
        Commands::Index(_) => "index",
        Commands::Chat(_) => "chat",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Index(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
