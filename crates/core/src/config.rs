//! Configuration management for the helpdesk service.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Defaults
//! - Config file (.helpdesk/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric: the persisted index lives under
//! `.helpdesk/index/` and source documents default to `./data`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::logging::LogFormat;

/// Embedding providers understood by the knowledge crate.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 3] = ["openai", "ollama", "mock"];

/// Completion providers understood by the llm crate.
pub const KNOWN_CHAT_PROVIDERS: [&str; 2] = ["openai", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .helpdesk/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Directory scanned for source documents
    pub data_dir: PathBuf,

    /// Directory holding the persisted index (defaults to .helpdesk/index)
    pub index_dir: Option<PathBuf>,

    /// Explicit API key, overrides provider-specific variables
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Log line format
    pub log_format: LogFormat,

    /// Embedding provider settings
    pub embedding: EmbeddingSettings,

    /// Chat completion settings
    pub chat: ChatSettings,
}

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbeddingSettings {
    /// Provider name: "openai", "ollama" or "mock"
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Vector dimension produced by the model
    pub dimensions: usize,

    /// Texts per provider request
    pub batch_size: usize,

    /// Per-request timeout
    pub timeout_secs: u64,

    /// Retries for transient provider failures
    pub max_retries: u32,

    /// Custom endpoint (base URL)
    pub endpoint: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            batch_size: 50,
            timeout_secs: 30,
            max_retries: 3,
            endpoint: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

/// Chat completion settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatSettings {
    /// Provider name: "openai" or "ollama"
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Token cap for regular replies
    pub max_tokens: u32,

    /// Token cap when the client reports a mobile layout
    pub mobile_max_tokens: u32,

    /// Passages retrieved per question
    pub top_k: usize,

    /// Prompt definition id under .helpdesk/prompts/
    pub prompt_id: String,

    /// Leading label removed from model answers, e.g. "[Shop]"
    pub strip_prefix: Option<String>,

    /// Reply when the knowledge base has nothing relevant
    pub fallback_message: String,

    /// Reply when the completion provider fails
    pub error_message: String,

    /// Custom endpoint (base URL)
    pub endpoint: Option<String>,

    /// Per-request timeout
    pub timeout_secs: u64,

    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
            temperature: 0.3,
            max_tokens: 800,
            mobile_max_tokens: 400,
            top_k: 5,
            prompt_id: "chat.support".to_string(),
            strip_prefix: None,
            fallback_message: "I could not find this information in our knowledge base. \
                               Please check our FAQ page or contact customer support."
                .to_string(),
            error_message: "Sorry, something went wrong on our side. \
                            Please try again or visit our help page."
                .to_string(),
            endpoint: None,
            timeout_secs: 60,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    embedding: Option<EmbeddingSettings>,
    chat: Option<ChatSettings>,
    workspace: Option<WorkspaceConfig>,
    data: Option<DataConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DataConfig {
    dir: Option<String>,
    index_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    format: Option<LogFormat>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            data_dir: PathBuf::from("data"),
            index_dir: None,
            api_key: None,
            log_level: None,
            log_format: LogFormat::default(),
            verbose: false,
            no_color: false,
            embedding: EmbeddingSettings::default(),
            chat: ChatSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file, environment variables and defaults.
    ///
    /// Environment variables:
    /// - `HELPDESK_WORKSPACE`: Override workspace path
    /// - `HELPDESK_CONFIG`: Path to config file
    /// - `HELPDESK_DATA_DIR`: Source document directory
    /// - `HELPDESK_INDEX_DIR`: Persisted index directory
    /// - `HELPDESK_EMBEDDING_PROVIDER` / `HELPDESK_EMBEDDING_MODEL`
    /// - `HELPDESK_CHAT_PROVIDER` / `HELPDESK_CHAT_MODEL`
    /// - `HELPDESK_API_KEY`: API key for every provider
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    /// - `HELPDESK_LOG_FORMAT`: `text` or `json`
    ///
    /// # Example
    /// ```no_run
    /// use helpdesk_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Data dir: {:?}", config.data_dir());
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(None)
    }

    /// Like [`AppConfig::load`], with an explicit config file taking
    /// precedence over `HELPDESK_CONFIG`.
    pub fn load_with(config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("HELPDESK_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        config.config_file = config_file.or_else(|| {
            std::env::var("HELPDESK_CONFIG").ok().map(PathBuf::from)
        });

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.helpdesk_dir().join("config.yaml"),
        };

        if config_path.exists() {
            tracing::debug!(path = %config_path.display(), "Loading config file");
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(dir) = std::env::var("HELPDESK_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        if let Ok(dir) = std::env::var("HELPDESK_INDEX_DIR") {
            config.index_dir = Some(PathBuf::from(dir));
        }

        if let Ok(provider) = std::env::var("HELPDESK_EMBEDDING_PROVIDER") {
            config.embedding.provider = provider;
        }

        if let Ok(model) = std::env::var("HELPDESK_EMBEDDING_MODEL") {
            config.embedding.model = model;
        }

        if let Ok(provider) = std::env::var("HELPDESK_CHAT_PROVIDER") {
            config.chat.provider = provider;
        }

        if let Ok(model) = std::env::var("HELPDESK_CHAT_MODEL") {
            config.chat.model = model;
        }

        config.api_key = std::env::var("HELPDESK_API_KEY").ok();

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        if let Ok(format) = std::env::var("HELPDESK_LOG_FORMAT") {
            config.log_format = LogFormat::parse(&format).ok_or_else(|| {
                AppError::Config(format!("Unknown log format: {}", format))
            })?;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(ws) = config_file.workspace {
            if let Some(path) = ws.path {
                result.workspace = PathBuf::from(path);
            }
        }

        if let Some(data) = config_file.data {
            if let Some(dir) = data.dir {
                result.data_dir = PathBuf::from(dir);
            }
            if let Some(dir) = data.index_dir {
                result.index_dir = Some(PathBuf::from(dir));
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(format) = logging.format {
                result.log_format = format;
            }
        }

        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }

        if let Some(chat) = config_file.chat {
            result.chat = chat;
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and
    /// the config file.
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        data_dir: Option<PathBuf>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(data_dir) = data_dir {
            self.data_dir = data_dir;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .helpdesk directory.
    pub fn helpdesk_dir(&self) -> PathBuf {
        self.workspace.join(".helpdesk")
    }

    /// Ensure the .helpdesk directory exists.
    pub fn ensure_helpdesk_dir(&self) -> AppResult<()> {
        let dir = self.helpdesk_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .helpdesk directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Source document directory, resolved against the workspace.
    pub fn data_dir(&self) -> PathBuf {
        self.resolve(&self.data_dir)
    }

    /// Persisted index directory, resolved against the workspace.
    pub fn index_dir(&self) -> PathBuf {
        match self.index_dir {
            Some(ref dir) => self.resolve(dir),
            None => self.helpdesk_dir().join("index"),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Resolve an API key: `HELPDESK_API_KEY` first, then the named variable.
    pub fn resolve_api_key(&self, env_var: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        std::env::var(env_var).ok().filter(|k| !k.trim().is_empty())
    }

    /// Validate provider names and numeric limits.
    pub fn validate(&self) -> AppResult<()> {
        let embedding = &self.embedding;
        if !KNOWN_EMBEDDING_PROVIDERS.contains(&embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                embedding.provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if !KNOWN_CHAT_PROVIDERS.contains(&self.chat.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown chat provider: {}. Supported: {}",
                self.chat.provider,
                KNOWN_CHAT_PROVIDERS.join(", ")
            )));
        }

        if embedding.dimensions == 0 {
            return Err(AppError::Config(
                "embedding.dimensions must be greater than zero".to_string(),
            ));
        }

        if embedding.batch_size == 0 {
            return Err(AppError::Config(
                "embedding.batchSize must be greater than zero".to_string(),
            ));
        }

        if self.chat.top_k == 0 {
            return Err(AppError::Config(
                "chat.topK must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
