//! Index storage layout and configuration.

use crate::embeddings::EmbeddingConfig;
use helpdesk_core::AppConfig;
use std::path::{Path, PathBuf};

/// Binary vector file name.
pub const VECTOR_FILE: &str = "vector_index.bin";

/// Metadata file name.
pub const METADATA_FILE: &str = "documents.json";

/// Source file extensions the chunker understands.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["txt", "md", "csv"];

/// Configuration for a similarity index instance.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Directory holding the vector and metadata files
    pub storage_dir: PathBuf,

    /// Directory loaded when the restored index is empty
    pub default_source_dir: Option<PathBuf>,

    pub embedding: EmbeddingConfig,
}

impl IndexConfig {
    pub fn new(storage_dir: impl Into<PathBuf>, embedding: EmbeddingConfig) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            default_source_dir: None,
            embedding,
        }
    }

    pub fn with_default_source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.default_source_dir = Some(dir.into());
        self
    }

    /// Build from application configuration.
    pub fn from_app(config: &AppConfig) -> Self {
        Self::new(config.index_dir(), EmbeddingConfig::from(&config.embedding))
            .with_default_source_dir(config.data_dir())
    }

    pub fn vector_path(&self) -> PathBuf {
        vector_path(&self.storage_dir)
    }

    pub fn metadata_path(&self) -> PathBuf {
        metadata_path(&self.storage_dir)
    }
}

pub fn vector_path(dir: &Path) -> PathBuf {
    dir.join(VECTOR_FILE)
}

pub fn metadata_path(dir: &Path) -> PathBuf {
    dir.join(METADATA_FILE)
}

/// Whether a path has one of the supported source extensions.
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_paths() {
        let config = IndexConfig::new("/srv/helpdesk/index", EmbeddingConfig::mock(4));
        assert_eq!(
            config.vector_path(),
            PathBuf::from("/srv/helpdesk/index/vector_index.bin")
        );
        assert_eq!(
            config.metadata_path(),
            PathBuf::from("/srv/helpdesk/index/documents.json")
        );
        assert!(config.default_source_dir.is_none());
    }

    #[test]
    fn test_from_app_config() {
        let app = AppConfig::default().with_overrides(
            Some(PathBuf::from("/srv/shop")),
            None,
            None,
            false,
            false,
        );
        let config = IndexConfig::from_app(&app);
        assert_eq!(config.storage_dir, PathBuf::from("/srv/shop/.helpdesk/index"));
        assert_eq!(
            config.default_source_dir,
            Some(PathBuf::from("/srv/shop/data"))
        );
        assert_eq!(config.embedding.batch_size, 50);
    }

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported(Path::new("faq.txt")));
        assert!(is_supported(Path::new("guide.MD")));
        assert!(is_supported(Path::new("sizes.csv")));
        assert!(!is_supported(Path::new("manual.pdf")));
        assert!(!is_supported(Path::new("README")));
    }
}
