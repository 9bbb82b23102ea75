use crate::chunker::{source_id, Chunker};
use crate::config::{is_supported, metadata_path, vector_path, IndexConfig};
use crate::embeddings::{BatchEmbedder, EmbeddingProvider};
use crate::index::flat::FlatIpIndex;
use crate::types::{DirectoryLoad, IndexStats, IndexedDocument, SearchResult};
use helpdesk_core::{AppError, AppResult};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info, instrument, warn};
use walkdir::WalkDir;

/// Vectors and their metadata, kept the same length and order.
#[derive(Debug)]
struct IndexState {
    vectors: FlatIpIndex,
    documents: Vec<IndexedDocument>,
}

impl IndexState {
    fn empty(dim: usize) -> Self {
        Self {
            vectors: FlatIpIndex::new(dim),
            documents: Vec::new(),
        }
    }
}

/// Similarity index over embedded chunks, mirrored to disk.
///
/// Both collections sit behind one lock, so readers never see a vector
/// without its metadata record. Embedding happens outside the lock.
///
/// `add_documents`, `load_from_directory` and `search` never fail: errors
/// are logged and turned into `false` or an empty result so a degraded
/// knowledge base cannot break a chat reply.
pub struct SimilarityIndex {
    config: IndexConfig,
    chunker: Chunker,
    embedder: BatchEmbedder,
    state: RwLock<IndexState>,
}

impl SimilarityIndex {
    /// Create an empty index without touching disk.
    pub fn new(config: IndexConfig, provider: Arc<dyn EmbeddingProvider>) -> Self {
        if provider.dimensions() != config.embedding.dimensions {
            warn!(
                configured = config.embedding.dimensions,
                provider = provider.dimensions(),
                "Embedding dimensions differ from configuration, using the provider's"
            );
        }

        let embedder = BatchEmbedder::from_config(provider, &config.embedding);
        let state = RwLock::new(IndexState::empty(embedder.dimensions()));

        Self {
            config,
            chunker: Chunker::default(),
            embedder,
            state,
        }
    }

    /// Restore the index from disk, then populate it from the default
    /// source directory if it is still empty.
    ///
    /// A corrupt store is discarded and the index starts empty.
    pub async fn open(config: IndexConfig, provider: Arc<dyn EmbeddingProvider>) -> AppResult<Self> {
        config.embedding.validate()?;
        let index = Self::new(config, provider);

        match index.restore() {
            Ok(0) => debug!("No stored index to restore"),
            Ok(n) => info!(documents = n, "Restored index"),
            Err(e) => warn!(error = %e, "Discarding stored index"),
        }

        if index.is_empty() {
            if let Some(dir) = index.config.default_source_dir.clone() {
                if dir.is_dir() {
                    index.ensure_populated(&dir).await;
                } else {
                    debug!(dir = %dir.display(), "Default source directory not found");
                }
            }
        }

        Ok(index)
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Number of stored chunks.
    pub fn len(&self) -> usize {
        self.read_state().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Chunk, embed and append one source file, then persist.
    ///
    /// All-or-nothing per file: if chunking yields nothing or any batch
    /// fails to embed, nothing is inserted and `false` is returned.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn add_documents(&self, path: &Path) -> bool {
        let chunks = self.chunker.process(path);
        if chunks.is_empty() {
            warn!("No chunks produced, nothing indexed");
            return false;
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = match self.embedder.embed_all(&texts).await {
            Ok(vectors) => vectors,
            Err(e) => {
                error!(error = %e, chunks = chunks.len(), "Failed to embed source");
                return false;
            }
        };

        let mut state = self.write_state();
        if let Err(e) = state.vectors.add(&vectors) {
            error!(error = %e, "Failed to append vectors");
            return false;
        }

        let base = state.documents.len();
        let count = chunks.len();
        state.documents.extend(
            chunks
                .into_iter()
                .enumerate()
                .map(|(offset, chunk)| IndexedDocument::from_chunk(chunk, base + offset)),
        );

        if let Err(e) = self.persist_state(&state) {
            error!(error = %e, "Failed to persist index, in-memory state kept");
        }

        info!(
            source = %source_id(path),
            chunks = count,
            total = state.documents.len(),
            "Indexed source"
        );
        true
    }

    /// Index every supported file directly inside `dir`.
    ///
    /// Returns `true` iff at least one file was indexed.
    pub async fn load_from_directory(&self, dir: &Path) -> bool {
        self.load_directory(dir).await.succeeded()
    }

    /// Index a directory and report the outcome per file.
    ///
    /// Subdirectories are not descended into. A missing directory loads
    /// nothing.
    #[instrument(skip(self, dir), fields(dir = %dir.display()))]
    pub async fn load_directory(&self, dir: &Path) -> DirectoryLoad {
        let mut report = DirectoryLoad::default();

        if !dir.is_dir() {
            error!("Source directory does not exist");
            return report;
        }

        let files: Vec<PathBuf> = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Failed to read directory entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .collect();

        for path in files {
            let name = source_id(&path);
            if !is_supported(&path) {
                info!(file = %name, "Skipping unsupported file");
                report.skipped.push(name);
                continue;
            }

            if self.add_documents(&path).await {
                report.loaded.push(name);
            } else {
                report.failed.push(name);
            }
        }

        info!(
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "Directory load finished"
        );
        report
    }

    /// Load `dir` only when the index holds nothing yet.
    pub async fn ensure_populated(&self, dir: &Path) -> bool {
        if !self.is_empty() {
            return false;
        }

        info!(dir = %dir.display(), "Index is empty, loading default sources");
        self.load_from_directory(dir).await
    }

    /// Top `top_k` chunks for `query` by cosine similarity.
    ///
    /// An empty index, `top_k == 0` or an embedding failure give an
    /// empty result.
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn search(&self, query: &str, top_k: usize) -> Vec<SearchResult> {
        if top_k == 0 {
            warn!("Search requested with top_k = 0");
            return Vec::new();
        }

        if self.is_empty() {
            debug!("Search on empty index");
            return Vec::new();
        }

        let query_vector = match self.embedder.embed_query(query).await {
            Ok(v) => v,
            Err(e) => {
                error!(error = %e, "Failed to embed query");
                return Vec::new();
            }
        };

        let state = self.read_state();
        let hits = match state.vectors.search(&query_vector, top_k) {
            Ok(hits) => hits,
            Err(e) => {
                error!(error = %e, "Vector search failed");
                return Vec::new();
            }
        };

        let results: Vec<SearchResult> = hits
            .into_iter()
            .filter_map(|(position, score)| {
                state.documents.get(position).map(|doc| (doc, score))
            })
            .enumerate()
            .map(|(i, (doc, score))| SearchResult::new(doc, score, i + 1))
            .collect();

        info!(
            results = results.len(),
            top_score = results.first().map(|r| r.similarity_score),
            "Search completed"
        );
        results
    }

    /// Snapshot of the index.
    pub fn stats(&self) -> IndexStats {
        let state = self.read_state();
        IndexStats {
            total_documents: state.documents.len(),
            index_size: state.vectors.ntotal(),
            embedding_model: self.embedder.model_name().to_string(),
            embedding_dimension: self.embedder.dimensions(),
        }
    }

    /// Write the current state to disk.
    pub fn persist(&self) -> AppResult<()> {
        let state = self.read_state();
        self.persist_state(&state)
    }

    /// Replace the in-memory state with the stored files.
    ///
    /// Returns the number of restored documents, 0 when nothing is stored.
    /// On any inconsistency the index is left empty and
    /// `AppError::CorruptIndex` is returned.
    pub fn restore(&self) -> AppResult<usize> {
        let vector_file = self.config.vector_path();
        let metadata_file = self.config.metadata_path();

        let loaded = match (vector_file.exists(), metadata_file.exists()) {
            (false, false) => return Ok(0),
            (true, true) => self.read_files(&vector_file, &metadata_file),
            (has_vectors, _) => Err(AppError::CorruptIndex(format!(
                "{} is missing",
                if has_vectors { "metadata file" } else { "vector file" }
            ))),
        };

        let mut state = self.write_state();
        match loaded {
            Ok(restored) => {
                let count = restored.documents.len();
                *state = restored;
                Ok(count)
            }
            Err(e) => {
                *state = IndexState::empty(self.embedder.dimensions());
                Err(e)
            }
        }
    }

    /// Drop all chunks from memory and delete the stored files.
    pub fn reset(&self) -> AppResult<()> {
        let mut state = self.write_state();
        *state = IndexState::empty(self.embedder.dimensions());
        Self::clear_storage(&self.config.storage_dir)
    }

    /// Delete the vector and metadata files in `dir`, if present.
    pub fn clear_storage(dir: &Path) -> AppResult<()> {
        for path in [vector_path(dir), metadata_path(dir)] {
            match fs::remove_file(&path) {
                Ok(()) => info!(path = %path.display(), "Removed index file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(AppError::Persistence(format!(
                        "Failed to remove {}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }
        Ok(())
    }

    fn read_files(&self, vector_file: &Path, metadata_file: &Path) -> AppResult<IndexState> {
        let mut reader = BufReader::new(File::open(vector_file)?);
        let vectors = FlatIpIndex::read_from(&mut reader)?;

        let documents: Vec<IndexedDocument> =
            serde_json::from_reader(BufReader::new(File::open(metadata_file)?))
                .map_err(|e| AppError::CorruptIndex(format!("unreadable metadata: {}", e)))?;

        let expected_dim = self.embedder.dimensions();
        if vectors.dim() != expected_dim {
            return Err(AppError::CorruptIndex(format!(
                "stored vectors have {} dimensions, provider produces {}",
                vectors.dim(),
                expected_dim
            )));
        }

        if vectors.ntotal() != documents.len() {
            return Err(AppError::CorruptIndex(format!(
                "{} vectors, {} records",
                vectors.ntotal(),
                documents.len()
            )));
        }

        if let Some((position, doc)) = documents
            .iter()
            .enumerate()
            .find(|(position, doc)| doc.global_id != *position)
        {
            return Err(AppError::CorruptIndex(format!(
                "record at position {} has global_id {}",
                position, doc.global_id
            )));
        }

        Ok(IndexState { vectors, documents })
    }

    /// Write both files to temporaries, then rename them into place.
    ///
    /// A failure before the first rename leaves the previous files as they
    /// were. The two renames are not atomic together: if the metadata
    /// rename fails after the vector rename succeeded, the stored counts
    /// disagree and the next `restore` reports `CorruptIndex`.
    fn persist_state(&self, state: &IndexState) -> AppResult<()> {
        let dir = &self.config.storage_dir;
        let vector_file = vector_path(dir);
        let metadata_file = metadata_path(dir);
        let vector_tmp = tmp_path(&vector_file);
        let metadata_tmp = tmp_path(&metadata_file);

        let result = fs::create_dir_all(dir)
            .map_err(AppError::from)
            .and_then(|_| write_synced(&vector_tmp, |w| state.vectors.write_to(w)))
            .and_then(|_| {
                write_synced(&metadata_tmp, |w| {
                    serde_json::to_writer(w, &state.documents).map_err(AppError::from)
                })
            })
            .and_then(|_| fs::rename(&vector_tmp, &vector_file).map_err(AppError::from))
            .and_then(|_| fs::rename(&metadata_tmp, &metadata_file).map_err(AppError::from));

        if let Err(e) = result {
            let _ = fs::remove_file(&vector_tmp);
            let _ = fs::remove_file(&metadata_tmp);
            return Err(AppError::Persistence(format!(
                "Failed to write index to {}: {}",
                dir.display(),
                e
            )));
        }

        debug!(
            dir = %dir.display(),
            documents = state.documents.len(),
            "Persisted index"
        );
        Ok(())
    }

    fn read_state(&self) -> RwLockReadGuard<'_, IndexState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, IndexState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_synced<F>(path: &Path, write: F) -> AppResult<()>
where
    F: FnOnce(&mut BufWriter<File>) -> AppResult<()>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    write(&mut writer)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}
