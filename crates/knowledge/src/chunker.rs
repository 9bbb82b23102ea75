//! Source chunking.
//!
//! Plain text and markdown split on blank lines, one chunk per non-empty
//! paragraph. Tabular sources group rows into fixed-size chunks so no
//! single embedding input grows without bound.

use crate::types::Chunk;
use helpdesk_core::{AppError, AppResult};
use std::fs::{self, File};
use std::path::Path;

/// Separator placed between the cells of a tabular row.
pub const CELL_SEPARATOR: &str = " | ";

/// Rows grouped into one tabular chunk.
pub const ROWS_PER_CHUNK: usize = 5;

/// How a source file is split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// `.txt` and `.md`
    Paragraphs,
    /// `.csv`
    Tabular,
}

impl SourceKind {
    /// Detect the source kind from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" | "md" => Some(Self::Paragraphs),
            "csv" => Some(Self::Tabular),
            _ => None,
        }
    }
}

/// Splits source files into chunks.
#[derive(Debug, Clone)]
pub struct Chunker {
    rows_per_chunk: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(ROWS_PER_CHUNK)
    }
}

impl Chunker {
    pub fn new(rows_per_chunk: usize) -> Self {
        Self {
            rows_per_chunk: rows_per_chunk.max(1),
        }
    }

    /// Lazily chunk a file, surfacing read and parse errors.
    ///
    /// Unsupported extensions produce an empty sequence.
    pub fn chunks(&self, path: &Path) -> AppResult<ChunkIter> {
        let source_id = source_id(path);

        match SourceKind::from_path(path) {
            Some(SourceKind::Paragraphs) => {
                let raw = fs::read_to_string(path).map_err(|e| {
                    AppError::Source(format!("Failed to read {}: {}", path.display(), e))
                })?;
                Ok(ChunkIter::Paragraphs(ParagraphChunks::new(source_id, &raw)))
            }
            Some(SourceKind::Tabular) => {
                let file = File::open(path).map_err(|e| {
                    AppError::Source(format!("Failed to open {}: {}", path.display(), e))
                })?;
                Ok(ChunkIter::Rows(RowChunks::new(
                    source_id,
                    file,
                    self.rows_per_chunk,
                )))
            }
            None => {
                tracing::warn!(path = %path.display(), "Unsupported source type, skipping");
                Ok(ChunkIter::Empty)
            }
        }
    }

    /// Chunk a file, swallowing failures.
    ///
    /// A file either yields all of its chunks or none: any read or parse
    /// error is logged and the result is empty.
    pub fn process(&self, path: &Path) -> Vec<Chunk> {
        let result = self
            .chunks(path)
            .and_then(|iter| iter.collect::<AppResult<Vec<_>>>());

        match result {
            Ok(chunks) => {
                tracing::debug!(path = %path.display(), chunks = chunks.len(), "Chunked source");
                chunks
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to chunk source");
                Vec::new()
            }
        }
    }
}

/// Base name of a path, used as the chunk source identifier.
pub fn source_id(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Lazy chunk sequence for one file.
pub enum ChunkIter {
    Paragraphs(ParagraphChunks),
    Rows(RowChunks),
    Empty,
}

impl Iterator for ChunkIter {
    type Item = AppResult<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Paragraphs(inner) => inner.next().map(Ok),
            Self::Rows(inner) => inner.next(),
            Self::Empty => None,
        }
    }
}

/// Blank-line paragraph splitter over an in-memory document.
pub struct ParagraphChunks {
    source_id: String,
    content: String,
    offset: usize,
    next_index: usize,
}

impl ParagraphChunks {
    fn new(source_id: String, raw: &str) -> Self {
        Self {
            source_id,
            content: raw.replace("\r\n", "\n"),
            offset: 0,
            next_index: 0,
        }
    }
}

impl Iterator for ParagraphChunks {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        while self.offset < self.content.len() {
            let rest = &self.content[self.offset..];
            let (end, advance) = match rest.find("\n\n") {
                Some(pos) => (pos, pos + 2),
                None => (rest.len(), rest.len()),
            };
            let text = rest[..end].trim().to_string();
            self.offset += advance;

            if text.is_empty() {
                continue;
            }

            let chunk = Chunk {
                text,
                source_id: self.source_id.clone(),
                chunk_index: self.next_index,
            };
            self.next_index += 1;
            return Some(chunk);
        }

        None
    }
}

/// Fixed-size row grouping over a delimited file.
pub struct RowChunks {
    source_id: String,
    records: csv::StringRecordsIntoIter<File>,
    buffer: Vec<String>,
    rows_per_chunk: usize,
    next_index: usize,
    done: bool,
}

impl RowChunks {
    fn new(source_id: String, file: File, rows_per_chunk: usize) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        Self {
            source_id,
            records: reader.into_records(),
            buffer: Vec::with_capacity(rows_per_chunk),
            rows_per_chunk,
            next_index: 0,
            done: false,
        }
    }

    fn flush(&mut self) -> Chunk {
        let chunk = Chunk {
            text: self.buffer.join(" "),
            source_id: self.source_id.clone(),
            chunk_index: self.next_index,
        };
        self.buffer.clear();
        self.next_index += 1;
        chunk
    }
}

impl Iterator for RowChunks {
    type Item = AppResult<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            match self.records.next() {
                Some(Ok(record)) => {
                    let line = record
                        .iter()
                        .map(str::trim)
                        .filter(|cell| !cell.is_empty())
                        .collect::<Vec<_>>()
                        .join(CELL_SEPARATOR);
                    if line.is_empty() {
                        continue;
                    }

                    self.buffer.push(line);
                    if self.buffer.len() >= self.rows_per_chunk {
                        return Some(Ok(self.flush()));
                    }
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(AppError::Source(format!(
                        "Failed to parse {}: {}",
                        self.source_id, e
                    ))));
                }
                None => {
                    self.done = true;
                    if self.buffer.is_empty() {
                        return None;
                    }
                    return Some(Ok(self.flush()));
                }
            }
        }
    }
}
