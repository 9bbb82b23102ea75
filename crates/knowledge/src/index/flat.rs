//! Exact inner-product vector store.
//!
//! Vectors live in one contiguous buffer in insertion order. Search scans
//! every vector, which is exact and fast enough for a support knowledge
//! base of a few thousand chunks.
//!
//! File layout (little-endian):
//! ```text
//! magic   u32  "HDVI"
//! version u32
//! dim     u32
//! count   u64
//! data    count * dim * f32
//! ```

use crate::embeddings::dot;
use helpdesk_core::{AppError, AppResult};
use std::io::{Read, Write};

const MAGIC: u32 = u32::from_le_bytes(*b"HDVI");
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

/// Flat inner-product index over fixed-dimension vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIpIndex {
    dim: usize,
    data: Vec<f32>,
}

impl FlatIpIndex {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            data: Vec::new(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored vectors.
    pub fn ntotal(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append vectors in order. All are checked before any is stored.
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> AppResult<()> {
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dim) {
            return Err(AppError::Knowledge(format!(
                "Vector has {} dimensions, index expects {}",
                bad.len(),
                self.dim
            )));
        }
        if vectors.iter().flatten().any(|v| !v.is_finite()) {
            return Err(AppError::Knowledge(
                "Vector holds a non-finite value".to_string(),
            ));
        }

        self.data.reserve(vectors.len() * self.dim);
        for vector in vectors {
            self.data.extend_from_slice(vector);
        }
        Ok(())
    }

    /// Top `k` positions by descending inner product.
    ///
    /// Ties keep ascending storage order, so earlier vectors win. A NaN
    /// score ranks below every real score.
    pub fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<(usize, f32)>> {
        if query.len() != self.dim {
            return Err(AppError::Knowledge(format!(
                "Query has {} dimensions, index expects {}",
                query.len(),
                self.dim
            )));
        }

        if self.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dim)
            .map(|v| {
                let score = dot(v, query);
                if score.is_nan() {
                    f32::NEG_INFINITY
                } else {
                    score
                }
            })
            .enumerate()
            .collect();

        // sort_by is stable; equal scores keep insertion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k.min(self.ntotal()));

        Ok(scored)
    }

    /// Serialize the index to a writer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> AppResult<()> {
        let dim = u32::try_from(self.dim)
            .map_err(|_| AppError::Persistence(format!("Dimension {} too large", self.dim)))?;

        let mut header = Vec::with_capacity(HEADER_LEN);
        header.extend_from_slice(&MAGIC.to_le_bytes());
        header.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        header.extend_from_slice(&dim.to_le_bytes());
        header.extend_from_slice(&(self.ntotal() as u64).to_le_bytes());
        writer.write_all(&header)?;

        let mut body = Vec::with_capacity(self.data.len() * 4);
        for value in &self.data {
            body.extend_from_slice(&value.to_le_bytes());
        }
        writer.write_all(&body)?;

        Ok(())
    }

    /// Deserialize an index written by [`FlatIpIndex::write_to`].
    pub fn read_from<R: Read>(reader: &mut R) -> AppResult<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    fn from_bytes(bytes: &[u8]) -> AppResult<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(AppError::CorruptIndex(format!(
                "vector file is {} bytes, shorter than its header",
                bytes.len()
            )));
        }

        let magic = read_u32(bytes, 0);
        if magic != MAGIC {
            return Err(AppError::CorruptIndex(
                "vector file has an invalid magic number".to_string(),
            ));
        }

        let version = read_u32(bytes, 4);
        if version != FORMAT_VERSION {
            return Err(AppError::CorruptIndex(format!(
                "unsupported vector file version {}",
                version
            )));
        }

        let dim = read_u32(bytes, 8) as usize;
        if dim == 0 {
            return Err(AppError::CorruptIndex(
                "vector file declares zero dimensions".to_string(),
            ));
        }
        let count = u64::from_le_bytes([
            bytes[12], bytes[13], bytes[14], bytes[15], bytes[16], bytes[17], bytes[18], bytes[19],
        ]);

        let expected = usize::try_from(count)
            .ok()
            .and_then(|c| c.checked_mul(dim))
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| {
                AppError::CorruptIndex(format!("vector file declares {} vectors", count))
            })?;

        let body = &bytes[HEADER_LEN..];
        if body.len() != expected {
            return Err(AppError::CorruptIndex(format!(
                "vector file holds {} data bytes, header declares {}",
                body.len(),
                expected
            )));
        }

        let data: Vec<f32> = body
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        if let Some(position) = data.iter().position(|v| !v.is_finite()) {
            return Err(AppError::CorruptIndex(format!(
                "vector {} holds a non-finite value",
                position / dim
            )));
        }

        Ok(Self { dim, data })
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
