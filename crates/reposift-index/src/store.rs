//! Flat on-disk vector index with brute-force cosine search.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chunk::{Chunk, ChunkMetadata};
use crate::error::{IndexError, Result};

pub const INDEX_FILE: &str = "index.json";

/// One embedded chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub content: String,
    pub metadata: ChunkMetadata,
}

impl VectorRecord {
    #[must_use]
    pub fn new(chunk: &Chunk, vector: Vec<f32>) -> Self {
        Self {
            id: chunk.content_hash(),
            vector,
            content: chunk.content.clone(),
            metadata: chunk.metadata.clone(),
        }
    }
}

/// Search result, highest score first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub content: String,
    pub metadata: ChunkMetadata,
    pub score: f32,
}

/// All records of one indexing run, plus the model that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatIndex {
    pub model: String,
    pub dimension: usize,
    pub records: Vec<VectorRecord>,
}

impl FlatIndex {
    #[must_use]
    pub fn new(model: impl Into<String>, dimension: usize) -> Self {
        Self {
            model: model.into(),
            dimension,
            records: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(INDEX_FILE)
    }

    /// Write to `<dir>/index.json`, replacing any previous index. The file is
    /// written to a temporary file beside the target and renamed into place;
    /// the temporary file is removed if any step fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the write fails.
    pub async fn save(&self, dir: &Path) -> Result<()> {
        tokio::fs::create_dir_all(dir).await?;
        let target = Self::path_in(dir);
        let json = serde_json::to_vec(self)?;

        let tmp_dir = dir.to_path_buf();
        let dest = target.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut tmp = tempfile::Builder::new()
                .prefix(INDEX_FILE)
                .suffix(".tmp")
                .tempfile_in(&tmp_dir)?;
            tmp.write_all(&json)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&dest).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| IndexError::Io(std::io::Error::other(e)))??;

        tracing::debug!(path = %target.display(), records = self.len(), "index written");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `IndexError::IndexNotFound` if `dir` holds no index, or an
    /// IO/JSON error if it cannot be read.
    pub async fn load(dir: &Path) -> Result<Self> {
        let path = Self::path_in(dir);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(IndexError::IndexNotFound { path });
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&raw)?)
    }

    /// The `k` records most similar to `query`, best first.
    #[must_use]
    pub fn search(&self, query: &[f32], k: usize) -> Vec<SearchHit> {
        if k == 0 {
            return Vec::new();
        }
        let mut hits: Vec<SearchHit> = self
            .records
            .iter()
            .map(|r| SearchHit {
                content: r.content.clone(),
                metadata: r.metadata.clone(),
                score: cosine_similarity(query, &r.vector),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);
        hits
    }
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
