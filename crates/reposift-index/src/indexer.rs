//! Embed chunks and persist them as a flat index.

use std::path::{Path, PathBuf};

use reposift_llm::EmbeddingProvider;

use crate::chunk::Chunk;
use crate::error::{IndexError, Result};
use crate::store::{FlatIndex, VectorRecord};

/// Summary of an indexing run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub chunks_indexed: usize,
    pub dimension: usize,
    pub duration_ms: u64,
}

/// Writes the index for one directory.
pub struct Indexer<P: EmbeddingProvider> {
    provider: P,
    dir: PathBuf,
}

impl<P: EmbeddingProvider> Indexer<P> {
    #[must_use]
    pub fn new(provider: P, dir: impl Into<PathBuf>) -> Self {
        Self {
            provider,
            dir: dir.into(),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Embed every chunk in order and replace the index on disk.
    ///
    /// Nothing is written unless every chunk embeds successfully.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Embedding` if any embedding fails,
    /// `IndexError::DimensionMismatch` if vector lengths differ, or an IO
    /// error if the index cannot be written.
    pub async fn index(&self, chunks: &[Chunk]) -> Result<IndexReport> {
        let start = std::time::Instant::now();
        let total = chunks.len();
        tracing::info!(
            total,
            provider = self.provider.name(),
            model = self.provider.model(),
            "indexing started"
        );

        let mut index = FlatIndex::new(self.provider.model(), 0);
        for (i, chunk) in chunks.iter().enumerate() {
            let vector = self.provider.embed(&chunk.content).await.inspect_err(|e| {
                tracing::warn!(source = chunk.source(), chunk = i, "embedding failed: {e}");
            })?;

            if i == 0 {
                index.dimension = vector.len();
            } else if vector.len() != index.dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: index.dimension,
                    actual: vector.len(),
                });
            }

            index.records.push(VectorRecord::new(chunk, vector));
            if (i + 1) % 100 == 0 {
                tracing::debug!(done = i + 1, total, "embedding progress");
            }
        }

        index.save(&self.dir).await?;

        let report = IndexReport {
            chunks_indexed: index.len(),
            dimension: index.dimension,
            duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        tracing::info!(
            chunks = report.chunks_indexed,
            dimension = report.dimension,
            duration_ms = report.duration_ms,
            dir = %self.dir.display(),
            "indexing complete"
        );
        Ok(report)
    }
}
