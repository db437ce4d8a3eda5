//! Nearest-neighbor lookup against a saved index.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use reposift_llm::EmbeddingProvider;

use crate::error::{IndexError, Result};
use crate::store::{FlatIndex, SearchHit};

pub const DEFAULT_TOP_K: usize = 5;
const SEPARATOR_WIDTH: usize = 40;

/// Embeds queries with the same kind of provider used for indexing.
pub struct Retriever<P: EmbeddingProvider> {
    provider: P,
    dir: PathBuf,
}

impl<P: EmbeddingProvider> Retriever<P> {
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

    /// The `k` chunks most similar to `query`, best first.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::IndexNotFound` if no index was saved,
    /// `IndexError::Embedding` if the query cannot be embedded, or
    /// `IndexError::DimensionMismatch` if the query vector does not match the
    /// index.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        let index = FlatIndex::load(&self.dir).await?;
        if k == 0 {
            return Ok(Vec::new());
        }
        if index.model != self.provider.model() {
            tracing::warn!(
                index_model = %index.model,
                query_model = self.provider.model(),
                "index was built with a different embedding model"
            );
        }

        let vector = self.provider.embed(query).await?;
        if !index.is_empty() && vector.len() != index.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: index.dimension,
                actual: vector.len(),
            });
        }

        let hits = index.search(&vector, k);
        tracing::debug!(k, hits = hits.len(), records = index.len(), "query answered");
        Ok(hits)
    }
}

/// Render hits for a terminal: a `Source:` line, the content, then a rule.
#[must_use]
pub fn format_hits(hits: &[SearchHit]) -> String {
    let rule = "-".repeat(SEPARATOR_WIDTH);
    let mut out = String::new();
    for hit in hits {
        let _ = writeln!(out, "Source: {}", hit.metadata.source);
        let _ = writeln!(out, "{}", hit.content);
        let _ = writeln!(out, "{rule}");
    }
    out
}
