//! Error types for reposift-index.

use std::path::PathBuf;

/// Errors that can occur while chunking, indexing, or retrieving.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// IO error reading or writing the index.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Source file failed to parse, or contains syntax errors.
    #[error("parse failed: {0}")]
    Parse(String),

    /// Invalid chunking or retrieval settings.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Embedding provider failure.
    #[error("embedding failed: {0}")]
    Embedding(#[from] reposift_llm::LlmError),

    /// The provider returned vectors of differing length.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("no index found at {}", path.display())]
    IndexNotFound { path: PathBuf },

    /// Tokenizer could not be loaded or refused to decode a window.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),
}

impl IndexError {
    /// True for failures raised by, or about, the embedding provider.
    #[must_use]
    pub fn is_embedding(&self) -> bool {
        matches!(self, Self::Embedding(_) | Self::DimensionMismatch { .. })
    }
}

/// Result type alias using `IndexError`.
pub type Result<T> = std::result::Result<T, IndexError>;
