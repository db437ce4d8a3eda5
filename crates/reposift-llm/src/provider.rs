use std::future::Future;

use crate::error::LlmError;

/// A backend that maps text to an embedding vector.
///
/// Implementations must be deterministic for a fixed model: the same text
/// embedded at index time and at query time has to land on the same vector,
/// otherwise similarity scores are meaningless.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single piece of text.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or its response cannot be parsed.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, LlmError>> + Send;

    /// Short backend identifier, e.g. `openai`.
    fn name(&self) -> &str;

    /// Embedding model identifier recorded next to persisted vectors.
    fn model(&self) -> &str;
}

impl<P: EmbeddingProvider> EmbeddingProvider for std::sync::Arc<P> {
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, LlmError>> + Send {
        (**self).embed(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn model(&self) -> &str {
        (**self).model()
    }
}
