//! Embedding provider abstraction and backend implementations.
//!
//! The rest of the workspace only needs one capability from a model: turn a
//! piece of text into a fixed-length vector. Backends implement
//! [`EmbeddingProvider`]; [`any::AnyEmbedder`] dispatches over them.

pub mod any;
pub mod error;
pub mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod retry;

pub use error::LlmError;
pub use provider::EmbeddingProvider;
