//! Chunking, embedding, and retrieval over repository snapshots.
//!
//! Every file of a [`reposift_repo::Snapshot`] is routed by extension to one
//! of three chunkers: a tree-sitter function-pair chunker, a separator-driven
//! recursive splitter, or a model-token windower. The resulting chunks are
//! embedded by an [`reposift_llm::EmbeddingProvider`] into a flat on-disk
//! index that the [`retriever::Retriever`] searches by cosine similarity.

pub mod chunk;
pub mod chunker;
pub mod error;
pub mod functions;
pub mod indexer;
pub mod languages;
pub mod preprocess;
pub mod retriever;
pub mod splitter;
pub mod store;
pub mod windower;

pub use chunk::{Chunk, ChunkMetadata};
pub use error::{IndexError, Result};
pub use preprocess::{ChunkingOptions, preprocess, preprocess_file};
