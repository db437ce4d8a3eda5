use serde::{Deserialize, Serialize};

/// Provenance carried by every chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Originating file path, or `<repo>_folder_structure` for the
    /// structure chunk.
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_number: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A unit of text to embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: ChunkMetadata {
                source: source.into(),
                chunk_number: None,
                note: None,
            },
        }
    }

    #[must_use]
    pub fn with_chunk_number(mut self, n: usize) -> Self {
        self.metadata.chunk_number = Some(n);
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.metadata.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.metadata.source
    }

    /// blake3 hex digest of source and content, used as the record id.
    #[must_use]
    pub fn content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.metadata.source.as_bytes());
        hasher.update(&[0]);
        hasher.update(self.content.as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}
