//! Snapshot to chunks: per-file strategy dispatch plus the structure chunk.

use serde::{Deserialize, Serialize};

use reposift_repo::{FileEntry, Snapshot};

use crate::chunk::Chunk;
use crate::chunker::{fallback_chunk, function_chunks};
use crate::error::{IndexError, Result};
use crate::functions::extract_functions;
use crate::languages::Lang;
use crate::splitter::LanguageSplitter;
use crate::windower::{TokenCodec, TokenWindower};

/// Chunking settings shared by every strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingOptions {
    /// Characters for the splitter, tokens for the windower.
    pub chunk_size: usize,
    pub overlap_size: usize,
    pub functions_per_chunk: usize,
    pub function_chunking: bool,
    pub include_submodules: bool,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap_size: 50,
            functions_per_chunk: 2,
            function_chunking: true,
            include_submodules: true,
        }
    }
}

impl ChunkingOptions {
    /// Check the settings every strategy can accept.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Config` if `chunk_size` or `functions_per_chunk`
    /// is zero, or `overlap_size` is not smaller than `chunk_size`.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(IndexError::Config("chunk_size must be positive".into()));
        }
        if self.overlap_size >= self.chunk_size {
            return Err(IndexError::Config(format!(
                "overlap_size ({}) must be smaller than chunk_size ({})",
                self.overlap_size, self.chunk_size
            )));
        }
        if self.functions_per_chunk == 0 {
            return Err(IndexError::Config(
                "functions_per_chunk must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// How one file is chunked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Functions(Lang),
    Splitter(Lang),
    Tokens,
}

impl Strategy {
    #[must_use]
    pub fn for_path(path: &str, options: &ChunkingOptions) -> Self {
        match Lang::for_path(path) {
            Some(lang) if options.function_chunking && lang.function_grammar().is_some() => {
                Self::Functions(lang)
            }
            Some(lang) if !lang.separators().is_empty() => Self::Splitter(lang),
            _ => Self::Tokens,
        }
    }
}

/// Source tag of the synthetic chunk listing every file path.
#[must_use]
pub fn structure_source(repo_name: &str) -> String {
    format!("{repo_name}_folder_structure")
}

/// Chunk every file of `snapshot` in order, then append one structure chunk
/// listing the processed paths.
///
/// # Errors
///
/// Stops at the first file that fails; see [`preprocess_file`].
pub fn preprocess<C: TokenCodec + ?Sized>(
    snapshot: &Snapshot,
    codec: &C,
    options: &ChunkingOptions,
) -> Result<Vec<Chunk>> {
    let files = snapshot.all_files(options.include_submodules);
    let mut chunks = Vec::new();

    for file in &files {
        let produced = preprocess_file(file, codec, options)?;
        tracing::debug!(path = %file.file_path, chunks = produced.len(), "file chunked");
        chunks.extend(produced);
    }

    let listing = files
        .iter()
        .map(|f| f.file_path.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    chunks.push(Chunk::new(listing, structure_source(&snapshot.repo_name)));

    tracing::info!(
        repo = %snapshot.repo_name,
        files = files.len(),
        chunks = chunks.len(),
        "preprocessing complete"
    );
    Ok(chunks)
}

/// Chunk one file with the strategy its extension selects.
///
/// # Errors
///
/// Returns `IndexError::Parse` when a function-chunked file has syntax
/// errors, `IndexError::Config` for sizes the selected strategy rejects, and
/// `IndexError::Tokenizer` when a token window cannot be decoded.
pub fn preprocess_file<C: TokenCodec + ?Sized>(
    file: &FileEntry,
    codec: &C,
    options: &ChunkingOptions,
) -> Result<Vec<Chunk>> {
    let path = file.file_path.as_str();
    match Strategy::for_path(path, options) {
        Strategy::Functions(lang) => {
            let functions = extract_functions(&file.content, lang)?;
            let group = options.functions_per_chunk;
            if group > 0 && functions.len() < group {
                return Ok(vec![fallback_chunk(&file.content, group, path)]);
            }
            function_chunks(&functions, group, path)
        }
        Strategy::Splitter(lang) => {
            let splitter = LanguageSplitter::new(lang, options.chunk_size, options.overlap_size)?;
            Ok(splitter.split(&file.content, path))
        }
        Strategy::Tokens => {
            TokenWindower::new(options.chunk_size, options.overlap_size)?.split(
                codec,
                &file.content,
                path,
            )
        }
    }
}
