use serde::{Deserialize, Serialize};

use reposift_index::ChunkingOptions;
use reposift_repo::DEFAULT_EXCLUDED_PATTERNS;

use crate::secret::Secret;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(skip)]
    pub secrets: ResolvedSecrets,
}

/// Credentials read from the environment at startup, never from the file.
#[derive(Debug, Default)]
pub struct ResolvedSecrets {
    pub github_token: Option<Secret>,
    pub openai_api_key: Option<Secret>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GithubConfig {
    #[serde(default = "default_github_api_url")]
    pub api_url: String,
    /// Used when the repository metadata does not name a default branch.
    #[serde(default = "default_branch")]
    pub default_branch: String,
    /// Path fragments to skip (substring match).
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            default_branch: default_branch(),
            exclude: default_exclude(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_github_api_url() -> String {
    reposift_repo::github::DEFAULT_API_URL.into()
}

fn default_branch() -> String {
    reposift_repo::github::DEFAULT_BRANCH.into()
}

fn default_exclude() -> Vec<String> {
    DEFAULT_EXCLUDED_PATTERNS
        .iter()
        .map(|s| (*s).to_owned())
        .collect()
}

fn default_max_retries() -> u32 {
    3
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChunkingConfig {
    /// Characters for language-aware splitting, tokens for windowing.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_overlap_size")]
    pub overlap_size: usize,
    #[serde(default = "default_functions_per_chunk")]
    pub functions_per_chunk: usize,
    #[serde(default = "default_true")]
    pub function_chunking: bool,
    #[serde(default = "default_true")]
    pub include_submodules: bool,
    #[serde(default = "default_tokenizer_model")]
    pub tokenizer_model: String,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap_size: default_overlap_size(),
            functions_per_chunk: default_functions_per_chunk(),
            function_chunking: true,
            include_submodules: true,
            tokenizer_model: default_tokenizer_model(),
        }
    }
}

impl ChunkingConfig {
    #[must_use]
    pub fn options(&self) -> ChunkingOptions {
        ChunkingOptions {
            chunk_size: self.chunk_size,
            overlap_size: self.overlap_size,
            functions_per_chunk: self.functions_per_chunk,
            function_chunking: self.function_chunking,
            include_submodules: self.include_submodules,
        }
    }
}

fn default_chunk_size() -> usize {
    500
}

fn default_overlap_size() -> usize {
    50
}

fn default_functions_per_chunk() -> usize {
    2
}

fn default_true() -> bool {
    true
}

fn default_tokenizer_model() -> String {
    "gpt-3.5-turbo".into()
}

/// Embedding backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Ollama,
    /// Deterministic offline embedder for tests.
    #[cfg(feature = "mock")]
    Mock,
}

impl ProviderKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
            #[cfg(feature = "mock")]
            Self::Mock => "mock",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: ProviderKind,
    /// Backend URL; the provider's public default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: None,
            model: default_embedding_model(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_provider() -> ProviderKind {
    ProviderKind::OpenAi
}

fn default_embedding_model() -> String {
    reposift_llm::openai::DEFAULT_EMBEDDING_MODEL.into()
}

#[derive(Debug, Deserialize, Serialize)]
pub struct IndexConfig {
    /// Directory holding `index.json`.
    #[serde(default = "default_index_path")]
    pub path: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: default_index_path(),
            top_k: default_top_k(),
        }
    }
}

fn default_index_path() -> String {
    "faiss_index".into()
}

fn default_top_k() -> usize {
    reposift_index::retriever::DEFAULT_TOP_K
}
