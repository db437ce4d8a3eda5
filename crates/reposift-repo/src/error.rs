/// Errors raised while loading, saving, or reading snapshots.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("directory walk failed: {0}")]
    Walk(#[from] ignore::Error),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// A failure fetching one item from a remote repository.
///
/// The fetcher logs and skips these per item; only a failure to list the
/// root of the requested repository reaches the caller.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request gave up: {0}")]
    Retry(#[from] reposift_llm::LlmError),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("unexpected response shape for {0}")]
    UnexpectedShape(String),

    #[error("base64 decode failed for {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("{0} looks like a binary file")]
    Binary(String),

    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(String),

    #[error("unsupported submodule url: {0}")]
    UnsupportedSubmodule(String),

    #[error("submodule cycle: {0} is already being fetched")]
    Cycle(String),

    #[error("invalid repository identifier: {0}")]
    InvalidRepo(String),

    #[error("invalid API url: {0}")]
    InvalidUrl(String),
}

/// Result type alias using `RepoError`.
pub type Result<T> = std::result::Result<T, RepoError>;
