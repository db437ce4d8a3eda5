//! Repository snapshots: the captured file tree of a repository.
//!
//! A [`Snapshot`] is produced either by walking a local checkout
//! ([`local::read_dir`]) or by pulling a GitHub repository through the REST
//! contents API ([`github::GithubFetcher`]), and persisted as JSON for the
//! indexing pipeline.

pub(crate) mod content;
pub mod error;
pub mod github;
pub mod local;
pub mod snapshot;

pub use content::DEFAULT_EXCLUDED_PATTERNS;
pub use error::{FetchError, RepoError, Result};
pub use snapshot::{FileEntry, Snapshot, Submodule};
