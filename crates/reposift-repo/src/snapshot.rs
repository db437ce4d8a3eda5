use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One file captured from a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub file_path: String,
    pub content: String,
}

impl FileEntry {
    pub fn new(file_path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            content: content.into(),
        }
    }
}

/// A submodule pinned to a commit, with its own captured tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submodule {
    pub name: String,
    pub url: String,
    pub commit: String,
    #[serde(default)]
    pub files: Vec<FileEntry>,
    #[serde(default)]
    pub submodules: Vec<Submodule>,
}

/// The captured file tree of one repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub repo_name: String,
    #[serde(default)]
    pub files: Vec<FileEntry>,
    #[serde(default)]
    pub submodules: Vec<Submodule>,
}

impl Snapshot {
    pub fn new(repo_name: impl Into<String>, files: Vec<FileEntry>) -> Self {
        Self {
            repo_name: repo_name.into(),
            files,
            submodules: Vec::new(),
        }
    }

    /// Read a snapshot from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid snapshot.
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        let snapshot: Self = serde_json::from_str(&raw)?;
        tracing::debug!(
            path = %path.display(),
            repo = %snapshot.repo_name,
            files = snapshot.files.len(),
            submodules = snapshot.submodules.len(),
            "loaded snapshot"
        );
        Ok(snapshot)
    }

    /// Write the snapshot as pretty-printed JSON with files sorted by path and
    /// submodules sorted by name. Non-ASCII text is written as-is.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let mut sorted = self.clone();
        sorted.sort();
        let json = serde_json::to_string_pretty(&sorted)?;
        tokio::fs::write(path, json).await?;
        tracing::info!(
            path = %path.display(),
            files = sorted.files.len(),
            submodules = sorted.submodules.len(),
            "snapshot saved"
        );
        Ok(())
    }

    /// Sort files by path and submodules by name, at every level.
    pub fn sort(&mut self) {
        sort_tree(&mut self.files, &mut self.submodules);
    }

    /// Files to preprocess: the top-level files, followed by every
    /// submodule's files depth-first when `include_submodules` is set.
    #[must_use]
    pub fn all_files(&self, include_submodules: bool) -> Vec<&FileEntry> {
        let mut out: Vec<&FileEntry> = self.files.iter().collect();
        if include_submodules {
            for sub in &self.submodules {
                collect_submodule(sub, &mut out);
            }
        }
        out
    }
}

fn sort_tree(files: &mut [FileEntry], submodules: &mut [Submodule]) {
    files.sort_by(|a, b| a.file_path.cmp(&b.file_path));
    submodules.sort_by(|a, b| a.name.cmp(&b.name));
    for sub in submodules {
        sort_tree(&mut sub.files, &mut sub.submodules);
    }
}

fn collect_submodule<'a>(sub: &'a Submodule, out: &mut Vec<&'a FileEntry>) {
    out.extend(sub.files.iter());
    for nested in &sub.submodules {
        collect_submodule(nested, out);
    }
}
