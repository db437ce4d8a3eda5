//! Snapshot a directory on disk.

use std::path::Path;

use crate::content::{clean_content, is_excluded};
use crate::error::{RepoError, Result};
use crate::snapshot::{FileEntry, Snapshot};

/// Walk `root` and capture every text file under it.
///
/// `.gitignore` rules apply even outside a git checkout, hidden entries are
/// skipped, and paths matching any of `exclude` are left out. Binary and
/// unreadable files are skipped with a log line. Paths are relative to
/// `root`, use `/` separators, and come back sorted.
///
/// # Errors
///
/// Returns an error if `root` cannot be walked at all.
pub fn read_dir(root: &Path, repo_name: &str, exclude: &[String]) -> Result<Snapshot> {
    let mut files = Vec::new();
    let walker = ignore::WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .require_git(false)
        .build();
    for (i, entry) in walker.enumerate() {
        let entry = match entry {
            Ok(e) => e,
            // the first entry is the root itself
            Err(e) if i == 0 => return Err(RepoError::Walk(e)),
            Err(e) => {
                tracing::warn!("skipping unreadable entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        let file_path = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if is_excluded(&file_path, exclude) {
            tracing::debug!(path = %file_path, "excluded");
            continue;
        }

        let bytes = match std::fs::read(entry.path()) {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(path = %file_path, "read failed: {e}");
                continue;
            }
        };

        match clean_content(&file_path, &bytes) {
            Ok(content) => files.push(FileEntry { file_path, content }),
            Err(e) => tracing::debug!(path = %file_path, "skipped: {e}"),
        }
    }

    files.sort_by(|a, b| a.file_path.cmp(&b.file_path));
    tracing::info!(root = %root.display(), files = files.len(), "directory snapshot taken");
    Ok(Snapshot::new(repo_name, files))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::content::DEFAULT_EXCLUDED_PATTERNS;

    fn exclude() -> Vec<String> {
        DEFAULT_EXCLUDED_PATTERNS
            .iter()
            .map(|s| (*s).to_owned())
            .collect()
    }

    #[test]
    fn reads_text_files_sorted_with_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/util")).unwrap();
        fs::write(dir.path().join("src/util/b.py"), "def b():\n    pass\n").unwrap();
        fs::write(dir.path().join("a.md"), "# A").unwrap();

        let snap = read_dir(dir.path(), "demo", &exclude()).unwrap();
        assert_eq!(snap.repo_name, "demo");
        let paths: Vec<_> = snap.files.iter().map(|f| f.file_path.as_str()).collect();
        assert_eq!(paths, ["a.md", "src/util/b.py"]);
        assert_eq!(snap.files[1].content, "def b():\n    pass\n");
    }

    #[test]
    fn skips_binary_excluded_hidden_and_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("keep.txt"), "hello").unwrap();
        fs::write(dir.path().join("blob.bin"), b"\x00\x01\x02").unwrap();
        fs::write(dir.path().join("main.o"), "object").unwrap();
        fs::write(dir.path().join(".secret"), "hidden").unwrap();
        fs::write(dir.path().join(".gitignore"), "target/\n").unwrap();
        fs::create_dir(dir.path().join("target")).unwrap();
        fs::write(dir.path().join("target/out.txt"), "built").unwrap();

        let snap = read_dir(dir.path(), "demo", &exclude()).unwrap();
        let paths: Vec<_> = snap.files.iter().map(|f| f.file_path.as_str()).collect();
        assert_eq!(paths, ["keep.txt"]);
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_dir(&dir.path().join("absent"), "demo", &[]).unwrap_err();
        assert!(matches!(err, RepoError::Walk(_)), "got {err:?}");
    }
}
