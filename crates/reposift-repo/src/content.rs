//! Content filtering shared by the local reader and the GitHub fetcher.

use crate::error::FetchError;

/// Path fragments skipped by default: editor swap files, object files and
/// the metadata blobs macOS leaves behind in archives and `.DS_Store` files.
pub const DEFAULT_EXCLUDED_PATTERNS: &[&str] = &[
    ".DS_Store",
    "___MACOSX",
    ".o",
    ".swp",
    ".swiftpm",
    "bwspblob",
    "dsclbool",
    "lg1Scomp",
    "moDDblob",
    "ph1Scomp",
    "vSrnlong",
    "Ilocblob",
    "modDblob",
];

const BINARY_SNIFF_LEN: usize = 1024;
const STRICT_EXTENSIONS: &[&str] = &[".cpp", ".h", ".hpp"];

/// Substring match against every pattern.
pub(crate) fn is_excluded(path: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| path.contains(p.as_str()))
}

pub(crate) fn looks_binary(bytes: &[u8]) -> bool {
    bytes[..bytes.len().min(BINARY_SNIFF_LEN)].contains(&0)
}

/// Turn raw file bytes into snapshot text.
///
/// C and C++ sources must be valid UTF-8 and lose trailing whitespace on each
/// line; everything else is decoded lossily.
pub(crate) fn clean_content(path: &str, bytes: &[u8]) -> Result<String, FetchError> {
    if looks_binary(bytes) {
        return Err(FetchError::Binary(path.to_owned()));
    }

    if STRICT_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        let text =
            std::str::from_utf8(bytes).map_err(|_| FetchError::InvalidUtf8(path.to_owned()))?;
        return Ok(text
            .split('\n')
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n"));
    }

    Ok(String::from_utf8_lossy(bytes).into_owned())
}
