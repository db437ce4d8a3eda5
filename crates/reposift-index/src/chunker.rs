//! Sliding groups of consecutive functions.

use crate::chunk::Chunk;
use crate::error::{IndexError, Result};

const FUNCTION_SEPARATOR: &str = "\n\n";

/// Join every run of `group_size` consecutive functions into one chunk.
///
/// Yields `functions.len() - group_size + 1` chunks, chunk `i` covering
/// functions `[i, i + group_size)` and tagged with `chunk_number = i`. Fewer
/// functions than `group_size` yields nothing; see [`fallback_chunk`].
///
/// # Errors
///
/// Returns `IndexError::Config` when `group_size` is zero.
pub fn function_chunks(functions: &[String], group_size: usize, source: &str) -> Result<Vec<Chunk>> {
    if group_size == 0 {
        return Err(IndexError::Config("functions_per_chunk must be at least 1".into()));
    }

    Ok(functions
        .windows(group_size)
        .enumerate()
        .map(|(i, group)| Chunk::new(group.join(FUNCTION_SEPARATOR), source).with_chunk_number(i))
        .collect())
}

/// Whole-file chunk for files with fewer than `group_size` functions.
#[must_use]
pub fn fallback_chunk(content: &str, group_size: usize, source: &str) -> Chunk {
    Chunk::new(content, source).with_note(format!("less than {group_size} functions"))
}
