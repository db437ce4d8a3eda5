//! Recursive separator-driven text splitting.
//!
//! Text is cut at the first separator of the language's list that occurs in
//! it, keeping each separator at the start of the piece that follows. Pieces
//! shorter than `chunk_size` are merged greedily with up to `overlap_size`
//! characters carried into the next chunk; longer pieces are split again
//! with the remaining separators. Sizes are counted in characters.

use std::collections::{HashMap, VecDeque};
use std::sync::LazyLock;

use regex::Regex;

use crate::chunk::Chunk;
use crate::error::{IndexError, Result};
use crate::languages::Lang;

#[derive(Debug)]
enum Separator {
    Pattern(Regex),
    Chars,
}

static SEPARATORS: LazyLock<HashMap<Lang, Vec<Separator>>> = LazyLock::new(|| {
    Lang::ALL
        .into_iter()
        .map(|lang| {
            let compiled = lang
                .separators()
                .iter()
                .map(|pattern| {
                    if pattern.is_empty() {
                        Separator::Chars
                    } else {
                        Separator::Pattern(Regex::new(pattern).expect("static separator pattern"))
                    }
                })
                .collect();
            (lang, compiled)
        })
        .collect()
});

/// Splitter bound to one language and size configuration.
#[derive(Debug, Clone, Copy)]
pub struct LanguageSplitter {
    lang: Lang,
    chunk_size: usize,
    overlap_size: usize,
}

impl LanguageSplitter {
    /// # Errors
    ///
    /// Returns `IndexError::Config` if `chunk_size` is zero or
    /// `overlap_size` exceeds it.
    pub fn new(lang: Lang, chunk_size: usize, overlap_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(IndexError::Config("chunk_size must be positive".into()));
        }
        if overlap_size > chunk_size {
            return Err(IndexError::Config(format!(
                "overlap_size ({overlap_size}) is larger than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            lang,
            chunk_size,
            overlap_size,
        })
    }

    /// Split `content` into trimmed, non-empty chunks tagged with `source`.
    #[must_use]
    pub fn split(&self, content: &str, source: &str) -> Vec<Chunk> {
        self.split_text(content)
            .into_iter()
            .map(|text| Chunk::new(text, source))
            .collect()
    }

    /// Split `text` into trimmed, non-empty pieces.
    #[must_use]
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let separators = SEPARATORS.get(&self.lang).map_or(&[][..], Vec::as_slice);
        self.split_recursive(text, separators)
            .into_iter()
            .filter_map(|piece| {
                let trimmed = piece.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_owned())
            })
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[Separator]) -> Vec<String> {
        let mut chosen = separators.last();
        let mut remaining: &[Separator] = &[];
        for (i, sep) in separators.iter().enumerate() {
            match sep {
                Separator::Chars => {
                    chosen = Some(sep);
                    break;
                }
                Separator::Pattern(re) if re.is_match(text) => {
                    chosen = Some(sep);
                    remaining = &separators[i + 1..];
                    break;
                }
                Separator::Pattern(_) => {}
            }
        }

        let pieces = match chosen {
            Some(sep) => split_keeping_separator(text, sep),
            None => vec![text],
        };

        let mut chunks = Vec::new();
        let mut small: Vec<&str> = Vec::new();
        for piece in pieces {
            if char_len(piece) < self.chunk_size {
                small.push(piece);
                continue;
            }
            if !small.is_empty() {
                chunks.extend(self.merge(&small));
                small.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece.to_owned());
            } else {
                chunks.extend(self.split_recursive(piece, remaining));
            }
        }
        if !small.is_empty() {
            chunks.extend(self.merge(&small));
        }
        chunks
    }

    /// Greedy merge of pieces no longer than `chunk_size` each. When a chunk
    /// is emitted, leading pieces are dropped until at most `overlap_size`
    /// characters remain and the next piece fits.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut out = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size && !window.is_empty() {
                push_joined(&window, &mut out);
                while total > self.overlap_size || (total > 0 && total + len > self.chunk_size) {
                    let Some((_, dropped)) = window.pop_front() else {
                        break;
                    };
                    total -= dropped;
                }
            }
            window.push_back((piece, len));
            total += len;
        }
        push_joined(&window, &mut out);
        out
    }
}

fn push_joined(window: &VecDeque<(&str, usize)>, out: &mut Vec<String>) {
    let joined: String = window.iter().map(|(s, _)| *s).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_owned());
    }
}

/// Cut before every separator match so each separator opens the piece that
/// follows it. Empty pieces are dropped.
fn split_keeping_separator<'a>(text: &'a str, sep: &Separator) -> Vec<&'a str> {
    match sep {
        Separator::Chars => text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect(),
        Separator::Pattern(re) => {
            let mut pieces = Vec::new();
            let mut start = 0;
            for m in re.find_iter(text) {
                if m.start() > start {
                    pieces.push(&text[start..m.start()]);
                    start = m.start();
                }
            }
            if start < text.len() {
                pieces.push(&text[start..]);
            }
            pieces
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
