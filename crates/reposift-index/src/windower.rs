//! Fixed-size token windows for files without a language splitter.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use tiktoken_rs::CoreBPE;

use crate::chunk::Chunk;
use crate::error::{IndexError, Result};

pub type TokenId = usize;

/// Text to token ids and back.
pub trait TokenCodec: Send + Sync {
    fn encode(&self, text: &str) -> Vec<TokenId>;

    /// # Errors
    ///
    /// Returns `IndexError::Tokenizer` if the ids do not decode to valid text.
    fn decode(&self, tokens: &[TokenId]) -> Result<String>;
}

/// BPE codec for an `OpenAI` model family.
#[derive(Clone)]
pub struct TiktokenCodec {
    model: String,
    bpe: Arc<CoreBPE>,
}

impl TiktokenCodec {
    /// # Errors
    ///
    /// Returns `IndexError::Tokenizer` when no encoding is known for `model`.
    pub fn for_model(model: &str) -> Result<Self> {
        let bpe = tiktoken_rs::get_bpe_from_model(model)
            .map_err(|e| IndexError::Tokenizer(format!("{model}: {e}")))?;
        Ok(Self {
            model: model.to_owned(),
            bpe: Arc::new(bpe),
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl fmt::Debug for TiktokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TiktokenCodec")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl TokenCodec for TiktokenCodec {
    fn encode(&self, text: &str) -> Vec<TokenId> {
        self.bpe.encode_ordinary(text)
    }

    /// A window may end inside a multi-token character; the partial bytes
    /// become U+FFFD instead of failing.
    #[allow(clippy::used_underscore_items)]
    fn decode(&self, tokens: &[TokenId]) -> Result<String> {
        let bytes = self.bpe._decode_native(tokens);
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Sliding window over token ids with stride `chunk_size - overlap_size`.
#[derive(Debug, Clone, Copy)]
pub struct TokenWindower {
    chunk_size: usize,
    overlap_size: usize,
}

impl TokenWindower {
    /// # Errors
    ///
    /// Returns `IndexError::Config` unless `0 <= overlap_size < chunk_size`.
    pub fn new(chunk_size: usize, overlap_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(IndexError::Config("chunk_size must be positive".into()));
        }
        if overlap_size >= chunk_size {
            return Err(IndexError::Config(format!(
                "overlap_size ({overlap_size}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap_size,
        })
    }

    #[must_use]
    pub fn stride(&self) -> usize {
        self.chunk_size - self.overlap_size
    }

    /// Token ranges covered by each window over `len` tokens. The last
    /// window may be shorter than `chunk_size`.
    pub fn ranges(&self, len: usize) -> impl Iterator<Item = Range<usize>> + use<> {
        let size = self.chunk_size;
        (0..len)
            .step_by(self.stride())
            .map(move |start| start..(start + size).min(len))
    }

    /// Encode `content`, window it, and decode each window into a chunk.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Tokenizer` if a window cannot be decoded.
    pub fn split<C: TokenCodec + ?Sized>(
        &self,
        codec: &C,
        content: &str,
        source: &str,
    ) -> Result<Vec<Chunk>> {
        let tokens = codec.encode(content);
        self.ranges(tokens.len())
            .map(|range| Ok(Chunk::new(codec.decode(&tokens[range])?, source)))
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::test_codec::{ByteCodec, WordCodec};
    use super::*;

    #[test]
    fn twenty_five_tokens_size_ten_overlap_two() {
        let w = TokenWindower::new(10, 2).unwrap();
        let ranges: Vec<_> = w.ranges(25).collect();
        assert_eq!(ranges, [0..10, 8..18, 16..25, 24..25]);
        assert_eq!(ranges.last().unwrap().len(), 1);
    }

    #[test]
    fn windows_decode_to_chunks() {
        let text = (0..25).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let chunks = TokenWindower::new(10, 2)
            .unwrap()
            .split(&WordCodec::default(), &text, "notes.txt")
            .unwrap();
        assert_eq!(chunks.len(), 4);
        assert!(chunks[1].content.starts_with("w8 w9 w10"));
        assert_eq!(chunks[3].content, "w24");
        assert!(chunks.iter().all(|c| c.source() == "notes.txt"));
    }

    #[test]
    fn empty_content_yields_no_chunks() {
        let w = TokenWindower::new(10, 2).unwrap();
        assert!(w.split(&ByteCodec, "", "empty.txt").unwrap().is_empty());
    }

    #[test]
    fn overlap_not_smaller_than_size_is_config_error() {
        assert!(matches!(
            TokenWindower::new(10, 10),
            Err(IndexError::Config(_))
        ));
        assert!(matches!(TokenWindower::new(10, 12), Err(IndexError::Config(_))));
        assert!(matches!(TokenWindower::new(0, 0), Err(IndexError::Config(_))));
    }

    #[test]
    fn strict_codec_decode_error_propagates() {
        let w = TokenWindower::new(3, 0).unwrap();
        let err = w.split(&ByteCodec, "éééé", "x.bin").unwrap_err();
        assert!(matches!(err, IndexError::Tokenizer(_)));
    }

    #[test]
    fn tiktoken_windows_through_emoji_never_fail() {
        let codec = TiktokenCodec::for_model("gpt-3.5-turbo").unwrap();
        let text = "note 🦀🦀🦀 done ".repeat(40);
        for size in [3, 5, 7, 20] {
            let chunks = TokenWindower::new(size, 1)
                .unwrap()
                .split(&codec, &text, "notes.txt")
                .unwrap();
            assert!(!chunks.is_empty());
            assert!(chunks.iter().all(|c| !c.content.is_empty()));
            assert!(chunks.iter().any(|c| c.content.contains('🦀')));
        }
    }

    #[test]
    fn tiktoken_cut_character_becomes_replacement() {
        let codec = TiktokenCodec::for_model("gpt-3.5-turbo").unwrap();
        let tokens = codec.encode("🦀");
        assert!(tokens.len() > 1);
        let partial = codec.decode(&tokens[..1]).unwrap();
        assert!(partial.contains('\u{FFFD}'));
        assert_eq!(codec.decode(&tokens).unwrap(), "🦀");
    }

    #[test]
    fn tiktoken_windows_through_cjk_never_fail() {
        let codec = TiktokenCodec::for_model("gpt-3.5-turbo").unwrap();
        let text = "日本語のテキストと絵文字😀を含むメモ。".repeat(50);
        let chunks = TokenWindower::new(7, 2)
            .unwrap()
            .split(&codec, &text, "memo.txt")
            .unwrap();
        assert_eq!(
            chunks.len(),
            TokenWindower::new(7, 2).unwrap().ranges(codec.encode(&text).len()).count()
        );
    }

    #[test]
    fn tiktoken_round_trips_text() {
        let codec = TiktokenCodec::for_model("gpt-3.5-turbo").unwrap();
        let tokens = codec.encode("hello world, hello tokens");
        assert!(!tokens.is_empty());
        assert_eq!(codec.decode(&tokens).unwrap(), "hello world, hello tokens");
        assert_eq!(codec.model(), "gpt-3.5-turbo");
    }

    #[test]
    fn unknown_model_is_tokenizer_error() {
        let err = TiktokenCodec::for_model("definitely-not-a-model").unwrap_err();
        assert!(matches!(err, IndexError::Tokenizer(_)));
    }

    #[test]
    fn deterministic_for_same_input() {
        let codec = TiktokenCodec::for_model("gpt-3.5-turbo").unwrap();
        let w = TokenWindower::new(8, 3).unwrap();
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(10);
        assert_eq!(
            w.split(&codec, &text, "a").unwrap(),
            w.split(&codec, &text, "a").unwrap()
        );
    }

    proptest! {
        #[test]
        fn dropping_overlaps_reconstructs_input(
            text in "[ -~]{0,300}",
            size in 1usize..40,
            overlap_frac in 0usize..100,
        ) {
            let overlap = (size * overlap_frac / 100).min(size - 1);
            let w = TokenWindower::new(size, overlap).unwrap();
            let chunks = w.split(&ByteCodec, &text, "p").unwrap();

            let mut rebuilt = String::new();
            for (i, c) in chunks.iter().enumerate() {
                let skip = if i == 0 { 0 } else { overlap.min(c.content.len()) };
                rebuilt.push_str(&c.content[skip..]);
            }
            prop_assert_eq!(rebuilt, text);
        }

        #[test]
        fn windows_cover_every_token(len in 0usize..500, size in 1usize..50, overlap in 0usize..49) {
            prop_assume!(overlap < size);
            let w = TokenWindower::new(size, overlap).unwrap();
            let ranges: Vec<_> = w.ranges(len).collect();
            prop_assert!(ranges.iter().all(|r| r.len() <= size && !r.is_empty()));
            let mut covered = vec![false; len];
            for r in ranges {
                for i in r {
                    covered[i] = true;
                }
            }
            prop_assert!(covered.into_iter().all(|c| c));
        }
    }
}
