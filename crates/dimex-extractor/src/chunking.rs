//! Text normalization and overlapping chunking
//!
//! Text is NFC-normalized and its whitespace collapsed before splitting.
//! Chunk texts are exact slices of the normalized text: consecutive chunks
//! can share an overlap region, and merging them by span gives back the
//! normalized text.

use crate::config::{PipelineConfig, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::error::ExtractorError;
use chrono::{DateTime, Utc};
use dimex_domain::Document;
use std::cmp::Reverse;
use std::ops::Range;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

/// Split points in order of preference: paragraph, line, sentence, word
pub const SEPARATORS: [&str; 4] = ["\n\n", "\n", ".", " "];

/// NFC-normalize `text`, collapse whitespace runs to one space, and trim
pub fn normalize_text(text: &str) -> String {
    let composed: String = text.nfc().collect();
    composed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits normalized text into overlapping, size-bounded chunks
///
/// A chunk ends at the last boundary of the most preferred separator that
/// fits in the window. A boundary sits right after a separator and any
/// whitespace that follows it, so chunks begin on a word. The next chunk
/// starts at the word start nearest to `overlap` characters before the end
/// of the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Chunker {
    /// Create a chunker
    ///
    /// # Errors
    ///
    /// Returns `ExtractorError::Config` if `chunk_size` is zero or `overlap`
    /// is not smaller than `chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ExtractorError> {
        if chunk_size == 0 {
            return Err(ExtractorError::Config(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(ExtractorError::Config(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Create a chunker from pipeline settings
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ExtractorError> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Maximum chunk length in characters
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Target overlap in characters
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Normalize and chunk `text` into a document named after `filename`
    pub fn chunk(&self, text: &str, filename: &str) -> Document {
        self.chunk_at(text, filename, Utc::now())
    }

    /// Like [`Chunker::chunk`] with an explicit creation time
    pub fn chunk_at(&self, text: &str, filename: &str, timestamp: DateTime<Utc>) -> Document {
        let normalized = normalize_text(text);
        let chunks = self.split(&normalized);
        debug!(
            filename = %filename,
            chars = normalized.chars().count(),
            n_chunks = chunks.len(),
            "Chunked document"
        );
        Document::from_chunks(filename, chunks, timestamp)
    }

    /// Split `text` as-is (no normalization) into chunk texts
    pub fn split(&self, text: &str) -> Vec<String> {
        self.spans(text)
            .into_iter()
            .map(|span| text[span].to_string())
            .collect()
    }

    /// Byte ranges of each chunk within `text`
    ///
    /// Ranges are ordered, the first starts at 0, the last ends at
    /// `text.len()`, and each starts no later than the previous one ends.
    /// Empty text yields no ranges.
    pub fn spans(&self, text: &str) -> Vec<Range<usize>> {
        let chars: Vec<char> = text.chars().collect();
        let offsets: Vec<usize> = text.char_indices().map(|(offset, _)| offset).collect();
        let n = chars.len();
        if n == 0 {
            return Vec::new();
        }

        let boundaries = Boundaries::scan(&chars);
        let mut spans = Vec::new();
        let mut start = 0;
        let mut covered = 0;

        loop {
            if n - start <= self.chunk_size {
                spans.push(start..n);
                break;
            }

            let upper = start + self.chunk_size;
            let end = match boundaries.split_point(covered, upper) {
                Some(end) => end,
                // No boundary past the overlap: drop the overlap and retry
                None if start < covered => {
                    start = covered;
                    continue;
                }
                None if chars[upper].is_whitespace() => skip_whitespace(&chars, upper),
                // A single token longer than the window
                None => boundaries.next_after(upper).unwrap_or(n),
            };

            spans.push(start..end);
            if end >= n {
                break;
            }
            start = boundaries.overlap_start(start, end, self.overlap);
            covered = end;
        }

        let byte_at = |index: usize| offsets.get(index).copied().unwrap_or(text.len());
        spans
            .into_iter()
            .map(|span| byte_at(span.start)..byte_at(span.end))
            .collect()
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Normalize and chunk `text` in one call
pub fn chunk(
    text: &str,
    filename: &str,
    chunk_size: usize,
    overlap: usize,
) -> Result<Document, ExtractorError> {
    Ok(Chunker::new(chunk_size, overlap)?.chunk(text, filename))
}

/// Candidate split points of one text, in character indices
struct Boundaries {
    /// Sorted boundaries, one list per entry of `SEPARATORS`
    by_separator: Vec<Vec<usize>>,
    /// Sorted indices of characters that begin a word
    word_starts: Vec<usize>,
}

impl Boundaries {
    fn scan(chars: &[char]) -> Self {
        let by_separator = SEPARATORS
            .iter()
            .map(|separator| {
                let separator: Vec<char> = separator.chars().collect();
                let mut positions: Vec<usize> = chars
                    .windows(separator.len())
                    .enumerate()
                    .filter(|(_, window)| *window == separator.as_slice())
                    .map(|(i, _)| skip_whitespace(chars, i + separator.len()))
                    .collect();
                positions.dedup();
                positions
            })
            .collect();

        let word_starts = (1..chars.len())
            .filter(|&i| chars[i - 1].is_whitespace() && !chars[i].is_whitespace())
            .collect();

        Self {
            by_separator,
            word_starts,
        }
    }

    /// Last boundary in `(lower, upper]` of the most preferred separator
    /// that has one
    fn split_point(&self, lower: usize, upper: usize) -> Option<usize> {
        self.by_separator.iter().find_map(|positions| {
            let within = positions.partition_point(|&b| b <= upper);
            positions[..within].last().copied().filter(|&b| b > lower)
        })
    }

    /// First boundary of any separator past `upper`
    fn next_after(&self, upper: usize) -> Option<usize> {
        self.by_separator
            .iter()
            .filter_map(|positions| {
                let within = positions.partition_point(|&b| b <= upper);
                positions.get(within).copied()
            })
            .min()
    }

    /// Start of the chunk following `start..end`
    fn overlap_start(&self, start: usize, end: usize, overlap: usize) -> usize {
        if overlap == 0 {
            return end;
        }
        let target = end.saturating_sub(overlap);
        let lo = self.word_starts.partition_point(|&w| w <= start);
        let hi = self.word_starts.partition_point(|&w| w < end);
        self.word_starts[lo..hi.max(lo)]
            .iter()
            .copied()
            .min_by_key(|&w| (w.abs_diff(target), Reverse(w)))
            .unwrap_or(end)
    }
}

fn skip_whitespace(chars: &[char], mut index: usize) -> usize {
    while index < chars.len() && chars[index].is_whitespace() {
        index += 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn merge(text: &str, spans: &[Range<usize>]) -> String {
        let mut merged = String::new();
        let mut covered = 0;
        for span in spans {
            merged.push_str(&text[span.start.max(covered)..span.end]);
            covered = span.end;
        }
        merged
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_text("  a\tb\n\nc  "), "a b c");
    }

    #[test]
    fn test_normalize_composes_unicode() {
        let normalized = normalize_text("Cafe\u{301} au lait");
        assert_eq!(normalized, "Caf\u{e9} au lait");
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(Chunker::new(0, 0).is_err());
        assert!(Chunker::new(10, 10).is_err());
        assert!(Chunker::new(10, 9).is_ok());
    }

    #[test]
    fn test_default_sizes() {
        let chunker = Chunker::default();
        assert_eq!(chunker.chunk_size(), 1600);
        assert_eq!(chunker.overlap(), 200);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        let document = Chunker::default().chunk("  \n\t ", "empty.pdf");
        assert_eq!(document.n_chunks(), 0);
        assert!(document.chunks().is_empty());
        assert!(document.validate().is_ok());
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let document = Chunker::default().chunk("A short\n\nabstract.", "papers/short.pdf");
        assert_eq!(document.n_chunks(), 1);
        assert_eq!(document.chunks()[0].text, "A short abstract.");
        assert_eq!(document.doc_id(), "short.pdf");
    }

    #[test]
    fn test_sentences_with_overlap() {
        let chunker = Chunker::new(20, 5).unwrap();
        let chunks = chunker.split("Alpha beta. Gamma delta. Epsilon zeta.");
        assert_eq!(
            chunks,
            vec!["Alpha beta. ", "beta. Gamma delta. ", "delta. Epsilon zeta."]
        );
        for chunk in &chunks[..chunks.len() - 1] {
            assert!(chunk.ends_with(". "));
        }
    }

    #[test]
    fn test_sentence_boundary_preferred_over_word() {
        let chunker = Chunker::new(14, 0).unwrap();
        let chunks = chunker.split("aa bb. cc dd ee ff");
        assert_eq!(chunks[0], "aa bb. ");
        assert_eq!(chunks.concat(), "aa bb. cc dd ee ff");
    }

    #[test]
    fn test_long_token_kept_whole() {
        let text = format!("{} tail", "x".repeat(50));
        let chunks = Chunker::new(10, 2).unwrap().split(&text);
        assert_eq!(chunks, vec![format!("{} ", "x".repeat(50)), "tail".to_string()]);
    }

    #[test]
    fn test_token_exactly_filling_window() {
        let chunks = Chunker::new(5, 0).unwrap().split("abcde fgh");
        assert_eq!(chunks, vec!["abcde ", "fgh"]);
    }

    #[test]
    fn test_whitespace_stays_with_preceding_chunk() {
        let chunks = Chunker::new(1, 0).unwrap().split("ab c d");
        assert_eq!(chunks, vec!["ab ", "c ", "d"]);
    }

    #[test]
    fn test_multibyte_text() {
        let text = normalize_text(&"\u{e9}t\u{e9} \u{e0} Z\u{fc}rich. ".repeat(30));
        let chunker = Chunker::new(25, 6).unwrap();
        let spans = chunker.spans(&text);
        assert_eq!(merge(&text, &spans), text);
        for chunk in chunker.split(&text) {
            assert!(chunk.chars().count() <= 25);
        }
    }

    #[test]
    fn test_document_metadata() {
        let text = "word ".repeat(1000);
        let document = Chunker::default().chunk(&text, "/tmp/long.pdf");
        assert!(document.n_chunks() > 1);
        for (i, chunk) in document.chunks().iter().enumerate() {
            assert_eq!(chunk.chunk_id, i);
        }
        assert!(document.validate().is_ok());
        assert_eq!(document.filename(), Some("/tmp/long.pdf"));
    }

    #[test]
    fn test_free_function() {
        let document = chunk("one two three", "a.txt", 100, 10).unwrap();
        assert_eq!(document.n_chunks(), 1);
        assert!(chunk("one", "a.txt", 10, 20).is_err());
    }

    fn text_and_sizes() -> impl Strategy<Value = (String, usize, usize)> {
        (
            prop::collection::vec("[a-zA-Z]{1,12}[.,]?", 1..120),
            (8usize..120).prop_flat_map(|size| (Just(size), 0..size)),
        )
            .prop_map(|(words, (size, overlap))| (words.join(" "), size, overlap))
    }

    proptest! {
        #[test]
        fn prop_chunks_reconstruct_text((text, size, overlap) in text_and_sizes()) {
            let text = normalize_text(&text);
            let spans = Chunker::new(size, overlap).unwrap().spans(&text);

            prop_assert_eq!(spans.first().map(|s| s.start), Some(0));
            prop_assert_eq!(spans.last().map(|s| s.end), Some(text.len()));
            for pair in spans.windows(2) {
                prop_assert!(pair[1].start <= pair[0].end);
                prop_assert!(pair[1].end > pair[0].end);
            }
            prop_assert_eq!(merge(&text, &spans), text);
        }

        #[test]
        fn prop_chunks_respect_size((text, size, overlap) in text_and_sizes()) {
            let text = normalize_text(&text);
            for chunk in Chunker::new(size, overlap).unwrap().split(&text) {
                prop_assert!(!chunk.is_empty());
                prop_assert!(!chunk.starts_with(char::is_whitespace));
                if chunk.chars().count() > size {
                    // Only an unsplittable token may overflow
                    prop_assert!(!chunk.trim_end().contains(char::is_whitespace));
                }
            }
        }

        #[test]
        fn prop_chunk_ids_contiguous((text, size, overlap) in text_and_sizes()) {
            let chunker = Chunker::new(size, overlap).unwrap();
            let first = chunker.chunk(&text, "doc.pdf");
            prop_assert!(first.validate().is_ok());

            let second = chunker.chunk(&text, "doc.pdf");
            prop_assert_eq!(first.chunks(), second.chunks());
        }
    }
}
