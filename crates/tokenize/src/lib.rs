#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::indexing_slicing)]
#![deny(missing_docs, unused_must_use)]

//! Vocabulary-driven WordPiece tokenization.
//!
//! Raw text goes through two stages: the basic segmenter splits it into
//! coarse units on whitespace and punctuation, then the WordPiece tokenizer
//! splits every unit into the longest known subwords. The result keeps a
//! boundary map from each unit to the subword positions it produced, so
//! per-subword predictions can be folded back to words.
//!
//! Layout:
//! - `vocab.rs` — `Vocabulary` (line-ordered token list, unknown sentinel)
//! - `segment.rs` — `segment` (whitespace / punctuation splitting)
//! - `wordpiece.rs` — `WordPieceTokenizer`, `TokenSequence`, `WordSpan`
//! - `error.rs` — `TokenizeError`

/// Error type shared by the tokenizer modules.
pub mod error;
/// Basic segmenter.
pub mod segment;
/// Subword vocabulary.
pub mod vocab;
/// Greedy longest-match WordPiece tokenizer.
pub mod wordpiece;

pub use error::{Result, TokenizeError};
pub use segment::{segment, CoarseUnit};
pub use vocab::{Vocabulary, DEFAULT_UNK_TOKEN};
pub use wordpiece::{
    PieceKind, SubwordToken, TokenSequence, WordPieceConfig, WordPieceTokenizer, WordSpan,
    DEFAULT_CONTINUATION_PREFIX, DEFAULT_MAX_CHARS_PER_WORD,
};

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{quickcheck, TestResult};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn letters_tokenizer() -> WordPieceTokenizer {
        let mut entries: Vec<String> = ["[UNK]", "the", "fox", "Paris", "NASA", "eBay"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        for c in 'a'..='m' {
            entries.push(c.to_string());
            entries.push(format!("##{c}"));
        }
        let vocab = Vocabulary::from_tokens(entries, "[UNK]").unwrap();
        WordPieceTokenizer::new(Arc::new(vocab), WordPieceConfig::default())
    }

    quickcheck! {
        fn ids_concatenate_per_unit_results(text: String) -> bool {
            let tok = letters_tokenizer();
            let seq = tok.tokenize_to_ids(&text);
            let expected: usize = segment(&text).iter().map(|u| tok.tokenize(u.text).len()).sum();
            seq.len() == expected && seq.ids().len() == expected
        }

        fn boundary_map_is_contiguous(text: String) -> bool {
            let seq = letters_tokenizer().tokenize_to_ids(&text);
            seq.is_consistent() && seq.spans().len() == segment(&text).len()
        }

        fn segmentation_is_deterministic(text: String) -> bool {
            segment(&text) == segment(&text)
        }

        fn units_never_contain_whitespace(text: String) -> bool {
            segment(&text)
                .iter()
                .all(|u| !u.text.is_empty() && !u.text.chars().any(char::is_whitespace))
        }

        fn retokenizing_words_keeps_span_count(text: String) -> bool {
            let tok = letters_tokenizer();
            let seq = tok.tokenize_to_ids(&text);
            let rebuilt = seq.words().collect::<Vec<_>>().join(" ");
            tok.tokenize_to_ids(&rebuilt).spans().len() == seq.spans().len()
        }

        fn vocabulary_words_are_not_split(pick: usize) -> TestResult {
            let tok = letters_tokenizer();
            let word = ["the", "fox", "Paris", "NASA", "eBay", "a", "m"][pick % 7];
            let pieces = tok.tokenize(word);
            TestResult::from_bool(pieces.len() == 1 && pieces[0].text == word)
        }

        fn arbitrary_vocabulary_words_are_not_split(words: Vec<String>, pick: usize) -> TestResult {
            // keep words that segment to exactly themselves
            let mut seen = HashSet::new();
            let words: Vec<String> = words
                .into_iter()
                .filter(|w| {
                    let units = segment(w);
                    units.len() == 1
                        && units[0].text == w.as_str()
                        && w.chars().count() <= DEFAULT_MAX_CHARS_PER_WORD
                })
                .filter(|w| seen.insert(w.clone()))
                .collect();
            if words.is_empty() {
                return TestResult::discard();
            }
            let word = words[pick % words.len()].clone();
            let mut entries = vec!["[UNK]".to_string()];
            entries.extend(words);
            let vocab = Vocabulary::from_tokens(entries, "[UNK]").unwrap();
            let tok = WordPieceTokenizer::new(Arc::new(vocab), WordPieceConfig::default());
            let pieces = tok.tokenize(&word);
            TestResult::from_bool(pieces.len() == 1 && pieces[0].text == word)
        }
    }
}
