#![forbid(unsafe_code)]

use std::ops::Range;
use std::sync::Arc;

use crate::segment::segment;
use crate::vocab::Vocabulary;

/// Continuation marker used by BERT vocabularies.
pub const DEFAULT_CONTINUATION_PREFIX: &str = "##";

/// Units with more characters than this degrade to the unknown token.
pub const DEFAULT_MAX_CHARS_PER_WORD: usize = 100;

/// Position of a piece inside the word it came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PieceKind {
    /// first piece of a word (or the whole word)
    WordInitial,
    /// remainder piece, stored with the continuation marker
    Continuation,
}

/// One vocabulary entry emitted by the tokenizer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubwordToken {
    /// vocabulary string, including the continuation marker when present
    pub text: String,
    /// vocabulary id
    pub id: u32,
    /// word-initial or continuation
    pub kind: PieceKind,
}

/// Boundary map entry: a coarse unit and the subword positions it produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WordSpan {
    /// literal source text of the unit
    pub word: String,
    /// half-open range of subword positions
    pub range: Range<usize>,
}

/// Subwords for one input text together with the word boundary map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenSequence {
    tokens: Vec<SubwordToken>,
    spans: Vec<WordSpan>,
}

impl TokenSequence {
    /// Subword tokens in source order.
    pub fn tokens(&self) -> &[SubwordToken] {
        &self.tokens
    }

    /// Boundary map, one entry per coarse unit in source order.
    pub fn spans(&self) -> &[WordSpan] {
        &self.spans
    }

    /// Flat id sequence.
    pub fn ids(&self) -> Vec<u32> {
        self.tokens.iter().map(|t| t.id).collect()
    }

    /// Original word strings in source order.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.spans.iter().map(|s| s.word.as_str())
    }

    /// Number of subwords.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True when the text produced no subwords.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Spans are non-empty, contiguous from position 0 and cover every subword.
    pub fn is_consistent(&self) -> bool {
        let mut next = 0;
        for span in &self.spans {
            if span.range.start != next || span.range.end <= span.range.start {
                return false;
            }
            next = span.range.end;
        }
        next == self.tokens.len()
    }
}

/// Tokenizer settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WordPieceConfig {
    /// lowercase each unit before vocabulary lookup; off by default, so cased
    /// vocabulary entries match verbatim
    pub do_lower_case: bool,
    /// marker prepended to non-initial pieces
    pub continuation_prefix: String,
    /// longer units become unknown without lookup
    pub max_chars_per_word: usize,
}

impl Default for WordPieceConfig {
    fn default() -> Self {
        Self {
            do_lower_case: false,
            continuation_prefix: DEFAULT_CONTINUATION_PREFIX.to_string(),
            max_chars_per_word: DEFAULT_MAX_CHARS_PER_WORD,
        }
    }
}

/// Greedy longest-match-first WordPiece tokenizer.
#[derive(Clone, Debug)]
pub struct WordPieceTokenizer {
    vocab: Arc<Vocabulary>,
    config: WordPieceConfig,
}

impl WordPieceTokenizer {
    /// Create a tokenizer over a shared vocabulary.
    pub fn new(vocab: Arc<Vocabulary>, config: WordPieceConfig) -> Self {
        Self { vocab, config }
    }

    /// Vocabulary this tokenizer reads from.
    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Active settings.
    pub fn config(&self) -> &WordPieceConfig {
        &self.config
    }

    /// Split one coarse unit into subwords.
    ///
    /// If any position of the unit has no matching vocabulary prefix the whole
    /// unit becomes a single unknown token; partial splits are never kept.
    pub fn tokenize(&self, unit: &str) -> Vec<SubwordToken> {
        if unit.is_empty() {
            return Vec::new();
        }
        let normalized = if self.config.do_lower_case {
            unit.to_lowercase()
        } else {
            unit.to_string()
        };
        let mut bounds: Vec<usize> = normalized.char_indices().map(|(i, _)| i).collect();
        let char_count = bounds.len();
        if char_count > self.config.max_chars_per_word {
            return vec![self.unknown()];
        }
        bounds.push(normalized.len());

        let mut pieces = Vec::new();
        let mut start = 0;
        while start < char_count {
            match self.longest_match(&normalized, &bounds, start) {
                Some((token, end)) => {
                    pieces.push(token);
                    start = end;
                }
                None => return vec![self.unknown()],
            }
        }
        pieces
    }

    // Longest vocabulary piece starting at char `start`; returns the piece and
    // the char index just past it.
    fn longest_match(
        &self,
        word: &str,
        bounds: &[usize],
        start: usize,
    ) -> Option<(SubwordToken, usize)> {
        let from = *bounds.get(start)?;
        let kind = if start == 0 {
            PieceKind::WordInitial
        } else {
            PieceKind::Continuation
        };
        for end in (start + 1..bounds.len()).rev() {
            let to = *bounds.get(end)?;
            let body = word.get(from..to)?;
            let candidate = match kind {
                PieceKind::WordInitial => body.to_string(),
                PieceKind::Continuation => format!("{}{}", self.config.continuation_prefix, body),
            };
            if let Some(id) = self.vocab.get(&candidate) {
                return Some((SubwordToken { text: candidate, id, kind }, end));
            }
        }
        None
    }

    fn unknown(&self) -> SubwordToken {
        SubwordToken {
            text: self.vocab.unk_token().to_string(),
            id: self.vocab.unk_id(),
            kind: PieceKind::WordInitial,
        }
    }

    /// Segment `text` and tokenize every coarse unit, recording the boundary map.
    pub fn tokenize_to_ids(&self, text: &str) -> TokenSequence {
        let mut seq = TokenSequence::default();
        for unit in segment(text) {
            let pieces = self.tokenize(unit.text);
            let start = seq.tokens.len();
            seq.tokens.extend(pieces);
            seq.spans.push(WordSpan {
                word: unit.text.to_string(),
                range: start..seq.tokens.len(),
            });
        }
        seq
    }

    /// Glue subwords back into space-separated words.
    pub fn detokenize(&self, tokens: &[SubwordToken]) -> String {
        let mut words: Vec<String> = Vec::new();
        for token in tokens {
            if token.kind == PieceKind::Continuation {
                if let Some(last) = words.last_mut() {
                    let body = token
                        .text
                        .strip_prefix(self.config.continuation_prefix.as_str())
                        .unwrap_or(&token.text);
                    last.push_str(body);
                    continue;
                }
            }
            words.push(token.text.clone());
        }
        words.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer(entries: &[&str], lower: bool) -> WordPieceTokenizer {
        let tokens = entries.iter().map(|s| s.to_string()).collect();
        let vocab = Vocabulary::from_tokens(tokens, "[UNK]").unwrap();
        WordPieceTokenizer::new(
            Arc::new(vocab),
            WordPieceConfig {
                do_lower_case: lower,
                ..WordPieceConfig::default()
            },
        )
    }

    fn fox() -> WordPieceTokenizer {
        tokenizer(
            &["the", "quick", "brown", "fox", "jump", "##s", "[UNK]", "[CLS]", "[SEP]"],
            true,
        )
    }

    fn texts(tokens: &[SubwordToken]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn quick_brown_fox() {
        let seq = fox().tokenize_to_ids("the quick brown fox jumps");
        assert_eq!(texts(seq.tokens()), vec!["the", "quick", "brown", "fox", "jump", "##s"]);
        assert_eq!(seq.ids(), vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(seq.spans().len(), 5);
        assert_eq!(seq.spans()[4].word, "jumps");
        assert_eq!(seq.spans()[4].range, 4..6);
        assert!(seq.is_consistent());
    }

    #[test]
    fn continuation_kind_is_tagged() {
        let pieces = fox().tokenize("jumps");
        assert_eq!(pieces[0].kind, PieceKind::WordInitial);
        assert_eq!(pieces[1].kind, PieceKind::Continuation);
    }

    #[test]
    fn longest_prefix_wins() {
        let tok = tokenizer(&["[UNK]", "un", "unaff", "##aff", "##able", "##a", "##ble"], false);
        assert_eq!(texts(&tok.tokenize("unaffable")), vec!["unaff", "##able"]);
    }

    #[test]
    fn failure_partway_degrades_whole_unit() {
        // "jump" matches but "##ed" does not: nothing of the split survives.
        let pieces = fox().tokenize("jumped");
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].text, "[UNK]");
        assert_eq!(pieces[0].id, 6);
    }

    #[test]
    fn absent_word_is_one_unknown_span() {
        let seq = fox().tokenize_to_ids("the zebra");
        assert_eq!(texts(seq.tokens()), vec!["the", "[UNK]"]);
        assert_eq!(seq.spans()[1].word, "zebra");
        assert_eq!(seq.spans()[1].range, 1..2);
    }

    #[test]
    fn case_handling() {
        let seq = fox().tokenize_to_ids("The FOX");
        assert_eq!(seq.ids(), vec![0, 3]);
        assert_eq!(seq.words().collect::<Vec<_>>(), vec!["The", "FOX"]);

        let cased = tokenizer(&["[UNK]", "the"], false);
        assert_eq!(cased.tokenize("The")[0].text, "[UNK]");
    }

    #[test]
    fn default_config_matches_cased_entries_verbatim() {
        let vocab = Vocabulary::from_tokens(vec!["[UNK]".into(), "Paris".into()], "[UNK]").unwrap();
        let tok = WordPieceTokenizer::new(Arc::new(vocab), WordPieceConfig::default());
        assert_eq!(texts(&tok.tokenize("Paris")), vec!["Paris"]);
        assert_eq!(texts(&tok.tokenize("paris")), vec!["[UNK]"]);
    }

    #[test]
    fn overlong_unit_is_unknown() {
        let tokens = vec!["[UNK]".into(), "a".into(), "##a".into()];
        let vocab = Vocabulary::from_tokens(tokens, "[UNK]").unwrap();
        let tok = WordPieceTokenizer::new(
            Arc::new(vocab),
            WordPieceConfig {
                max_chars_per_word: 4,
                ..WordPieceConfig::default()
            },
        );
        assert_eq!(tok.tokenize("aaaa").len(), 4);
        assert_eq!(texts(&tok.tokenize("aaaaa")), vec!["[UNK]"]);
    }

    #[test]
    fn multibyte_characters_split_on_char_boundaries() {
        let tok = tokenizer(&["[UNK]", "caf", "##é", "naï", "##ve"], false);
        assert_eq!(texts(&tok.tokenize("café")), vec!["caf", "##é"]);
        assert_eq!(texts(&tok.tokenize("naïve")), vec!["naï", "##ve"]);
    }

    #[test]
    fn custom_continuation_prefix() {
        let tokens = vec!["[UNK]".into(), "jump".into(), "@@s".into()];
        let vocab = Vocabulary::from_tokens(tokens, "[UNK]").unwrap();
        let tok = WordPieceTokenizer::new(
            Arc::new(vocab),
            WordPieceConfig {
                continuation_prefix: "@@".into(),
                ..WordPieceConfig::default()
            },
        );
        let pieces = tok.tokenize("jumps");
        assert_eq!(texts(&pieces), vec!["jump", "@@s"]);
        assert_eq!(tok.detokenize(&pieces), "jumps");
    }

    #[test]
    fn empty_text_gives_empty_sequence() {
        let seq = fox().tokenize_to_ids("");
        assert!(seq.is_empty());
        assert!(seq.spans().is_empty());
        assert!(seq.is_consistent());
    }

    #[test]
    fn detokenize_glues_continuations() {
        let tok = fox();
        let seq = tok.tokenize_to_ids("the fox jumps");
        assert_eq!(tok.detokenize(seq.tokens()), "the fox jumps");
    }

    #[test]
    fn punctuation_units_get_their_own_span() {
        let tok = tokenizer(&["[UNK]", "fox", "."], true);
        let seq = tok.tokenize_to_ids("fox.");
        assert_eq!(seq.words().collect::<Vec<_>>(), vec!["fox", "."]);
        assert_eq!(seq.ids(), vec![1, 2]);
    }
}
