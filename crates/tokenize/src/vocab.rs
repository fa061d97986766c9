#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, TokenizeError};

/// Default unknown sentinel used by BERT-style vocabularies.
pub const DEFAULT_UNK_TOKEN: &str = "[UNK]";

/// Immutable bidirectional mapping between subword strings and dense ids.
///
/// Line order of the source file defines the ids. Once built the vocabulary
/// is read-only and can be shared between tokenizers behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    token_to_id: HashMap<String, u32>,
    id_to_token: Vec<String>,
    unk_id: u32,
}

impl Vocabulary {
    /// Load a newline-delimited vocabulary using `[UNK]` as the unknown token.
    ///
    /// # Errors
    ///
    /// `VocabLoad` if the file cannot be read, `EmptyVocabulary` if it holds
    /// no entries, `MissingSpecialToken` if `[UNK]` is absent.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_unk(path, DEFAULT_UNK_TOKEN)
    }

    /// Load a vocabulary file with an explicit unknown token.
    ///
    /// # Errors
    ///
    /// Same as [`Vocabulary::load`].
    pub fn load_with_unk(path: impl AsRef<Path>, unk_token: &str) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| TokenizeError::VocabLoad {
            path: path.to_path_buf(),
            source,
        })?;
        let tokens = content
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        let vocab = Self::from_tokens(tokens, unk_token)?;
        debug!(
            path = %path.display(),
            size = vocab.len(),
            unk_id = vocab.unk_id,
            "vocabulary loaded"
        );
        Ok(vocab)
    }

    /// Build a vocabulary from tokens in id order.
    ///
    /// # Errors
    ///
    /// `EmptyVocabulary`, `DuplicateToken`, or `MissingSpecialToken` when
    /// `unk_token` is not among `tokens`.
    pub fn from_tokens(tokens: Vec<String>, unk_token: &str) -> Result<Self> {
        if tokens.is_empty() {
            return Err(TokenizeError::EmptyVocabulary);
        }
        let mut token_to_id = HashMap::with_capacity(tokens.len());
        for (idx, token) in tokens.iter().enumerate() {
            let id = u32::try_from(idx).map_err(|_| TokenizeError::IndexOutOfRange {
                id: u32::MAX,
                len: tokens.len(),
            })?;
            if token_to_id.insert(token.clone(), id).is_some() {
                return Err(TokenizeError::DuplicateToken(token.clone()));
            }
        }
        let unk_id = token_to_id
            .get(unk_token)
            .copied()
            .ok_or_else(|| TokenizeError::MissingSpecialToken(unk_token.to_string()))?;
        Ok(Self {
            token_to_id,
            id_to_token: tokens,
            unk_id,
        })
    }

    /// Id of `token`, or the unknown id when absent.
    pub fn id_of(&self, token: &str) -> u32 {
        self.get(token).unwrap_or(self.unk_id)
    }

    /// Id of `token` if present.
    pub fn get(&self, token: &str) -> Option<u32> {
        self.token_to_id.get(token).copied()
    }

    /// Whether `token` is a vocabulary entry.
    pub fn contains(&self, token: &str) -> bool {
        self.token_to_id.contains_key(token)
    }

    /// Token string for `id`.
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` when `id` is not below [`Vocabulary::len`].
    pub fn token_of(&self, id: u32) -> Result<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|idx| self.id_to_token.get(idx))
            .map(String::as_str)
            .ok_or(TokenizeError::IndexOutOfRange {
                id,
                len: self.id_to_token.len(),
            })
    }

    /// Id of the unknown sentinel.
    pub fn unk_id(&self) -> u32 {
        self.unk_id
    }

    /// The unknown sentinel string.
    pub fn unk_token(&self) -> &str {
        self.id_to_token
            .get(self.unk_id as usize)
            .map_or(DEFAULT_UNK_TOKEN, String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.id_to_token.len()
    }

    /// True when there are no entries (never the case for a loaded vocabulary).
    pub fn is_empty(&self) -> bool {
        self.id_to_token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn ids_follow_line_order() {
        let v =
            Vocabulary::from_tokens(tokens(&["[PAD]", "[UNK]", "the", "##s"]), "[UNK]").unwrap();
        assert_eq!(v.id_of("[PAD]"), 0);
        assert_eq!(v.id_of("the"), 2);
        assert_eq!(v.id_of("##s"), 3);
        assert_eq!(v.token_of(2).unwrap(), "the");
        assert_eq!(v.len(), 4);
    }

    #[test]
    fn missing_token_maps_to_unknown() {
        let v = Vocabulary::from_tokens(tokens(&["[UNK]", "fox"]), "[UNK]").unwrap();
        assert_eq!(v.id_of("wolf"), v.unk_id());
        assert_eq!(v.get("wolf"), None);
        assert_eq!(v.unk_token(), "[UNK]");
    }

    #[test]
    fn token_of_out_of_range() {
        let v = Vocabulary::from_tokens(tokens(&["[UNK]"]), "[UNK]").unwrap();
        match v.token_of(1) {
            Err(TokenizeError::IndexOutOfRange { id, len }) => {
                assert_eq!(id, 1);
                assert_eq!(len, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_duplicate_and_missing_unk() {
        assert!(matches!(
            Vocabulary::from_tokens(Vec::new(), "[UNK]"),
            Err(TokenizeError::EmptyVocabulary)
        ));
        assert!(matches!(
            Vocabulary::from_tokens(tokens(&["[UNK]", "a", "a"]), "[UNK]"),
            Err(TokenizeError::DuplicateToken(t)) if t == "a"
        ));
        assert!(matches!(
            Vocabulary::from_tokens(tokens(&["a"]), "[UNK]"),
            Err(TokenizeError::MissingSpecialToken(_))
        ));
    }

    #[test]
    fn load_skips_blank_lines_and_carriage_returns() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[UNK]\r\n\nthe\r\nfox\n\n").unwrap();
        let v = Vocabulary::load(file.path()).unwrap();
        assert_eq!(v.len(), 3);
        assert_eq!(v.id_of("the"), 1);
        assert_eq!(v.id_of("fox"), 2);
    }

    #[test]
    fn load_missing_or_blank_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Vocabulary::load(dir.path().join("nope.txt")),
            Err(TokenizeError::VocabLoad { .. })
        ));
        let blank = dir.path().join("blank.txt");
        std::fs::write(&blank, "\n\n").unwrap();
        assert!(matches!(
            Vocabulary::load(&blank),
            Err(TokenizeError::EmptyVocabulary)
        ));
    }
}
