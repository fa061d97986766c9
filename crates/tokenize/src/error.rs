#![forbid(unsafe_code)]

use std::path::PathBuf;

/// Errors raised while loading a vocabulary or resolving tokens.
#[derive(Debug, thiserror::Error)]
pub enum TokenizeError {
    /// Vocabulary file missing or unreadable.
    #[error("failed to read vocabulary {path}: {source}")]
    VocabLoad {
        /// path that was read
        path: PathBuf,
        /// underlying IO failure
        #[source]
        source: std::io::Error,
    },
    /// Vocabulary contained no entries.
    #[error("vocabulary is empty")]
    EmptyVocabulary,
    /// The same token appeared on two lines.
    #[error("duplicate vocabulary token: {0}")]
    DuplicateToken(String),
    /// A required sentinel token is not in the vocabulary.
    #[error("special token {0} not found in vocabulary")]
    MissingSpecialToken(String),
    /// Id lookup outside the loaded range.
    #[error("token id {id} out of range (vocabulary size {len})")]
    IndexOutOfRange {
        /// requested id
        id: u32,
        /// number of entries in the vocabulary
        len: usize,
    },
}

/// Result alias for tokenizer operations.
pub type Result<T> = std::result::Result<T, TokenizeError>;
