#![forbid(unsafe_code)]

use std::path::PathBuf;

use tokenize::TokenizeError;

/// Opaque failure raised by a scoring backend.
pub type ModelError = Box<dyn std::error::Error + Send + Sync>;

/// Failures of the tagging pipeline.
#[derive(Debug, thiserror::Error)]
pub enum TaggerError {
    /// Vocabulary could not be loaded or queried.
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
    /// Label set file missing, unreadable or empty.
    #[error("failed to load label set {path}: {reason}")]
    LabelSetLoad {
        /// label file path
        path: PathBuf,
        /// what went wrong
        reason: String,
    },
    /// Subwords plus sentinels do not fit the fixed input length.
    #[error("input too long: {actual} positions needed, model accepts {max}")]
    InputTooLong {
        /// sequence length required, sentinels included
        actual: usize,
        /// configured fixed length
        max: usize,
    },
    /// Boundary map, subword count and score tensor disagree.
    #[error("alignment mismatch: {0}")]
    AlignmentMismatch(String),
    /// The scoring backend failed.
    #[error("model invocation failed: {0}")]
    ModelInvocation(#[source] ModelError),
    /// Model artifact missing or malformed.
    #[error("failed to load model {path}: {reason}")]
    ModelLoad {
        /// artifact path
        path: PathBuf,
        /// what went wrong
        reason: String,
    },
    /// Configuration rejected.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// A required file is not present in the model directory.
    #[error("missing artifact: {0}")]
    MissingArtifact(PathBuf),
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, TaggerError>;
