#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokenize::WordPieceConfig;

use crate::error::{Result, TaggerError};

/// Name of the optional configuration file inside a model directory.
pub const CONFIG_FILE_NAME: &str = "tagger.json";

/// Pipeline configuration, passed explicitly at construction time.
///
/// Every field has a default matching the shipped BERT tagger, so a
/// `tagger.json` only needs to name what differs. Uncased models set
/// `do_lower_case`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggerConfig {
    /// fixed encoded length, sentinels included
    pub max_length: usize,
    /// lowercase units before vocabulary lookup (off: entries match verbatim)
    pub do_lower_case: bool,
    /// unknown sentinel
    pub unk_token: String,
    /// begin sentinel
    pub cls_token: String,
    /// end sentinel
    pub sep_token: String,
    /// pad sentinel looked up in the vocabulary; padding uses id 0 when unset
    pub pad_token: Option<String>,
    /// marker for non-initial subwords
    pub continuation_prefix: String,
    /// units with more characters become unknown
    pub max_chars_per_word: usize,
    /// vocabulary file name inside the model directory
    pub vocab_file: String,
    /// label set file name inside the model directory
    pub labels_file: String,
    /// model weights file name inside the model directory
    pub model_file: String,
    /// embedding width of the reference backend
    pub hidden_size: usize,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            max_length: 128,
            do_lower_case: false,
            unk_token: "[UNK]".into(),
            cls_token: "[CLS]".into(),
            sep_token: "[SEP]".into(),
            pad_token: None,
            continuation_prefix: "##".into(),
            max_chars_per_word: 100,
            vocab_file: "vocab.txt".into(),
            labels_file: "outTokens.txt".into(),
            model_file: "model.bin".into(),
            hidden_size: 32,
        }
    }
}

impl TaggerConfig {
    /// Read and validate a JSON configuration file.
    ///
    /// # Errors
    ///
    /// `Config` when the file is unreadable, malformed or fails validation.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| TaggerError::Config(format!("{}: {e}", path.display())))?;
        let cfg: Self = serde_json::from_str(&raw)
            .map_err(|e| TaggerError::Config(format!("{}: {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Configuration for a model directory: its `tagger.json` when present,
    /// defaults otherwise.
    ///
    /// # Errors
    ///
    /// Same as [`TaggerConfig::from_json_file`].
    pub fn for_directory(dir: impl AsRef<Path>) -> Result<Self> {
        let candidate = dir.as_ref().join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            Self::from_json_file(candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Reject settings the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// `Config` describing the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.max_length < 2 {
            return Err(TaggerError::Config(format!(
                "max_length must hold both sentinels, got {}",
                self.max_length
            )));
        }
        for (name, value) in [
            ("unk_token", &self.unk_token),
            ("cls_token", &self.cls_token),
            ("sep_token", &self.sep_token),
            ("continuation_prefix", &self.continuation_prefix),
        ] {
            if value.is_empty() {
                return Err(TaggerError::Config(format!("{name} must not be empty")));
            }
        }
        if self.pad_token.as_deref() == Some("") {
            return Err(TaggerError::Config("pad_token must not be empty".into()));
        }
        if self.max_chars_per_word == 0 {
            return Err(TaggerError::Config("max_chars_per_word must be positive".into()));
        }
        if self.hidden_size == 0 {
            return Err(TaggerError::Config("hidden_size must be positive".into()));
        }
        Ok(())
    }

    /// Tokenizer settings derived from this configuration.
    pub fn wordpiece(&self) -> WordPieceConfig {
        WordPieceConfig {
            do_lower_case: self.do_lower_case,
            continuation_prefix: self.continuation_prefix.clone(),
            max_chars_per_word: self.max_chars_per_word,
        }
    }
}

/// Resolved artifact paths of an unpacked model directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelDirectory {
    /// directory the artifacts were found in
    pub root: PathBuf,
    /// vocabulary file
    pub vocab: PathBuf,
    /// label set file
    pub labels: PathBuf,
    /// model weights
    pub model: PathBuf,
}

impl ModelDirectory {
    /// Locate the vocabulary, label set and model artifact inside `dir`.
    ///
    /// # Errors
    ///
    /// `MissingArtifact` naming the first file that does not exist.
    pub fn locate(dir: impl AsRef<Path>, config: &TaggerConfig) -> Result<Self> {
        let root = dir.as_ref().to_path_buf();
        let found = |name: &str| -> Result<PathBuf> {
            let path = root.join(name);
            if path.is_file() {
                Ok(path)
            } else {
                Err(TaggerError::MissingArtifact(path))
            }
        };
        let vocab = found(&config.vocab_file)?;
        let labels = found(&config.labels_file)?;
        let model = found(&config.model_file)?;
        Ok(Self {
            root,
            vocab,
            labels,
            model,
        })
    }
}
