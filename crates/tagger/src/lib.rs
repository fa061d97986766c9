#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::indexing_slicing)]
#![deny(missing_docs, unused_must_use)]

//! Part-of-speech tagging pipeline around a fixed-shape scoring model.
//!
//! The numeric model is a black box taking `[1, max_length]` ids and an
//! attention mask and returning `[1, max_length, classes]` scores. Everything
//! around it lives here: WordPiece tokenization (from the `tokenize` crate),
//! fixed-length encoding with sentinels and padding, arg-max decoding and
//! folding of subword labels back onto the original words.
//!
//! Layout (important files):
//! - `config.rs` — `TaggerConfig` (explicit settings) and `ModelDirectory`
//! - `encode.rs` — `SequenceEncoder` → `EncodedInput`
//! - `model.rs` — `ScoringModel` boundary, `ScoreTensor`, `EmbeddingClassifier`
//! - `labels.rs` — `LabelSet` (class index → tag)
//! - `decode.rs` — `LabelDecoder` → `TaggedWord` (arg-max helpers in `math.rs`)
//! - `linear.rs`, `loader.rs` — dense layer and f32 weight files for the reference backend
//! - `bin/tag.rs` — CLI, `bin/server.rs` — HTTP endpoint

use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use tokenize::{TokenSequence, Vocabulary, WordPieceTokenizer};
use tracing::{debug, info};

/// Configuration and artifact location.
pub mod config;
/// Subword-to-word label decoding.
pub mod decode;
/// Fixed-length sequence encoding.
pub mod encode;
/// Error taxonomy.
pub mod error;
/// Tag label set.
pub mod labels;
/// Dense layer helper.
pub mod linear;
/// Weight file helpers.
pub mod loader;
/// Arg-max and softmax over score rows.
pub mod math;
/// Scoring model boundary and reference backend.
pub mod model;

pub use config::{ModelDirectory, TaggerConfig};
pub use decode::{LabelDecoder, TaggedWord};
pub use encode::{EncodedInput, SequenceEncoder};
pub use error::{ModelError, Result, TaggerError};
pub use labels::LabelSet;
pub use model::{EmbeddingClassifier, ScoreTensor, ScoringModel};

/// Text in, `(word, tag)` pairs out.
///
/// Immutable after construction; share it across threads with `Arc` or call
/// [`Tagger::predict_all`].
pub struct Tagger {
    config: TaggerConfig,
    tokenizer: WordPieceTokenizer,
    encoder: SequenceEncoder,
    decoder: LabelDecoder,
    model: Box<dyn ScoringModel>,
}

impl Tagger {
    /// Assemble a pipeline from loaded parts.
    ///
    /// # Errors
    ///
    /// `Config` for invalid settings, `Tokenize` when a sentinel is missing
    /// from the vocabulary.
    pub fn new(
        config: TaggerConfig,
        vocab: Arc<Vocabulary>,
        labels: LabelSet,
        model: Box<dyn ScoringModel>,
    ) -> Result<Self> {
        config.validate()?;
        let encoder = SequenceEncoder::from_vocab(&vocab, &config)?;
        let tokenizer = WordPieceTokenizer::new(vocab, config.wordpiece());
        Ok(Self {
            config,
            tokenizer,
            encoder,
            decoder: LabelDecoder::new(labels),
            model,
        })
    }

    /// Load a pipeline from an unpacked model directory, reading its
    /// `tagger.json` when present.
    ///
    /// # Errors
    ///
    /// Any configuration, artifact, vocabulary, label set or model load failure.
    pub fn from_directory(dir: impl AsRef<Path>) -> Result<Self> {
        let config = TaggerConfig::for_directory(dir.as_ref())?;
        Self::from_directory_with_config(dir, config)
    }

    /// Load a pipeline from a model directory with explicit settings.
    ///
    /// # Errors
    ///
    /// Same as [`Tagger::from_directory`].
    pub fn from_directory_with_config(dir: impl AsRef<Path>, config: TaggerConfig) -> Result<Self> {
        config.validate()?;
        let located = ModelDirectory::locate(dir, &config)?;
        let vocab = Arc::new(Vocabulary::load_with_unk(&located.vocab, &config.unk_token)?);
        let labels = LabelSet::load(&located.labels)?;
        let model = EmbeddingClassifier::load(
            &located.model,
            vocab.len(),
            config.hidden_size,
            labels.len(),
        )?;
        let vocab_len = vocab.len();
        let tagger = Self::new(config, vocab, labels, Box::new(model))?;
        info!(
            dir = %located.root.display(),
            max_length = tagger.config.max_length,
            vocab = vocab_len,
            classes = tagger.labels().len(),
            "tagger ready"
        );
        Ok(tagger)
    }

    /// Active configuration.
    pub fn config(&self) -> &TaggerConfig {
        &self.config
    }

    /// Tag labels the model scores.
    pub fn labels(&self) -> &LabelSet {
        self.decoder.labels()
    }

    /// Segment and WordPiece-tokenize `text`.
    pub fn tokenize(&self, text: &str) -> TokenSequence {
        self.tokenizer.tokenize_to_ids(text)
    }

    /// Tokenize and encode `text` into the fixed-length model input.
    ///
    /// # Errors
    ///
    /// `InputTooLong` when the subwords do not fit.
    pub fn encode(&self, text: &str) -> Result<(TokenSequence, EncodedInput)> {
        let seq = self.tokenize(text);
        let encoded = self.encoder.encode(&seq.ids())?;
        Ok((seq, encoded))
    }

    /// Tag every word of `text`.
    ///
    /// Text without any word yields an empty result without calling the model.
    ///
    /// # Errors
    ///
    /// `InputTooLong`, `ModelInvocation`, or `AlignmentMismatch` when the
    /// model's output does not line up with the input.
    pub fn predict(&self, text: &str) -> Result<Vec<TaggedWord>> {
        let (seq, encoded) = self.encode(text)?;
        if seq.spans().is_empty() {
            return Ok(Vec::new());
        }
        debug!(words = seq.spans().len(), subwords = seq.len(), "tagging");

        let scores = self.model.score(&encoded).map_err(TaggerError::ModelInvocation)?;
        if scores.seq_len() != encoded.input_ids.len() {
            return Err(TaggerError::AlignmentMismatch(format!(
                "model returned {} positions for an input of {}",
                scores.seq_len(),
                encoded.input_ids.len()
            )));
        }
        self.decoder.decode(&scores, encoded.real_len, seq.spans())
    }

    /// Tag independent texts in parallel, one model call per text.
    pub fn predict_all(&self, texts: &[&str]) -> Vec<Result<Vec<TaggedWord>>> {
        texts.par_iter().map(|text| self.predict(text)).collect()
    }
}
