#![forbid(unsafe_code)]

use tokenize::Vocabulary;
use tracing::warn;

use crate::config::TaggerConfig;
use crate::error::{Result, TaggerError};

/// Fixed-length model input: ids plus attention mask.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedInput {
    /// token ids, `[CLS] subwords.. [SEP] [PAD]..`
    pub input_ids: Vec<u32>,
    /// 1 for real positions (sentinels included), 0 for padding
    pub attention_mask: Vec<u32>,
    /// number of subwords between the sentinels
    pub real_len: usize,
}

impl EncodedInput {
    /// Tensor shape handed to the scoring model.
    pub fn shape(&self) -> [usize; 2] {
        [1, self.input_ids.len()]
    }

    /// Positions holding a sentinel or subword.
    pub fn active_len(&self) -> usize {
        self.real_len + 2
    }
}

/// Wraps subword ids with sentinels and pads to the fixed length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SequenceEncoder {
    max_length: usize,
    cls_id: u32,
    sep_id: u32,
    pad_id: u32,
}

impl SequenceEncoder {
    /// Encoder with explicit sentinel ids.
    pub fn new(max_length: usize, cls_id: u32, sep_id: u32, pad_id: u32) -> Self {
        Self {
            max_length,
            cls_id,
            sep_id,
            pad_id,
        }
    }

    /// Resolve sentinel ids from the vocabulary. Padding uses id 0 unless the
    /// configuration names a pad token.
    ///
    /// # Errors
    ///
    /// `MissingSpecialToken` when the begin or end sentinel, or a configured
    /// pad token, is not in `vocab`.
    pub fn from_vocab(vocab: &Vocabulary, config: &TaggerConfig) -> Result<Self> {
        let required = |token: &str| {
            vocab
                .get(token)
                .ok_or_else(|| tokenize::TokenizeError::MissingSpecialToken(token.to_string()))
        };
        let cls_id = required(&config.cls_token)?;
        let sep_id = required(&config.sep_token)?;
        let pad_id = match &config.pad_token {
            Some(token) => required(token)?,
            None => 0,
        };
        Ok(Self::new(config.max_length, cls_id, sep_id, pad_id))
    }

    /// Fixed sequence length.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Most subwords that fit between the sentinels.
    pub fn capacity(&self) -> usize {
        self.max_length.saturating_sub(2)
    }

    /// Build the fixed-length input for `ids`.
    ///
    /// # Errors
    ///
    /// `InputTooLong` when `ids.len() + 2` exceeds the fixed length. The input
    /// is never truncated.
    pub fn encode(&self, ids: &[u32]) -> Result<EncodedInput> {
        let actual = ids.len() + 2;
        if actual > self.max_length {
            warn!(actual, max = self.max_length, "input rejected, too many subwords");
            return Err(TaggerError::InputTooLong {
                actual,
                max: self.max_length,
            });
        }
        let mut input_ids = Vec::with_capacity(self.max_length);
        input_ids.push(self.cls_id);
        input_ids.extend_from_slice(ids);
        input_ids.push(self.sep_id);
        input_ids.resize(self.max_length, self.pad_id);

        let mut attention_mask = vec![1; actual];
        attention_mask.resize(self.max_length, 0);

        Ok(EncodedInput {
            input_ids,
            attention_mask,
            real_len: ids.len(),
        })
    }
}
