#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use tokenize::WordSpan;

use crate::error::{Result, TaggerError};
use crate::labels::LabelSet;
use crate::math::{argmax, softmax};
use crate::model::ScoreTensor;

/// One original word and the tag predicted for it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaggedWord {
    /// literal source text of the word
    pub word: String,
    /// predicted tag label
    pub tag: String,
    /// softmax probability of the tag at the word's first subword
    pub confidence: f32,
}

/// Turns per-position class scores into one tag per original word.
///
/// Position 0 of the score tensor is the begin sentinel; subword `p` of the
/// token sequence sits at tensor position `p + 1`. A word's tag is the label
/// predicted for its first subword; continuation subwords are ignored.
#[derive(Clone, Debug)]
pub struct LabelDecoder {
    labels: LabelSet,
}

impl LabelDecoder {
    /// Decoder over a label set.
    pub fn new(labels: LabelSet) -> Self {
        Self { labels }
    }

    /// Class labels, in class-index order.
    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Decode scores for `num_real_subwords` subwords folded by `spans`.
    ///
    /// # Errors
    ///
    /// `AlignmentMismatch` when the tensor cannot hold the subwords plus both
    /// sentinels, its class count differs from the label set, or `spans` do
    /// not cover `0..num_real_subwords` contiguously. No partial result is
    /// ever returned.
    pub fn decode(
        &self,
        scores: &ScoreTensor,
        num_real_subwords: usize,
        spans: &[WordSpan],
    ) -> Result<Vec<TaggedWord>> {
        self.check_alignment(scores, num_real_subwords, spans)?;

        let per_position = (1..=num_real_subwords)
            .map(|pos| self.position_label(scores, pos))
            .collect::<Result<Vec<_>>>()?;

        spans
            .iter()
            .map(|span| -> Result<TaggedWord> {
                let (tag, confidence) = per_position.get(span.range.start).ok_or_else(|| {
                    TaggerError::AlignmentMismatch(format!(
                        "no prediction for subword {}",
                        span.range.start
                    ))
                })?;
                Ok(TaggedWord {
                    word: span.word.clone(),
                    tag: (*tag).to_string(),
                    confidence: *confidence,
                })
            })
            .collect()
    }

    fn check_alignment(
        &self,
        scores: &ScoreTensor,
        num_real_subwords: usize,
        spans: &[WordSpan],
    ) -> Result<()> {
        if scores.num_classes() != self.labels.len() {
            return Err(TaggerError::AlignmentMismatch(format!(
                "model scores {} classes, label set has {}",
                scores.num_classes(),
                self.labels.len()
            )));
        }
        if num_real_subwords + 2 > scores.seq_len() {
            return Err(TaggerError::AlignmentMismatch(format!(
                "{num_real_subwords} subwords plus sentinels exceed {} scored positions",
                scores.seq_len()
            )));
        }
        let mut next = 0;
        for span in spans {
            if span.range.start != next || span.range.end <= span.range.start {
                return Err(TaggerError::AlignmentMismatch(format!(
                    "span {:?} for {:?} does not continue at subword {next}",
                    span.range, span.word
                )));
            }
            next = span.range.end;
        }
        if next != num_real_subwords {
            return Err(TaggerError::AlignmentMismatch(format!(
                "boundary map covers {next} subwords, expected {num_real_subwords}"
            )));
        }
        Ok(())
    }

    // Arg-max label at tensor position `pos`, with its softmax probability.
    fn position_label(&self, scores: &ScoreTensor, pos: usize) -> Result<(&str, f32)> {
        let row = scores
            .row(pos)
            .ok_or_else(|| TaggerError::AlignmentMismatch(format!("no scores at position {pos}")))?;
        let class = argmax(row);
        let mut probs = row.to_vec();
        softmax(&mut probs);
        let label = self
            .labels
            .label(class)
            .ok_or_else(|| TaggerError::AlignmentMismatch(format!("class {class} has no label")))?;
        Ok((label, probs.get(class).copied().unwrap_or(0.0)))
    }
}
