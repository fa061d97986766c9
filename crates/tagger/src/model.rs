#![forbid(unsafe_code)]

use std::path::Path;

use tracing::debug;

use crate::encode::EncodedInput;
use crate::error::{ModelError, Result, TaggerError};
use crate::linear::Linear;
use crate::loader;

/// Per-position class scores, shape `[1, seq_len, num_classes]`.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreTensor {
    data: Vec<f32>,
    seq_len: usize,
    num_classes: usize,
}

impl ScoreTensor {
    /// Wrap row-major scores.
    ///
    /// # Errors
    ///
    /// `AlignmentMismatch` unless the batch is 1, there is at least one class
    /// and `data` holds exactly `seq_len * num_classes` values.
    pub fn new(shape: [usize; 3], data: Vec<f32>) -> Result<Self> {
        let [batch, seq_len, num_classes] = shape;
        if batch != 1 {
            return Err(TaggerError::AlignmentMismatch(format!(
                "score batch must be 1, got {batch}"
            )));
        }
        if num_classes == 0 {
            return Err(TaggerError::AlignmentMismatch("score tensor has no classes".into()));
        }
        if seq_len.checked_mul(num_classes) != Some(data.len()) {
            return Err(TaggerError::AlignmentMismatch(format!(
                "score shape {shape:?} does not match {} values",
                data.len()
            )));
        }
        Ok(Self {
            data,
            seq_len,
            num_classes,
        })
    }

    /// `[1, seq_len, num_classes]`
    pub fn shape(&self) -> [usize; 3] {
        [1, self.seq_len, self.num_classes]
    }

    /// Number of positions.
    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    /// Number of classes per position.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Scores of every class at `pos`.
    pub fn row(&self, pos: usize) -> Option<&[f32]> {
        let start = pos.checked_mul(self.num_classes)?;
        self.data.get(start..start + self.num_classes)
    }

    /// Score of `class` at `pos`.
    pub fn score(&self, pos: usize, class: usize) -> Option<f32> {
        if class >= self.num_classes {
            return None;
        }
        self.row(pos)?.get(class).copied()
    }
}

/// Boundary to the numeric model: fixed-shape ids and mask in, scores out.
pub trait ScoringModel: Send + Sync {
    /// Score every position of `input`.
    ///
    /// # Errors
    ///
    /// Any backend failure; the pipeline reports it as `ModelInvocation`.
    fn score(&self, input: &EncodedInput) -> std::result::Result<ScoreTensor, ModelError>;
}

impl<F> ScoringModel for F
where
    F: Fn(&EncodedInput) -> std::result::Result<ScoreTensor, ModelError> + Send + Sync,
{
    fn score(&self, input: &EncodedInput) -> std::result::Result<ScoreTensor, ModelError> {
        self(input)
    }
}

/// Reference backend: a token embedding table followed by a dense classifier.
///
/// Weight file layout (little-endian `f32`): embeddings `[vocab x hidden]`,
/// classifier weights `[classes x hidden]`, classifier bias `[classes]`.
/// Positions with mask 0 score 0 for every class.
#[derive(Clone, Debug, PartialEq)]
pub struct EmbeddingClassifier {
    embeddings: Vec<f32>,
    hidden: usize,
    classifier: Linear,
}

impl EmbeddingClassifier {
    /// Load weights sized for the given vocabulary, width and class count.
    ///
    /// # Errors
    ///
    /// `ModelLoad` if the file is unreadable or has the wrong number of values.
    pub fn load(
        path: impl AsRef<Path>,
        vocab_size: usize,
        hidden: usize,
        num_classes: usize,
    ) -> Result<Self> {
        let path = path.as_ref();
        let floats = loader::load_f32_file(path)?;
        let fail = |reason: String| TaggerError::ModelLoad {
            path: path.to_path_buf(),
            reason,
        };
        let table = vocab_size
            .checked_mul(hidden)
            .ok_or_else(|| fail("embedding table size overflows".into()))?;
        let expected = table + num_classes * hidden + num_classes;
        if floats.len() != expected {
            return Err(fail(format!(
                "expected {expected} values for vocab {vocab_size}, hidden {hidden}, \
                 classes {num_classes}, found {}",
                floats.len()
            )));
        }
        let (embeddings, dense) = floats.split_at(table);
        let classifier = Linear::from_raw(hidden, num_classes, dense)
            .ok_or_else(|| fail("classifier weights malformed".into()))?;
        debug!(
            path = %path.display(),
            vocab_size,
            hidden,
            num_classes,
            "embedding classifier loaded"
        );
        Self::from_parts(embeddings.to_vec(), hidden, classifier)
    }

    /// Assemble from an in-memory table and classifier.
    ///
    /// # Errors
    ///
    /// `ModelLoad` when the widths disagree or the table is ragged.
    pub fn from_parts(embeddings: Vec<f32>, hidden: usize, classifier: Linear) -> Result<Self> {
        if hidden == 0 || classifier.in_dim() != hidden || embeddings.len() % hidden != 0 {
            return Err(TaggerError::ModelLoad {
                path: "<memory>".into(),
                reason: format!(
                    "embedding width {hidden} incompatible with table of {} values \
                     and classifier input {}",
                    embeddings.len(),
                    classifier.in_dim()
                ),
            });
        }
        Ok(Self {
            embeddings,
            hidden,
            classifier,
        })
    }

    /// Number of output classes.
    pub fn num_classes(&self) -> usize {
        self.classifier.out_dim()
    }

    fn embedding(&self, id: u32) -> Option<&[f32]> {
        let start = usize::try_from(id).ok()?.checked_mul(self.hidden)?;
        self.embeddings.get(start..start + self.hidden)
    }
}

impl ScoringModel for EmbeddingClassifier {
    fn score(&self, input: &EncodedInput) -> std::result::Result<ScoreTensor, ModelError> {
        let classes = self.num_classes();
        let mut data = Vec::with_capacity(input.input_ids.len() * classes);
        for (&id, &mask) in input.input_ids.iter().zip(&input.attention_mask) {
            if mask == 0 {
                data.extend(std::iter::repeat(0.0).take(classes));
                continue;
            }
            let row = self
                .embedding(id)
                .ok_or_else(|| format!("token id {id} has no embedding row"))?;
            data.extend(self.classifier.forward(row));
        }
        Ok(ScoreTensor::new([1, input.input_ids.len(), classes], data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(ids: Vec<u32>, mask: Vec<u32>) -> EncodedInput {
        let real_len = mask.iter().filter(|&&m| m == 1).count().saturating_sub(2);
        EncodedInput {
            input_ids: ids,
            attention_mask: mask,
            real_len,
        }
    }

    #[test]
    fn tensor_shape_is_validated() {
        assert!(ScoreTensor::new([1, 2, 3], vec![0.0; 6]).is_ok());
        assert!(matches!(
            ScoreTensor::new([1, 2, 3], vec![0.0; 5]),
            Err(TaggerError::AlignmentMismatch(_))
        ));
        assert!(ScoreTensor::new([2, 1, 3], vec![0.0; 6]).is_err());
        assert!(ScoreTensor::new([1, 4, 0], Vec::new()).is_err());
    }

    #[test]
    fn rows_and_scores() {
        let t = ScoreTensor::new([1, 2, 2], vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        assert_eq!(t.row(1), Some(&[0.3, 0.4][..]));
        assert_eq!(t.score(0, 1), Some(0.2));
        assert_eq!(t.score(2, 0), None);
        assert_eq!(t.score(0, 2), None);
        assert_eq!(t.shape(), [1, 2, 2]);
    }

    fn one_hot_classifier() -> EmbeddingClassifier {
        // vocab of 3, hidden 2, 2 classes; id 1 leans class 0, id 2 leans class 1
        let table = vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0];
        let dense = Linear::from_raw(2, 2, &[1.0, 0.0, 0.0, 1.0, 0.0, 0.0]).unwrap();
        EmbeddingClassifier::from_parts(table, 2, dense).unwrap()
    }

    #[test]
    fn classifier_scores_active_positions_only() {
        let model = one_hot_classifier();
        let out = model.score(&encoded(vec![1, 2, 0, 0], vec![1, 1, 0, 0])).unwrap();
        assert_eq!(out.shape(), [1, 4, 2]);
        assert_eq!(out.row(0), Some(&[1.0, 0.0][..]));
        assert_eq!(out.row(1), Some(&[0.0, 1.0][..]));
        assert_eq!(out.row(3), Some(&[0.0, 0.0][..]));
    }

    #[test]
    fn unknown_id_is_a_model_error() {
        let model = one_hot_classifier();
        assert!(model.score(&encoded(vec![9], vec![1])).is_err());
    }

    #[test]
    fn load_checks_weight_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        // 3x2 table + 2x2 weights + 2 bias
        loader::save_f32_file(&path, &[0.5; 12]).unwrap();
        let model = EmbeddingClassifier::load(&path, 3, 2, 2).unwrap();
        assert_eq!(model.num_classes(), 2);
        assert!(matches!(
            EmbeddingClassifier::load(&path, 4, 2, 2),
            Err(TaggerError::ModelLoad { .. })
        ));
    }

    #[test]
    fn closures_are_scoring_models() {
        let model = |input: &EncodedInput| -> std::result::Result<ScoreTensor, ModelError> {
            Ok(ScoreTensor::new([1, input.input_ids.len(), 1], vec![0.0; input.input_ids.len()])?)
        };
        let out = ScoringModel::score(&model, &encoded(vec![1, 2], vec![1, 1])).unwrap();
        assert_eq!(out.seq_len(), 2);
    }
}
