#![forbid(unsafe_code)]

use std::path::Path;

use tracing::debug;

use crate::error::{Result, TaggerError};

/// Class index to tag label mapping, one label per line of the label file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    /// Load labels from a newline-delimited file; blank lines are skipped.
    ///
    /// # Errors
    ///
    /// `LabelSetLoad` when the file is unreadable or holds no labels.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| TaggerError::LabelSetLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let labels: Vec<String> = content
            .lines()
            .map(|l| l.trim_end_matches('\r'))
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        if labels.is_empty() {
            return Err(TaggerError::LabelSetLoad {
                path: path.to_path_buf(),
                reason: "no labels".into(),
            });
        }
        debug!(path = %path.display(), classes = labels.len(), "label set loaded");
        Ok(Self { labels })
    }

    /// Build from labels in class order.
    ///
    /// # Errors
    ///
    /// `LabelSetLoad` when `labels` is empty.
    pub fn from_labels<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(TaggerError::LabelSetLoad {
                path: "<memory>".into(),
                reason: "no labels".into(),
            });
        }
        Ok(Self { labels })
    }

    /// Label for class `idx`.
    pub fn label(&self, idx: usize) -> Option<&str> {
        self.labels.get(idx).map(String::as_str)
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always false for a constructed set.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in class order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}
