//! Bidirectional mapping between risk labels and class indices

use crate::errors::{Result, RiskCoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Fitted label encoder. Classes are sorted lexicographically so that the
/// mapping does not depend on row order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    pub classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let classes: BTreeSet<String> = labels
            .into_iter()
            .map(|l| l.as_ref().to_string())
            .collect();
        if classes.is_empty() {
            return Err(RiskCoreError::EmptyFit("LabelEncoder"));
        }
        Ok(Self {
            classes: classes.into_iter().collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn encode(&self, label: &str) -> Result<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .map_err(|_| RiskCoreError::UnknownLabel(label.to_string()))
    }

    pub fn encode_all<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>> {
        labels.iter().map(|l| self.encode(l.as_ref())).collect()
    }

    pub fn decode(&self, index: usize) -> Result<&str> {
        self.classes
            .get(index)
            .map(String::as_str)
            .ok_or(RiskCoreError::UnknownClassIndex {
                index,
                classes: self.classes.len(),
            })
    }
}
