//! One-hot encoding of the categorical AgeGroup feature

use crate::errors::{Result, RiskCoreError};
use crate::features::{DerivedFeatureVector, FEATURE_NAMES, PASSTHROUGH_COUNT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Fitted column transformer: one-hot AgeGroup block followed by the
/// numeric passthrough features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    /// Observed AgeGroup labels, sorted; index = one-hot position.
    pub categories: Vec<String>,
}

impl CategoricalEncoder {
    /// Learn the distinct age groups present in the training vectors.
    pub fn fit<'a, I>(vectors: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a DerivedFeatureVector>,
    {
        let categories: BTreeSet<String> = vectors
            .into_iter()
            .map(|v| v.age_group.label().to_string())
            .collect();
        if categories.is_empty() {
            return Err(RiskCoreError::EmptyFit("CategoricalEncoder"));
        }
        Ok(Self {
            categories: categories.into_iter().collect(),
        })
    }

    /// Width of the encoded vector.
    pub fn output_width(&self) -> usize {
        self.categories.len() + PASSTHROUGH_COUNT
    }

    /// Column names of the encoded vector.
    pub fn feature_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|c| format!("{}={}", FEATURE_NAMES[0], c))
            .chain(FEATURE_NAMES[1..].iter().map(|n| n.to_string()))
            .collect()
    }

    /// Encode one vector. Unseen age groups are rejected.
    pub fn transform(&self, vector: &DerivedFeatureVector) -> Result<Vec<f64>> {
        let label = vector.age_group.label();
        let position = self
            .categories
            .iter()
            .position(|c| c == label)
            .ok_or_else(|| RiskCoreError::UnknownCategory {
                feature: FEATURE_NAMES[0].to_string(),
                value: label.to_string(),
            })?;

        let mut encoded = vec![0.0; self.categories.len()];
        encoded[position] = 1.0;
        encoded.extend_from_slice(&vector.passthrough());
        Ok(encoded)
    }

    /// Encode many vectors, failing on the first unseen category.
    pub fn transform_all(&self, vectors: &[DerivedFeatureVector]) -> Result<Vec<Vec<f64>>> {
        vectors.iter().map(|v| self.transform(v)).collect()
    }
}
