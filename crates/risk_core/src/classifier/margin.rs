//! One-vs-rest linear margin classifier

use super::{softmax, ProbabilisticClassifier};
use crate::errors::{Result, RiskCoreError};
use serde::{Deserialize, Serialize};

/// Per-class hyperplanes `w·x + b`; probabilities are the softmax of margins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginModel {
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
}

impl MarginModel {
    /// Signed distance proxy for every class.
    pub fn decision_function(&self, features: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.biases)
            .map(|(w, b)| dot(w, features) + b)
            .collect()
    }
}

impl ProbabilisticClassifier for MarginModel {
    fn n_classes(&self) -> usize {
        self.weights.len()
    }

    fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        softmax(&self.decision_function(features))
    }

    fn validate(&self, feature_count: usize) -> Result<()> {
        if self.weights.len() != self.biases.len() {
            return Err(RiskCoreError::InvalidModel(
                "margin weights and biases differ in length".into(),
            ));
        }
        if let Some(w) = self.weights.iter().find(|w| w.len() != feature_count) {
            return Err(RiskCoreError::FeatureSizeMismatch {
                expected: feature_count,
                actual: w.len(),
            });
        }
        Ok(())
    }
}

/// Inner product over the shorter of the two slices.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
