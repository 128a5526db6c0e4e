//! Multinomial logistic regression (stacking meta learner)

use super::margin::dot;
use super::{softmax, ProbabilisticClassifier};
use crate::errors::{Result, RiskCoreError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    /// `coefficients[k]` weights the inputs for class `k`
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

impl LogisticModel {
    pub fn logits(&self, features: &[f64]) -> Vec<f64> {
        self.coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(w, b)| dot(w, features) + b)
            .collect()
    }
}

impl ProbabilisticClassifier for LogisticModel {
    fn n_classes(&self) -> usize {
        self.coefficients.len()
    }

    fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        softmax(&self.logits(features))
    }

    fn validate(&self, feature_count: usize) -> Result<()> {
        if self.coefficients.len() != self.intercepts.len() {
            return Err(RiskCoreError::InvalidModel(
                "logistic coefficients and intercepts differ in length".into(),
            ));
        }
        if let Some(w) = self.coefficients.iter().find(|w| w.len() != feature_count) {
            return Err(RiskCoreError::FeatureSizeMismatch {
                expected: feature_count,
                actual: w.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probabilities_follow_logits() {
        let model = LogisticModel {
            coefficients: vec![vec![1.0], vec![-1.0], vec![0.0]],
            intercepts: vec![0.0, 0.0, 0.0],
        };
        let p = model.predict_proba(&[2.0]);
        assert_eq!(p.len(), 3);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert_eq!(model.predict(&[2.0]), 0);
        assert_eq!(model.predict(&[-2.0]), 1);
    }
}
