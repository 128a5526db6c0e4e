//! Multiclass gradient-boosted decision trees
//!
//! Each boosting round holds one single-output regression tree per class.
//! Raw class scores are `init_scores + learning_rate * Σ tree(x)` and the
//! probabilities are their softmax.

use super::tree::DecisionTree;
use super::{softmax, ProbabilisticClassifier};
use crate::errors::{Result, RiskCoreError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingModel {
    pub n_classes: usize,
    pub learning_rate: f64,
    /// Log class priors of the training labels
    pub init_scores: Vec<f64>,
    /// `rounds[r][k]` is the tree for class `k` in round `r`
    pub rounds: Vec<Vec<DecisionTree>>,
}

impl GradientBoostingModel {
    /// Raw additive scores before the softmax link.
    pub fn raw_scores(&self, features: &[f64]) -> Vec<f64> {
        let mut scores = self.init_scores.clone();
        for round in &self.rounds {
            for (score, tree) in scores.iter_mut().zip(round) {
                *score += self.learning_rate * tree.evaluate_scalar(features);
            }
        }
        scores
    }
}

impl ProbabilisticClassifier for GradientBoostingModel {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        softmax(&self.raw_scores(features))
    }

    fn validate(&self, feature_count: usize) -> Result<()> {
        if self.init_scores.len() != self.n_classes {
            return Err(RiskCoreError::InvalidModel(format!(
                "boosting has {} initial scores for {} classes",
                self.init_scores.len(),
                self.n_classes
            )));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(RiskCoreError::InvalidModel(format!(
                "invalid boosting learning rate {}",
                self.learning_rate
            )));
        }
        for (r, round) in self.rounds.iter().enumerate() {
            if round.len() != self.n_classes {
                return Err(RiskCoreError::InvalidModel(format!(
                    "boosting round {r} has {} trees for {} classes",
                    round.len(),
                    self.n_classes
                )));
            }
            for (k, tree) in round.iter().enumerate() {
                tree.validate(feature_count, 1).map_err(|e| {
                    RiskCoreError::InvalidModel(format!("boosting tree {r}/{k}: {e}"))
                })?;
            }
        }
        Ok(())
    }
}
