//! Extremely randomized trees ensemble

use super::tree::DecisionTree;
use super::ProbabilisticClassifier;
use crate::errors::{Result, RiskCoreError};
use serde::{Deserialize, Serialize};

/// Averaged class distributions of independently grown randomized trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraTreesModel {
    pub n_classes: usize,
    pub trees: Vec<DecisionTree>,
}

impl ProbabilisticClassifier for ExtraTreesModel {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        if self.trees.is_empty() {
            return vec![1.0 / self.n_classes as f64; self.n_classes];
        }
        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, &p) in proba.iter_mut().zip(tree.evaluate(features)) {
                *acc += p;
            }
        }
        let count = self.trees.len() as f64;
        for p in &mut proba {
            *p /= count;
        }
        proba
    }

    fn validate(&self, feature_count: usize) -> Result<()> {
        if self.trees.is_empty() {
            return Err(RiskCoreError::InvalidModel("extra trees has no trees".into()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(feature_count, self.n_classes).map_err(|e| {
                RiskCoreError::InvalidModel(format!("extra tree {i} validation failed: {e}"))
            })?;
        }
        Ok(())
    }
}
