//! Fitted classifier ensemble and deterministic inference
//!
//! The risk classifier is a two-level stacking ensemble:
//!
//! - `forest`: extremely randomized trees (averaged leaf class distributions)
//! - `boosting`: multiclass gradient-boosted regression trees (softmax link)
//! - `margin`: one-vs-rest linear margin classifier (softmax over margins)
//! - `logistic`: multinomial logistic regression used as the meta learner
//!
//! Only the fitted state and the inference path live here; fitting is done by
//! the trainer crate. Inference never draws random numbers and iterates in a
//! fixed order, so identical inputs always give identical outputs.

pub mod boosting;
pub mod forest;
pub mod logistic;
pub mod margin;
pub mod tree;

pub use boosting::GradientBoostingModel;
pub use forest::ExtraTreesModel;
pub use logistic::LogisticModel;
pub use margin::{dot, MarginModel};
pub use tree::{DecisionTree, Node};

use crate::errors::{Result, RiskCoreError};
use serde::{Deserialize, Serialize};

/// A fitted model producing class probabilities for one feature row.
pub trait ProbabilisticClassifier {
    /// Number of classes the model predicts.
    fn n_classes(&self) -> usize;

    /// Class probabilities; always `n_classes()` values summing to one.
    fn predict_proba(&self, features: &[f64]) -> Vec<f64>;

    /// Structural check against the expected input width.
    fn validate(&self, feature_count: usize) -> Result<()>;

    /// Index of the most probable class (ties resolve to the lowest index).
    fn predict(&self, features: &[f64]) -> usize {
        argmax(&self.predict_proba(features))
    }
}

/// Stacking ensemble: base learner probabilities feed a logistic meta learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskClassifier {
    pub n_classes: usize,
    pub feature_count: usize,
    pub extra_trees: ExtraTreesModel,
    pub boosting: GradientBoostingModel,
    pub margin: MarginModel,
    pub meta: LogisticModel,
}

impl RiskClassifier {
    /// Concatenated base learner probabilities, in fixed learner order.
    pub fn meta_features(&self, features: &[f64]) -> Vec<f64> {
        let mut stacked = Vec::with_capacity(self.n_classes * 3);
        stacked.extend(self.extra_trees.predict_proba(features));
        stacked.extend(self.boosting.predict_proba(features));
        stacked.extend(self.margin.predict_proba(features));
        stacked
    }

    /// Width of the meta learner input.
    pub fn meta_width(&self) -> usize {
        self.n_classes * 3
    }
}

impl ProbabilisticClassifier for RiskClassifier {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        self.meta.predict_proba(&self.meta_features(features))
    }

    fn validate(&self, feature_count: usize) -> Result<()> {
        if self.n_classes < 2 {
            return Err(RiskCoreError::InvalidModel(format!(
                "classifier needs at least two classes, has {}",
                self.n_classes
            )));
        }
        if self.feature_count != feature_count {
            return Err(RiskCoreError::FeatureSizeMismatch {
                expected: feature_count,
                actual: self.feature_count,
            });
        }

        let learners: [(&str, &dyn ProbabilisticClassifier); 3] = [
            ("extra_trees", &self.extra_trees),
            ("boosting", &self.boosting),
            ("margin", &self.margin),
        ];
        for (name, learner) in learners {
            if learner.n_classes() != self.n_classes {
                return Err(RiskCoreError::InvalidModel(format!(
                    "{name} predicts {} classes, ensemble expects {}",
                    learner.n_classes(),
                    self.n_classes
                )));
            }
            learner.validate(feature_count)?;
        }

        if self.meta.n_classes() != self.n_classes {
            return Err(RiskCoreError::InvalidModel(
                "meta learner class count differs from the ensemble".into(),
            ));
        }
        self.meta.validate(self.meta_width())
    }
}

/// Numerically stable softmax.
pub fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index of the largest value; the first one wins ties.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}
