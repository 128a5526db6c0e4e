//! Multiclass gradient boosting trainer
//!
//! Softmax log-loss boosting: every round fits one regression tree per class
//! to the pseudo-residuals `y_k - p_k`, with Newton leaf values
//! `(K - 1) / K * Σ r / Σ p(1 - p)`. Scores start at the log class priors.

use crate::cart::{RegressionTreeBuilder, TreeConfig};
use crate::stacking::BaseLearner;
use maternal_risk_core::classifier::{softmax, DecisionTree, GradientBoostingModel};
use tracing::debug;

/// Gradient boosting training configuration
#[derive(Clone, Debug)]
pub struct BoostingConfig {
    pub rounds: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            rounds: 100,
            learning_rate: 0.1,
            max_depth: 3,
        }
    }
}

/// Gradient boosting trainer
#[derive(Clone, Debug)]
pub struct GradientBoostingTrainer {
    config: BoostingConfig,
}

impl GradientBoostingTrainer {
    pub fn new(config: BoostingConfig) -> Self {
        Self { config }
    }

    /// Log priors; classes absent from `labels` get a large negative score.
    fn initial_scores(labels: &[usize], n_classes: usize) -> Vec<f64> {
        let mut counts = vec![0usize; n_classes];
        for &label in labels {
            counts[label] += 1;
        }
        let n = labels.len().max(1) as f64;
        counts
            .into_iter()
            .map(|c| if c == 0 { -1e3 } else { (c as f64 / n).ln() })
            .collect()
    }
}

impl BaseLearner for GradientBoostingTrainer {
    type Model = GradientBoostingModel;

    fn fit(&self, rows: &[Vec<f64>], labels: &[usize], n_classes: usize) -> GradientBoostingModel {
        let n = rows.len();
        let init_scores = Self::initial_scores(labels, n_classes);
        let leaf_scale = (n_classes as f64 - 1.0) / n_classes as f64;
        let tree_config = TreeConfig {
            max_depth: Some(self.config.max_depth),
            ..TreeConfig::default()
        };

        // scores[i][k]: current raw score of sample i for class k
        let mut scores = vec![init_scores.clone(); n];
        let mut rounds: Vec<Vec<DecisionTree>> = Vec::with_capacity(self.config.rounds);

        for round in 0..self.config.rounds {
            let probabilities: Vec<Vec<f64>> = scores.iter().map(|s| softmax(s)).collect();
            let mut round_trees = Vec::with_capacity(n_classes);

            for class in 0..n_classes {
                let residuals: Vec<f64> = probabilities
                    .iter()
                    .zip(labels)
                    .map(|(p, &y)| f64::from(u8::from(y == class)) - p[class])
                    .collect();
                let hessians: Vec<f64> = probabilities
                    .iter()
                    .map(|p| p[class] * (1.0 - p[class]))
                    .collect();

                let tree = RegressionTreeBuilder::new(
                    rows,
                    &residuals,
                    &hessians,
                    leaf_scale,
                    tree_config.clone(),
                )
                .build();
                round_trees.push(tree);
            }

            // Update scores only after all class trees of the round are built.
            for (row, score) in rows.iter().zip(scores.iter_mut()) {
                for (s, tree) in score.iter_mut().zip(&round_trees) {
                    *s += self.config.learning_rate * tree.evaluate_scalar(row);
                }
            }

            if (round + 1) % 25 == 0 {
                debug!(round = round + 1, "boosting progress");
            }
            rounds.push(round_trees);
        }

        GradientBoostingModel {
            n_classes,
            learning_rate: self.config.learning_rate,
            init_scores,
            rounds,
        }
    }
}
