//! One-vs-rest linear SVM trained with Pegasos
//!
//! Each class gets a binary hinge-loss problem solved by stochastic
//! sub-gradient descent with step `1 / (λ t)` and projection onto the ball of
//! radius `1 / sqrt(λ)`. The bias is handled as an extra constant input so it
//! is regularized like the weights.

use crate::deterministic::{permutation, step_rng, streams};
use crate::stacking::BaseLearner;
use maternal_risk_core::classifier::{dot, MarginModel};
use tracing::debug;

#[derive(Clone, Debug)]
pub struct PegasosTrainer {
    pub lambda: f64,
    pub epochs: usize,
    pub seed: u64,
}

impl PegasosTrainer {
    pub fn new(lambda: f64, epochs: usize, seed: u64) -> Self {
        Self {
            lambda,
            epochs,
            seed,
        }
    }

    /// Weights (bias last) separating `+1` targets from `-1` targets.
    fn fit_binary(&self, rows: &[Vec<f64>], targets: &[f64], stream: u64) -> Vec<f64> {
        let width = rows.first().map_or(0, Vec::len);
        let mut w = vec![0.0; width + 1];
        let radius = 1.0 / self.lambda.sqrt();
        let mut rng = step_rng(self.seed, stream);
        let mut t = 0usize;

        for _ in 0..self.epochs {
            for i in permutation(rows.len(), &mut rng) {
                t += 1;
                let eta = 1.0 / (self.lambda * t as f64);
                let (x, y) = (&rows[i], targets[i]);
                let margin = y * (dot(&w[..width], x) + w[width]);

                let shrink = 1.0 - eta * self.lambda;
                for wj in w.iter_mut() {
                    *wj *= shrink;
                }
                if margin < 1.0 {
                    for (wj, &xj) in w.iter_mut().zip(x) {
                        *wj += eta * y * xj;
                    }
                    w[width] += eta * y;
                }

                let norm = w.iter().map(|v| v * v).sum::<f64>().sqrt();
                if norm > radius {
                    let scale = radius / norm;
                    for wj in w.iter_mut() {
                        *wj *= scale;
                    }
                }
            }
        }
        w
    }
}

impl BaseLearner for PegasosTrainer {
    type Model = MarginModel;

    fn fit(&self, rows: &[Vec<f64>], labels: &[usize], n_classes: usize) -> MarginModel {
        let mut weights = Vec::with_capacity(n_classes);
        let mut biases = Vec::with_capacity(n_classes);

        for class in 0..n_classes {
            let targets: Vec<f64> = labels
                .iter()
                .map(|&l| if l == class { 1.0 } else { -1.0 })
                .collect();
            let mut w = self.fit_binary(rows, &targets, streams::MARGIN + class as u64);
            let bias = w.pop().unwrap_or(0.0);
            weights.push(w);
            biases.push(bias);
        }

        debug!(classes = n_classes, epochs = self.epochs, "fitted margin classifier");
        MarginModel { weights, biases }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maternal_risk_core::ProbabilisticClassifier;

    fn clusters() -> (Vec<Vec<f64>>, Vec<usize>) {
        let centers = [(-2.0, -2.0), (2.0, -2.0), (0.0, 2.5)];
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for (class, (cx, cy)) in centers.iter().enumerate() {
            for j in 0..10 {
                let offset = (j as f64 - 4.5) * 0.05;
                rows.push(vec![cx + offset, cy - offset]);
                labels.push(class);
            }
        }
        (rows, labels)
    }

    #[test]
    fn test_margin_separates_clusters() {
        let (rows, labels) = clusters();
        let model = PegasosTrainer::new(1e-2, 50, 42).fit(&rows, &labels, 3);

        assert!(model.validate(2).is_ok());
        assert_eq!(model.predict(&[-2.0, -2.0]), 0);
        assert_eq!(model.predict(&[2.0, -2.0]), 1);
        assert_eq!(model.predict(&[0.0, 2.5]), 2);
    }

    #[test]
    fn test_weights_stay_in_projection_ball() {
        let (rows, labels) = clusters();
        let lambda = 1e-3;
        let model = PegasosTrainer::new(lambda, 20, 7).fit(&rows, &labels, 3);
        for (w, b) in model.weights.iter().zip(&model.biases) {
            let norm = (w.iter().map(|v| v * v).sum::<f64>() + b * b).sqrt();
            assert!(norm <= 1.0 / lambda.sqrt() + 1e-9);
        }
    }

    #[test]
    fn test_margin_is_seeded() {
        let (rows, labels) = clusters();
        let a = PegasosTrainer::new(1e-3, 5, 3).fit(&rows, &labels, 3);
        let b = PegasosTrainer::new(1e-3, 5, 3).fit(&rows, &labels, 3);
        assert_eq!(a, b);
    }
}
