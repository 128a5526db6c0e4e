//! Multinomial logistic regression trainer (stacking meta learner)
//!
//! Minimizes `C * Σ cross-entropy + ½‖W‖²` (intercepts unpenalized) with
//! full-batch gradient descent. The objective is divided by `C * n`, and the
//! step is capped by the inverse curvature bound so strong penalties stay
//! stable.

use maternal_risk_core::classifier::{dot, softmax, LogisticModel};
use tracing::debug;

#[derive(Clone, Debug)]
pub struct LogisticTrainer {
    /// Inverse regularization strength
    pub c: f64,
    pub iterations: usize,
    pub learning_rate: f64,
}

impl Default for LogisticTrainer {
    fn default() -> Self {
        Self {
            c: 1.0,
            iterations: 500,
            learning_rate: 0.5,
        }
    }
}

impl LogisticTrainer {
    pub fn fit(&self, rows: &[Vec<f64>], labels: &[usize], n_classes: usize) -> LogisticModel {
        let width = rows.first().map_or(0, Vec::len);
        let n = rows.len().max(1) as f64;
        let penalty = 1.0 / (self.c * n);
        let curvature = 0.5 * rows.iter().map(|x| 1.0 + dot(x, x)).sum::<f64>() / n + penalty;
        let step = self.learning_rate.min(1.0 / curvature);

        let mut coefficients = vec![vec![0.0; width]; n_classes];
        let mut intercepts = vec![0.0; n_classes];

        for _ in 0..self.iterations {
            let mut grad_w = vec![vec![0.0; width]; n_classes];
            let mut grad_b = vec![0.0; n_classes];

            for (x, &y) in rows.iter().zip(labels) {
                let logits: Vec<f64> = coefficients
                    .iter()
                    .zip(&intercepts)
                    .map(|(w, b)| dot(w, x) + b)
                    .collect();
                let p = softmax(&logits);
                for class in 0..n_classes {
                    let err = p[class] - f64::from(u8::from(y == class));
                    for (g, &xj) in grad_w[class].iter_mut().zip(x) {
                        *g += err * xj;
                    }
                    grad_b[class] += err;
                }
            }

            for class in 0..n_classes {
                for (w, g) in coefficients[class].iter_mut().zip(&grad_w[class]) {
                    *w -= step * (g / n + penalty * *w);
                }
                intercepts[class] -= step * grad_b[class] / n;
            }
        }

        debug!(
            classes = n_classes,
            inputs = width,
            iterations = self.iterations,
            "fitted meta learner"
        );
        LogisticModel {
            coefficients,
            intercepts,
        }
    }
}
