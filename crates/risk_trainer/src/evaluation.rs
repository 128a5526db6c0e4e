//! Held-out evaluation: classification report and confusion matrix

use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub accuracy: f64,
    pub samples: usize,
    pub classes: Vec<ClassMetrics>,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    /// Rows are true classes, columns predicted classes
    pub confusion_matrix: Vec<Vec<usize>>,
}

impl EvaluationReport {
    /// Score predictions against the truth. Undefined ratios count as zero.
    pub fn compute(y_true: &[usize], y_pred: &[usize], labels: &[String]) -> Self {
        let k = labels.len();
        let mut confusion = vec![vec![0usize; k]; k];
        for (&t, &p) in y_true.iter().zip(y_pred) {
            if t < k && p < k {
                confusion[t][p] += 1;
            }
        }

        let samples = y_true.len();
        let correct: usize = (0..k).map(|c| confusion[c][c]).sum();

        let classes: Vec<ClassMetrics> = labels
            .iter()
            .enumerate()
            .map(|(c, label)| {
                let tp = confusion[c][c];
                let predicted: usize = confusion.iter().map(|row| row[c]).sum();
                let support: usize = confusion[c].iter().sum();
                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    label: label.clone(),
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        let macro_avg = average(&classes, |_| 1.0);
        let weighted_avg = average(&classes, |m| m.support as f64);

        Self {
            accuracy: ratio(correct, samples),
            samples,
            classes,
            macro_avg,
            weighted_avg,
            confusion_matrix: confusion,
        }
    }

    /// Log the report as a classification table.
    pub fn log(&self) {
        info!("{:>14} {:>10} {:>10} {:>10} {:>10}", "", "precision", "recall", "f1-score", "support");
        for m in &self.classes {
            info!(
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                m.label, m.precision, m.recall, m.f1, m.support
            );
        }
        info!("{:>14} {:>10} {:>10} {:>10.2} {:>10}", "accuracy", "", "", self.accuracy, self.samples);
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            info!(
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                name, avg.precision, avg.recall, avg.f1, self.samples
            );
        }
        info!("Confusion matrix (rows = true, cols = predicted):");
        for (label, row) in self.classes.iter().zip(&self.confusion_matrix) {
            info!("{:>14} {:?}", label.label, row);
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn average(classes: &[ClassMetrics], weight: impl Fn(&ClassMetrics) -> f64) -> AverageMetrics {
    let mut avg = AverageMetrics {
        precision: 0.0,
        recall: 0.0,
        f1: 0.0,
    };
    let total: f64 = classes.iter().map(&weight).sum();
    if total == 0.0 {
        return avg;
    }
    for m in classes {
        let w = weight(m) / total;
        avg.precision += w * m.precision;
        avg.recall += w * m.recall;
        avg.f1 += w * m.f1;
    }
    avg
}
