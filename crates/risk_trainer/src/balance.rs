//! Synthetic minority oversampling (SMOTE)
//!
//! Every class is brought up to the size of the largest one. A synthetic
//! sample lies on the segment between a random member of the class and one of
//! its `k` nearest same-class neighbours (Euclidean). Original rows keep their
//! order; synthetic rows are appended class by class.

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, info};

#[derive(Clone, Debug)]
pub struct ClassBalancer {
    pub k_neighbors: usize,
}

impl Default for ClassBalancer {
    fn default() -> Self {
        Self { k_neighbors: 5 }
    }
}

impl ClassBalancer {
    pub fn new(k_neighbors: usize) -> Self {
        Self { k_neighbors }
    }

    /// Oversample `rows` so that every class in `0..n_classes` has as many
    /// samples as the majority class.
    ///
    /// A class with a single member is balanced by duplication; classes with
    /// no members stay empty.
    pub fn fit_resample(
        &self,
        rows: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
        rng: &mut StdRng,
    ) -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
        for (i, &label) in labels.iter().enumerate() {
            if let Some(class) = members.get_mut(label) {
                class.push(i);
            }
        }
        let target = members.iter().map(Vec::len).max().unwrap_or(0);

        let mut out_rows = rows.to_vec();
        let mut out_labels = labels.to_vec();

        for (class, idx) in members.iter().enumerate() {
            let deficit = target - idx.len();
            if deficit == 0 || idx.is_empty() {
                continue;
            }

            if idx.len() == 1 {
                debug!(class, deficit, "single-sample class, duplicating");
                for _ in 0..deficit {
                    out_rows.push(rows[idx[0]].clone());
                    out_labels.push(class);
                }
                continue;
            }

            let k = self.k_neighbors.min(idx.len() - 1).max(1);
            let neighbors = nearest_neighbors(rows, idx, k);

            for _ in 0..deficit {
                let base = rng.gen_range(0..idx.len());
                let neighbor = neighbors[base][rng.gen_range(0..k)];
                let gap: f64 = rng.gen();

                let x = &rows[idx[base]];
                let nn = &rows[neighbor];
                let synthetic = x.iter().zip(nn).map(|(&a, &b)| a + gap * (b - a)).collect();
                out_rows.push(synthetic);
                out_labels.push(class);
            }
            debug!(class, original = idx.len(), synthetic = deficit, k, "oversampled class");
        }

        info!(
            before = rows.len(),
            after = out_rows.len(),
            per_class = target,
            "balanced classes"
        );
        (out_rows, out_labels)
    }
}

/// For each member, the row indices of its `k` nearest other members.
/// Ties resolve to the lower row index.
fn nearest_neighbors(rows: &[Vec<f64>], members: &[usize], k: usize) -> Vec<Vec<usize>> {
    members
        .iter()
        .map(|&i| {
            let mut dists: Vec<(f64, usize)> = members
                .iter()
                .filter(|&&j| j != i)
                .map(|&j| (squared_distance(&rows[i], &rows[j]), j))
                .collect();
            dists.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            dists.into_iter().take(k).map(|(_, j)| j).collect()
        })
        .collect()
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deterministic::{step_rng, streams};

    fn imbalanced() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..10 {
            rows.push(vec![i as f64, 0.0]);
            labels.push(0);
        }
        for i in 0..4 {
            rows.push(vec![100.0 + i as f64, 10.0]);
            labels.push(1);
        }
        rows.push(vec![-50.0, -50.0]);
        labels.push(2);
        (rows, labels)
    }

    #[test]
    fn test_all_classes_reach_majority_count() {
        let (rows, labels) = imbalanced();
        let (out_rows, out_labels) = ClassBalancer::default().fit_resample(
            &rows,
            &labels,
            3,
            &mut step_rng(42, streams::BALANCE),
        );

        assert_eq!(out_rows.len(), 30);
        for class in 0..3 {
            assert_eq!(out_labels.iter().filter(|&&l| l == class).count(), 10);
        }
        // Originals are preserved in front.
        assert_eq!(&out_rows[..rows.len()], rows.as_slice());
    }

    #[test]
    fn test_synthetic_samples_stay_within_class_hull() {
        let (rows, labels) = imbalanced();
        let (out_rows, out_labels) = ClassBalancer::default().fit_resample(
            &rows,
            &labels,
            3,
            &mut step_rng(42, streams::BALANCE),
        );

        for (row, &label) in out_rows.iter().zip(&out_labels).skip(rows.len()) {
            match label {
                1 => {
                    assert!((100.0..=103.0).contains(&row[0]));
                    assert_eq!(row[1], 10.0);
                }
                2 => assert_eq!(row, &vec![-50.0, -50.0]),
                other => panic!("unexpected synthetic class {other}"),
            }
        }
    }

    #[test]
    fn test_resampling_is_seeded() {
        let (rows, labels) = imbalanced();
        let balancer = ClassBalancer::new(3);
        let a = balancer.fit_resample(&rows, &labels, 3, &mut step_rng(9, streams::BALANCE));
        let b = balancer.fit_resample(&rows, &labels, 3, &mut step_rng(9, streams::BALANCE));
        assert_eq!(a, b);
    }

    #[test]
    fn test_balanced_input_is_unchanged() {
        let rows = vec![vec![0.0], vec![1.0]];
        let labels = vec![0, 1];
        let (out_rows, out_labels) = ClassBalancer::default().fit_resample(
            &rows,
            &labels,
            2,
            &mut step_rng(1, streams::BALANCE),
        );
        assert_eq!(out_rows, rows);
        assert_eq!(out_labels, labels);
    }
}
