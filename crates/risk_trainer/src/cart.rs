//! CART (Classification and Regression Tree) builders
//!
//! Two builders share the flat node layout of the core `DecisionTree`:
//!
//! - [`RegressionTreeBuilder`]: exact-greedy MSE splits on boosting
//!   pseudo-residuals with Newton-step leaf values
//! - [`RandomizedTreeBuilder`]: extremely randomized classification trees
//!   (random feature subset, uniform random thresholds, Gini criterion)
//!
//! Nodes are emitted in pre-order so children always follow their parent.
//! Candidate splits are visited in a fixed order and only a strictly better
//! gain replaces the current best, so equal gains keep the earliest split.

use maternal_risk_core::classifier::{DecisionTree, Node};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

/// Regression gains at or below this are treated as no improvement.
const MIN_GAIN: f64 = 1e-12;

/// Training parameters for a single tree
#[derive(Clone, Debug)]
pub struct TreeConfig {
    /// `None` grows until the leaves are pure or too small to split
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

impl TreeConfig {
    fn stop(&self, depth: usize, n_samples: usize) -> bool {
        self.max_depth.is_some_and(|max| depth >= max) || n_samples < self.min_samples_split
    }
}

/// Split candidate with gain
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

fn keep_better(best: &mut Option<SplitCandidate>, candidate: SplitCandidate, min_gain: f64) {
    if candidate.gain > min_gain && best.map_or(true, |b| candidate.gain > b.gain) {
        *best = Some(candidate);
    }
}

/// Split sample indices on `feature <= threshold`.
fn split_samples(
    rows: &[Vec<f64>],
    indices: &[usize],
    feature_idx: usize,
    threshold: f64,
) -> (Vec<usize>, Vec<usize>) {
    indices
        .iter()
        .copied()
        .partition(|&idx| rows[idx][feature_idx] <= threshold)
}

/// Build a regression tree on pseudo-residuals.
///
/// Leaf values are `leaf_scale * Σ residual / Σ hessian`, the one-step
/// Newton update for multiclass log-loss when `leaf_scale = (K - 1) / K`.
pub struct RegressionTreeBuilder<'a> {
    rows: &'a [Vec<f64>],
    residuals: &'a [f64],
    hessians: &'a [f64],
    leaf_scale: f64,
    config: TreeConfig,
    feature_count: usize,
}

impl<'a> RegressionTreeBuilder<'a> {
    pub fn new(
        rows: &'a [Vec<f64>],
        residuals: &'a [f64],
        hessians: &'a [f64],
        leaf_scale: f64,
        config: TreeConfig,
    ) -> Self {
        debug_assert_eq!(rows.len(), residuals.len());
        debug_assert_eq!(rows.len(), hessians.len());
        let feature_count = rows.first().map_or(0, Vec::len);
        Self {
            rows,
            residuals,
            hessians,
            leaf_scale,
            config,
            feature_count,
        }
    }

    /// Build tree and return nodes
    pub fn build(&self) -> DecisionTree {
        let mut nodes = Vec::new();
        let indices: Vec<usize> = (0..self.rows.len()).collect();
        self.build_node(&indices, 0, &mut nodes);
        DecisionTree::new(nodes)
    }

    /// Recursively build tree nodes
    fn build_node(&self, indices: &[usize], depth: usize, nodes: &mut Vec<Node>) -> i32 {
        let current_idx = nodes.len();

        let split = if self.config.stop(depth, indices.len()) {
            None
        } else {
            self.find_best_split(indices)
        };
        let Some(split) = split else {
            nodes.push(Node::leaf(vec![self.leaf_value(indices)]));
            return current_idx as i32;
        };

        let (left, right) = split_samples(self.rows, indices, split.feature_idx, split.threshold);

        // Reserve space for current node
        nodes.push(Node::internal(split.feature_idx, split.threshold, -1, -1));
        let left_idx = self.build_node(&left, depth + 1, nodes);
        let right_idx = self.build_node(&right, depth + 1, nodes);
        nodes[current_idx].left = left_idx;
        nodes[current_idx].right = right_idx;

        current_idx as i32
    }

    /// Exact-greedy search: every boundary between distinct sorted values.
    fn find_best_split(&self, indices: &[usize]) -> Option<SplitCandidate> {
        let n = indices.len();
        let min_leaf = self.config.min_samples_leaf.max(1);
        if n < 2 * min_leaf {
            return None;
        }

        let total: f64 = indices.iter().map(|&i| self.residuals[i]).sum();
        let parent_score = total * total / n as f64;

        let mut best = None;
        let mut sorted = indices.to_vec();
        for feature_idx in 0..self.feature_count {
            let value = |i: usize| self.rows[i][feature_idx];
            sorted.sort_by(|&a, &b| value(a).total_cmp(&value(b)).then(a.cmp(&b)));

            let mut left_sum = 0.0;
            for pos in 0..n - 1 {
                left_sum += self.residuals[sorted[pos]];
                let n_left = pos + 1;
                let n_right = n - n_left;
                let (lo, hi) = (value(sorted[pos]), value(sorted[pos + 1]));
                if lo == hi || n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let right_sum = total - left_sum;
                let gain = left_sum * left_sum / n_left as f64
                    + right_sum * right_sum / n_right as f64
                    - parent_score;
                keep_better(
                    &mut best,
                    SplitCandidate {
                        feature_idx,
                        threshold: midpoint(lo, hi),
                        gain,
                    },
                    MIN_GAIN,
                );
            }
        }
        best
    }

    fn leaf_value(&self, indices: &[usize]) -> f64 {
        let (sum_r, sum_h) = indices.iter().fold((0.0, 0.0), |(r, h), &i| {
            (r + self.residuals[i], h + self.hessians[i])
        });
        if sum_h.abs() < 1e-150 {
            return 0.0;
        }
        self.leaf_scale * sum_r / sum_h
    }
}

/// Threshold between two consecutive distinct values that still sends `lo`
/// left and `hi` right.
fn midpoint(lo: f64, hi: f64) -> f64 {
    let mid = lo + (hi - lo) / 2.0;
    if mid >= hi {
        lo
    } else {
        mid
    }
}

/// Build an extremely randomized classification tree.
///
/// At each node up to `max_features` non-constant features are drawn; each
/// gets one threshold drawn uniformly between its node-local min and max, and
/// the candidate with the best Gini decrease is kept. Leaves hold the class
/// distribution of their samples.
pub struct RandomizedTreeBuilder<'a> {
    rows: &'a [Vec<f64>],
    labels: &'a [usize],
    n_classes: usize,
    max_features: usize,
    config: TreeConfig,
    feature_count: usize,
}

impl<'a> RandomizedTreeBuilder<'a> {
    pub fn new(
        rows: &'a [Vec<f64>],
        labels: &'a [usize],
        n_classes: usize,
        max_features: usize,
        config: TreeConfig,
    ) -> Self {
        debug_assert_eq!(rows.len(), labels.len());
        let feature_count = rows.first().map_or(0, Vec::len);
        Self {
            rows,
            labels,
            n_classes,
            max_features: max_features.clamp(1, feature_count.max(1)),
            config,
            feature_count,
        }
    }

    pub fn build(&self, rng: &mut StdRng) -> DecisionTree {
        let mut nodes = Vec::new();
        let indices: Vec<usize> = (0..self.rows.len()).collect();
        self.build_node(&indices, 0, &mut nodes, rng);
        DecisionTree::new(nodes)
    }

    fn build_node(
        &self,
        indices: &[usize],
        depth: usize,
        nodes: &mut Vec<Node>,
        rng: &mut StdRng,
    ) -> i32 {
        let current_idx = nodes.len();
        let counts = self.class_counts(indices);
        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;

        let split = if pure || self.config.stop(depth, indices.len()) {
            None
        } else {
            self.find_random_split(indices, &counts, rng)
        };
        let Some(split) = split else {
            nodes.push(Node::leaf(distribution(&counts)));
            return current_idx as i32;
        };

        let (left, right) = split_samples(self.rows, indices, split.feature_idx, split.threshold);

        nodes.push(Node::internal(split.feature_idx, split.threshold, -1, -1));
        let left_idx = self.build_node(&left, depth + 1, nodes, rng);
        let right_idx = self.build_node(&right, depth + 1, nodes, rng);
        nodes[current_idx].left = left_idx;
        nodes[current_idx].right = right_idx;

        current_idx as i32
    }

    fn find_random_split(
        &self,
        indices: &[usize],
        counts: &[usize],
        rng: &mut StdRng,
    ) -> Option<SplitCandidate> {
        let parent_gini = gini(counts, indices.len());
        let min_leaf = self.config.min_samples_leaf.max(1);

        let mut features: Vec<usize> = (0..self.feature_count).collect();
        features.shuffle(rng);

        let mut best = None;
        let mut visited = 0;
        for feature_idx in features {
            if visited >= self.max_features {
                break;
            }

            let (min, max) = indices.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &i| {
                let v = self.rows[i][feature_idx];
                (lo.min(v), hi.max(v))
            });
            // Constant features are skipped without using up the budget.
            if max <= min {
                continue;
            }
            visited += 1;

            let threshold = rng.gen_range(min..max);
            let (left, right) = split_samples(self.rows, indices, feature_idx, threshold);
            if left.len() < min_leaf || right.len() < min_leaf {
                continue;
            }

            let n = indices.len() as f64;
            let weighted_child = (left.len() as f64 / n) * gini(&self.class_counts(&left), left.len())
                + (right.len() as f64 / n) * gini(&self.class_counts(&right), right.len());
            keep_better(
                &mut best,
                SplitCandidate {
                    feature_idx,
                    threshold,
                    gain: parent_gini - weighted_child,
                },
                // Any split of a non-constant feature makes progress.
                f64::NEG_INFINITY,
            );
        }
        best
    }

    fn class_counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in indices {
            counts[self.labels[i]] += 1;
        }
        counts
    }
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / n).powi(2)).sum::<f64>()
}

fn distribution(counts: &[usize]) -> Vec<f64> {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return vec![1.0 / counts.len() as f64; counts.len()];
    }
    counts.iter().map(|&c| c as f64 / total as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deterministic::{step_rng, streams};

    #[test]
    fn test_regression_tree_finds_step() {
        let rows: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64, 0.0]).collect();
        let residuals = vec![-1.0, -1.0, -1.0, -1.0, 1.0, 1.0, 1.0, 1.0];
        let hessians = vec![1.0; 8];

        let config = TreeConfig {
            max_depth: Some(2),
            ..TreeConfig::default()
        };
        let tree = RegressionTreeBuilder::new(&rows, &residuals, &hessians, 1.0, config).build();

        assert!(tree.validate(2, 1).is_ok());
        assert_eq!(tree.nodes[0].feature_idx, 0);
        assert_eq!(tree.nodes[0].threshold, 3.5);
        assert_eq!(tree.evaluate_scalar(&[1.0, 0.0]), -1.0);
        assert_eq!(tree.evaluate_scalar(&[6.0, 0.0]), 1.0);
    }

    #[test]
    fn test_leaf_only_tree() {
        let rows = vec![vec![1.0]];
        let tree = RegressionTreeBuilder::new(&rows, &[0.5], &[0.25], 0.5, TreeConfig::default())
            .build();

        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.evaluate_scalar(&[1.0]), 1.0);
    }

    #[test]
    fn test_depth_limit_respected() {
        let rows: Vec<Vec<f64>> = (0..64).map(|i| vec![i as f64]).collect();
        let residuals: Vec<f64> = (0..64).map(|i| ((i * 7) % 11) as f64 - 5.0).collect();
        let hessians = vec![1.0; 64];
        let config = TreeConfig {
            max_depth: Some(3),
            ..TreeConfig::default()
        };
        let tree = RegressionTreeBuilder::new(&rows, &residuals, &hessians, 1.0, config).build();
        assert!(tree.depth() <= 3);
    }

    #[test]
    fn test_randomized_tree_separates_classes() {
        let rows: Vec<Vec<f64>> = (0..20)
            .map(|i| vec![if i < 10 { i as f64 } else { 100.0 + i as f64 }, 5.0])
            .collect();
        let labels: Vec<usize> = (0..20).map(|i| usize::from(i >= 10)).collect();

        let builder = RandomizedTreeBuilder::new(&rows, &labels, 2, 2, TreeConfig::default());
        let tree = builder.build(&mut step_rng(3, streams::EXTRA_TREES));

        assert!(tree.validate(2, 2).is_ok());
        for (row, &label) in rows.iter().zip(&labels) {
            let dist = tree.evaluate(row);
            assert_eq!(dist[label], 1.0);
        }
    }

    #[test]
    fn test_randomized_tree_is_seeded() {
        let rows: Vec<Vec<f64>> = (0..30).map(|i| vec![(i % 7) as f64, (i % 5) as f64]).collect();
        let labels: Vec<usize> = (0..30).map(|i| i % 3).collect();
        let builder = RandomizedTreeBuilder::new(&rows, &labels, 3, 1, TreeConfig::default());

        let a = builder.build(&mut step_rng(11, streams::EXTRA_TREES));
        let b = builder.build(&mut step_rng(11, streams::EXTRA_TREES));
        assert_eq!(a, b);
    }

    #[test]
    fn test_gini() {
        assert_eq!(gini(&[5, 0], 5), 0.0);
        assert_eq!(gini(&[5, 5], 10), 0.5);
        assert_eq!(gini(&[], 0), 0.0);
    }
}
