//! Extremely randomized trees trainer

use crate::cart::{RandomizedTreeBuilder, TreeConfig};
use crate::deterministic::{step_rng, streams};
use crate::stacking::BaseLearner;
use maternal_risk_core::classifier::ExtraTreesModel;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct ExtraTreesTrainer {
    pub n_trees: usize,
    pub seed: u64,
}

impl ExtraTreesTrainer {
    pub fn new(n_trees: usize, seed: u64) -> Self {
        Self { n_trees, seed }
    }
}

impl BaseLearner for ExtraTreesTrainer {
    type Model = ExtraTreesModel;

    /// Grow `n_trees` fully developed randomized trees on the whole sample
    /// (no bootstrap), each considering `sqrt(width)` features per split.
    fn fit(&self, rows: &[Vec<f64>], labels: &[usize], n_classes: usize) -> ExtraTreesModel {
        let width = rows.first().map_or(0, Vec::len);
        let max_features = ((width as f64).sqrt() as usize).max(1);
        let builder =
            RandomizedTreeBuilder::new(rows, labels, n_classes, max_features, TreeConfig::default());

        let mut rng = step_rng(self.seed, streams::EXTRA_TREES);
        let trees: Vec<_> = (0..self.n_trees).map(|_| builder.build(&mut rng)).collect();

        debug!(
            trees = trees.len(),
            max_features,
            nodes = trees.iter().map(|t| t.nodes.len()).sum::<usize>(),
            "fitted extra trees"
        );
        ExtraTreesModel { n_classes, trees }
    }
}
