//! Stacking ensemble trainer
//!
//! The meta learner is fitted on out-of-fold base learner probabilities from
//! stratified k-fold cross-validation, so it never sees a probability a base
//! learner produced for its own training rows. The base learners are then
//! refitted on the full training partition for inference.

use crate::boosting::{BoostingConfig, GradientBoostingTrainer};
use crate::deterministic::{step_rng, stratified_folds, streams};
use crate::errors::TrainerError;
use crate::forest::ExtraTreesTrainer;
use crate::logistic::LogisticTrainer;
use crate::margin::PegasosTrainer;
use maternal_risk_core::{ProbabilisticClassifier, RiskClassifier};
use tracing::info;

/// A base learner of the stacking ensemble.
pub trait BaseLearner {
    type Model: ProbabilisticClassifier;

    fn fit(&self, rows: &[Vec<f64>], labels: &[usize], n_classes: usize) -> Self::Model;
}

/// Ensemble hyperparameters
#[derive(Clone, Debug)]
pub struct EnsembleConfig {
    pub seed: u64,
    pub n_trees: usize,
    pub boosting: BoostingConfig,
    pub margin_lambda: f64,
    pub margin_epochs: usize,
    pub meta: LogisticTrainer,
    pub cv_folds: usize,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            n_trees: 100,
            boosting: BoostingConfig::default(),
            margin_lambda: 1e-3,
            margin_epochs: 200,
            meta: LogisticTrainer::default(),
            cv_folds: 5,
        }
    }
}

pub struct StackingTrainer {
    config: EnsembleConfig,
}

impl StackingTrainer {
    pub fn new(config: EnsembleConfig) -> Self {
        Self { config }
    }

    fn extra_trees(&self) -> ExtraTreesTrainer {
        ExtraTreesTrainer::new(self.config.n_trees, self.config.seed)
    }

    fn boosting(&self) -> GradientBoostingTrainer {
        GradientBoostingTrainer::new(self.config.boosting.clone())
    }

    fn margin(&self) -> PegasosTrainer {
        PegasosTrainer::new(
            self.config.margin_lambda,
            self.config.margin_epochs,
            self.config.seed,
        )
    }

    /// Fit base learners and meta learner on standardized training rows.
    pub fn fit(
        &self,
        rows: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
    ) -> Result<RiskClassifier, TrainerError> {
        let feature_count = rows
            .first()
            .map(Vec::len)
            .ok_or_else(|| TrainerError::Training("no training rows".into()))?;
        if n_classes < 2 {
            return Err(TrainerError::Training(format!(
                "need at least two classes, found {n_classes}"
            )));
        }

        let k = self.config.cv_folds;
        let folds = stratified_folds(
            labels,
            n_classes,
            k,
            &mut step_rng(self.config.seed, streams::FOLDS),
        )?;

        let mut oof = vec![Vec::new(); rows.len()];
        for fold in 0..k {
            let (train_idx, hold_idx): (Vec<usize>, Vec<usize>) =
                (0..rows.len()).partition(|&i| folds[i] != fold);
            let fold_rows: Vec<Vec<f64>> = train_idx.iter().map(|&i| rows[i].clone()).collect();
            let fold_labels: Vec<usize> = train_idx.iter().map(|&i| labels[i]).collect();

            let extra_trees = self.extra_trees().fit(&fold_rows, &fold_labels, n_classes);
            let boosting = self.boosting().fit(&fold_rows, &fold_labels, n_classes);
            let margin = self.margin().fit(&fold_rows, &fold_labels, n_classes);

            for &i in &hold_idx {
                oof[i] = stack(&extra_trees, &boosting, &margin, &rows[i]);
            }
            info!(
                fold = fold + 1,
                of = k,
                train = train_idx.len(),
                holdout = hold_idx.len(),
                "fitted cross-validation fold"
            );
        }

        let meta = self.config.meta.fit(&oof, labels, n_classes);

        let classifier = RiskClassifier {
            n_classes,
            feature_count,
            extra_trees: self.extra_trees().fit(rows, labels, n_classes),
            boosting: self.boosting().fit(rows, labels, n_classes),
            margin: self.margin().fit(rows, labels, n_classes),
            meta,
        };
        classifier.validate(feature_count)?;

        info!(
            samples = rows.len(),
            features = feature_count,
            classes = n_classes,
            "fitted stacking ensemble"
        );
        Ok(classifier)
    }
}

/// Base learner probabilities concatenated in ensemble order.
fn stack(
    extra_trees: &impl ProbabilisticClassifier,
    boosting: &impl ProbabilisticClassifier,
    margin: &impl ProbabilisticClassifier,
    row: &[f64],
) -> Vec<f64> {
    let mut stacked = extra_trees.predict_proba(row);
    stacked.extend(boosting.predict_proba(row));
    stacked.extend(margin.predict_proba(row));
    stacked
}
