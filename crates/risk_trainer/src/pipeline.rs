//! End-to-end training pipeline
//!
//! derive features → fit/apply encoder → fit label encoder → balance classes
//! → seeded train/test split → fit scaler on the train partition → fit the
//! stacking ensemble → evaluate on the test partition → persist.

use crate::balance::ClassBalancer;
use crate::boosting::BoostingConfig;
use crate::dataset::Dataset;
use crate::deterministic::{step_rng, streams, train_test_split};
use crate::errors::TrainerError;
use crate::evaluation::EvaluationReport;
use crate::logistic::LogisticTrainer;
use crate::stacking::{EnsembleConfig, StackingTrainer};
use maternal_risk_core::serde_canon::hash_canonical_hex;
use maternal_risk_core::{
    derive_features, ArtifactSet, CategoricalEncoder, FeatureScaler, LabelEncoder, Manifest,
    ProbabilisticClassifier, FORMAT_VERSION,
};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// File name of the persisted evaluation report.
pub const EVALUATION_FILE: &str = "evaluation.json";

/// Training configuration; part of the run id.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrainingConfig {
    pub seed: u64,
    pub test_fraction: f64,
    pub smote_neighbors: usize,
    pub n_trees: usize,
    pub boosting_rounds: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub margin_lambda: f64,
    pub margin_epochs: usize,
    pub meta_c: f64,
    pub meta_iterations: usize,
    pub cv_folds: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            test_fraction: 0.2,
            smote_neighbors: 5,
            n_trees: 100,
            boosting_rounds: 100,
            learning_rate: 0.1,
            max_depth: 3,
            margin_lambda: 1e-3,
            margin_epochs: 200,
            meta_c: 1.0,
            meta_iterations: 500,
            cv_folds: 5,
        }
    }
}

impl TrainingConfig {
    fn ensemble(&self) -> EnsembleConfig {
        EnsembleConfig {
            seed: self.seed,
            n_trees: self.n_trees,
            boosting: BoostingConfig {
                rounds: self.boosting_rounds,
                learning_rate: self.learning_rate,
                max_depth: self.max_depth,
            },
            margin_lambda: self.margin_lambda,
            margin_epochs: self.margin_epochs,
            meta: LogisticTrainer {
                c: self.meta_c,
                iterations: self.meta_iterations,
                ..LogisticTrainer::default()
            },
            cv_folds: self.cv_folds,
        }
    }
}

#[derive(Serialize)]
struct RunFingerprint<'a> {
    dataset: &'a str,
    config: &'a TrainingConfig,
    format_version: u32,
}

/// Fitted artifacts and their held-out evaluation.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifacts: ArtifactSet,
    pub report: EvaluationReport,
}

pub struct TrainingPipeline {
    config: TrainingConfig,
}

impl TrainingPipeline {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Digest of the dataset bytes and the training configuration.
    pub fn run_id(&self, dataset: &Dataset) -> Result<String, TrainerError> {
        let fingerprint = RunFingerprint {
            dataset: &dataset.content_hash,
            config: &self.config,
            format_version: FORMAT_VERSION,
        };
        hash_canonical_hex(&fingerprint).map_err(|e| TrainerError::Training(e.to_string()))
    }

    /// Fit every artifact and evaluate on the held-out partition.
    pub fn fit(&self, dataset: &Dataset) -> Result<TrainingOutcome, TrainerError> {
        let config = &self.config;
        let run_id = self.run_id(dataset)?;
        info!(samples = dataset.len(), run_id = %run_id, "starting training run");
        for (label, count) in dataset.class_counts() {
            info!(label, count, "class distribution");
        }

        let derived = dataset
            .records
            .iter()
            .enumerate()
            .map(|(row, record)| {
                derive_features(record)
                    .map_err(|e| TrainerError::Dataset(format!("row {}: {e}", row + 1)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let encoder = CategoricalEncoder::fit(&derived)?;
        let encoded = encoder.transform_all(&derived)?;
        info!(
            categories = ?encoder.categories,
            width = encoder.output_width(),
            "fitted categorical encoder"
        );

        let label_encoder = LabelEncoder::fit(&dataset.labels)?;
        if label_encoder.len() < 2 {
            return Err(TrainerError::Training(format!(
                "need at least two risk labels, found {:?}",
                label_encoder.classes
            )));
        }
        let targets = label_encoder.encode_all(&dataset.labels)?;
        let n_classes = label_encoder.len();

        let (balanced_rows, balanced_targets) = ClassBalancer::new(config.smote_neighbors)
            .fit_resample(
                &encoded,
                &targets,
                n_classes,
                &mut step_rng(config.seed, streams::BALANCE),
            );

        let (train_idx, test_idx) = train_test_split(
            balanced_rows.len(),
            config.test_fraction,
            &mut step_rng(config.seed, streams::SPLIT),
        )?;
        let gather_rows = |idx: &[usize]| -> Vec<Vec<f64>> {
            idx.iter().map(|&i| balanced_rows[i].clone()).collect()
        };
        let gather_targets =
            |idx: &[usize]| -> Vec<usize> { idx.iter().map(|&i| balanced_targets[i]).collect() };
        let (train_rows, train_targets) = (gather_rows(&train_idx), gather_targets(&train_idx));
        let (test_rows, test_targets) = (gather_rows(&test_idx), gather_targets(&test_idx));
        info!(train = train_rows.len(), test = test_rows.len(), "split dataset");

        self.check_class_sizes(&train_targets, &label_encoder)?;

        let scaler = FeatureScaler::fit(&train_rows)?;
        let train_scaled = scaler.transform_all(&train_rows)?;
        let test_scaled = scaler.transform_all(&test_rows)?;

        let classifier =
            StackingTrainer::new(config.ensemble()).fit(&train_scaled, &train_targets, n_classes)?;

        let predictions: Vec<usize> = test_scaled.iter().map(|row| classifier.predict(row)).collect();
        let report = EvaluationReport::compute(&test_targets, &predictions, &label_encoder.classes);
        report.log();

        let artifacts = ArtifactSet {
            run_id,
            encoder,
            label_encoder,
            scaler,
            classifier,
        };
        artifacts.check_consistency()?;

        Ok(TrainingOutcome { artifacts, report })
    }

    /// Fit, then persist artifacts, manifest and evaluation report to `dir`.
    pub fn fit_and_save(
        &self,
        dataset: &Dataset,
        dir: &Path,
    ) -> Result<(TrainingOutcome, Manifest), TrainerError> {
        let outcome = self.fit(dataset)?;
        let report_json = serde_json::to_string_pretty(&outcome.report)
            .map_err(|e| TrainerError::Training(e.to_string()))?;
        let manifest = outcome
            .artifacts
            .save(dir, &[(EVALUATION_FILE, report_json)])?;
        Ok((outcome, manifest))
    }

    /// Every class must appear at least once per cross-validation fold.
    fn check_class_sizes(
        &self,
        targets: &[usize],
        labels: &LabelEncoder,
    ) -> Result<(), TrainerError> {
        let mut counts = vec![0usize; labels.len()];
        for &t in targets {
            counts[t] += 1;
        }
        for (class, &count) in counts.iter().enumerate() {
            if count < self.config.cv_folds {
                return Err(TrainerError::EmptyClass {
                    label: labels.decode(class)?.to_string(),
                    count,
                    required: self.config.cv_folds,
                });
            }
        }
        Ok(())
    }
}
