//! Maternal Risk Trainer - Deterministic offline trainer
//!
//! Fits the encoders, scaler and stacking classifier from a labelled CSV
//! dataset. All randomness is seeded, so the same data and configuration
//! always produce the same run id and byte-identical artifacts.

pub mod balance;
pub mod boosting;
pub mod cart;
pub mod dataset;
pub mod deterministic;
pub mod errors;
pub mod evaluation;
pub mod forest;
pub mod logistic;
pub mod margin;
pub mod pipeline;
pub mod stacking;

use maternal_risk_core::Manifest;
use std::path::Path;

pub use balance::ClassBalancer;
pub use dataset::{Dataset, LABEL_COLUMN};
pub use errors::TrainerError;
pub use evaluation::EvaluationReport;
pub use pipeline::{TrainingConfig, TrainingOutcome, TrainingPipeline, EVALUATION_FILE};
pub use stacking::{BaseLearner, EnsembleConfig, StackingTrainer};

/// Train from a CSV file and persist the artifacts into `output`.
pub fn train_from_csv(
    input: &Path,
    output: &Path,
    config: TrainingConfig,
) -> Result<(TrainingOutcome, Manifest), TrainerError> {
    let dataset = Dataset::from_csv(input).map_err(|err| TrainerError::Dataset(format!("{err:#}")))?;
    TrainingPipeline::new(config).fit_and_save(&dataset, output)
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
