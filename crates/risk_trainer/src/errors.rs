use maternal_risk_core::RiskCoreError;
use thiserror::Error;

/// Errors returned by the deterministic trainer.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("training error: {0}")]
    Training(String),

    #[error("class '{label}' has {count} training samples, need at least {required}")]
    EmptyClass {
        label: String,
        count: usize,
        required: usize,
    },

    #[error(transparent)]
    Core(#[from] RiskCoreError),
}
