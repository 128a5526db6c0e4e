//! Error types for the risk core crate

use thiserror::Error;

/// Errors raised by the shared feature pipeline, fitted artifacts and inference.
#[derive(Error, Debug)]
pub enum RiskCoreError {
    /// One or more required input fields are absent
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// A required field is present but not a finite number
    #[error("Invalid value for field {field}")]
    InvalidField { field: String },

    /// Age falls outside the supported bucketing range
    #[error("Age {age} is outside the supported range [0, 120)")]
    AgeOutOfRange { age: f64 },

    /// Serving-time guard: age must be strictly positive
    #[error("Age must be greater than 0")]
    NonPositiveAge,

    /// Categorical value never observed while fitting the encoder
    #[error("Unknown category '{value}' for feature {feature}")]
    UnknownCategory { feature: String, value: String },

    /// Label never observed while fitting the label encoder
    #[error("Unknown label '{0}'")]
    UnknownLabel(String),

    /// Class index produced outside of the fitted label range
    #[error("Unknown class index {index} (fitted classes: {classes})")]
    UnknownClassIndex { index: usize, classes: usize },

    /// Vector width does not match the fitted layout
    #[error("Feature size mismatch: expected {expected}, got {actual}")]
    FeatureSizeMismatch { expected: usize, actual: usize },

    /// Fitting was attempted on an empty input
    #[error("Cannot fit {0} on an empty dataset")]
    EmptyFit(&'static str),

    /// Fitted model state is structurally invalid
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// Persisted artifact is missing or unreadable
    #[error("Failed to load artifact {name}: {reason}")]
    ArtifactLoad { name: String, reason: String },

    /// Persisted artifacts do not belong to the same training run or layout
    #[error("Artifact version mismatch: {0}")]
    ArtifactVersionMismatch(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RiskCoreError {
    /// True for errors caused by the caller's input rather than by the service.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            RiskCoreError::MissingFields(_)
                | RiskCoreError::InvalidField { .. }
                | RiskCoreError::AgeOutOfRange { .. }
                | RiskCoreError::NonPositiveAge
        )
    }
}

/// Result type for risk core operations
pub type Result<T> = std::result::Result<T, RiskCoreError>;
