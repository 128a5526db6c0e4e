//! Maternal Health Risk Core
//!
//! Shared feature pipeline, fitted artifact formats and deterministic
//! inference used by both the trainer and the prediction service.
//!
//! Modules:
//! - `record`: Raw clinical measurements and input validation
//! - `features`: Pure feature derivation shared by training and serving
//! - `encoder`: One-hot encoding of the AgeGroup category
//! - `labels`: Risk label <-> class index mapping
//! - `scaler`: Per-column standardization
//! - `classifier`: Fitted stacking ensemble and its inference path
//! - `artifacts`: Run-stamped artifact persistence and verification
//! - `prediction`: Immutable single-record prediction context
//! - `serde_canon`: Canonical JSON and BLAKE3 digests

pub mod artifacts;
pub mod classifier;
pub mod encoder;
pub mod errors;
pub mod features;
pub mod labels;
pub mod prediction;
pub mod record;
pub mod scaler;
pub mod serde_canon;

pub use artifacts::{ArtifactSet, Manifest, StoredArtifact, FORMAT_VERSION};
pub use classifier::{ProbabilisticClassifier, RiskClassifier};
pub use encoder::CategoricalEncoder;
pub use errors::{Result, RiskCoreError};
pub use features::{derive_features, AgeGroup, DerivedFeatureVector, FEATURE_NAMES};
pub use labels::LabelEncoder;
pub use prediction::{Prediction, PredictionService};
pub use record::{RawRecord, REQUIRED_FIELDS};
pub use scaler::FeatureScaler;

/// Crate version string for artifact metadata and health reports
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
