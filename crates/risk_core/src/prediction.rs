//! Single-record inference over persisted artifacts

use crate::artifacts::ArtifactSet;
use crate::classifier::{argmax, ProbabilisticClassifier};
use crate::errors::Result;
use crate::features::derive_features;
use crate::record::RawRecord;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Outcome of one prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    pub class_index: usize,
    /// Probability per class, in label-encoder order
    pub probabilities: Vec<f64>,
}

/// Immutable inference context built from one training run's artifacts.
///
/// Holds no interior mutability; share it behind an `Arc` across requests.
#[derive(Debug, Clone)]
pub struct PredictionService {
    artifacts: ArtifactSet,
}

impl PredictionService {
    /// Load and verify the artifacts in `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        Self::from_artifacts(ArtifactSet::load(dir)?)
    }

    /// Wrap an in-memory artifact set after checking its consistency.
    pub fn from_artifacts(artifacts: ArtifactSet) -> Result<Self> {
        artifacts.check_consistency()?;
        Ok(Self { artifacts })
    }

    pub fn run_id(&self) -> &str {
        &self.artifacts.run_id
    }

    pub fn labels(&self) -> &[String] {
        &self.artifacts.label_encoder.classes
    }

    /// Width of the encoded feature vector.
    pub fn feature_count(&self) -> usize {
        self.artifacts.encoder.output_width()
    }

    pub fn artifacts(&self) -> &ArtifactSet {
        &self.artifacts
    }

    /// Validate, derive, encode, scale, classify and decode one record.
    pub fn predict(&self, record: &RawRecord) -> Result<Prediction> {
        record.validate_for_serving()?;

        let derived = derive_features(record)?;
        let encoded = self.artifacts.encoder.transform(&derived)?;
        let scaled = self.artifacts.scaler.transform(&encoded)?;

        let probabilities = self.artifacts.classifier.predict_proba(&scaled);
        let class_index = argmax(&probabilities);
        let label = self.artifacts.label_encoder.decode(class_index)?.to_string();

        debug!(
            age_group = %derived.age_group,
            class_index,
            label = %label,
            "prediction"
        );

        Ok(Prediction {
            label,
            class_index,
            probabilities,
        })
    }
}
