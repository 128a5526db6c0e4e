//! Persistence of the fitted artifacts produced by one training run
//!
//! An artifact directory holds four independently loadable files
//! (`encoder.json`, `label_encoder.json`, `scaler.json`, `model.json`) plus a
//! `manifest.json`. Every artifact is stamped with the training run id, and
//! the manifest records the BLAKE3 digest of each file. Loading verifies both,
//! then checks that the feature layouts agree; any disagreement is fatal.
//!
//! Saving is all-or-nothing: files are written to a staging directory next to
//! the target, which is swapped into place only once everything is written.

use crate::classifier::{ProbabilisticClassifier, RiskClassifier};
use crate::encoder::CategoricalEncoder;
use crate::errors::{Result, RiskCoreError};
use crate::labels::LabelEncoder;
use crate::scaler::FeatureScaler;
use crate::serde_canon::{hash_bytes_hex, to_canonical_json};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// On-disk format version shared by every artifact file.
pub const FORMAT_VERSION: u32 = 1;

pub const ENCODER_ARTIFACT: &str = "encoder";
pub const LABEL_ENCODER_ARTIFACT: &str = "label_encoder";
pub const SCALER_ARTIFACT: &str = "scaler";
pub const MODEL_ARTIFACT: &str = "model";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Artifact names in the order they are written and verified.
pub const ARTIFACT_NAMES: [&str; 4] = [
    ENCODER_ARTIFACT,
    LABEL_ENCODER_ARTIFACT,
    SCALER_ARTIFACT,
    MODEL_ARTIFACT,
];

/// File name for an artifact name.
pub fn artifact_file(name: &str) -> String {
    format!("{name}.json")
}

/// Envelope written for every artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredArtifact<T> {
    pub name: String,
    pub run_id: String,
    pub format_version: u32,
    pub payload: T,
}

/// Index of one training run's artifact files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    pub format_version: u32,
    pub feature_names: Vec<String>,
    pub labels: Vec<String>,
    /// File name -> BLAKE3 hex digest of its bytes
    pub artifacts: BTreeMap<String, String>,
}

/// The four fitted artifacts of one training run.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactSet {
    pub run_id: String,
    pub encoder: CategoricalEncoder,
    pub label_encoder: LabelEncoder,
    pub scaler: FeatureScaler,
    pub classifier: RiskClassifier,
}

impl ArtifactSet {
    /// Check that the artifacts describe one consistent feature layout.
    pub fn check_consistency(&self) -> Result<()> {
        let width = self.encoder.output_width();
        if self.scaler.width() != width {
            return Err(RiskCoreError::ArtifactVersionMismatch(format!(
                "scaler fitted on {} columns, encoder produces {width}",
                self.scaler.width()
            )));
        }
        self.scaler.validate()?;

        if self.classifier.feature_count != width {
            return Err(RiskCoreError::ArtifactVersionMismatch(format!(
                "classifier expects {} features, encoder produces {width}",
                self.classifier.feature_count
            )));
        }
        if self.classifier.n_classes != self.label_encoder.len() {
            return Err(RiskCoreError::ArtifactVersionMismatch(format!(
                "classifier predicts {} classes, label encoder knows {}",
                self.classifier.n_classes,
                self.label_encoder.len()
            )));
        }
        self.classifier.validate(width)
    }

    /// Persist all artifacts plus any extra report files into `dir`.
    ///
    /// `extras` are written verbatim (e.g. an evaluation report) and hashed
    /// into the manifest alongside the artifacts.
    pub fn save(&self, dir: &Path, extras: &[(&str, String)]) -> Result<Manifest> {
        self.check_consistency()?;

        let staging = sibling_path(dir, "staging");
        if staging.exists() {
            warn!(path = %staging.display(), "removing stale staging directory");
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;

        let result = self.write_all(&staging, extras).and_then(|manifest| {
            swap_into_place(&staging, dir)?;
            Ok(manifest)
        });

        if result.is_err() && staging.exists() {
            if let Err(err) = fs::remove_dir_all(&staging) {
                warn!(%err, "failed to clean up staging directory");
            }
        }

        let manifest = result?;
        info!(
            run_id = %manifest.run_id,
            dir = %dir.display(),
            "persisted training artifacts"
        );
        Ok(manifest)
    }

    fn write_all(&self, staging: &Path, extras: &[(&str, String)]) -> Result<Manifest> {
        let mut hashes = BTreeMap::new();

        let mut write = |file: String, contents: String| -> Result<()> {
            fs::write(staging.join(&file), contents.as_bytes())?;
            hashes.insert(file, hash_bytes_hex(contents.as_bytes()));
            Ok(())
        };

        write(
            artifact_file(ENCODER_ARTIFACT),
            self.envelope(ENCODER_ARTIFACT, &self.encoder)?,
        )?;
        write(
            artifact_file(LABEL_ENCODER_ARTIFACT),
            self.envelope(LABEL_ENCODER_ARTIFACT, &self.label_encoder)?,
        )?;
        write(
            artifact_file(SCALER_ARTIFACT),
            self.envelope(SCALER_ARTIFACT, &self.scaler)?,
        )?;
        write(
            artifact_file(MODEL_ARTIFACT),
            self.envelope(MODEL_ARTIFACT, &self.classifier)?,
        )?;
        for (file, contents) in extras {
            write(file.to_string(), contents.clone())?;
        }

        let manifest = Manifest {
            run_id: self.run_id.clone(),
            created_at: Utc::now(),
            format_version: FORMAT_VERSION,
            feature_names: self.encoder.feature_names(),
            labels: self.label_encoder.classes.clone(),
            artifacts: hashes,
        };
        let manifest_json = serde_json::to_string_pretty(&manifest)?;
        fs::write(staging.join(MANIFEST_FILE), manifest_json)?;
        Ok(manifest)
    }

    fn envelope<T: Serialize + Clone>(&self, name: &str, payload: &T) -> Result<String> {
        let stored = StoredArtifact {
            name: name.to_string(),
            run_id: self.run_id.clone(),
            format_version: FORMAT_VERSION,
            payload: payload.clone(),
        };
        Ok(to_canonical_json(&stored)?)
    }

    /// Load and cross-check the artifacts stored in `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let manifest: Manifest = read_manifest(dir)?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(RiskCoreError::ArtifactVersionMismatch(format!(
                "manifest format version {} is not supported (expected {FORMAT_VERSION})",
                manifest.format_version
            )));
        }

        let encoder: CategoricalEncoder = read_artifact(dir, ENCODER_ARTIFACT, &manifest)?;
        let label_encoder: LabelEncoder = read_artifact(dir, LABEL_ENCODER_ARTIFACT, &manifest)?;
        let scaler: FeatureScaler = read_artifact(dir, SCALER_ARTIFACT, &manifest)?;
        let classifier: RiskClassifier = read_artifact(dir, MODEL_ARTIFACT, &manifest)?;

        let set = Self {
            run_id: manifest.run_id.clone(),
            encoder,
            label_encoder,
            scaler,
            classifier,
        };

        if set.encoder.feature_names() != manifest.feature_names {
            return Err(RiskCoreError::ArtifactVersionMismatch(
                "encoder layout differs from the manifest".into(),
            ));
        }
        if set.label_encoder.classes != manifest.labels {
            return Err(RiskCoreError::ArtifactVersionMismatch(
                "label encoder classes differ from the manifest".into(),
            ));
        }
        set.check_consistency()?;

        info!(
            run_id = %set.run_id,
            features = set.encoder.output_width(),
            classes = set.label_encoder.len(),
            "loaded training artifacts"
        );
        Ok(set)
    }
}

fn read_manifest(dir: &Path) -> Result<Manifest> {
    let path = dir.join(MANIFEST_FILE);
    let bytes = fs::read(&path).map_err(|e| RiskCoreError::ArtifactLoad {
        name: MANIFEST_FILE.to_string(),
        reason: format!("{}: {e}", path.display()),
    })?;
    serde_json::from_slice(&bytes).map_err(|e| RiskCoreError::ArtifactLoad {
        name: MANIFEST_FILE.to_string(),
        reason: e.to_string(),
    })
}

fn read_artifact<T: DeserializeOwned>(dir: &Path, name: &str, manifest: &Manifest) -> Result<T> {
    let file = artifact_file(name);
    let path = dir.join(&file);
    let load_error = |reason: String| RiskCoreError::ArtifactLoad {
        name: name.to_string(),
        reason,
    };

    let bytes = fs::read(&path).map_err(|e| load_error(format!("{}: {e}", path.display())))?;
    let stored: StoredArtifact<T> =
        serde_json::from_slice(&bytes).map_err(|e| load_error(e.to_string()))?;

    if stored.name != name {
        return Err(load_error(format!("file contains artifact '{}'", stored.name)));
    }
    if stored.format_version != FORMAT_VERSION {
        return Err(RiskCoreError::ArtifactVersionMismatch(format!(
            "{name} has format version {} (expected {FORMAT_VERSION})",
            stored.format_version
        )));
    }
    if stored.run_id != manifest.run_id {
        return Err(RiskCoreError::ArtifactVersionMismatch(format!(
            "{name} belongs to run {} but manifest is for run {}",
            stored.run_id, manifest.run_id
        )));
    }

    let actual = hash_bytes_hex(&bytes);
    match manifest.artifacts.get(&file) {
        Some(expected) if *expected == actual => {}
        Some(expected) => {
            return Err(RiskCoreError::ArtifactVersionMismatch(format!(
                "{file} hash {actual} does not match manifest {expected}"
            )))
        }
        None => {
            return Err(RiskCoreError::ArtifactVersionMismatch(format!(
                "{file} is not listed in the manifest"
            )))
        }
    }

    debug!(artifact = name, hash = %actual, "verified artifact");
    Ok(stored.payload)
}

fn sibling_path(dir: &Path, suffix: &str) -> PathBuf {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifacts".to_string());
    dir.with_file_name(format!(".{name}.{suffix}"))
}

/// Replace `target` with `staging`, keeping the previous contents until the
/// swap succeeded.
fn swap_into_place(staging: &Path, target: &Path) -> Result<()> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    if !target.exists() {
        fs::rename(staging, target)?;
        return Ok(());
    }

    let backup = sibling_path(target, "previous");
    if backup.exists() {
        fs::remove_dir_all(&backup)?;
    }
    fs::rename(target, &backup)?;
    if let Err(err) = fs::rename(staging, target) {
        fs::rename(&backup, target)?;
        return Err(err.into());
    }
    fs::remove_dir_all(&backup)?;
    Ok(())
}
