//! CSV dataset loading
//!
//! Reads labelled clinical records from a headered CSV file. Columns are
//! located by name, so their order is free and extra columns are ignored.
//! Empty lines are skipped. The BLAKE3 digest of the raw file bytes
//! identifies the dataset in the training run id.

use anyhow::{bail, Context, Result};
use maternal_risk_core::{RawRecord, REQUIRED_FIELDS};
use std::collections::BTreeMap;
use std::path::Path;

/// Name of the label column.
pub const LABEL_COLUMN: &str = "RiskLevel";

/// Labelled training records.
#[derive(Clone, Debug)]
pub struct Dataset {
    pub records: Vec<RawRecord>,
    pub labels: Vec<String>,
    /// BLAKE3 hex digest of the source bytes
    pub content_hash: String,
}

impl Dataset {
    /// Load a dataset from a CSV file.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read CSV file {}", path.display()))?;
        Self::from_bytes(&bytes)
    }

    /// Parse a dataset from in-memory CSV bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let headers = reader.headers().context("Failed to read CSV header")?.clone();
        let column = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h == name)
                .with_context(|| format!("Missing required column '{name}'"))
        };

        let mut field_columns = [0usize; REQUIRED_FIELDS.len()];
        for (slot, field) in field_columns.iter_mut().zip(REQUIRED_FIELDS) {
            *slot = column(field)?;
        }
        let label_column = column(LABEL_COLUMN)?;

        let mut records = Vec::new();
        let mut labels = Vec::new();

        for row in reader.records() {
            let row = row.context("Malformed CSV row")?;
            let line = row.position().map(|p| p.line()).unwrap_or_default();

            let mut values = [0.0f64; REQUIRED_FIELDS.len()];
            for ((value, &col), field) in values.iter_mut().zip(&field_columns).zip(REQUIRED_FIELDS)
            {
                let raw = row.get(col).unwrap_or_default();
                *value = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .with_context(|| format!("Line {line}: invalid value '{raw}' for {field}"))?;
            }

            let label = row.get(label_column).unwrap_or_default();
            if label.is_empty() {
                bail!("Line {line}: empty {LABEL_COLUMN}");
            }

            // Same order as REQUIRED_FIELDS
            let [age, systolic_bp, diastolic_bp, heart_rate, body_temp, blood_sugar] = values;
            records.push(RawRecord {
                age,
                systolic_bp,
                diastolic_bp,
                blood_sugar,
                body_temp,
                heart_rate,
            });
            labels.push(label.to_string());
        }

        if records.is_empty() {
            bail!("Dataset is empty");
        }

        Ok(Self {
            records,
            labels,
            content_hash: hex::encode(blake3::hash(bytes).as_bytes()),
        })
    }

    /// Get number of samples
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if dataset is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sample count per label, in label order.
    pub fn class_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for label in &self.labels {
            *counts.entry(label.as_str()).or_insert(0) += 1;
        }
        counts
    }
}
