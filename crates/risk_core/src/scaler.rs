//! Per-column standardization fitted on the training partition

use crate::errors::{Result, RiskCoreError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fitted standard scaler.
///
/// Standard deviations are population values (ddof = 0). Constant columns
/// are stored with a divisor of 1 and listed in `constant_columns`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub means: Vec<f64>,
    pub std_devs: Vec<f64>,
    pub constant_columns: Vec<usize>,
}

impl FeatureScaler {
    /// Compute column means and deviations over `rows`.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let first = rows.first().ok_or(RiskCoreError::EmptyFit("FeatureScaler"))?;
        let width = first.len();
        let n = rows.len() as f64;

        let mut means = vec![0.0; width];
        for row in rows {
            check_width(width, row)?;
            for (mean, &v) in means.iter_mut().zip(row) {
                *mean += v;
            }
        }
        for mean in &mut means {
            *mean /= n;
        }

        let mut variances = vec![0.0; width];
        for row in rows {
            for ((var, &v), &mean) in variances.iter_mut().zip(row).zip(&means) {
                let diff = v - mean;
                *var += diff * diff;
            }
        }

        let mut std_devs = Vec::with_capacity(width);
        let mut constant_columns = Vec::new();
        for (column, var) in variances.into_iter().enumerate() {
            let std = (var / n).sqrt();
            if std > 0.0 {
                std_devs.push(std);
            } else {
                constant_columns.push(column);
                std_devs.push(1.0);
            }
        }

        if !constant_columns.is_empty() {
            debug!(?constant_columns, "constant columns use unit divisor");
        }

        Ok(Self {
            means,
            std_devs,
            constant_columns,
        })
    }

    /// Number of columns the scaler was fitted on.
    pub fn width(&self) -> usize {
        self.means.len()
    }

    /// Standardize one row.
    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        check_width(self.width(), row)?;
        Ok(row
            .iter()
            .zip(self.means.iter().zip(&self.std_devs))
            .map(|(&v, (&mean, &std))| (v - mean) / std)
            .collect())
    }

    /// Standardize every row.
    pub fn transform_all(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter().map(|row| self.transform(row)).collect()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.means.len() != self.std_devs.len() {
            return Err(RiskCoreError::InvalidModel(
                "scaler means and deviations differ in length".into(),
            ));
        }
        if self.std_devs.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
            return Err(RiskCoreError::InvalidModel(
                "scaler contains a non-positive deviation".into(),
            ));
        }
        Ok(())
    }
}

fn check_width(expected: usize, row: &[f64]) -> Result<()> {
    if row.len() != expected {
        return Err(RiskCoreError::FeatureSizeMismatch {
            expected,
            actual: row.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(rows: &[Vec<f64>], idx: usize) -> Vec<f64> {
        rows.iter().map(|r| r[idx]).collect()
    }

    #[test]
    fn transformed_columns_are_standardized() {
        let rows = vec![
            vec![1.0, 10.0, 5.0],
            vec![2.0, 20.0, 5.0],
            vec![3.0, 30.0, 5.0],
            vec![4.0, 45.0, 5.0],
        ];
        let scaler = FeatureScaler::fit(&rows).unwrap();
        let scaled = scaler.transform_all(&rows).unwrap();

        for idx in 0..2 {
            let values = column(&scaled, idx);
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
            assert!(mean.abs() < 1e-12);
            assert!((var.sqrt() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn constant_column_uses_unit_divisor() {
        let rows = vec![vec![7.0, 1.0], vec![7.0, 3.0]];
        let scaler = FeatureScaler::fit(&rows).unwrap();
        assert_eq!(scaler.constant_columns, vec![0]);
        assert_eq!(scaler.std_devs[0], 1.0);
        assert_eq!(scaler.transform(&[9.0, 2.0]).unwrap(), vec![2.0, 0.0]);
    }

    #[test]
    fn width_mismatch_is_rejected() {
        let scaler = FeatureScaler::fit(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert!(matches!(
            scaler.transform(&[1.0]),
            Err(RiskCoreError::FeatureSizeMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn empty_fit_fails() {
        assert!(FeatureScaler::fit(&[]).is_err());
    }
}
