//! Raw clinical measurements as received from a request or a dataset row

use crate::errors::{Result, RiskCoreError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field names in the order they are checked on input.
pub const REQUIRED_FIELDS: [&str; 6] = [
    "Age",
    "SystolicBP",
    "DiastolicBP",
    "HeartRate",
    "BodyTemp",
    "BS",
];

/// Upper (exclusive) bound for ages the bucketing covers.
pub const MAX_AGE: f64 = 120.0;

/// Six clinical measurements for one patient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Age in years
    #[serde(rename = "Age")]
    pub age: f64,
    /// Systolic blood pressure (mmHg)
    #[serde(rename = "SystolicBP")]
    pub systolic_bp: f64,
    /// Diastolic blood pressure (mmHg)
    #[serde(rename = "DiastolicBP")]
    pub diastolic_bp: f64,
    /// Blood sugar (mmol/L)
    #[serde(rename = "BS")]
    pub blood_sugar: f64,
    /// Body temperature (°F)
    #[serde(rename = "BodyTemp")]
    pub body_temp: f64,
    /// Heart rate (bpm)
    #[serde(rename = "HeartRate")]
    pub heart_rate: f64,
}

impl RawRecord {
    /// Build a record from a JSON object, reporting every absent field at once.
    ///
    /// Missing fields take precedence over malformed ones so that callers get
    /// the same answer regardless of which field is checked first.
    pub fn from_json_object(object: &Map<String, Value>) -> Result<Self> {
        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|field| !object.contains_key(**field))
            .map(|field| field.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(RiskCoreError::MissingFields(missing));
        }

        let number = |field: &str| -> Result<f64> {
            object
                .get(field)
                .and_then(Value::as_f64)
                .filter(|v| v.is_finite())
                .ok_or_else(|| RiskCoreError::InvalidField {
                    field: field.to_string(),
                })
        };

        Ok(Self {
            age: number("Age")?,
            systolic_bp: number("SystolicBP")?,
            diastolic_bp: number("DiastolicBP")?,
            heart_rate: number("HeartRate")?,
            body_temp: number("BodyTemp")?,
            blood_sugar: number("BS")?,
        })
    }

    /// Check that every value is finite and the age can be bucketed.
    pub fn validate(&self) -> Result<()> {
        self.check_finite()?;
        self.check_age_range()
    }

    /// Stricter check applied to incoming prediction requests.
    ///
    /// Any age at or below zero is reported as non-positive, ahead of the
    /// range check.
    pub fn validate_for_serving(&self) -> Result<()> {
        self.check_finite()?;
        if self.age <= 0.0 {
            return Err(RiskCoreError::NonPositiveAge);
        }
        self.check_age_range()
    }

    fn check_finite(&self) -> Result<()> {
        let fields = [
            ("Age", self.age),
            ("SystolicBP", self.systolic_bp),
            ("DiastolicBP", self.diastolic_bp),
            ("HeartRate", self.heart_rate),
            ("BodyTemp", self.body_temp),
            ("BS", self.blood_sugar),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(RiskCoreError::InvalidField {
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }

    fn check_age_range(&self) -> Result<()> {
        if !(0.0..MAX_AGE).contains(&self.age) {
            return Err(RiskCoreError::AgeOutOfRange { age: self.age });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("test value is an object")
    }

    #[test]
    fn parses_complete_object() {
        let record = RawRecord::from_json_object(&object(json!({
            "Age": 25, "SystolicBP": 120, "DiastolicBP": 80,
            "BS": 6.0, "BodyTemp": 98.0, "HeartRate": 70
        })))
        .unwrap();

        assert_eq!(record.age, 25.0);
        assert_eq!(record.blood_sugar, 6.0);
        assert_eq!(record.heart_rate, 70.0);
    }

    #[test]
    fn reports_all_missing_fields() {
        let err = RawRecord::from_json_object(&object(json!({ "Age": 25 }))).unwrap_err();
        match err {
            RiskCoreError::MissingFields(fields) => {
                assert_eq!(fields.len(), 5);
                assert!(!fields.contains(&"Age".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_non_numeric_field() {
        let err = RawRecord::from_json_object(&object(json!({
            "Age": "twenty", "SystolicBP": 120, "DiastolicBP": 80,
            "BS": 6.0, "BodyTemp": 98.0, "HeartRate": 70
        })))
        .unwrap_err();
        assert!(matches!(err, RiskCoreError::InvalidField { ref field } if field == "Age"));
        assert!(err.is_validation());
    }

    #[test]
    fn serving_requires_positive_age() {
        let record = RawRecord {
            age: 0.0,
            systolic_bp: 120.0,
            diastolic_bp: 80.0,
            blood_sugar: 6.0,
            body_temp: 98.0,
            heart_rate: 70.0,
        };
        assert!(record.validate().is_ok());
        assert!(matches!(
            record.validate_for_serving(),
            Err(RiskCoreError::NonPositiveAge)
        ));
    }

    #[test]
    fn serving_reports_negative_age_as_non_positive() {
        let record = RawRecord {
            age: -3.0,
            systolic_bp: 120.0,
            diastolic_bp: 80.0,
            blood_sugar: 6.0,
            body_temp: 98.0,
            heart_rate: 70.0,
        };
        assert!(matches!(
            record.validate(),
            Err(RiskCoreError::AgeOutOfRange { .. })
        ));
        let err = record.validate_for_serving().unwrap_err();
        assert!(matches!(err, RiskCoreError::NonPositiveAge));
        assert_eq!(err.to_string(), "Age must be greater than 0");
    }

    #[test]
    fn serving_still_rejects_ages_past_the_range() {
        let record = RawRecord {
            age: 130.0,
            systolic_bp: 120.0,
            diastolic_bp: 80.0,
            blood_sugar: 6.0,
            body_temp: 98.0,
            heart_rate: 70.0,
        };
        assert!(matches!(
            record.validate_for_serving(),
            Err(RiskCoreError::AgeOutOfRange { .. })
        ));
    }

    #[test]
    fn age_upper_bound_is_exclusive() {
        let mut record = RawRecord {
            age: 119.0,
            systolic_bp: 120.0,
            diastolic_bp: 80.0,
            blood_sugar: 6.0,
            body_temp: 98.0,
            heart_rate: 70.0,
        };
        assert!(record.validate().is_ok());
        record.age = 120.0;
        assert!(matches!(
            record.validate(),
            Err(RiskCoreError::AgeOutOfRange { .. })
        ));
    }
}
