//! Deterministic feature derivation shared by training and serving
//!
//! Both the trainer and the prediction service call [`derive_features`], so a
//! record always maps to the same derived vector regardless of which path
//! produced it. The derivation is pure: no state, no randomness, no I/O.

use crate::errors::{Result, RiskCoreError};
use crate::record::RawRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bin edges for age bucketing; left-inclusive, right-exclusive.
pub const AGE_BINS: [f64; 8] = [0.0, 19.0, 29.0, 39.0, 49.0, 59.0, 69.0, 120.0];

/// Number of derived features, the categorical AgeGroup included.
pub const DERIVED_FEATURE_COUNT: usize = 11;

/// Number of numeric features passed through after the one-hot block.
pub const PASSTHROUGH_COUNT: usize = DERIVED_FEATURE_COUNT - 1;

/// Names of the derived features in positional order.
pub const FEATURE_NAMES: [&str; DERIVED_FEATURE_COUNT] = [
    "AgeGroup",
    "BPRatio",
    "HeartRateRatio",
    "PulseRate",
    "Fever",
    "Hypertension",
    "BS",
    "Prediabetes",
    "Diabetes",
    "age_bpratio_interaction",
    "age_bs_interaction",
];

const FEVER_THRESHOLD_F: f64 = 98.6;
const HYPERTENSION_SYSTOLIC: f64 = 130.0;
const HYPERTENSION_DIASTOLIC: f64 = 80.0;
const PREDIABETES_RANGE: (f64, f64) = (5.6, 6.9);
const DIABETES_THRESHOLD: f64 = 7.0;
const MAX_HEART_RATE_BASE: f64 = 220.0;

/// Age bucket of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "0-19")]
    UpTo19,
    #[serde(rename = "20-29")]
    Twenties,
    #[serde(rename = "30-39")]
    Thirties,
    #[serde(rename = "40-49")]
    Forties,
    #[serde(rename = "50-59")]
    Fifties,
    #[serde(rename = "60-69")]
    Sixties,
    #[serde(rename = "70+")]
    SeventyPlus,
}

impl AgeGroup {
    /// All buckets in bin order.
    pub const ALL: [AgeGroup; 7] = [
        AgeGroup::UpTo19,
        AgeGroup::Twenties,
        AgeGroup::Thirties,
        AgeGroup::Forties,
        AgeGroup::Fifties,
        AgeGroup::Sixties,
        AgeGroup::SeventyPlus,
    ];

    /// Bucket an age using [`AGE_BINS`].
    pub fn from_age(age: f64) -> Result<Self> {
        if !age.is_finite() || age < AGE_BINS[0] || age >= AGE_BINS[AGE_BINS.len() - 1] {
            return Err(RiskCoreError::AgeOutOfRange { age });
        }
        let bucket = AGE_BINS[1..]
            .iter()
            .position(|&upper| age < upper)
            .ok_or(RiskCoreError::AgeOutOfRange { age })?;
        Ok(Self::ALL[bucket])
    }

    /// Category label as stored by the encoder.
    pub fn label(self) -> &'static str {
        match self {
            AgeGroup::UpTo19 => "0-19",
            AgeGroup::Twenties => "20-29",
            AgeGroup::Thirties => "30-39",
            AgeGroup::Forties => "40-49",
            AgeGroup::Fifties => "50-59",
            AgeGroup::Sixties => "60-69",
            AgeGroup::SeventyPlus => "70+",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The 11 derived features for one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedFeatureVector {
    #[serde(rename = "AgeGroup")]
    pub age_group: AgeGroup,
    #[serde(rename = "BPRatio")]
    pub bp_ratio: f64,
    #[serde(rename = "HeartRateRatio")]
    pub heart_rate_ratio: f64,
    #[serde(rename = "PulseRate")]
    pub pulse_rate: f64,
    #[serde(rename = "Fever")]
    pub fever: u8,
    #[serde(rename = "Hypertension")]
    pub hypertension: u8,
    #[serde(rename = "BS")]
    pub blood_sugar: f64,
    #[serde(rename = "Prediabetes")]
    pub prediabetes: u8,
    #[serde(rename = "Diabetes")]
    pub diabetes: u8,
    pub age_bpratio_interaction: f64,
    pub age_bs_interaction: f64,
}

impl DerivedFeatureVector {
    /// Numeric features following AgeGroup, in positional order.
    pub fn passthrough(&self) -> [f64; PASSTHROUGH_COUNT] {
        [
            self.bp_ratio,
            self.heart_rate_ratio,
            self.pulse_rate,
            f64::from(self.fever),
            f64::from(self.hypertension),
            self.blood_sugar,
            f64::from(self.prediabetes),
            f64::from(self.diabetes),
            self.age_bpratio_interaction,
            self.age_bs_interaction,
        ]
    }
}

/// Derive the feature vector for one record.
///
/// Fails only when the record itself is invalid (non-finite values or an
/// age outside `[0, 120)`).
pub fn derive_features(record: &RawRecord) -> Result<DerivedFeatureVector> {
    record.validate()?;

    let age = record.age;
    let bp_ratio = bp_ratio(record.systolic_bp, record.diastolic_bp);

    Ok(DerivedFeatureVector {
        age_group: AgeGroup::from_age(age)?,
        bp_ratio,
        heart_rate_ratio: heart_rate_ratio(age, record.heart_rate),
        pulse_rate: record.heart_rate,
        fever: flag(record.body_temp > FEVER_THRESHOLD_F),
        hypertension: flag(
            record.systolic_bp >= HYPERTENSION_SYSTOLIC
                || record.diastolic_bp >= HYPERTENSION_DIASTOLIC,
        ),
        blood_sugar: record.blood_sugar,
        prediabetes: flag(
            (PREDIABETES_RANGE.0..=PREDIABETES_RANGE.1).contains(&record.blood_sugar),
        ),
        diabetes: flag(record.blood_sugar >= DIABETES_THRESHOLD),
        age_bpratio_interaction: age * bp_ratio,
        age_bs_interaction: age * record.blood_sugar,
    })
}

/// Systolic over diastolic pressure; zero when diastolic is zero.
pub fn bp_ratio(systolic: f64, diastolic: f64) -> f64 {
    if diastolic == 0.0 {
        0.0
    } else {
        systolic / diastolic
    }
}

/// Heart rate relative to the age-predicted maximum; zero for age zero.
pub fn heart_rate_ratio(age: f64, heart_rate: f64) -> f64 {
    if age == 0.0 {
        0.0
    } else {
        heart_rate / (MAX_HEART_RATE_BASE - age)
    }
}

fn flag(condition: bool) -> u8 {
    u8::from(condition)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(age: f64, sys: f64, dia: f64, bs: f64, temp: f64, hr: f64) -> RawRecord {
        RawRecord {
            age,
            systolic_bp: sys,
            diastolic_bp: dia,
            blood_sugar: bs,
            body_temp: temp,
            heart_rate: hr,
        }
    }

    fn baseline() -> RawRecord {
        record(25.0, 120.0, 80.0, 6.0, 98.0, 70.0)
    }

    #[test]
    fn test_age_group_boundaries() {
        assert_eq!(AgeGroup::from_age(0.0).unwrap().label(), "0-19");
        assert_eq!(AgeGroup::from_age(18.9).unwrap().label(), "0-19");
        assert_eq!(AgeGroup::from_age(19.0).unwrap().label(), "20-29");
        assert_eq!(AgeGroup::from_age(29.0).unwrap().label(), "30-39");
        assert_eq!(AgeGroup::from_age(68.0).unwrap().label(), "60-69");
        assert_eq!(AgeGroup::from_age(69.0).unwrap().label(), "70+");
        assert_eq!(AgeGroup::from_age(119.0).unwrap().label(), "70+");
    }

    #[test]
    fn test_age_group_out_of_range() {
        assert!(matches!(
            AgeGroup::from_age(120.0),
            Err(RiskCoreError::AgeOutOfRange { .. })
        ));
        assert!(AgeGroup::from_age(-1.0).is_err());
        assert!(AgeGroup::from_age(f64::NAN).is_err());
    }

    #[test]
    fn test_bp_ratio() {
        assert_eq!(bp_ratio(120.0, 0.0), 0.0);
        assert_eq!(bp_ratio(120.0, 80.0), 1.5);
    }

    #[test]
    fn test_heart_rate_ratio() {
        assert_eq!(heart_rate_ratio(0.0, 80.0), 0.0);
        assert_eq!(heart_rate_ratio(0.0, 0.0), 0.0);
        assert!((heart_rate_ratio(20.0, 154.0) - 0.77).abs() < 1e-12);
    }

    #[test]
    fn test_fever_is_strictly_greater() {
        let mut r = baseline();
        r.body_temp = 98.6;
        assert_eq!(derive_features(&r).unwrap().fever, 0);
        r.body_temp = 98.7;
        assert_eq!(derive_features(&r).unwrap().fever, 1);
    }

    #[test]
    fn test_hypertension() {
        let check = |sys, dia| derive_features(&record(30.0, sys, dia, 5.0, 98.0, 70.0)).unwrap();
        assert_eq!(check(129.0, 79.0).hypertension, 0);
        assert_eq!(check(130.0, 79.0).hypertension, 1);
        assert_eq!(check(129.0, 80.0).hypertension, 1);
    }

    #[test]
    fn test_blood_sugar_flags() {
        let check = |bs| derive_features(&record(30.0, 110.0, 70.0, bs, 98.0, 70.0)).unwrap();
        assert_eq!(check(5.5).prediabetes, 0);
        assert_eq!(check(5.6).prediabetes, 1);
        assert_eq!(check(6.9).prediabetes, 1);
        assert_eq!(check(7.0).prediabetes, 0);
        assert_eq!(check(7.0).diabetes, 1);
        assert_eq!(check(6.9).diabetes, 0);
    }

    #[test]
    fn test_pulse_rate_copies_heart_rate() {
        let features = derive_features(&baseline()).unwrap();
        assert_eq!(features.pulse_rate, 70.0);
    }

    #[test]
    fn test_interactions() {
        let features = derive_features(&baseline()).unwrap();
        assert_eq!(features.bp_ratio, 1.5);
        assert_eq!(features.age_bpratio_interaction, 25.0 * 1.5);
        assert_eq!(features.age_bs_interaction, 25.0 * 6.0);
    }

    #[test]
    fn test_passthrough_order() {
        let features = derive_features(&baseline()).unwrap();
        let values = features.passthrough();
        assert_eq!(values.len(), PASSTHROUGH_COUNT);
        assert_eq!(values[0], features.bp_ratio);
        assert_eq!(values[2], 70.0);
        assert_eq!(values[5], 6.0);
        assert_eq!(values[9], features.age_bs_interaction);
    }

    #[test]
    fn test_serialized_names_follow_layout() {
        let json = serde_json::to_value(derive_features(&baseline()).unwrap()).unwrap();
        let object = json.as_object().unwrap();
        for name in FEATURE_NAMES {
            assert!(object.contains_key(name), "missing {name}");
        }
        assert_eq!(object["AgeGroup"], "20-29");
    }
}
