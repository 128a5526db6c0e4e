use maternal_risk_core::features::{bp_ratio, heart_rate_ratio, AGE_BINS};
use maternal_risk_core::{derive_features, AgeGroup, CategoricalEncoder, LabelEncoder, RawRecord};
use proptest::prelude::*;

fn clinical_record() -> impl Strategy<Value = RawRecord> {
    (
        0.0f64..119.9,
        60.0f64..200.0,
        0.0f64..130.0,
        3.0f64..20.0,
        95.0f64..104.0,
        40.0f64..180.0,
    )
        .prop_map(
            |(age, systolic_bp, diastolic_bp, blood_sugar, body_temp, heart_rate)| RawRecord {
                age,
                systolic_bp,
                diastolic_bp,
                blood_sugar,
                body_temp,
                heart_rate,
            },
        )
}

proptest! {
    #[test]
    fn derivation_is_deterministic(record in clinical_record()) {
        let a = derive_features(&record).unwrap();
        let b = derive_features(&record).unwrap();
        prop_assert_eq!(a, b);
        prop_assert_eq!(a.pulse_rate.to_bits(), record.heart_rate.to_bits());
    }

    #[test]
    fn derived_values_follow_their_definitions(record in clinical_record()) {
        let v = derive_features(&record).unwrap();
        prop_assert_eq!(v.bp_ratio, bp_ratio(record.systolic_bp, record.diastolic_bp));
        prop_assert_eq!(v.heart_rate_ratio, heart_rate_ratio(record.age, record.heart_rate));
        prop_assert_eq!(v.age_bpratio_interaction, record.age * v.bp_ratio);
        prop_assert_eq!(v.age_bs_interaction, record.age * record.blood_sugar);
        prop_assert!(v.fever <= 1 && v.hypertension <= 1);
        prop_assert!(!(v.prediabetes == 1 && v.diabetes == 1));
    }

    #[test]
    fn age_group_matches_bin_edges(age in 0.0f64..119.999) {
        let group = AgeGroup::from_age(age).unwrap();
        let idx = AGE_BINS.iter().position(|&edge| edge > age).unwrap() - 1;
        prop_assert_eq!(group, AgeGroup::ALL[idx]);
    }

    #[test]
    fn fitted_encoder_accepts_its_own_rows(records in prop::collection::vec(clinical_record(), 1..40)) {
        let vectors: Vec<_> = records.iter().map(|r| derive_features(r).unwrap()).collect();
        let encoder = CategoricalEncoder::fit(&vectors).unwrap();
        for v in &vectors {
            let row = encoder.transform(v).unwrap();
            prop_assert_eq!(row.len(), encoder.output_width());
            let hot: f64 = row[..encoder.categories.len()].iter().sum();
            prop_assert_eq!(hot, 1.0);
        }
    }

    #[test]
    fn label_round_trip(labels in prop::collection::vec("[a-z]{1,8} risk", 1..10)) {
        let encoder = LabelEncoder::fit(&labels).unwrap();
        for label in &labels {
            let idx = encoder.encode(label).unwrap();
            prop_assert_eq!(encoder.decode(idx).unwrap(), label.as_str());
        }
    }
}

#[test]
fn age_bucket_boundaries() {
    let group = |age: f64| AgeGroup::from_age(age).map(|g| g.label());
    assert_eq!(group(0.0).unwrap(), "0-19");
    assert_eq!(group(19.0).unwrap(), "20-29");
    assert_eq!(group(119.0).unwrap(), "70+");
    assert!(group(120.0).is_err());
}
