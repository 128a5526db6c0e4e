use maternal_risk_core::artifacts::{artifact_file, MANIFEST_FILE, MODEL_ARTIFACT, SCALER_ARTIFACT};
use maternal_risk_core::classifier::{
    DecisionTree, ExtraTreesModel, GradientBoostingModel, LogisticModel, MarginModel, Node,
};
use maternal_risk_core::{
    ArtifactSet, CategoricalEncoder, FeatureScaler, LabelEncoder, Manifest, PredictionService,
    RawRecord, RiskClassifier, RiskCoreError,
};
use std::fs;
use tempfile::TempDir;

fn artifact_set(run_id: &str, threshold: f64) -> ArtifactSet {
    let encoder = CategoricalEncoder {
        categories: vec!["20-29".into(), "30-39".into()],
    };
    let width = encoder.output_width();
    let leaf = |v: f64| DecisionTree::new(vec![Node::leaf(vec![v])]);

    ArtifactSet {
        run_id: run_id.to_string(),
        scaler: FeatureScaler {
            means: vec![0.5; width],
            std_devs: vec![2.0; width],
            constant_columns: vec![],
        },
        classifier: RiskClassifier {
            n_classes: 3,
            feature_count: width,
            extra_trees: ExtraTreesModel {
                n_classes: 3,
                trees: vec![DecisionTree::new(vec![
                    Node::internal(7, threshold, 1, 2),
                    Node::leaf(vec![0.6, 0.3, 0.1]),
                    Node::leaf(vec![0.1, 0.2, 0.7]),
                ])],
            },
            boosting: GradientBoostingModel {
                n_classes: 3,
                learning_rate: 0.1,
                init_scores: vec![-1.0986122886681098; 3],
                rounds: vec![vec![leaf(0.1), leaf(0.0), leaf(-0.1)]],
            },
            margin: MarginModel {
                weights: vec![vec![0.01; width]; 3],
                biases: vec![0.0, 0.1, 0.2],
            },
            meta: LogisticModel {
                coefficients: vec![vec![0.3; 9], vec![0.1; 9], vec![-0.2; 9]],
                intercepts: vec![0.0; 3],
            },
        },
        encoder,
        label_encoder: LabelEncoder {
            classes: vec!["high risk".into(), "low risk".into(), "mid risk".into()],
        },
    }
}

fn sample_record() -> RawRecord {
    RawRecord {
        age: 25.0,
        systolic_bp: 120.0,
        diastolic_bp: 80.0,
        blood_sugar: 6.0,
        body_temp: 98.0,
        heart_rate: 70.0,
    }
}

#[test]
fn save_load_round_trip_preserves_predictions() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("artifacts");
    let original = artifact_set("run-a", 1.3);

    let manifest = original.save(&target, &[]).unwrap();
    assert_eq!(manifest.run_id, "run-a");
    assert_eq!(manifest.labels.len(), 3);
    assert_eq!(manifest.artifacts.len(), 4);

    let loaded = ArtifactSet::load(&target).unwrap();
    assert_eq!(loaded, original);

    let before = PredictionService::from_artifacts(original).unwrap();
    let after = PredictionService::load(&target).unwrap();
    let record = sample_record();
    assert_eq!(before.predict(&record).unwrap(), after.predict(&record).unwrap());
    assert_eq!(after.run_id(), "run-a");
}

#[test]
fn saving_twice_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    artifact_set("run-a", 1.3).save(&first, &[]).unwrap();
    artifact_set("run-a", 1.3).save(&second, &[]).unwrap();

    for name in ["encoder", "label_encoder", "scaler", "model"] {
        let file = artifact_file(name);
        assert_eq!(
            fs::read(first.join(&file)).unwrap(),
            fs::read(second.join(&file)).unwrap(),
            "{file} differs"
        );
    }
}

#[test]
fn overwrite_replaces_previous_run() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("artifacts");
    artifact_set("run-a", 1.3).save(&target, &[]).unwrap();
    artifact_set("run-b", 0.4)
        .save(&target, &[("evaluation.json", "{}".to_string())])
        .unwrap();

    let loaded = ArtifactSet::load(&target).unwrap();
    assert_eq!(loaded.run_id, "run-b");
    assert!(target.join("evaluation.json").exists());
    assert!(!dir.path().join(".artifacts.staging").exists());
    assert!(!dir.path().join(".artifacts.previous").exists());
}

#[test]
fn mixing_runs_is_a_version_mismatch() {
    let dir = TempDir::new().unwrap();
    let run_a = dir.path().join("a");
    let run_b = dir.path().join("b");
    artifact_set("run-a", 1.3).save(&run_a, &[]).unwrap();
    artifact_set("run-b", 0.4).save(&run_b, &[]).unwrap();

    let model = artifact_file(MODEL_ARTIFACT);
    fs::copy(run_b.join(&model), run_a.join(&model)).unwrap();

    assert!(matches!(
        ArtifactSet::load(&run_a),
        Err(RiskCoreError::ArtifactVersionMismatch(_))
    ));
}

#[test]
fn tampered_artifact_fails_hash_check() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("artifacts");
    artifact_set("run-a", 1.3).save(&target, &[]).unwrap();

    let path = target.join(artifact_file(SCALER_ARTIFACT));
    let tampered = fs::read_to_string(&path).unwrap().replace("2.0", "3.0");
    fs::write(&path, tampered).unwrap();

    assert!(matches!(
        ArtifactSet::load(&target),
        Err(RiskCoreError::ArtifactVersionMismatch(_))
    ));
}

#[test]
fn missing_or_corrupt_files_fail_to_load() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("artifacts");
    assert!(matches!(
        ArtifactSet::load(&target),
        Err(RiskCoreError::ArtifactLoad { .. })
    ));

    artifact_set("run-a", 1.3).save(&target, &[]).unwrap();
    fs::write(target.join(artifact_file(MODEL_ARTIFACT)), "not json").unwrap();
    assert!(matches!(
        ArtifactSet::load(&target),
        Err(RiskCoreError::ArtifactLoad { .. })
    ));
}

#[test]
fn manifest_layout_must_match_encoder() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("artifacts");
    artifact_set("run-a", 1.3).save(&target, &[]).unwrap();

    let path = target.join(MANIFEST_FILE);
    let mut manifest: Manifest = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    manifest.feature_names.reverse();
    fs::write(&path, serde_json::to_vec(&manifest).unwrap()).unwrap();

    assert!(matches!(
        ArtifactSet::load(&target),
        Err(RiskCoreError::ArtifactVersionMismatch(_))
    ));
}

#[test]
fn inconsistent_set_is_never_written() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("artifacts");
    let mut broken = artifact_set("run-a", 1.3);
    broken.scaler.means.pop();
    broken.scaler.std_devs.pop();

    assert!(broken.save(&target, &[]).is_err());
    assert!(!target.exists());
}
