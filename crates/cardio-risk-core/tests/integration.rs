//! Integration tests for the risk core
//!
//! Loads the exported fixture artifacts through the artifact stores and runs
//! full assessments:
//! - Local store and chain loading
//! - Fail-fast loading on missing, tampered or incompatible artifacts
//! - Deterministic predictions on the fixture model

use cardio_risk_core::artifacts::{
    sha256_hex, store_from_config, ArtifactChain, ArtifactStore, LocalArtifactStore,
};
use cardio_risk_core::config::ArtifactConfig;
use cardio_risk_core::{ArtifactError, Assessor, RiskLabel, RiskModel, RiskRecordInput};
use std::path::{Path, PathBuf};

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

fn local_config(dir: &Path) -> ArtifactConfig {
    ArtifactConfig {
        local_dir: Some(dir.to_path_buf()),
        repo_id: String::new(),
        ..ArtifactConfig::default()
    }
}

fn healthy() -> RiskRecordInput {
    RiskRecordInput {
        gender: Some(0.0),
        age_years: Some(45.0),
        bmi: Some(22.0),
        pulse_pressure: Some(40.0),
        mean_arterial_pressure: Some(80.0),
        systolic_diastolic_ratio: Some(1.3),
        cholesterol: Some(1.0),
        glucose: Some(1.0),
        smoker: Some(0.0),
        alcohol: Some(0.0),
        physically_active: Some(1.0),
    }
}

fn high_risk() -> RiskRecordInput {
    RiskRecordInput {
        gender: Some(1.0),
        age_years: Some(62.0),
        bmi: Some(33.0),
        pulse_pressure: Some(60.0),
        mean_arterial_pressure: Some(115.0),
        systolic_diastolic_ratio: Some(1.7),
        cholesterol: Some(3.0),
        glucose: Some(2.0),
        smoker: Some(0.0),
        alcohol: Some(0.0),
        physically_active: Some(0.0),
    }
}

async fn load_fixture_model() -> RiskModel {
    let config = local_config(&fixtures());
    let store = store_from_config(&config).unwrap();
    RiskModel::load(&store, &config).await.unwrap()
}

#[tokio::test]
async fn test_fixture_model_loads_from_local_directory() {
    let model = load_fixture_model().await;
    let info = model.info();
    assert_eq!(info.model_kind, "stacking");
    assert_eq!(info.model_source, "local");
    assert_eq!(info.scaler_file, "scaler.json");
    assert_eq!(info.model_sha256.len(), 64);
}

#[tokio::test]
async fn test_healthy_and_high_risk_records() {
    let assessor = Assessor::new(load_fixture_model().await);

    let low = assessor.assess_input(&healthy()).unwrap();
    assert_eq!(low.label, RiskLabel::NotAtRisk);
    assert!(low.probability < 0.5);
    assert!(low.explanations.is_empty());

    let high = assessor.assess_input(&high_risk()).unwrap();
    assert_eq!(high.label, RiskLabel::AtRisk);
    assert!(high.probability > 0.5);
    assert_eq!(
        high.reasons(),
        vec![
            "Denyut nadi tinggi",
            "Tekanan arteri rata-rata tinggi",
            "Rasio tekanan sistolik dan diastolik tidak normal",
            "Kolesterol sangat di atas normal",
            "Tingkat glukosa tinggi",
            "Kurang aktivitas fisik",
            "BMI = 33.0, Obesitas Kelas I: Peningkatan risiko penyakit kardiovaskular.",
        ]
    );
}

#[tokio::test]
async fn test_predictions_are_deterministic() {
    let model = load_fixture_model().await;
    let record = high_risk().validate().unwrap();
    let first = model.predict(&record).unwrap();
    for _ in 0..10 {
        assert_eq!(model.predict(&record).unwrap(), first);
    }

    let reloaded = load_fixture_model().await;
    assert_eq!(reloaded.predict(&record).unwrap(), first);
}

#[tokio::test]
async fn test_missing_artifact_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::copy(fixtures().join("scaler.json"), dir.path().join("scaler.json")).unwrap();

    let config = local_config(dir.path());
    let store = store_from_config(&config).unwrap();
    let err = RiskModel::load(&store, &config).await.unwrap_err();
    assert!(matches!(err, ArtifactError::NotFound(_)));
}

#[tokio::test]
async fn test_pinned_digest_protects_model() {
    let model_bytes = std::fs::read(fixtures().join("stacking_model.json")).unwrap();

    let mut config = local_config(&fixtures());
    config.model_sha256 = Some(sha256_hex(&model_bytes));
    let store = store_from_config(&config).unwrap();
    assert!(RiskModel::load(&store, &config).await.is_ok());

    config.model_sha256 = Some(sha256_hex(b"a different model"));
    let err = RiskModel::load(&store, &config).await.unwrap_err();
    assert!(matches!(err, ArtifactError::ChecksumMismatch { .. }));
}

#[tokio::test]
async fn test_incompatible_scaler_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::copy(
        fixtures().join("stacking_model.json"),
        dir.path().join("stacking_model.json"),
    )
    .unwrap();
    let scaler = r#"{
        "kind": "standard",
        "feature_names": ["age", "bmi"],
        "center": [0.0, 0.0],
        "scale": [1.0, 1.0]
    }"#;
    std::fs::write(dir.path().join("scaler.json"), scaler).unwrap();

    let config = local_config(dir.path());
    let store = store_from_config(&config).unwrap();
    let err = RiskModel::load(&store, &config).await.unwrap_err();
    assert!(matches!(err, ArtifactError::IncompatibleSchema { .. }));
}

#[tokio::test]
async fn test_yaml_artifacts_are_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let scaler: serde_json::Value =
        serde_json::from_slice(&std::fs::read(fixtures().join("scaler.json")).unwrap()).unwrap();
    let model: serde_json::Value =
        serde_json::from_slice(&std::fs::read(fixtures().join("stacking_model.json")).unwrap())
            .unwrap();
    std::fs::write(dir.path().join("scaler.yaml"), serde_yaml::to_string(&scaler).unwrap()).unwrap();
    std::fs::write(dir.path().join("model.yml"), serde_yaml::to_string(&model).unwrap()).unwrap();

    let config = ArtifactConfig {
        scaler_file: "scaler.yaml".into(),
        model_file: "model.yml".into(),
        ..local_config(dir.path())
    };
    let store = ArtifactChain::new().with_store(LocalArtifactStore::new(dir.path()));
    let yaml_model = RiskModel::load(&store, &config).await.unwrap();
    let json_model = load_fixture_model().await;

    let record = high_risk().validate().unwrap();
    assert_eq!(
        yaml_model.predict(&record).unwrap(),
        json_model.predict(&record).unwrap()
    );
}

#[tokio::test]
async fn test_pickle_artifacts_are_refused() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("scaler.pkl"), b"\x80\x04\x95").unwrap();
    let store = LocalArtifactStore::new(dir.path());
    let config = ArtifactConfig {
        scaler_file: "scaler.pkl".into(),
        ..local_config(dir.path())
    };
    let blob = store.fetch(&config.scaler_ref()).await.unwrap();
    assert_eq!(blob.source, "local");
    let err = RiskModel::load(&store, &config).await.unwrap_err();
    assert!(matches!(err, ArtifactError::IncompatibleSchema { .. }));
}
