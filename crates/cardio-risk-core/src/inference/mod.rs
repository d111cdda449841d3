//! Inference adapter
//!
//! A [`RiskModel`] pairs a fitted feature [`Transform`] with a trained
//! binary [`Classifier`]. Both are loaded once from an artifact store,
//! checked against the record schema, and then shared read-only.

pub mod classifier;
pub mod scaler;

pub use classifier::{ClassifierArtifact, Estimator};
pub use scaler::{FittedScaler, ScalerKind};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::artifacts::ArtifactStore;
use crate::config::ArtifactConfig;
use crate::error::{ArtifactError, InferenceError};
use crate::record::{RiskRecord, FEATURE_COUNT};

/// Binary verdict of the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
    AtRisk,
    NotAtRisk,
}

impl RiskLabel {
    pub fn is_at_risk(&self) -> bool {
        matches!(self, RiskLabel::AtRisk)
    }

    /// Machine name used in metrics and JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::AtRisk => "at_risk",
            RiskLabel::NotAtRisk => "not_at_risk",
        }
    }

    /// At risk when the probability strictly exceeds the threshold
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        if probability > threshold {
            RiskLabel::AtRisk
        } else {
            RiskLabel::NotAtRisk
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLabel::AtRisk => write!(f, "Berisiko Terkena"),
            RiskLabel::NotAtRisk => write!(f, "Tidak Berisiko Terkena"),
        }
    }
}

/// Maps a record into the feature space the classifier was trained on
#[cfg_attr(test, mockall::automock)]
pub trait Transform: Send + Sync {
    fn transform(&self, record: &RiskRecord) -> Result<Vec<f64>, InferenceError>;
}

/// Binary classifier over a transformed feature vector
#[cfg_attr(test, mockall::automock)]
pub trait Classifier: Send + Sync {
    /// Probability of the positive (at risk) class
    fn predict_proba(&self, features: &[f64]) -> Result<f64, InferenceError>;

    /// Decision threshold; the record is at risk when the probability exceeds it
    fn threshold(&self) -> f64;
}

/// Outcome of running the model on one record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: RiskLabel,
    /// Positive-class probability
    pub probability: f64,
}

/// Provenance of the loaded artifacts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_file: String,
    pub scaler_file: String,
    pub model_kind: String,
    pub model_source: String,
    pub scaler_source: String,
    pub model_sha256: String,
    pub scaler_sha256: String,
}

/// Loaded scaler and classifier, immutable after construction
#[derive(Clone)]
pub struct RiskModel {
    transform: Arc<dyn Transform>,
    classifier: Arc<dyn Classifier>,
    info: ModelInfo,
}

impl fmt::Debug for RiskModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RiskModel").field("info", &self.info).finish()
    }
}

impl RiskModel {
    /// Assemble a model from already loaded parts
    pub fn new(transform: Arc<dyn Transform>, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            transform,
            classifier,
            info: ModelInfo::default(),
        }
    }

    pub fn with_info(mut self, info: ModelInfo) -> Self {
        self.info = info;
        self
    }

    /// Build a model from decoded artifacts after checking they fit together
    pub fn from_artifacts(
        scaler: FittedScaler,
        classifier: ClassifierArtifact,
    ) -> Result<Self, ArtifactError> {
        scaler.check("scaler")?;
        classifier.check("classifier", FEATURE_COUNT)?;
        Ok(Self::new(Arc::new(scaler), Arc::new(classifier)))
    }

    /// Fetch, decode and check both artifacts
    ///
    /// Any failure is returned immediately; a partially loaded model is
    /// never produced.
    pub async fn load(
        store: &dyn ArtifactStore,
        config: &ArtifactConfig,
    ) -> Result<Self, ArtifactError> {
        let scaler_blob = store.fetch(&config.scaler_ref()).await?;
        let scaler: FittedScaler = scaler_blob.decode()?;
        scaler.check(&scaler_blob.name)?;

        let model_blob = store.fetch(&config.model_ref()).await?;
        let classifier: ClassifierArtifact = model_blob.decode()?;
        classifier.check(&model_blob.name, FEATURE_COUNT)?;

        let info = ModelInfo {
            model_file: model_blob.name.clone(),
            scaler_file: scaler_blob.name.clone(),
            model_kind: classifier.estimator.kind().to_string(),
            model_source: model_blob.source.clone(),
            scaler_source: scaler_blob.source.clone(),
            model_sha256: model_blob.sha256(),
            scaler_sha256: scaler_blob.sha256(),
        };

        tracing::info!(
            model = %info.model_file,
            model_kind = %info.model_kind,
            model_source = %info.model_source,
            scaler = %info.scaler_file,
            scaler_kind = %scaler.kind,
            scaler_source = %info.scaler_source,
            "Model artifacts loaded"
        );

        Ok(Self::new(Arc::new(scaler), Arc::new(classifier)).with_info(info))
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    /// Scale the record and run the classifier
    pub fn predict(&self, record: &RiskRecord) -> Result<Prediction, InferenceError> {
        let features = self.transform.transform(record)?;
        let probability = self.classifier.predict_proba(&features)?;
        if !probability.is_finite() {
            return Err(InferenceError::NonFiniteOutput(format!(
                "probability {}",
                probability
            )));
        }
        let label = RiskLabel::from_probability(probability, self.classifier.threshold());
        Ok(Prediction { label, probability })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RiskRecordInput;
    use mockall::predicate::always;

    fn record() -> RiskRecord {
        RiskRecordInput {
            gender: Some(1.0),
            age_years: Some(58.0),
            bmi: Some(29.0),
            pulse_pressure: Some(50.0),
            mean_arterial_pressure: Some(105.0),
            systolic_diastolic_ratio: Some(1.6),
            cholesterol: Some(2.0),
            glucose: Some(1.0),
            smoker: Some(0.0),
            alcohol: Some(0.0),
            physically_active: Some(1.0),
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn test_label_display() {
        assert_eq!(RiskLabel::AtRisk.to_string(), "Berisiko Terkena");
        assert_eq!(RiskLabel::NotAtRisk.to_string(), "Tidak Berisiko Terkena");
        assert_eq!(serde_json::to_string(&RiskLabel::AtRisk).unwrap(), "\"at_risk\"");
    }

    #[test]
    fn test_predict_passes_transformed_features_to_classifier() {
        let mut transform = MockTransform::new();
        transform
            .expect_transform()
            .with(always())
            .times(1)
            .returning(|r| Ok(r.to_features().iter().map(|x| x / 10.0).collect()));

        let mut classifier = MockClassifier::new();
        classifier
            .expect_predict_proba()
            .withf(|x: &[f64]| x.len() == FEATURE_COUNT && x[3] == 5.0)
            .times(1)
            .returning(|_| Ok(0.8));
        classifier.expect_threshold().return_const(0.5);

        let model = RiskModel::new(Arc::new(transform), Arc::new(classifier));
        let prediction = model.predict(&record()).unwrap();
        assert_eq!(prediction.label, RiskLabel::AtRisk);
        assert_eq!(prediction.probability, 0.8);
    }

    #[test]
    fn test_label_follows_probability_and_threshold() {
        let mut transform = MockTransform::new();
        transform.expect_transform().returning(|r| Ok(r.to_features().to_vec()));
        let mut classifier = MockClassifier::new();
        classifier.expect_predict_proba().times(1).returning(|_| Ok(0.5));
        classifier.expect_threshold().return_const(0.5);

        let model = RiskModel::new(Arc::new(transform), Arc::new(classifier));
        let prediction = model.predict(&record()).unwrap();
        assert_eq!(prediction.label, RiskLabel::NotAtRisk);

        assert_eq!(RiskLabel::from_probability(0.500001, 0.5), RiskLabel::AtRisk);
        assert_eq!(RiskLabel::from_probability(0.3, 0.2), RiskLabel::AtRisk);
    }

    #[test]
    fn test_non_finite_probability_is_an_error() {
        let mut transform = MockTransform::new();
        transform.expect_transform().returning(|r| Ok(r.to_features().to_vec()));
        let mut classifier = MockClassifier::new();
        classifier.expect_predict_proba().returning(|_| Ok(f64::NAN));

        let model = RiskModel::new(Arc::new(transform), Arc::new(classifier));
        let err = model.predict(&record()).unwrap_err();
        assert!(matches!(err, InferenceError::NonFiniteOutput(_)));
    }

    #[test]
    fn test_from_artifacts_rejects_width_mismatch() {
        let classifier: ClassifierArtifact = serde_json::from_str(
            r#"{"kind": "logistic", "coefficients": [1.0, 2.0], "intercept": 0.0}"#,
        )
        .unwrap();
        let err = RiskModel::from_artifacts(FittedScaler::identity(), classifier).unwrap_err();
        assert!(matches!(err, ArtifactError::IncompatibleSchema { .. }));
    }
}
