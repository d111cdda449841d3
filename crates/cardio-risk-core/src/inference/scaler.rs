//! Pre-fitted feature scaler
//!
//! Every supported scaler reduces to per-feature `(x - center) / scale`:
//!
//! | kind     | center | scale          |
//! |----------|--------|----------------|
//! | standard | mean   | std deviation  |
//! | min_max  | min    | max - min      |
//! | robust   | median | IQR            |
//! | max_abs  | 0      | max \|x\|      |

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Transform;
use crate::error::{ArtifactError, InferenceError};
use crate::record::{RiskRecord, FEATURE_COUNT, FEATURE_NAMES};

/// Type of fitted scaler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalerKind {
    Standard,
    MinMax,
    Robust,
    MaxAbs,
}

impl fmt::Display for ScalerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalerKind::Standard => write!(f, "standard"),
            ScalerKind::MinMax => write!(f, "min_max"),
            ScalerKind::Robust => write!(f, "robust"),
            ScalerKind::MaxAbs => write!(f, "max_abs"),
        }
    }
}

/// Scaler parameters exported from a trained pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedScaler {
    pub kind: ScalerKind,
    /// Column names in the order the parameters apply
    pub feature_names: Vec<String>,
    pub center: Vec<f64>,
    pub scale: Vec<f64>,
}

impl FittedScaler {
    /// A standard scaler that leaves features unchanged
    pub fn identity() -> Self {
        Self {
            kind: ScalerKind::Standard,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            center: vec![0.0; FEATURE_COUNT],
            scale: vec![1.0; FEATURE_COUNT],
        }
    }

    /// Check the parameters against the record schema
    pub fn check(&self, name: &str) -> Result<(), ArtifactError> {
        if self.feature_names != FEATURE_NAMES {
            return Err(ArtifactError::incompatible(
                name,
                format!(
                    "feature names {:?} do not match expected {:?}",
                    self.feature_names, FEATURE_NAMES
                ),
            ));
        }
        for (what, values) in [("center", &self.center), ("scale", &self.scale)] {
            if values.len() != FEATURE_COUNT {
                return Err(ArtifactError::incompatible(
                    name,
                    format!("{} has {} values, expected {}", what, values.len(), FEATURE_COUNT),
                ));
            }
            if let Some(i) = values.iter().position(|v| !v.is_finite()) {
                return Err(ArtifactError::corrupt(
                    name,
                    format!("{} for '{}' is not finite", what, FEATURE_NAMES[i]),
                ));
            }
        }
        if let Some(i) = self.scale.iter().position(|s| *s == 0.0) {
            return Err(ArtifactError::corrupt(
                name,
                format!("scale for '{}' is zero", FEATURE_NAMES[i]),
            ));
        }
        if self.kind == ScalerKind::MaxAbs {
            if let Some(i) = self.center.iter().position(|c| *c != 0.0) {
                return Err(ArtifactError::corrupt(
                    name,
                    format!("max_abs scaler has non-zero center for '{}'", FEATURE_NAMES[i]),
                ));
            }
        }
        Ok(())
    }

    /// Scale a raw feature vector
    pub fn transform_features(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError> {
        if features.len() != self.center.len() {
            return Err(InferenceError::FeatureCountMismatch {
                expected: self.center.len(),
                actual: features.len(),
            });
        }
        Ok(features
            .iter()
            .zip(self.center.iter().zip(&self.scale))
            .map(|(x, (c, s))| (x - c) / s)
            .collect())
    }
}

impl Transform for FittedScaler {
    fn transform(&self, record: &RiskRecord) -> Result<Vec<f64>, InferenceError> {
        self.transform_features(&record.to_features())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard() -> FittedScaler {
        FittedScaler {
            kind: ScalerKind::Standard,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            center: vec![0.5, 53.0, 27.5, 47.0, 96.0, 1.55, 1.4, 1.2, 0.1, 0.05, 0.8],
            scale: vec![0.5, 6.8, 5.2, 15.0, 12.0, 0.12, 0.7, 0.55, 0.3, 0.22, 0.4],
        }
    }

    #[test]
    fn test_yaml_artifact_parses_and_checks() {
        let yaml = r#"
kind: min_max
feature_names: [gender, age_years, bmi, tekanan_denyut_nadi, tekanan_arteri_ratarata,
                sys_dsys_ratio, cholesterol, gluc, smoke, alco, active]
center: [0, 29, 10, 0, 50, 0.5, 1, 1, 0, 0, 0]
scale: [1, 36, 50, 120, 110, 2.5, 2, 2, 1, 1, 1]
"#;
        let scaler: FittedScaler = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(scaler.kind, ScalerKind::MinMax);
        assert!(scaler.check("scaler.yaml").is_ok());

        let scaled = scaler
            .transform_features(&[1.0, 65.0, 35.0, 60.0, 105.0, 1.75, 3.0, 1.0, 1.0, 0.0, 1.0])
            .unwrap();
        assert_eq!(scaled[0], 1.0);
        assert_eq!(scaled[1], 1.0);
        assert_eq!(scaled[3], 0.5);
        assert_eq!(scaled[6], 1.0);
    }

    #[test]
    fn test_feature_order_must_match_schema() {
        let mut scaler = standard();
        scaler.feature_names.swap(0, 1);
        let err = scaler.check("scaler.json").unwrap_err();
        assert!(matches!(err, ArtifactError::IncompatibleSchema { .. }));

        let mut scaler = standard();
        scaler.center.pop();
        assert!(matches!(
            scaler.check("scaler.json").unwrap_err(),
            ArtifactError::IncompatibleSchema { .. }
        ));
    }

    #[test]
    fn test_degenerate_parameters_are_corrupt() {
        let mut scaler = standard();
        scaler.scale[4] = 0.0;
        assert!(matches!(scaler.check("s").unwrap_err(), ArtifactError::Corrupt { .. }));

        let mut scaler = standard();
        scaler.center[2] = f64::INFINITY;
        assert!(matches!(scaler.check("s").unwrap_err(), ArtifactError::Corrupt { .. }));

        let mut scaler = FittedScaler::identity();
        scaler.kind = ScalerKind::MaxAbs;
        scaler.center[0] = 1.0;
        assert!(matches!(scaler.check("s").unwrap_err(), ArtifactError::Corrupt { .. }));
    }

    #[test]
    fn test_wrong_width_is_rejected() {
        let err = standard().transform_features(&[1.0, 2.0]).unwrap_err();
        assert_eq!(err, InferenceError::FeatureCountMismatch { expected: 11, actual: 2 });
    }
}
