//! Cardiovascular Risk Core
//!
//! Validated risk records, a rule-based explanation engine, and inference
//! against a pre-trained stacking classifier.
//!
//! ## Architecture
//!
//! 1. **Record** (`record`): the eleven risk factors, validated field by field.
//! 2. **Engine** (`engine/`): ordered threshold rules producing explanations.
//! 3. **Inference** (`inference/`): fitted scaler plus exported classifier.
//! 4. **Artifacts** (`artifacts/`): local directory and model hub stores.
//! 5. **Assessment** (`assessment`): verdict and explanations for one record.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cardio_risk_core::{
//!     artifacts::store_from_config, config::AppConfig, Assessor, RiskModel, RiskRecordInput,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load(None)?;
//! let store = store_from_config(&config.artifacts)?;
//! let model = RiskModel::load(&store, &config.artifacts).await?;
//! let assessor = Assessor::new(model);
//!
//! let input: RiskRecordInput = serde_json::from_str(r#"{
//!     "gender": 1, "age_years": 55, "bmi": 31.5, "pulse_pressure": 50,
//!     "mean_arterial_pressure": 103.3, "systolic_diastolic_ratio": 1.6,
//!     "cholesterol": 2, "glucose": 1, "smoker": 0, "alcohol": 0,
//!     "physically_active": 1
//! }"#)?;
//! let assessment = assessor.assess_input(&input)?;
//! println!("Prediksi: {}", assessment.label);
//! # Ok(())
//! # }
//! ```

pub mod artifacts;
pub mod assessment;
pub mod config;
pub mod engine;
pub mod error;
pub mod inference;
pub mod record;

pub use assessment::{Assessment, Assessor};
pub use engine::rules::{Explanation, ExplanationCode};
pub use engine::ExplanationEngine;
pub use error::{ArtifactError, FieldViolation, InferenceError, RecordError, Result, RiskError, ViolationCode};
pub use inference::{Prediction, RiskLabel, RiskModel};
pub use record::{Field, Gender, Level, RiskRecord, RiskRecordInput, FEATURE_COUNT, FEATURE_NAMES};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
