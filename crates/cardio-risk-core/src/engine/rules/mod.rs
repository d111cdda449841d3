//! Rule framework for risk explanations
//!
//! Each rule inspects a [`RiskRecord`] and yields at most one
//! [`Explanation`]. Rules are pure: the same record always yields the same
//! result, and evaluating a rule never changes anything.

pub mod threshold;
pub mod tiered;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::record::{Field, RiskRecord};

/// Categories of explanation rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    /// Blood pressure derived measurements
    Hemodynamic,
    /// Laboratory levels (cholesterol, glucose)
    Laboratory,
    /// Smoking, alcohol, physical activity
    Lifestyle,
    /// Body mass index bands
    BodyComposition,
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleCategory::Hemodynamic => write!(f, "hemodynamic"),
            RuleCategory::Laboratory => write!(f, "laboratory"),
            RuleCategory::Lifestyle => write!(f, "lifestyle"),
            RuleCategory::BodyComposition => write!(f, "body_composition"),
        }
    }
}

/// Identifies which of the twelve explanations fired
///
/// Variants are declared in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExplanationCode {
    HighPulsePressure,
    HighMeanArterialPressure,
    AbnormalPressureRatio,
    CholesterolAboveNormal,
    CholesterolWellAboveNormal,
    HighGlucose,
    Smoking,
    AlcoholConsumption,
    PhysicalInactivity,
    ObesityClassI,
    #[serde(rename = "OBESITY_CLASS_II")]
    ObesityClassII,
    #[serde(rename = "OBESITY_CLASS_III")]
    ObesityClassIII,
}

impl ExplanationCode {
    /// All codes in output order
    pub const ALL: [ExplanationCode; 12] = [
        ExplanationCode::HighPulsePressure,
        ExplanationCode::HighMeanArterialPressure,
        ExplanationCode::AbnormalPressureRatio,
        ExplanationCode::CholesterolAboveNormal,
        ExplanationCode::CholesterolWellAboveNormal,
        ExplanationCode::HighGlucose,
        ExplanationCode::Smoking,
        ExplanationCode::AlcoholConsumption,
        ExplanationCode::PhysicalInactivity,
        ExplanationCode::ObesityClassI,
        ExplanationCode::ObesityClassII,
        ExplanationCode::ObesityClassIII,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExplanationCode::HighPulsePressure => "HIGH_PULSE_PRESSURE",
            ExplanationCode::HighMeanArterialPressure => "HIGH_MEAN_ARTERIAL_PRESSURE",
            ExplanationCode::AbnormalPressureRatio => "ABNORMAL_PRESSURE_RATIO",
            ExplanationCode::CholesterolAboveNormal => "CHOLESTEROL_ABOVE_NORMAL",
            ExplanationCode::CholesterolWellAboveNormal => "CHOLESTEROL_WELL_ABOVE_NORMAL",
            ExplanationCode::HighGlucose => "HIGH_GLUCOSE",
            ExplanationCode::Smoking => "SMOKING",
            ExplanationCode::AlcoholConsumption => "ALCOHOL_CONSUMPTION",
            ExplanationCode::PhysicalInactivity => "PHYSICAL_INACTIVITY",
            ExplanationCode::ObesityClassI => "OBESITY_CLASS_I",
            ExplanationCode::ObesityClassII => "OBESITY_CLASS_II",
            ExplanationCode::ObesityClassIII => "OBESITY_CLASS_III",
        }
    }
}

impl fmt::Display for ExplanationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One human-readable contributing factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    /// Which explanation fired
    pub code: ExplanationCode,
    /// Field the predicate looked at
    pub field: Field,
    /// Text shown to the user
    pub text: String,
}

impl Explanation {
    pub fn new(code: ExplanationCode, field: Field, text: impl Into<String>) -> Self {
        Self {
            code,
            field,
            text: text.into(),
        }
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Trait for explanation rules
///
/// A rule covers one predicate, or one group of mutually exclusive
/// predicates, and returns at most one explanation.
pub trait Rule: Send + Sync {
    /// Unique identifier for this rule
    fn id(&self) -> &str;

    /// Category this rule belongs to
    fn category(&self) -> RuleCategory;

    /// Field this rule reads
    fn field(&self) -> Field;

    /// Evaluate the rule against a record
    fn evaluate(&self, record: &RiskRecord) -> Option<Explanation>;
}
