//! Mutually exclusive tier rules
//!
//! Cholesterol and BMI are bucketed into tiers, and each tier maps to at
//! most one message. A record lands in exactly one bucket per group, so the
//! group can never fire twice.

use super::{Explanation, ExplanationCode, Rule, RuleCategory};
use crate::record::{Field, Level, RiskRecord};

/// Cholesterol tier that carries an explanation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CholesterolLevel {
    AboveNormal,
    WellAboveNormal,
}

impl CholesterolLevel {
    /// Bucket a laboratory level; normal cholesterol has no tier
    pub fn from_level(level: Level) -> Option<Self> {
        match level {
            Level::Normal => None,
            Level::AboveNormal => Some(CholesterolLevel::AboveNormal),
            Level::WellAboveNormal => Some(CholesterolLevel::WellAboveNormal),
        }
    }

    pub fn code(&self) -> ExplanationCode {
        match self {
            CholesterolLevel::AboveNormal => ExplanationCode::CholesterolAboveNormal,
            CholesterolLevel::WellAboveNormal => ExplanationCode::CholesterolWellAboveNormal,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            CholesterolLevel::AboveNormal => "Kolesterol di atas normal",
            CholesterolLevel::WellAboveNormal => "Kolesterol sangat di atas normal",
        }
    }
}

/// Obesity class derived from BMI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObesityClass {
    ClassI,
    ClassII,
    ClassIII,
}

/// Lower bounds (inclusive) of each obesity class, highest first
const OBESITY_BANDS: [(f64, ObesityClass); 3] = [
    (40.0, ObesityClass::ClassIII),
    (35.0, ObesityClass::ClassII),
    (30.0, ObesityClass::ClassI),
];

impl ObesityClass {
    /// Bucket a BMI value; anything under 30 has no class
    pub fn from_bmi(bmi: f64) -> Option<Self> {
        OBESITY_BANDS
            .iter()
            .find(|(lower, _)| bmi >= *lower)
            .map(|(_, class)| *class)
    }

    pub fn code(&self) -> ExplanationCode {
        match self {
            ObesityClass::ClassI => ExplanationCode::ObesityClassI,
            ObesityClass::ClassII => ExplanationCode::ObesityClassII,
            ObesityClass::ClassIII => ExplanationCode::ObesityClassIII,
        }
    }

    /// Message for this class with the BMI shown to one decimal place
    pub fn message(&self, bmi: f64) -> String {
        let detail = match self {
            ObesityClass::ClassI => "Obesitas Kelas I: Peningkatan risiko penyakit kardiovaskular.",
            ObesityClass::ClassII => {
                "Obesitas Kelas II: Risiko tinggi terkena hipertensi, diabetes, dan dislipidemia."
            }
            ObesityClass::ClassIII => "Obesitas Kelas III: Risiko penyakit kardiovaskular sangat tinggi.",
        };
        format!("BMI = {:.1}, {}", bmi, detail)
    }
}

/// Fires one of the two cholesterol messages
#[derive(Debug, Default, Clone, Copy)]
pub struct CholesterolRule;

impl Rule for CholesterolRule {
    fn id(&self) -> &str {
        "cholesterol"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Laboratory
    }

    fn field(&self) -> Field {
        Field::Cholesterol
    }

    fn evaluate(&self, record: &RiskRecord) -> Option<Explanation> {
        let tier = CholesterolLevel::from_level(record.cholesterol())?;
        Some(Explanation::new(tier.code(), Field::Cholesterol, tier.message()))
    }
}

/// Fires one of the three obesity messages
#[derive(Debug, Default, Clone, Copy)]
pub struct ObesityRule;

impl Rule for ObesityRule {
    fn id(&self) -> &str {
        "obesity"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::BodyComposition
    }

    fn field(&self) -> Field {
        Field::Bmi
    }

    fn evaluate(&self, record: &RiskRecord) -> Option<Explanation> {
        let bmi = record.bmi();
        let class = ObesityClass::from_bmi(bmi)?;
        Some(Explanation::new(class.code(), Field::Bmi, class.message(bmi)))
    }
}
