//! Single-predicate threshold rules
//!
//! Each rule compares one field against one bound and fires a fixed message.
//! These rules are independent of each other and may all fire at once.

use super::{Explanation, ExplanationCode, Rule, RuleCategory};
use crate::record::{Field, RiskRecord};

/// Comparison applied to a field value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Condition {
    /// value > bound
    Above(f64),
    /// value == bound
    Equals(f64),
}

impl Condition {
    /// Check whether a value satisfies the condition
    pub fn matches(&self, value: f64) -> bool {
        match *self {
            Condition::Above(bound) => value > bound,
            Condition::Equals(bound) => value == bound,
        }
    }
}

/// Rule that fires a static message when one field meets a condition
#[derive(Debug, Clone)]
pub struct ThresholdRule {
    id: &'static str,
    code: ExplanationCode,
    category: RuleCategory,
    field: Field,
    condition: Condition,
    text: &'static str,
}

impl ThresholdRule {
    pub fn new(
        id: &'static str,
        code: ExplanationCode,
        category: RuleCategory,
        field: Field,
        condition: Condition,
        text: &'static str,
    ) -> Self {
        Self {
            id,
            code,
            category,
            field,
            condition,
            text,
        }
    }

    /// pulse_pressure > 40
    pub fn pulse_pressure() -> Self {
        Self::new(
            "pulse-pressure",
            ExplanationCode::HighPulsePressure,
            RuleCategory::Hemodynamic,
            Field::PulsePressure,
            Condition::Above(40.0),
            "Denyut nadi tinggi",
        )
    }

    /// mean_arterial_pressure > 100
    pub fn mean_arterial_pressure() -> Self {
        Self::new(
            "mean-arterial-pressure",
            ExplanationCode::HighMeanArterialPressure,
            RuleCategory::Hemodynamic,
            Field::MeanArterialPressure,
            Condition::Above(100.0),
            "Tekanan arteri rata-rata tinggi",
        )
    }

    /// systolic_diastolic_ratio > 1.5
    pub fn pressure_ratio() -> Self {
        Self::new(
            "pressure-ratio",
            ExplanationCode::AbnormalPressureRatio,
            RuleCategory::Hemodynamic,
            Field::SystolicDiastolicRatio,
            Condition::Above(1.5),
            "Rasio tekanan sistolik dan diastolik tidak normal",
        )
    }

    /// glucose > 1
    pub fn glucose() -> Self {
        Self::new(
            "glucose",
            ExplanationCode::HighGlucose,
            RuleCategory::Laboratory,
            Field::Glucose,
            Condition::Above(1.0),
            "Tingkat glukosa tinggi",
        )
    }

    /// smoker == 1
    pub fn smoking() -> Self {
        Self::new(
            "smoking",
            ExplanationCode::Smoking,
            RuleCategory::Lifestyle,
            Field::Smoker,
            Condition::Equals(1.0),
            "Kebiasaan merokok",
        )
    }

    /// alcohol == 1
    pub fn alcohol() -> Self {
        Self::new(
            "alcohol",
            ExplanationCode::AlcoholConsumption,
            RuleCategory::Lifestyle,
            Field::Alcohol,
            Condition::Equals(1.0),
            "Konsumsi alkohol",
        )
    }

    /// physically_active == 0
    pub fn inactivity() -> Self {
        Self::new(
            "physical-inactivity",
            ExplanationCode::PhysicalInactivity,
            RuleCategory::Lifestyle,
            Field::PhysicallyActive,
            Condition::Equals(0.0),
            "Kurang aktivitas fisik",
        )
    }
}

impl Rule for ThresholdRule {
    fn id(&self) -> &str {
        self.id
    }

    fn category(&self) -> RuleCategory {
        self.category
    }

    fn field(&self) -> Field {
        self.field
    }

    fn evaluate(&self, record: &RiskRecord) -> Option<Explanation> {
        self.condition
            .matches(record.value(self.field))
            .then(|| Explanation::new(self.code, self.field, self.text))
    }
}
