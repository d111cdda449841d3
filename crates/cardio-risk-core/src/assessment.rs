//! Risk assessment
//!
//! Joins the two independent halves of an assessment: the model verdict and
//! the rule-based explanations. Both read the same validated record; neither
//! depends on the other's output.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::engine::rules::Explanation;
use crate::engine::ExplanationEngine;
use crate::error::{InferenceError, Result};
use crate::inference::{RiskLabel, RiskModel};
use crate::record::{RiskRecord, RiskRecordInput};

/// Verdict plus contributing factors for one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub label: RiskLabel,
    /// Positive-class probability reported by the model
    pub probability: f64,
    /// Empty when explanations are disabled
    pub explanations: Vec<Explanation>,
    pub duration_us: u64,
}

impl Assessment {
    pub fn is_at_risk(&self) -> bool {
        self.label.is_at_risk()
    }

    /// Explanation texts in rule order
    pub fn reasons(&self) -> Vec<&str> {
        self.explanations.iter().map(|e| e.text.as_str()).collect()
    }
}

/// Runs assessments against a loaded model
#[derive(Debug, Clone)]
pub struct Assessor {
    model: RiskModel,
    engine: ExplanationEngine,
    explanations_enabled: bool,
}

impl Assessor {
    pub fn new(model: RiskModel) -> Self {
        Self {
            model,
            engine: ExplanationEngine::new(),
            explanations_enabled: true,
        }
    }

    /// Toggle the explanation list in assessments
    pub fn with_explanations(mut self, enabled: bool) -> Self {
        self.explanations_enabled = enabled;
        self
    }

    pub fn explanations_enabled(&self) -> bool {
        self.explanations_enabled
    }

    pub fn model(&self) -> &RiskModel {
        &self.model
    }

    pub fn engine(&self) -> &ExplanationEngine {
        &self.engine
    }

    /// Assess a validated record
    pub fn assess(&self, record: &RiskRecord) -> std::result::Result<Assessment, InferenceError> {
        let start = Instant::now();
        let prediction = self.model.predict(record)?;
        let explanations = if self.explanations_enabled {
            self.engine.explain(record)
        } else {
            Vec::new()
        };
        let duration_us = start.elapsed().as_micros() as u64;

        tracing::info!(
            label = prediction.label.as_str(),
            probability = prediction.probability,
            explanations = explanations.len(),
            duration_us = duration_us,
            "Assessment completed"
        );

        Ok(Assessment {
            label: prediction.label,
            probability: prediction.probability,
            explanations,
            duration_us,
        })
    }

    /// Validate raw input, then assess it
    pub fn assess_input(&self, input: &RiskRecordInput) -> Result<Assessment> {
        let record = input.validate()?;
        Ok(self.assess(&record)?)
    }

    /// Explanations only; does not run the model and ignores the toggle
    pub fn explain(&self, record: &RiskRecord) -> Vec<Explanation> {
        self.engine.explain(record)
    }
}
