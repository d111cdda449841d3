//! Explanation engine
//!
//! Evaluates an ordered list of rules against a [`RiskRecord`] and collects
//! the explanations that fire. The engine never looks at the model's label.

pub mod rules;

use rules::threshold::ThresholdRule;
use rules::tiered::{CholesterolRule, ObesityRule};
use rules::{Explanation, Rule, RuleCategory};
use std::sync::Arc;

use crate::record::RiskRecord;

/// The explanation rule engine
#[derive(Clone)]
pub struct ExplanationEngine {
    /// Rules in evaluation order
    rules: Vec<Arc<dyn Rule>>,
}

impl Default for ExplanationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ExplanationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplanationEngine")
            .field("rules", &self.rules.iter().map(|r| r.id()).collect::<Vec<_>>())
            .finish()
    }
}

impl ExplanationEngine {
    /// Create an engine with the standard rule set
    pub fn new() -> Self {
        let mut engine = Self::empty();
        engine.register_default_rules();
        engine
    }

    /// Create an engine with no rules
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    fn register_default_rules(&mut self) {
        // Hemodynamic
        self.register(Arc::new(ThresholdRule::pulse_pressure()));
        self.register(Arc::new(ThresholdRule::mean_arterial_pressure()));
        self.register(Arc::new(ThresholdRule::pressure_ratio()));

        // Laboratory
        self.register(Arc::new(CholesterolRule));
        self.register(Arc::new(ThresholdRule::glucose()));

        // Lifestyle
        self.register(Arc::new(ThresholdRule::smoking()));
        self.register(Arc::new(ThresholdRule::alcohol()));
        self.register(Arc::new(ThresholdRule::inactivity()));

        self.register(Arc::new(ObesityRule));
    }

    /// Append a rule; it is evaluated after every rule already registered
    pub fn register(&mut self, rule: Arc<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    pub fn rules_by_category(&self, category: RuleCategory) -> Vec<Arc<dyn Rule>> {
        self.rules
            .iter()
            .filter(|r| r.category() == category)
            .cloned()
            .collect()
    }

    /// Evaluate every rule in order and collect the explanations that fire
    ///
    /// Deterministic: the same record always yields the same sequence.
    pub fn explain(&self, record: &RiskRecord) -> Vec<Explanation> {
        let explanations: Vec<Explanation> =
            self.rules.iter().filter_map(|rule| rule.evaluate(record)).collect();
        tracing::debug!(
            rules_evaluated = self.rules.len(),
            explanations = explanations.len(),
            "explanation rules evaluated"
        );
        explanations
    }
}
