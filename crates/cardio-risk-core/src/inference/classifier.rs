//! Exported classifier artifacts
//!
//! A classifier artifact is a tagged document:
//!
//! ```yaml
//! kind: stacking
//! passthrough: false
//! threshold: 0.5
//! estimators:
//!   - kind: logistic
//!     coefficients: [...]
//!     intercept: -0.3
//!   - kind: decision_tree
//!     nodes:
//!       - { type: split, feature: 4, threshold: 0.7, left: 1, right: 2 }
//!       - { type: leaf, probability: 0.21 }
//!       - { type: leaf, probability: 0.78 }
//! final_estimator:
//!   kind: logistic
//!   coefficients: [2.1, 1.7]
//!   intercept: -1.9
//! ```

use serde::{Deserialize, Serialize};

use super::Classifier;
use crate::error::{ArtifactError, InferenceError};

fn default_threshold() -> f64 {
    0.5
}

/// Top-level classifier document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    #[serde(flatten)]
    pub estimator: Estimator,
    /// Positive-class probability above which a record is at risk
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl ClassifierArtifact {
    pub fn new(estimator: Estimator) -> Self {
        Self {
            estimator,
            threshold: default_threshold(),
        }
    }

    /// Check structure and input width
    pub fn check(&self, name: &str, width: usize) -> Result<(), ArtifactError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ArtifactError::corrupt(
                name,
                format!("threshold {} is outside [0, 1]", self.threshold),
            ));
        }
        self.estimator.check(name, width)
    }
}

impl Classifier for ClassifierArtifact {
    fn predict_proba(&self, features: &[f64]) -> Result<f64, InferenceError> {
        self.estimator.probability(features)
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }
}

/// A fitted binary estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    Logistic(LogisticModel),
    DecisionTree(DecisionTree),
    Stacking(StackingModel),
}

impl Estimator {
    pub fn kind(&self) -> &'static str {
        match self {
            Estimator::Logistic(_) => "logistic",
            Estimator::DecisionTree(_) => "decision_tree",
            Estimator::Stacking(_) => "stacking",
        }
    }

    /// Validate the estimator for inputs of `width` features
    pub fn check(&self, name: &str, width: usize) -> Result<(), ArtifactError> {
        match self {
            Estimator::Logistic(m) => m.check(name, width),
            Estimator::DecisionTree(t) => t.check(name, width),
            Estimator::Stacking(s) => s.check(name, width),
        }
    }

    /// Positive-class probability
    pub fn probability(&self, x: &[f64]) -> Result<f64, InferenceError> {
        let p = match self {
            Estimator::Logistic(m) => m.probability(x)?,
            Estimator::DecisionTree(t) => t.probability(x)?,
            Estimator::Stacking(s) => s.probability(x)?,
        };
        if p.is_finite() {
            Ok(p)
        } else {
            Err(InferenceError::NonFiniteOutput(format!(
                "{} estimator returned {}",
                self.kind(),
                p
            )))
        }
    }
}

/// Logistic regression: `sigmoid(w . x + b)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LogisticModel {
    fn check(&self, name: &str, width: usize) -> Result<(), ArtifactError> {
        if self.coefficients.len() != width {
            return Err(ArtifactError::incompatible(
                name,
                format!(
                    "logistic model has {} coefficients, expected {}",
                    self.coefficients.len(),
                    width
                ),
            ));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|w| !w.is_finite()) {
            return Err(ArtifactError::corrupt(name, "logistic model has non-finite weights"));
        }
        Ok(())
    }

    fn probability(&self, x: &[f64]) -> Result<f64, InferenceError> {
        expect_width(self.coefficients.len(), x)?;
        let logit = self
            .coefficients
            .iter()
            .zip(x)
            .map(|(w, v)| w * v)
            .sum::<f64>()
            + self.intercept;
        Ok(sigmoid(logit))
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn expect_width(expected: usize, x: &[f64]) -> Result<(), InferenceError> {
    if x.len() == expected {
        Ok(())
    } else {
        Err(InferenceError::FeatureCountMismatch {
            expected,
            actual: x.len(),
        })
    }
}

/// One node of a decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// `x[feature] <= threshold` goes to `left`, otherwise `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Positive-class probability at this leaf
    Leaf { probability: f64 },
}

/// Decision tree stored as a flat node list, root first
///
/// Children always come after their parent, which keeps traversal finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn check(&self, name: &str, width: usize) -> Result<(), ArtifactError> {
        if self.nodes.is_empty() {
            return Err(ArtifactError::corrupt(name, "decision tree has no nodes"));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= width {
                        return Err(ArtifactError::incompatible(
                            name,
                            format!("node {} splits on feature {} of {}", i, feature, width),
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(ArtifactError::corrupt(
                            name,
                            format!("node {} has a non-finite threshold", i),
                        ));
                    }
                    for child in [left, right] {
                        if child <= i || child >= self.nodes.len() {
                            return Err(ArtifactError::corrupt(
                                name,
                                format!("node {} has invalid child {}", i, child),
                            ));
                        }
                    }
                }
                TreeNode::Leaf { probability } => {
                    if !(0.0..=1.0).contains(&probability) {
                        return Err(ArtifactError::corrupt(
                            name,
                            format!("leaf {} probability {} is outside [0, 1]", i, probability),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn probability(&self, x: &[f64]) -> Result<f64, InferenceError> {
        let mut index = 0;
        // each step moves strictly forward, so at most nodes.len() steps
        for _ in 0..self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { probability }) => return Ok(*probability),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = x.get(*feature).ok_or(InferenceError::FeatureCountMismatch {
                        expected: feature + 1,
                        actual: x.len(),
                    })?;
                    index = if *value <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(InferenceError::Corrupt(format!(
                        "tree node {} does not exist",
                        index
                    )))
                }
            }
        }
        Err(InferenceError::Corrupt("tree traversal did not reach a leaf".to_string()))
    }
}

/// Stacking ensemble
///
/// Each base estimator's positive-class probability becomes one input of the
/// final estimator. With `passthrough`, the original features follow them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackingModel {
    pub estimators: Vec<Estimator>,
    pub final_estimator: Box<Estimator>,
    #[serde(default)]
    pub passthrough: bool,
}

impl StackingModel {
    fn meta_width(&self, width: usize) -> usize {
        self.estimators.len() + if self.passthrough { width } else { 0 }
    }

    fn check(&self, name: &str, width: usize) -> Result<(), ArtifactError> {
        if self.estimators.is_empty() {
            return Err(ArtifactError::corrupt(name, "stacking model has no base estimators"));
        }
        for estimator in &self.estimators {
            estimator.check(name, width)?;
        }
        self.final_estimator.check(name, self.meta_width(width))
    }

    fn probability(&self, x: &[f64]) -> Result<f64, InferenceError> {
        let mut meta = Vec::with_capacity(self.meta_width(x.len()));
        for estimator in &self.estimators {
            meta.push(estimator.probability(x)?);
        }
        if self.passthrough {
            meta.extend_from_slice(x);
        }
        self.final_estimator.probability(&meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::RiskLabel;

    fn label(artifact: &ClassifierArtifact, x: &[f64]) -> RiskLabel {
        RiskLabel::from_probability(artifact.predict_proba(x).unwrap(), artifact.threshold())
    }

    fn logistic(coefficients: Vec<f64>, intercept: f64) -> Estimator {
        Estimator::Logistic(LogisticModel {
            coefficients,
            intercept,
        })
    }

    fn stump(feature: usize, threshold: f64, low: f64, high: f64) -> Estimator {
        Estimator::DecisionTree(DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { probability: low },
                TreeNode::Leaf { probability: high },
            ],
        })
    }

    #[test]
    fn test_logistic_probability() {
        let model = logistic(vec![1.0, -1.0], 0.0);
        assert_eq!(model.probability(&[2.0, 2.0]).unwrap(), 0.5);
        assert!(model.probability(&[3.0, 0.0]).unwrap() > 0.95);
        assert!(matches!(
            model.probability(&[1.0]),
            Err(InferenceError::FeatureCountMismatch { .. })
        ));
    }

    #[test]
    fn test_tree_split_goes_left_on_equal() {
        let tree = stump(0, 1.0, 0.2, 0.9);
        assert_eq!(tree.probability(&[1.0]).unwrap(), 0.2);
        assert_eq!(tree.probability(&[1.01]).unwrap(), 0.9);
    }

    #[test]
    fn test_tree_structure_is_checked() {
        let cyclic = Estimator::DecisionTree(DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 0,
                    threshold: 0.0,
                    left: 0,
                    right: 1,
                },
                TreeNode::Leaf { probability: 0.5 },
            ],
        });
        assert!(matches!(cyclic.check("t", 1), Err(ArtifactError::Corrupt { .. })));

        assert!(matches!(
            stump(3, 0.0, 0.1, 0.9).check("t", 2),
            Err(ArtifactError::IncompatibleSchema { .. })
        ));
        assert!(matches!(
            stump(0, 0.0, 0.1, 1.5).check("t", 1),
            Err(ArtifactError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_stacking_feeds_base_probabilities_to_final() {
        let stack = Estimator::Stacking(StackingModel {
            estimators: vec![stump(0, 0.0, 0.0, 1.0), stump(1, 0.0, 0.0, 1.0)],
            final_estimator: Box::new(logistic(vec![4.0, 4.0], -6.0)),
            passthrough: false,
        });
        assert!(stack.check("m", 2).is_ok());
        // one vote: sigmoid(-2); two votes: sigmoid(2)
        assert!(stack.probability(&[1.0, -1.0]).unwrap() < 0.5);
        assert!(stack.probability(&[1.0, 1.0]).unwrap() > 0.5);
    }

    #[test]
    fn test_stacking_passthrough_widens_final_input() {
        let stack = StackingModel {
            estimators: vec![stump(0, 0.0, 0.0, 1.0)],
            final_estimator: Box::new(logistic(vec![1.0, 0.0, 0.0], 0.0)),
            passthrough: true,
        };
        assert!(stack.check("m", 2).is_ok());
        assert!(stack.check("m", 3).is_err());
    }

    #[test]
    fn test_artifact_json_with_default_threshold() {
        let json = r#"{
            "kind": "stacking",
            "estimators": [
                {"kind": "logistic", "coefficients": [0.5, 0.5], "intercept": 0.0},
                {"kind": "decision_tree", "nodes": [
                    {"type": "split", "feature": 1, "threshold": 2.0, "left": 1, "right": 2},
                    {"type": "leaf", "probability": 0.1},
                    {"type": "leaf", "probability": 0.8}
                ]}
            ],
            "final_estimator": {"kind": "logistic", "coefficients": [3.0, 3.0], "intercept": -3.0}
        }"#;
        let artifact: ClassifierArtifact = serde_json::from_str(json).unwrap();
        assert_eq!(artifact.threshold, 0.5);
        assert_eq!(artifact.estimator.kind(), "stacking");
        assert!(artifact.check("stacking_model.json", 2).is_ok());

        assert_eq!(label(&artifact, &[2.0, 3.0]), RiskLabel::AtRisk);
        assert_eq!(label(&artifact, &[-2.0, 0.0]), RiskLabel::NotAtRisk);
    }

    #[test]
    fn test_threshold_decides_label() {
        let mut artifact = ClassifierArtifact::new(logistic(vec![1.0], 0.0));
        assert_eq!(label(&artifact, &[0.0]), RiskLabel::NotAtRisk);
        artifact.threshold = 0.4;
        assert_eq!(label(&artifact, &[0.0]), RiskLabel::AtRisk);
        artifact.threshold = 1.5;
        assert!(artifact.check("m", 1).is_err());
    }
}
