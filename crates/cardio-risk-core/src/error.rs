//! Error types for cardiovascular risk assessment
//!
//! Input problems ([`RecordError`]) are user errors and are reported field
//! by field. Artifact problems ([`ArtifactError`]) are fatal for the session.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::record::Field;

/// Machine-readable reason a field was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationCode {
    Missing,
    Unparseable,
    NotFinite,
    Negative,
    NotInteger,
    OutOfDomain,
}

impl ViolationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationCode::Missing => "MISSING",
            ViolationCode::Unparseable => "UNPARSEABLE",
            ViolationCode::NotFinite => "NOT_FINITE",
            ViolationCode::Negative => "NEGATIVE",
            ViolationCode::NotInteger => "NOT_INTEGER",
            ViolationCode::OutOfDomain => "OUT_OF_DOMAIN",
        }
    }
}

impl fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: Field,
    pub code: ViolationCode,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: Field, code: ViolationCode, message: impl Into<String>) -> Self {
        Self {
            field,
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.field, self.message, self.code)
    }
}

/// Invalid risk record input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("Invalid input: {}", join_violations(.0))]
    Invalid(Vec<FieldViolation>),
}

impl RecordError {
    /// Violations in field order
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            RecordError::Invalid(v) => v,
        }
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors raised while fetching or decoding model artifacts
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// The store has no artifact under this name
    #[error("Artifact not found: {0}")]
    NotFound(String),

    /// Network failure talking to a remote store
    #[error("Connection error: {0}")]
    Connection(String),

    /// The remote store did not answer in time
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Downloaded bytes do not match the pinned digest
    #[error("Checksum mismatch for {name}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    /// The bytes could not be decoded into an artifact
    #[error("Corrupt artifact {name}: {reason}")]
    Corrupt { name: String, reason: String },

    /// The artifact decodes but does not fit the record schema
    #[error("Incompatible artifact {name}: {reason}")]
    IncompatibleSchema { name: String, reason: String },
}

impl ArtifactError {
    pub fn corrupt(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ArtifactError::Corrupt {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn incompatible(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ArtifactError::IncompatibleSchema {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while running a loaded model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("Expected {expected} features, got {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    #[error("Model produced a non-finite value: {0}")]
    NonFiniteOutput(String),

    #[error("Model structure is corrupt: {0}")]
    Corrupt(String),
}

/// Top-level error for the crate
#[derive(Error, Debug)]
pub enum RiskError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("Inference failed: {0}")]
    Inference(#[from] InferenceError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File error: {0}")]
    File(String),
}

impl RiskError {
    /// Check if this is a user-facing error (vs internal)
    pub fn is_user_error(&self) -> bool {
        matches!(self, RiskError::Record(_) | RiskError::Config(_) | RiskError::File(_))
    }
}

impl From<std::io::Error> for RiskError {
    fn from(err: std::io::Error) -> Self {
        RiskError::File(err.to_string())
    }
}

/// Result type alias for risk operations
pub type Result<T> = std::result::Result<T, RiskError>;
