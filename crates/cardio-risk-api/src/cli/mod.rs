//! CLI module for the risk service
//!
//! Serves the HTTP interface, assesses single records from flags or files,
//! prints explanations without a model, and pre-fetches model artifacts.

pub mod commands;
pub mod output;

pub use commands::{RecordArgs, RiskCli, RiskCommands};
pub use output::{AssessmentOutput, ExplainOutput, FetchOutput, OutputFormat};

use cardio_risk_core::{ArtifactError, InferenceError, RecordError, RiskError};
use thiserror::Error;

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success; for `assess`, the record is not at risk
    Success = 0,
    /// The assessed record is at risk
    AtRisk = 1,
    /// Invalid input, arguments or configuration
    InvalidInput = 3,
    /// File not found or inaccessible
    FileError = 4,
    /// Model artifacts missing, corrupt or incompatible
    ArtifactError = 5,
    /// Internal error
    InternalError = 10,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    /// Exit code for an assessment verdict
    pub fn from_verdict(at_risk: bool) -> Self {
        if at_risk {
            ExitCode::AtRisk
        } else {
            ExitCode::Success
        }
    }
}

/// CLI errors
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Risk(#[from] RiskError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File error: {0}")]
    FileError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Server error: {0}")]
    ServerError(String),
}

impl From<RecordError> for CliError {
    fn from(err: RecordError) -> Self {
        CliError::Risk(RiskError::Record(err))
    }
}

impl From<ArtifactError> for CliError {
    fn from(err: ArtifactError) -> Self {
        CliError::Risk(RiskError::Artifact(err))
    }
}

impl From<InferenceError> for CliError {
    fn from(err: InferenceError) -> Self {
        CliError::Risk(RiskError::Inference(err))
    }
}

impl CliError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Risk(RiskError::Record(_)) | CliError::Risk(RiskError::Config(_)) => {
                ExitCode::InvalidInput
            }
            CliError::Risk(RiskError::File(_)) => ExitCode::FileError,
            CliError::Risk(RiskError::Artifact(_)) => ExitCode::ArtifactError,
            CliError::Risk(RiskError::Inference(_)) => ExitCode::InternalError,
            CliError::InvalidInput(_) => ExitCode::InvalidInput,
            CliError::FileError(_) => ExitCode::FileError,
            CliError::SerializationError(_) | CliError::ServerError(_) => ExitCode::InternalError,
        }
    }
}

/// Run a parsed command against a loaded configuration
pub async fn run(
    command: RiskCommands,
    config: cardio_risk_core::config::AppConfig,
) -> Result<ExitCode, CliError> {
    match command {
        RiskCommands::Serve {
            host,
            port,
            no_explanations,
        } => commands::execute_serve(config, host, port, no_explanations).await,
        RiskCommands::Assess {
            record,
            format,
            no_explanations,
        } => commands::execute_assess(config, record, format, no_explanations).await,
        RiskCommands::Explain { record, format } => commands::execute_explain(record, format),
        RiskCommands::Fetch { format } => commands::execute_fetch(config, format).await,
    }
}
