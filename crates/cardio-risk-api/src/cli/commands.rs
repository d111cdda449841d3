//! CLI command definitions
//!
//! Clap-based commands for serving, assessing, explaining and fetching.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::net::TcpListener;

use cardio_risk_core::artifacts::{store_from_config, ArtifactStore};
use cardio_risk_core::config::{AppConfig, LogFormat, ServerConfig};
use cardio_risk_core::inference::{ClassifierArtifact, FittedScaler};
use cardio_risk_core::{Assessor, ExplanationEngine, RiskModel, RiskRecordInput};

use super::output::{ArtifactOutput, AssessmentOutput, ExplainOutput, FetchOutput, OutputFormat};
use super::{CliError, ExitCode};
use crate::handler::{create_router, HandlerState};
use crate::telemetry::MetricsRegistry;

/// Cardiovascular risk assessment
///
/// Predicts cardiovascular risk from eleven clinical factors and lists the
/// factors that contributed.
#[derive(Parser, Debug)]
#[command(name = "cardio-risk")]
#[command(about = "Cardiovascular risk assessment - verdict and contributing factors", long_about = None)]
#[command(version)]
pub struct RiskCli {
    /// Configuration file (JSON, YAML or TOML)
    #[arg(short, long, global = true, env = "CARDIO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Debug logging for the service crates
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log format (text or json)
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: RiskCommands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum RiskCommands {
    /// Load the model and start the HTTP service
    ///
    /// Fails without binding a port when the artifacts cannot be loaded.
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Show only the verdict, without contributing factors
        #[arg(long)]
        no_explanations: bool,
    },

    /// Assess one record
    ///
    /// Exits with 1 when the record is at risk and 0 otherwise.
    Assess {
        #[command(flatten)]
        record: RecordArgs,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Show only the verdict, without contributing factors
        #[arg(long)]
        no_explanations: bool,
    },

    /// List contributing factors for one record without running the model
    Explain {
        #[command(flatten)]
        record: RecordArgs,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Download and verify the model artifacts
    Fetch {
        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

/// Record fields as flags, optionally completed from a file
#[derive(Args, Debug, Clone, Default)]
pub struct RecordArgs {
    /// Read the record from a JSON, YAML or TOML file; flags take precedence
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// 0 = male, 1 = female
    #[arg(long)]
    pub gender: Option<f64>,

    /// Age in whole years
    #[arg(long)]
    pub age_years: Option<f64>,

    /// Body mass index
    #[arg(long)]
    pub bmi: Option<f64>,

    /// Pulse pressure (systolic minus diastolic)
    #[arg(long)]
    pub pulse_pressure: Option<f64>,

    /// Mean arterial pressure
    #[arg(long)]
    pub mean_arterial_pressure: Option<f64>,

    /// Systolic to diastolic ratio
    #[arg(long)]
    pub systolic_diastolic_ratio: Option<f64>,

    /// 1 = normal, 2 = above normal, 3 = well above normal
    #[arg(long)]
    pub cholesterol: Option<f64>,

    /// 1 = normal, 2 = above normal, 3 = well above normal
    #[arg(long)]
    pub glucose: Option<f64>,

    /// 0 or 1
    #[arg(long)]
    pub smoker: Option<f64>,

    /// 0 or 1
    #[arg(long)]
    pub alcohol: Option<f64>,

    /// 0 or 1
    #[arg(long)]
    pub physically_active: Option<f64>,
}

impl RecordArgs {
    /// Record values given as flags
    pub fn flags(&self) -> RiskRecordInput {
        RiskRecordInput {
            gender: self.gender,
            age_years: self.age_years,
            bmi: self.bmi,
            pulse_pressure: self.pulse_pressure,
            mean_arterial_pressure: self.mean_arterial_pressure,
            systolic_diastolic_ratio: self.systolic_diastolic_ratio,
            cholesterol: self.cholesterol,
            glucose: self.glucose,
            smoker: self.smoker,
            alcohol: self.alcohol,
            physically_active: self.physically_active,
        }
    }

    /// Flags, with gaps filled from `--input` when given
    pub fn resolve(&self) -> Result<RiskRecordInput, CliError> {
        let flags = self.flags();
        match &self.input {
            Some(path) => Ok(flags.merge_missing(&read_record_file(path)?)),
            None => Ok(flags),
        }
    }
}

/// Read an unvalidated record from a file, choosing the format by extension
pub fn read_record_file(path: &Path) -> Result<RiskRecordInput, CliError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        CliError::FileError(format!(
            "Failed to read input file '{}': {}",
            path.display(),
            e
        ))
    })?;
    parse_record(path, &content)
}

fn parse_record(path: &Path, content: &str) -> Result<RiskRecordInput, CliError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "json" => serde_json::from_str(content)
            .map_err(|e| CliError::InvalidInput(format!("Invalid JSON: {}", e))),
        "yaml" | "yml" => serde_yaml::from_str(content)
            .map_err(|e| CliError::InvalidInput(format!("Invalid YAML: {}", e))),
        "toml" => toml::from_str(content)
            .map_err(|e| CliError::InvalidInput(format!("Invalid TOML: {}", e))),
        _ => Err(CliError::InvalidInput(format!(
            "Unsupported file format: {}. Supported formats: json, yaml, yml, toml",
            extension
        ))),
    }
}

/// Apply global CLI flags on top of the layered configuration
pub fn load_config(cli: &RiskCli) -> Result<AppConfig, CliError> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    Ok(config)
}

async fn load_assessor(config: &AppConfig, explanations_enabled: bool) -> Result<Assessor, CliError> {
    let store = store_from_config(&config.artifacts)?;
    let model = RiskModel::load(&store, &config.artifacts).await?;
    Ok(Assessor::new(model).with_explanations(explanations_enabled))
}

/// Execute the serve command
pub async fn execute_serve(
    config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
    no_explanations: bool,
) -> Result<ExitCode, CliError> {
    let mut server = config.server.clone();
    if let Some(host) = host {
        server.host = host;
    }
    if let Some(port) = port {
        server.port = port;
    }

    let assessor = load_assessor(&config, config.explanations_enabled && !no_explanations).await?;
    let metrics = MetricsRegistry::new().map_err(|e| CliError::ServerError(e.to_string()))?;
    let router = create_router(HandlerState::new(assessor, metrics), &server);

    let listener = bind_listener(&server).await?;
    let addr = listener
        .local_addr()
        .map_err(|e| CliError::ServerError(e.to_string()))?;

    tracing::info!(
        addr = %addr,
        version = env!("CARGO_PKG_VERSION"),
        "Starting cardiovascular risk service"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CliError::ServerError(e.to_string()))?;

    tracing::info!("Service stopped");
    Ok(ExitCode::Success)
}

/// Bind the listen socket; the host may be a name such as `localhost`
async fn bind_listener(server: &ServerConfig) -> Result<TcpListener, CliError> {
    TcpListener::bind((server.host.as_str(), server.port))
        .await
        .map_err(|e| {
            CliError::ServerError(format!(
                "Failed to bind {}:{}: {}",
                server.host, server.port, e
            ))
        })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

/// Execute the assess command
///
/// Input is validated before the artifacts are loaded.
pub async fn execute_assess(
    config: AppConfig,
    record: RecordArgs,
    format: OutputFormat,
    no_explanations: bool,
) -> Result<ExitCode, CliError> {
    let record = record.resolve()?.validate()?;

    let explanations_enabled = config.explanations_enabled && !no_explanations;
    let assessor = load_assessor(&config, explanations_enabled).await?;
    let assessment = assessor.assess(&record)?;

    AssessmentOutput::from_assessment(&assessment, explanations_enabled).render(format)?;

    Ok(ExitCode::from_verdict(assessment.is_at_risk()))
}

/// Execute the explain command
pub fn execute_explain(record: RecordArgs, format: OutputFormat) -> Result<ExitCode, CliError> {
    let record = record.resolve()?.validate()?;
    let explanations = ExplanationEngine::new().explain(&record);
    ExplainOutput::from_explanations(&explanations).render(format)?;
    Ok(ExitCode::Success)
}

/// Execute the fetch command
///
/// Fetching through the configured stores fills the download cache; the
/// artifacts are then decoded and checked exactly as `serve` would.
pub async fn execute_fetch(config: AppConfig, format: OutputFormat) -> Result<ExitCode, CliError> {
    let store = store_from_config(&config.artifacts)?;
    tracing::info!(stores = ?store.store_names(), "Fetching model artifacts");

    let scaler_blob = store.fetch(&config.artifacts.scaler_ref()).await?;
    let model_blob = store.fetch(&config.artifacts.model_ref()).await?;

    let scaler: FittedScaler = scaler_blob.decode()?;
    let classifier: ClassifierArtifact = model_blob.decode()?;
    let model_kind = classifier.estimator.kind().to_string();
    RiskModel::from_artifacts(scaler, classifier)?;

    let artifacts = [&scaler_blob, &model_blob]
        .into_iter()
        .map(|blob| ArtifactOutput {
            name: blob.name.clone(),
            source: blob.source.clone(),
            path: blob.path.as_ref().map(|p| p.display().to_string()),
            sha256: blob.sha256(),
            size_bytes: blob.bytes.len(),
        })
        .collect();

    FetchOutput {
        model_kind,
        artifacts,
    }
    .render(format)?;

    Ok(ExitCode::Success)
}
