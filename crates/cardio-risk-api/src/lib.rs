//! HTTP service and command-line interface for cardiovascular risk assessment
//!
//! The model is loaded once at startup and shared read-only by every
//! request handler. If the artifacts cannot be loaded the service does not
//! start.
//!
//! ## Endpoints
//!
//! - `GET /` and `POST /` - HTML form and verdict page
//! - `POST /api/v1/assess` - verdict, probability and contributing factors
//! - `POST /api/v1/explain` - contributing factors only
//! - `GET /health` - health check
//! - `GET /metrics` - Prometheus metrics

pub mod cli;
pub mod handler;
pub mod telemetry;

pub use cli::{CliError, ExitCode, RiskCli, RiskCommands};
pub use handler::{create_router, ApiResponse, HandlerState};
pub use telemetry::{init_tracing, MetricsRegistry};

/// Run the CLI with the given arguments and return the exit code
///
/// # Example
///
/// ```rust,no_run
/// use clap::Parser;
/// use cardio_risk_api::{run_cli, RiskCli};
///
/// #[tokio::main]
/// async fn main() {
///     let cli = RiskCli::parse();
///     let exit_code = run_cli(cli).await;
///     std::process::exit(exit_code.into());
/// }
/// ```
pub async fn run_cli(cli: RiskCli) -> ExitCode {
    let config = match cli::commands::load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return e.exit_code();
        }
    };

    init_tracing(config.log_format, cli.verbose);

    match cli::run(cli.command, config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}
