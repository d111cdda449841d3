//! Telemetry for the risk service
//!
//! - `metrics` - Prometheus counters and histograms for assessments
//! - [`init_tracing`] - structured log output, text or JSON

pub mod metrics;

pub use metrics::{AssessmentMetrics, MetricsRegistry};

use cardio_risk_core::config::LogFormat;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Telemetry errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Metrics error: {0}")]
    MetricsError(#[from] prometheus::Error),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "cardio_risk=info,cardio_risk_core=info,cardio_risk_api=info,tower_http=info";

/// Build the log filter from `RUST_LOG`, falling back to the default
///
/// `verbose` raises the crate targets to debug.
pub fn log_filter(verbose: bool) -> EnvFilter {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    if verbose {
        filter
            .add_directive("cardio_risk_core=debug".parse().unwrap_or_default())
            .add_directive("cardio_risk_api=debug".parse().unwrap_or_default())
    } else {
        filter
    }
}

/// Install the global tracing subscriber
///
/// Logs go to stderr so command output on stdout stays machine-readable.
/// Calling this twice is harmless; the second call is ignored.
pub fn init_tracing(format: LogFormat, verbose: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose))
        .with_target(false)
        .with_writer(std::io::stderr);

    let result = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    if result.is_ok() {
        tracing::debug!(version = env!("CARGO_PKG_VERSION"), format = ?format, "Tracing initialized");
    }
}
