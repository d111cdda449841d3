//! HTTP handlers for the risk service
//!
//! - `routes`: JSON API, health and metrics endpoints
//! - `form`: the HTML form and result page
//! - `middleware`: request ids, request logging and request metrics
//!
//! Every JSON response is wrapped in [`ApiResponse`].

pub mod form;
pub mod middleware;
pub mod routes;

pub use middleware::{metrics_middleware, request_logging_middleware, RequestId, REQUEST_ID_HEADER};
pub use routes::{
    assess_record, create_router, explain_record, export_metrics, health_check, show_form, submit_form,
    ApiError, HandlerState, RequestError,
};

use cardio_risk_core::Explanation;
use serde::{Deserialize, Serialize};

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the operation was successful
    pub success: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error information (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    /// Request metadata for tracing
    pub metadata: ResponseMetadata,
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn success(data: T, request_id: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            metadata: ResponseMetadata::new(request_id),
        }
    }

    /// Create an error response
    pub fn error(error: ErrorInfo, request_id: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error),
            metadata: ResponseMetadata::new(request_id),
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.metadata = self.metadata.with_duration(duration_ms);
        self
    }
}

/// Error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Response metadata for tracing and debugging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// Unique request identifier
    pub request_id: String,
    /// Timestamp of response generation (ISO 8601)
    pub timestamp: String,
    /// Service version
    pub version: String,
    /// Processing duration in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl ResponseMetadata {
    pub fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            duration_ms: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

/// Result of the explain endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainResult {
    /// Contributing factors in rule order
    pub explanations: Vec<Explanation>,
    /// Number of rules evaluated
    pub rules_evaluated: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall health status
    pub status: HealthStatus,
    /// Component-level health
    pub components: ComponentHealth,
    /// Seconds since the service started
    pub uptime_seconds: u64,
    /// Timestamp of health check
    pub timestamp: String,
    /// Service version
    pub version: String,
}

/// Health status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Component-level health information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Kind of the loaded classifier, empty for models assembled in code
    pub model_kind: String,
    /// Where the classifier was loaded from
    pub model_source: String,
    /// Number of registered explanation rules
    pub explanation_rules: usize,
    /// Whether assessments include explanations
    pub explanations_enabled: bool,
}
