//! Route definitions for the risk service
//!
//! - GET  /                 - HTML form
//! - POST /                 - form submission, renders the verdict
//! - POST /api/v1/assess    - JSON assessment (label, probability, explanations)
//! - POST /api/v1/explain   - JSON explanations only, the model is not run
//! - GET  /health           - health check
//! - GET  /metrics          - Prometheus metrics
//!
//! Input is always validated before the model or the explanation engine
//! sees it. Rejected fields are reported together.

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Extension, Form, Json, Router,
};
use cardio_risk_core::config::ServerConfig;
use cardio_risk_core::{
    Assessment, Assessor, Explanation, FieldViolation, InferenceError, RecordError, RiskRecord,
    RiskRecordInput,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::form::FormPage;
use super::middleware::{metrics_middleware, request_logging_middleware, RequestId};
use super::{
    ApiResponse, ComponentHealth, ErrorInfo, ExplainResult, HealthResponse, HealthStatus,
};
use crate::telemetry::MetricsRegistry;

/// Handler state shared across all routes
#[derive(Clone)]
pub struct HandlerState {
    /// Loaded model and explanation engine
    pub assessor: Arc<Assessor>,
    /// Service metrics
    pub metrics: Arc<MetricsRegistry>,
    /// Start time for uptime calculation
    pub start_time: Instant,
}

impl HandlerState {
    pub fn new(assessor: Assessor, metrics: MetricsRegistry) -> Self {
        Self {
            assessor: Arc::new(assessor),
            metrics: Arc::new(metrics),
            start_time: Instant::now(),
        }
    }

    fn validate(&self, input: &RiskRecordInput) -> Result<RiskRecord, ApiError> {
        input.validate().map_err(|err| {
            self.metrics
                .assessment()
                .record_rejections(err.violations());
            ApiError::from(err)
        })
    }
}

/// API error types
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    PayloadTooLarge(String),
    InvalidInput(Vec<FieldViolation>),
    InferenceFailed(String),
    InternalError(String),
}

impl ApiError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::InferenceFailed(_) => "INFERENCE_FAILED",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InferenceFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Bind the error to the request it answers
    pub fn for_request(self, request_id: impl Into<String>) -> RequestError {
        RequestError {
            request_id: request_id.into(),
            error: self,
        }
    }

    fn info(&self) -> ErrorInfo {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::InferenceFailed(msg)
            | ApiError::InternalError(msg) => ErrorInfo::new(self.error_code(), msg),
            ApiError::InvalidInput(violations) => {
                ErrorInfo::new(self.error_code(), "Input validation failed")
                    .with_details(serde_json::json!({ "violations": violations }))
            }
        }
    }
}

/// An [`ApiError`] together with the id of the failed request
#[derive(Debug)]
pub struct RequestError {
    pub request_id: String,
    pub error: ApiError,
}

impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::Invalid(violations) => ApiError::InvalidInput(violations),
        }
    }
}

impl From<InferenceError> for ApiError {
    fn from(err: InferenceError) -> Self {
        ApiError::InferenceFailed(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        let response = ApiResponse::<()>::error(self.error.info(), self.request_id);
        (status, Json(response)).into_response()
    }
}

/// Create the router with all routes
pub fn create_router(state: HandlerState, server: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Form
        .route("/", get(show_form).post(submit_form))
        // JSON API
        .route("/api/v1/assess", post(assess_record))
        .route("/api/v1/explain", post(explain_record))
        // Operations
        .route("/health", get(health_check))
        .route("/metrics", get(export_metrics))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            metrics_middleware,
        ))
        .layer(axum::middleware::from_fn(request_logging_middleware))
        .layer(DefaultBodyLimit::max(server.max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// GET / - Empty form
pub async fn show_form(State(state): State<HandlerState>) -> Html<String> {
    Html(FormPage::new().render(state.assessor.explanations_enabled()))
}

/// POST / - Form submission
///
/// Re-renders the form with the submitted values. Input errors are listed
/// above the form and answered with 422.
pub async fn submit_form(
    State(state): State<HandlerState>,
    request_id: Option<Extension<RequestId>>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let request_id = RequestId::resolve(request_id);
    let explanations_enabled = state.assessor.explanations_enabled();
    let submitted = || pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()));
    let page = FormPage::new().with_values(submitted());

    let record = match RiskRecord::from_pairs(submitted()) {
        Ok(record) => record,
        Err(err) => {
            tracing::info!(
                request_id = %request_id,
                violations = err.violations().len(),
                "Form input rejected"
            );
            state
                .metrics
                .assessment()
                .record_rejections(err.violations());
            let html = page
                .with_violations(err.violations().to_vec())
                .render(explanations_enabled);
            return (StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response();
        }
    };

    match state.assessor.assess(&record) {
        Ok(assessment) => {
            state.metrics.assessment().record_assessment(&assessment);
            Html(page.with_assessment(assessment).render(explanations_enabled)).into_response()
        }
        Err(err) => {
            tracing::error!(request_id = %request_id, error = %err, "Assessment failed");
            let html = page
                .with_failure(format!("Prediksi gagal: {}", err))
                .render(explanations_enabled);
            (StatusCode::INTERNAL_SERVER_ERROR, Html(html)).into_response()
        }
    }
}

/// POST /api/v1/assess - Full assessment
///
/// Explanations are empty when they are disabled in the configuration.
pub async fn assess_record(
    State(state): State<HandlerState>,
    request_id: Option<Extension<RequestId>>,
    payload: Result<Json<RiskRecordInput>, JsonRejection>,
) -> Result<Json<ApiResponse<Assessment>>, RequestError> {
    let start = Instant::now();
    let request_id = RequestId::resolve(request_id);
    let assessment =
        assess(&state, &request_id, payload).map_err(|e| e.for_request(&request_id))?;

    let duration_ms = start.elapsed().as_millis() as u64;
    Ok(Json(
        ApiResponse::success(assessment, request_id).with_duration(duration_ms),
    ))
}

fn assess(
    state: &HandlerState,
    request_id: &str,
    payload: Result<Json<RiskRecordInput>, JsonRejection>,
) -> Result<Assessment, ApiError> {
    let Json(input) = payload?;
    let record = state.validate(&input)?;
    let assessment = state.assessor.assess(&record).map_err(|err| {
        tracing::error!(request_id = %request_id, error = %err, "Assessment failed");
        ApiError::from(err)
    })?;

    state.metrics.assessment().record_assessment(&assessment);
    Ok(assessment)
}

/// POST /api/v1/explain - Explanations only
pub async fn explain_record(
    State(state): State<HandlerState>,
    request_id: Option<Extension<RequestId>>,
    payload: Result<Json<RiskRecordInput>, JsonRejection>,
) -> Result<Json<ApiResponse<ExplainResult>>, RequestError> {
    let start = Instant::now();
    let request_id = RequestId::resolve(request_id);
    let explanations = explain(&state, payload).map_err(|e| e.for_request(&request_id))?;

    let metrics = state.metrics.assessment();
    for explanation in &explanations {
        metrics.record_explanation(explanation.code);
    }
    metrics.observe("explain", start.elapsed().as_secs_f64());

    tracing::debug!(
        request_id = %request_id,
        explanations = explanations.len(),
        "Explanations produced"
    );

    let result = ExplainResult {
        explanations,
        rules_evaluated: state.assessor.engine().rules().len(),
    };
    let duration_ms = start.elapsed().as_millis() as u64;
    Ok(Json(
        ApiResponse::success(result, request_id).with_duration(duration_ms),
    ))
}

fn explain(
    state: &HandlerState,
    payload: Result<Json<RiskRecordInput>, JsonRejection>,
) -> Result<Vec<Explanation>, ApiError> {
    let Json(input) = payload?;
    let record = state.validate(&input)?;
    Ok(state.assessor.explain(&record))
}

/// GET /health - Health check endpoint
///
/// The service only starts with a loaded model, so it is degraded at worst:
/// an engine without rules still answers but never explains anything.
pub async fn health_check(State(state): State<HandlerState>) -> Json<HealthResponse> {
    let info = state.assessor.model().info();
    let explanation_rules = state.assessor.engine().rules().len();

    let status = if explanation_rules > 0 {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    Json(HealthResponse {
        status,
        components: ComponentHealth {
            model_kind: info.model_kind.clone(),
            model_source: info.model_source.clone(),
            explanation_rules,
            explanations_enabled: state.assessor.explanations_enabled(),
        },
        uptime_seconds: state.start_time.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /metrics - Prometheus text exposition
pub async fn export_metrics(
    State(state): State<HandlerState>,
    request_id: Option<Extension<RequestId>>,
) -> Result<Response, RequestError> {
    let body = state.metrics.encode_text().map_err(|e| {
        ApiError::InternalError(e.to_string()).for_request(RequestId::resolve(request_id))
    })?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}
