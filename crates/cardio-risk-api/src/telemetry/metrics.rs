//! Prometheus metrics for risk assessment
//!
//! - `cardio_risk_assessments_total` (counter) - assessments by label
//! - `cardio_risk_explanations_total` (counter) - explanations by code
//! - `cardio_risk_rejected_inputs_total` (counter) - rejected fields by field and code
//! - `cardio_risk_assessment_duration_seconds` (histogram) - assessment latency
//! - `cardio_risk_http_requests_total` (counter) - requests by route and status
//!
//! # Example
//!
//! ```rust,no_run
//! use cardio_risk_api::telemetry::MetricsRegistry;
//! use cardio_risk_core::RiskLabel;
//!
//! let registry = MetricsRegistry::new().unwrap();
//! registry.assessment().record_label(RiskLabel::AtRisk);
//! registry.assessment().observe_duration(0.0004);
//! println!("{}", registry.encode_text().unwrap());
//! ```

use cardio_risk_core::{Assessment, ExplanationCode, FieldViolation, RiskLabel};
use prometheus::{CounterVec, HistogramOpts, HistogramVec, Opts, Registry};
use std::sync::Arc;

use super::{Result, TelemetryError};

const NAMESPACE: &str = "cardio_risk";

/// Assessment metrics
pub struct AssessmentMetrics {
    assessments_total: CounterVec,
    explanations_total: CounterVec,
    rejected_inputs_total: CounterVec,
    duration_seconds: HistogramVec,
    http_requests_total: CounterVec,
}

impl AssessmentMetrics {
    /// Create the metrics and register them with `registry`
    pub fn new(registry: Arc<Registry>) -> Result<Self> {
        let assessments_total = CounterVec::new(
            Opts::new("assessments_total", "Total number of risk assessments by label")
                .namespace(NAMESPACE),
            &["label"],
        )?;

        let explanations_total = CounterVec::new(
            Opts::new("explanations_total", "Total number of explanations produced by code")
                .namespace(NAMESPACE),
            &["code"],
        )?;

        let rejected_inputs_total = CounterVec::new(
            Opts::new("rejected_inputs_total", "Total number of rejected input fields")
                .namespace(NAMESPACE),
            &["field", "code"],
        )?;

        let duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "assessment_duration_seconds",
                "Risk assessment duration in seconds",
            )
            .namespace(NAMESPACE)
            .buckets(vec![0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]),
            &["operation"],
        )?;

        let http_requests_total = CounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests").namespace(NAMESPACE),
            &["route", "status"],
        )?;

        registry.register(Box::new(assessments_total.clone()))?;
        registry.register(Box::new(explanations_total.clone()))?;
        registry.register(Box::new(rejected_inputs_total.clone()))?;
        registry.register(Box::new(duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_total.clone()))?;

        Ok(Self {
            assessments_total,
            explanations_total,
            rejected_inputs_total,
            duration_seconds,
            http_requests_total,
        })
    }

    pub fn record_label(&self, label: RiskLabel) {
        self.assessments_total
            .with_label_values(&[label.as_str()])
            .inc();
    }

    pub fn record_explanation(&self, code: ExplanationCode) {
        self.explanations_total
            .with_label_values(&[code.as_str()])
            .inc();
    }

    /// Record label, explanations and duration of one assessment
    pub fn record_assessment(&self, assessment: &Assessment) {
        self.record_label(assessment.label);
        for explanation in &assessment.explanations {
            self.record_explanation(explanation.code);
        }
        self.observe("assess", assessment.duration_us as f64 / 1_000_000.0);
    }

    pub fn record_rejections(&self, violations: &[FieldViolation]) {
        for v in violations {
            self.rejected_inputs_total
                .with_label_values(&[v.field.name(), v.code.as_str()])
                .inc();
        }
    }

    pub fn observe_duration(&self, duration_secs: f64) {
        self.observe("assess", duration_secs);
    }

    pub fn observe(&self, operation: &str, duration_secs: f64) {
        self.duration_seconds
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    pub fn record_http_request(&self, route: &str, status: u16) {
        self.http_requests_total
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    pub fn assessments(&self, label: RiskLabel) -> f64 {
        self.assessments_total
            .with_label_values(&[label.as_str()])
            .get()
    }
}

/// Registry owning all service metrics
pub struct MetricsRegistry {
    registry: Arc<Registry>,
    assessment: AssessmentMetrics,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        Self::with_registry(Arc::new(Registry::new()))
    }

    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let assessment = AssessmentMetrics::new(Arc::clone(&registry))?;
        Ok(Self {
            registry,
            assessment,
        })
    }

    pub fn assessment(&self) -> &AssessmentMetrics {
        &self.assessment
    }

    pub fn gather(&self) -> Vec<prometheus::proto::MetricFamily> {
        self.registry.gather()
    }

    /// Encode metrics as text for scraping
    pub fn encode_text(&self) -> Result<String> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.gather(), &mut buffer)
            .map_err(|e| TelemetryError::EncodingError(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::EncodingError(e.to_string()))
    }
}
