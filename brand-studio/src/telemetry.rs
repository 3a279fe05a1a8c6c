//! Telemetry instrumentation for Brand Studio.
//!
//! ## Spans
//!
//! - `brand.round` - one generate-and-present round
//! - `brand.validation` - a validation batch
//! - `brand.check` - one external check for one name
//! - `brand.llm_request` - one model call
//! - `brand.assembly` - brand package assembly
//! - `brand.research` - market research ahead of round 1
//!
//! ## Metrics
//!
//! - `brand_rounds_total` - rounds committed (counter)
//! - `brand_feedback_total` - feedback recorded, by kind (counter)
//! - `brand_checks_unavailable_total` - checks that failed or timed out, by check (counter)
//! - `brand_llm_latency_seconds` - model latency (histogram)

use crate::config::TelemetryConfig;
use brand_core::{CheckKind, Completion, FeedbackKind};
use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Histogram, Meter};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{Span, info_span};

static METRICS: OnceLock<StudioMetrics> = OnceLock::new();

static OTEL_METRICS: OnceLock<Option<StudioOtelMetrics>> = OnceLock::new();

pub fn metrics() -> &'static StudioMetrics {
    METRICS.get_or_init(StudioMetrics::new)
}

/// Instruments under `config.service_name`, or none when metrics are off.
pub fn build_otel_metrics(config: &TelemetryConfig) -> Option<StudioOtelMetrics> {
    config
        .enable_metrics
        .then(|| StudioOtelMetrics::new(opentelemetry::global::meter(config.service_name.clone())))
}

/// Installs the OpenTelemetry instruments for this process. Only the first
/// call takes effect; returns whether this one did.
pub fn init_metrics(config: &TelemetryConfig) -> bool {
    OTEL_METRICS.set(build_otel_metrics(config)).is_ok()
}

/// Falls back to the default configuration when [`init_metrics`] was never called.
pub fn otel_metrics() -> Option<&'static StudioOtelMetrics> {
    OTEL_METRICS.get_or_init(|| build_otel_metrics(&TelemetryConfig::default())).as_ref()
}

pub struct StudioOtelMetrics {
    rounds_counter: Counter<u64>,
    feedback_counter: Counter<u64>,
    unavailable_counter: Counter<u64>,
    llm_latency_histogram: Histogram<f64>,
}

impl StudioOtelMetrics {
    pub fn new(meter: Meter) -> Self {
        Self {
            rounds_counter: meter
                .u64_counter("brand_rounds_total")
                .with_description("Total number of candidate rounds committed")
                .init(),
            feedback_counter: meter
                .u64_counter("brand_feedback_total")
                .with_description("Feedback records by kind")
                .init(),
            unavailable_counter: meter
                .u64_counter("brand_checks_unavailable_total")
                .with_description("Validation checks that failed or timed out")
                .init(),
            llm_latency_histogram: meter
                .f64_histogram("brand_llm_latency_seconds")
                .with_description("Model response latency in seconds")
                .init(),
        }
    }
}

/// Process-local counters, readable without an exporter.
#[derive(Debug, Default)]
pub struct StudioMetrics {
    pub rounds_total: AtomicU64,
    pub feedback_total: AtomicU64,
    pub checks_unavailable: AtomicU64,
    pub tokens_used: AtomicU64,
}

impl StudioMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_rounds(&self) -> u64 {
        self.rounds_total.load(Ordering::Relaxed)
    }

    pub fn get_feedback(&self) -> u64 {
        self.feedback_total.load(Ordering::Relaxed)
    }

    pub fn get_checks_unavailable(&self) -> u64 {
        self.checks_unavailable.load(Ordering::Relaxed)
    }

    pub fn get_tokens(&self) -> u64 {
        self.tokens_used.load(Ordering::Relaxed)
    }
}

// ============================================================================
// Span Helpers
// ============================================================================

pub fn round_span(session_id: &str, round: usize, iteration: usize) -> Span {
    info_span!(
        "brand.round",
        otel.name = "Naming Round",
        session_id = %session_id,
        round = %round,
        iteration = %iteration
    )
}

pub fn validation_span(names: usize) -> Span {
    info_span!("brand.validation", otel.name = "Validation", names = %names)
}

pub fn check_span(name: &str, check: CheckKind) -> Span {
    info_span!("brand.check", otel.name = "Check", name = %name, check = %check)
}

pub fn llm_request_span(model: &str, stage: &str) -> Span {
    info_span!("brand.llm_request", otel.name = "LLM Request", model = %model, stage = %stage)
}

pub fn assembly_span(name: &str) -> Span {
    info_span!("brand.assembly", otel.name = "Brand Assembly", name = %name)
}

pub fn research_span() -> Span {
    info_span!("brand.research", otel.name = "Brand Research")
}

// ============================================================================
// Timing
// ============================================================================

/// Logs the elapsed time of an operation when dropped.
pub struct TimingGuard {
    start: Instant,
    name: String,
}

impl TimingGuard {
    pub fn new(name: impl Into<String>) -> Self {
        Self { start: Instant::now(), name: name.into() }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        tracing::debug!(
            target: "brand.timing",
            name = %self.name,
            duration_ms = %self.start.elapsed().as_millis(),
            "Operation completed"
        );
    }
}

pub fn start_timing(name: impl Into<String>) -> TimingGuard {
    TimingGuard::new(name)
}

// ============================================================================
// Event Logging Helpers
// ============================================================================

pub fn log_round_committed(session_id: &str, round: usize, candidates: usize, carried: usize) {
    metrics().rounds_total.fetch_add(1, Ordering::Relaxed);
    if let Some(otel) = otel_metrics() {
        otel.rounds_counter.add(1, &[]);
    }
    tracing::info!(
        target: "brand.events",
        event = "round_committed",
        session_id = %session_id,
        round = %round,
        candidates = %candidates,
        carried = %carried,
        "Round committed"
    );
}

pub fn log_feedback(session_id: &str, kind: FeedbackKind, iteration: usize) {
    metrics().feedback_total.fetch_add(1, Ordering::Relaxed);
    if let Some(otel) = otel_metrics() {
        otel.feedback_counter.add(1, &[KeyValue::new("kind", kind.as_str())]);
    }
    tracing::info!(
        target: "brand.events",
        event = "feedback",
        session_id = %session_id,
        kind = %kind,
        iteration = %iteration,
        "Feedback recorded"
    );
}

pub fn log_completion(session_id: &str, completion: Completion, approved: usize) {
    tracing::info!(
        target: "brand.events",
        event = "completion",
        session_id = %session_id,
        completion = ?completion,
        approved = %approved,
        "Session complete"
    );
}

pub fn log_check_unavailable(name: &str, check: CheckKind, reason: &str) {
    metrics().checks_unavailable.fetch_add(1, Ordering::Relaxed);
    if let Some(otel) = otel_metrics() {
        otel.unavailable_counter.add(1, &[KeyValue::new("check", check.to_string())]);
    }
    tracing::warn!(
        target: "brand.events",
        event = "check_unavailable",
        name = %name,
        check = %check,
        reason = %reason,
        "Validation check unavailable"
    );
}

pub fn record_llm_latency(duration_secs: f64, model: &str, stage: &str) {
    if let Some(otel) = otel_metrics() {
        otel.llm_latency_histogram.record(
            duration_secs,
            &[KeyValue::new("model", model.to_string()), KeyValue::new("stage", stage.to_string())],
        );
    }
    tracing::debug!(
        target: "brand.metrics",
        metric = "llm_latency",
        duration_secs = %duration_secs,
        model = %model,
        stage = %stage,
        "LLM latency recorded"
    );
}

pub fn record_tokens_used(tokens: u32) {
    metrics().tokens_used.fetch_add(u64::from(tokens), Ordering::Relaxed);
}
