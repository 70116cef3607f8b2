//! Prometheus metrics for completion-service.
//!
//! Recording helpers are no-ops until [`init_metrics`] has run, so handlers
//! can be exercised in tests without a registry.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use prometheus::{
    Encoder, HistogramOpts, HistogramTimer, HistogramVec, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::sync::{Once, OnceLock};
use std::time::Instant;

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// HTTP metrics
pub static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

// Provider metrics
pub static PROVIDER_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static PROVIDER_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

// Database metrics
pub static DB_OPERATION_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static DB_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Later calls are ignored.
pub fn init_metrics() {
    static INIT: Once = Once::new();
    INIT.call_once(register_metrics);
}

fn register_metrics() {
    let registry = Registry::new();

    let http_requests_total = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )
    .expect("Failed to create http_requests_total metric");

    let http_request_duration = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        ),
        &["method", "path"],
    )
    .expect("Failed to create http_request_duration_seconds metric");

    let provider_latency = HistogramVec::new(
        HistogramOpts::new(
            "provider_request_duration_seconds",
            "Language-model provider call latency in seconds",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["operation", "model"],
    )
    .expect("Failed to create provider_request_duration_seconds metric");

    let provider_errors = IntCounterVec::new(
        Opts::new("provider_errors_total", "Total failed provider calls"),
        &["operation", "model"],
    )
    .expect("Failed to create provider_errors_total metric");

    let db_duration = HistogramVec::new(
        HistogramOpts::new(
            "db_operation_duration_seconds",
            "Database operation duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        &["operation"],
    )
    .expect("Failed to create db_operation_duration_seconds metric");

    let db_errors = IntCounterVec::new(
        Opts::new("db_errors_total", "Total failed database operations"),
        &["operation"],
    )
    .expect("Failed to create db_errors_total metric");

    registry
        .register(Box::new(http_requests_total.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(http_request_duration.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(provider_latency.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(provider_errors.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(db_duration.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(db_errors.clone()))
        .expect("collector can be registered");

    let _ = HTTP_REQUESTS_TOTAL.set(http_requests_total);
    let _ = HTTP_REQUEST_DURATION_SECONDS.set(http_request_duration);
    let _ = PROVIDER_LATENCY_SECONDS.set(provider_latency);
    let _ = PROVIDER_ERRORS_TOTAL.set(provider_errors);
    let _ = DB_OPERATION_DURATION_SECONDS.set(db_duration);
    let _ = DB_ERRORS_TOTAL.set(db_errors);
    let _ = REGISTRY.set(registry);
}

/// Render the registry in the Prometheus text format.
pub fn get_metrics() -> String {
    let Some(registry) = REGISTRY.get() else {
        return String::new();
    };

    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

pub fn observe_provider_call(operation: &str, model: &str, seconds: f64, success: bool) {
    if let Some(latency) = PROVIDER_LATENCY_SECONDS.get() {
        latency
            .with_label_values(&[operation, model])
            .observe(seconds);
    }
    if !success {
        if let Some(errors) = PROVIDER_ERRORS_TOTAL.get() {
            errors.with_label_values(&[operation, model]).inc();
        }
    }
}

/// Starts a timer that records into the DB histogram when dropped.
pub fn db_timer(operation: &str) -> Option<HistogramTimer> {
    DB_OPERATION_DURATION_SECONDS
        .get()
        .map(|h| h.with_label_values(&[operation]).start_timer())
}

pub fn record_db_error(operation: &str) {
    if let Some(errors) = DB_ERRORS_TOTAL.get() {
        errors.with_label_values(&[operation]).inc();
    }
}

/// Counts requests and their latency, labelled by matched route. Requests
/// that fall through to the static asset server share one `fallback` label.
pub async fn track_http_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "fallback".to_string());

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    if let Some(total) = HTTP_REQUESTS_TOTAL.get() {
        total
            .with_label_values(&[method.as_str(), path.as_str(), status.as_str()])
            .inc();
    }
    if let Some(duration) = HTTP_REQUEST_DURATION_SECONDS.get() {
        duration
            .with_label_values(&[method.as_str(), path.as_str()])
            .observe(start.elapsed().as_secs_f64());
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_metrics_are_exported() {
        init_metrics();
        init_metrics();

        observe_provider_call("generate_text", "gpt-test", 0.2, false);
        record_db_error("record_snapshot");
        drop(db_timer("record_completion"));

        let exported = get_metrics();
        assert!(exported.contains("provider_request_duration_seconds"));
        assert!(exported.contains("provider_errors_total"));
        assert!(exported.contains("db_errors_total"));
        assert!(exported.contains("record_snapshot"));
    }
}
