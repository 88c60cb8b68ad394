//! Prometheus metrics
//!
//! Defines metrics for:
//! - Resolved routes by resource
//! - Routing rejections by kind
//! - HTTP responses by method and status
//! - Request latency

use lazy_static::lazy_static;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};

lazy_static! {
    /// Registry for all metrics
    pub static ref REGISTRY: Registry = Registry::new();

    /// Successful route resolutions by resource
    pub static ref ROUTES_RESOLVED: IntCounterVec = IntCounterVec::new(
        Opts::new("imagehost_routes_resolved_total", "Requests resolved to a resource"),
        &["resource"]
    )
    .expect("Failed to create ROUTES_RESOLVED metric");

    /// Routing failures by kind
    pub static ref ROUTING_ERRORS: IntCounterVec = IntCounterVec::new(
        Opts::new("imagehost_routing_errors_total", "Requests rejected by the router"),
        &["kind"]
    )
    .expect("Failed to create ROUTING_ERRORS metric");

    /// HTTP responses by method and status
    pub static ref HTTP_RESPONSES: IntCounterVec = IntCounterVec::new(
        Opts::new("imagehost_http_responses_total", "Total HTTP responses"),
        &["method", "status"]
    )
    .expect("Failed to create HTTP_RESPONSES metric");

    /// HTTP request latency histogram
    pub static ref HTTP_REQUEST_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "imagehost_http_request_duration_seconds",
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0])
    )
    .expect("Failed to create HTTP_REQUEST_DURATION metric");
}

/// Register every metric with [`REGISTRY`]
pub fn init_metrics() -> Result<(), prometheus::Error> {
    REGISTRY.register(Box::new(ROUTES_RESOLVED.clone()))?;
    REGISTRY.register(Box::new(ROUTING_ERRORS.clone()))?;
    REGISTRY.register(Box::new(HTTP_RESPONSES.clone()))?;
    REGISTRY.register(Box::new(HTTP_REQUEST_DURATION.clone()))?;
    Ok(())
}

/// Encode the registry in the Prometheus text format
pub fn render() -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_work_without_registration() {
        ROUTING_ERRORS.with_label_values(&["teapot"]).inc();
        assert!(ROUTING_ERRORS.with_label_values(&["teapot"]).get() >= 1);
    }
}
