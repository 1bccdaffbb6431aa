//! Prometheus-compatible metrics endpoint

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::state::AppState;

/// Metrics collector
#[derive(Debug)]
pub struct Metrics {
    /// Server start time
    start_time: Instant,
    /// Total requests processed
    request_count: RwLock<u64>,
    /// Requests by endpoint
    requests_by_endpoint: RwLock<HashMap<String, u64>>,
    /// Jobs handed to the pipeline
    jobs_started: RwLock<u64>,
    /// Stop requests that actually stopped a job
    jobs_stopped: RwLock<u64>,
    /// Rejected configurations by error type
    validation_errors: RwLock<HashMap<String, u64>>,
    /// Failed requests by error kind
    errors_by_kind: RwLock<HashMap<String, u64>>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            request_count: RwLock::new(0),
            requests_by_endpoint: RwLock::new(HashMap::new()),
            jobs_started: RwLock::new(0),
            jobs_stopped: RwLock::new(0),
            validation_errors: RwLock::new(HashMap::new()),
            errors_by_kind: RwLock::new(HashMap::new()),
        }
    }

    /// Record a request
    pub fn record_request(&self, endpoint: &str) {
        *self.request_count.write() += 1;
        *self
            .requests_by_endpoint
            .write()
            .entry(endpoint.to_string())
            .or_insert(0) += 1;
    }

    pub fn record_job_started(&self) {
        *self.jobs_started.write() += 1;
    }

    pub fn record_job_stopped(&self) {
        *self.jobs_stopped.write() += 1;
    }

    /// Record a rejected configuration
    pub fn record_validation_error(&self, error_type: &str) {
        *self
            .validation_errors
            .write()
            .entry(error_type.to_string())
            .or_insert(0) += 1;
    }

    /// Record error
    pub fn record_error(&self, kind: &str) {
        *self
            .errors_by_kind
            .write()
            .entry(kind.to_string())
            .or_insert(0) += 1;
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Export metrics in Prometheus format
    pub fn export_prometheus(&self, job_running: bool) -> String {
        let mut output = String::new();

        // Server info
        output.push_str("# HELP streamer_uptime_seconds Server uptime in seconds\n");
        output.push_str("# TYPE streamer_uptime_seconds counter\n");
        let _ = writeln!(output, "streamer_uptime_seconds {}", self.uptime_secs());

        output.push_str(
            "\n# HELP streamer_start_time_seconds Server start time as Unix timestamp\n",
        );
        output.push_str("# TYPE streamer_start_time_seconds gauge\n");
        let _ = writeln!(
            output,
            "streamer_start_time_seconds {}",
            std::time::SystemTime::UNIX_EPOCH
                .elapsed()
                .unwrap_or(Duration::ZERO)
                .as_secs()
                .saturating_sub(self.uptime_secs())
        );

        // Request metrics
        output.push_str("\n# HELP streamer_requests_total Total number of HTTP requests\n");
        output.push_str("# TYPE streamer_requests_total counter\n");
        let _ = writeln!(
            output,
            "streamer_requests_total {}",
            *self.request_count.read()
        );

        output.push_str("\n# HELP streamer_requests_by_endpoint Requests by endpoint\n");
        output.push_str("# TYPE streamer_requests_by_endpoint counter\n");
        for (endpoint, count) in self.requests_by_endpoint.read().iter() {
            let _ = writeln!(
                output,
                "streamer_requests_by_endpoint{{endpoint=\"{}\"}} {}",
                endpoint, count
            );
        }

        // Job metrics
        output.push_str("\n# HELP streamer_jobs_started_total Jobs handed to the pipeline\n");
        output.push_str("# TYPE streamer_jobs_started_total counter\n");
        let _ = writeln!(
            output,
            "streamer_jobs_started_total {}",
            *self.jobs_started.read()
        );

        output.push_str("\n# HELP streamer_jobs_stopped_total Jobs stopped on request\n");
        output.push_str("# TYPE streamer_jobs_stopped_total counter\n");
        let _ = writeln!(
            output,
            "streamer_jobs_stopped_total {}",
            *self.jobs_stopped.read()
        );

        output.push_str("\n# HELP streamer_job_running Whether a job is running\n");
        output.push_str("# TYPE streamer_job_running gauge\n");
        let _ = writeln!(output, "streamer_job_running {}", u8::from(job_running));

        // Error metrics
        output.push_str(
            "\n# HELP streamer_validation_errors_total Rejected configurations by error type\n",
        );
        output.push_str("# TYPE streamer_validation_errors_total counter\n");
        for (error_type, count) in self.validation_errors.read().iter() {
            let _ = writeln!(
                output,
                "streamer_validation_errors_total{{error_type=\"{}\"}} {}",
                error_type, count
            );
        }

        output.push_str("\n# HELP streamer_errors_total Total errors by kind\n");
        output.push_str("# TYPE streamer_errors_total counter\n");
        for (kind, count) in self.errors_by_kind.read().iter() {
            let _ = writeln!(output, "streamer_errors_total{{kind=\"{}\"}} {}", kind, count);
        }

        output
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Metrics endpoint handler
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    let job_running = state.pipeline.status().is_running();
    let prometheus_output = state.metrics.export_prometheus(job_running);

    (
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4")],
        prometheus_output,
    )
        .into_response()
}
