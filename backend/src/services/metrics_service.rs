//! Prometheus metrics.
//!
//! Counters track resident submissions and staff decisions; gauges carry the
//! overdue counts computed by the scheduler.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::error::{AppError, Result};

/// Install the global Prometheus recorder. Call once at startup.
pub fn install_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| AppError::Internal(format!("Failed to install metrics recorder: {}", e)))
}

/// A resident submitted a leave or transport request.
pub fn record_submission(kind: &'static str, shelter: &str) {
    metrics::counter!(
        "shelter_requests_submitted_total",
        "kind" => kind,
        "shelter" => shelter.to_string()
    )
    .increment(1);
}

/// A staff member acted on a request or attendance record.
pub fn record_staff_action(kind: &'static str, action: &'static str) {
    metrics::counter!(
        "shelter_staff_actions_total",
        "kind" => kind,
        "action" => action
    )
    .increment(1);
}

pub fn record_login(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("shelter_staff_logins_total", "outcome" => outcome).increment(1);
}

pub fn set_overdue_gauge(kind: &'static str, shelter: &str, count: i64) {
    metrics::gauge!(
        "shelter_overdue",
        "kind" => kind,
        "shelter" => shelter.to_string()
    )
    .set(count as f64);
}
