use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: local seating operations. Labels: op, status.
pub const OPERATIONS_TOTAL: &str = "seatplan_operations_total";

/// Counter: snapshot pushes. Labels: status.
pub const PUSHES_TOTAL: &str = "seatplan_pushes_total";

/// Histogram: snapshot push latency in seconds.
pub const PUSH_DURATION_SECONDS: &str = "seatplan_push_duration_seconds";

/// Counter: remote snapshot polls. Labels: outcome.
pub const POLLS_TOTAL: &str = "seatplan_polls_total";

/// Counter: reconciliation runs. Labels: outcome.
pub const RECONCILE_RUNS_TOTAL: &str = "seatplan_reconcile_runs_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: open seating sessions.
pub const SESSIONS_ACTIVE: &str = "seatplan_sessions_active";

/// Counter: sessions ended by an expired token.
pub const AUTH_EXPIRED_TOTAL: &str = "seatplan_auth_expired_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), metrics_exporter_prometheus::BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Outcome label for an operation result.
pub fn status_label<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() { "ok" } else { "error" }
}
