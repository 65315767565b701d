use std::net::SocketAddr;

use crate::model::Event;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: committed mutations. Labels: op.
pub const MUTATIONS_TOTAL: &str = "rota_mutations_total";

/// Counter: single-day resolutions served.
pub const RESOLUTIONS_TOTAL: &str = "rota_resolutions_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: number of loaded facility engines.
pub const FACILITIES_ACTIVE: &str = "rota_facilities_active";

/// Histogram: WAL group-commit flush duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "rota_wal_flush_duration_seconds";

/// Histogram: WAL group-commit batch size (events per flush).
pub const WAL_FLUSH_BATCH_SIZE: &str = "rota_wal_flush_batch_size";

/// Install the Prometheus metrics exporter on the given port. No-op if the
/// port is None.
pub fn init_metrics(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Install the default fmt tracing subscriber. For embedding binaries that
/// don't bring their own.
pub fn init_tracing() {
    tracing_subscriber::fmt::init();
}

/// Map an event variant to a short label for metrics.
pub fn event_label(event: &Event) -> &'static str {
    match event {
        Event::StaffRegistered { .. } => "register_staff",
        Event::StaffUpdated { .. } => "update_staff",
        Event::StaffRemoved { .. } => "remove_staff",
        Event::DefaultSet { .. } => "set_default",
        Event::DefaultCleared { .. } => "clear_default",
        Event::OverridesAssigned { .. } => "assign_overrides",
        Event::OverridesCleared { .. } => "clear_overrides",
        Event::HolidaysAdded { .. } => "add_holidays",
        Event::HolidaysRemoved { .. } => "remove_holidays",
    }
}
