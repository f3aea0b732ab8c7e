use std::net::SocketAddr;

use crate::engine::FacilityError;

// ── RED metrics (session-driven) ────────────────────────────────

/// Counter: sessions opened.
pub const SESSIONS_OPENED_TOTAL: &str = "parkade_sessions_opened_total";

/// Counter: park attempts refused. Labels: reason.
pub const SESSIONS_REJECTED_TOTAL: &str = "parkade_sessions_rejected_total";

/// Counter: sessions closed and billed.
pub const SESSIONS_CLOSED_TOTAL: &str = "parkade_sessions_closed_total";

/// Histogram: final charge per closed session.
pub const SESSION_REVENUE_DOLLARS: &str = "parkade_session_revenue_dollars";

/// Histogram: billed whole hours per closed session.
pub const SESSION_BILLED_HOURS: &str = "parkade_session_billed_hours";

// ── USE metrics (facility state) ────────────────────────────────

/// Counter: spots registered.
pub const SPOTS_REGISTERED_TOTAL: &str = "parkade_spots_registered_total";

/// Counter: spots removed.
pub const SPOTS_REMOVED_TOTAL: &str = "parkade_spots_removed_total";

/// Gauge: facility-wide occupancy rate, 0.0–1.0.
pub const OCCUPANCY_RATE: &str = "parkade_occupancy_rate";

/// Histogram: journal append + fsync duration in seconds.
pub const JOURNAL_APPEND_DURATION_SECONDS: &str = "parkade_journal_append_duration_seconds";

/// Counter: journal compactions.
pub const JOURNAL_COMPACTIONS_TOTAL: &str = "parkade_journal_compactions_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Map an error to a short label for rejection counters.
pub fn error_label(err: &FacilityError) -> &'static str {
    match err {
        FacilityError::DuplicateSpot(_) => "duplicate_spot",
        FacilityError::UnknownSpot(_) => "unknown_spot",
        FacilityError::UnknownVehicle(_) => "unknown_vehicle",
        FacilityError::SpotOccupied(_) => "spot_occupied",
        FacilityError::SpotVacant(_) => "spot_vacant",
        FacilityError::LedgerFull(_) => "ledger_full",
        FacilityError::VehicleAlreadyParked(_) => "vehicle_already_parked",
        FacilityError::UnknownZone(_) => "unknown_zone",
        FacilityError::UnknownFloor { .. } => "unknown_floor",
        FacilityError::UnknownArea(_) => "unknown_area",
        FacilityError::DuplicateArea(_) => "duplicate_area",
        FacilityError::WrongLevel { .. } => "wrong_level",
        FacilityError::Journal(_) => "journal",
    }
}
