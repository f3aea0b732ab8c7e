use serde::{Deserialize, Serialize};
use std::fmt;

/// Unix milliseconds, the only time type.
pub type Ms = i64;

pub const HOUR_MS: Ms = 3_600_000;

/// Caller-assigned spot code ("A-101"). String order keys the index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpotId(pub String);

impl SpotId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Caller-assigned vehicle plate ("CAR-123").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VehicleId(pub String);

impl VehicleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpotKind {
    Standard,
    Compact,
    Handicap,
    Electric,
}

/// A single parking spot. The copy stored in the index is the one source
/// of truth for occupancy; the hierarchy carries counts only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spot {
    pub id: SpotId,
    pub kind: SpotKind,
    pub zone: String,
    pub floor: String,
    /// Hourly base rate before any dynamic factor.
    pub base_rate: f64,
    /// Premium weighting, 1 = ordinary.
    pub priority: u8,
    pub occupied: bool,
    pub occupied_since: Option<Ms>,
}

impl Spot {
    pub fn new(
        id: SpotId,
        kind: SpotKind,
        zone: impl Into<String>,
        floor: impl Into<String>,
        base_rate: f64,
        priority: u8,
    ) -> Self {
        debug_assert!(base_rate >= 0.0, "base_rate must be non-negative");
        debug_assert!(priority >= 1, "priority starts at 1");
        Self {
            id,
            kind,
            zone: zone.into(),
            floor: floor.into(),
            base_rate,
            priority,
            occupied: false,
            occupied_since: None,
        }
    }
}

/// An active parking session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub vehicle: VehicleId,
    pub spot: SpotId,
    pub entry_time: Ms,
    /// Hourly rate fixed when the session opened.
    pub quoted_rate: f64,
}

/// A session after its exit stamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedSession {
    pub vehicle: VehicleId,
    pub spot: SpotId,
    pub entry_time: Ms,
    pub exit_time: Ms,
    pub quoted_rate: f64,
}

impl ClosedSession {
    pub fn duration_ms(&self) -> Ms {
        self.exit_time - self.entry_time
    }
}

/// The final charge handed back on departure.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub vehicle: VehicleId,
    pub spot: SpotId,
    pub entry_time: Ms,
    pub exit_time: Ms,
    pub quoted_rate: f64,
    pub billed_hours: i64,
    pub amount: f64,
}

/// The event types, flat with no nesting. This is the journal record format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    ZoneAdded {
        name: String,
        base_price: f64,
    },
    FloorAdded {
        zone: String,
        name: String,
        base_price: f64,
    },
    SpotRegistered {
        spot: Spot,
    },
    SpotRemoved {
        id: SpotId,
    },
    SessionOpened {
        vehicle: VehicleId,
        spot: SpotId,
        entry_time: Ms,
        quoted_rate: f64,
    },
    SessionClosed {
        vehicle: VehicleId,
        exit_time: Ms,
    },
}

// ── Query result types ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ZoneOccupancy {
    pub zone: String,
    pub capacity: u32,
    pub occupied: u32,
    pub rate: f64,
    pub dynamic_price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacilityStatus {
    pub zones: usize,
    pub floors: usize,
    pub spots: usize,
    pub occupied: usize,
    pub active_sessions: usize,
    pub max_sessions: usize,
}
