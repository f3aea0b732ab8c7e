use crate::engine::hierarchy::AreaId;
use crate::model::{SpotId, VehicleId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacilityError {
    DuplicateSpot(SpotId),
    UnknownSpot(SpotId),
    UnknownVehicle(VehicleId),
    SpotOccupied(SpotId),
    SpotVacant(SpotId),
    LedgerFull(usize),
    VehicleAlreadyParked(VehicleId),
    UnknownZone(String),
    UnknownFloor {
        zone: String,
        floor: String,
    },
    UnknownArea(AreaId),
    DuplicateArea(String),
    WrongLevel {
        expected: &'static str,
        found: &'static str,
    },
    Journal(String),
}

impl std::fmt::Display for FacilityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FacilityError::DuplicateSpot(id) => write!(f, "spot already registered: {id}"),
            FacilityError::UnknownSpot(id) => write!(f, "no such spot: {id}"),
            FacilityError::UnknownVehicle(v) => write!(f, "no active session for vehicle: {v}"),
            FacilityError::SpotOccupied(id) => write!(f, "spot occupied: {id}"),
            FacilityError::SpotVacant(id) => write!(f, "spot already vacant: {id}"),
            FacilityError::LedgerFull(max) => {
                write!(f, "session ledger full: {max} active sessions")
            }
            FacilityError::VehicleAlreadyParked(v) => {
                write!(f, "vehicle already has an active session: {v}")
            }
            FacilityError::UnknownZone(name) => write!(f, "no such zone: {name}"),
            FacilityError::UnknownFloor { zone, floor } => {
                write!(f, "no floor {floor} in zone {zone}")
            }
            FacilityError::UnknownArea(id) => write!(f, "no such area node: {id}"),
            FacilityError::DuplicateArea(name) => {
                write!(f, "sibling name already taken: {name}")
            }
            FacilityError::WrongLevel { expected, found } => {
                write!(f, "expected a {expected} node, found {found}")
            }
            FacilityError::Journal(e) => write!(f, "journal error: {e}"),
        }
    }
}

impl std::error::Error for FacilityError {}
