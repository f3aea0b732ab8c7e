use std::collections::VecDeque;

use crate::engine::error::FacilityError;
use crate::engine::pricing::{OccupancyCurve, round2};
use crate::model::{ClosedSession, Ms, Session, SpotId, VehicleId};

/// Bounded collection of active sessions, most recently opened first.
///
/// The ledger has its own occupancy measure, active over `max_sessions`;
/// it prices entry quotes and is never mixed with the spatial rates the
/// hierarchy tracks.
#[derive(Debug)]
pub struct SessionLedger {
    sessions: VecDeque<Session>,
    max_sessions: usize,
    curve: OccupancyCurve,
}

impl SessionLedger {
    pub fn new(max_sessions: usize, curve: OccupancyCurve) -> Self {
        debug_assert!(max_sessions > 0, "ledger needs capacity");
        SessionLedger {
            sessions: VecDeque::new(),
            max_sessions,
            curve,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    pub fn occupancy_rate(&self) -> f64 {
        self.sessions.len() as f64 / self.max_sessions as f64
    }

    /// Hourly rate for a session opening now: the base rate scaled by the
    /// curve at the pre-insert occupancy.
    pub fn quote_rate(&self, base_rate: f64) -> f64 {
        round2(base_rate * self.curve.factor(self.occupancy_rate()))
    }

    /// Admission gate: capacity, then one active session per vehicle.
    pub fn admission_check(&self, vehicle: &VehicleId) -> Result<(), FacilityError> {
        if self.sessions.len() >= self.max_sessions {
            return Err(FacilityError::LedgerFull(self.max_sessions));
        }
        if self.find(vehicle).is_some() {
            return Err(FacilityError::VehicleAlreadyParked(vehicle.clone()));
        }
        Ok(())
    }

    /// Open a session. The quoted rate is fixed here and never revised;
    /// the returned copy is the caller's handle.
    pub fn open(
        &mut self,
        vehicle: VehicleId,
        spot: SpotId,
        entry_time: Ms,
        base_rate: f64,
    ) -> Result<Session, FacilityError> {
        self.admission_check(&vehicle)?;
        let session = Session {
            vehicle,
            spot,
            entry_time,
            quoted_rate: self.quote_rate(base_rate),
        };
        self.insert(session.clone());
        Ok(session)
    }

    /// Unchecked front insertion for sessions whose rate is already
    /// fixed (event apply/replay). `open` is the self-quoting variant.
    /// Replay may land the ledger over `max_sessions` when the bound was
    /// lowered between runs; such a ledger is drain-only until it falls
    /// back under the bound.
    pub fn insert(&mut self, session: Session) {
        self.sessions.push_front(session);
    }

    /// Close a vehicle's session, stamping the exit. `None` when the
    /// vehicle has no active session.
    pub fn close(&mut self, vehicle: &VehicleId, exit_time: Ms) -> Option<ClosedSession> {
        let pos = self.sessions.iter().position(|s| &s.vehicle == vehicle)?;
        let session = self.sessions.remove(pos)?;
        Some(ClosedSession {
            vehicle: session.vehicle,
            spot: session.spot,
            entry_time: session.entry_time,
            exit_time,
            quoted_rate: session.quoted_rate,
        })
    }

    pub fn find(&self, vehicle: &VehicleId) -> Option<&Session> {
        self.sessions.iter().find(|s| &s.vehicle == vehicle)
    }

    /// Active sessions, most recently opened first. Visible contract.
    pub fn active(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }
}
