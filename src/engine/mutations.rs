use tracing::{debug, info};

use crate::model::*;

use super::pricing::{billable_hours, hour_of_day, quote};
use super::{AreaKind, Facility, FacilityError};

impl Facility {
    pub fn add_zone(&mut self, name: impl Into<String>, base_price: f64) -> Result<(), FacilityError> {
        let name = name.into();
        if self.zones.contains_key(&name) {
            return Err(FacilityError::DuplicateArea(name));
        }
        self.persist_and_apply(Event::ZoneAdded { name, base_price })
    }

    pub fn add_floor(
        &mut self,
        zone: impl Into<String>,
        name: impl Into<String>,
        base_price: f64,
    ) -> Result<(), FacilityError> {
        let zone = zone.into();
        let name = name.into();
        self.zone_id(&zone)?;
        if self.floors.contains_key(&(zone.clone(), name.clone())) {
            return Err(FacilityError::DuplicateArea(name));
        }
        self.persist_and_apply(Event::FloorAdded { zone, name, base_price })
    }

    /// Register a vacant spot under an existing zone/floor. One step puts
    /// it in the index and as a leaf of the area tree.
    pub fn register_spot(&mut self, spot: Spot) -> Result<(), FacilityError> {
        if spot.occupied || spot.occupied_since.is_some() {
            return Err(FacilityError::SpotOccupied(spot.id));
        }
        if self.index.find(&spot.id).is_some() {
            return Err(FacilityError::DuplicateSpot(spot.id));
        }
        self.zone_id(&spot.zone)?;
        if !self.floors.contains_key(&(spot.zone.clone(), spot.floor.clone())) {
            return Err(FacilityError::UnknownFloor {
                zone: spot.zone,
                floor: spot.floor,
            });
        }

        self.persist_and_apply(Event::SpotRegistered { spot })?;
        metrics::counter!(crate::observability::SPOTS_REGISTERED_TOTAL).increment(1);
        Ok(())
    }

    /// Remove a spot outright. Refused while occupied; close its session
    /// first.
    pub fn remove_spot(&mut self, id: &SpotId) -> Result<Spot, FacilityError> {
        let spot = self
            .index
            .find(id)
            .ok_or_else(|| FacilityError::UnknownSpot(id.clone()))?;
        if spot.occupied {
            return Err(FacilityError::SpotOccupied(id.clone()));
        }
        let removed = spot.clone();

        self.persist_and_apply(Event::SpotRemoved { id: id.clone() })?;
        metrics::counter!(crate::observability::SPOTS_REMOVED_TOTAL).increment(1);
        Ok(removed)
    }

    /// Open a session for a vehicle on a specific spot. The hourly rate is
    /// quoted here from the ledger-scoped occupancy and fixed for the life
    /// of the session.
    pub fn park(
        &mut self,
        vehicle: VehicleId,
        spot_id: SpotId,
        entry_time: Ms,
    ) -> Result<Session, FacilityError> {
        let result = self.admit(vehicle, spot_id, entry_time);
        match &result {
            Ok(session) => {
                debug!(
                    "parked {} in {} at {:.2}/h",
                    session.vehicle, session.spot, session.quoted_rate
                );
                metrics::counter!(crate::observability::SESSIONS_OPENED_TOTAL).increment(1);
            }
            Err(e) => {
                metrics::counter!(
                    crate::observability::SESSIONS_REJECTED_TOTAL,
                    "reason" => crate::observability::error_label(e)
                )
                .increment(1);
            }
        }
        result
    }

    fn admit(
        &mut self,
        vehicle: VehicleId,
        spot_id: SpotId,
        entry_time: Ms,
    ) -> Result<Session, FacilityError> {
        let spot = self
            .index
            .find(&spot_id)
            .ok_or_else(|| FacilityError::UnknownSpot(spot_id.clone()))?;
        if spot.occupied {
            return Err(FacilityError::SpotOccupied(spot_id));
        }
        self.ledger.admission_check(&vehicle)?;
        let quoted_rate = self.ledger.quote_rate(spot.base_rate);

        self.persist_and_apply(Event::SessionOpened {
            vehicle: vehicle.clone(),
            spot: spot_id.clone(),
            entry_time,
            quoted_rate,
        })?;
        Ok(Session {
            vehicle,
            spot: spot_id,
            entry_time,
            quoted_rate,
        })
    }

    /// Close a vehicle's session and bill it: quoted rate × ceiling hours
    /// × entry-hour time factor × zone occupancy factor. The occupancy
    /// factor is read before the spot is released, while the departing
    /// vehicle still counts.
    pub fn leave(&mut self, vehicle: &VehicleId, exit_time: Ms) -> Result<Receipt, FacilityError> {
        let session = self
            .ledger
            .find(vehicle)
            .cloned()
            .ok_or_else(|| FacilityError::UnknownVehicle(vehicle.clone()))?;
        let zone = self
            .index
            .find(&session.spot)
            .map(|s| s.zone.clone())
            .ok_or_else(|| FacilityError::UnknownSpot(session.spot.clone()))?;

        let billed_hours = billable_hours(exit_time - session.entry_time);
        let time_factor = self.policy.time_bands.factor(hour_of_day(session.entry_time));
        let occupancy_factor = self.policy.occupancy_curve.factor(self.zone_rate(&zone));
        let amount = quote(session.quoted_rate, billed_hours, time_factor, occupancy_factor);

        self.persist_and_apply(Event::SessionClosed {
            vehicle: vehicle.clone(),
            exit_time,
        })?;

        debug!(
            "released {} from {}: {} h billed, charge {:.2}",
            session.vehicle, session.spot, billed_hours, amount
        );
        metrics::counter!(crate::observability::SESSIONS_CLOSED_TOTAL).increment(1);
        metrics::histogram!(crate::observability::SESSION_REVENUE_DOLLARS).record(amount);
        metrics::histogram!(crate::observability::SESSION_BILLED_HOURS).record(billed_hours as f64);

        Ok(Receipt {
            vehicle: session.vehicle,
            spot: session.spot,
            entry_time: session.entry_time,
            exit_time,
            quoted_rate: session.quoted_rate,
            billed_hours,
            amount,
        })
    }

    /// Spot-keyed release, for the attendant who knows the space but not
    /// the plate. Resolves the holder and closes its session.
    pub fn release_spot(&mut self, id: &SpotId, exit_time: Ms) -> Result<Receipt, FacilityError> {
        let spot = self
            .index
            .find(id)
            .ok_or_else(|| FacilityError::UnknownSpot(id.clone()))?;
        if !spot.occupied {
            return Err(FacilityError::SpotVacant(id.clone()));
        }
        let vehicle = self
            .ledger
            .active()
            .find(|s| &s.spot == id)
            .map(|s| s.vehicle.clone())
            .ok_or_else(|| FacilityError::SpotVacant(id.clone()))?;
        self.leave(&vehicle, exit_time)
    }

    /// Rewrite the journal as the minimal event set reproducing current
    /// state: structure, then vacant spots, then active sessions oldest
    /// first so replay's front insertion restores ledger order.
    pub fn compact(&mut self) -> Result<(), FacilityError> {
        if self.journal.is_none() {
            return Ok(());
        }
        let events = self.snapshot_events();
        let count = events.len();
        if let Some(journal) = &mut self.journal {
            journal
                .compact(&events)
                .map_err(|e| FacilityError::Journal(e.to_string()))?;
        }
        info!("journal compacted to {count} events");
        metrics::counter!(crate::observability::JOURNAL_COMPACTIONS_TOTAL).increment(1);
        Ok(())
    }

    fn snapshot_events(&self) -> Vec<Event> {
        let mut events = Vec::new();
        for (_, node) in self.hierarchy.walk() {
            match node.kind {
                AreaKind::Zone => events.push(Event::ZoneAdded {
                    name: node.name.clone(),
                    base_price: node.base_price,
                }),
                AreaKind::Floor => {
                    let zone = node
                        .parent
                        .and_then(|p| self.hierarchy.node(p))
                        .map(|n| n.name.clone())
                        .unwrap_or_default();
                    events.push(Event::FloorAdded {
                        zone,
                        name: node.name.clone(),
                        base_price: node.base_price,
                    });
                }
                AreaKind::Facility | AreaKind::Spot => {}
            }
        }
        for spot in self.index.in_order() {
            events.push(Event::SpotRegistered {
                spot: Spot {
                    occupied: false,
                    occupied_since: None,
                    ..spot.clone()
                },
            });
        }
        let sessions: Vec<&Session> = self.ledger.active().collect();
        for session in sessions.into_iter().rev() {
            events.push(Event::SessionOpened {
                vehicle: session.vehicle.clone(),
                spot: session.spot.clone(),
                entry_time: session.entry_time,
                quoted_rate: session.quoted_rate,
            });
        }
        events
    }
}
