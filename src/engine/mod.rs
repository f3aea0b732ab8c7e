mod error;
mod hierarchy;
mod index;
mod ledger;
mod mutations;
mod pricing;
mod queries;
mod ranking;

pub use error::FacilityError;
pub use hierarchy::{AreaId, AreaKind, AreaNode, Hierarchy};
pub use index::SpotIndex;
pub use ledger::SessionLedger;
pub use pricing::{HourBand, OccupancyCurve, PricingPolicy, TimeBands};
pub use ranking::merge_sort_by_key;

use std::collections::HashMap;
use std::path::Path;

use crate::journal::Journal;
use crate::model::*;

/// One parking facility: ordered spot index, occupancy-rollup area tree,
/// active-session ledger, pricing policy, optional journal. Every write
/// goes through an `Event`, so a journal-backed facility rebuilds by
/// replaying events through the same apply path live mutations use.
pub struct Facility {
    index: SpotIndex,
    hierarchy: Hierarchy,
    ledger: SessionLedger,
    policy: PricingPolicy,
    journal: Option<Journal>,
    /// Zone name → arena id.
    zones: HashMap<String, AreaId>,
    /// (zone name, floor name) → arena id.
    floors: HashMap<(String, String), AreaId>,
    /// Spot id → leaf arena id.
    spot_areas: HashMap<SpotId, AreaId>,
}

impl Facility {
    /// In-memory facility with no durability.
    pub fn in_memory(policy: PricingPolicy, max_sessions: usize) -> Self {
        let curve = policy.occupancy_curve.clone();
        Facility {
            index: SpotIndex::default(),
            hierarchy: Hierarchy::new("facility"),
            ledger: SessionLedger::new(max_sessions, curve),
            policy,
            journal: None,
            zones: HashMap::new(),
            floors: HashMap::new(),
            spot_areas: HashMap::new(),
        }
    }

    /// Journal-backed facility: replays any existing journal, then appends
    /// from there.
    pub fn open(
        path: &Path,
        policy: PricingPolicy,
        max_sessions: usize,
    ) -> Result<Self, FacilityError> {
        let events = Journal::replay(path).map_err(|e| FacilityError::Journal(e.to_string()))?;
        let journal = Journal::open(path).map_err(|e| FacilityError::Journal(e.to_string()))?;

        let mut facility = Self::in_memory(policy, max_sessions);
        for event in &events {
            facility.apply(event);
        }
        facility.journal = Some(journal);
        tracing::debug!(
            "replayed {} journal events from {}",
            events.len(),
            path.display()
        );
        Ok(facility)
    }

    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    /// Journal-append + apply in one call. Nothing is applied if the
    /// append fails, so in-memory state never runs ahead of the journal.
    pub(super) fn persist_and_apply(&mut self, event: Event) -> Result<(), FacilityError> {
        if let Some(journal) = &mut self.journal {
            let start = std::time::Instant::now();
            journal
                .append(&event)
                .map_err(|e| FacilityError::Journal(e.to_string()))?;
            metrics::histogram!(crate::observability::JOURNAL_APPEND_DURATION_SECONDS)
                .record(start.elapsed().as_secs_f64());
        }
        self.apply(&event);
        metrics::gauge!(crate::observability::OCCUPANCY_RATE).set(self.occupancy_rate());
        Ok(())
    }

    /// Apply an event to in-memory state, unconditionally. Mutations
    /// validate before journaling; replay trusts the journal, and an event
    /// referring to state a truncated journal never rebuilt is skipped.
    fn apply(&mut self, event: &Event) {
        match event {
            Event::ZoneAdded { name, base_price } => {
                if let Ok(id) = self.hierarchy.add_zone(name.clone(), *base_price) {
                    self.zones.insert(name.clone(), id);
                }
            }
            Event::FloorAdded { zone, name, base_price } => {
                if let Some(&zone_id) = self.zones.get(zone)
                    && let Ok(id) = self.hierarchy.add_floor(zone_id, name.clone(), *base_price)
                {
                    self.floors.insert((zone.clone(), name.clone()), id);
                }
            }
            Event::SpotRegistered { spot } => {
                let key = (spot.zone.clone(), spot.floor.clone());
                if let Some(&floor_id) = self.floors.get(&key)
                    && let Ok(leaf) =
                        self.hierarchy.add_spot(floor_id, spot.id.as_str(), spot.base_rate)
                {
                    self.spot_areas.insert(spot.id.clone(), leaf);
                    let _ = self.index.insert(spot.clone());
                }
            }
            Event::SpotRemoved { id } => {
                self.index.remove(id);
                if let Some(leaf) = self.spot_areas.remove(id) {
                    let _ = self.hierarchy.remove_spot(leaf);
                }
            }
            Event::SessionOpened { vehicle, spot, entry_time, quoted_rate } => {
                self.ledger.insert(Session {
                    vehicle: vehicle.clone(),
                    spot: spot.clone(),
                    entry_time: *entry_time,
                    quoted_rate: *quoted_rate,
                });
                self.set_spot_state(spot, true, Some(*entry_time));
            }
            Event::SessionClosed { vehicle, exit_time } => {
                if let Some(closed) = self.ledger.close(vehicle, *exit_time) {
                    self.set_spot_state(&closed.spot, false, None);
                }
            }
        }
    }

    /// Flip one spot's occupancy and propagate the change up the area
    /// tree. The Spot in the index stays the single source of truth; the
    /// hierarchy carries counts only.
    fn set_spot_state(&mut self, id: &SpotId, occupied: bool, since: Option<Ms>) {
        if let Some(spot) = self.index.find_mut(id) {
            spot.occupied = occupied;
            spot.occupied_since = since;
        }
        if let Some(&leaf) = self.spot_areas.get(id) {
            let _ = self.hierarchy.set_spot_occupied(leaf, occupied);
        }
    }

    pub(super) fn zone_id(&self, zone: &str) -> Result<AreaId, FacilityError> {
        self.zones
            .get(zone)
            .copied()
            .ok_or_else(|| FacilityError::UnknownZone(zone.to_owned()))
    }

    /// Occupancy rate of a named zone, 0.0 if no such zone.
    pub(super) fn zone_rate(&self, zone: &str) -> f64 {
        self.zones
            .get(zone)
            .map_or(0.0, |&id| self.hierarchy.occupancy_rate(id))
    }

    /// Facility-wide occupancy rate, straight off the root rollup.
    pub fn occupancy_rate(&self) -> f64 {
        self.hierarchy.occupancy_rate(self.hierarchy.root())
    }

    /// Appends since the journal was last rewritten; 0 when in-memory.
    pub fn journal_appends_since_compact(&self) -> u64 {
        self.journal
            .as_ref()
            .map_or(0, Journal::appends_since_compact)
    }
}
