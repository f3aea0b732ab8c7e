use crate::model::*;

use super::pricing::{priority_factor, round2};
use super::ranking::merge_sort_by_key;
use super::{AreaNode, Facility, FacilityError};

impl Facility {
    pub fn spot(&self, id: &SpotId) -> Option<&Spot> {
        self.index.find(id)
    }

    /// All spots ascending by id.
    pub fn spots_in_order(&self) -> impl Iterator<Item = &Spot> {
        self.index.in_order()
    }

    /// Vacant spots ascending by id.
    pub fn available_spots(&self) -> impl Iterator<Item = &Spot> {
        self.index.in_order().filter(|s| !s.occupied)
    }

    /// First vacant spot of a kind, lowest id first.
    pub fn first_available(&self, kind: SpotKind) -> Option<&Spot> {
        self.index.in_order().find(|s| !s.occupied && s.kind == kind)
    }

    /// Active sessions, most recently opened first.
    pub fn active_sessions(&self) -> impl Iterator<Item = &Session> {
        self.ledger.active()
    }

    pub fn zone_occupancy(&self, zone: &str) -> Result<ZoneOccupancy, FacilityError> {
        let id = self.zone_id(zone)?;
        let node = self
            .hierarchy
            .node(id)
            .ok_or(FacilityError::UnknownArea(id))?;
        Ok(ZoneOccupancy {
            zone: node.name.clone(),
            capacity: node.capacity,
            occupied: node.occupied,
            rate: self.hierarchy.occupancy_rate(id),
            dynamic_price: self.hierarchy.dynamic_price(id),
        })
    }

    /// Live hourly rate for one spot: base rate scaled by its zone's
    /// occupancy factor and its own priority factor.
    pub fn spot_rate(&self, id: &SpotId) -> Result<f64, FacilityError> {
        let spot = self
            .index
            .find(id)
            .ok_or_else(|| FacilityError::UnknownSpot(id.clone()))?;
        Ok(self.live_rate(spot))
    }

    fn live_rate(&self, spot: &Spot) -> f64 {
        let occupancy = self.policy.occupancy_curve.factor(self.zone_rate(&spot.zone));
        let priority = priority_factor(spot.priority, self.policy.priority_weight);
        round2(spot.base_rate * occupancy * priority)
    }

    /// Premium view: priority descending, then base rate ascending.
    pub fn rank_by_priority(&self) -> Vec<Spot> {
        let spots: Vec<Spot> = self.index.in_order().cloned().collect();
        merge_sort_by_key(spots, &|s: &Spot| (-i32::from(s.priority), s.base_rate))
    }

    /// Bargain view: live rate ascending.
    pub fn rank_by_price(&self) -> Vec<Spot> {
        let spots: Vec<Spot> = self.index.in_order().cloned().collect();
        merge_sort_by_key(spots, &|s: &Spot| self.live_rate(s))
    }

    /// Guidance view: vacant spots first, priority descending within each
    /// group.
    pub fn rank_by_availability(&self) -> Vec<Spot> {
        let spots: Vec<Spot> = self.index.in_order().cloned().collect();
        merge_sort_by_key(spots, &|s: &Spot| (s.occupied, -i32::from(s.priority)))
    }

    /// Pre-order walk of the area tree, for rendering.
    pub fn walk(&self) -> impl Iterator<Item = (usize, &AreaNode)> {
        self.hierarchy.walk()
    }

    pub fn status(&self) -> FacilityStatus {
        let root = self.hierarchy.node(self.hierarchy.root());
        FacilityStatus {
            zones: self.zones.len(),
            floors: self.floors.len(),
            spots: self.index.len(),
            occupied: root.map_or(0, |n| n.occupied as usize),
            active_sessions: self.ledger.len(),
            max_sessions: self.ledger.max_sessions(),
        }
    }
}
