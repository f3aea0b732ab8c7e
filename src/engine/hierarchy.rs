use std::fmt;

use crate::engine::error::FacilityError;
use crate::engine::pricing::round2;

/// Handle into the hierarchy arena. Stable for the life of the node; a
/// slot freed by `remove_spot` may be reused by a later add.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AreaId(usize);

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaKind {
    Facility,
    Zone,
    Floor,
    Spot,
}

impl AreaKind {
    pub fn label(&self) -> &'static str {
        match self {
            AreaKind::Facility => "facility",
            AreaKind::Zone => "zone",
            AreaKind::Floor => "floor",
            AreaKind::Spot => "spot",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AreaNode {
    pub name: String,
    pub kind: AreaKind,
    pub base_price: f64,
    /// Back-reference used only for upward propagation.
    pub parent: Option<AreaId>,
    pub children: Vec<AreaId>,
    /// Leaves hold 1; every other level holds the sum over its children.
    pub capacity: u32,
    pub occupied: u32,
}

/// Facility → zone → floor → spot tree in an arena: a slot vector plus a
/// free list. Capacity and occupancy roll up eagerly on every change, so
/// reads never recurse.
#[derive(Debug)]
pub struct Hierarchy {
    nodes: Vec<Option<AreaNode>>,
    free: Vec<usize>,
    root: AreaId,
}

impl Hierarchy {
    pub fn new(name: impl Into<String>) -> Self {
        let root = AreaNode {
            name: name.into(),
            kind: AreaKind::Facility,
            base_price: 0.0,
            parent: None,
            children: Vec::new(),
            capacity: 0,
            occupied: 0,
        };
        Hierarchy {
            nodes: vec![Some(root)],
            free: Vec::new(),
            root: AreaId(0),
        }
    }

    pub fn root(&self) -> AreaId {
        self.root
    }

    pub fn node(&self, id: AreaId) -> Option<&AreaNode> {
        self.nodes.get(id.0).and_then(|slot| slot.as_ref())
    }

    fn node_mut(&mut self, id: AreaId) -> Option<&mut AreaNode> {
        self.nodes.get_mut(id.0).and_then(|slot| slot.as_mut())
    }

    pub fn add_zone(
        &mut self,
        name: impl Into<String>,
        base_price: f64,
    ) -> Result<AreaId, FacilityError> {
        let root = self.root;
        self.attach(root, AreaKind::Zone, name.into(), base_price)
    }

    pub fn add_floor(
        &mut self,
        zone: AreaId,
        name: impl Into<String>,
        base_price: f64,
    ) -> Result<AreaId, FacilityError> {
        self.expect_kind(zone, AreaKind::Zone)?;
        self.attach(zone, AreaKind::Floor, name.into(), base_price)
    }

    /// Add a leaf spot under a floor and grow the capacity of every
    /// ancestor up to the root.
    pub fn add_spot(
        &mut self,
        floor: AreaId,
        name: impl Into<String>,
        base_price: f64,
    ) -> Result<AreaId, FacilityError> {
        self.expect_kind(floor, AreaKind::Floor)?;
        let id = self.attach(floor, AreaKind::Spot, name.into(), base_price)?;
        self.adjust_ancestors(floor, 1, 0);
        Ok(id)
    }

    /// Detach a leaf and shrink ancestor counts. The freed slot goes back
    /// on the free list.
    pub fn remove_spot(&mut self, leaf: AreaId) -> Result<(), FacilityError> {
        let node = self.expect_kind(leaf, AreaKind::Spot)?;
        let parent = node.parent;
        let was_occupied = node.occupied > 0;
        if let Some(pid) = parent {
            if let Some(p) = self.node_mut(pid) {
                p.children.retain(|&c| c != leaf);
            }
            self.adjust_ancestors(pid, -1, if was_occupied { -1 } else { 0 });
        }
        self.nodes[leaf.0] = None;
        self.free.push(leaf.0);
        Ok(())
    }

    /// Set a leaf's occupancy, then recompute each ancestor's occupied
    /// count as the sum over its direct children, strictly upward.
    pub fn set_spot_occupied(&mut self, leaf: AreaId, occupied: bool) -> Result<(), FacilityError> {
        self.expect_kind(leaf, AreaKind::Spot)?;
        if let Some(node) = self.node_mut(leaf) {
            node.occupied = if occupied { 1 } else { 0 };
        }
        self.recompute_upward(leaf);
        Ok(())
    }

    /// Occupied over capacity; 0.0 for a node with no capacity.
    pub fn occupancy_rate(&self, id: AreaId) -> f64 {
        match self.node(id) {
            Some(node) if node.capacity > 0 => f64::from(node.occupied) / f64::from(node.capacity),
            _ => 0.0,
        }
    }

    /// `base_price * (1 + 0.5 * occupancy_rate)`, rounded to cents. The
    /// same formula applies at every level.
    pub fn dynamic_price(&self, id: AreaId) -> f64 {
        match self.node(id) {
            Some(node) => round2(node.base_price * (1.0 + 0.5 * self.occupancy_rate(id))),
            None => 0.0,
        }
    }

    pub fn child_named(&self, parent: AreaId, name: &str) -> Option<AreaId> {
        let p = self.node(parent)?;
        p.children
            .iter()
            .copied()
            .find(|&c| self.node(c).is_some_and(|n| n.name == name))
    }

    /// Pre-order traversal as `(depth, node)` pairs, children in insertion
    /// order. Rendering is the caller's business.
    pub fn walk(&self) -> impl Iterator<Item = (usize, &AreaNode)> {
        Walk {
            hierarchy: self,
            stack: vec![(0, self.root)],
        }
    }

    fn expect_kind(&self, id: AreaId, expected: AreaKind) -> Result<&AreaNode, FacilityError> {
        let node = self.node(id).ok_or(FacilityError::UnknownArea(id))?;
        if node.kind != expected {
            return Err(FacilityError::WrongLevel {
                expected: expected.label(),
                found: node.kind.label(),
            });
        }
        Ok(node)
    }

    fn attach(
        &mut self,
        parent: AreaId,
        kind: AreaKind,
        name: String,
        base_price: f64,
    ) -> Result<AreaId, FacilityError> {
        self.node(parent).ok_or(FacilityError::UnknownArea(parent))?;
        if self.child_named(parent, &name).is_some() {
            return Err(FacilityError::DuplicateArea(name));
        }
        let id = self.alloc(AreaNode {
            name,
            kind,
            base_price,
            parent: Some(parent),
            children: Vec::new(),
            capacity: if kind == AreaKind::Spot { 1 } else { 0 },
            occupied: 0,
        });
        if let Some(p) = self.node_mut(parent) {
            p.children.push(id);
        }
        Ok(id)
    }

    fn alloc(&mut self, node: AreaNode) -> AreaId {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                AreaId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                AreaId(self.nodes.len() - 1)
            }
        }
    }

    fn adjust_ancestors(&mut self, from: AreaId, capacity_delta: i32, occupied_delta: i32) {
        let mut cur = Some(from);
        while let Some(id) = cur {
            cur = match self.node_mut(id) {
                Some(node) => {
                    node.capacity = node.capacity.saturating_add_signed(capacity_delta);
                    node.occupied = node.occupied.saturating_add_signed(occupied_delta);
                    node.parent
                }
                None => None,
            };
        }
    }

    fn recompute_upward(&mut self, from: AreaId) {
        let mut cur = self.node(from).and_then(|n| n.parent);
        while let Some(id) = cur {
            let total: u32 = match self.node(id) {
                Some(node) => node
                    .children
                    .iter()
                    .filter_map(|&c| self.node(c))
                    .map(|c| c.occupied)
                    .sum(),
                None => break,
            };
            cur = match self.node_mut(id) {
                Some(node) => {
                    node.occupied = total;
                    node.parent
                }
                None => None,
            };
        }
    }
}

struct Walk<'a> {
    hierarchy: &'a Hierarchy,
    stack: Vec<(usize, AreaId)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a AreaNode);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (depth, id) = self.stack.pop()?;
            let Some(node) = self.hierarchy.node(id) else {
                continue;
            };
            for &child in node.children.iter().rev() {
                self.stack.push((depth + 1, child));
            }
            return Some((depth, node));
        }
    }
}
