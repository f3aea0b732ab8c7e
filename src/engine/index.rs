use std::cmp::Ordering;

use crate::engine::error::FacilityError;
use crate::model::{Spot, SpotId};

#[derive(Debug)]
struct Node {
    spot: Spot,
    left: Option<Box<Node>>,
    right: Option<Box<Node>>,
}

impl Node {
    fn leaf(spot: Spot) -> Box<Self> {
        Box::new(Node {
            spot,
            left: None,
            right: None,
        })
    }
}

/// Unbalanced binary search tree over spots, keyed by `SpotId`.
///
/// Lookup cost degrades to O(n) on sorted insertion; that is accepted,
/// not rebalanced away.
#[derive(Debug, Default)]
pub struct SpotIndex {
    root: Option<Box<Node>>,
    len: usize,
}

impl SpotIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a spot. A duplicate id is rejected and the stored spot is
    /// left untouched.
    pub fn insert(&mut self, spot: Spot) -> Result<(), FacilityError> {
        let mut link = &mut self.root;
        while let Some(node) = link {
            match spot.id.cmp(&node.spot.id) {
                Ordering::Less => link = &mut node.left,
                Ordering::Greater => link = &mut node.right,
                Ordering::Equal => return Err(FacilityError::DuplicateSpot(spot.id)),
            }
        }
        *link = Some(Node::leaf(spot));
        self.len += 1;
        Ok(())
    }

    pub fn find(&self, id: &SpotId) -> Option<&Spot> {
        let mut cur = self.root.as_deref();
        while let Some(node) = cur {
            match id.cmp(&node.spot.id) {
                Ordering::Less => cur = node.left.as_deref(),
                Ordering::Greater => cur = node.right.as_deref(),
                Ordering::Equal => return Some(&node.spot),
            }
        }
        None
    }

    /// Mutable lookup so the owner can flip occupancy in place. The key
    /// must not be changed through this.
    pub fn find_mut(&mut self, id: &SpotId) -> Option<&mut Spot> {
        let mut cur = self.root.as_deref_mut();
        while let Some(node) = cur {
            match id.cmp(&node.spot.id) {
                Ordering::Less => cur = node.left.as_deref_mut(),
                Ordering::Greater => cur = node.right.as_deref_mut(),
                Ordering::Equal => return Some(&mut node.spot),
            }
        }
        None
    }

    /// Remove and return a spot. A two-child node is replaced by its
    /// in-order successor, the minimum of the right subtree.
    pub fn remove(&mut self, id: &SpotId) -> Option<Spot> {
        let spot = Self::remove_from(&mut self.root, id);
        if spot.is_some() {
            self.len -= 1;
        }
        spot
    }

    fn remove_from(link: &mut Option<Box<Node>>, id: &SpotId) -> Option<Spot> {
        match link {
            None => None,
            Some(node) => match id.cmp(&node.spot.id) {
                Ordering::Less => Self::remove_from(&mut node.left, id),
                Ordering::Greater => Self::remove_from(&mut node.right, id),
                Ordering::Equal => {
                    let boxed = link.take()?;
                    let (spot, replacement) = Self::unlink(*boxed);
                    *link = replacement;
                    Some(spot)
                }
            },
        }
    }

    fn unlink(node: Node) -> (Spot, Option<Box<Node>>) {
        let Node { spot, left, right } = node;
        let replacement = match (left, right) {
            (None, None) => None,
            (Some(child), None) | (None, Some(child)) => Some(child),
            (Some(left), Some(right)) => {
                let (mut successor, rest) = Self::split_min(right);
                successor.left = Some(left);
                successor.right = rest;
                Some(successor)
            }
        };
        (spot, replacement)
    }

    /// Detach the minimum node of a subtree, returning it and what is
    /// left of the subtree.
    fn split_min(mut node: Box<Node>) -> (Box<Node>, Option<Box<Node>>) {
        match node.left.take() {
            None => {
                let rest = node.right.take();
                (node, rest)
            }
            Some(left) => {
                let (min, remaining) = Self::split_min(left);
                node.left = remaining;
                (min, Some(node))
            }
        }
    }

    /// Lazy ascending traversal. Finite, restartable; each call starts a
    /// fresh pass.
    pub fn in_order(&self) -> impl Iterator<Item = &Spot> {
        InOrder::new(self.root.as_deref())
    }
}

// ── In-order iterator ────────────────────────────────────────────

struct InOrder<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> InOrder<'a> {
    fn new(root: Option<&'a Node>) -> Self {
        let mut iter = InOrder { stack: Vec::new() };
        iter.descend_left(root);
        iter
    }

    fn descend_left(&mut self, mut node: Option<&'a Node>) {
        while let Some(n) = node {
            self.stack.push(n);
            node = n.left.as_deref();
        }
    }
}

impl<'a> Iterator for InOrder<'a> {
    type Item = &'a Spot;

    fn next(&mut self) -> Option<&'a Spot> {
        let node = self.stack.pop()?;
        self.descend_left(node.right.as_deref());
        Some(&node.spot)
    }
}
