//! Navigation overlay
//!
//! Each wrapper may carry a [`Relatives`] record holding its five logical
//! edges. An edge is tri-state: deferred to the physical tree, pinned to a
//! wrapper, or pinned to "no node". Deferred and explicit-none are different
//! states and must never be conflated.

use crate::WrapperId;

/// One logical edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Edge {
    /// Read the physical tree
    #[default]
    Deferred,
    /// Logically points at this wrapper
    Node(WrapperId),
    /// Logically points at nothing, whatever the physical tree says
    None,
}

impl Edge {
    pub fn is_deferred(self) -> bool {
        matches!(self, Edge::Deferred)
    }
}

impl From<Option<WrapperId>> for Edge {
    fn from(value: Option<WrapperId>) -> Self {
        match value {
            Some(id) => Edge::Node(id),
            None => Edge::None,
        }
    }
}

/// Names one of the five edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Parent,
    FirstChild,
    LastChild,
    NextSibling,
    PreviousSibling,
}

impl Relation {
    pub const ALL: [Relation; 5] = [
        Relation::Parent,
        Relation::FirstChild,
        Relation::LastChild,
        Relation::NextSibling,
        Relation::PreviousSibling,
    ];
}

/// The overlay record of one wrapper
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Relatives {
    parent: Edge,
    first_child: Edge,
    last_child: Edge,
    next_sibling: Edge,
    previous_sibling: Edge,
}

impl Relatives {
    pub fn get(&self, relation: Relation) -> Edge {
        match relation {
            Relation::Parent => self.parent,
            Relation::FirstChild => self.first_child,
            Relation::LastChild => self.last_child,
            Relation::NextSibling => self.next_sibling,
            Relation::PreviousSibling => self.previous_sibling,
        }
    }

    pub(crate) fn set(&mut self, relation: Relation, edge: Edge) {
        let slot = match relation {
            Relation::Parent => &mut self.parent,
            Relation::FirstChild => &mut self.first_child,
            Relation::LastChild => &mut self.last_child,
            Relation::NextSibling => &mut self.next_sibling,
            Relation::PreviousSibling => &mut self.previous_sibling,
        };
        *slot = edge;
    }

    /// True when every edge reads through to the physical tree
    pub fn is_fully_deferred(&self) -> bool {
        Relation::ALL.iter().all(|&r| self.get(r).is_deferred())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_start_deferred() {
        let relatives = Relatives::default();
        assert!(relatives.is_fully_deferred());
        for relation in Relation::ALL {
            assert_eq!(relatives.get(relation), Edge::Deferred);
        }
    }

    #[test]
    fn test_explicit_none_is_not_deferred() {
        let mut relatives = Relatives::default();
        relatives.set(Relation::NextSibling, Edge::from(None));
        assert_eq!(relatives.get(Relation::NextSibling), Edge::None);
        assert!(!relatives.get(Relation::NextSibling).is_deferred());
        assert!(!relatives.is_fully_deferred());

        relatives.set(Relation::NextSibling, Edge::Deferred);
        assert!(relatives.is_fully_deferred());
    }

    #[test]
    fn test_edges_are_independent() {
        let mut relatives = Relatives::default();
        relatives.set(Relation::Parent, Edge::Node(WrapperId { index: 3, generation: 0 }));
        relatives.set(Relation::FirstChild, Edge::Node(WrapperId { index: 4, generation: 0 }));
        assert_eq!(relatives.get(Relation::Parent), Edge::Node(WrapperId { index: 3, generation: 0 }));
        assert_eq!(relatives.get(Relation::FirstChild), Edge::Node(WrapperId { index: 4, generation: 0 }));
        assert_eq!(relatives.get(Relation::LastChild), Edge::Deferred);
    }
}
