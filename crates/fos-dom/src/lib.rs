//! fOS DOM - Document Object Model
//!
//! Arena-backed physical node tree. A single [`DomTree`] holds any number of
//! documents; nodes are addressed by generational [`NodeId`]s so a handle to
//! a released node never resolves to the node that later reuses its slot.

mod generation;
mod node;
mod observer;
mod operations;
mod tree;

pub use generation::Generation;
pub use node::{Attribute, DocumentData, ElementData, Node, NodeData, NodeType, TextData};
pub use observer::{MutationRecord, MutationType};
pub use operations::{DocumentPosition, DomError, DomResult};
pub use tree::{Children, Descendants, DomTree};

/// Node identifier (arena index plus slot generation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: Generation,
}

impl NodeId {
    /// Sentinel for a missing edge
    pub const NONE: NodeId = NodeId {
        index: u32::MAX,
        generation: Generation::INITIAL,
    };

    /// Check if this id refers to a node slot at all
    #[inline]
    pub fn is_valid(self) -> bool {
        self.index != u32::MAX
    }

    /// Arena slot index
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }

    /// Slot generation this id was issued for
    #[inline]
    pub fn generation(self) -> Generation {
        self.generation
    }

    /// `None` for the sentinel, `Some(self)` otherwise
    #[inline]
    pub fn to_option(self) -> Option<NodeId> {
        if self.is_valid() { Some(self) } else { None }
    }
}
