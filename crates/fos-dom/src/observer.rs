//! Mutation records
//!
//! Child-list and character-data changes made through a
//! [`DomTree`](crate::DomTree). Records are only kept while observation is
//! enabled and are drained with `take_records`.

use crate::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    CharacterData,
    ChildList,
}

/// Mutation record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub mutation_type: MutationType,
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    /// Sibling before the change point, captured when the record was made
    pub previous_sibling: Option<NodeId>,
    /// Sibling after the change point, captured when the record was made
    pub next_sibling: Option<NodeId>,
}

impl MutationRecord {
    pub fn child_list(
        target: NodeId,
        added_nodes: Vec<NodeId>,
        removed_nodes: Vec<NodeId>,
        previous_sibling: Option<NodeId>,
        next_sibling: Option<NodeId>,
    ) -> Self {
        Self {
            mutation_type: MutationType::ChildList,
            target,
            added_nodes,
            removed_nodes,
            previous_sibling,
            next_sibling,
        }
    }

    pub fn character_data(target: NodeId) -> Self {
        Self {
            mutation_type: MutationType::CharacterData,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            previous_sibling: None,
            next_sibling: None,
        }
    }

    /// Child-list record that only removes nodes
    pub fn is_removal(&self) -> bool {
        self.mutation_type == MutationType::ChildList
            && self.added_nodes.is_empty()
            && !self.removed_nodes.is_empty()
    }
}
