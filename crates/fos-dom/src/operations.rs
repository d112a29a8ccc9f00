//! DOM Node Operations
//!
//! Error type shared by the tree primitives and the document position bit set
//! returned by `compare_document_position`.

use std::ops::BitOr;

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node not found
    #[error("Node not found")]
    NotFound,
    /// Hierarchy error (e.g., inserting ancestor)
    #[error("Hierarchy request error")]
    HierarchyRequest,
    /// Node belongs to another document
    #[error("Wrong document")]
    WrongDocument,
    /// Invalid node type
    #[error("Invalid node type")]
    InvalidNodeType,
    /// Node is not a child
    #[error("Node is not a child")]
    NotAChild,
    /// Node id refers to a released slot
    #[error("Node has been released")]
    StaleNode,
}

/// Result of `compare_document_position`, a DOM bit set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocumentPosition(u16);

impl DocumentPosition {
    pub const DISCONNECTED: DocumentPosition = DocumentPosition(0x01);
    pub const PRECEDING: DocumentPosition = DocumentPosition(0x02);
    pub const FOLLOWING: DocumentPosition = DocumentPosition(0x04);
    pub const CONTAINS: DocumentPosition = DocumentPosition(0x08);
    pub const CONTAINED_BY: DocumentPosition = DocumentPosition(0x10);
    pub const IMPLEMENTATION_SPECIFIC: DocumentPosition = DocumentPosition(0x20);

    /// Same node
    pub const fn empty() -> Self {
        DocumentPosition(0)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Check if every bit of `other` is set
    pub fn contains(self, other: DocumentPosition) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl BitOr for DocumentPosition {
    type Output = DocumentPosition;

    fn bitor(self, rhs: DocumentPosition) -> DocumentPosition {
        DocumentPosition(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_position_bits() {
        let pos = DocumentPosition::CONTAINED_BY | DocumentPosition::FOLLOWING;
        assert_eq!(pos.bits(), 0x14);
        assert!(pos.contains(DocumentPosition::FOLLOWING));
        assert!(!pos.contains(DocumentPosition::PRECEDING));
        assert_eq!(DocumentPosition::empty().bits(), 0);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(DomError::NotAChild.to_string(), "Node is not a child");
        assert_eq!(DomError::StaleNode.to_string(), "Node has been released");
    }
}
