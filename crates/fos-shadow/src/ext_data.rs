//! Per-node extension records

use crate::WrapperId;

/// Auxiliary shadow state attached to a physical node
///
/// Created lazily through [`ShadowDom::get_or_create_extension`](crate::ShadowDom::get_or_create_extension)
/// and dropped together with the node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtData {
    /// Nodes distributed into this insertion point, in order
    pub distributed_nodes: Option<Vec<WrapperId>>,
    /// Host of this shadow root
    pub host: Option<WrapperId>,
    /// Insertion point this node was last distributed into
    pub insertion_parent: Option<WrapperId>,
    /// Next older shadow root attached to the same host
    pub older_shadow_root: Option<WrapperId>,
    /// Composition state when this node is a shadow host
    pub renderer_for_host: Option<HostRenderer>,
}

/// Composition state of one shadow host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostRenderer {
    /// Youngest shadow root; the one that gets rendered
    pub shadow_root: WrapperId,
    /// Set when the composed tree is stale
    pub dirty: bool,
}

impl HostRenderer {
    pub fn new(shadow_root: WrapperId) -> Self {
        Self {
            shadow_root,
            dirty: false,
        }
    }
}
