//! Wrapper arena and identity registry
//!
//! Every physical node is wrapped by at most one wrapper at a time. The
//! registry is the only place that binds the two; rebinding is reserved for
//! specializing a node's identity (a fragment becoming a shadow root).

use fos_dom::{Node, NodeData, NodeId};

use crate::relatives::{Edge, Relation, Relatives};
use crate::side_table::SideTable;
use crate::{ShadowError, ShadowResult, WrapperId};

/// What a wrapper presents itself as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapperKind {
    Document,
    DocumentFragment,
    ShadowRoot,
    Element,
    /// `<content>` insertion point
    Content,
    Text,
    Comment,
}

impl WrapperKind {
    /// Default kind for a physical node
    pub fn for_node(node: &Node) -> Self {
        match &node.data {
            NodeData::Document(_) => WrapperKind::Document,
            NodeData::DocumentFragment => WrapperKind::DocumentFragment,
            NodeData::Element(elem) if elem.name == "content" => WrapperKind::Content,
            NodeData::Element(_) => WrapperKind::Element,
            NodeData::Text(_) => WrapperKind::Text,
            NodeData::Comment(_) => WrapperKind::Comment,
        }
    }

    pub fn is_element(self) -> bool {
        matches!(self, WrapperKind::Element | WrapperKind::Content)
    }

    /// Fragments donate their children on insertion
    pub fn is_fragment(self) -> bool {
        matches!(self, WrapperKind::DocumentFragment | WrapperKind::ShadowRoot)
    }

    pub fn can_have_children(self) -> bool {
        !matches!(self, WrapperKind::Text | WrapperKind::Comment)
    }
}

#[derive(Debug)]
pub(crate) struct Wrapper {
    node: NodeId,
    kind: WrapperKind,
    relatives: Option<Box<Relatives>>,
}

impl Wrapper {
    pub(crate) fn node(&self) -> NodeId {
        self.node
    }

    pub(crate) fn kind(&self) -> WrapperKind {
        self.kind
    }

    pub(crate) fn edge(&self, relation: Relation) -> Edge {
        self.relatives
            .as_ref()
            .map_or(Edge::Deferred, |relatives| relatives.get(relation))
    }

    pub(crate) fn relatives(&self) -> Option<&Relatives> {
        self.relatives.as_deref()
    }
}

#[derive(Debug, Default)]
struct WrapperSlot {
    generation: u32,
    wrapper: Option<Wrapper>,
}

/// Wrapper storage plus the physical-to-wrapper association
#[derive(Debug, Default)]
pub(crate) struct Registry {
    slots: Vec<WrapperSlot>,
    free_list: Vec<u32>,
    live: usize,
    by_node: SideTable<WrapperId>,
    /// Live wrappers carrying an overlay
    overlays: usize,
}

impl Registry {
    pub(crate) fn get(&self, id: WrapperId) -> Option<&Wrapper> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?
            .wrapper
            .as_ref()
    }

    fn get_mut(&mut self, id: WrapperId) -> Option<&mut Wrapper> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?
            .wrapper
            .as_mut()
    }

    pub(crate) fn lookup(&self, node: NodeId) -> Option<WrapperId> {
        self.by_node.get(node).copied()
    }

    fn allocate(&mut self, node: NodeId, kind: WrapperKind) -> WrapperId {
        let wrapper = Wrapper {
            node,
            kind,
            relatives: None,
        };
        self.live += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.wrapper = Some(wrapper);
            return WrapperId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(WrapperSlot {
            generation: 0,
            wrapper: Some(wrapper),
        });
        WrapperId {
            index,
            generation: 0,
        }
    }

    /// Bind a new wrapper of `kind` to `node`; fails if `node` is already bound
    pub(crate) fn associate(&mut self, node: NodeId, kind: WrapperKind) -> ShadowResult<WrapperId> {
        if self.by_node.contains(node) {
            return Err(ShadowError::DuplicateAssociation);
        }
        let id = self.allocate(node, kind);
        self.by_node.set(node, id);
        Ok(id)
    }

    /// Bind a new wrapper of `kind` to `node`, replacing any existing binding
    ///
    /// The replaced wrapper is freed.
    pub(crate) fn rebind(&mut self, node: NodeId, kind: WrapperKind) -> WrapperId {
        let id = self.allocate(node, kind);
        if let Some(previous) = self.by_node.set(node, id) {
            self.free(previous);
        }
        id
    }

    /// Drop the wrapper bound to `node`
    pub(crate) fn release_node(&mut self, node: NodeId) {
        if let Some(wrapper) = self.by_node.delete(node) {
            self.free(wrapper);
        }
    }

    fn free(&mut self, id: WrapperId) {
        let Some(slot) = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
        else {
            return;
        };
        let Some(freed) = slot.wrapper.take() else {
            return;
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index);
        self.live -= 1;
        if freed.relatives.is_some() {
            self.overlays -= 1;
        }
    }

    /// Overlay of `id`, allocated on first use
    pub(crate) fn overlay_mut(&mut self, id: WrapperId) -> Option<&mut Relatives> {
        if self.get(id)?.relatives.is_none() {
            self.overlays += 1;
        }
        Some(self.get_mut(id)?.relatives.get_or_insert_with(Box::default))
    }

    /// Overlay of `id` if one exists
    pub(crate) fn existing_overlay_mut(&mut self, id: WrapperId) -> Option<&mut Relatives> {
        self.get_mut(id)?.relatives.as_deref_mut()
    }

    /// True once any live wrapper carries an overlay
    pub(crate) fn has_overlays(&self) -> bool {
        self.overlays > 0
    }

    pub(crate) fn len(&self) -> usize {
        self.live
    }
}
