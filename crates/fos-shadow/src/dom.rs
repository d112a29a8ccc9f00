//! Wrapper identity, node factories and logical navigation

use std::cell::RefCell;
use std::fmt;

use fos_dom::{DocumentPosition, DomTree, MutationRecord, NodeId};

use crate::config::Config;
use crate::distribution::ContentDistributor;
use crate::ext_data::ExtData;
use crate::relatives::{Edge, Relation, Relatives};
use crate::render::{Distributor, RenderScheduler};
use crate::side_table::SideTable;
use crate::wrapper::{Registry, Wrapper, WrapperKind};
use crate::{ShadowError, ShadowResult, WrapperId};

/// A physical [`DomTree`] with a logical overlay on top
///
/// Reads take `&self`: wrappers for physical nodes reached by navigation are
/// created on demand, which only ever adds bindings.
pub struct ShadowDom {
    pub(crate) tree: DomTree,
    registry: RefCell<Registry>,
    pub(crate) ext: SideTable<ExtData>,
    pub(crate) scheduler: RenderScheduler,
    pub(crate) distributor: Option<Box<dyn Distributor>>,
    pub(crate) config: Config,
    document: WrapperId,
}

impl ShadowDom {
    /// Create an overlay with one empty document at `config.url`
    pub fn new(config: Config) -> Self {
        let mut tree = DomTree::new();
        let node = tree.create_document(&config.url);
        let mut registry = Registry::default();
        let document = registry.rebind(node, WrapperKind::Document);
        tracing::debug!(url = %config.url, "Created shadow DOM");

        Self {
            tree,
            registry: RefCell::new(registry),
            ext: SideTable::new(),
            scheduler: RenderScheduler::default(),
            distributor: Some(Box::new(ContentDistributor)),
            config,
            document,
        }
    }

    /// The initial document
    pub fn document(&self) -> WrapperId {
        self.document
    }

    /// Read-only access to the physical (composed) tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replace the component that computes composed trees
    pub fn set_distributor(&mut self, distributor: impl Distributor + 'static) {
        self.distributor = Some(Box::new(distributor));
    }

    // --- Identity ---

    /// The wrapper of `node`, creating it on first sight
    pub fn wrap(&self, node: NodeId) -> ShadowResult<WrapperId> {
        if let Some(existing) = self.lookup(node) {
            return Ok(existing);
        }
        let kind = self
            .tree
            .get(node)
            .map(WrapperKind::for_node)
            .ok_or(ShadowError::NotANode)?;
        let wrapper = self.registry.borrow_mut().associate(node, kind)?;
        tracing::trace!(?node, ?wrapper, ?kind, "wrapped node");
        Ok(wrapper)
    }

    /// The physical node behind `wrapper`
    pub fn unwrap(&self, wrapper: WrapperId) -> ShadowResult<NodeId> {
        let node = self
            .registry
            .borrow()
            .get(wrapper)
            .map(Wrapper::node)
            .ok_or(ShadowError::NotANode)?;
        if self.tree.contains(node) {
            Ok(node)
        } else {
            Err(ShadowError::NotANode)
        }
    }

    /// The wrapper already bound to `node`, if any
    pub fn lookup(&self, node: NodeId) -> Option<WrapperId> {
        self.registry.borrow().lookup(node)
    }

    /// Bind a new wrapper of `kind` to an unwrapped node
    pub fn associate(&mut self, node: NodeId, kind: WrapperKind) -> ShadowResult<WrapperId> {
        if !self.tree.contains(node) {
            return Err(ShadowError::NotANode);
        }
        self.registry.get_mut().associate(node, kind)
    }

    /// Replace the wrapper of `node` with a new one of `kind`
    ///
    /// The old wrapper id stops resolving.
    pub fn rebind(&mut self, node: NodeId, kind: WrapperKind) -> ShadowResult<WrapperId> {
        if !self.tree.contains(node) {
            return Err(ShadowError::NotANode);
        }
        let wrapper = self.registry.get_mut().rebind(node, kind);
        tracing::trace!(?node, ?wrapper, ?kind, "rebound node");
        Ok(wrapper)
    }

    pub fn kind(&self, wrapper: WrapperId) -> ShadowResult<WrapperKind> {
        self.registry
            .borrow()
            .get(wrapper)
            .map(Wrapper::kind)
            .ok_or(ShadowError::NotANode)
    }

    /// Number of live wrappers
    pub fn wrapper_count(&self) -> usize {
        self.registry.borrow().len()
    }

    /// Extension record of `node`, created on first use
    pub fn get_or_create_extension(&mut self, node: NodeId) -> &mut ExtData {
        self.ext.get_or_insert_with(node, ExtData::default)
    }

    /// Extension record of `wrapper`'s node if one was ever created
    pub fn extension(&self, wrapper: WrapperId) -> Option<&ExtData> {
        self.ext.get(self.unwrap(wrapper).ok()?)
    }

    pub(crate) fn extension_mut(&mut self, wrapper: WrapperId) -> ShadowResult<&mut ExtData> {
        let node = self.unwrap(wrapper)?;
        Ok(self.get_or_create_extension(node))
    }

    // --- Factories ---

    pub fn create_document(&mut self, url: &str) -> ShadowResult<WrapperId> {
        let node = self.tree.create_document(url);
        self.wrap(node)
    }

    pub fn create_element(&mut self, document: WrapperId, name: &str) -> ShadowResult<WrapperId> {
        let document = self.unwrap(document)?;
        let node = self.tree.create_element(document, name)?;
        self.wrap(node)
    }

    pub fn create_text_node(&mut self, document: WrapperId, data: &str) -> ShadowResult<WrapperId> {
        let document = self.unwrap(document)?;
        let node = self.tree.create_text(document, data)?;
        self.wrap(node)
    }

    pub fn create_comment(&mut self, document: WrapperId, data: &str) -> ShadowResult<WrapperId> {
        let document = self.unwrap(document)?;
        let node = self.tree.create_comment(document, data)?;
        self.wrap(node)
    }

    pub fn create_document_fragment(&mut self, document: WrapperId) -> ShadowResult<WrapperId> {
        let document = self.unwrap(document)?;
        let node = self.tree.create_document_fragment(document)?;
        self.wrap(node)
    }

    /// Free a detached node, its physical subtree and their wrappers
    ///
    /// Shadow roots and subtrees that contain a shadow host cannot be
    /// released.
    pub fn release_node(&mut self, node: WrapperId) -> ShadowResult<()> {
        let physical = self.unwrap(node)?;
        if self.kind(node)? == WrapperKind::ShadowRoot
            || self.parent_node(node).is_some()
            || self.tree.parent(physical).is_some()
        {
            return Err(ShadowError::HierarchyRequest);
        }
        let hosts_shadow = std::iter::once(physical)
            .chain(self.tree.descendants(physical))
            .any(|n| self.ext.get(n).is_some_and(|e| e.renderer_for_host.is_some()));
        if hosts_shadow {
            return Err(ShadowError::HierarchyRequest);
        }

        let released = self.tree.release(physical)?;
        let registry = self.registry.get_mut();
        for &id in &released {
            registry.release_node(id);
            self.ext.delete(id);
        }
        tracing::debug!(count = released.len(), "Released nodes");
        Ok(())
    }

    // --- Overlay edges ---

    /// Raw overlay state of one edge
    pub fn edge(&self, wrapper: WrapperId, relation: Relation) -> Edge {
        self.registry
            .borrow()
            .get(wrapper)
            .map_or(Edge::Deferred, |w| w.edge(relation))
    }

    /// Copy of the overlay record, `None` if never written
    pub fn relatives(&self, wrapper: WrapperId) -> Option<Relatives> {
        self.registry
            .borrow()
            .get(wrapper)
            .and_then(|w| w.relatives().copied())
    }

    pub(crate) fn set_relative(
        &mut self,
        wrapper: WrapperId,
        relation: Relation,
        value: Option<WrapperId>,
    ) {
        if let Some(relatives) = self.registry.get_mut().overlay_mut(wrapper) {
            relatives.set(relation, Edge::from(value));
        }
    }

    /// Revert an edge to deferred; never allocates an overlay
    pub(crate) fn clear_relative(&mut self, wrapper: WrapperId, relation: Relation) {
        if let Some(relatives) = self.registry.get_mut().existing_overlay_mut(wrapper) {
            relatives.set(relation, Edge::Deferred);
        }
    }

    pub(crate) fn has_overlays(&self) -> bool {
        self.registry.borrow().has_overlays()
    }

    // --- Logical navigation ---

    /// Logical value of one edge
    pub fn relative(&self, wrapper: WrapperId, relation: Relation) -> Option<WrapperId> {
        let (node, edge) = {
            let registry = self.registry.borrow();
            let w = registry.get(wrapper)?;
            (w.node(), w.edge(relation))
        };
        match edge {
            Edge::Node(id) => Some(id),
            Edge::None => None,
            Edge::Deferred => self.native_relative(node, relation),
        }
    }

    /// Physical value of one edge, wrapped
    pub(crate) fn native_relative(&self, node: NodeId, relation: Relation) -> Option<WrapperId> {
        let physical = match relation {
            Relation::Parent => self.tree.parent(node),
            Relation::FirstChild => self.tree.first_child(node),
            Relation::LastChild => self.tree.last_child(node),
            Relation::NextSibling => self.tree.next_sibling(node),
            Relation::PreviousSibling => self.tree.prev_sibling(node),
        }?;
        self.wrap(physical).ok()
    }

    pub fn parent_node(&self, node: WrapperId) -> Option<WrapperId> {
        self.relative(node, Relation::Parent)
    }

    pub fn first_child(&self, node: WrapperId) -> Option<WrapperId> {
        self.relative(node, Relation::FirstChild)
    }

    pub fn last_child(&self, node: WrapperId) -> Option<WrapperId> {
        self.relative(node, Relation::LastChild)
    }

    pub fn next_sibling(&self, node: WrapperId) -> Option<WrapperId> {
        self.relative(node, Relation::NextSibling)
    }

    pub fn previous_sibling(&self, node: WrapperId) -> Option<WrapperId> {
        self.relative(node, Relation::PreviousSibling)
    }

    /// Logical children in order
    pub fn child_nodes(&self, node: WrapperId) -> Vec<WrapperId> {
        let mut children = Vec::new();
        let mut child = self.first_child(node);
        while let Some(current) = child {
            children.push(current);
            child = self.next_sibling(current);
        }
        children
    }

    pub fn has_child_nodes(&self, node: WrapperId) -> bool {
        self.first_child(node).is_some()
    }

    /// Nearest logical ancestor that is an element
    pub fn parent_element(&self, node: WrapperId) -> Option<WrapperId> {
        let mut current = self.parent_node(node);
        while let Some(parent) = current {
            if self.kind(parent).is_ok_and(WrapperKind::is_element) {
                return Some(parent);
            }
            current = self.parent_node(parent);
        }
        None
    }

    /// Logical inclusive-ancestor test; `None` is never contained
    pub fn contains(&self, node: WrapperId, other: Option<WrapperId>) -> bool {
        let mut current = other;
        while let Some(candidate) = current {
            if candidate == node {
                return true;
            }
            current = self.parent_node(candidate);
        }
        false
    }

    /// Logical descendants in tree order, excluding `node`
    pub fn logical_descendants(&self, node: WrapperId) -> Vec<WrapperId> {
        let mut out = Vec::new();
        let mut stack: Vec<WrapperId> = self.child_nodes(node).into_iter().rev().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.child_nodes(current).into_iter().rev());
        }
        out
    }

    /// Root of the logical tree containing `node`
    pub fn logical_root(&self, node: WrapperId) -> WrapperId {
        let mut current = node;
        while let Some(parent) = self.parent_node(current) {
            current = parent;
        }
        current
    }

    /// Owner document; `None` for documents
    pub fn owner_document(&self, node: WrapperId) -> Option<WrapperId> {
        let owner = self.tree.owner_document(self.unwrap(node).ok()?)?;
        self.wrap(owner).ok()
    }

    // --- Content ---

    pub fn node_name(&self, node: WrapperId) -> Option<String> {
        let name = match self.kind(node).ok()? {
            WrapperKind::Element | WrapperKind::Content => {
                let physical = self.unwrap(node).ok()?;
                return self
                    .tree
                    .get(physical)?
                    .as_element()
                    .map(|elem| elem.name.to_ascii_uppercase());
            }
            WrapperKind::Text => "#text",
            WrapperKind::Comment => "#comment",
            WrapperKind::Document => "#document",
            WrapperKind::DocumentFragment | WrapperKind::ShadowRoot => "#document-fragment",
        };
        Some(name.to_string())
    }

    /// `textContent` over the logical tree; `None` for documents
    pub fn text_content(&self, node: WrapperId) -> Option<String> {
        let physical = self.unwrap(node).ok()?;
        match self.kind(node).ok()? {
            WrapperKind::Document => None,
            WrapperKind::Text | WrapperKind::Comment => self.tree.text_content(physical),
            _ => Some(
                self.logical_descendants(node)
                    .into_iter()
                    .filter(|&d| self.kind(d) == Ok(WrapperKind::Text))
                    .filter_map(|d| self.tree.text_content(self.unwrap(d).ok()?))
                    .collect(),
            ),
        }
    }

    pub fn get_attribute(&self, node: WrapperId, name: &str) -> Option<&str> {
        self.tree.get_attribute(self.unwrap(node).ok()?, name)
    }

    /// Set an attribute; changing `select` on an insertion point
    /// invalidates the composition it belongs to
    pub fn set_attribute(&mut self, node: WrapperId, name: &str, value: &str) -> ShadowResult<()> {
        let physical = self.unwrap(node)?;
        self.tree.set_attribute(physical, name, value)?;
        self.invalidate_for_attribute(node, name);
        Ok(())
    }

    pub fn remove_attribute(&mut self, node: WrapperId, name: &str) -> ShadowResult<Option<String>> {
        let physical = self.unwrap(node)?;
        let removed = self.tree.remove_attribute(physical, name)?;
        if removed.is_some() {
            self.invalidate_for_attribute(node, name);
        }
        Ok(removed)
    }

    fn invalidate_for_attribute(&mut self, node: WrapperId, name: &str) {
        if self.kind(node) == Ok(WrapperKind::Content) && name.eq_ignore_ascii_case("select") {
            self.invalidate_shadow_renderer(node);
        }
    }

    /// Position of `other` relative to `node` in the physical tree
    pub fn compare_document_position(
        &self,
        node: WrapperId,
        other: WrapperId,
    ) -> ShadowResult<DocumentPosition> {
        let reference = self.unwrap(node)?;
        let other = self.unwrap(other)?;
        Ok(self.tree.compare_document_position(reference, other)?)
    }
}

impl ShadowDom {
    /// Start or stop recording physical child-list mutations
    pub fn observe_mutations(&mut self, enabled: bool) {
        self.tree.observe_mutations(enabled);
    }

    /// Drain recorded physical mutations, oldest first
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        self.tree.take_records()
    }
}

impl Default for ShadowDom {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl fmt::Debug for ShadowDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShadowDom")
            .field("nodes", &self.tree.len())
            .field("wrappers", &self.wrapper_count())
            .field("pending", &self.scheduler.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_is_stable() {
        let mut dom = ShadowDom::default();
        let doc = dom.document();
        let div = dom.create_element(doc, "div").unwrap();
        let node = dom.unwrap(div).unwrap();

        assert_eq!(dom.wrap(node).unwrap(), div);
        assert_eq!(dom.lookup(node), Some(div));
        assert_eq!(dom.kind(div).unwrap(), WrapperKind::Element);
    }

    #[test]
    fn test_deferred_reads_allocate_nothing() {
        let mut dom = ShadowDom::default();
        let doc = dom.document();
        let parent = dom.create_element(doc, "div").unwrap();
        let child = dom.create_element(doc, "span").unwrap();
        dom.append_child(parent, child).unwrap();

        assert_eq!(dom.first_child(parent), Some(child));
        assert_eq!(dom.parent_node(child), Some(parent));
        assert!(dom.relatives(parent).is_none());
        assert!(dom.relatives(child).is_none());
        assert!(!dom.has_overlays());
    }

    #[test]
    fn test_unwrapped_neighbours_are_wrapped_on_read() {
        let mut dom = ShadowDom::default();
        let doc = dom.document();
        let div = dom.create_element(doc, "div").unwrap();
        let clone = dom.clone_node(div, false).unwrap();
        let before = dom.wrapper_count();

        dom.set_text_content(clone, "x").unwrap();
        let text = dom.first_child(clone).unwrap();
        assert_eq!(dom.kind(text).unwrap(), WrapperKind::Text);
        assert_eq!(dom.first_child(clone), Some(text));
        assert_eq!(dom.wrapper_count(), before + 1);
    }

    #[test]
    fn test_associate_rejects_wrapped_node() {
        let mut dom = ShadowDom::default();
        let doc = dom.document();
        let div = dom.create_element(doc, "div").unwrap();
        let node = dom.unwrap(div).unwrap();

        assert_eq!(
            dom.associate(node, WrapperKind::Element),
            Err(ShadowError::DuplicateAssociation)
        );
    }

    #[test]
    fn test_rebind_retires_old_wrapper() {
        let mut dom = ShadowDom::default();
        let doc = dom.document();
        let div = dom.create_element(doc, "div").unwrap();
        let node = dom.unwrap(div).unwrap();

        let replacement = dom.rebind(node, WrapperKind::Element).unwrap();
        assert_ne!(replacement, div);
        assert_eq!(dom.unwrap(div), Err(ShadowError::NotANode));
        assert_eq!(dom.wrap(node).unwrap(), replacement);
    }

    #[test]
    fn test_content_kind() {
        let mut dom = ShadowDom::default();
        let doc = dom.document();
        let content = dom.create_element(doc, "content").unwrap();
        assert_eq!(dom.kind(content).unwrap(), WrapperKind::Content);
        assert_eq!(dom.node_name(content).as_deref(), Some("CONTENT"));
    }

    #[test]
    fn test_release_node() {
        let mut dom = ShadowDom::default();
        let doc = dom.document();
        let div = dom.create_element(doc, "div").unwrap();
        let text = dom.create_text_node(doc, "x").unwrap();
        dom.append_child(div, text).unwrap();
        let node = dom.unwrap(div).unwrap();

        assert_eq!(
            dom.release_node(text),
            Err(ShadowError::HierarchyRequest)
        );
        dom.release_node(div).unwrap();
        assert_eq!(dom.unwrap(div), Err(ShadowError::NotANode));
        assert_eq!(dom.unwrap(text), Err(ShadowError::NotANode));
        assert_eq!(dom.lookup(node), None);
        assert_eq!(dom.wrap(node), Err(ShadowError::NotANode));
    }

    #[test]
    fn test_parent_element_skips_fragments() {
        let mut dom = ShadowDom::default();
        let doc = dom.document();
        let frag = dom.create_document_fragment(doc).unwrap();
        let span = dom.create_element(doc, "span").unwrap();
        dom.append_child(frag, span).unwrap();
        assert_eq!(dom.parent_node(span), Some(frag));
        assert_eq!(dom.parent_element(span), None);
    }

    #[test]
    fn test_contains() {
        let mut dom = ShadowDom::default();
        let doc = dom.document();
        let outer = dom.create_element(doc, "div").unwrap();
        let inner = dom.create_element(doc, "p").unwrap();
        dom.append_child(outer, inner).unwrap();

        assert!(dom.contains(outer, Some(inner)));
        assert!(dom.contains(outer, Some(outer)));
        assert!(!dom.contains(inner, Some(outer)));
        assert!(!dom.contains(outer, None));
    }
}
