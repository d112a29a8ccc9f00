//! DOM Tree (arena-based allocation)
//!
//! Released slots go back on a free list and have their generation bumped,
//! so outstanding ids to the old node stop resolving instead of aliasing the
//! next node stored there.

use crate::{
    DocumentData, DocumentPosition, DomError, DomResult, ElementData, Generation, MutationRecord,
    Node, NodeData, NodeId, TextData,
};

#[derive(Debug)]
struct Slot {
    generation: Generation,
    node: Option<Node>,
}

/// Arena-based DOM tree holding any number of documents
#[derive(Debug, Default)]
pub struct DomTree {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    live: usize,
    observing: bool,
    records: Vec<MutationRecord>,
}

impl DomTree {
    /// Create a new empty DOM tree
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId { index, generation: slot.generation }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: Generation::INITIAL,
                node: Some(node),
            });
            NodeId { index, generation: Generation::INITIAL }
        }
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::StaleNode)
    }

    fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.get_mut(id).ok_or(DomError::StaleNode)
    }

    /// Check if `id` refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes in the tree
    pub fn len(&self) -> usize {
        self.live
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    // --- Creation ---

    /// Create a new, empty document
    pub fn create_document(&mut self, url: &str) -> NodeId {
        let data = NodeData::Document(DocumentData { url: url.to_string() });
        self.alloc(Node::new(data, NodeId::NONE))
    }

    /// Create a detached element owned by `document`
    pub fn create_element(&mut self, document: NodeId, name: &str) -> DomResult<NodeId> {
        self.check_document(document)?;
        Ok(self.alloc(Node::new(NodeData::Element(ElementData::new(name)), document)))
    }

    /// Create a detached text node owned by `document`
    pub fn create_text(&mut self, document: NodeId, content: &str) -> DomResult<NodeId> {
        self.check_document(document)?;
        let data = NodeData::Text(TextData { content: content.to_string() });
        Ok(self.alloc(Node::new(data, document)))
    }

    /// Create a detached comment owned by `document`
    pub fn create_comment(&mut self, document: NodeId, content: &str) -> DomResult<NodeId> {
        self.check_document(document)?;
        Ok(self.alloc(Node::new(NodeData::Comment(content.to_string()), document)))
    }

    /// Create an empty fragment owned by `document`
    pub fn create_document_fragment(&mut self, document: NodeId) -> DomResult<NodeId> {
        self.check_document(document)?;
        Ok(self.alloc(Node::new(NodeData::DocumentFragment, document)))
    }

    fn check_document(&self, id: NodeId) -> DomResult<()> {
        if self.node(id)?.is_document() {
            Ok(())
        } else {
            Err(DomError::InvalidNodeType)
        }
    }

    // --- Navigation ---

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent.to_option()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.first_child.to_option()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.last_child.to_option()
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.next_sibling.to_option()
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.prev_sibling.to_option()
    }

    /// Owning document; `None` for documents and released nodes
    pub fn owner_document(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.owner_document.to_option()
    }

    /// The document a node belongs to, which is the node itself for documents
    pub fn node_document(&self, id: NodeId) -> DomResult<NodeId> {
        let node = self.node(id)?;
        Ok(if node.is_document() { id } else { node.owner_document })
    }

    /// Iterate over the children of a node
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.get(id).map(|n| n.first_child).unwrap_or(NodeId::NONE),
        }
    }

    /// Collect the children of a node
    pub fn child_ids(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).map(|(child, _)| child).collect()
    }

    /// Pre-order iteration over the descendants of a node (excluding itself)
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            root: id,
            current: id,
        }
    }

    /// Check if `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Root of the tree containing `id`
    pub fn root_of(&self, id: NodeId) -> NodeId {
        let mut root = id;
        while let Some(parent) = self.parent(root) {
            root = parent;
        }
        root
    }

    // --- Mutation ---

    /// Append a child node
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.insert_before(parent, child, None)
    }

    /// Insert before a reference node (append when `reference` is `None`)
    ///
    /// A fragment argument moves its children and stays empty.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<NodeId> {
        self.validate_insertion(parent, child)?;
        if let Some(r) = reference {
            self.node(r)?;
            if self.parent(r) != Some(parent) {
                return Err(DomError::NotAChild);
            }
        }
        let reference = if reference == Some(child) {
            self.next_sibling(child)
        } else {
            reference
        };

        let nodes = if self.node(child)?.is_fragment() {
            let nodes = self.child_ids(child);
            if !nodes.is_empty() {
                self.record(MutationRecord::child_list(child, Vec::new(), nodes.clone(), None, None));
            }
            for &node in &nodes {
                self.unlink(node);
            }
            nodes
        } else {
            if let Some(old_parent) = self.parent(child) {
                self.detach(old_parent, child);
            }
            vec![child]
        };
        if nodes.is_empty() {
            return Ok(child);
        }

        for &node in &nodes {
            self.link(parent, node, reference);
        }
        let previous = self.prev_sibling(nodes[0]);
        self.record(MutationRecord::child_list(parent, nodes, Vec::new(), previous, reference));
        Ok(child)
    }

    /// Remove a child node
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.node(parent)?;
        self.node(child)?;
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotAChild);
        }
        self.detach(parent, child);
        Ok(child)
    }

    /// Replace `old_child` with `new_child`, returning `old_child`
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> DomResult<NodeId> {
        self.node(old_child)?;
        if self.parent(old_child) != Some(parent) {
            return Err(DomError::NotAChild);
        }
        self.validate_insertion(parent, new_child)?;
        if new_child == old_child {
            return Ok(old_child);
        }

        let mut reference = self.next_sibling(old_child);
        if reference == Some(new_child) {
            reference = self.next_sibling(new_child);
        }
        self.detach(parent, old_child);
        self.insert_before(parent, new_child, reference)?;
        Ok(old_child)
    }

    fn validate_insertion(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        if !self.node(parent)?.can_have_children() {
            return Err(DomError::HierarchyRequest);
        }
        if self.node(child)?.is_document() || self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest);
        }
        if self.node_document(parent)? != self.node_document(child)? {
            return Err(DomError::WrongDocument);
        }
        Ok(())
    }

    /// Record a removal, then unlink
    fn detach(&mut self, parent: NodeId, child: NodeId) {
        let previous = self.prev_sibling(child);
        let next = self.next_sibling(child);
        self.record(MutationRecord::child_list(parent, Vec::new(), vec![child], previous, next));
        self.unlink(child);
    }

    /// Link a detached `child` into `parent` before `reference` (append when `None`)
    fn link(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        let prev = match reference {
            Some(r) => self.get(r).map(|n| n.prev_sibling).unwrap_or(NodeId::NONE),
            None => self.get(parent).map(|n| n.last_child).unwrap_or(NodeId::NONE),
        };
        let next = reference.unwrap_or(NodeId::NONE);

        if let Some(node) = self.get_mut(child) {
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = next;
        }
        match self.get_mut(prev) {
            Some(p) => p.next_sibling = child,
            None => {
                if let Some(p) = self.get_mut(parent) {
                    p.first_child = child;
                }
            }
        }
        match self.get_mut(next) {
            Some(n) => n.prev_sibling = child,
            None => {
                if let Some(p) = self.get_mut(parent) {
                    p.last_child = child;
                }
            }
        }
    }

    fn unlink(&mut self, child: NodeId) {
        let (parent, prev, next) = match self.get(child) {
            Some(n) => (n.parent, n.prev_sibling, n.next_sibling),
            None => return,
        };
        if !parent.is_valid() {
            return;
        }
        match self.get_mut(prev) {
            Some(p) => p.next_sibling = next,
            None => {
                if let Some(p) = self.get_mut(parent) {
                    p.first_child = next;
                }
            }
        }
        match self.get_mut(next) {
            Some(n) => n.prev_sibling = prev,
            None => {
                if let Some(p) = self.get_mut(parent) {
                    p.last_child = prev;
                }
            }
        }
        if let Some(node) = self.get_mut(child) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
    }

    /// Clone a node into a detached copy owned by the same document
    pub fn clone_node(&mut self, id: NodeId, deep: bool) -> DomResult<NodeId> {
        let (data, owner) = {
            let node = self.node(id)?;
            (node.data.clone(), node.owner_document)
        };
        let clone = self.alloc(Node::new(data, owner));
        if deep {
            for child in self.child_ids(id) {
                let child_clone = self.clone_node(child, true)?;
                self.link(clone, child_clone, None);
            }
        }
        Ok(clone)
    }

    /// Move `node` (and its subtree) into `document`, detaching it first
    pub fn adopt_node(&mut self, document: NodeId, node: NodeId) -> DomResult<NodeId> {
        self.check_document(document)?;
        if self.node(node)?.is_document() {
            return Err(DomError::InvalidNodeType);
        }
        if let Some(parent) = self.parent(node) {
            self.detach(parent, node);
        }
        let subtree: Vec<NodeId> = std::iter::once(node).chain(self.descendants(node)).collect();
        for id in subtree {
            if let Some(n) = self.get_mut(id) {
                n.owner_document = document;
            }
        }
        Ok(node)
    }

    /// Re-own a single node without touching its position or subtree
    pub fn set_owner_document(&mut self, node: NodeId, document: NodeId) -> DomResult<()> {
        self.check_document(document)?;
        let n = self.node_mut(node)?;
        if n.is_document() {
            return Err(DomError::InvalidNodeType);
        }
        n.owner_document = document;
        Ok(())
    }

    /// Free a detached node and its subtree
    ///
    /// Returns every released id; none of them resolve afterwards.
    pub fn release(&mut self, id: NodeId) -> DomResult<Vec<NodeId>> {
        self.node(id)?;
        if self.parent(id).is_some() {
            return Err(DomError::HierarchyRequest);
        }
        let released: Vec<NodeId> = std::iter::once(id).chain(self.descendants(id)).collect();
        for &node in &released {
            if let Some(slot) = self.slots.get_mut(node.index()) {
                slot.node = None;
                slot.generation = slot.generation.next();
                self.free_list.push(node.index);
                self.live -= 1;
            }
        }
        tracing::trace!(count = released.len(), "released subtree");
        Ok(released)
    }

    // --- Content ---

    /// `textContent`; `None` for documents
    pub fn text_content(&self, id: NodeId) -> Option<String> {
        match &self.get(id)?.data {
            NodeData::Document(_) => None,
            NodeData::Text(t) => Some(t.content.clone()),
            NodeData::Comment(c) => Some(c.clone()),
            NodeData::Element(_) | NodeData::DocumentFragment => Some(
                self.descendants(id)
                    .filter_map(|d| self.get(d)?.as_text())
                    .collect(),
            ),
        }
    }

    /// Set `textContent`: replaces character data, or all children with one text node
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> DomResult<()> {
        let is_container = match &mut self.node_mut(id)?.data {
            NodeData::Document(_) => return Ok(()),
            NodeData::Text(t) => {
                t.content = text.to_string();
                false
            }
            NodeData::Comment(c) => {
                *c = text.to_string();
                false
            }
            NodeData::Element(_) | NodeData::DocumentFragment => true,
        };
        if !is_container {
            self.record(MutationRecord::character_data(id));
            return Ok(());
        }

        for child in self.child_ids(id) {
            self.detach(id, child);
        }
        if !text.is_empty() {
            let document = self.node_document(id)?;
            let node = self.create_text(document, text)?;
            self.link(id, node, None);
            self.record(MutationRecord::child_list(id, vec![node], Vec::new(), None, None));
        }
        Ok(())
    }

    /// Get an attribute value of an element
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id)?.as_element()?.get_attr(name)
    }

    /// Set an attribute on an element
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        self.node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType)?
            .set_attr(name, value);
        Ok(())
    }

    /// Remove an attribute from an element
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> DomResult<Option<String>> {
        Ok(self
            .node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType)?
            .remove_attr(name))
    }

    /// Position of `other` relative to `reference`
    pub fn compare_document_position(
        &self,
        reference: NodeId,
        other: NodeId,
    ) -> DomResult<DocumentPosition> {
        self.node(reference)?;
        self.node(other)?;
        if reference == other {
            return Ok(DocumentPosition::empty());
        }

        let reference_chain = self.ancestor_chain(reference);
        let other_chain = self.ancestor_chain(other);
        if reference_chain[0] != other_chain[0] {
            // Arbitrary but consistent ordering between disconnected trees
            let direction = if other.index < reference.index {
                DocumentPosition::PRECEDING
            } else {
                DocumentPosition::FOLLOWING
            };
            return Ok(DocumentPosition::DISCONNECTED
                | DocumentPosition::IMPLEMENTATION_SPECIFIC
                | direction);
        }
        if self.is_inclusive_ancestor(other, reference) {
            return Ok(DocumentPosition::CONTAINS | DocumentPosition::PRECEDING);
        }
        if self.is_inclusive_ancestor(reference, other) {
            return Ok(DocumentPosition::CONTAINED_BY | DocumentPosition::FOLLOWING);
        }

        let mut depth = 0;
        while reference_chain[depth] == other_chain[depth] {
            depth += 1;
        }
        let other_branch = other_chain[depth];
        let mut sibling = self.next_sibling(reference_chain[depth]);
        while let Some(id) = sibling {
            if id == other_branch {
                return Ok(DocumentPosition::FOLLOWING);
            }
            sibling = self.next_sibling(id);
        }
        Ok(DocumentPosition::PRECEDING)
    }

    /// Root-first chain of ancestors ending with `id`
    fn ancestor_chain(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }

    // --- Mutation records ---

    /// Start or stop collecting mutation records
    pub fn observe_mutations(&mut self, enabled: bool) {
        self.observing = enabled;
        if !enabled {
            self.records.clear();
        }
    }

    /// Drain collected mutation records
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }

    fn record(&mut self, record: MutationRecord) {
        if self.observing {
            self.records.push(record);
        }
    }
}

/// Iterator over the children of a node
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next;
        let node = self.tree.get(id)?;
        self.next = node.next_sibling;
        Some((id, node))
    }
}

/// Pre-order iterator over the descendants of a node
pub struct Descendants<'a> {
    tree: &'a DomTree,
    root: NodeId,
    current: NodeId,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let tree = self.tree;
        if let Some(child) = tree.first_child(self.current) {
            self.current = child;
            return Some(child);
        }
        let mut node = self.current;
        while node != self.root {
            if let Some(next) = tree.next_sibling(node) {
                self.current = next;
                return Some(next);
            }
            node = tree.parent(node)?;
        }
        // Exhausted: park on a leaf so later calls keep returning None
        self.current = NodeId::NONE;
        None
    }
}
