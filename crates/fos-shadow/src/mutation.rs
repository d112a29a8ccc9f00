//! Logical tree mutation
//!
//! Every mutation first decides whether any node involved takes part in a
//! shadow composition. If not, the physical tree is the logical tree: the
//! operation is applied physically and the overlay edges of the touched
//! nodes are cleared back to deferred. Otherwise the overlay is rewritten to
//! the new logical shape and the physical tree is patched where the nodes
//! physically are; the next render fixes up the composed shape.
//!
//! Validation always runs before anything changes, so a failed call leaves
//! both trees untouched.

use fos_dom::{DomResult, DomTree, NodeId};

use crate::relatives::Relation;
use crate::wrapper::WrapperKind;
use crate::{ShadowDom, ShadowError, ShadowResult, WrapperId};

impl ShadowDom {
    /// Append `child` (or a fragment's children) to `parent`
    pub fn append_child(&mut self, parent: WrapperId, child: WrapperId) -> ShadowResult<WrapperId> {
        let parent_node = self.unwrap(parent)?;
        let child_node = self.unwrap(child)?;
        self.check_insertion(parent, child, Some(parent_node))?;

        if !self.needs_overlay(parent, child) {
            self.ensure_same_owner_document(parent, child)?;
            self.pass_through(parent_node, child_node, |tree| {
                tree.append_child(parent_node, child_node)
            })?;
            return Ok(child);
        }

        tracing::trace!(?parent, ?child, "appendChild through overlay");
        let moved = self.collect_for_insertion(child)?;
        if moved.is_empty() {
            return Ok(child);
        }
        let previous = self.last_child(parent);
        self.link_nodes(&moved, parent, previous, None);
        if previous.is_none() {
            self.set_relative(parent, Relation::FirstChild, moved.first().copied());
        }
        self.set_relative(parent, Relation::LastChild, moved.last().copied());

        let insertion = self.unwrap_nodes_for_insertion(parent, &moved)?;
        self.tree.append_child(parent_node, insertion)?;
        self.release_grouping(insertion, &moved)?;
        Ok(child)
    }

    /// Insert `child` before `reference`; appends when `reference` is `None`
    pub fn insert_before(
        &mut self,
        parent: WrapperId,
        child: WrapperId,
        reference: Option<WrapperId>,
    ) -> ShadowResult<WrapperId> {
        let Some(reference) = reference else {
            return self.append_child(parent, child);
        };
        let parent_node = self.unwrap(parent)?;
        let child_node = self.unwrap(child)?;
        let reference_node = self.unwrap(reference)?;
        if self.parent_node(reference) != Some(parent) {
            return Err(ShadowError::NotFound);
        }
        self.check_insertion(parent, child, self.tree.parent(reference_node))?;
        if reference == child {
            return Ok(child);
        }

        if !self.needs_overlay(parent, child) {
            self.ensure_same_owner_document(parent, child)?;
            self.pass_through(parent_node, child_node, |tree| {
                tree.insert_before(parent_node, child_node, Some(reference_node))
            })?;
            return Ok(child);
        }

        tracing::trace!(?parent, ?child, ?reference, "insertBefore through overlay");
        let moved = self.collect_for_insertion(child)?;
        if moved.is_empty() {
            return Ok(child);
        }
        let previous = self.previous_sibling(reference);
        let first = self.first_child(parent);
        self.link_nodes(&moved, parent, previous, Some(reference));
        if first == Some(reference) {
            self.set_relative(parent, Relation::FirstChild, moved.first().copied());
        }

        match self.tree.parent(reference_node) {
            Some(physical_parent) => {
                let insertion = self.unwrap_nodes_for_insertion(parent, &moved)?;
                self.tree
                    .insert_before(physical_parent, insertion, Some(reference_node))?;
                self.release_grouping(insertion, &moved)?;
            }
            // Reference is not rendered; the moved nodes wait for the next render
            None => self.adopt_nodes_if_needed(parent, &moved)?,
        }
        Ok(child)
    }

    /// Remove `child` from `parent`
    pub fn remove_child(&mut self, parent: WrapperId, child: WrapperId) -> ShadowResult<WrapperId> {
        let parent_node = self.unwrap(parent)?;
        let child_node = self.unwrap(child)?;
        if self.parent_node(child) != Some(parent) {
            return Err(ShadowError::NotFound);
        }

        if !self.invalidate_shadow_renderer(parent) {
            self.tree.remove_child(parent_node, child_node)?;
            self.resync_children(parent_node);
            self.resync_node(child_node);
            return Ok(child);
        }

        tracing::trace!(?parent, ?child, "removeChild through overlay");
        let first = self.first_child(parent);
        let last = self.last_child(parent);
        let next = self.next_sibling(child);
        let previous = self.previous_sibling(child);

        if let Some(physical_parent) = self.tree.parent(child_node) {
            self.tree.remove_child(physical_parent, child_node)?;
        }

        if first == Some(child) {
            self.set_relative(parent, Relation::FirstChild, next);
        }
        if last == Some(child) {
            self.set_relative(parent, Relation::LastChild, previous);
        }
        if let Some(previous) = previous {
            self.set_relative(previous, Relation::NextSibling, next);
        }
        if let Some(next) = next {
            self.set_relative(next, Relation::PreviousSibling, previous);
        }
        self.detach_edges(child);
        self.restore_physical_shape(child)?;
        Ok(child)
    }

    /// Replace `old_child` of `parent` with `new_child`
    ///
    /// Returns `old_child`.
    pub fn replace_child(
        &mut self,
        parent: WrapperId,
        new_child: WrapperId,
        old_child: WrapperId,
    ) -> ShadowResult<WrapperId> {
        let parent_node = self.unwrap(parent)?;
        let new_node = self.unwrap(new_child)?;
        let old_node = self.unwrap(old_child)?;
        if self.parent_node(old_child) != Some(parent) {
            return Err(ShadowError::NotFound);
        }
        self.check_insertion(parent, new_child, self.tree.parent(old_node))?;
        if new_child == old_child {
            return Ok(old_child);
        }

        if !self.needs_overlay(parent, new_child) {
            self.ensure_same_owner_document(parent, new_child)?;
            self.pass_through(parent_node, new_node, |tree| {
                tree.replace_child(parent_node, new_node, old_node)
            })?;
            self.resync_node(old_node);
            return Ok(old_child);
        }

        tracing::trace!(?parent, ?new_child, ?old_child, "replaceChild through overlay");
        let moved = self.collect_for_insertion(new_child)?;
        let previous = self.previous_sibling(old_child);
        let next = self.next_sibling(old_child);
        let first = self.first_child(parent);
        let last = self.last_child(parent);

        self.link_nodes(&moved, parent, previous, next);
        if first == Some(old_child) {
            self.set_relative(parent, Relation::FirstChild, moved.first().copied().or(next));
        }
        if last == Some(old_child) {
            self.set_relative(parent, Relation::LastChild, moved.last().copied().or(previous));
        }
        self.detach_edges(old_child);

        match self.tree.parent(old_node) {
            Some(physical_parent) if !moved.is_empty() => {
                let insertion = self.unwrap_nodes_for_insertion(parent, &moved)?;
                self.tree.replace_child(physical_parent, insertion, old_node)?;
                self.release_grouping(insertion, &moved)?;
            }
            Some(physical_parent) => {
                self.tree.remove_child(physical_parent, old_node)?;
            }
            None => self.adopt_nodes_if_needed(parent, &moved)?,
        }
        self.restore_physical_shape(old_child)?;
        Ok(old_child)
    }

    /// Clone `node`; a deep clone follows the logical tree
    pub fn clone_node(&mut self, node: WrapperId, deep: bool) -> ShadowResult<WrapperId> {
        let physical = self.unwrap(node)?;
        if !self.invalidate_shadow_renderer(node) {
            let clone = self.tree.clone_node(physical, deep)?;
            return self.wrap(clone);
        }

        let clone = self.tree.clone_node(physical, false)?;
        let clone = self.wrap(clone)?;
        if deep {
            for child in self.child_nodes(node) {
                let child_clone = self.clone_node(child, true)?;
                self.append_child(clone, child_clone)?;
            }
        }
        Ok(clone)
    }

    /// Set `textContent`
    ///
    /// Replaces all children of a container with a single text node (none
    /// for the empty string); sets the data of text and comment nodes.
    /// Documents ignore it.
    pub fn set_text_content(&mut self, node: WrapperId, text: &str) -> ShadowResult<()> {
        let physical = self.unwrap(node)?;
        match self.kind(node)? {
            WrapperKind::Text | WrapperKind::Comment => {
                self.tree.set_text_content(physical, text)?;
                return Ok(());
            }
            WrapperKind::Document => return Ok(()),
            _ => {}
        }

        if !self.invalidate_shadow_renderer(node) {
            let children = self.tree.child_ids(physical);
            self.tree.set_text_content(physical, text)?;
            for child in children {
                self.resync_node(child);
            }
            self.resync_children(physical);
            return Ok(());
        }

        self.remove_all_child_nodes(node)?;
        if !text.is_empty() {
            let document = self.tree.node_document(physical)?;
            let text_node = self.tree.create_text(document, text)?;
            let text_node = self.wrap(text_node)?;
            self.append_child(node, text_node)?;
        }
        Ok(())
    }

    // --- Helpers ---

    fn check_insertion(
        &self,
        parent: WrapperId,
        child: WrapperId,
        physical_target: Option<NodeId>,
    ) -> ShadowResult<()> {
        if !self.kind(parent)?.can_have_children() {
            return Err(ShadowError::HierarchyRequest);
        }
        let child_kind = self.kind(child)?;
        if child_kind == WrapperKind::Document || self.contains(child, Some(parent)) {
            return Err(ShadowError::HierarchyRequest);
        }
        let Some(target) = physical_target else {
            return Ok(());
        };
        let moved = if child_kind.is_fragment() {
            self.child_nodes(child)
        } else {
            vec![child]
        };
        for node in moved {
            if self.tree.is_inclusive_ancestor(self.unwrap(node)?, target) {
                return Err(ShadowError::HierarchyRequest);
            }
        }
        Ok(())
    }

    /// Whether a mutation inserting `child` into `parent` must use the overlay
    ///
    /// Invalidates the composition that makes it so.
    fn needs_overlay(&mut self, parent: WrapperId, child: WrapperId) -> bool {
        if self.invalidate_shadow_renderer(parent) {
            return true;
        }
        if let Some(old_parent) = self.parent_node(child) {
            if self.invalidate_shadow_renderer(old_parent) {
                return true;
            }
        }
        self.kind(child).is_ok_and(WrapperKind::is_fragment) && self.invalidate_shadow_renderer(child)
    }

    /// Detach what an insertion of `child` moves, in order
    fn collect_for_insertion(&mut self, child: WrapperId) -> ShadowResult<Vec<WrapperId>> {
        if self.kind(child)?.is_fragment() {
            let mut nodes = Vec::new();
            while let Some(first) = self.first_child(child) {
                self.remove_child(child, first)?;
                nodes.push(first);
            }
            return Ok(nodes);
        }
        if let Some(old_parent) = self.parent_node(child) {
            self.remove_child(old_parent, child)?;
        }
        Ok(vec![child])
    }

    /// Point the edges of `nodes` at `parent` and at each other, and splice
    /// them between `previous` and `next`
    fn link_nodes(
        &mut self,
        nodes: &[WrapperId],
        parent: WrapperId,
        previous: Option<WrapperId>,
        next: Option<WrapperId>,
    ) {
        for (i, &node) in nodes.iter().enumerate() {
            let before = if i == 0 { previous } else { Some(nodes[i - 1]) };
            let after = nodes.get(i + 1).copied().or(next);
            self.set_relative(node, Relation::Parent, Some(parent));
            self.set_relative(node, Relation::PreviousSibling, before);
            self.set_relative(node, Relation::NextSibling, after);
        }
        if let Some(previous) = previous {
            self.set_relative(previous, Relation::NextSibling, nodes.first().copied().or(next));
        }
        if let Some(next) = next {
            self.set_relative(next, Relation::PreviousSibling, nodes.last().copied().or(previous));
        }
    }

    /// Pin a removed node's own edges to "no node"
    fn detach_edges(&mut self, node: WrapperId) {
        self.set_relative(node, Relation::PreviousSibling, None);
        self.set_relative(node, Relation::NextSibling, None);
        self.set_relative(node, Relation::Parent, None);
    }

    /// The single physical node to insert for `nodes`
    ///
    /// Several nodes are grouped under a temporary fragment, released again
    /// by [`release_grouping`](Self::release_grouping).
    fn unwrap_nodes_for_insertion(
        &mut self,
        owner: WrapperId,
        nodes: &[WrapperId],
    ) -> ShadowResult<NodeId> {
        self.adopt_nodes_if_needed(owner, nodes)?;
        if let [single] = nodes {
            return self.unwrap(*single);
        }
        let document = self.document_of(owner)?;
        let grouping = self.tree.create_document_fragment(document)?;
        for &node in nodes {
            let physical = self.unwrap(node)?;
            self.tree.append_child(grouping, physical)?;
        }
        Ok(grouping)
    }

    fn release_grouping(&mut self, insertion: NodeId, nodes: &[WrapperId]) -> ShadowResult<()> {
        if nodes.len() > 1 {
            self.tree.release(insertion)?;
        }
        Ok(())
    }

    /// Logically empty `parent`, detaching each child physically first
    fn remove_all_child_nodes(&mut self, parent: WrapperId) -> ShadowResult<()> {
        let mut child = self.first_child(parent);
        while let Some(current) = child {
            child = self.next_sibling(current);
            let physical = self.unwrap(current)?;
            if let Some(physical_parent) = self.tree.parent(physical) {
                self.tree.remove_child(physical_parent, physical)?;
            }
            self.detach_edges(current);
            self.restore_physical_shape(current)?;
        }
        self.set_relative(parent, Relation::FirstChild, None);
        self.set_relative(parent, Relation::LastChild, None);
        Ok(())
    }

    /// Rebuild the physical children of a subtree that just left the
    /// logical tree of a composition
    ///
    /// Rendering may have moved distributed or fallback nodes into the
    /// subtree and its own children elsewhere. Afterwards its physical and
    /// logical shapes agree, so later pass-through mutations see the right
    /// children. Nested hosts keep their own composition.
    fn restore_physical_shape(&mut self, node: WrapperId) -> ShadowResult<()> {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if self.is_host(current) {
                continue;
            }
            if self.kind(current)? == WrapperKind::Content {
                self.set_distributed_nodes(current, Vec::new())?;
            }
            let children = self.child_nodes(current);
            if self.compose_children(current, &children)? {
                tracing::trace!(node = ?current, "restored physical children");
            }
            stack.extend(children);
        }
        Ok(())
    }

    /// Run a physical mutation on non-participating nodes, then drop any
    /// stale overlay edges around it
    fn pass_through<F>(&mut self, parent_node: NodeId, child_node: NodeId, op: F) -> ShadowResult<()>
    where
        F: FnOnce(&mut DomTree) -> DomResult<NodeId>,
    {
        let old_parent = self.tree.parent(child_node);
        let is_fragment = self.tree.get(child_node).is_some_and(|n| n.is_fragment());
        op(&mut self.tree)?;
        if let Some(old_parent) = old_parent {
            self.resync_children(old_parent);
        }
        if is_fragment {
            self.resync_children(child_node);
        }
        self.resync_children(parent_node);
        Ok(())
    }

    /// Clear `node`'s first/last edges and its children's parent/sibling
    /// edges back to deferred
    fn resync_children(&mut self, node: NodeId) {
        if !self.has_overlays() {
            return;
        }
        if let Some(wrapper) = self.lookup(node) {
            self.clear_relative(wrapper, Relation::FirstChild);
            self.clear_relative(wrapper, Relation::LastChild);
        }
        for child in self.tree.child_ids(node) {
            self.resync_node(child);
        }
    }

    fn resync_node(&mut self, node: NodeId) {
        if let Some(wrapper) = self.lookup(node) {
            self.clear_relative(wrapper, Relation::Parent);
            self.clear_relative(wrapper, Relation::PreviousSibling);
            self.clear_relative(wrapper, Relation::NextSibling);
        }
    }
}
