//! Moving nodes between documents
//!
//! Adoption follows the logical tree, and the shadow roots of every host in
//! it, rather than the physical subtree: after composition the two differ
//! and the physical one would miss undistributed and fallback content.

use fos_dom::NodeId;

use crate::{ShadowDom, ShadowResult, WrapperId};

impl ShadowDom {
    /// Adopt `child` into `parent`'s document if they differ
    ///
    /// Used before pass-through mutations; `child` is not detached.
    pub fn ensure_same_owner_document(
        &mut self,
        parent: WrapperId,
        child: WrapperId,
    ) -> ShadowResult<()> {
        let document = self.document_of(parent)?;
        if self.document_of(child)? != document {
            self.adopt_subtree(child, document)?;
        }
        Ok(())
    }

    /// Adopt already-detached `nodes` into `owner`'s document
    ///
    /// All of `nodes` share one owner document, so checking the first is
    /// enough.
    pub(crate) fn adopt_nodes_if_needed(
        &mut self,
        owner: WrapperId,
        nodes: &[WrapperId],
    ) -> ShadowResult<()> {
        let Some(&first) = nodes.first() else {
            return Ok(());
        };
        let document = self.document_of(owner)?;
        if self.document_of(first)? == document {
            return Ok(());
        }
        for &node in nodes {
            self.adopt_subtree(node, document)?;
        }
        Ok(())
    }

    fn adopt_subtree(&mut self, node: WrapperId, document: NodeId) -> ShadowResult<()> {
        tracing::debug!(?node, ?document, "Adopting subtree");
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let physical = self.unwrap(current)?;
            self.tree.set_owner_document(physical, document)?;
            stack.extend(self.child_nodes(current));

            if self.is_host(current) {
                let mut root = self.shadow_root(current);
                while let Some(shadow) = root {
                    stack.push(shadow);
                    root = self.older_shadow_root(shadow);
                }
                self.invalidate_shadow_renderer(current);
            }
        }
        Ok(())
    }

    /// Document a node belongs to (itself for documents)
    pub(crate) fn document_of(&self, node: WrapperId) -> ShadowResult<NodeId> {
        Ok(self.tree.node_document(self.unwrap(node)?)?)
    }
}
