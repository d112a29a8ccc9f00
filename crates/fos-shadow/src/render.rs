//! Render scheduling and composed-tree writes
//!
//! Mutations never recompute a composition inline. They mark the owning
//! host dirty and queue it; [`ShadowDom::render_all_pending`] drains the
//! queue through the installed [`Distributor`]. A distributor rewrites
//! physical children only through [`ShadowDom::compose_children`], which
//! pins every logical edge that the rewrite would otherwise change.

use std::collections::VecDeque;

use fos_dom::NodeId;

use crate::ext_data::HostRenderer;
use crate::relatives::Relation;
use crate::wrapper::WrapperKind;
use crate::{ShadowDom, ShadowError, ShadowResult, WrapperId};

/// Computes distribution and the composed tree for one host
pub trait Distributor {
    /// Called for every dirty `host` during a flush
    fn distribute(&mut self, dom: &mut ShadowDom, host: WrapperId) -> ShadowResult<()>;
}

/// Queue of dirty hosts
#[derive(Debug, Default)]
pub(crate) struct RenderScheduler {
    pending: VecDeque<WrapperId>,
}

impl RenderScheduler {
    fn schedule(&mut self, host: WrapperId) {
        self.pending.push_back(host);
    }

    fn take_pending(&mut self) -> Vec<WrapperId> {
        self.pending.drain(..).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}

impl ShadowDom {
    /// Mark the composition `node` takes part in as stale
    ///
    /// Returns true when `node` is a shadow host, a shadow root, or a
    /// logical descendant of a shadow root. Only then does a mutation
    /// touching it have to go through the overlay.
    pub fn invalidate_shadow_renderer(&mut self, node: WrapperId) -> bool {
        let Some(host) = self.renderer_host(node) else {
            return false;
        };
        let Ok(host_node) = self.unwrap(host) else {
            return false;
        };
        let Some(renderer) = self
            .ext
            .get_mut(host_node)
            .and_then(|ext| ext.renderer_for_host.as_mut())
        else {
            return false;
        };
        if !renderer.dirty {
            renderer.dirty = true;
            self.scheduler.schedule(host);
            tracing::trace!(?host, "scheduled render");
        }
        true
    }

    /// Host whose composition `node` participates in
    fn renderer_host(&self, node: WrapperId) -> Option<WrapperId> {
        if self.is_host(node) {
            return Some(node);
        }
        let mut current = node;
        loop {
            if self.kind(current).ok()? == WrapperKind::ShadowRoot {
                return self.host(current);
            }
            current = self.parent_node(current)?;
        }
    }

    pub(crate) fn renderer(&self, host: WrapperId) -> Option<HostRenderer> {
        self.extension(host)?.renderer_for_host
    }

    /// True when a composition is waiting to be rendered
    pub fn has_pending_renders(&self) -> bool {
        self.scheduler.len() > 0
    }

    /// Flush every dirty host through the distributor
    ///
    /// Hosts invalidated while rendering are picked up in a further pass,
    /// up to `max_render_passes`.
    pub fn render_all_pending(&mut self) -> ShadowResult<()> {
        let mut distributor = self.distributor.take();
        let result = self.flush_pending(&mut distributor);
        self.distributor = distributor;
        result
    }

    fn flush_pending(&mut self, distributor: &mut Option<Box<dyn Distributor>>) -> ShadowResult<()> {
        for pass in 0..self.config.max_render_passes {
            let pending = self.scheduler.take_pending();
            if pending.is_empty() {
                return Ok(());
            }
            tracing::debug!(pass, hosts = pending.len(), "Rendering shadow hosts");
            for host in pending {
                let Ok(host_node) = self.unwrap(host) else {
                    continue;
                };
                match self
                    .ext
                    .get_mut(host_node)
                    .and_then(|ext| ext.renderer_for_host.as_mut())
                {
                    Some(renderer) => renderer.dirty = false,
                    None => continue,
                }
                if let Some(distributor) = distributor.as_mut() {
                    distributor.distribute(self, host)?;
                }
            }
        }
        if self.has_pending_renders() {
            tracing::warn!(
                passes = self.config.max_render_passes,
                remaining = self.scheduler.len(),
                "Hosts still dirty after render passes"
            );
        }
        Ok(())
    }

    /// Make `composed` the physical children of `parent`
    ///
    /// Before anything moves, every deferred edge of the nodes whose
    /// physical links change is pinned to its current logical value.
    /// Returns false when the physical children already match.
    pub fn compose_children(
        &mut self,
        parent: WrapperId,
        composed: &[WrapperId],
    ) -> ShadowResult<bool> {
        let parent_node = self.unwrap(parent)?;
        let wanted = composed
            .iter()
            .map(|&w| self.unwrap(w))
            .collect::<ShadowResult<Vec<_>>>()?;
        let current = self.tree.child_ids(parent_node);
        if current == wanted {
            return Ok(false);
        }

        let document = self.tree.node_document(parent_node)?;
        for &node in &wanted {
            if self.tree.is_inclusive_ancestor(node, parent_node) {
                return Err(ShadowError::HierarchyRequest);
            }
            if self.tree.node_document(node)? != document {
                return Err(ShadowError::Dom(fos_dom::DomError::WrongDocument));
            }
        }

        self.pin(parent_node)?;
        for &node in current.iter().chain(&wanted) {
            self.pin_neighbourhood(node)?;
        }

        for node in current {
            self.tree.remove_child(parent_node, node)?;
        }
        for &node in &wanted {
            self.tree.append_child(parent_node, node)?;
        }
        tracing::trace!(?parent, children = wanted.len(), "composed children");
        Ok(true)
    }

    fn pin_neighbourhood(&mut self, node: NodeId) -> ShadowResult<()> {
        self.pin(node)?;
        let neighbours = [
            self.tree.parent(node),
            self.tree.prev_sibling(node),
            self.tree.next_sibling(node),
        ];
        for neighbour in neighbours.into_iter().flatten() {
            self.pin(neighbour)?;
        }
        Ok(())
    }

    /// Snapshot every deferred edge of `node` into its overlay
    fn pin(&mut self, node: NodeId) -> ShadowResult<()> {
        let wrapper = self.wrap(node)?;
        for relation in Relation::ALL {
            if self.edge(wrapper, relation).is_deferred() {
                let value = self.native_relative(node, relation);
                self.set_relative(wrapper, relation, value);
            }
        }
        Ok(())
    }
}
