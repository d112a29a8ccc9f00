//! Shadow roots and their tree-scoped queries

use fos_dom::{DomTree, NodeId};

use crate::ext_data::HostRenderer;
use crate::wrapper::WrapperKind;
use crate::{ShadowDom, ShadowError, ShadowResult, WrapperId};

/// Finds the deepest element at a point of the composed tree
///
/// Layout lives outside this crate; callers plug it in here.
pub trait HitTester {
    fn element_at(&self, tree: &DomTree, x: f32, y: f32) -> Option<NodeId>;
}

impl<F> HitTester for F
where
    F: Fn(&DomTree, f32, f32) -> Option<NodeId>,
{
    fn element_at(&self, tree: &DomTree, x: f32, y: f32) -> Option<NodeId> {
        self(tree, x, y)
    }
}

impl ShadowDom {
    /// Attach a new youngest shadow root to `host`
    ///
    /// Earlier roots stay reachable through [`older_shadow_root`](Self::older_shadow_root)
    /// but are no longer rendered.
    pub fn attach_shadow_root(&mut self, host: WrapperId) -> ShadowResult<WrapperId> {
        let host_node = self.unwrap(host)?;
        if !self.kind(host)?.is_element() {
            return Err(ShadowError::HierarchyRequest);
        }
        let document = self.tree.node_document(host_node)?;
        let fragment = self.tree.create_document_fragment(document)?;
        let root = self.rebind(fragment, WrapperKind::ShadowRoot)?;

        let older = self.shadow_root(host);
        let ext = self.get_or_create_extension(fragment);
        ext.host = Some(host);
        ext.older_shadow_root = older;
        match &mut self.get_or_create_extension(host_node).renderer_for_host {
            Some(renderer) => renderer.shadow_root = root,
            slot => *slot = Some(HostRenderer::new(root)),
        }
        self.invalidate_shadow_renderer(host);

        tracing::debug!(?host, ?root, ?older, "Attached shadow root");
        Ok(root)
    }

    /// Youngest shadow root of `host`
    pub fn shadow_root(&self, host: WrapperId) -> Option<WrapperId> {
        Some(self.renderer(host)?.shadow_root)
    }

    pub fn is_host(&self, node: WrapperId) -> bool {
        self.renderer(node).is_some()
    }

    /// Host a shadow root is attached to
    pub fn host(&self, root: WrapperId) -> Option<WrapperId> {
        self.extension(root)?.host
    }

    pub fn older_shadow_root(&self, root: WrapperId) -> Option<WrapperId> {
        self.extension(root)?.older_shadow_root
    }

    /// Serialize the logical children of `node`
    pub fn inner_html(&self, node: WrapperId) -> ShadowResult<String> {
        let physical = self.unwrap(node)?;
        let logical_children = |id: NodeId| -> Vec<NodeId> {
            self.wrap(id)
                .map(|w| {
                    self.child_nodes(w)
                        .into_iter()
                        .filter_map(|c| self.unwrap(c).ok())
                        .collect()
                })
                .unwrap_or_default()
        };
        Ok(fos_html::serialize_children(
            &self.tree,
            physical,
            &logical_children,
        ))
    }

    /// Replace the logical children of `node` with parsed `html`
    pub fn set_inner_html(&mut self, node: WrapperId, html: &str) -> ShadowResult<()> {
        let physical = self.unwrap(node)?;
        let document = self.tree.node_document(physical)?;
        let parsed = fos_html::parse_fragment(&mut self.tree, document, html)?;

        self.set_text_content(node, "")?;
        for child in parsed {
            let child = self.wrap(child)?;
            self.append_child(node, child)?;
        }
        self.invalidate_shadow_renderer(node);
        Ok(())
    }

    /// First element in the tree scope of `root` whose id is `id`
    pub fn get_element_by_id(&self, root: WrapperId, id: &str) -> ShadowResult<Option<WrapperId>> {
        if id.contains([' ', '\t', '\n', '\r', '\x0c']) {
            return Err(ShadowError::InvalidIdentifier(id.to_string()));
        }
        self.unwrap(root)?;
        Ok(self.logical_descendants(root).into_iter().find(|&node| {
            self.kind(node).is_ok_and(WrapperKind::is_element)
                && self.get_attribute(node, "id") == Some(id)
        }))
    }

    /// Element at a point, retargeted into the tree scope of `root`
    ///
    /// Walks up the composed tree from the hit until an element whose
    /// logical root is `root` is found.
    pub fn element_from_point(
        &self,
        root: WrapperId,
        x: f32,
        y: f32,
        hit_tester: &dyn HitTester,
    ) -> ShadowResult<Option<WrapperId>> {
        self.unwrap(root)?;
        let mut current = hit_tester.element_at(&self.tree, x, y);
        while let Some(node) = current {
            let wrapper = self.wrap(node)?;
            if self.kind(wrapper)?.is_element() && self.logical_root(wrapper) == root {
                return Ok(Some(wrapper));
            }
            current = self.tree.parent(node);
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadow_root_chain() {
        let mut dom = ShadowDom::default();
        let doc = dom.document();
        let host = dom.create_element(doc, "div").unwrap();
        let r1 = dom.attach_shadow_root(host).unwrap();
        let r2 = dom.attach_shadow_root(host).unwrap();

        assert_eq!(dom.shadow_root(host), Some(r2));
        assert_eq!(dom.older_shadow_root(r2), Some(r1));
        assert_eq!(dom.older_shadow_root(r1), None);
        assert_eq!(dom.host(r1), Some(host));
        assert_eq!(dom.host(r2), Some(host));
        assert_eq!(dom.kind(r2).unwrap(), WrapperKind::ShadowRoot);
        assert!(dom.is_host(host));
        assert!(!dom.is_host(r1));
    }

    #[test]
    fn test_text_cannot_host() {
        let mut dom = ShadowDom::default();
        let doc = dom.document();
        let text = dom.create_text_node(doc, "x").unwrap();
        assert_eq!(dom.attach_shadow_root(text), Err(ShadowError::HierarchyRequest));
    }

    #[test]
    fn test_inner_html_round_trip() {
        let mut dom = ShadowDom::default();
        let doc = dom.document();
        let host = dom.create_element(doc, "div").unwrap();
        let root = dom.attach_shadow_root(host).unwrap();

        dom.set_inner_html(root, "<p id=\"x\">one</p>two").unwrap();
        assert_eq!(dom.inner_html(root).unwrap(), "<p id=\"x\">one</p>two");
        assert_eq!(dom.child_nodes(root).len(), 2);

        dom.set_inner_html(root, "<b>three</b>").unwrap();
        assert_eq!(dom.inner_html(root).unwrap(), "<b>three</b>");
        assert_eq!(dom.text_content(root).as_deref(), Some("three"));
    }

    #[test]
    fn test_get_element_by_id() {
        let mut dom = ShadowDom::default();
        let doc = dom.document();
        let host = dom.create_element(doc, "div").unwrap();
        let root = dom.attach_shadow_root(host).unwrap();
        dom.set_inner_html(root, r#"<div><span id="target"></span></div>"#)
            .unwrap();

        let found = dom.get_element_by_id(root, "target").unwrap().unwrap();
        assert_eq!(dom.node_name(found).as_deref(), Some("SPAN"));
        assert_eq!(dom.get_element_by_id(root, "missing").unwrap(), None);
        assert_eq!(
            dom.get_element_by_id(root, "a b"),
            Err(ShadowError::InvalidIdentifier("a b".to_string()))
        );
    }

    #[test]
    fn test_element_from_point_retargets() {
        let mut dom = ShadowDom::default();
        let doc = dom.document();
        let host = dom.create_element(doc, "div").unwrap();
        dom.append_child(doc, host).unwrap();
        let root = dom.attach_shadow_root(host).unwrap();
        dom.set_inner_html(root, "<section><em>deep</em></section>").unwrap();
        dom.render_all_pending().unwrap();

        let section = dom.first_child(root).unwrap();
        let em = dom.first_child(section).unwrap();
        let em_node = dom.unwrap(em).unwrap();
        let hit = move |_: &DomTree, _: f32, _: f32| Some(em_node);

        assert_eq!(dom.element_from_point(root, 1.0, 1.0, &hit).unwrap(), Some(em));
        // Seen from the document the hit lands on the host
        assert_eq!(dom.element_from_point(doc, 1.0, 1.0, &hit).unwrap(), Some(host));

        let miss = |_: &DomTree, _: f32, _: f32| -> Option<NodeId> { None };
        assert_eq!(dom.element_from_point(root, 1.0, 1.0, &miss).unwrap(), None);
    }
}
