//! Distribution of host children into `<content>` insertion points

use crate::render::Distributor;
use crate::wrapper::WrapperKind;
use crate::{ShadowDom, ShadowResult, WrapperId};

/// Default distributor
///
/// Renders the youngest shadow root of a host. Insertion points are visited
/// in tree order; each one takes the remaining host children its `select`
/// attribute matches. An absent or empty `select` takes everything, `*`
/// takes every element, anything else is compared to the element's local
/// name ignoring ASCII case. An insertion point that receives nothing
/// renders its own children instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentDistributor;

impl Distributor for ContentDistributor {
    fn distribute(&mut self, dom: &mut ShadowDom, host: WrapperId) -> ShadowResult<()> {
        let Some(root) = dom.shadow_root(host) else {
            return Ok(());
        };

        let mut pool = dom.child_nodes(host);
        let tree_scope = dom.logical_descendants(root);
        for &point in &tree_scope {
            if dom.kind(point)? != WrapperKind::Content {
                continue;
            }
            let select = dom.get_attribute(point, "select").map(str::to_string);
            let (taken, rest): (Vec<_>, Vec<_>) = pool
                .into_iter()
                .partition(|&node| matches_select(dom, node, select.as_deref()));
            pool = rest;
            dom.set_distributed_nodes(point, taken)?;
        }
        for node in pool {
            dom.extension_mut(node)?.insertion_parent = None;
        }

        let composed = composed_children(dom, root);
        dom.compose_children(host, &composed)?;
        for node in tree_scope {
            // Nested hosts render their own composition
            if dom.kind(node)? == WrapperKind::Element && !dom.is_host(node) {
                let composed = composed_children(dom, node);
                dom.compose_children(node, &composed)?;
            }
        }
        tracing::trace!(?host, ?root, "distributed host");
        Ok(())
    }
}

fn matches_select(dom: &ShadowDom, node: WrapperId, select: Option<&str>) -> bool {
    let select = select.map(str::trim).unwrap_or_default();
    if select.is_empty() {
        return true;
    }
    if !dom.kind(node).is_ok_and(WrapperKind::is_element) {
        return false;
    }
    if select == "*" {
        return true;
    }
    dom.node_name(node)
        .is_some_and(|name| name.eq_ignore_ascii_case(select))
}

/// Children `parent` renders: insertion points are replaced by what was
/// distributed into them, or by their fallback content
fn composed_children(dom: &ShadowDom, parent: WrapperId) -> Vec<WrapperId> {
    let mut out = Vec::new();
    for child in dom.child_nodes(parent) {
        if dom.kind(child).ok() != Some(WrapperKind::Content) {
            out.push(child);
            continue;
        }
        let distributed = dom.distributed_nodes(child);
        if distributed.is_empty() {
            out.extend(composed_children(dom, child));
        } else {
            out.extend(distributed);
        }
    }
    out
}

impl ShadowDom {
    /// Nodes distributed into the insertion point `content`
    ///
    /// Flushes pending renders first so the answer is current.
    pub fn get_distributed_nodes(&mut self, content: WrapperId) -> ShadowResult<Vec<WrapperId>> {
        self.render_all_pending()?;
        self.unwrap(content)?;
        Ok(self.distributed_nodes(content))
    }

    /// Last computed distribution of `content`, without flushing
    pub(crate) fn distributed_nodes(&self, content: WrapperId) -> Vec<WrapperId> {
        self.extension(content)
            .and_then(|ext| ext.distributed_nodes.clone())
            .unwrap_or_default()
    }

    /// Record `nodes` as distributed into `content`
    ///
    /// Nodes that were distributed here before and are not any more lose
    /// their insertion parent.
    pub fn set_distributed_nodes(
        &mut self,
        content: WrapperId,
        nodes: Vec<WrapperId>,
    ) -> ShadowResult<()> {
        for previous in self.distributed_nodes(content) {
            if nodes.contains(&previous) {
                continue;
            }
            if let Ok(node) = self.unwrap(previous) {
                let ext = self.get_or_create_extension(node);
                if ext.insertion_parent == Some(content) {
                    ext.insertion_parent = None;
                }
            }
        }
        for &node in &nodes {
            self.extension_mut(node)?.insertion_parent = Some(content);
        }
        self.extension_mut(content)?.distributed_nodes = Some(nodes);
        Ok(())
    }

    /// Insertion point `node` was last distributed into
    pub fn insertion_parent(&self, node: WrapperId) -> Option<WrapperId> {
        self.extension(node)?.insertion_parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_with_children(dom: &mut ShadowDom, names: &[&str]) -> (WrapperId, Vec<WrapperId>) {
        let doc = dom.document();
        let host = dom.create_element(doc, "div").unwrap();
        let mut children = Vec::new();
        for name in names {
            let child = dom.create_element(doc, name).unwrap();
            dom.append_child(host, child).unwrap();
            children.push(child);
        }
        (host, children)
    }

    #[test]
    fn test_select_partitions_children() {
        let mut dom = ShadowDom::default();
        let (host, children) = host_with_children(&mut dom, &["a", "b", "a"]);
        let root = dom.attach_shadow_root(host).unwrap();
        dom.set_inner_html(root, r#"<content select="A"></content><content></content>"#)
            .unwrap();
        let points = dom.child_nodes(root);

        assert_eq!(
            dom.get_distributed_nodes(points[0]).unwrap(),
            vec![children[0], children[2]]
        );
        assert_eq!(dom.get_distributed_nodes(points[1]).unwrap(), vec![children[1]]);
        assert_eq!(dom.insertion_parent(children[1]), Some(points[1]));
    }

    #[test]
    fn test_select_star_skips_text() {
        let mut dom = ShadowDom::default();
        let (host, children) = host_with_children(&mut dom, &["p"]);
        let doc = dom.document();
        let text = dom.create_text_node(doc, "loose").unwrap();
        dom.append_child(host, text).unwrap();
        let root = dom.attach_shadow_root(host).unwrap();
        dom.set_inner_html(root, r#"<content select="*"></content>"#).unwrap();
        let point = dom.first_child(root).unwrap();

        assert_eq!(dom.get_distributed_nodes(point).unwrap(), vec![children[0]]);
        assert_eq!(dom.insertion_parent(text), None);
    }

    #[test]
    fn test_fallback_content_renders_when_empty() {
        let mut dom = ShadowDom::default();
        let (host, _) = host_with_children(&mut dom, &[]);
        let root = dom.attach_shadow_root(host).unwrap();
        dom.set_inner_html(root, "<content><i>fallback</i></content>").unwrap();
        dom.render_all_pending().unwrap();

        let host_node = dom.unwrap(host).unwrap();
        assert_eq!(fos_html::inner_html(dom.tree(), host_node), "<i>fallback</i>");
    }
}
