//! HTML5 Parser implementation
//!
//! Uses html5ever's fragment parser with a `<body>` context element and
//! converts the result into nodes of an existing `DomTree`. Content the
//! document parser would hoist into `<head>` (`<style>`, `<title>`, ...)
//! stays in place.

use fos_dom::{DomResult, DomTree, NodeId};
use html5ever::tendril::TendrilSink;
use html5ever::{QualName, local_name, ns, parse_fragment};
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

/// HTML5 parser
#[derive(Debug, Clone, Copy)]
pub struct HtmlParser;

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self
    }

    /// Parse `html` as the content of a `<body>`
    ///
    /// Returns the top-level nodes in order. They are owned by `document`
    /// but not attached anywhere.
    pub fn parse_fragment(
        &self,
        tree: &mut DomTree,
        document: NodeId,
        html: &str,
    ) -> DomResult<Vec<NodeId>> {
        tracing::debug!(len = html.len(), "Parsing HTML fragment");

        let context = QualName::new(None, ns!(html), local_name!("body"));
        let dom = parse_fragment(RcDom::default(), Default::default(), context, Vec::new(), false)
            .one(html);
        // The fragment parser roots its output in a single <html> element
        let Some(root) = dom.document.children.borrow().first().cloned() else {
            return Ok(Vec::new());
        };

        let mut nodes = Vec::new();
        for child in root.children.borrow().iter() {
            if let Some(id) = self.convert_node(child, tree, document)? {
                nodes.push(id);
            }
        }

        tracing::debug!("Parsed {} top-level nodes", nodes.len());
        Ok(nodes)
    }

    /// Convert an RcDom node (and its subtree) to our DOM format
    fn convert_node(
        &self,
        handle: &Handle,
        tree: &mut DomTree,
        document: NodeId,
    ) -> DomResult<Option<NodeId>> {
        let id = match &handle.data {
            RcNodeData::Text { contents } => tree.create_text(document, &contents.borrow())?,
            RcNodeData::Comment { contents } => tree.create_comment(document, contents)?,
            RcNodeData::Element { name, attrs, .. } => {
                let id = tree.create_element(document, &name.local)?;
                for attr in attrs.borrow().iter() {
                    tree.set_attribute(id, &attr.name.local, &attr.value)?;
                }
                for child in handle.children.borrow().iter() {
                    if let Some(child_id) = self.convert_node(child, tree, document)? {
                        tree.append_child(id, child_id)?;
                    }
                }
                id
            }
            // Doctypes and processing instructions have no place in a fragment
            _ => return Ok(None),
        };
        Ok(Some(id))
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}
