//! Markup serialization
//!
//! Node data always comes from the `DomTree`, but the child order is supplied
//! by the caller so the same serializer can walk the physical tree or a
//! logical view layered over it.

use fos_dom::{DomTree, NodeData, NodeId};

/// Elements that never have an end tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose text children are serialized without escaping
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

/// Check if `name` is a void element
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Check if text inside `name` is emitted verbatim
pub fn is_raw_text_element(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&name)
}

/// Escape character data for use between tags
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape an attribute value for use inside double quotes
pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serialize the children of `parent`, walking child lists with `children_of`
pub fn serialize_children<F>(tree: &DomTree, parent: NodeId, children_of: &F) -> String
where
    F: Fn(NodeId) -> Vec<NodeId>,
{
    let mut out = String::new();
    for child in children_of(parent) {
        serialize_node(tree, child, children_of, &mut out);
    }
    out
}

/// `innerHTML` of a node in the physical tree
pub fn inner_html(tree: &DomTree, id: NodeId) -> String {
    serialize_children(tree, id, &|node| tree.child_ids(node))
}

fn serialize_node<F>(tree: &DomTree, id: NodeId, children_of: &F, out: &mut String)
where
    F: Fn(NodeId) -> Vec<NodeId>,
{
    let Some(node) = tree.get(id) else {
        return;
    };
    match &node.data {
        NodeData::Element(elem) => {
            out.push('<');
            out.push_str(&elem.name);
            for attr in &elem.attrs {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                out.push_str(&escape_attribute(&attr.value));
                out.push('"');
            }
            out.push('>');
            if is_void_element(&elem.name) {
                return;
            }
            let raw = is_raw_text_element(&elem.name);
            for child in children_of(id) {
                match tree.get(child).map(|n| &n.data) {
                    Some(NodeData::Text(text)) if raw => out.push_str(&text.content),
                    _ => serialize_node(tree, child, children_of, out),
                }
            }
            out.push_str("</");
            out.push_str(&elem.name);
            out.push('>');
        }
        NodeData::Text(text) => out.push_str(&escape_text(&text.content)),
        NodeData::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        }
        NodeData::Document(_) | NodeData::DocumentFragment => {
            for child in children_of(id) {
                serialize_node(tree, child, children_of, out);
            }
        }
    }
}
