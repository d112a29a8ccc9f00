//! fOS HTML
//!
//! Fragment parsing into the fOS DOM arena, built on html5ever, and the
//! markup serializer used for `innerHTML`.

mod parser;
mod serialize;

pub use parser::HtmlParser;
pub use serialize::{
    escape_attribute, escape_text, inner_html, is_raw_text_element, is_void_element,
    serialize_children,
};

use fos_dom::{DomResult, DomTree, NodeId};

/// Parse `html` as body content into detached nodes owned by `document`
pub fn parse_fragment(tree: &mut DomTree, document: NodeId, html: &str) -> DomResult<Vec<NodeId>> {
    HtmlParser::new().parse_fragment(tree, document, html)
}
