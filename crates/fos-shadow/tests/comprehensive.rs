//! Comprehensive tests for fos-shadow
//!
//! Documented behaviour of the logical tree, with and without an active
//! shadow composition.

use fos_shadow::{Config, ShadowDom, WrapperId, WrapperKind};

fn dom() -> ShadowDom {
    ShadowDom::new(Config::default())
}

/// A host element with element children named `names`, attached to nothing
fn host_with(dom: &mut ShadowDom, names: &[&str]) -> (WrapperId, Vec<WrapperId>) {
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

// ============================================================================
// IDENTITY
// ============================================================================

#[test]
fn test_lookup_returns_same_wrapper() {
    let mut dom = dom();
    let (host, children) = host_with(&mut dom, &["a", "b"]);
    for node in [host, children[0], children[1]] {
        let physical = dom.unwrap(node).unwrap();
        assert_eq!(dom.lookup(physical), Some(node));
        assert_eq!(dom.wrap(physical).unwrap(), node);
    }
}

#[test]
fn test_navigation_wraps_consistently() {
    let mut dom = dom();
    let doc = dom.document();
    let div = dom.create_element(doc, "div").unwrap();
    dom.set_inner_html(div, "<p>one</p><p>two</p>").unwrap();

    let first = dom.first_child(div).unwrap();
    let second = dom.next_sibling(first).unwrap();
    assert_eq!(dom.previous_sibling(second), Some(first));
    assert_eq!(dom.last_child(div), Some(second));
    assert_eq!(dom.first_child(div), Some(first));
}

// ============================================================================
// DEFERRED READS
// ============================================================================

#[test]
fn test_fresh_node_reports_no_relatives() {
    let mut dom = dom();
    let doc = dom.document();
    let div = dom.create_element(doc, "div").unwrap();

    assert_eq!(dom.parent_node(div), None);
    assert_eq!(dom.first_child(div), None);
    assert_eq!(dom.last_child(div), None);
    assert_eq!(dom.next_sibling(div), None);
    assert_eq!(dom.previous_sibling(div), None);
    assert!(dom.relatives(div).is_none());
}

#[test]
fn test_reads_match_physical_tree_before_divergence() {
    let mut dom = dom();
    let (host, children) = host_with(&mut dom, &["a", "b", "c"]);
    let tree = dom.tree();
    let host_node = dom.unwrap(host).unwrap();

    let physical: Vec<_> = tree.child_ids(host_node);
    let logical: Vec<_> = dom
        .child_nodes(host)
        .into_iter()
        .map(|w| dom.unwrap(w).unwrap())
        .collect();
    assert_eq!(physical, logical);
    assert_eq!(dom.child_nodes(host), children);
}

// ============================================================================
// MUTATION WITHOUT COMPOSITION
// ============================================================================

#[test]
fn test_append_child() {
    let mut dom = dom();
    let doc = dom.document();
    let parent = dom.create_element(doc, "ul").unwrap();
    let first = dom.create_element(doc, "li").unwrap();
    let second = dom.create_element(doc, "li").unwrap();

    dom.append_child(parent, first).unwrap();
    assert_eq!(dom.parent_node(first), Some(parent));
    assert_eq!(dom.first_child(parent), Some(first));
    assert_eq!(dom.last_child(parent), Some(first));

    dom.append_child(parent, second).unwrap();
    assert_eq!(dom.last_child(parent), Some(second));
    assert_eq!(dom.first_child(parent), Some(first));
    assert!(dom.has_child_nodes(parent));
}

#[test]
fn test_insert_before_none_appends() {
    let mut dom = dom();
    let (host, children) = host_with(&mut dom, &["a"]);
    let doc = dom.document();
    let x = dom.create_element(doc, "x").unwrap();

    dom.insert_before(host, x, None).unwrap();
    assert_eq!(dom.child_nodes(host), vec![children[0], x]);
    assert_eq!(dom.last_child(host), Some(x));
}

#[test]
fn test_remove_child() {
    let mut dom = dom();
    let (host, children) = host_with(&mut dom, &["a", "b", "c"]);
    let removed = dom.remove_child(host, children[1]).unwrap();

    assert_eq!(removed, children[1]);
    assert_eq!(dom.parent_node(removed), None);
    assert_eq!(dom.next_sibling(removed), None);
    assert_eq!(dom.previous_sibling(removed), None);
    assert_eq!(dom.child_nodes(host), vec![children[0], children[2]]);
}

#[test]
fn test_replace_child() {
    let mut dom = dom();
    let (host, children) = host_with(&mut dom, &["a", "b", "c"]);
    let doc = dom.document();
    let x = dom.create_element(doc, "x").unwrap();

    let old = dom.replace_child(host, x, children[1]).unwrap();
    assert_eq!(old, children[1]);
    assert_eq!(dom.child_nodes(host), vec![children[0], x, children[2]]);
    assert_eq!(dom.parent_node(old), None);
    assert_eq!(dom.next_sibling(old), None);
}

#[test]
fn test_fragment_insertion_moves_children() {
    let mut dom = dom();
    let (host, children) = host_with(&mut dom, &["a", "b"]);
    let doc = dom.document();
    let frag = dom.create_document_fragment(doc).unwrap();
    let x = dom.create_element(doc, "x").unwrap();
    let y = dom.create_element(doc, "y").unwrap();
    dom.append_child(frag, x).unwrap();
    dom.append_child(frag, y).unwrap();

    let returned = dom.insert_before(host, frag, Some(children[1])).unwrap();
    assert_eq!(returned, frag);
    assert_eq!(dom.child_nodes(host), vec![children[0], x, y, children[1]]);
    assert!(!dom.has_child_nodes(frag));
}

#[test]
fn test_text_content() {
    let mut dom = dom();
    let doc = dom.document();
    let div = dom.create_element(doc, "div").unwrap();
    dom.set_inner_html(div, "<b>bold</b> and <!--hidden--><i>italic</i>")
        .unwrap();

    assert_eq!(dom.text_content(div).as_deref(), Some("bold and italic"));
    assert_eq!(dom.text_content(doc), None);

    dom.set_text_content(div, "plain").unwrap();
    assert_eq!(dom.child_nodes(div).len(), 1);
    assert_eq!(dom.inner_html(div).unwrap(), "plain");
}

// ============================================================================
// MUTATION UNDER A SHADOW HOST
// ============================================================================

#[test]
fn test_insert_before_scenario() {
    let mut dom = dom();
    let (host, children) = host_with(&mut dom, &["a", "b"]);
    let (a, b) = (children[0], children[1]);
    dom.attach_shadow_root(host).unwrap();
    let doc = dom.document();
    let x = dom.create_element(doc, "x").unwrap();

    dom.insert_before(host, x, Some(b)).unwrap();

    assert_eq!(dom.child_nodes(host), vec![a, x, b]);
    assert_eq!(dom.previous_sibling(x), Some(a));
    assert_eq!(dom.next_sibling(x), Some(b));
    assert_eq!(dom.previous_sibling(b), Some(x));
}

#[test]
fn test_set_text_content_scenario() {
    let mut dom = dom();
    let (host, _) = host_with(&mut dom, &["a", "b"]);
    dom.attach_shadow_root(host).unwrap();

    dom.set_text_content(host, "hi").unwrap();

    let first = dom.first_child(host).unwrap();
    assert_eq!(dom.text_content(first).as_deref(), Some("hi"));
    assert_eq!(dom.child_nodes(host).len(), 1);
}

#[test]
fn test_append_to_host_keeps_logical_order_after_render() {
    let mut dom = dom();
    let (host, children) = host_with(&mut dom, &["a"]);
    let root = dom.attach_shadow_root(host).unwrap();
    dom.set_inner_html(root, "<header></header><content></content>")
        .unwrap();
    let doc = dom.document();
    let extra = dom.create_element(doc, "p").unwrap();

    dom.append_child(host, extra).unwrap();
    dom.render_all_pending().unwrap();

    assert_eq!(dom.child_nodes(host), vec![children[0], extra]);
    assert_eq!(dom.parent_node(extra), Some(host));
    // Composed: shadow header, then the distributed light children
    let host_node = dom.unwrap(host).unwrap();
    assert_eq!(
        fos_html::inner_html(dom.tree(), host_node),
        "<header></header><a></a><p></p>"
    );
}

#[test]
fn test_remove_distributed_child() {
    let mut dom = dom();
    let (host, children) = host_with(&mut dom, &["a", "b"]);
    let root = dom.attach_shadow_root(host).unwrap();
    dom.set_inner_html(root, "<content></content>").unwrap();
    let point = dom.first_child(root).unwrap();
    assert_eq!(dom.get_distributed_nodes(point).unwrap(), children);

    dom.remove_child(host, children[0]).unwrap();
    assert_eq!(dom.parent_node(children[0]), None);
    assert_eq!(dom.child_nodes(host), vec![children[1]]);
    assert_eq!(dom.get_distributed_nodes(point).unwrap(), vec![children[1]]);

    let host_node = dom.unwrap(host).unwrap();
    assert_eq!(fos_html::inner_html(dom.tree(), host_node), "<b></b>");
}

#[test]
fn test_move_between_shadow_tree_and_light_tree() {
    let mut dom = dom();
    let (host, children) = host_with(&mut dom, &["a"]);
    let root = dom.attach_shadow_root(host).unwrap();
    dom.set_inner_html(root, "<section></section><content></content>")
        .unwrap();
    dom.render_all_pending().unwrap();
    let section = dom.first_child(root).unwrap();

    // Light child into the shadow tree
    dom.append_child(section, children[0]).unwrap();
    assert_eq!(dom.parent_node(children[0]), Some(section));
    assert!(!dom.has_child_nodes(host));
    dom.render_all_pending().unwrap();
    let host_node = dom.unwrap(host).unwrap();
    assert_eq!(
        fos_html::inner_html(dom.tree(), host_node),
        "<section><a></a></section>"
    );

    // And back out again
    dom.append_child(host, children[0]).unwrap();
    assert_eq!(dom.child_nodes(section), Vec::<WrapperId>::new());
    assert_eq!(dom.child_nodes(host), vec![children[0]]);
    dom.render_all_pending().unwrap();
    assert_eq!(
        fos_html::inner_html(dom.tree(), host_node),
        "<section></section><a></a>"
    );
}

#[test]
fn test_select_attribute_change_redistributes() {
    let mut dom = dom();
    let (host, children) = host_with(&mut dom, &["a", "b"]);
    let root = dom.attach_shadow_root(host).unwrap();
    dom.set_inner_html(root, r#"<content select="a"></content>"#).unwrap();
    let point = dom.first_child(root).unwrap();
    assert_eq!(dom.get_distributed_nodes(point).unwrap(), vec![children[0]]);

    dom.set_attribute(point, "select", "b").unwrap();
    assert!(dom.has_pending_renders());
    assert_eq!(dom.get_distributed_nodes(point).unwrap(), vec![children[1]]);
    assert_eq!(dom.insertion_parent(children[0]), None);
    assert_eq!(dom.insertion_parent(children[1]), Some(point));
}

// ============================================================================
// SHADOW ROOTS
// ============================================================================

#[test]
fn test_shadow_root_chain() {
    let mut dom = dom();
    let (host, _) = host_with(&mut dom, &[]);
    let first = dom.attach_shadow_root(host).unwrap();
    let second = dom.attach_shadow_root(host).unwrap();

    assert_eq!(dom.shadow_root(host), Some(second));
    assert_eq!(dom.older_shadow_root(second), Some(first));
    assert_eq!(dom.host(second), Some(host));
    assert_eq!(dom.kind(first).unwrap(), WrapperKind::ShadowRoot);
}

#[test]
fn test_youngest_root_is_rendered() {
    let mut dom = dom();
    let (host, _) = host_with(&mut dom, &["a"]);
    let older = dom.attach_shadow_root(host).unwrap();
    dom.set_inner_html(older, "<em>old</em>").unwrap();
    let younger = dom.attach_shadow_root(host).unwrap();
    dom.set_inner_html(younger, "<strong>new</strong>").unwrap();
    dom.render_all_pending().unwrap();

    let host_node = dom.unwrap(host).unwrap();
    assert_eq!(
        fos_html::inner_html(dom.tree(), host_node),
        "<strong>new</strong>"
    );
    // The older tree is intact logically
    assert_eq!(dom.inner_html(older).unwrap(), "<em>old</em>");
}

#[test]
fn test_inner_html_reads_logical_tree() {
    let mut dom = dom();
    let (host, _) = host_with(&mut dom, &["a"]);
    let root = dom.attach_shadow_root(host).unwrap();
    dom.set_inner_html(root, r#"<div class="wrap"><content></content></div>"#)
        .unwrap();
    dom.render_all_pending().unwrap();

    // Distributed nodes are not part of the shadow tree's markup
    assert_eq!(
        dom.inner_html(root).unwrap(),
        r#"<div class="wrap"><content></content></div>"#
    );
    let host_node = dom.unwrap(host).unwrap();
    assert_eq!(
        fos_html::inner_html(dom.tree(), host_node),
        r#"<div class="wrap"><a></a></div>"#
    );
}

#[test]
fn test_get_element_by_id_is_scoped() {
    let mut dom = dom();
    let (host, children) = host_with(&mut dom, &["span"]);
    dom.set_attribute(children[0], "id", "light").unwrap();
    let root = dom.attach_shadow_root(host).unwrap();
    dom.set_inner_html(root, r#"<p id="inner"></p><content></content>"#)
        .unwrap();
    dom.render_all_pending().unwrap();

    assert!(dom.get_element_by_id(root, "inner").unwrap().is_some());
    assert_eq!(dom.get_element_by_id(root, "light").unwrap(), None);
}

// ============================================================================
// ADOPTION
// ============================================================================

#[test]
fn test_append_across_documents_adopts() {
    let mut dom = dom();
    let other = dom.create_document("https://example.com/").unwrap();
    let doc = dom.document();
    let parent = dom.create_element(doc, "div").unwrap();
    let child = dom.create_element(other, "span").unwrap();
    let grandchild = dom.create_text_node(other, "t").unwrap();
    dom.append_child(child, grandchild).unwrap();

    dom.append_child(parent, child).unwrap();
    assert_eq!(dom.owner_document(child), Some(doc));
    assert_eq!(dom.owner_document(grandchild), Some(doc));
    assert_eq!(dom.parent_node(child), Some(parent));
}

#[test]
fn test_append_foreign_fragment_to_host_adopts() {
    let mut dom = dom();
    let (host, _) = host_with(&mut dom, &[]);
    dom.attach_shadow_root(host).unwrap();
    let other = dom.create_document("https://example.com/").unwrap();
    let frag = dom.create_document_fragment(other).unwrap();
    let x = dom.create_element(other, "x").unwrap();
    let y = dom.create_element(other, "y").unwrap();
    dom.append_child(frag, x).unwrap();
    dom.append_child(frag, y).unwrap();

    dom.append_child(host, frag).unwrap();
    let doc = dom.document();
    assert_eq!(dom.owner_document(x), Some(doc));
    assert_eq!(dom.owner_document(y), Some(doc));
    assert_eq!(dom.child_nodes(host), vec![x, y]);
}
