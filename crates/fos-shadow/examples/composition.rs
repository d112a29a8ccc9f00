//! Example: composing a shadow host
//!
//! Run with `RUST_LOG=fos_shadow=trace` to watch the overlay at work.

use fos_shadow::{Config, ShadowDom};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let mut dom = ShadowDom::new(Config::default());
    let doc = dom.document();
    let body = dom.create_element(doc, "body")?;
    dom.append_child(doc, body)?;

    let host = dom.create_element(doc, "div")?;
    dom.append_child(body, host)?;
    dom.set_inner_html(host, "<h1>Title</h1><p>First</p><p>Second</p>")?;

    let root = dom.attach_shadow_root(host)?;
    dom.set_inner_html(
        root,
        "<header><content select=\"h1\"></content></header>\
         <main><content></content></main>",
    )?;
    dom.render_all_pending()?;

    println!("logical host:  {}", dom.inner_html(host)?);
    println!("shadow root:   {}", dom.inner_html(root)?);
    println!("composed host: {}", fos_html::inner_html(dom.tree(), dom.unwrap(host)?));

    // Light DOM edits keep working on the logical tree
    let extra = dom.create_element(doc, "p")?;
    dom.set_text_content(extra, "Third")?;
    dom.append_child(host, extra)?;
    dom.render_all_pending()?;

    println!("after append:  {}", fos_html::inner_html(dom.tree(), dom.unwrap(host)?));
    println!("children:      {}", dom.child_nodes(host).len());
    Ok(())
}
