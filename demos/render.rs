//! Render Example - A static tree committed into the in-memory document
//!
//! Builds an element tree, renders it, flushes the work loop and prints what
//! landed in the document.
//!
//! Run with: cargo run --example render

use spark_fiber::{Document, Renderer, h, logging};

fn main() {
    logging::init();

    let element = h!(
        "div",
        None,
        h!("h1", None, "Hello, World"),
        h!("p", None, "Hi, I'm spark-fiber"),
    );
    tracing::debug!(?element, "element");

    let mut doc = Document::new();
    let container = doc.create_container("root");
    let mut renderer = Renderer::new(doc);
    renderer.render(element, container);

    match renderer.flush() {
        Ok(stats) => {
            println!("=== spark-fiber Render Example ===\n");
            println!("Commit: {stats:?}");
            println!("Fibers: {}", renderer.fibers().len());

            let doc = renderer.host();
            println!("\nDocument:");
            for tag in ["h1", "p"] {
                if let Some(node) = doc.find_by_tag(container, tag) {
                    println!("  <{tag}> {}", doc.text_content(node));
                }
            }
        }
        Err(e) => eprintln!("Render failed: {e}"),
    }
}
