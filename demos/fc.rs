//! Function Component Example
//!
//! A component receives its own props and returns the tree to render.
//!
//! Run with: cargo run --example fc

use spark_fiber::{Component, Element, Hooks, Props, Renderer, TerminalHost, h, logging};

fn app(props: &Props, _hooks: &mut Hooks) -> Element {
    let name = props.get("name").map(|v| v.to_text()).unwrap_or_default();
    h!(
        "div",
        None,
        h!("h1", None, "Hello, ", name),
        h!("p", None, "My fiber."),
    )
}

fn main() {
    logging::init();

    let element = h!(
        Component::new(app),
        Some(Props::new().with("name", "Function Component")),
    );

    let mut host = TerminalHost::new();
    let container = host.create_container();
    let mut renderer = Renderer::new(host);
    renderer.render(element, container);

    if let Err(e) = renderer.flush() {
        eprintln!("Render failed: {e}");
        return;
    }

    for line in renderer.host().layout(container) {
        println!("{}", line.text());
    }
}
