//! Counter Example - Component state with use_state
//!
//! Tab to a button, Enter or Space to press it. Esc or Ctrl+C quits.
//!
//! Run with: cargo run --example counter

use spark_fiber::{Component, Element, Hooks, HostEvent, Props, RuntimeConfig, SetState, h, logging, runtime};

fn step(set_count: SetState<i64>, delta: i64) -> impl Fn(&HostEvent) {
    move |_: &HostEvent| {
        if let Err(e) = set_count.update(move |prev| prev + delta) {
            tracing::error!(%e, "state update failed");
        }
    }
}

fn app(props: &Props, hooks: &mut Hooks) -> Element {
    let name = props.get("name").map(|v| v.to_text()).unwrap_or_default();
    let (count, set_count) = hooks.use_state(0_i64);

    h!(
        "div",
        None,
        h!("h1", None, "Hello, ", name),
        h!("p", None, "Count: ", count),
        h!("button", Some(Props::new().on("onClick", step(set_count.clone(), 1))), "+"),
        h!("button", Some(Props::new().on("onClick", step(set_count, -1))), "-"),
    )
}

fn main() {
    if let Err(e) = logging::init_to_file(std::env::temp_dir().join("spark-fiber.log")) {
        eprintln!("Logging disabled: {e}");
    }

    let element = h!(
        Component::new(app),
        Some(Props::new().with("name", "Function Component")),
    );

    match runtime::mount(element, RuntimeConfig::from_env()) {
        Ok(mut handle) => {
            if let Err(e) = runtime::run(&mut handle) {
                tracing::error!(%e, "run failed");
            }
            let _ = runtime::unmount(handle);
        }
        Err(e) => eprintln!("Failed to mount: {e}"),
    }
}
