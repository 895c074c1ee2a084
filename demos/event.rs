//! Event Example - Re-render the whole tree from an input listener
//!
//! Focus the input with Tab and type. Every keystroke renders a new tree with
//! the input's value; the heading follows along. Esc or Ctrl+C quits.
//!
//! Run with: cargo run --example event

use std::cell::RefCell;
use std::rc::Rc;

use spark_fiber::{Element, HostEvent, Props, RuntimeConfig, h, logging, runtime};

type Pending = Rc<RefCell<Option<String>>>;

fn view(value: &str, pending: &Pending) -> Element {
    let pending = pending.clone();
    let on_input = move |event: &HostEvent| {
        *pending.borrow_mut() = event.value.clone();
    };

    h!(
        "div",
        None,
        h!("input", Some(Props::new().on("onInput", on_input).with("value", value))),
        h!("h2", None, "Hello ", value),
    )
}

fn main() {
    if let Err(e) = logging::init_to_file(std::env::temp_dir().join("spark-fiber.log")) {
        eprintln!("Logging disabled: {e}");
    }

    let pending: Pending = Rc::new(RefCell::new(None));

    let mut handle = match runtime::mount(view("World", &pending), RuntimeConfig::from_env()) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Failed to mount: {e}");
            return;
        }
    };

    loop {
        match runtime::tick(&mut handle) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                tracing::error!(%e, "tick failed");
                break;
            }
        }

        let next = pending.borrow_mut().take();
        if let Some(value) = next {
            handle.render(view(&value, &pending));
        }
    }

    let _ = runtime::unmount(handle);
}
