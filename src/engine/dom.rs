//! Host node creation and prop diffing.

use crate::element::{ElementType, Props, event_type, is_event, is_property};
use crate::error::RenderError;
use crate::fiber::FiberId;
use crate::host::Host;

/// Allocate the host node for a text or host-tag fiber and apply its props.
///
/// Component fibers own no node; asking for one is an error.
pub fn create_dom<H: Host>(host: &mut H, fiber: FiberId, ty: &ElementType, props: &Props) -> Result<H::Node, RenderError> {
    let node = match ty {
        ElementType::Text => host.create_text_node("").map_err(RenderError::host)?,
        ElementType::Host(tag) => host.create_element(tag).map_err(RenderError::host)?,
        ElementType::Component(_) => return Err(RenderError::MissingHostNode { fiber }),
    };
    update_dom(host, &node, &Props::new(), props)?;
    Ok(node)
}

/// Apply the difference between `prev` and `next` to `node`.
///
/// Order is fixed: stale listeners go before new ones are attached, so a
/// changed handler is never registered twice.
///
/// 1. remove listeners that are gone or changed
/// 2. clear properties that are gone
/// 3. add listeners that are new or changed
/// 4. set properties that are new or changed
pub fn update_dom<H: Host>(host: &mut H, node: &H::Node, prev: &Props, next: &Props) -> Result<(), RenderError> {
    for (key, value) in prev.iter().filter(|(key, _)| is_event(key)) {
        if next.get(key) == Some(value) {
            continue;
        }
        if let Some(handler) = value.as_handler() {
            host.remove_event_listener(node, &event_type(key), handler)
                .map_err(RenderError::host)?;
        }
    }

    for (key, _) in prev.iter().filter(|(key, _)| is_property(key)) {
        if !next.contains(key) {
            host.set_property(node, key, None).map_err(RenderError::host)?;
        }
    }

    for (key, value) in next.iter().filter(|(key, _)| is_event(key)) {
        if prev.get(key) == Some(value) {
            continue;
        }
        if let Some(handler) = value.as_handler() {
            host.add_event_listener(node, &event_type(key), handler)
                .map_err(RenderError::host)?;
        }
    }

    for (key, value) in next.iter().filter(|(key, _)| is_property(key)) {
        if prev.get(key) != Some(value) {
            host.set_property(node, key, Some(value)).map_err(RenderError::host)?;
        }
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
