//! Props - The mapping carried by every element.
//!
//! Props are opaque string-keyed values with two reserved conventions:
//! - keys starting with `on` are event handlers (`onClick` -> `click`)
//! - `children` holds the ordered child elements
//!
//! Text elements keep their content under `nodeValue`.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use super::Element;
use crate::types::HostEvent;

/// Reserved key for child elements.
pub const CHILDREN: &str = "children";

/// Key holding a text element's content.
pub const NODE_VALUE: &str = "nodeValue";

// =============================================================================
// Key Conventions
// =============================================================================

/// Keys beginning with `on` denote event handlers.
pub fn is_event(key: &str) -> bool {
    key.starts_with("on")
}

/// Anything that is neither an event nor `children`.
pub fn is_property(key: &str) -> bool {
    key != CHILDREN && !is_event(key)
}

/// Listener type for an event key: `onClick` -> `click`.
pub fn event_type(key: &str) -> String {
    key.to_lowercase().chars().skip(2).collect()
}

// =============================================================================
// Event Handler
// =============================================================================

/// Event handler stored in props.
///
/// Cloning shares the closure. Two handlers are equal only when they are the
/// same closure, which is what prop diffing compares.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&HostEvent)>);

impl EventHandler {
    pub fn new(handler: impl Fn(&HostEvent) + 'static) -> Self {
        Self(Rc::new(handler))
    }

    /// Invoke the handler.
    pub fn call(&self, event: &HostEvent) {
        (self.0)(event)
    }

    fn addr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.addr(), other.addr())
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", self.addr())
    }
}

// =============================================================================
// Prop Value
// =============================================================================

/// A single prop value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Handler(EventHandler),
}

impl PropValue {
    /// Wrap a closure as a handler value.
    pub fn handler(handler: impl Fn(&HostEvent) + 'static) -> Self {
        PropValue::Handler(EventHandler::new(handler))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            PropValue::Handler(h) => Some(h),
            _ => None,
        }
    }

    /// String form used when a host stores the value as text.
    ///
    /// Handlers have no textual form and render as the empty string.
    pub fn to_text(&self) -> String {
        match self {
            PropValue::Str(s) => s.clone(),
            PropValue::Int(i) => i.to_string(),
            PropValue::Float(x) => x.to_string(),
            PropValue::Bool(b) => b.to_string(),
            PropValue::Handler(_) => String::new(),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Int(value.into())
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<EventHandler> for PropValue {
    fn from(value: EventHandler) -> Self {
        PropValue::Handler(value)
    }
}

// =============================================================================
// Props
// =============================================================================

/// Props of an element: keyed values plus the reserved `children` list.
///
/// Keys are kept sorted so host mutations happen in a stable order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Props {
    values: BTreeMap<String, PropValue>,
    children: Vec<Element>,
}

impl Props {
    /// Empty props (`{ children: [] }`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Props::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Builder for an event handler prop (`on_event` is the full key, e.g. `onClick`).
    pub fn on(self, key: impl Into<String>, handler: impl Fn(&HostEvent) + 'static) -> Self {
        self.with(key, PropValue::handler(handler))
    }

    /// Set a value. `children` is reserved and only settable through
    /// [`Props::set_children`].
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<PropValue>) {
        let key = key.into();
        if key == CHILDREN {
            tracing::warn!("ignoring value for reserved prop `children`");
            return;
        }
        self.values.insert(key, value.into());
    }

    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterate non-reserved entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn set_children(&mut self, children: Vec<Element>) {
        self.children = children;
    }

    pub fn with_children(mut self, children: Vec<Element>) -> Self {
        self.children = children;
        self
    }

    /// Text content for text elements.
    pub fn node_value(&self) -> Option<&str> {
        self.get(NODE_VALUE).and_then(PropValue::as_str)
    }

    /// Number of non-reserved entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
