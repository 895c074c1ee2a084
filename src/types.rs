//! Core types for spark-fiber.
//!
//! Small shared vocabulary used by the element model, the reconciler and the
//! hosts. Nothing here touches a render target.

use std::fmt;

// =============================================================================
// Effect Tag
// =============================================================================

/// What the commit phase has to do with a fiber.
///
/// Assigned by the reconciler, consumed by the commit phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectTag {
    /// Insert the fiber's host node under its host parent.
    Placement,
    /// Keep the host node, diff old props against new props.
    Update,
    /// Remove the fiber's host node(s) from the host parent.
    Deletion,
}

impl fmt::Display for EffectTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectTag::Placement => f.write_str("PLACEMENT"),
            EffectTag::Update => f.write_str("UPDATE"),
            EffectTag::Deletion => f.write_str("DELETION"),
        }
    }
}

// =============================================================================
// Host Event
// =============================================================================

/// Event delivered by a host to a listener.
///
/// `kind` is the listener type (`"click"`, `"input"`, ...). `value` carries the
/// current value of the target for input-like events.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HostEvent {
    pub kind: String,
    pub value: Option<String>,
}

impl HostEvent {
    /// Create an event without a value.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: None,
        }
    }

    /// Create an event carrying the target's value.
    pub fn with_value(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: Some(value.into()),
        }
    }

    /// Shorthand for a `click` event.
    pub fn click() -> Self {
        Self::new("click")
    }
}

// =============================================================================
// Text Attributes (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Text attributes used by the terminal host when drawing a line.
    ///
    /// Combine with bitwise OR: `Attr::BOLD | Attr::INVERSE`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Attr: u8 {
        const NONE = 0;
        const BOLD = 1 << 0;
        const DIM = 1 << 1;
        const UNDERLINE = 1 << 2;
        const INVERSE = 1 << 3;
    }
}

impl Attr {
    /// Default attributes for an element tag.
    pub fn for_tag(tag: &str) -> Self {
        match tag {
            "h1" | "h2" | "h3" | "strong" | "b" => Attr::BOLD,
            "em" | "i" | "small" => Attr::DIM,
            "a" | "u" => Attr::UNDERLINE,
            _ => Attr::NONE,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_tag_display() {
        assert_eq!(EffectTag::Placement.to_string(), "PLACEMENT");
        assert_eq!(EffectTag::Update.to_string(), "UPDATE");
        assert_eq!(EffectTag::Deletion.to_string(), "DELETION");
    }

    #[test]
    fn test_attr_for_tag() {
        assert_eq!(Attr::for_tag("h1"), Attr::BOLD);
        assert_eq!(Attr::for_tag("a"), Attr::UNDERLINE);
        assert_eq!(Attr::for_tag("div"), Attr::NONE);

        let combined = Attr::for_tag("b") | Attr::INVERSE;
        assert!(combined.contains(Attr::BOLD));
        assert!(combined.contains(Attr::INVERSE));
    }

    #[test]
    fn test_host_event_constructors() {
        let click = HostEvent::click();
        assert_eq!(click.kind, "click");
        assert_eq!(click.value, None);

        let input = HostEvent::with_value("input", "abc");
        assert_eq!(input.value.as_deref(), Some("abc"));
    }
}
