//! Element Model - Immutable description of the desired UI shape.
//!
//! Elements are plain data produced fresh on every render. Constructing one
//! never touches a render target.
//!
//! Every element has a type and props:
//!
//! ```text
//! Text            props: { nodeValue: "hello", children: [] }
//! Host("div")     props: { id: "foo", children: [a, b] }
//! Component(App)  props: { name: "World", children: [] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use spark_fiber::{h, Props};
//!
//! let tree = h!("div", Some(Props::new().with("id", "foo")),
//!     h!("a", None, "bar"),
//!     h!("b"),
//! );
//! ```

mod props;

use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

use crate::engine::Hooks;

pub use props::{CHILDREN, EventHandler, NODE_VALUE, PropValue, Props, event_type, is_event, is_property};

// =============================================================================
// Component
// =============================================================================

type RenderFn = dyn Fn(&Props, &mut Hooks) -> Element;

/// Plain function pointer form of a component.
pub type RenderFnPtr = fn(&Props, &mut Hooks) -> Element;

/// What two components are compared by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Identity {
    /// Zero-sized fn items and non-capturing closures.
    Type(TypeId),
    /// Function pointers.
    Address(usize),
    /// Anything carrying state: the allocation behind this `Component`.
    Instance(usize),
}

/// A function component.
///
/// Two components are the same type to the reconciler when they run the
/// same function:
/// - a named `fn` or a non-capturing closure matches itself on every render
/// - a `fn` pointer matches any pointer to the same function
/// - a capturing closure or boxed function only matches clones of the
///   `Component` it was wrapped in; wrapping it again on the next render
///   makes a new type and resets its state
#[derive(Clone)]
pub struct Component {
    id: Identity,
    name: &'static str,
    render: Rc<RenderFn>,
}

impl Component {
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&Props, &mut Hooks) -> Element + 'static,
    {
        let pointer = (&render as &dyn Any).downcast_ref::<RenderFnPtr>().map(|f| *f as usize);
        let render: Rc<RenderFn> = Rc::new(render);

        let id = match pointer {
            Some(address) => Identity::Address(address),
            None if size_of::<F>() == 0 => Identity::Type(TypeId::of::<F>()),
            None => Identity::Instance(Rc::as_ptr(&render) as *const () as usize),
        };

        Self {
            id,
            name: std::any::type_name::<F>(),
            render,
        }
    }

    /// Type name of the underlying function.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn call(&self, props: &Props, hooks: &mut Hooks) -> Element {
        (self.render)(props, hooks)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.name).finish()
    }
}

// =============================================================================
// Element Type
// =============================================================================

/// The three kinds of element type.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementType {
    /// Text node sentinel.
    Text,
    /// Host tag, e.g. `"div"`.
    Host(String),
    /// Function component.
    Component(Component),
}

impl ElementType {
    pub fn is_text(&self) -> bool {
        matches!(self, ElementType::Text)
    }

    pub fn is_component(&self) -> bool {
        matches!(self, ElementType::Component(_))
    }

    /// Tag name for host types.
    pub fn tag(&self) -> Option<&str> {
        match self {
            ElementType::Host(tag) => Some(tag),
            _ => None,
        }
    }
}

impl From<&str> for ElementType {
    fn from(tag: &str) -> Self {
        ElementType::Host(tag.to_string())
    }
}

impl From<String> for ElementType {
    fn from(tag: String) -> Self {
        ElementType::Host(tag)
    }
}

impl From<Component> for ElementType {
    fn from(component: Component) -> Self {
        ElementType::Component(component)
    }
}

// =============================================================================
// Element
// =============================================================================

/// Which of the two element variants a value is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Text,
    Node,
}

/// Immutable description of one node and its children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub ty: ElementType,
    pub props: Props,
}

impl Element {
    pub fn kind(&self) -> ElementKind {
        if self.ty.is_text() {
            ElementKind::Text
        } else {
            ElementKind::Node
        }
    }

    pub fn children(&self) -> &[Element] {
        self.props.children()
    }
}

/// Build a node element.
///
/// `props` may be `None`; the resulting props always carry a normalized
/// `children` list built from `children`.
pub fn create_element(ty: impl Into<ElementType>, props: Option<Props>, children: Vec<Element>) -> Element {
    let props = props.unwrap_or_default().with_children(children);
    Element { ty: ty.into(), props }
}

/// Build a text element: `{ nodeValue: text, children: [] }`.
pub fn create_text_element(text: impl Into<String>) -> Element {
    Element {
        ty: ElementType::Text,
        props: Props::new().with(NODE_VALUE, PropValue::Str(text.into())),
    }
}

// Non-element children are coerced into text elements.

impl From<&str> for Element {
    fn from(text: &str) -> Self {
        create_text_element(text)
    }
}

impl From<String> for Element {
    fn from(text: String) -> Self {
        create_text_element(text)
    }
}

impl From<&String> for Element {
    fn from(text: &String) -> Self {
        create_text_element(text.as_str())
    }
}

macro_rules! text_coercion {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Element {
                fn from(value: $t) -> Self {
                    create_text_element(value.to_string())
                }
            }
        )*
    };
}

text_coercion!(i32, i64, u32, u64, usize, f64, bool, char);

/// Element construction shorthand.
///
/// `h!(type)` builds a childless node; `h!(type, props, children...)` coerces
/// every child with `Element::from`, so string and number literals become
/// text elements.
#[macro_export]
macro_rules! h {
    ($ty:expr) => {
        $crate::element::create_element($ty, None, ::std::vec::Vec::new())
    };
    ($ty:expr, $props:expr $(, $child:expr)* $(,)?) => {
        $crate::element::create_element(
            $ty,
            $props,
            ::std::vec![$($crate::element::Element::from($child)),*],
        )
    };
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Element {
        Element {
            ty: ElementType::Text,
            props: Props::new().with(NODE_VALUE, value),
        }
    }

    #[test]
    fn test_empty_div() {
        let actual = create_element("div", None, vec![]);
        let expected = Element {
            ty: ElementType::Host("div".to_string()),
            props: Props::new(),
        };
        assert_eq!(actual, expected);
        assert_eq!(actual.kind(), ElementKind::Node);
        assert!(actual.children().is_empty());
    }

    #[test]
    fn test_div_with_text() {
        let actual = create_element("div", None, vec![create_text_element("hello")]);
        assert_eq!(actual.children(), &[text("hello")]);
        assert_eq!(actual.children()[0].kind(), ElementKind::Text);
        assert!(actual.children()[0].children().is_empty());
    }

    #[test]
    fn test_nested_construction() {
        let actual = h!(
            "div",
            Some(Props::new().with("id", "foo")),
            h!("a", None, "bar"),
            h!("b"),
        );

        let expected = Element {
            ty: ElementType::Host("div".into()),
            props: Props::new().with("id", "foo").with_children(vec![
                Element {
                    ty: ElementType::Host("a".into()),
                    props: Props::new().with_children(vec![text("bar")]),
                },
                Element {
                    ty: ElementType::Host("b".into()),
                    props: Props::new(),
                },
            ]),
        };

        assert_eq!(actual, expected);
    }

    #[test]
    fn test_text_coercion() {
        let el = h!("p", None, "Count: ", 1);
        assert_eq!(el.children(), &[text("Count: "), text("1")]);
        assert_eq!(el.children()[1].props.node_value(), Some("1"));
    }

    #[test]
    fn test_construction_is_pure() {
        let a = h!("ul", None, h!("li", None, "one"), h!("li", None, "two"));
        let b = h!("ul", None, h!("li", None, "one"), h!("li", None, "two"));
        assert_eq!(a, b);
    }

    fn app(_props: &Props, _hooks: &mut Hooks) -> Element {
        h!("div")
    }

    fn other(_props: &Props, _hooks: &mut Hooks) -> Element {
        h!("span")
    }

    #[test]
    fn test_component_identity() {
        assert_eq!(Component::new(app), Component::new(app));
        assert_ne!(Component::new(app), Component::new(other));
        assert!(Component::new(app).name().ends_with("app"));

        let inline = || Component::new(|_: &Props, _: &mut Hooks| h!("i"));
        assert_eq!(inline(), inline());

        let el = create_element(Component::new(app), Some(Props::new().with("name", "x")), vec![]);
        assert!(el.ty.is_component());
        assert_eq!(el.ty.tag(), None);
    }

    #[test]
    fn test_fn_pointer_identity() {
        let a: RenderFnPtr = app;
        let b: RenderFnPtr = other;

        assert_ne!(Component::new(a), Component::new(b));
        assert_eq!(Component::new(a), Component::new(app as RenderFnPtr));
    }

    #[test]
    fn test_stateful_closure_identity() {
        let make = |label: &'static str| Component::new(move |_: &Props, _: &mut Hooks| h!("p", None, label));
        let first = make("a");

        assert_eq!(first, first.clone());
        assert_ne!(first, make("a"));

        let boxed: Box<dyn Fn(&Props, &mut Hooks) -> Element> = Box::new(app);
        let other_boxed: Box<dyn Fn(&Props, &mut Hooks) -> Element> = Box::new(other);
        assert_ne!(Component::new(boxed), Component::new(other_boxed));
    }
}
