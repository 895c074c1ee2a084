//! Host - The render target the engine mutates.
//!
//! The engine never touches a render target directly. It allocates nodes while
//! building the work-in-progress tree and applies every other mutation during
//! commit, all through [`Host`].
//!
//! Two hosts ship with the crate:
//! - [`Document`] - in-memory retained node tree (tests, headless use)
//! - [`TerminalHost`] - a `Document` drawn to the terminal with crossterm

mod document;
mod terminal;

use std::error::Error;
use std::fmt;

use crate::element::{EventHandler, PropValue};

pub use document::{DocNode, Document, DocumentError, Mutation, NodeId, NodeKind};
pub use terminal::{Dirty, Line, Span, TerminalHost};

/// Mutation interface consumed by the engine.
///
/// Failures are passed through to whoever drives the work loop; the engine
/// does not interpret them.
pub trait Host {
    /// Handle to a host node. Cloned into fibers, so keep it cheap.
    type Node: Clone + fmt::Debug;
    type Error: Error + Send + Sync + 'static;

    fn create_text_node(&mut self, text: &str) -> Result<Self::Node, Self::Error>;

    fn create_element(&mut self, tag: &str) -> Result<Self::Node, Self::Error>;

    /// Assign a property. `None` clears it to the empty value.
    fn set_property(
        &mut self,
        node: &Self::Node,
        name: &str,
        value: Option<&PropValue>,
    ) -> Result<(), Self::Error>;

    fn add_event_listener(
        &mut self,
        node: &Self::Node,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), Self::Error>;

    fn remove_event_listener(
        &mut self,
        node: &Self::Node,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), Self::Error>;

    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), Self::Error>;

    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), Self::Error>;

    /// Release a node that was created but will never be attached, because
    /// the render that created it was abandoned. No-op by default.
    fn discard(&mut self, node: &Self::Node) -> Result<(), Self::Error> {
        let _ = node;
        Ok(())
    }
}
