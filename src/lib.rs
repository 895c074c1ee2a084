//! # spark-fiber
//!
//! Fiber-based UI reconciliation with hook state and cooperative scheduling.
//!
//! ## Architecture
//!
//! An immutable element tree is rendered into a mutable host through a
//! double-buffered fiber tree:
//!
//! ```text
//! Element tree → render() → work loop (interruptible) → commit → Host
//!                  ▲                                        │
//!                  └──────── SetState::update() ◄───────────┘ (event listeners)
//! ```
//!
//! - The work loop builds a work-in-progress fiber tree one unit at a time,
//!   yielding whenever its [`Deadline`] runs out.
//! - Children are diffed by position against the committed tree.
//! - The host is only mutated during commit.
//!
//! ## Modules
//!
//! - [`element`] - Elements, props, components, the [`h!`] macro
//! - [`fiber`] - Fiber arena and traversal
//! - [`engine`] - [`Renderer`]: reconcile, hooks, work loop, commit
//! - [`host`] - [`Host`] trait, in-memory [`Document`], [`TerminalHost`]
//! - [`runtime`] - Terminal mount / tick / run loop
//! - [`config`] - [`RuntimeConfig`] with environment overrides
//! - [`logging`] - `tracing` subscriber setup
//!
//! ## Example
//!
//! ```ignore
//! use spark_fiber::{h, Component, Document, Hooks, Props, Renderer};
//!
//! fn app(props: &Props, hooks: &mut Hooks) -> Element {
//!     let (count, _set_count) = hooks.use_state(0);
//!     h!("p", None, "Count: ", count)
//! }
//!
//! let mut doc = Document::new();
//! let root = doc.create_container("root");
//! let mut renderer = Renderer::new(doc);
//! renderer.render(h!(Component::new(app)), root);
//! renderer.flush()?;
//! ```

pub mod config;
pub mod element;
pub mod engine;
pub mod error;
pub mod fiber;
pub mod host;
pub mod logging;
pub mod runtime;
pub mod types;

pub use types::{Attr, EffectTag, HostEvent};

pub use element::{
    Component, Element, ElementKind, ElementType, EventHandler, PropValue, Props, RenderFnPtr,
    create_element, create_text_element,
};

pub use fiber::{Fiber, FiberArena, FiberId};

pub use engine::{
    CommitStats, Deadline, Hooks, LoopState, Renderer, SetState, SliceOutcome, TimeBudget, UnitBudget,
    Unlimited,
};

pub use host::{Document, DocumentError, Host, Mutation, NodeId, TerminalHost};

pub use runtime::{MountHandle, mount, run, tick, unmount};

pub use config::{RenderMode, RuntimeConfig};

pub use error::RenderError;
