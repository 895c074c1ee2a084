//! Hooks - Positional state cells on component fibers.
//!
//! A component receives a [`Hooks`] cursor for the duration of one call. The
//! Nth `use_state` call on a fiber pairs with the Nth call on its alternate:
//! calling hooks conditionally or in a different order across renders is a
//! caller error and yields unspecified state.
//!
//! ```text
//! alternate fiber            new fiber
//! ┌──────────────────┐       ┌──────────────────┐
//! │ cell { 0, [+1] } │ ────► │ cell { 1, [] }   │   state folded over queue
//! │ cell { "a", [] } │ ────► │ cell { "a", [] } │
//! └──────────────────┘       └──────────────────┘
//! ```
//!
//! The alternate's queue is read, never drained. If the in-flight tree is
//! abandoned, the next render replays the same transitions again.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::RenderError;
use crate::fiber::HookSlot;

type Transition<T> = Rc<dyn Fn(T) -> T>;

// =============================================================================
// Update Mailbox
// =============================================================================

/// Shared between the engine and every [`SetState`] it hands out.
#[derive(Debug, Default)]
pub(crate) struct UpdateMailbox {
    /// At least one root has been committed.
    pub(crate) committed: Cell<bool>,
    /// A state update asked for a new render.
    pub(crate) pending: Cell<bool>,
}

// =============================================================================
// State Cell
// =============================================================================

struct StateCell<T> {
    state: T,
    queue: RefCell<Vec<Transition<T>>>,
}

impl<T: Clone> StateCell<T> {
    fn new(state: T) -> Self {
        Self {
            state,
            queue: RefCell::new(Vec::new()),
        }
    }

    /// Current state with every queued transition applied, oldest first.
    ///
    /// Folds over a snapshot, so a transition may itself queue on this cell.
    /// Anything it queues lands after the snapshot and shows on a later render.
    fn replay(&self) -> T {
        let queue: Vec<Transition<T>> = self.queue.borrow().clone();
        queue
            .iter()
            .fold(self.state.clone(), |state, transition| transition(state))
    }
}

// =============================================================================
// Set State
// =============================================================================

/// Handle that queues transitions on one hook cell.
pub struct SetState<T> {
    cell: Rc<StateCell<T>>,
    mailbox: Rc<UpdateMailbox>,
}

impl<T> Clone for SetState<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            mailbox: self.mailbox.clone(),
        }
    }
}

impl<T> fmt::Debug for SetState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetState")
            .field("queued", &self.cell.queue.borrow().len())
            .finish()
    }
}

impl<T: 'static> SetState<T> {
    /// Queue `transition` and request a new render.
    ///
    /// Fails with [`RenderError::NoCommittedRoot`] before the first commit;
    /// nothing is queued in that case.
    pub fn update(&self, transition: impl Fn(T) -> T + 'static) -> Result<(), RenderError> {
        if !self.mailbox.committed.get() {
            return Err(RenderError::NoCommittedRoot);
        }
        self.cell.queue.borrow_mut().push(Rc::new(transition));
        self.mailbox.pending.set(true);
        Ok(())
    }

    /// Queue a transition to a fixed value.
    pub fn set(&self, value: T) -> Result<(), RenderError>
    where
        T: Clone,
    {
        self.update(move |_| value.clone())
    }
}

// =============================================================================
// Hooks Cursor
// =============================================================================

/// Hook cursor for one component invocation.
pub struct Hooks {
    previous: Vec<HookSlot>,
    current: Vec<HookSlot>,
    mailbox: Rc<UpdateMailbox>,
}

impl Hooks {
    pub(crate) fn new(previous: Vec<HookSlot>, mailbox: Rc<UpdateMailbox>) -> Self {
        Self {
            previous,
            current: Vec::new(),
            mailbox,
        }
    }

    /// Index of the next hook call.
    pub fn index(&self) -> usize {
        self.current.len()
    }

    /// State hook.
    ///
    /// Returns the replayed state and a setter bound to this position.
    /// `initial` is only used when the position has no previous cell.
    pub fn use_state<T: Clone + 'static>(&mut self, initial: T) -> (T, SetState<T>) {
        let index = self.index();
        let state = match self.previous.get(index).cloned() {
            Some(slot) => match slot.downcast::<StateCell<T>>() {
                Ok(old) => old.replay(),
                Err(_) => {
                    tracing::warn!(index, "hook type changed between renders, starting fresh");
                    initial
                }
            },
            None => initial,
        };

        let cell = Rc::new(StateCell::new(state.clone()));
        self.current.push(cell.clone() as Rc<dyn Any>);

        let setter = SetState {
            cell,
            mailbox: self.mailbox.clone(),
        };
        (state, setter)
    }

    /// Hook list built by this invocation.
    pub(crate) fn finish(self) -> Vec<HookSlot> {
        self.current
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("previous", &self.previous.len())
            .field("index", &self.index())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
