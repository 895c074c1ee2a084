//! Fiber Tree - Mutable work representation of the element tree.
//!
//! Fibers live in a slot map and refer to each other by [`FiberId`]:
//!
//! ```text
//!            parent (non-owning)
//!   Fiber ◄──────────────────────── child fibers
//!     │ child (first child)
//!     ▼
//!   Fiber ──sibling──► Fiber ──sibling──► Fiber
//!     ┆ alternate (non-owning, previous committed tree)
//!     ▼
//!   Fiber
//! ```
//!
//! Owning edges are `child`/`sibling` only. `parent` and `alternate` are plain
//! ids; a stale id simply resolves to `None` once its fiber has been released.
//!
//! Two trees share the arena at most: the committed (current) tree and the
//! work-in-progress tree being built from it. After each commit everything not
//! reachable from the new current root is released.

use std::any::Any;
use std::collections::HashSet;
use std::rc::Rc;

use slotmap::SlotMap;

use crate::element::{Element, ElementType, Props};
use crate::error::RenderError;
use crate::types::EffectTag;

slotmap::new_key_type! {
    /// Key of a fiber in a [`FiberArena`].
    pub struct FiberId;
}

/// Type-erased hook cell stored on component fibers.
pub type HookSlot = Rc<dyn Any>;

/// Tag used for the synthetic root fiber wrapping the host container.
pub const ROOT_TAG: &str = "#root";

// =============================================================================
// Fiber
// =============================================================================

/// One unit of work: an element's position in one render generation.
///
/// `N` is the host's node handle type.
#[derive(Debug)]
pub struct Fiber<N> {
    pub ty: ElementType,
    pub props: Props,
    /// Backing host node. Always `None` for component fibers.
    pub node: Option<N>,
    pub parent: Option<FiberId>,
    pub child: Option<FiberId>,
    pub sibling: Option<FiberId>,
    /// Fiber at the same position in the previously committed tree.
    pub alternate: Option<FiberId>,
    pub effect: Option<EffectTag>,
    /// Hook cells, in call order. Only component fibers have any.
    pub hooks: Vec<HookSlot>,
}

impl<N> Fiber<N> {
    pub fn new(ty: ElementType, props: Props) -> Self {
        Self {
            ty,
            props,
            node: None,
            parent: None,
            child: None,
            sibling: None,
            alternate: None,
            effect: None,
            hooks: Vec::new(),
        }
    }

    /// Synthetic root: a host fiber wrapping `container` whose sole child is `element`.
    pub fn root(container: N, element: Element) -> Self {
        let mut fiber = Self::new(
            ElementType::Host(ROOT_TAG.to_string()),
            Props::new().with_children(vec![element]),
        );
        fiber.node = Some(container);
        fiber
    }

    pub fn is_component(&self) -> bool {
        self.ty.is_component()
    }
}

// =============================================================================
// Arena
// =============================================================================

/// Storage for every live fiber.
#[derive(Debug)]
pub struct FiberArena<N> {
    fibers: SlotMap<FiberId, Fiber<N>>,
}

impl<N> Default for FiberArena<N> {
    fn default() -> Self {
        Self {
            fibers: SlotMap::with_key(),
        }
    }
}

impl<N> FiberArena<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, fiber: Fiber<N>) -> FiberId {
        self.fibers.insert(fiber)
    }

    pub fn get(&self, id: FiberId) -> Option<&Fiber<N>> {
        self.fibers.get(id)
    }

    pub fn get_mut(&mut self, id: FiberId) -> Option<&mut Fiber<N>> {
        self.fibers.get_mut(id)
    }

    /// Like [`FiberArena::get`] but a missing fiber is an error.
    pub fn fiber(&self, id: FiberId) -> Result<&Fiber<N>, RenderError> {
        self.fibers.get(id).ok_or(RenderError::UnknownFiber(id))
    }

    pub fn fiber_mut(&mut self, id: FiberId) -> Result<&mut Fiber<N>, RenderError> {
        self.fibers.get_mut(id).ok_or(RenderError::UnknownFiber(id))
    }

    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }

    /// Iterate the child chain of `id`.
    pub fn children(&self, id: FiberId) -> impl Iterator<Item = FiberId> + '_ {
        let first = self.get(id).and_then(|f| f.child);
        std::iter::successors(first, move |&c| self.get(c).and_then(|f| f.sibling))
    }

    /// Pre-order list of every fiber below `root` (root excluded).
    pub fn descendants(&self, root: FiberId) -> Vec<FiberId> {
        let mut out = Vec::new();
        let mut stack: Vec<FiberId> = self.get(root).and_then(|f| f.child).into_iter().collect();

        while let Some(id) = stack.pop() {
            let Some(fiber) = self.get(id) else { continue };
            out.push(id);
            if let Some(sibling) = fiber.sibling {
                stack.push(sibling);
            }
            if let Some(child) = fiber.child {
                stack.push(child);
            }
        }
        out
    }

    /// Next unit of work after `id` in depth-first pre-order.
    ///
    /// First child if any; otherwise the sibling of the nearest ancestor
    /// (self included) that has one. `None` once the walk reaches the root.
    pub fn next_unit(&self, id: FiberId) -> Option<FiberId> {
        let fiber = self.get(id)?;
        if let Some(child) = fiber.child {
            return Some(child);
        }

        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let fiber = self.get(current)?;
            if let Some(sibling) = fiber.sibling {
                return Some(sibling);
            }
            cursor = fiber.parent;
        }
        None
    }

    /// Nearest ancestor of `id` that owns a host node.
    ///
    /// Component fibers own no node and are skipped.
    pub fn host_parent(&self, id: FiberId) -> Option<FiberId> {
        let mut cursor = self.get(id)?.parent;
        while let Some(current) = cursor {
            let fiber = self.get(current)?;
            if fiber.node.is_some() {
                return Some(current);
            }
            cursor = fiber.parent;
        }
        None
    }

    /// Release every fiber not reachable from `root` and cut the surviving
    /// tree's `alternate` links.
    ///
    /// Returns the number of fibers released.
    pub fn release_unreachable(&mut self, root: FiberId) -> usize {
        let mut live: HashSet<FiberId> = self.descendants(root).into_iter().collect();
        live.insert(root);

        let before = self.fibers.len();
        self.fibers.retain(|id, _| live.contains(&id));
        for fiber in self.fibers.values_mut() {
            fiber.alternate = None;
        }
        before - self.fibers.len()
    }
}

// =============================================================================
// Tests
// =============================================================================
