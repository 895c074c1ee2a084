//! Engine - Render context, work loop and commit.
//!
//! A [`Renderer`] owns everything one render pipeline needs:
//! - the host it mutates
//! - the fiber arena holding the current and work-in-progress trees
//! - the deletion list and the work-loop cursor
//! - the mailbox state setters post render requests to
//!
//! # Lifecycle
//!
//! ```text
//! render(element, container) ──┐
//! SetState::update(f) ─────────┤ seed work-in-progress root
//!                              ▼
//!   Idle ──► Working ──(cursor exhausted)──► PendingCommit ──► commit ──► Idle
//!              ▲   │
//!              └───┘ one unit per step; yield when the deadline runs out
//! ```
//!
//! The host is only attached to, detached from and re-propped during commit.
//! Host nodes for new fibers are allocated during render but stay detached
//! until then. When an in-flight render is abandoned, those nodes are handed
//! back through [`Host::discard`].

mod commit;
mod dom;
mod hooks;
mod reconcile;
mod scheduler;

use std::rc::Rc;

use crate::element::{Element, ElementType};
use crate::error::RenderError;
use crate::fiber::{Fiber, FiberArena, FiberId};
use crate::host::Host;
use crate::types::EffectTag;

use self::hooks::UpdateMailbox;

pub use commit::CommitStats;
pub use dom::{create_dom, update_dom};
pub use hooks::{Hooks, SetState};
pub use reconcile::reconcile_children;
pub use scheduler::{Deadline, LoopState, SliceOutcome, TimeBudget, UnitBudget, Unlimited};

// =============================================================================
// Renderer
// =============================================================================

/// One render pipeline bound to one host.
pub struct Renderer<H: Host> {
    host: H,
    fibers: FiberArena<H::Node>,
    current_root: Option<FiberId>,
    wip_root: Option<FiberId>,
    deletions: Vec<FiberId>,
    next_unit: Option<FiberId>,
    requests: Rc<UpdateMailbox>,
}

impl<H: Host> Renderer<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            fibers: FiberArena::new(),
            current_root: None,
            wip_root: None,
            deletions: Vec::new(),
            next_unit: None,
            requests: Rc::new(UpdateMailbox::default()),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Direct host access. Mutating nodes the engine owns desynchronizes
    /// the committed tree from the host.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn fibers(&self) -> &FiberArena<H::Node> {
        &self.fibers
    }

    /// Root of the last committed tree.
    pub fn current_root(&self) -> Option<FiberId> {
        self.current_root
    }

    pub fn state(&self) -> LoopState {
        match (self.next_unit, self.wip_root) {
            (Some(_), _) => LoopState::Working,
            (None, Some(_)) => LoopState::PendingCommit,
            (None, None) => LoopState::Idle,
        }
    }

    /// True while a render is in flight or a state update is waiting.
    pub fn has_pending_work(&self) -> bool {
        self.state() != LoopState::Idle || self.requests.pending.get()
    }

    // -------------------------------------------------------------------------
    // Entry points
    // -------------------------------------------------------------------------

    /// Start rendering `element` into `container`.
    ///
    /// Any in-flight work-in-progress tree is abandoned. Nothing reaches the
    /// host until the work loop commits.
    pub fn render(&mut self, element: Element, container: H::Node) {
        let mut root = Fiber::root(container, element);
        root.alternate = self.current_root;
        self.requests.pending.set(false);
        self.seed(root);
        tracing::debug!(fibers = self.fibers.len(), "render seeded");
    }

    /// Restart from the committed root if a state update asked for it.
    fn drain_requests(&mut self) -> Result<(), RenderError> {
        if !self.requests.pending.replace(false) {
            return Ok(());
        }
        let current_id = self.current_root.ok_or(RenderError::NoCommittedRoot)?;
        let current = self.fibers.fiber(current_id)?;

        let mut root = Fiber::new(current.ty.clone(), current.props.clone());
        root.node = current.node.clone();
        root.alternate = Some(current_id);

        if self.wip_root.is_some() {
            tracing::debug!("state update, discarding in-flight render");
        } else {
            tracing::debug!("state update, re-rendering");
        }
        self.seed(root);
        Ok(())
    }

    fn seed(&mut self, root: Fiber<H::Node>) {
        self.discard_in_flight();
        let id = self.fibers.insert(root);
        self.wip_root = Some(id);
        self.deletions.clear();
        self.next_unit = Some(id);
    }

    /// Return the nodes allocated for the in-flight tree's placements.
    fn discard_in_flight(&mut self) {
        let Some(root) = self.wip_root.take() else { return };
        let mut discarded = 0;
        for id in self.fibers.descendants(root) {
            let Some(fiber) = self.fibers.get(id) else { continue };
            let (Some(EffectTag::Placement), Some(node)) = (fiber.effect, &fiber.node) else {
                continue;
            };
            match self.host.discard(node) {
                Ok(()) => discarded += 1,
                Err(err) => tracing::warn!(?id, %err, "failed to discard node"),
            }
        }
        tracing::trace!(discarded, "abandoned in-flight render");
    }

    // -------------------------------------------------------------------------
    // Work loop
    // -------------------------------------------------------------------------

    /// Run one slice of work against `deadline`.
    ///
    /// Processes units until none remain or the deadline reports zero time
    /// after a unit. Commits once every unit is done.
    pub fn work_loop(&mut self, deadline: &mut impl Deadline) -> Result<SliceOutcome, RenderError> {
        self.drain_requests()?;

        let mut units = 0;
        while let Some(id) = self.next_unit {
            self.perform_unit_of_work(id)?;
            units += 1;
            deadline.unit_done();
            self.drain_requests()?;

            if deadline.time_remaining().is_zero() {
                break;
            }
        }

        if let (None, Some(root)) = (self.next_unit, self.wip_root) {
            let stats = self.commit(root)?;
            return Ok(SliceOutcome::Committed { units, stats });
        }

        if self.next_unit.is_some() {
            tracing::trace!(units, "slice yielded");
            Ok(SliceOutcome::Yielded { units })
        } else {
            Ok(SliceOutcome::Idle)
        }
    }

    /// Run slices without a budget until the engine is idle.
    ///
    /// Returns the stats of the last commit, if any happened.
    pub fn flush(&mut self) -> Result<Option<CommitStats>, RenderError> {
        let mut last = None;
        loop {
            match self.work_loop(&mut Unlimited)? {
                SliceOutcome::Idle => return Ok(last),
                SliceOutcome::Committed { stats, .. } => {
                    last = Some(stats);
                    if !self.has_pending_work() {
                        return Ok(last);
                    }
                }
                SliceOutcome::Yielded { .. } => {}
            }
        }
    }

    /// Process one fiber and advance the cursor.
    fn perform_unit_of_work(&mut self, id: FiberId) -> Result<(), RenderError> {
        let fiber = self.fibers.fiber(id)?;
        let ty = fiber.ty.clone();
        tracing::trace!(?id, ?ty, "unit of work");

        let children = match &ty {
            ElementType::Component(component) => {
                let previous = fiber
                    .alternate
                    .and_then(|alt| self.fibers.get(alt))
                    .map(|alt| alt.hooks.clone())
                    .unwrap_or_default();
                let props = fiber.props.clone();

                let mut hooks = Hooks::new(previous, self.requests.clone());
                let child = component.call(&props, &mut hooks);
                self.fibers.fiber_mut(id)?.hooks = hooks.finish();
                vec![child]
            }
            _ => {
                let children = fiber.props.children().to_vec();
                if fiber.node.is_none() {
                    let props = fiber.props.clone();
                    let node = create_dom(&mut self.host, id, &ty, &props)?;
                    self.fibers.fiber_mut(id)?.node = Some(node);
                }
                children
            }
        };

        reconcile_children(&mut self.fibers, &mut self.deletions, id, children)?;
        self.next_unit = self.fibers.next_unit(id);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Commit
    // -------------------------------------------------------------------------

    fn commit(&mut self, root: FiberId) -> Result<CommitStats, RenderError> {
        let deletions = std::mem::take(&mut self.deletions);
        let stats = commit::commit_root(&mut self.host, &self.fibers, root, &deletions)?;

        self.current_root = Some(root);
        self.wip_root = None;
        self.requests.committed.set(true);

        let released = self.fibers.release_unreachable(root);
        tracing::debug!(
            placements = stats.placements,
            updates = stats.updates,
            deletions = stats.deletions,
            released,
            "committed"
        );
        Ok(stats)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Props;
    use crate::h;
    use crate::host::{Document, Mutation, NodeId};
    use std::cell::RefCell;

    fn setup() -> (Renderer<Document>, NodeId) {
        let mut doc = Document::with_mutation_log();
        let container = doc.create_container("root");
        (Renderer::new(doc), container)
    }

    #[test]
    fn test_render_and_flush() {
        let (mut renderer, container) = setup();
        assert_eq!(renderer.state(), LoopState::Idle);

        renderer.render(h!("div", None, h!("h1", None, "Hello, World"), h!("p", None, "Hi")), container);
        assert_eq!(renderer.state(), LoopState::Working);
        assert!(renderer.host().children(container).is_empty());

        let stats = renderer.flush().unwrap().unwrap();
        assert_eq!(stats.placements, 5);
        assert_eq!(renderer.state(), LoopState::Idle);
        assert_eq!(renderer.host().text_content(container), "Hello, WorldHi");
    }

    #[test]
    fn test_idle_loop_does_nothing() {
        let (mut renderer, _) = setup();
        assert_eq!(renderer.work_loop(&mut Unlimited).unwrap(), SliceOutcome::Idle);
        assert_eq!(renderer.flush().unwrap(), None);
    }

    #[test]
    fn test_yields_after_budget() {
        let (mut renderer, container) = setup();
        renderer.render(h!("div", None, "a", "b"), container);

        // root, div, "a", "b"
        let first = renderer.work_loop(&mut UnitBudget::new(2)).unwrap();
        assert_eq!(first, SliceOutcome::Yielded { units: 2 });
        assert!(renderer.host().children(container).is_empty());

        let second = renderer.work_loop(&mut UnitBudget::new(2)).unwrap();
        assert!(second.is_committed());
        assert_eq!(second.units(), 2);
        assert_eq!(renderer.host().text_content(container), "ab");
    }

    #[test]
    fn test_exact_exhaustion_commits_in_same_slice() {
        let (mut renderer, container) = setup();
        renderer.render(h!("div"), container);

        // root, div
        let outcome = renderer.work_loop(&mut UnitBudget::new(2)).unwrap();
        assert!(outcome.is_committed());
    }

    #[test]
    fn test_rerender_reuses_nodes() {
        let (mut renderer, container) = setup();
        let tree = || h!("div", Some(Props::new().with("id", "a")), "text");

        renderer.render(tree(), container);
        renderer.flush().unwrap();
        let div = renderer.host().find_by_tag(container, "div").unwrap();
        renderer.host_mut().take_mutations();

        renderer.render(tree(), container);
        let stats = renderer.flush().unwrap().unwrap();

        assert_eq!(stats.placements, 0);
        assert_eq!(stats.deletions, 0);
        assert!(renderer.host_mut().take_mutations().is_empty());
        assert_eq!(renderer.host().find_by_tag(container, "div"), Some(div));
    }

    #[test]
    fn test_old_tree_released_after_commit() {
        let (mut renderer, container) = setup();
        renderer.render(h!("ul", None, h!("li"), h!("li"), h!("li")), container);
        renderer.flush().unwrap();
        let live = renderer.fibers().len();

        renderer.render(h!("ul", None, h!("li")), container);
        renderer.flush().unwrap();

        // root, ul, li
        assert_eq!(renderer.fibers().len(), 3);
        assert!(live > 3);
        let root = renderer.current_root().unwrap();
        assert!(renderer.fibers().descendants(root).iter().all(|&id| renderer.fibers().get(id).unwrap().alternate.is_none()));
    }

    #[test]
    fn test_render_supersedes_in_flight_work() {
        let (mut renderer, container) = setup();
        renderer.render(h!("p", None, "first"), container);
        // root, p: the <p> node exists but is not attached
        renderer.work_loop(&mut UnitBudget::new(2)).unwrap();
        assert_eq!(renderer.host().len(), 2);

        renderer.render(h!("p", None, "second"), container);
        renderer.flush().unwrap();

        assert_eq!(renderer.host().text_content(container), "second");
        assert_eq!(renderer.host().children(container).len(), 1);
        // container, p, "second"
        assert_eq!(renderer.host().len(), 3);
    }

    fn counter(_: &Props, hooks: &mut Hooks) -> Element {
        let (count, set_count) = hooks.use_state(0);
        SETTER.with(|s| *s.borrow_mut() = Some(set_count));
        h!("span", None, count)
    }

    thread_local! {
        static SETTER: RefCell<Option<SetState<i32>>> = const { RefCell::new(None) };
    }

    fn setter() -> SetState<i32> {
        SETTER.with(|s| s.borrow().clone()).unwrap()
    }

    #[test]
    fn test_state_update_rerenders() {
        let (mut renderer, container) = setup();
        renderer.render(h!(crate::element::Component::new(counter)), container);
        renderer.flush().unwrap();
        assert_eq!(renderer.host().text_content(container), "0");
        renderer.host_mut().take_mutations();

        setter().update(|n| n + 1).unwrap();
        setter().update(|n| n * 5).unwrap();
        assert!(renderer.has_pending_work());

        let stats = renderer.flush().unwrap().unwrap();
        assert_eq!(stats.placements, 0);
        assert_eq!(renderer.host().text_content(container), "5");

        let log = renderer.host_mut().take_mutations();
        assert_eq!(log.len(), 1);
        assert!(matches!(&log[0], Mutation::SetProperty { name, .. } if name == "nodeValue"));
    }

    #[test]
    fn test_state_update_restarts_in_flight_render() {
        let (mut renderer, container) = setup();
        renderer.render(h!("div", None, h!(crate::element::Component::new(counter)), h!("p")), container);
        renderer.flush().unwrap();

        // Setter bound to the committed cell, as a host listener would be.
        let set = setter();
        set.update(|n| n + 1).unwrap();
        // root, div, counter
        let outcome = renderer.work_loop(&mut UnitBudget::new(3)).unwrap();
        assert_eq!(outcome, SliceOutcome::Yielded { units: 3 });
        set.update(|n| n + 10).unwrap();

        renderer.flush().unwrap();
        assert_eq!(renderer.host().text_content(container), "11");
    }
}
