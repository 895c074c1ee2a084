//! Reconciler - Positional child diff.
//!
//! Old children (the alternate's child chain) and new child elements are
//! walked in lockstep by index. Elements are matched by position only, so
//! reordering children re-creates or re-props nodes rather than moving them.
//!
//! ```text
//! old:  div   p     span
//! new:  div   h1
//!       ───   ───   ────
//!       UPD   DEL   DEL      (old p, old span go to the deletion list)
//!             PLC            (new h1)
//! ```

use crate::element::Element;
use crate::error::RenderError;
use crate::fiber::{Fiber, FiberArena, FiberId};
use crate::types::EffectTag;

/// Build `wip`'s child chain from `elements`, tagging effects.
///
/// Old fibers with no same-type element at their position are tagged
/// [`EffectTag::Deletion`] and pushed onto `deletions`.
pub fn reconcile_children<N: Clone>(
    fibers: &mut FiberArena<N>,
    deletions: &mut Vec<FiberId>,
    wip: FiberId,
    elements: Vec<Element>,
) -> Result<(), RenderError> {
    let alternate = fibers.fiber(wip)?.alternate;
    let mut old = alternate.and_then(|id| fibers.get(id)).and_then(|f| f.child);
    fibers.fiber_mut(wip)?.child = None;

    let mut elements = elements.into_iter();
    let mut prev: Option<FiberId> = None;

    loop {
        let element = elements.next();
        let old_fiber = old.and_then(|id| fibers.get(id).map(|f| (id, f)));
        if element.is_none() && old_fiber.is_none() {
            break;
        }

        let same_type = match (&element, old_fiber) {
            (Some(element), Some((_, fiber))) => element.ty == fiber.ty,
            _ => false,
        };
        let reused = old_fiber.filter(|_| same_type).map(|(id, f)| (id, f.node.clone()));
        let next_old = old_fiber.and_then(|(_, f)| f.sibling);

        let new_fiber = match (element, reused) {
            (Some(element), Some((old_id, node))) => {
                tracing::trace!(?old_id, "reconcile: update");
                let mut fiber = Fiber::new(element.ty, element.props);
                fiber.node = node;
                fiber.alternate = Some(old_id);
                fiber.effect = Some(EffectTag::Update);
                Some(fiber)
            }
            (Some(element), None) => {
                tracing::trace!(ty = ?element.ty, "reconcile: placement");
                let mut fiber = Fiber::new(element.ty, element.props);
                fiber.effect = Some(EffectTag::Placement);
                Some(fiber)
            }
            (None, _) => None,
        };

        if let (Some(old_id), false) = (old, same_type) {
            if let Some(fiber) = fibers.get_mut(old_id) {
                tracing::trace!(?old_id, "reconcile: deletion");
                fiber.effect = Some(EffectTag::Deletion);
                deletions.push(old_id);
            }
        }

        if let Some(mut fiber) = new_fiber {
            fiber.parent = Some(wip);
            let id = fibers.insert(fiber);
            match prev {
                Some(prev) => fibers.fiber_mut(prev)?.sibling = Some(id),
                None => fibers.fiber_mut(wip)?.child = Some(id),
            }
            prev = Some(id);
        }

        old = next_old;
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Component, Props};
    use crate::engine::Hooks;
    use crate::h;

    /// Seed an old parent with children, then a new parent pointing at it.
    fn setup(old_children: Vec<Element>) -> (FiberArena<u32>, FiberId, Vec<FiberId>) {
        let mut arena = FiberArena::new();
        let old_parent = arena.insert(Fiber::root(0, h!("div")));
        let mut deletions = Vec::new();
        reconcile_children(&mut arena, &mut deletions, old_parent, old_children).unwrap();

        // Give old fibers nodes, as if committed.
        let old_ids: Vec<FiberId> = arena.children(old_parent).collect();
        for (i, &id) in old_ids.iter().enumerate() {
            arena.get_mut(id).unwrap().node = Some(i as u32 + 1);
        }

        let mut wip = Fiber::root(0, h!("div"));
        wip.alternate = Some(old_parent);
        let wip = arena.insert(wip);
        (arena, wip, old_ids)
    }

    fn effects(arena: &FiberArena<u32>, parent: FiberId) -> Vec<EffectTag> {
        arena.children(parent).filter_map(|id| arena.get(id).unwrap().effect).collect()
    }

    #[test]
    fn test_first_render_places_everything() {
        let mut arena: FiberArena<u32> = FiberArena::new();
        let root = arena.insert(Fiber::root(0, h!("div")));
        let mut deletions = Vec::new();

        reconcile_children(&mut arena, &mut deletions, root, vec![h!("a"), h!("b"), "text".into()]).unwrap();

        assert_eq!(effects(&arena, root), vec![EffectTag::Placement; 3]);
        assert!(deletions.is_empty());
        for id in arena.children(root) {
            let fiber = arena.get(id).unwrap();
            assert_eq!(fiber.parent, Some(root));
            assert!(fiber.node.is_none());
            assert!(fiber.alternate.is_none());
        }
    }

    #[test]
    fn test_same_type_reuses_node() {
        let (mut arena, wip, old) = setup(vec![h!("p", None, "a"), "t".into()]);
        let mut deletions = Vec::new();

        reconcile_children(&mut arena, &mut deletions, wip, vec![h!("p", None, "b"), "u".into()]).unwrap();

        let new: Vec<FiberId> = arena.children(wip).collect();
        assert_eq!(effects(&arena, wip), vec![EffectTag::Update, EffectTag::Update]);
        assert_eq!(arena.get(new[0]).unwrap().node, Some(1));
        assert_eq!(arena.get(new[0]).unwrap().alternate, Some(old[0]));
        assert_eq!(arena.get(new[1]).unwrap().props.node_value(), Some("u"));
        assert!(deletions.is_empty());
    }

    #[test]
    fn test_type_change_replaces() {
        let (mut arena, wip, old) = setup(vec![h!("p"), h!("span")]);
        let mut deletions = Vec::new();

        reconcile_children(&mut arena, &mut deletions, wip, vec![h!("p"), h!("b")]).unwrap();

        let new: Vec<FiberId> = arena.children(wip).collect();
        assert_eq!(effects(&arena, wip), vec![EffectTag::Update, EffectTag::Placement]);
        assert_eq!(arena.get(new[1]).unwrap().node, None);
        assert_eq!(arena.get(new[1]).unwrap().alternate, None);
        assert_eq!(deletions, vec![old[1]]);
        assert_eq!(arena.get(old[1]).unwrap().effect, Some(EffectTag::Deletion));
    }

    #[test]
    fn test_removed_tail_is_deleted() {
        let (mut arena, wip, old) = setup(vec![h!("li"), h!("li"), h!("li"), h!("li")]);
        let mut deletions = Vec::new();

        reconcile_children(&mut arena, &mut deletions, wip, vec![h!("li")]).unwrap();

        assert_eq!(arena.children(wip).count(), 1);
        assert_eq!(deletions, old[1..].to_vec());
        let only = arena.children(wip).next().unwrap();
        assert_eq!(arena.get(only).unwrap().sibling, None);
    }

    #[test]
    fn test_removing_middle_is_positional() {
        // [li(a), p, li(b)] -> [li(a), li(b)]: position 1 changes type, position 2 disappears
        let (mut arena, wip, old) = setup(vec![h!("li", None, "a"), h!("p"), h!("li", None, "b")]);
        let mut deletions = Vec::new();

        reconcile_children(&mut arena, &mut deletions, wip, vec![h!("li", None, "a"), h!("li", None, "b")]).unwrap();

        assert_eq!(effects(&arena, wip), vec![EffectTag::Update, EffectTag::Placement]);
        assert_eq!(deletions, vec![old[1], old[2]]);
    }

    fn app(_: &Props, _: &mut Hooks) -> Element {
        h!("div")
    }

    fn other(_: &Props, _: &mut Hooks) -> Element {
        h!("div")
    }

    #[test]
    fn test_components_match_by_function() {
        let (mut arena, wip, old) = setup(vec![h!(Component::new(app)), h!(Component::new(app))]);
        let mut deletions = Vec::new();

        reconcile_children(&mut arena, &mut deletions, wip, vec![h!(Component::new(app)), h!(Component::new(other))])
            .unwrap();

        assert_eq!(effects(&arena, wip), vec![EffectTag::Update, EffectTag::Placement]);
        assert_eq!(deletions, vec![old[1]]);
    }
}
