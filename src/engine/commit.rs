//! Commit - Apply accumulated effects to the host in one pass.
//!
//! 1. every fiber in the deletion list runs the deletion routine
//! 2. the work-in-progress subtree is walked depth-first, child before sibling
//!
//! Placement appends to the end of the host parent. A new node that lands
//! between surviving siblings ends up after them.

use crate::error::RenderError;
use crate::fiber::{FiberArena, FiberId};
use crate::host::Host;
use crate::types::EffectTag;

use super::dom::update_dom;

/// Fibers processed per effect tag during one commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitStats {
    pub placements: usize,
    pub updates: usize,
    pub deletions: usize,
}

impl CommitStats {
    pub fn total(&self) -> usize {
        self.placements + self.updates + self.deletions
    }
}

/// Commit the tree under `root` plus `deletions`.
pub fn commit_root<H: Host>(
    host: &mut H,
    fibers: &FiberArena<H::Node>,
    root: FiberId,
    deletions: &[FiberId],
) -> Result<CommitStats, RenderError> {
    let mut stats = CommitStats::default();

    for &id in deletions {
        commit_work(host, fibers, id, &mut stats)?;
    }

    let mut stack: Vec<FiberId> = fibers.fiber(root)?.child.into_iter().collect();
    while let Some(id) = stack.pop() {
        commit_work(host, fibers, id, &mut stats)?;

        let fiber = fibers.fiber(id)?;
        if let Some(sibling) = fiber.sibling {
            stack.push(sibling);
        }
        if let Some(child) = fiber.child {
            stack.push(child);
        }
    }

    Ok(stats)
}

fn commit_work<H: Host>(
    host: &mut H,
    fibers: &FiberArena<H::Node>,
    id: FiberId,
    stats: &mut CommitStats,
) -> Result<(), RenderError> {
    let parent_node = fibers
        .host_parent(id)
        .and_then(|parent| fibers.get(parent))
        .and_then(|parent| parent.node.as_ref())
        .ok_or(RenderError::MissingHostParent { fiber: id })?;
    let fiber = fibers.fiber(id)?;

    match fiber.effect {
        Some(EffectTag::Placement) => {
            if let Some(node) = &fiber.node {
                host.append_child(parent_node, node).map_err(RenderError::host)?;
            }
            stats.placements += 1;
        }
        Some(EffectTag::Update) => {
            if let (Some(node), Some(alternate)) = (&fiber.node, fiber.alternate) {
                let prev = &fibers.fiber(alternate)?.props;
                update_dom(host, node, prev, &fiber.props)?;
            }
            stats.updates += 1;
        }
        Some(EffectTag::Deletion) => {
            commit_deletion(host, fibers, id, parent_node)?;
            stats.deletions += 1;
        }
        None => {}
    }

    Ok(())
}

/// Remove the host node(s) of `id` from `parent_node`.
///
/// Component fibers own no node; their children are removed instead.
fn commit_deletion<H: Host>(
    host: &mut H,
    fibers: &FiberArena<H::Node>,
    id: FiberId,
    parent_node: &H::Node,
) -> Result<(), RenderError> {
    let fiber = fibers.fiber(id)?;
    if let Some(node) = &fiber.node {
        return host.remove_child(parent_node, node).map_err(RenderError::host);
    }

    let children: Vec<FiberId> = fibers.children(id).collect();
    if children.is_empty() {
        return Err(RenderError::MissingHostNode { fiber: id });
    }
    for child in children {
        commit_deletion(host, fibers, child, parent_node)?;
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
