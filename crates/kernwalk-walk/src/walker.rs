//! Depth-first traversal under the tree-wide lock.
//!
//! The walk is pre-order: a node is offered to the filter/visitor before any
//! of its descendants, and a container's whole subtree is finished before its
//! next sibling. Descent uses an explicit frame stack instead of recursion.
//! Each frame owns the hold on the container it enumerates, so popping a frame
//! releases that container only after all of its children were released.

use std::vec::IntoIter;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use kernwalk_core::{HeldNode, Hold, Node, TreeLockGuard, WalkConfig, WalkError, WalkWarning};

use crate::visitor::{NodeFilter, NodeVisitor};

/// Filter and visitor for one traversal.
///
/// Either half may be missing at construction; a walk with an incomplete
/// context fails before touching any node.
#[derive(Clone, Copy, Default)]
pub struct TraversalContext<'a> {
    filter: Option<&'a dyn NodeFilter>,
    visitor: Option<&'a dyn NodeVisitor>,
}

impl<'a> TraversalContext<'a> {
    /// Create a complete context.
    pub fn new(filter: &'a dyn NodeFilter, visitor: &'a dyn NodeVisitor) -> Self {
        Self {
            filter: Some(filter),
            visitor: Some(visitor),
        }
    }

    /// Create a context with neither filter nor visitor.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set the filter.
    pub fn with_filter(mut self, filter: &'a dyn NodeFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set the visitor.
    pub fn with_visitor(mut self, visitor: &'a dyn NodeVisitor) -> Self {
        self.visitor = Some(visitor);
        self
    }

    /// Check that both halves are present.
    pub fn validate(&self) -> Result<(), WalkError> {
        self.parts().map(|_| ())
    }

    fn parts(&self) -> Result<(&'a dyn NodeFilter, &'a dyn NodeVisitor), WalkError> {
        match (self.filter, self.visitor) {
            (Some(filter), Some(visitor)) => Ok((filter, visitor)),
            (None, _) => Err(WalkError::invalid_config("traversal context has no filter")),
            (_, None) => Err(WalkError::invalid_config("traversal context has no visitor")),
        }
    }
}

impl std::fmt::Debug for TraversalContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraversalContext")
            .field("filter", &self.filter.is_some())
            .field("visitor", &self.visitor.is_some())
            .finish()
    }
}

/// Counters gathered during one walk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalkSummary {
    /// Nodes acquired (every node in the subtree).
    pub nodes_held: u64,
    /// Visitor invocations.
    pub nodes_visited: u64,
    /// Containers descended into.
    pub containers_entered: u64,
    /// Visitor invocations that reported failure.
    pub visitor_failures: u64,
    /// Deepest depth reached.
    pub max_depth: u32,
    /// Per-node failures, in the order they happened.
    pub warnings: Vec<WalkWarning>,
}

/// Depth-first walker over a held node's descendants.
#[derive(Debug, Clone, Default)]
pub struct TreeWalker {
    max_depth: Option<u32>,
}

struct Frame {
    pending: IntoIter<Node>,
    depth: u32,
    // Released when the frame is popped, after every child of this node.
    _hold: Option<HeldNode>,
}

/// Frame stack that unwinds innermost-first, including on early return.
struct FrameStack(Vec<Frame>);

impl Drop for FrameStack {
    fn drop(&mut self) {
        while self.0.pop().is_some() {}
    }
}

impl TreeWalker {
    /// Create a walker without a depth cap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a walker honoring the config's depth cap.
    pub fn from_config(config: &WalkConfig) -> Self {
        Self {
            max_depth: config.max_depth,
        }
    }

    /// Refuse to visit nodes deeper than `max_depth`.
    pub fn with_max_depth(mut self, max_depth: Option<u32>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Walk all descendants of `root`, reporting its children at `depth`.
    ///
    /// The caller proves it holds the tree-wide lock by lending its guard,
    /// and keeps `root` held for the duration. `root` itself is not offered
    /// to the filter. Walking a leaf does nothing.
    ///
    /// The filter and visitor run with the tree-wide lock held. They must not
    /// block, and must not call back into [`Namespace`](kernwalk_core::Namespace)
    /// mutators: the lock is not reentrant.
    pub fn walk(
        &self,
        _lock: &TreeLockGuard<'_>,
        root: &HeldNode,
        depth: u32,
        ctx: &TraversalContext<'_>,
    ) -> Result<WalkSummary, WalkError> {
        let (filter, visitor) = ctx.parts()?;
        let mut summary = WalkSummary::default();

        if !root.is_container() {
            debug!(node = %root.id(), "walk root is not a container");
            return Ok(summary);
        }

        let mut stack = FrameStack(vec![Frame {
            pending: root.children().into_iter(),
            depth,
            _hold: None,
        }]);

        while let Some(frame) = stack.0.last_mut() {
            let Some(child) = frame.pending.next() else {
                stack.0.pop();
                continue;
            };
            let depth = frame.depth;

            if let Some(limit) = self.max_depth.filter(|&limit| depth > limit) {
                return Err(WalkError::DepthLimitExceeded { limit });
            }

            // A child whose last reference is already gone must not be revived.
            let Some(held) = Hold::try_acquire(&child) else {
                debug!(node = %child.id(), "skipping released node");
                continue;
            };
            summary.nodes_held += 1;
            summary.max_depth = summary.max_depth.max(depth);

            if filter.accept(&held) {
                summary.nodes_visited += 1;
                if let Err(err) = visitor.visit(&held, depth) {
                    warn!(node = %held.id(), name = held.display_name(), error = %err, "visitor failed");
                    summary.visitor_failures += 1;
                    summary.warnings.push(WalkWarning::visitor_failure(held.id(), &err));
                }
            }

            // Filtering gates the callback only; containers are always entered.
            if held.is_container() {
                summary.containers_entered += 1;
                let children = held.children();
                if !children.is_empty() {
                    let depth = depth
                        .checked_add(1)
                        .ok_or(WalkError::DepthLimitExceeded { limit: u32::MAX })?;
                    stack.0.push(Frame {
                        pending: children.into_iter(),
                        depth,
                        _hold: Some(held),
                    });
                }
            }
        }

        debug!(
            held = summary.nodes_held,
            visited = summary.nodes_visited,
            failures = summary.visitor_failures,
            "walk finished"
        );
        Ok(summary)
    }
}
