// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Tree traversal engine.
//!
//! The traversal order is fixed:
//!
//! - **Pre-order**: `enter` is called before descending into children
//! - **Post-order**: `leave` is called after all children have been visited
//! - **Source order**: children are visited left-to-right, depth-first
//! - **Registration order**: at one node, visitors run in the order they
//!   were registered, for `leave` as well as `enter`
//!
//! # Control Flow
//!
//! - `VisitResult::Continue` - keep going
//! - `VisitResult::SkipChildren` - skip children but still call `leave`
//! - `VisitResult::Replace` - substitute the node in its parent
//! - `VisitResult::Remove` - detach the node from its parent
//! - `VisitResult::Stop` - halt traversal immediately (no further `leave`)

use serde::Serialize;
use tracing::debug;

use crate::dispatch::{CachedDispatch, Dispatch, NaiveDispatch, SharedDispatchTable};
use crate::error::ConfigResult;
use crate::node::Node;
use crate::visitor::{VisitResult, Visitor, VisitorSet};

/// Counters for one traversal session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TraversalStats {
    /// Nodes entered, including a node that triggered `Stop`.
    pub nodes_visited: u64,
    /// `enter` and `leave` invocations.
    pub visitor_calls: u64,
    /// Whether a visitor stopped the traversal.
    pub stopped: bool,
}

/// Walks forests, dispatching each node to its applicable visitors.
///
/// The visitor set is consumed on construction and cannot change, which is
/// what keeps a [`CachedDispatch`] sound for the traverser's lifetime.
/// Reusing one traverser across sessions reuses its warm cache.
pub struct Traverser<S, D = CachedDispatch> {
    visitors: Vec<Box<dyn Visitor<S>>>,
    dispatch: D,
    /// Visitor indices resolved for the nodes on the current path.
    resolved: Vec<usize>,
}

impl<S> Traverser<S, CachedDispatch> {
    /// Traverser that memoizes applicable visitors per node kind.
    pub fn cached(set: VisitorSet<S>) -> Self {
        let (visitors, rules) = set.into_parts();
        Self {
            visitors,
            dispatch: CachedDispatch::new(rules),
            resolved: Vec::new(),
        }
    }

    /// Cached traverser whose misses consult and populate `table`.
    ///
    /// # Errors
    ///
    /// Fails if `table` is bound to a visitor set of a different size.
    pub fn cached_shared(set: VisitorSet<S>, table: SharedDispatchTable) -> ConfigResult<Self> {
        let (visitors, rules) = set.into_parts();
        Ok(Self {
            visitors,
            dispatch: CachedDispatch::with_shared(rules, table)?,
            resolved: Vec::new(),
        })
    }
}

impl<S> Traverser<S, NaiveDispatch> {
    /// Traverser that re-evaluates applicability at every node.
    pub fn naive(set: VisitorSet<S>) -> Self {
        let (visitors, rules) = set.into_parts();
        Self {
            visitors,
            dispatch: NaiveDispatch::new(rules),
            resolved: Vec::new(),
        }
    }
}

impl<S, D: Dispatch> Traverser<S, D> {
    pub fn dispatch(&self) -> &D {
        &self.dispatch
    }

    pub fn dispatch_mut(&mut self) -> &mut D {
        &mut self.dispatch
    }

    pub fn visitor_count(&self) -> usize {
        self.visitors.len()
    }

    /// Traverse one forest.
    pub fn traverse(&mut self, forest: &mut Vec<Node>, state: &mut S) -> TraversalStats {
        self.traverse_all(std::iter::once(forest), state)
    }

    /// Traverse several forests as one session.
    ///
    /// A `Stop` ends the whole session, including forests not yet started.
    pub fn traverse_all<'f, I>(&mut self, forests: I, state: &mut S) -> TraversalStats
    where
        I: IntoIterator<Item = &'f mut Vec<Node>>,
    {
        let mut walk = Walk {
            visitors: &mut self.visitors,
            dispatch: &mut self.dispatch,
            resolved: &mut self.resolved,
            state,
            stats: TraversalStats::default(),
        };
        for forest in forests {
            if walk.walk_sequence(forest) == Step::Stop {
                break;
            }
        }
        let stats = walk.stats;
        self.resolved.clear();
        if stats.stopped {
            debug!(nodes = stats.nodes_visited, "traversal stopped by visitor");
        }
        stats
    }
}

/// What the parent should do with the node just walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Keep,
    Remove,
    Stop,
}

struct Walk<'t, S, D> {
    visitors: &'t mut [Box<dyn Visitor<S>>],
    dispatch: &'t mut D,
    resolved: &'t mut Vec<usize>,
    state: &'t mut S,
    stats: TraversalStats,
}

impl<S, D: Dispatch> Walk<'_, S, D> {
    fn walk_sequence(&mut self, nodes: &mut Vec<Node>) -> Step {
        let mut index = 0;
        while index < nodes.len() {
            match self.walk_node(&mut nodes[index]) {
                Step::Keep => index += 1,
                Step::Remove => {
                    nodes.remove(index);
                }
                Step::Stop => return Step::Stop,
            }
        }
        Step::Keep
    }

    /// Resolve once per node; `leave` reuses the list `enter` used unless an
    /// `enter` replaced the node with one of another kind.
    fn walk_node(&mut self, node: &mut Node) -> Step {
        self.stats.nodes_visited += 1;
        let start = self.resolved.len();
        self.resolved.extend_from_slice(self.dispatch.resolve(node.kind));
        let step = self.visit_node(node, start);
        self.resolved.truncate(start);
        step
    }

    fn visit_node(&mut self, node: &mut Node, start: usize) -> Step {
        let entered_kind = node.kind;
        let mut end = self.resolved.len();
        let mut skip_children = false;

        for slot in start..end {
            let visitor = &mut self.visitors[self.resolved[slot]];
            if !visitor.accepts(node) {
                continue;
            }
            self.stats.visitor_calls += 1;
            match visitor.enter(node, self.state) {
                VisitResult::Continue => {}
                VisitResult::SkipChildren => skip_children = true,
                VisitResult::Replace(replacement) => *node = replacement,
                VisitResult::Remove => return Step::Remove,
                VisitResult::Stop => {
                    self.stats.stopped = true;
                    return Step::Stop;
                }
            }
        }

        // Children truncate the path back to `end` when they finish.
        if !skip_children && self.walk_sequence(&mut node.children) == Step::Stop {
            return Step::Stop;
        }

        if node.kind != entered_kind {
            self.resolved.truncate(start);
            self.resolved.extend_from_slice(self.dispatch.resolve(node.kind));
            end = self.resolved.len();
        }

        for slot in start..end {
            let visitor = &mut self.visitors[self.resolved[slot]];
            if !visitor.accepts(node) {
                continue;
            }
            self.stats.visitor_calls += 1;
            match visitor.leave(node, self.state) {
                VisitResult::Continue | VisitResult::SkipChildren => {}
                VisitResult::Replace(replacement) => *node = replacement,
                VisitResult::Remove => return Step::Remove,
                VisitResult::Stop => {
                    self.stats.stopped = true;
                    return Step::Stop;
                }
            }
        }
        Step::Keep
    }
}
