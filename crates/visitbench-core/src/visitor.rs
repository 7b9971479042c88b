// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Visitor trait, traversal-control results and the registration surface.

use tracing::debug;

use crate::applicability::{Applicability, Applicable};
use crate::error::{ConfigError, ConfigResult};
use crate::node::Node;

/// Result of entering or leaving a node - controls traversal behavior.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VisitResult {
    /// Continue traversal normally.
    #[default]
    Continue,

    /// Do not descend into this node's children.
    ///
    /// Remaining visitors still enter the node and `leave` is still called.
    /// Returned from `leave`, it behaves like `Continue`.
    SkipChildren,

    /// Substitute this node in its parent's child sequence.
    ///
    /// Visitors that already ran are not re-invoked; later visitors see the
    /// replacement. Returned from `enter`, the replacement's children are
    /// traversed.
    Replace(Node),

    /// Detach this node from its parent's child sequence.
    ///
    /// Its subtree, its `leave` and any remaining visitors are skipped.
    Remove,

    /// Stop traversal entirely.
    ///
    /// No further `enter` or `leave` is called, on any node.
    Stop,
}

impl VisitResult {
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue)
    }
}

impl From<()> for VisitResult {
    fn from(_: ()) -> Self {
        VisitResult::Continue
    }
}

impl From<Option<Node>> for VisitResult {
    fn from(replacement: Option<Node>) -> Self {
        match replacement {
            Some(node) => VisitResult::Replace(node),
            None => VisitResult::Continue,
        }
    }
}

/// An observer invoked by the traverser.
///
/// `S` is caller-owned state threaded through every call of a traversal
/// session, e.g. a set of counters reset between passes.
///
/// # Example
///
/// ```
/// use visitbench_core::{Node, VisitResult, Visitor};
///
/// struct NodeCounter;
///
/// impl Visitor<usize> for NodeCounter {
///     fn enter(&mut self, _node: &Node, count: &mut usize) -> VisitResult {
///         *count += 1;
///         VisitResult::Continue
///     }
/// }
/// ```
pub trait Visitor<S> {
    /// Name used in diagnostics.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Per-node filter, evaluated on every node after kind dispatch.
    ///
    /// Never cached, so it may inspect the node's attributes.
    #[allow(unused_variables)]
    fn accepts(&self, node: &Node) -> bool {
        true
    }

    /// Called before the node's children are visited.
    #[allow(unused_variables)]
    fn enter(&mut self, node: &Node, state: &mut S) -> VisitResult {
        VisitResult::Continue
    }

    /// Called after the node's children have been visited.
    #[allow(unused_variables)]
    fn leave(&mut self, node: &Node, state: &mut S) -> VisitResult {
        VisitResult::Continue
    }
}

/// Ordered collection of visitors with their resolved applicability.
///
/// Consumed by the traverser, which makes the set immutable for the
/// traverser's lifetime.
pub struct VisitorSet<S> {
    visitors: Vec<Box<dyn Visitor<S>>>,
    rules: Vec<Applicability>,
}

impl<S> VisitorSet<S> {
    pub fn new() -> Self {
        Self {
            visitors: Vec::new(),
            rules: Vec::new(),
        }
    }

    /// Register a visitor that applies to every node kind.
    pub fn push<V: Visitor<S> + 'static>(&mut self, visitor: V) -> &mut Self {
        self.visitors.push(Box::new(visitor));
        self.rules.push(Applicability::Any);
        self
    }

    /// Register a visitor that declares its own applicability.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyKindSet`] if the declaration can never
    /// match.
    pub fn push_scoped<V>(&mut self, visitor: V) -> ConfigResult<&mut Self>
    where
        V: Visitor<S> + Applicable + 'static,
    {
        let applicability = visitor.applicability();
        self.push_with(visitor, applicability)
    }

    /// Register a visitor with an explicit applicability.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyKindSet`] if `applicability` can never
    /// match.
    pub fn push_with<V: Visitor<S> + 'static>(
        &mut self,
        visitor: V,
        applicability: Applicability,
    ) -> ConfigResult<&mut Self> {
        if applicability.is_empty_declaration() {
            return Err(ConfigError::EmptyKindSet {
                index: self.visitors.len(),
                visitor: visitor.name(),
            });
        }
        debug!(
            index = self.visitors.len(),
            visitor = visitor.name(),
            ?applicability,
            "registered visitor"
        );
        self.visitors.push(Box::new(visitor));
        self.rules.push(applicability);
        Ok(self)
    }

    /// Builder form of [`push`](Self::push).
    pub fn with<V: Visitor<S> + 'static>(mut self, visitor: V) -> Self {
        self.push(visitor);
        self
    }

    /// Builder form of [`push_scoped`](Self::push_scoped).
    ///
    /// # Errors
    ///
    /// See [`push_scoped`](Self::push_scoped).
    pub fn with_scoped<V>(mut self, visitor: V) -> ConfigResult<Self>
    where
        V: Visitor<S> + Applicable + 'static,
    {
        self.push_scoped(visitor)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.visitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visitors.is_empty()
    }

    /// Resolved applicability, in registration order.
    pub fn rules(&self) -> &[Applicability] {
        &self.rules
    }

    /// Visitor names, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.visitors.iter().map(|visitor| visitor.name()).collect()
    }

    pub(crate) fn into_parts(self) -> (Vec<Box<dyn Visitor<S>>>, Vec<Applicability>) {
        (self.visitors, self.rules)
    }
}

impl<S> Default for VisitorSet<S> {
    fn default() -> Self {
        Self::new()
    }
}
