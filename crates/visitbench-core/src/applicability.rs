// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! How a visitor declares which node kinds it applies to.
//!
//! Applicability is a property of node **kinds**, never of node instances:
//! the dispatch cache memoizes it per kind. A predicate therefore receives
//! only a [`NodeKind`]. Visitors that need to look at the node itself use
//! the uncached [`Visitor::accepts`] hook instead.
//!
//! A visitor opts in by implementing [`Applicable`] and being registered
//! with [`VisitorSet::push_scoped`]. Visitors registered with
//! [`VisitorSet::push`] apply to every kind.
//!
//! [`Visitor::accepts`]: crate::visitor::Visitor::accepts
//! [`VisitorSet::push_scoped`]: crate::visitor::VisitorSet::push_scoped
//! [`VisitorSet::push`]: crate::visitor::VisitorSet::push

use std::fmt;

use crate::node::{NodeCategory, NodeKind};

/// A set of node kinds, stored as a bitmask over kind ordinals.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KindSet(u128);

impl KindSet {
    pub const EMPTY: KindSet = KindSet(0);

    pub const fn new() -> Self {
        Self::EMPTY
    }

    /// Set containing exactly `kinds`.
    pub fn of(kinds: &[NodeKind]) -> Self {
        kinds.iter().copied().collect()
    }

    /// Set containing every kind.
    pub fn all() -> Self {
        NodeKind::ALL.iter().copied().collect()
    }

    /// Set containing every kind of `category`.
    pub fn category(category: NodeCategory) -> Self {
        Self::EMPTY.with_category(category)
    }

    pub fn with(mut self, kind: NodeKind) -> Self {
        self.insert(kind);
        self
    }

    pub fn with_category(self, category: NodeCategory) -> Self {
        NodeKind::ALL
            .iter()
            .filter(|kind| kind.category() == category)
            .fold(self, |set, kind| set.with(*kind))
    }

    pub fn insert(&mut self, kind: NodeKind) {
        self.0 |= 1u128 << kind.ordinal();
    }

    pub fn contains(&self, kind: NodeKind) -> bool {
        self.0 & (1u128 << kind.ordinal()) != 0
    }

    pub fn union(self, other: KindSet) -> KindSet {
        KindSet(self.0 | other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Kinds in the set, in ordinal order.
    pub fn iter(&self) -> impl Iterator<Item = NodeKind> + '_ {
        NodeKind::ALL
            .iter()
            .copied()
            .filter(move |kind| self.contains(*kind))
    }
}

impl FromIterator<NodeKind> for KindSet {
    fn from_iter<I: IntoIterator<Item = NodeKind>>(iter: I) -> Self {
        let mut set = KindSet::EMPTY;
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

impl fmt::Debug for KindSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// A visitor's declared applicability.
#[derive(Debug, Clone, Copy, Default)]
pub enum Applicability {
    /// Applies to every kind.
    #[default]
    Any,
    /// Applies to the kinds in a non-empty set.
    Kinds(KindSet),
    /// Applies to the kinds for which the predicate holds.
    ///
    /// Evaluated once per kind by a caching dispatch, so it must be a pure
    /// function of the kind.
    Predicate(fn(NodeKind) -> bool),
}

impl Applicability {
    pub fn applies_to(&self, kind: NodeKind) -> bool {
        match self {
            Applicability::Any => true,
            Applicability::Kinds(set) => set.contains(kind),
            Applicability::Predicate(predicate) => predicate(kind),
        }
    }

    /// True for declarations that can never match, which are rejected at
    /// registration.
    pub fn is_empty_declaration(&self) -> bool {
        matches!(self, Applicability::Kinds(set) if set.is_empty())
    }
}

impl From<KindSet> for Applicability {
    fn from(set: KindSet) -> Self {
        Applicability::Kinds(set)
    }
}

impl From<NodeKind> for Applicability {
    fn from(kind: NodeKind) -> Self {
        Applicability::Kinds(KindSet::EMPTY.with(kind))
    }
}

/// Static opt-in capability: a visitor that narrows the kinds it visits.
///
/// Read once, when the visitor is registered.
pub trait Applicable {
    fn applicability(&self) -> Applicability;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_set_membership() {
        let set = KindSet::of(&[NodeKind::Function, NodeKind::Struct]);
        assert!(set.contains(NodeKind::Function));
        assert!(set.contains(NodeKind::Struct));
        assert!(!set.contains(NodeKind::Method));
        assert_eq!(set.len(), 2);
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![NodeKind::Function, NodeKind::Struct]
        );
    }

    #[test]
    fn last_ordinal_fits_in_mask() {
        let last = NodeKind::ALL[NodeKind::COUNT - 1];
        let set = KindSet::EMPTY.with(last);
        assert!(set.contains(last));
        assert_eq!(KindSet::all().len(), NodeKind::COUNT);
    }

    #[test]
    fn category_sets_match_category() {
        let expressions = KindSet::category(NodeCategory::Expression);
        assert!(expressions.contains(NodeKind::Call));
        assert!(!expressions.contains(NodeKind::Function));
        assert!(expressions
            .iter()
            .all(|kind| kind.category() == NodeCategory::Expression));
    }

    #[test]
    fn predicate_sees_only_the_kind() {
        fn callable(kind: NodeKind) -> bool {
            matches!(kind, NodeKind::Call | NodeKind::MethodCall)
        }
        let applicability = Applicability::Predicate(callable);
        assert!(applicability.applies_to(NodeKind::MethodCall));
        assert!(!applicability.applies_to(NodeKind::Path));
    }

    #[test]
    fn empty_kind_set_is_an_empty_declaration() {
        assert!(Applicability::Kinds(KindSet::EMPTY).is_empty_declaration());
        assert!(!Applicability::Any.is_empty_declaration());
        assert!(!Applicability::from(NodeKind::Let).is_empty_declaration());
    }
}
