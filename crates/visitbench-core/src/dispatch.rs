// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Visitor dispatch: which registered visitors run on a node of a given kind.
//!
//! Two strategies implement [`Dispatch`]:
//!
//! - [`NaiveDispatch`] evaluates every visitor's applicability on every
//!   lookup.
//! - [`CachedDispatch`] evaluates them once per kind and memoizes the
//!   ordered result. Entries are insert-only and never invalidated; the
//!   visitor set is fixed when the traverser is built.
//!
//! Both return visitor indices in registration order, so they are
//! interchangeable without changing which visitors run or in what order.
//!
//! [`SharedDispatchTable`] lets cached dispatchers on different threads
//! share one warm table.

use std::collections::hash_map::Entry;
use std::ops::AddAssign;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{debug, trace};

use crate::applicability::Applicability;
use crate::error::{ConfigError, ConfigResult};
use crate::node::NodeKind;

/// Counters describing dispatch work.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    /// Calls to [`Dispatch::resolve`].
    pub lookups: u64,
    /// Lookups answered from the local memo table.
    pub hits: u64,
    /// Lookups that had to populate the local memo table.
    pub misses: u64,
    /// Misses answered by a shared table without re-evaluation.
    pub shared_hits: u64,
    /// Individual `Applicability::applies_to` evaluations.
    pub applicability_checks: u64,
}

impl DispatchStats {
    /// Fraction of lookups served from the memo table.
    pub fn hit_rate(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.hits as f64 / self.lookups as f64
        }
    }
}

impl AddAssign for DispatchStats {
    fn add_assign(&mut self, other: Self) {
        self.lookups += other.lookups;
        self.hits += other.hits;
        self.misses += other.misses;
        self.shared_hits += other.shared_hits;
        self.applicability_checks += other.applicability_checks;
    }
}

/// Resolves the visitors applicable to a node kind.
pub trait Dispatch {
    /// Indices of the applicable visitors, in registration order.
    fn resolve(&mut self, kind: NodeKind) -> &[usize];

    /// Number of registered visitors this dispatcher resolves over.
    fn visitor_count(&self) -> usize;

    fn stats(&self) -> DispatchStats;

    fn reset_stats(&mut self);
}

/// Evaluate every rule against `kind`, appending matching indices to `out`.
///
/// Returns the number of applicability checks performed.
fn collect_applicable(rules: &[Applicability], kind: NodeKind, out: &mut Vec<usize>) -> u64 {
    for (index, rule) in rules.iter().enumerate() {
        if rule.applies_to(kind) {
            out.push(index);
        }
    }
    rules.len() as u64
}

// ============================================================================
// Naive dispatch
// ============================================================================

/// Re-evaluates applicability on every lookup.
#[derive(Debug)]
pub struct NaiveDispatch {
    rules: Box<[Applicability]>,
    scratch: Vec<usize>,
    stats: DispatchStats,
}

impl NaiveDispatch {
    pub fn new(rules: Vec<Applicability>) -> Self {
        let capacity = rules.len();
        Self {
            rules: rules.into_boxed_slice(),
            scratch: Vec::with_capacity(capacity),
            stats: DispatchStats::default(),
        }
    }
}

impl Dispatch for NaiveDispatch {
    fn resolve(&mut self, kind: NodeKind) -> &[usize] {
        self.stats.lookups += 1;
        self.stats.misses += 1;
        self.scratch.clear();
        self.stats.applicability_checks += collect_applicable(&self.rules, kind, &mut self.scratch);
        &self.scratch
    }

    fn visitor_count(&self) -> usize {
        self.rules.len()
    }

    fn stats(&self) -> DispatchStats {
        self.stats
    }

    fn reset_stats(&mut self) {
        self.stats = DispatchStats::default();
    }
}

// ============================================================================
// Shared table
// ============================================================================

#[derive(Debug, Default)]
struct SharedEntries {
    visitor_count: Option<usize>,
    entries: FxHashMap<NodeKind, Arc<[usize]>>,
}

/// A dispatch table shared between threads.
///
/// Population is idempotent: two threads computing the same kind produce
/// the same entry, so the first insert wins and later ones are discarded.
/// Every dispatcher using one table must be built from the same visitor
/// declarations; the table remembers the visitor count of its first user
/// and rejects dispatchers of a different size.
#[derive(Debug, Clone, Default)]
pub struct SharedDispatchTable {
    inner: Arc<RwLock<SharedEntries>>,
}

impl SharedDispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of kinds with a resolved entry.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    fn bind(&self, visitor_count: usize) -> ConfigResult<()> {
        let mut inner = self.inner.write();
        match inner.visitor_count {
            None => {
                inner.visitor_count = Some(visitor_count);
                Ok(())
            }
            Some(expected) if expected == visitor_count => Ok(()),
            Some(expected) => Err(ConfigError::SharedTableMismatch {
                expected,
                found: visitor_count,
            }),
        }
    }

    fn get(&self, kind: NodeKind) -> Option<Arc<[usize]>> {
        self.inner.read().entries.get(&kind).cloned()
    }

    fn insert(&self, kind: NodeKind, entry: Arc<[usize]>) -> Arc<[usize]> {
        self.inner
            .write()
            .entries
            .entry(kind)
            .or_insert(entry)
            .clone()
    }
}

// ============================================================================
// Cached dispatch
// ============================================================================

/// Memoizes the applicable-visitor list per node kind.
#[derive(Debug)]
pub struct CachedDispatch {
    rules: Box<[Applicability]>,
    table: FxHashMap<NodeKind, Arc<[usize]>>,
    shared: Option<SharedDispatchTable>,
    stats: DispatchStats,
}

impl CachedDispatch {
    pub fn new(rules: Vec<Applicability>) -> Self {
        Self {
            rules: rules.into_boxed_slice(),
            table: FxHashMap::default(),
            shared: None,
            stats: DispatchStats::default(),
        }
    }

    /// Cached dispatch backed by a table shared with other dispatchers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SharedTableMismatch`] if the table is already
    /// in use by dispatchers over a different number of visitors.
    pub fn with_shared(rules: Vec<Applicability>, shared: SharedDispatchTable) -> ConfigResult<Self> {
        shared.bind(rules.len())?;
        let mut dispatch = Self::new(rules);
        dispatch.shared = Some(shared);
        Ok(dispatch)
    }

    /// Number of kinds with a memoized entry.
    pub fn cached_kinds(&self) -> usize {
        self.table.len()
    }

    /// The memoized entry for `kind`, without populating it.
    pub fn entry(&self, kind: NodeKind) -> Option<&[usize]> {
        self.table.get(&kind).map(|entry| &**entry)
    }
}

impl Dispatch for CachedDispatch {
    fn resolve(&mut self, kind: NodeKind) -> &[usize] {
        self.stats.lookups += 1;
        match self.table.entry(kind) {
            Entry::Occupied(entry) => {
                self.stats.hits += 1;
                &**entry.into_mut()
            }
            Entry::Vacant(slot) => {
                self.stats.misses += 1;
                let resolved = match self.shared.as_ref().and_then(|shared| shared.get(kind)) {
                    Some(entry) => {
                        self.stats.shared_hits += 1;
                        trace!(%kind, "dispatch entry taken from shared table");
                        entry
                    }
                    None => {
                        let mut indices = Vec::new();
                        self.stats.applicability_checks +=
                            collect_applicable(&self.rules, kind, &mut indices);
                        debug!(%kind, visitors = ?indices, "populated dispatch entry");
                        let entry: Arc<[usize]> = indices.into();
                        match &self.shared {
                            Some(shared) => shared.insert(kind, entry),
                            None => entry,
                        }
                    }
                };
                &**slot.insert(resolved)
            }
        }
    }

    fn visitor_count(&self) -> usize {
        self.rules.len()
    }

    fn stats(&self) -> DispatchStats {
        self.stats
    }

    fn reset_stats(&mut self) {
        self.stats = DispatchStats::default();
    }
}
