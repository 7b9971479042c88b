//! The visitors every benchmark pass runs.
//!
//! Three observers scoped to a single item kind and one counter that applies
//! to every kind. The scoped ones make dispatch selective, which is what the
//! cached strategy exploits; the counter makes a pass observable.

use std::ops::AddAssign;

use serde::Serialize;

use visitbench_core::{
    Applicability, Applicable, ConfigResult, KindSet, Node, NodeKind, VisitResult, Visitor,
    VisitorSet,
};

/// Counters for one pass, reset before each pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PassStats {
    pub nodes_visited: u64,
    pub functions: u64,
    pub structs: u64,
    pub methods: u64,
}

impl PassStats {
    pub fn reset(&mut self) {
        *self = PassStats::default();
    }
}

impl AddAssign for PassStats {
    fn add_assign(&mut self, other: Self) {
        self.nodes_visited += other.nodes_visited;
        self.functions += other.functions;
        self.structs += other.structs;
        self.methods += other.methods;
    }
}

/// Observes free functions.
pub struct FunctionOnly;

impl Visitor<PassStats> for FunctionOnly {
    fn name(&self) -> &'static str {
        "FunctionOnly"
    }

    fn enter(&mut self, _node: &Node, stats: &mut PassStats) -> VisitResult {
        stats.functions += 1;
        VisitResult::Continue
    }
}

impl Applicable for FunctionOnly {
    fn applicability(&self) -> Applicability {
        NodeKind::Function.into()
    }
}

/// Observes struct definitions.
pub struct StructOnly;

impl Visitor<PassStats> for StructOnly {
    fn name(&self) -> &'static str {
        "StructOnly"
    }

    fn enter(&mut self, _node: &Node, stats: &mut PassStats) -> VisitResult {
        stats.structs += 1;
        VisitResult::Continue
    }
}

impl Applicable for StructOnly {
    fn applicability(&self) -> Applicability {
        NodeKind::Struct.into()
    }
}

/// Observes methods in impl blocks.
pub struct MethodOnly;

impl Visitor<PassStats> for MethodOnly {
    fn name(&self) -> &'static str {
        "MethodOnly"
    }

    fn enter(&mut self, _node: &Node, stats: &mut PassStats) -> VisitResult {
        stats.methods += 1;
        VisitResult::Continue
    }
}

impl Applicable for MethodOnly {
    fn applicability(&self) -> Applicability {
        NodeKind::Method.into()
    }
}

/// Counts every node.
pub struct NodeCounter;

impl Visitor<PassStats> for NodeCounter {
    fn name(&self) -> &'static str {
        "NodeCounter"
    }

    fn enter(&mut self, _node: &Node, stats: &mut PassStats) -> VisitResult {
        stats.nodes_visited += 1;
        VisitResult::Continue
    }
}

impl Applicable for NodeCounter {
    fn applicability(&self) -> Applicability {
        // A full kind set rather than `Any`: naive dispatch still pays a
        // membership check for it at every node.
        KindSet::all().into()
    }
}

/// The visitor set used by every pass, in registration order.
pub fn payload_visitors() -> ConfigResult<VisitorSet<PassStats>> {
    VisitorSet::new()
        .with_scoped(FunctionOnly)?
        .with_scoped(StructOnly)?
        .with_scoped(MethodOnly)?
        .with_scoped(NodeCounter)
}
