// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Traversal behavior tests.
//!
//! Every scenario runs against both the cached and the naive traverser;
//! the two must agree on every visitor invocation.

use visitbench_core::{
    Applicability, Applicable, Dispatch, KindSet, Node, NodeCategory, NodeKind, TraversalStats,
    Traverser, VisitResult, Visitor, VisitorSet,
};

// ============================================================================
// Recording visitors
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Enter,
    Leave,
}

type Event = (&'static str, Phase, NodeKind, Option<String>);

/// Records every call into the session log and answers with a scripted
/// result when the node's name matches.
struct Recorder {
    label: &'static str,
    applicability: Applicability,
    on_enter: Option<(&'static str, VisitResult)>,
    on_leave: Option<(&'static str, VisitResult)>,
}

impl Recorder {
    fn new(label: &'static str, applicability: Applicability) -> Self {
        Self {
            label,
            applicability,
            on_enter: None,
            on_leave: None,
        }
    }

    fn everywhere(label: &'static str) -> Self {
        Self::new(label, Applicability::Any)
    }

    fn on_enter(mut self, name: &'static str, result: VisitResult) -> Self {
        self.on_enter = Some((name, result));
        self
    }

    fn on_leave(mut self, name: &'static str, result: VisitResult) -> Self {
        self.on_leave = Some((name, result));
        self
    }

    fn scripted(script: &Option<(&'static str, VisitResult)>, node: &Node) -> VisitResult {
        match script {
            Some((name, result)) if node.name.as_deref() == Some(*name) => result.clone(),
            _ => VisitResult::Continue,
        }
    }
}

impl Visitor<Vec<Event>> for Recorder {
    fn name(&self) -> &'static str {
        self.label
    }

    fn enter(&mut self, node: &Node, log: &mut Vec<Event>) -> VisitResult {
        log.push((self.label, Phase::Enter, node.kind, node.name.clone()));
        Self::scripted(&self.on_enter, node)
    }

    fn leave(&mut self, node: &Node, log: &mut Vec<Event>) -> VisitResult {
        log.push((self.label, Phase::Leave, node.kind, node.name.clone()));
        Self::scripted(&self.on_leave, node)
    }
}

impl Applicable for Recorder {
    fn applicability(&self) -> Applicability {
        self.applicability
    }
}

fn set_of(recorders: Vec<Recorder>) -> VisitorSet<Vec<Event>> {
    let mut set = VisitorSet::new();
    for recorder in recorders {
        set.push_scoped(recorder).unwrap();
    }
    set
}

/// Run the same scenario through both strategies and check they agree.
fn run_both<F>(make: F, forest: &[Node]) -> (Vec<Event>, TraversalStats, Vec<Node>)
where
    F: Fn() -> Vec<Recorder>,
{
    let mut cached = Traverser::cached(set_of(make()));
    let mut naive = Traverser::naive(set_of(make()));

    let mut cached_forest = forest.to_vec();
    let mut naive_forest = forest.to_vec();
    let mut cached_log = Vec::new();
    let mut naive_log = Vec::new();

    let cached_stats = cached.traverse(&mut cached_forest, &mut cached_log);
    let naive_stats = naive.traverse(&mut naive_forest, &mut naive_log);

    assert_eq!(cached_log, naive_log, "cached and naive invocation logs differ");
    assert_eq!(cached_stats, naive_stats);
    assert_eq!(cached_forest, naive_forest);
    (cached_log, cached_stats, cached_forest)
}

/// Run `passes` sessions with the same two traversers, so the cached one is
/// warm from the second pass on, checking agreement after every pass.
fn run_passes<F>(make: F, forest: &[Node], passes: usize) -> Vec<(Vec<Event>, Vec<Node>)>
where
    F: Fn() -> Vec<Recorder>,
{
    let mut cached = Traverser::cached(set_of(make()));
    let mut naive = Traverser::naive(set_of(make()));
    let mut cached_forest = forest.to_vec();
    let mut naive_forest = forest.to_vec();

    let mut history = Vec::with_capacity(passes);
    for pass in 0..passes {
        let mut cached_log = Vec::new();
        let mut naive_log = Vec::new();
        let cached_stats = cached.traverse(&mut cached_forest, &mut cached_log);
        let naive_stats = naive.traverse(&mut naive_forest, &mut naive_log);

        assert_eq!(cached_log, naive_log, "invocation logs differ on pass {pass}");
        assert_eq!(cached_stats, naive_stats, "stats differ on pass {pass}");
        assert_eq!(cached_forest, naive_forest, "forests differ on pass {pass}");
        history.push((cached_log, cached_forest.clone()));
    }
    history
}

fn function(name: &str) -> Node {
    Node::named(NodeKind::Function, name)
}

fn structure(name: &str) -> Node {
    Node::named(NodeKind::Struct, name)
}

fn enters(log: &[Event], label: &str) -> Vec<Option<String>> {
    log.iter()
        .filter(|(l, phase, _, _)| *l == label && *phase == Phase::Enter)
        .map(|(_, _, _, name)| name.clone())
        .collect()
}

fn some(name: &str) -> Option<String> {
    Some(name.to_string())
}

// ============================================================================
// Dispatch properties
// ============================================================================

#[test]
fn function_only_and_all_kinds_scenario() {
    let forest = vec![function("a"), structure("B"), function("c")];
    let (log, stats, _) = run_both(
        || {
            vec![
                Recorder::new("functions", NodeKind::Function.into()),
                Recorder::everywhere("all"),
            ]
        },
        &forest,
    );

    assert_eq!(enters(&log, "all").len(), 3);
    assert_eq!(enters(&log, "functions").len(), 2);
    assert_eq!(stats.nodes_visited, 3);

    let enter_order: Vec<_> = log
        .iter()
        .filter(|(_, phase, _, _)| *phase == Phase::Enter)
        .map(|(label, _, _, name)| (*label, name.clone()))
        .collect();
    assert_eq!(
        enter_order,
        vec![
            ("functions", some("a")),
            ("all", some("a")),
            ("all", some("B")),
            ("functions", some("c")),
            ("all", some("c")),
        ]
    );
}

#[test]
fn enter_and_leave_both_follow_registration_order() {
    let forest = vec![function("f").with_child(Node::new(NodeKind::Return))];
    let (log, _, _) = run_both(
        || {
            vec![
                Recorder::everywhere("A"),
                Recorder::everywhere("B"),
                Recorder::everywhere("C"),
            ]
        },
        &forest,
    );

    let at_function: Vec<_> = log
        .iter()
        .filter(|(_, _, kind, _)| *kind == NodeKind::Function)
        .map(|(label, phase, _, _)| (*label, *phase))
        .collect();
    assert_eq!(
        at_function,
        vec![
            ("A", Phase::Enter),
            ("B", Phase::Enter),
            ("C", Phase::Enter),
            ("A", Phase::Leave),
            ("B", Phase::Leave),
            ("C", Phase::Leave),
        ]
    );

    // Children are fully processed between the parent's enter and leave.
    let kinds: Vec<_> = log
        .iter()
        .filter(|(label, _, _, _)| *label == "A")
        .map(|(_, phase, kind, _)| (*phase, *kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (Phase::Enter, NodeKind::Function),
            (Phase::Enter, NodeKind::Return),
            (Phase::Leave, NodeKind::Return),
            (Phase::Leave, NodeKind::Function),
        ]
    );
}

#[test]
fn cache_hits_grow_with_repeated_kinds_and_passes() {
    let mut set = VisitorSet::new();
    set.push_scoped(Recorder::new("functions", NodeKind::Function.into()))
        .unwrap();
    let mut traverser = Traverser::cached(set);

    let mut forest = vec![function("a"), function("b"), function("c"), structure("D")];
    let mut log = Vec::new();
    traverser.traverse(&mut forest, &mut log);

    // One lookup per node, one miss per distinct kind.
    let stats = traverser.dispatch().stats();
    assert_eq!(stats.lookups, 4);
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.hits, 2);
    assert_eq!(traverser.dispatch().cached_kinds(), 2);
    assert_eq!(
        log.iter().filter(|(_, phase, _, _)| *phase == Phase::Leave).count(),
        3
    );

    // A second pass reuses the warm cache entirely.
    traverser.dispatch_mut().reset_stats();
    log.clear();
    traverser.traverse(&mut forest, &mut log);
    let stats = traverser.dispatch().stats();
    assert_eq!(stats.lookups, 4);
    assert_eq!(stats.misses, 0);
    assert_eq!(stats.hits, 4);
    assert_eq!(stats.applicability_checks, 0);
    assert_eq!(enters(&log, "functions").len(), 3);
}

#[test]
fn leave_reuses_the_list_resolved_on_enter() {
    let forest: Vec<Node> = (0..5).map(|i| function(&format!("f{i}"))).collect();

    let mut cached = Traverser::cached(set_of(vec![Recorder::everywhere("all")]));
    let mut cached_forest = forest.clone();
    let mut log = Vec::new();
    cached.traverse(&mut cached_forest, &mut log);
    let stats = cached.dispatch().stats();
    assert_eq!(stats.lookups, 5);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 4);
    assert_eq!(log.len(), 10);

    let mut naive = Traverser::naive(set_of(vec![Recorder::everywhere("all")]));
    let mut naive_forest = forest;
    let mut naive_log = Vec::new();
    naive.traverse(&mut naive_forest, &mut naive_log);
    assert_eq!(naive.dispatch().stats().lookups, 5);
    assert_eq!(naive.dispatch().stats().applicability_checks, 5);
    assert_eq!(naive_log, log);
}

#[test]
fn kinds_without_visitors_cost_no_checks_once_warm() {
    let mut set = VisitorSet::<Vec<Event>>::new();
    for _ in 0..64 {
        set.push_scoped(Recorder::new("method", NodeKind::Method.into()))
            .unwrap();
    }
    let mut traverser = Traverser::cached(set);
    let mut forest: Vec<Node> = (0..100).map(|i| structure(&format!("S{i}"))).collect();
    let mut log = Vec::new();

    traverser.traverse(&mut forest, &mut log);
    assert!(log.is_empty());
    assert_eq!(traverser.dispatch().stats().applicability_checks, 64);

    let mut naive_set = VisitorSet::<Vec<Event>>::new();
    for _ in 0..64 {
        naive_set
            .push_scoped(Recorder::new("method", NodeKind::Method.into()))
            .unwrap();
    }
    let mut naive = Traverser::naive(naive_set);
    naive.traverse(&mut forest, &mut log);
    assert_eq!(naive.dispatch().stats().applicability_checks, 64 * 100);
}

#[test]
fn category_and_predicate_declarations_dispatch_like_kind_sets() {
    fn is_call(kind: NodeKind) -> bool {
        matches!(kind, NodeKind::Call | NodeKind::MethodCall)
    }

    let forest = vec![function("f").with_children(vec![
        Node::new(NodeKind::Let).with_child(Node::new(NodeKind::Call)),
        Node::new(NodeKind::MethodCall),
        Node::new(NodeKind::Literal),
    ])];
    let (log, _, _) = run_both(
        || {
            vec![
                Recorder::new(
                    "expressions",
                    KindSet::category(NodeCategory::Expression).into(),
                ),
                Recorder::new("calls", Applicability::Predicate(is_call)),
            ]
        },
        &forest,
    );

    let expression_kinds: Vec<_> = log
        .iter()
        .filter(|(label, phase, _, _)| *label == "expressions" && *phase == Phase::Enter)
        .map(|(_, _, kind, _)| *kind)
        .collect();
    assert_eq!(
        expression_kinds,
        vec![NodeKind::Call, NodeKind::MethodCall, NodeKind::Literal]
    );
    assert_eq!(enters(&log, "calls").len(), 2);
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn skip_children_hides_descendants_but_not_siblings() {
    let forest = vec![
        function("skipped").with_child(function("inner").with_child(function("deeper"))),
        function("sibling").with_child(function("visible")),
    ];
    let (log, stats, _) = run_both(
        || {
            vec![
                Recorder::everywhere("skipper").on_enter("skipped", VisitResult::SkipChildren),
                Recorder::everywhere("observer"),
            ]
        },
        &forest,
    );

    assert_eq!(
        enters(&log, "observer"),
        vec![some("skipped"), some("sibling"), some("visible")]
    );
    assert_eq!(stats.nodes_visited, 3);
    // leave still runs on the node whose children were skipped
    assert!(log.contains(&("observer", Phase::Leave, NodeKind::Function, some("skipped"))));
}

#[test]
fn stop_halts_everything_immediately() {
    let forest = vec![
        function("first").with_child(function("stopper").with_child(function("child"))),
        function("never"),
    ];
    let (log, stats, _) = run_both(
        || {
            vec![
                Recorder::everywhere("A").on_enter("stopper", VisitResult::Stop),
                Recorder::everywhere("B"),
            ]
        },
        &forest,
    );

    assert!(stats.stopped);
    assert_eq!(stats.nodes_visited, 2);
    assert_eq!(
        log,
        vec![
            ("A", Phase::Enter, NodeKind::Function, some("first")),
            ("B", Phase::Enter, NodeKind::Function, some("first")),
            ("A", Phase::Enter, NodeKind::Function, some("stopper")),
        ]
    );
}

#[test]
fn stop_on_leave_skips_remaining_leaves_and_siblings() {
    let forest = vec![
        function("parent").with_children(vec![function("stopper"), function("after")]),
    ];
    let (log, stats, _) = run_both(
        || {
            vec![
                Recorder::everywhere("A").on_leave("stopper", VisitResult::Stop),
                Recorder::everywhere("B"),
            ]
        },
        &forest,
    );

    assert!(stats.stopped);
    assert_eq!(stats.nodes_visited, 2);
    assert_eq!(log.last(), Some(&("A", Phase::Leave, NodeKind::Function, some("stopper"))));
    assert!(!log.iter().any(|(_, _, _, name)| *name == some("after")));
}

#[test]
fn stop_ends_the_whole_session() {
    let mut traverser = Traverser::cached(set_of(vec![
        Recorder::everywhere("A").on_enter("stopper", VisitResult::Stop),
    ]));
    let mut first = vec![function("stopper")];
    let mut second = vec![function("unreached")];
    let mut log = Vec::new();

    let stats = traverser.traverse_all([&mut first, &mut second], &mut log);
    assert!(stats.stopped);
    assert_eq!(stats.nodes_visited, 1);
    assert_eq!(log.len(), 1);

    // A fresh session starts over.
    log.clear();
    let stats = traverser.traverse(&mut second, &mut log);
    assert!(!stats.stopped);
    assert_eq!(enters(&log, "A"), vec![some("unreached")]);
}

// ============================================================================
// Tree mutation
// ============================================================================

#[test]
fn remove_on_enter_detaches_node_and_skips_its_subtree() {
    let forest = vec![
        function("keep"),
        function("drop").with_child(function("child")),
        function("tail"),
    ];
    let (log, stats, result) = run_both(
        || {
            vec![
                Recorder::everywhere("remover").on_enter("drop", VisitResult::Remove),
                Recorder::everywhere("observer"),
            ]
        },
        &forest,
    );

    assert_eq!(
        result.iter().map(|n| n.name.clone()).collect::<Vec<_>>(),
        vec![some("keep"), some("tail")]
    );
    assert_eq!(enters(&log, "observer"), vec![some("keep"), some("tail")]);
    assert!(!log.iter().any(|(_, phase, _, name)| *phase == Phase::Leave && *name == some("drop")));
    assert_eq!(stats.nodes_visited, 3);
}

#[test]
fn remove_on_leave_detaches_after_children_were_visited() {
    let forest = vec![function("parent").with_children(vec![
        function("a"),
        function("b").with_child(function("b1")),
        function("c"),
    ])];
    let (log, _, result) = run_both(
        || vec![Recorder::everywhere("A").on_leave("b", VisitResult::Remove)],
        &forest,
    );

    let children: Vec<_> = result[0].children.iter().map(|n| n.name.clone()).collect();
    assert_eq!(children, vec![some("a"), some("c")]);
    assert!(enters(&log, "A").contains(&some("b1")));
}

#[test]
fn replace_on_enter_visits_replacement_children_without_reentering() {
    let replacement = structure("Replacement").with_child(Node::named(NodeKind::Field, "x"));
    let forest = vec![function("old").with_child(function("old_child"))];
    let (log, _, result) = run_both(
        || {
            vec![
                Recorder::everywhere("A").on_enter("old", VisitResult::Replace(replacement.clone())),
                Recorder::everywhere("B"),
            ]
        },
        &forest,
    );

    assert_eq!(result, vec![replacement.clone()]);
    assert_eq!(enters(&log, "A"), vec![some("old"), some("x")]);
    // B runs after the replacement happened, so it sees the new node.
    assert_eq!(enters(&log, "B"), vec![some("Replacement"), some("x")]);
    assert!(!log.iter().any(|(_, _, _, name)| *name == some("old_child")));
    assert!(log.contains(&("A", Phase::Leave, NodeKind::Struct, some("Replacement"))));
}

#[test]
fn replace_on_leave_substitutes_in_parent() {
    let forest = vec![function("parent").with_children(vec![function("a"), function("b")])];
    let (log, _, result) = run_both(
        || {
            vec![
                Recorder::everywhere("A").on_leave("a", VisitResult::Replace(structure("A2"))),
                Recorder::everywhere("B"),
            ]
        },
        &forest,
    );

    assert_eq!(result[0].children[0], structure("A2"));
    assert!(log.contains(&("B", Phase::Leave, NodeKind::Struct, some("A2"))));
    assert_eq!(enters(&log, "B"), vec![some("parent"), some("a"), some("b")]);
}

// ============================================================================
// Per-node filtering
// ============================================================================

struct PublicOnly;

impl Visitor<Vec<Event>> for PublicOnly {
    fn accepts(&self, node: &Node) -> bool {
        node.name.as_deref().is_some_and(|name| !name.starts_with('_'))
    }

    fn enter(&mut self, node: &Node, log: &mut Vec<Event>) -> VisitResult {
        log.push(("public", Phase::Enter, node.kind, node.name.clone()));
        VisitResult::Continue
    }
}

impl Applicable for PublicOnly {
    fn applicability(&self) -> Applicability {
        NodeKind::Function.into()
    }
}

#[test]
fn accepts_filters_instances_without_affecting_the_cache() {
    let mut traverser = Traverser::cached(VisitorSet::new().with_scoped(PublicOnly).unwrap());
    let mut forest = vec![function("_private"), function("public"), function("_hidden")];
    let mut log = Vec::new();
    traverser.traverse(&mut forest, &mut log);

    assert_eq!(enters(&log, "public"), vec![some("public")]);
    assert_eq!(traverser.dispatch().entry(NodeKind::Function), Some(&[0][..]));
}

// ============================================================================
// Repeated passes
// ============================================================================

#[test]
fn warm_cache_matches_naive_as_the_tree_changes_shape() {
    let forest = vec![
        function("old").with_child(function("old_child")),
        function("drop").with_child(Node::new(NodeKind::Return)),
        structure("Kept").with_child(Node::named(NodeKind::Field, "x")),
    ];
    let replacement = Node::named(NodeKind::Enum, "New")
        .with_child(Node::named(NodeKind::Variant, "A"))
        .with_child(function("drop"));
    let history = run_passes(
        || {
            vec![
                Recorder::everywhere("mutator")
                    .on_enter("old", VisitResult::Replace(replacement.clone())),
                Recorder::new("remover", NodeKind::Function.into())
                    .on_enter("drop", VisitResult::Remove),
                Recorder::new("items", KindSet::category(NodeCategory::Item).into()),
                Recorder::everywhere("all"),
            ]
        },
        &forest,
        3,
    );

    // The first pass replaces `old` and removes both `drop` functions.
    let (first_log, first_forest) = &history[0];
    assert_eq!(
        first_forest,
        &vec![
            Node::named(NodeKind::Enum, "New").with_child(Node::named(NodeKind::Variant, "A")),
            structure("Kept").with_child(Node::named(NodeKind::Field, "x")),
        ]
    );
    assert!(first_log.contains(&("all", Phase::Enter, NodeKind::Variant, some("A"))));

    // Later passes walk the new shape and change nothing further.
    for (log, shape) in &history[1..] {
        assert_eq!(shape, first_forest);
        assert_eq!(
            enters(log, "all"),
            vec![some("New"), some("A"), some("Kept"), some("x")]
        );
        assert!(enters(log, "remover").is_empty());
    }
    assert_eq!(history[1].0, history[2].0);
}

#[test]
fn enter_list_keeps_the_original_kind_after_replace() {
    let forest = vec![function("f").with_child(Node::new(NodeKind::Return))];
    let (log, _, result) = run_both(
        || {
            vec![
                Recorder::everywhere("replacer").on_enter("f", VisitResult::Replace(structure("S"))),
                Recorder::new("functions", NodeKind::Function.into()),
                Recorder::new("structs", NodeKind::Struct.into()),
            ]
        },
        &forest,
    );

    assert_eq!(result, vec![structure("S")]);
    // The remaining enters come from the list resolved for `Function`, so
    // the function-scoped visitor enters the replacement struct and the
    // struct-scoped one does not.
    assert_eq!(enters(&log, "functions"), vec![some("S")]);
    assert!(enters(&log, "structs").is_empty());
    // Leave resolves again for the replacement's kind.
    assert_eq!(
        log.iter()
            .filter(|(_, phase, _, _)| *phase == Phase::Leave)
            .map(|(label, _, kind, _)| (*label, *kind))
            .collect::<Vec<_>>(),
        vec![("replacer", NodeKind::Struct), ("structs", NodeKind::Struct)]
    );
}
