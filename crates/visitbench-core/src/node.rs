// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Tree nodes and the closed registry of node kinds.
//!
//! Every node carries a [`NodeKind`]. Kinds are a closed enum with a stable
//! ordinal, which makes them cheap to hash and lets [`KindSet`] represent
//! any set of kinds as a single bitmask.
//!
//! [`KindSet`]: crate::applicability::KindSet

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Coarse grouping of node kinds.
///
/// Used for "is-a" style applicability declarations, e.g. a visitor that
/// cares about every expression without listing each expression kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    Item,
    Statement,
    Expression,
    Pattern,
    Type,
    Other,
}

impl NodeCategory {
    pub const ALL: [NodeCategory; 6] = [
        NodeCategory::Item,
        NodeCategory::Statement,
        NodeCategory::Expression,
        NodeCategory::Pattern,
        NodeCategory::Type,
        NodeCategory::Other,
    ];
}

/// Generates [`NodeKind`] together with its lookup tables.
macro_rules! node_kinds {
    (
        $(
            $category:ident {
                $( $kind:ident => $label:literal ),* $(,)?
            }
        )*
    ) => {
        /// Concrete kind of a tree node.
        ///
        /// The discriminant is the kind's ordinal; it is stable for the
        /// lifetime of a build and is what dispatch tables are keyed by.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[repr(u8)]
        pub enum NodeKind {
            $( $( $kind, )* )*
        }

        impl NodeKind {
            /// Every kind, in ordinal order.
            pub const ALL: &'static [NodeKind] = &[
                $( $( NodeKind::$kind, )* )*
            ];

            /// Category this kind belongs to.
            pub fn category(self) -> NodeCategory {
                match self {
                    $( $( NodeKind::$kind => NodeCategory::$category, )* )*
                }
            }

            /// Short human-readable label.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $( NodeKind::$kind => $label, )* )*
                }
            }
        }
    };
}

node_kinds! {
    Item {
        Function => "fn",
        Struct => "struct",
        Enum => "enum",
        Union => "union",
        Trait => "trait",
        Impl => "impl",
        Method => "impl fn",
        TraitMethod => "trait fn",
        AssocConst => "impl const",
        AssocType => "impl type",
        Module => "mod",
        Use => "use",
        Const => "const",
        Static => "static",
        TypeAlias => "type",
        MacroItem => "macro item",
        ExternCrate => "extern crate",
        ForeignMod => "extern block",
        Field => "field",
        Variant => "variant",
    }
    Statement {
        Let => "let",
        MacroStmt => "macro stmt",
    }
    Expression {
        Array => "array",
        Assign => "assign",
        Async => "async",
        Await => "await",
        Binary => "binary",
        Block => "block",
        Break => "break",
        Call => "call",
        Cast => "cast",
        Closure => "closure",
        Continue => "continue",
        FieldAccess => "field access",
        ForLoop => "for",
        If => "if",
        Index => "index",
        LetGuard => "let guard",
        Literal => "literal",
        Loop => "loop",
        MacroCall => "macro call",
        Match => "match",
        MatchArm => "match arm",
        MethodCall => "method call",
        Paren => "paren",
        Path => "path",
        Range => "range",
        Reference => "reference",
        Repeat => "repeat",
        Return => "return",
        StructLiteral => "struct literal",
        Try => "try",
        Tuple => "tuple",
        Unary => "unary",
        Unsafe => "unsafe",
        While => "while",
    }
    Pattern {
        BindingPattern => "binding pattern",
        StructPattern => "struct pattern",
        TupleStructPattern => "tuple struct pattern",
        TuplePattern => "tuple pattern",
        WildcardPattern => "wildcard pattern",
        OrPattern => "or pattern",
    }
    Type {
        TypePath => "type path",
        TypeReference => "type reference",
        TypeTuple => "type tuple",
        TypeSlice => "type slice",
        TypeArray => "type array",
        TypeFn => "fn pointer",
        TypeImplTrait => "impl trait",
        TypeTraitObject => "dyn trait",
    }
    Other {
        Attribute => "attribute",
        TypeParam => "type param",
        Other => "other",
    }
}

// KindSet stores kinds as bits of a u128.
const _: () = assert!(NodeKind::ALL.len() <= 128);

impl NodeKind {
    /// Number of distinct kinds.
    pub const COUNT: usize = NodeKind::ALL.len();

    /// Stable ordinal of this kind.
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Kind with the given ordinal, if any.
    pub fn from_ordinal(ordinal: usize) -> Option<NodeKind> {
        NodeKind::ALL.get(ordinal).copied()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tree element.
///
/// A parent exclusively owns its children. `line` is the 1-based source
/// line the node starts on, or 0 for nodes built without a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub line: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

/// An ordered sequence of top-level nodes, one per parsed input.
pub type Forest = Vec<Node>;

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            name: None,
            line: 0,
            children: Vec::new(),
        }
    }

    pub fn named(kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(kind)
        }
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(Node::size).sum::<usize>()
    }

    /// Pre-order iterator over this subtree, including `self`.
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder { stack: vec![self] }
    }
}

/// Pre-order, left-to-right iterator over a subtree.
pub struct Preorder<'n> {
    stack: Vec<&'n Node>,
}

impl<'n> Iterator for Preorder<'n> {
    type Item = &'n Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Total number of nodes in a forest.
pub fn forest_size(forest: &[Node]) -> usize {
    forest.iter().map(Node::size).sum()
}

/// Count of nodes per kind across a forest.
pub fn kind_histogram(forest: &[Node]) -> BTreeMap<NodeKind, usize> {
    let mut histogram = BTreeMap::new();
    for node in forest.iter().flat_map(Node::preorder) {
        *histogram.entry(node.kind).or_insert(0) += 1;
    }
    histogram
}
