// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Visitor dispatch and tree traversal for visitbench.
//!
//! This crate walks trees of typed nodes and decides, for each node, which
//! registered visitors run on it.
//!
//! # Overview
//!
//! - **Nodes**: [`Node`] trees tagged with a closed [`NodeKind`].
//! - **Applicability**: visitors opt into kinds through [`Applicable`].
//! - **Dispatch**: [`CachedDispatch`] memoizes the applicable visitors per
//!   kind; [`NaiveDispatch`] re-evaluates them at every node.
//! - **Traversal**: [`Traverser`] walks forests pre-order with
//!   enter/leave hooks and honors [`VisitResult`] control signals.
//!
//! # Quick Start
//!
//! ```
//! use visitbench_core::{
//!     Applicability, Applicable, KindSet, Node, NodeKind, Traverser, VisitResult, Visitor,
//!     VisitorSet,
//! };
//!
//! struct FunctionCounter;
//!
//! impl Visitor<usize> for FunctionCounter {
//!     fn enter(&mut self, _node: &Node, functions: &mut usize) -> VisitResult {
//!         *functions += 1;
//!         VisitResult::Continue
//!     }
//! }
//!
//! impl Applicable for FunctionCounter {
//!     fn applicability(&self) -> Applicability {
//!         KindSet::of(&[NodeKind::Function]).into()
//!     }
//! }
//!
//! let set = VisitorSet::<usize>::new().with_scoped(FunctionCounter).unwrap();
//! let mut traverser = Traverser::cached(set);
//!
//! let mut forest = vec![
//!     Node::named(NodeKind::Function, "a"),
//!     Node::named(NodeKind::Struct, "B"),
//!     Node::named(NodeKind::Function, "c"),
//! ];
//! let mut functions: usize = 0;
//! traverser.traverse(&mut forest, &mut functions);
//! assert_eq!(functions, 2);
//! ```

pub mod applicability;
pub mod dispatch;
pub mod error;
pub mod node;
pub mod traverse;
pub mod visitor;

pub use applicability::{Applicability, Applicable, KindSet};
pub use dispatch::{CachedDispatch, Dispatch, DispatchStats, NaiveDispatch, SharedDispatchTable};
pub use error::{ConfigError, ConfigResult};
pub use node::{forest_size, kind_histogram, Forest, Node, NodeCategory, NodeKind};
pub use traverse::{TraversalStats, Traverser};
pub use visitor::{VisitResult, Visitor, VisitorSet};
