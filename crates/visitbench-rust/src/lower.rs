// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Lowering from `syn` syntax trees to visitbench nodes.
//!
//! Lowering is a single [`Visit`] pass. Each syntax element that has a
//! [`NodeKind`] opens a node, lets `syn` walk the element's children in
//! source order, then closes the node into its parent. Elements without a
//! kind (blocks, signatures, generics, ...) are transparent: their
//! children attach to the nearest enclosing node.

use proc_macro2::Ident;
use syn::visit::{self, Visit};
use syn::{Member, Path, Type};

use visitbench_core::{Forest, Node, NodeKind};

/// Lower a parsed file into a forest of top-level nodes.
pub fn lower_file(file: &syn::File) -> Forest {
    let mut lowering = Lowering::default();
    lowering.visit_file(file);
    lowering.finish()
}

#[derive(Default)]
struct Lowering {
    stack: Vec<Node>,
    roots: Forest,
}

impl Lowering {
    /// Start a node. Its line comes from its name when it has one and is
    /// inherited from the enclosing node otherwise.
    fn open(&mut self, kind: NodeKind, ident: Option<&Ident>) {
        let (name, line) = match ident {
            Some(ident) => {
                let line = u32::try_from(ident.span().start().line).unwrap_or(u32::MAX);
                (Some(ident.to_string()), line)
            }
            None => (None, self.stack.last().map_or(0, |parent| parent.line)),
        };
        self.stack.push(Node {
            kind,
            name,
            line,
            children: Vec::new(),
        });
    }

    fn close(&mut self) {
        let Some(node) = self.stack.pop() else {
            return;
        };
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn finish(mut self) -> Forest {
        while !self.stack.is_empty() {
            self.close();
        }
        self.roots
    }
}

fn last_ident(path: &Path) -> Option<&Ident> {
    path.segments.last().map(|segment| &segment.ident)
}

/// Generates `Visit` methods that wrap the default walk in open/close.
///
/// `visit_item_fn(ItemFn) => Function |n| Some(&n.sig.ident);` lowers every
/// `ItemFn` to a `Function` node named after its identifier.
macro_rules! lower {
    (@name $node:ident) => {
        None
    };
    (@name $node:ident |$n:ident| $name:expr) => {{
        let $n = $node;
        $name
    }};
    ($( $method:ident($ty:ident) => $kind:ident $(|$n:ident| $name:expr)? ; )*) => {
        $(
            fn $method(&mut self, node: &'ast syn::$ty) {
                let ident: Option<&'ast Ident> = lower!(@name node $(|$n| $name)?);
                self.open(NodeKind::$kind, ident);
                visit::$method(self, node);
                self.close();
            }
        )*
    };
}

impl<'ast> Visit<'ast> for Lowering {
    lower! {
        // Items
        visit_item_fn(ItemFn) => Function |n| Some(&n.sig.ident);
        visit_item_struct(ItemStruct) => Struct |n| Some(&n.ident);
        visit_item_enum(ItemEnum) => Enum |n| Some(&n.ident);
        visit_item_union(ItemUnion) => Union |n| Some(&n.ident);
        visit_item_trait(ItemTrait) => Trait |n| Some(&n.ident);
        visit_item_impl(ItemImpl) => Impl |n| match &*n.self_ty {
            Type::Path(ty) => last_ident(&ty.path),
            _ => None,
        };
        visit_impl_item_fn(ImplItemFn) => Method |n| Some(&n.sig.ident);
        visit_trait_item_fn(TraitItemFn) => TraitMethod |n| Some(&n.sig.ident);
        visit_impl_item_const(ImplItemConst) => AssocConst |n| Some(&n.ident);
        visit_impl_item_type(ImplItemType) => AssocType |n| Some(&n.ident);
        visit_item_mod(ItemMod) => Module |n| Some(&n.ident);
        visit_item_use(ItemUse) => Use;
        visit_item_const(ItemConst) => Const |n| Some(&n.ident);
        visit_item_static(ItemStatic) => Static |n| Some(&n.ident);
        visit_item_type(ItemType) => TypeAlias |n| Some(&n.ident);
        visit_item_macro(ItemMacro) => MacroItem |n| n.ident.as_ref().or_else(|| last_ident(&n.mac.path));
        visit_item_extern_crate(ItemExternCrate) => ExternCrate |n| Some(&n.ident);
        visit_item_foreign_mod(ItemForeignMod) => ForeignMod;
        visit_field(Field) => Field |n| n.ident.as_ref();
        visit_variant(Variant) => Variant |n| Some(&n.ident);

        // Statements
        visit_local(Local) => Let;
        visit_stmt_macro(StmtMacro) => MacroStmt |n| last_ident(&n.mac.path);

        // Expressions
        visit_expr_array(ExprArray) => Array;
        visit_expr_assign(ExprAssign) => Assign;
        visit_expr_async(ExprAsync) => Async;
        visit_expr_await(ExprAwait) => Await;
        visit_expr_binary(ExprBinary) => Binary;
        visit_expr_block(ExprBlock) => Block;
        visit_expr_break(ExprBreak) => Break;
        visit_expr_call(ExprCall) => Call;
        visit_expr_cast(ExprCast) => Cast;
        visit_expr_closure(ExprClosure) => Closure;
        visit_expr_continue(ExprContinue) => Continue;
        visit_expr_field(ExprField) => FieldAccess |n| match &n.member {
            Member::Named(ident) => Some(ident),
            Member::Unnamed(_) => None,
        };
        visit_expr_for_loop(ExprForLoop) => ForLoop;
        visit_expr_if(ExprIf) => If;
        visit_expr_index(ExprIndex) => Index;
        visit_expr_let(ExprLet) => LetGuard;
        visit_expr_lit(ExprLit) => Literal;
        visit_expr_loop(ExprLoop) => Loop;
        visit_expr_macro(ExprMacro) => MacroCall |n| last_ident(&n.mac.path);
        visit_expr_match(ExprMatch) => Match;
        visit_arm(Arm) => MatchArm;
        visit_expr_method_call(ExprMethodCall) => MethodCall |n| Some(&n.method);
        visit_expr_paren(ExprParen) => Paren;
        visit_expr_path(ExprPath) => Path |n| last_ident(&n.path);
        visit_expr_range(ExprRange) => Range;
        visit_expr_reference(ExprReference) => Reference;
        visit_expr_repeat(ExprRepeat) => Repeat;
        visit_expr_return(ExprReturn) => Return;
        visit_expr_struct(ExprStruct) => StructLiteral |n| last_ident(&n.path);
        visit_expr_try(ExprTry) => Try;
        visit_expr_tuple(ExprTuple) => Tuple;
        visit_expr_unary(ExprUnary) => Unary;
        visit_expr_unsafe(ExprUnsafe) => Unsafe;
        visit_expr_while(ExprWhile) => While;
        visit_expr_infer(ExprInfer) => Other;
        visit_expr_try_block(ExprTryBlock) => Other;
        visit_expr_yield(ExprYield) => Other;

        // Patterns
        visit_pat_ident(PatIdent) => BindingPattern |n| Some(&n.ident);
        visit_pat_struct(PatStruct) => StructPattern |n| last_ident(&n.path);
        visit_pat_tuple_struct(PatTupleStruct) => TupleStructPattern |n| last_ident(&n.path);
        visit_pat_tuple(PatTuple) => TuplePattern;
        visit_pat_wild(PatWild) => WildcardPattern;
        visit_pat_or(PatOr) => OrPattern;

        // Types
        visit_type_path(TypePath) => TypePath |n| last_ident(&n.path);
        visit_type_reference(TypeReference) => TypeReference;
        visit_type_tuple(TypeTuple) => TypeTuple;
        visit_type_slice(TypeSlice) => TypeSlice;
        visit_type_array(TypeArray) => TypeArray;
        visit_type_bare_fn(TypeBareFn) => TypeFn;
        visit_type_impl_trait(TypeImplTrait) => TypeImplTrait;
        visit_type_trait_object(TypeTraitObject) => TypeTraitObject;

        // Other
        visit_attribute(Attribute) => Attribute |n| last_ident(n.path());
        visit_type_param(TypeParam) => TypeParam |n| Some(&n.ident);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lower(source: &str) -> Forest {
        lower_file(&syn::parse_file(source).unwrap())
    }

    #[test]
    fn transparent_elements_attach_children_to_enclosing_node() {
        let forest = lower("fn f() { let x = 1; }");
        assert_eq!(forest.len(), 1);
        let function = &forest[0];
        assert_eq!(function.kind, NodeKind::Function);
        assert_eq!(function.name.as_deref(), Some("f"));

        // The body block is transparent: the `let` hangs off the function.
        let kinds: Vec<_> = function.children.iter().map(|n| n.kind).collect();
        assert_eq!(kinds, vec![NodeKind::Let]);
        let binding: Vec<_> = function.children[0].children.iter().map(|n| n.kind).collect();
        assert_eq!(binding, vec![NodeKind::BindingPattern, NodeKind::Literal]);
    }

    #[test]
    fn unnamed_nodes_inherit_the_enclosing_line() {
        let forest = lower("\n\nfn g() {\n    return;\n}\n");
        let function = &forest[0];
        assert_eq!(function.line, 3);
        assert_eq!(function.children[0].kind, NodeKind::Return);
        assert_eq!(function.children[0].line, 3);
    }
}
