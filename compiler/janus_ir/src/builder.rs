//! Shape-aware snapshot construction.
//!
//! [`AstBuilder`] sits on top of [`SnapshotBuilder`] and offers one
//! constructor per node shape, synthesizing the tokens each node needs.
//! Parsers use it to emit well-formed trees; tests use it to write Janus
//! programs without a parser.
//!
//! Every constructor returns a [`NodeId`] directly. The first construction
//! error is remembered and reported by [`AstBuilder::finish`].
//!
//! String literal tokens carry the unquoted content.

use crate::{
    NodeId, NodeKind, SharedInterner, Snapshot, SnapshotBuilder, SnapshotError, TokenId,
    TokenKind, TokenSpan,
};

/// Builder of well-shaped syntax trees.
pub struct AstBuilder {
    inner: SnapshotBuilder,
    line: u32,
    col: u32,
    byte: u32,
    error: Option<SnapshotError>,
}

impl AstBuilder {
    pub fn new(interner: SharedInterner) -> Self {
        AstBuilder {
            inner: SnapshotBuilder::new(interner),
            line: 1,
            col: 1,
            byte: 0,
            error: None,
        }
    }

    /// Line recorded for tokens synthesized from now on.
    pub fn set_line(&mut self, line: u32) {
        if line != self.line {
            self.line = line;
            self.col = 1;
        }
    }

    /// Freeze the tree with a `SourceFile` root holding `items`.
    pub fn finish(mut self, items: &[NodeId]) -> Result<Snapshot, SnapshotError> {
        let root = self.composite(NodeKind::SourceFile, TokenKind::Eof, items);
        if let Some(error) = self.error {
            return Err(error);
        }
        self.inner.finish(root)
    }

    // Token and node plumbing

    fn record<T>(&mut self, result: Result<T, SnapshotError>, fallback: T) -> T {
        match result {
            Ok(value) => value,
            Err(error) => {
                self.error.get_or_insert(error);
                fallback
            }
        }
    }

    fn token(&mut self, kind: TokenKind, text: Option<&str>) -> TokenId {
        let width = text
            .or(kind.fixed_text())
            .map_or(0, |t| u32::try_from(t.len()).unwrap_or(u32::MAX));
        let span = TokenSpan::single_line(
            self.byte,
            self.byte.saturating_add(width),
            self.line,
            self.col,
        );
        self.byte = self.byte.saturating_add(width).saturating_add(1);
        self.col = self.col.saturating_add(width).saturating_add(1);

        let name = text.map(|t| self.inner.intern(t));
        let result = self.inner.add_token(kind, name, span);
        self.record(result, TokenId::new(0))
    }

    fn node(
        &mut self,
        kind: NodeKind,
        first: TokenId,
        last: TokenId,
        children: &[NodeId],
    ) -> NodeId {
        let result = self.inner.add_node(kind, first, last, children);
        self.record(result, NodeId::new(0))
    }

    fn leaf(&mut self, kind: NodeKind, token_kind: TokenKind, text: Option<&str>) -> NodeId {
        let token = self.token(token_kind, text);
        self.node(kind, token, token, &[])
    }

    /// Node led by a synthesized `lead` token and covering its children.
    fn composite(&mut self, kind: NodeKind, lead: TokenKind, children: &[NodeId]) -> NodeId {
        let lead = self.token(lead, None);
        let mut first = lead;
        let mut last = lead;
        for &child in children {
            if let Some(token) = self.inner.first_token_of(child) {
                first = first.min(token);
            }
            if let Some(token) = self.inner.last_token_of(child) {
                last = last.max(token);
            }
        }
        self.node(kind, first, last, children)
    }

    /// Node spanning exactly its children's tokens.
    fn wrap(&mut self, kind: NodeKind, children: &[NodeId]) -> NodeId {
        let first = children.iter().filter_map(|&c| self.inner.first_token_of(c)).min();
        let last = children.iter().filter_map(|&c| self.inner.last_token_of(c)).max();
        match (first, last) {
            (Some(first), Some(last)) => self.node(kind, first, last, children),
            _ => self.composite(kind, TokenKind::Eof, children),
        }
    }

    fn or_empty(&mut self, node: Option<NodeId>) -> NodeId {
        match node {
            Some(node) => node,
            None => self.empty(),
        }
    }

    // Leaves

    /// Placeholder for an absent optional child.
    pub fn empty(&mut self) -> NodeId {
        let token = self.token(TokenKind::Eof, None);
        self.node(NodeKind::Empty, token, token, &[])
    }

    pub fn int(&mut self, value: i64) -> NodeId {
        let text = value.to_string();
        self.leaf(NodeKind::IntegerLiteral, TokenKind::IntLiteral, Some(&text))
    }

    pub fn float(&mut self, value: f64) -> NodeId {
        let text = format!("{value:?}");
        self.leaf(NodeKind::FloatLiteral, TokenKind::FloatLiteral, Some(&text))
    }

    pub fn string(&mut self, value: &str) -> NodeId {
        self.leaf(NodeKind::StringLiteral, TokenKind::StringLiteral, Some(value))
    }

    pub fn bool(&mut self, value: bool) -> NodeId {
        let kind = if value { TokenKind::True } else { TokenKind::False };
        self.leaf(NodeKind::BoolLiteral, kind, None)
    }

    pub fn ident(&mut self, name: &str) -> NodeId {
        self.leaf(NodeKind::Identifier, TokenKind::Identifier, Some(name))
    }

    /// Named type, e.g. `i32` or `Point`.
    pub fn ty(&mut self, name: &str) -> NodeId {
        self.leaf(NodeKind::TypeExpr, TokenKind::Identifier, Some(name))
    }

    /// `&dyn Trait`.
    pub fn dyn_ty(&mut self, trait_name: &str) -> NodeId {
        let inner = self.ty(trait_name);
        self.composite(NodeKind::DynRefType, TokenKind::Dyn, &[inner])
    }

    /// `Payload ! ErrorSet`.
    pub fn error_union_ty(&mut self, payload: &str, error_set: &str) -> NodeId {
        let payload = self.ty(payload);
        let error_set = self.ty(error_set);
        self.composite(NodeKind::ErrorUnionType, TokenKind::Bang, &[payload, error_set])
    }

    fn operator(&mut self, op: TokenKind) -> NodeId {
        self.leaf(NodeKind::Operator, op, None)
    }

    // Expressions

    /// Binary expression; `op` is the operator token kind (`Plus`, `And`, ...).
    pub fn binary(&mut self, lhs: NodeId, op: TokenKind, rhs: NodeId) -> NodeId {
        let op = self.operator(op);
        self.wrap(NodeKind::BinaryExpr, &[lhs, op, rhs])
    }

    /// Prefix unary expression (`Minus`, `Not`, `Bang`, `Tilde`).
    pub fn unary(&mut self, op: TokenKind, operand: NodeId) -> NodeId {
        let op = self.operator(op);
        self.wrap(NodeKind::UnaryExpr, &[op, operand])
    }

    /// Call of a named function.
    pub fn call(&mut self, callee: &str, args: &[NodeId]) -> NodeId {
        let callee = self.ident(callee);
        self.call_expr(callee, args)
    }

    /// Call of an arbitrary callee expression.
    pub fn call_expr(&mut self, callee: NodeId, args: &[NodeId]) -> NodeId {
        let mut children = Vec::with_capacity(args.len() + 1);
        children.push(callee);
        children.extend_from_slice(args);
        self.composite(NodeKind::CallExpr, TokenKind::LParen, &children)
    }

    /// `object.name`.
    pub fn field(&mut self, object: NodeId, name: &str) -> NodeId {
        let name = self.ident(name);
        self.composite(NodeKind::FieldExpr, TokenKind::Dot, &[object, name])
    }

    /// `receiver.method(args)`.
    pub fn method_call(&mut self, receiver: NodeId, method: &str, args: &[NodeId]) -> NodeId {
        let callee = self.field(receiver, method);
        self.call_expr(callee, args)
    }

    /// `object[index]`.
    pub fn index(&mut self, object: NodeId, index: NodeId) -> NodeId {
        self.composite(NodeKind::IndexExpr, TokenKind::LBracket, &[object, index])
    }

    /// `Type { field: value, ... }`.
    pub fn struct_lit(&mut self, type_name: &str, fields: &[(&str, NodeId)]) -> NodeId {
        let mut children = Vec::with_capacity(fields.len() + 1);
        children.push(self.ty(type_name));
        for &(name, value) in fields {
            let name = self.ident(name);
            children.push(self.composite(NodeKind::FieldInit, TokenKind::Colon, &[name, value]));
        }
        self.composite(NodeKind::StructLiteral, TokenKind::LBrace, &children)
    }

    pub fn array_lit(&mut self, elements: &[NodeId]) -> NodeId {
        self.composite(NodeKind::ArrayLiteral, TokenKind::LBracket, elements)
    }

    /// Inclusive range `start..end`.
    pub fn range(&mut self, start: NodeId, end: NodeId) -> NodeId {
        self.composite(NodeKind::RangeExpr, TokenKind::DotDot, &[start, end])
    }

    /// Exclusive range `start..<end`.
    pub fn range_excl(&mut self, start: NodeId, end: NodeId) -> NodeId {
        self.composite(NodeKind::RangeExclusiveExpr, TokenKind::DotDotLt, &[start, end])
    }

    /// Postfix `expr?`.
    pub fn try_expr(&mut self, expr: NodeId) -> NodeId {
        self.composite(NodeKind::TryExpr, TokenKind::Question, &[expr])
    }

    /// `expr catch |binding| { handler }`.
    pub fn catch_expr(&mut self, expr: NodeId, binding: Option<&str>, handler: NodeId) -> NodeId {
        let binding = match binding {
            Some(name) => self.ident(name),
            None => self.empty(),
        };
        self.composite(NodeKind::CatchExpr, TokenKind::Catch, &[expr, binding, handler])
    }

    pub fn await_expr(&mut self, expr: NodeId) -> NodeId {
        self.composite(NodeKind::AwaitExpr, TokenKind::Await, &[expr])
    }

    /// `spawn call(...)`.
    pub fn spawn(&mut self, call: NodeId) -> NodeId {
        self.composite(NodeKind::SpawnExpr, TokenKind::Spawn, &[call])
    }

    // Statements

    pub fn block(&mut self, stmts: &[NodeId]) -> NodeId {
        self.composite(NodeKind::BlockStmt, TokenKind::LBrace, stmts)
    }

    /// `let name = init`.
    pub fn let_stmt(&mut self, name: &str, init: NodeId) -> NodeId {
        self.binding(NodeKind::LetStmt, TokenKind::Let, name, None, Some(init))
    }

    /// `let name: ty = init`.
    pub fn let_typed(&mut self, name: &str, ty: NodeId, init: NodeId) -> NodeId {
        self.binding(NodeKind::LetStmt, TokenKind::Let, name, Some(ty), Some(init))
    }

    /// `var name = init`.
    pub fn var_stmt(&mut self, name: &str, init: NodeId) -> NodeId {
        self.binding(NodeKind::VarStmt, TokenKind::Var, name, None, Some(init))
    }

    /// `var name: ty = init` or `var name: ty`.
    pub fn var_typed(&mut self, name: &str, ty: NodeId, init: Option<NodeId>) -> NodeId {
        self.binding(NodeKind::VarStmt, TokenKind::Var, name, Some(ty), init)
    }

    fn binding(
        &mut self,
        kind: NodeKind,
        lead: TokenKind,
        name: &str,
        ty: Option<NodeId>,
        init: Option<NodeId>,
    ) -> NodeId {
        let name = self.ident(name);
        let ty = self.or_empty(ty);
        let init = self.or_empty(init);
        self.composite(kind, lead, &[name, ty, init])
    }

    /// `target = value`.
    pub fn assign(&mut self, target: NodeId, value: NodeId) -> NodeId {
        self.composite(NodeKind::AssignStmt, TokenKind::Eq, &[target, value])
    }

    /// `target op= value`; `op` is the compound token kind (`PlusEq`, ...).
    pub fn compound_assign(&mut self, target: NodeId, op: TokenKind, value: NodeId) -> NodeId {
        let op = self.operator(op);
        self.wrap(NodeKind::CompoundAssignStmt, &[target, op, value])
    }

    pub fn expr_stmt(&mut self, expr: NodeId) -> NodeId {
        self.wrap(NodeKind::ExprStmt, &[expr])
    }

    pub fn ret(&mut self, value: Option<NodeId>) -> NodeId {
        match value {
            Some(value) => self.composite(NodeKind::ReturnStmt, TokenKind::Return, &[value]),
            None => self.composite(NodeKind::ReturnStmt, TokenKind::Return, &[]),
        }
    }

    /// `if cond { then } else ...`; `else_branch` is a block or another `if`.
    pub fn if_stmt(&mut self, cond: NodeId, then: NodeId, else_branch: Option<NodeId>) -> NodeId {
        let else_branch = self.or_empty(else_branch);
        self.composite(NodeKind::IfStmt, TokenKind::If, &[cond, then, else_branch])
    }

    pub fn while_stmt(&mut self, cond: NodeId, body: NodeId) -> NodeId {
        self.composite(NodeKind::WhileStmt, TokenKind::While, &[cond, body])
    }

    /// `for var in range { body }`.
    pub fn for_stmt(&mut self, var: &str, range: NodeId, body: NodeId) -> NodeId {
        let var = self.ident(var);
        self.composite(NodeKind::ForStmt, TokenKind::For, &[var, range, body])
    }

    pub fn brk(&mut self) -> NodeId {
        self.composite(NodeKind::BreakStmt, TokenKind::Break, &[])
    }

    pub fn cont(&mut self) -> NodeId {
        self.composite(NodeKind::ContinueStmt, TokenKind::Continue, &[])
    }

    /// `stmt when cond`.
    pub fn when(&mut self, stmt: NodeId, cond: NodeId) -> NodeId {
        self.composite(NodeKind::PostfixWhen, TokenKind::When, &[stmt, cond])
    }

    /// `stmt unless cond`.
    pub fn unless(&mut self, stmt: NodeId, cond: NodeId) -> NodeId {
        self.composite(NodeKind::PostfixUnless, TokenKind::Unless, &[stmt, cond])
    }

    pub fn match_stmt(&mut self, scrutinee: NodeId, arms: &[NodeId]) -> NodeId {
        let mut children = Vec::with_capacity(arms.len() + 1);
        children.push(scrutinee);
        children.extend_from_slice(arms);
        self.composite(NodeKind::MatchStmt, TokenKind::Match, &children)
    }

    /// `pattern when guard => body`.
    pub fn arm(&mut self, pattern: NodeId, guard: Option<NodeId>, body: NodeId) -> NodeId {
        let guard = self.or_empty(guard);
        self.composite(NodeKind::MatchArm, TokenKind::FatArrow, &[pattern, guard, body])
    }

    /// `_`.
    pub fn wildcard(&mut self) -> NodeId {
        self.leaf(NodeKind::WildcardPattern, TokenKind::Underscore, None)
    }

    /// `!pattern`.
    pub fn negate(&mut self, pattern: NodeId) -> NodeId {
        self.composite(NodeKind::NegatePattern, TokenKind::Bang, &[pattern])
    }

    /// `fail ErrorSet.Variant`.
    pub fn fail(&mut self, value: NodeId) -> NodeId {
        self.composite(NodeKind::FailStmt, TokenKind::Fail, &[value])
    }

    /// `nursery { body }`.
    pub fn nursery(&mut self, body: NodeId) -> NodeId {
        self.composite(NodeKind::NurseryStmt, TokenKind::Nursery, &[body])
    }

    // Declarations

    /// Parameter with an optional type.
    pub fn param(&mut self, name: &str, ty: Option<NodeId>) -> NodeId {
        let name = self.ident(name);
        let ty = self.or_empty(ty);
        self.composite(NodeKind::Param, TokenKind::Colon, &[name, ty])
    }

    /// `func name(params) -> ret { body }`.
    pub fn func(
        &mut self,
        name: &str,
        params: &[NodeId],
        ret: Option<NodeId>,
        body: NodeId,
    ) -> NodeId {
        self.function(NodeKind::FuncDecl, TokenKind::Func, name, params, ret, Some(body))
    }

    /// `async func name(params) -> ret { body }`.
    pub fn async_func(
        &mut self,
        name: &str,
        params: &[NodeId],
        ret: Option<NodeId>,
        body: NodeId,
    ) -> NodeId {
        self.function(NodeKind::AsyncFuncDecl, TokenKind::Async, name, params, ret, Some(body))
    }

    /// Bodiless signature: a trait method without default or a native
    /// binding signature.
    pub fn abstract_method(&mut self, name: &str, params: &[NodeId], ret: Option<NodeId>) -> NodeId {
        self.function(NodeKind::FuncDecl, TokenKind::Func, name, params, ret, None)
    }

    fn function(
        &mut self,
        kind: NodeKind,
        lead: TokenKind,
        name: &str,
        params: &[NodeId],
        ret: Option<NodeId>,
        body: Option<NodeId>,
    ) -> NodeId {
        let name = self.ident(name);
        let params = self.composite(NodeKind::ParamList, TokenKind::LParen, params);
        let ret = self.or_empty(ret);
        let body = self.or_empty(body);
        self.composite(kind, lead, &[name, params, ret, body])
    }

    /// `struct Name { field: Type, ... }`.
    pub fn struct_decl(&mut self, name: &str, fields: &[(&str, &str)]) -> NodeId {
        let mut children = Vec::with_capacity(fields.len() + 1);
        children.push(self.ident(name));
        for &(field, ty) in fields {
            let field = self.ident(field);
            let ty = self.ty(ty);
            children.push(self.composite(NodeKind::FieldDecl, TokenKind::Colon, &[field, ty]));
        }
        self.composite(NodeKind::StructDecl, TokenKind::Struct, &children)
    }

    /// `error Name { Variant, ... }`.
    pub fn error_decl(&mut self, name: &str, variants: &[&str]) -> NodeId {
        let mut children = Vec::with_capacity(variants.len() + 1);
        children.push(self.ident(name));
        for variant in variants {
            children.push(self.ident(variant));
        }
        self.composite(NodeKind::ErrorDecl, TokenKind::Error, &children)
    }

    /// `trait Name { methods }`.
    pub fn trait_decl(&mut self, name: &str, methods: &[NodeId]) -> NodeId {
        let mut children = Vec::with_capacity(methods.len() + 1);
        children.push(self.ident(name));
        children.extend_from_slice(methods);
        self.composite(NodeKind::TraitDecl, TokenKind::Trait, &children)
    }

    /// `impl Trait for Type { methods }`, or `impl Type { methods }` when
    /// `trait_name` is `None`.
    pub fn impl_decl(
        &mut self,
        self_type: &str,
        trait_name: Option<&str>,
        methods: &[NodeId],
    ) -> NodeId {
        let mut children = Vec::with_capacity(methods.len() + 2);
        children.push(self.ty(self_type));
        let trait_node = match trait_name {
            Some(name) => self.ty(name),
            None => self.empty(),
        };
        children.push(trait_node);
        children.extend_from_slice(methods);
        self.composite(NodeKind::ImplDecl, TokenKind::Impl, &children)
    }

    /// `import a.b.c`.
    pub fn import(&mut self, segments: &[&str]) -> NodeId {
        let children: Vec<NodeId> = segments.iter().map(|s| self.ident(s)).collect();
        self.composite(NodeKind::ImportStmt, TokenKind::Import, &children)
    }

    /// `use zig "path" { signatures }`.
    pub fn use_zig(&mut self, path: &str, signatures: &[NodeId]) -> NodeId {
        let mut children = Vec::with_capacity(signatures.len() + 1);
        children.push(self.string(path));
        children.extend_from_slice(signatures);
        self.composite(NodeKind::UseZigStmt, TokenKind::Use, &children)
    }
}

#[cfg(test)]
mod tests;
