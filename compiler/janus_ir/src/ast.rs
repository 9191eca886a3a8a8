//! Syntax node identifiers and kinds.
//!
//! Nodes live in a [`Snapshot`](crate::Snapshot) arena and refer to their
//! children by [`NodeId`]. The child layout of each kind is a contract
//! between the parser and the lowering engine:
//!
//! | kind | children |
//! |------|----------|
//! | `FuncDecl`, `AsyncFuncDecl` | name, `ParamList`, return type or `Empty`, body or `Empty` |
//! | `Param` | name, type or `Empty` |
//! | `ErrorUnionType` | payload type, error set type |
//! | `DynRefType` | trait type |
//! | `StructDecl` | name, `FieldDecl`* |
//! | `ErrorDecl` | name, variant identifiers* |
//! | `TraitDecl` | name, `FuncDecl`* |
//! | `ImplDecl` | self type, trait type or `Empty`, `FuncDecl`* |
//! | `ImportStmt` | path segments+ |
//! | `UseZigStmt` | path string, signature `FuncDecl`* |
//! | `LetStmt`, `VarStmt` | name, type or `Empty`, init or `Empty` |
//! | `AssignStmt` | target, value |
//! | `CompoundAssignStmt` | target, `Operator`, value |
//! | `IfStmt` | cond, then block, else block / `IfStmt` / `Empty` |
//! | `WhileStmt` | cond, block |
//! | `ForStmt` | binding, range, block |
//! | `PostfixWhen`, `PostfixUnless` | guarded stmt, cond |
//! | `MatchStmt` | scrutinee, `MatchArm`* |
//! | `MatchArm` | pattern, guard or `Empty`, body |
//! | `BinaryExpr` | lhs, `Operator`, rhs |
//! | `UnaryExpr` | `Operator`, operand |
//! | `CallExpr` | callee, args* |
//! | `FieldExpr` | object, field name |
//! | `IndexExpr` | object, index |
//! | `StructLiteral` | type, `FieldInit`* |
//! | `CatchExpr` | expr, binding or `Empty`, handler block |
//!
//! Leaves (`Identifier`, literals, `TypeExpr`, `Operator`,
//! `WildcardPattern`) carry their text in `first_token`.

use std::fmt;

use crate::TokenId;

/// Index of a node within its snapshot.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Syntactic category of a node.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    SourceFile,
    Empty,

    // Declarations
    FuncDecl,
    AsyncFuncDecl,
    ParamList,
    Param,
    StructDecl,
    FieldDecl,
    ErrorDecl,
    TraitDecl,
    ImplDecl,
    ImportStmt,
    UseZigStmt,

    // Types
    TypeExpr,
    DynRefType,
    ErrorUnionType,

    // Statements
    BlockStmt,
    LetStmt,
    VarStmt,
    AssignStmt,
    CompoundAssignStmt,
    ExprStmt,
    ReturnStmt,
    IfStmt,
    WhileStmt,
    ForStmt,
    BreakStmt,
    ContinueStmt,
    PostfixWhen,
    PostfixUnless,
    MatchStmt,
    MatchArm,
    FailStmt,
    NurseryStmt,

    // Patterns
    WildcardPattern,
    NegatePattern,

    // Expressions
    IntegerLiteral,
    FloatLiteral,
    StringLiteral,
    BoolLiteral,
    Identifier,
    Operator,
    BinaryExpr,
    UnaryExpr,
    CallExpr,
    FieldExpr,
    IndexExpr,
    StructLiteral,
    FieldInit,
    ArrayLiteral,
    RangeExpr,
    RangeExclusiveExpr,
    TryExpr,
    CatchExpr,
    AwaitExpr,
    SpawnExpr,
}

impl NodeKind {
    /// Whether the text of `first_token` is part of this node's meaning.
    ///
    /// Used by content hashing: for these kinds the token text is hashed;
    /// for every other kind only the structure is.
    pub const fn carries_text(self) -> bool {
        matches!(
            self,
            NodeKind::IntegerLiteral
                | NodeKind::FloatLiteral
                | NodeKind::StringLiteral
                | NodeKind::BoolLiteral
                | NodeKind::Identifier
                | NodeKind::Operator
                | NodeKind::TypeExpr
        )
    }

    /// Function-like declarations that produce an IR graph.
    pub const fn is_function(self) -> bool {
        matches!(self, NodeKind::FuncDecl | NodeKind::AsyncFuncDecl)
    }
}

/// Borrowed view of a node in a frozen snapshot.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Node<'a> {
    pub kind: NodeKind,
    pub first_token: TokenId,
    pub last_token: TokenId,
    pub children: &'a [NodeId],
}

impl<'a> Node<'a> {
    /// Child at position `index`, if present.
    #[inline]
    pub fn child(&self, index: usize) -> Option<NodeId> {
        self.children.get(index).copied()
    }

    /// Children from position `start` on.
    #[inline]
    pub fn children_from(&self, start: usize) -> &'a [NodeId] {
        self.children.get(start..).unwrap_or(&[])
    }
}
