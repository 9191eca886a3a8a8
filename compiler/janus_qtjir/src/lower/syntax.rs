//! Checked access to a snapshot's tree.
//!
//! Every accessor turns a broken parser contract (missing child, wrong
//! kind, textless leaf) into a structural [`LowerError`].

use janus_diagnostic::ErrorCode;
use janus_ir::{Name, Node, NodeId, NodeKind, Snapshot, TokenKind};

use crate::LowerError;

/// A snapshot plus the unit name used in error reports.
#[derive(Copy, Clone)]
pub(crate) struct Syntax<'a> {
    pub snapshot: &'a Snapshot,
    pub unit: &'a str,
}

impl<'a> Syntax<'a> {
    pub fn new(snapshot: &'a Snapshot, unit: &'a str) -> Self {
        Syntax { snapshot, unit }
    }

    #[cold]
    pub fn structural(&self, node: NodeId, reason: impl Into<String>) -> LowerError {
        LowerError::Structural {
            unit: self.unit.to_string(),
            node,
            reason: reason.into(),
        }
    }

    #[cold]
    pub fn semantic(&self, code: ErrorCode, node: NodeId, message: impl Into<String>) -> LowerError {
        LowerError::Semantic {
            code,
            unit: self.unit.to_string(),
            node,
            span: self.snapshot.node_span(node),
            message: message.into(),
        }
    }

    pub fn node(&self, id: NodeId) -> Result<Node<'a>, LowerError> {
        self.snapshot
            .node(id)
            .ok_or_else(|| self.structural(id, "node does not exist"))
    }

    pub fn kind(&self, id: NodeId) -> Result<NodeKind, LowerError> {
        Ok(self.node(id)?.kind)
    }

    /// The node, which must be of `kind`.
    pub fn expect(&self, id: NodeId, kind: NodeKind) -> Result<Node<'a>, LowerError> {
        let node = self.node(id)?;
        if node.kind == kind {
            Ok(node)
        } else {
            Err(self.structural(id, format!("expected {kind:?}, found {:?}", node.kind)))
        }
    }

    pub fn child(&self, id: NodeId, index: usize) -> Result<NodeId, LowerError> {
        let node = self.node(id)?;
        node.child(index).ok_or_else(|| {
            self.structural(id, format!("{:?} node has no child {index}", node.kind))
        })
    }

    pub fn children(&self, id: NodeId) -> Result<&'a [NodeId], LowerError> {
        Ok(self.node(id)?.children)
    }

    pub fn children_from(&self, id: NodeId, start: usize) -> Result<&'a [NodeId], LowerError> {
        Ok(self.node(id)?.children_from(start))
    }

    /// Child `index`, or `None` when it is the `Empty` placeholder.
    pub fn optional_child(&self, id: NodeId, index: usize) -> Result<Option<NodeId>, LowerError> {
        let child = self.child(id, index)?;
        Ok((self.kind(child)? != NodeKind::Empty).then_some(child))
    }

    /// Text of a leaf node.
    pub fn text(&self, id: NodeId) -> Result<&'static str, LowerError> {
        let node = self.node(id)?;
        self.snapshot
            .node_text(id)
            .ok_or_else(|| self.structural(id, format!("{:?} node has no text", node.kind)))
    }

    /// Interned name of an identifier-like leaf.
    pub fn name(&self, id: NodeId) -> Result<Name, LowerError> {
        let node = self.node(id)?;
        self.snapshot
            .node_name(id)
            .ok_or_else(|| self.structural(id, format!("{:?} node has no name", node.kind)))
    }

    /// Text of child `index`, which must be an identifier.
    pub fn ident_text(&self, id: NodeId, index: usize) -> Result<&'static str, LowerError> {
        let child = self.child(id, index)?;
        self.expect(child, NodeKind::Identifier)?;
        self.text(child)
    }

    /// Token kind of an `Operator` node.
    pub fn operator(&self, id: NodeId) -> Result<TokenKind, LowerError> {
        let node = self.expect(id, NodeKind::Operator)?;
        self.snapshot
            .token(node.first_token)
            .map(|t| t.kind)
            .ok_or_else(|| self.structural(id, "operator token does not exist"))
    }

    /// Token kind of a node's first token.
    pub fn lead_token(&self, id: NodeId) -> Result<TokenKind, LowerError> {
        let node = self.node(id)?;
        self.snapshot
            .token(node.first_token)
            .map(|t| t.kind)
            .ok_or_else(|| self.structural(id, "token does not exist"))
    }
}

/// Kinds that produce a value.
pub(crate) fn is_expression(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::IntegerLiteral
            | NodeKind::FloatLiteral
            | NodeKind::StringLiteral
            | NodeKind::BoolLiteral
            | NodeKind::Identifier
            | NodeKind::BinaryExpr
            | NodeKind::UnaryExpr
            | NodeKind::CallExpr
            | NodeKind::FieldExpr
            | NodeKind::IndexExpr
            | NodeKind::StructLiteral
            | NodeKind::ArrayLiteral
            | NodeKind::TryExpr
            | NodeKind::CatchExpr
            | NodeKind::AwaitExpr
            | NodeKind::SpawnExpr
    )
}
