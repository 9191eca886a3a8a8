//! Statements, blocks, bindings and returns.

use janus_diagnostic::ErrorCode;
use janus_ir::{NodeId, NodeKind};

use super::expr::Lowered;
use super::func::FnLowerer;
use super::scope::Binding;
use super::syntax::is_expression;
use super::types::ValueType;
use crate::ir::{IrData, IrRef, OpCode};
use crate::LowerError;

impl FnLowerer<'_, '_> {
    /// Lower a block in its own scope. Statements after a terminator are
    /// dropped.
    pub(super) fn lower_block(&mut self, block: NodeId) -> Result<(), LowerError> {
        let stmts = self.syntax.expect(block, NodeKind::BlockStmt)?.children;
        let saved = self.scope.clone();
        let result = self.lower_stmts(stmts);
        self.scope = saved;
        result
    }

    fn lower_stmts(&mut self, stmts: &[NodeId]) -> Result<(), LowerError> {
        for (index, &stmt) in stmts.iter().enumerate() {
            if self.builder.is_terminated() {
                tracing::trace!(
                    graph = self.builder.name(),
                    skipped = stmts.len() - index,
                    "dropping unreachable statements"
                );
                break;
            }
            self.lower_stmt(stmt)?;
        }
        Ok(())
    }

    /// Lower a block whose trailing statement is its value.
    pub(super) fn lower_block_value(
        &mut self,
        block: NodeId,
    ) -> Result<Option<Lowered>, LowerError> {
        let stmts = self.syntax.expect(block, NodeKind::BlockStmt)?.children;
        let Some((&last, init)) = stmts.split_last() else {
            return Ok(None);
        };
        let saved = self.scope.clone();
        let result = self.lower_stmts(init).and_then(|()| {
            if self.builder.is_terminated() {
                Ok(None)
            } else {
                self.lower_value_of(last)
            }
        });
        self.scope = saved;
        result
    }

    /// Value of a statement in value position, if it has one.
    pub(super) fn lower_value_of(&mut self, stmt: NodeId) -> Result<Option<Lowered>, LowerError> {
        match self.syntax.kind(stmt)? {
            NodeKind::ExprStmt => {
                let expr = self.syntax.child(stmt, 0)?;
                self.lower_expr(expr).map(Some)
            }
            NodeKind::IfStmt => self.lower_if(stmt, true),
            NodeKind::MatchStmt => self.lower_match(stmt, true),
            NodeKind::BlockStmt => self.lower_block_value(stmt),
            kind if is_expression(kind) => self.lower_expr(stmt).map(Some),
            _ => {
                self.lower_stmt(stmt)?;
                Ok(None)
            }
        }
    }

    pub(super) fn lower_stmt(&mut self, stmt: NodeId) -> Result<(), LowerError> {
        let syntax = self.syntax;
        match syntax.kind(stmt)? {
            NodeKind::BlockStmt => self.lower_block(stmt),
            NodeKind::ExprStmt => {
                self.lower_expr(syntax.child(stmt, 0)?)?;
                Ok(())
            }
            NodeKind::LetStmt => self.lower_let(stmt),
            NodeKind::VarStmt => self.lower_var(stmt),
            NodeKind::AssignStmt => self.lower_assign(stmt),
            NodeKind::CompoundAssignStmt => self.lower_compound_assign(stmt),
            NodeKind::ReturnStmt => self.lower_return(stmt),
            NodeKind::IfStmt => self.lower_if(stmt, false).map(drop),
            NodeKind::WhileStmt => self.lower_while(stmt),
            NodeKind::ForStmt => self.lower_for(stmt),
            NodeKind::BreakStmt => self.lower_break(stmt),
            NodeKind::ContinueStmt => self.lower_continue(stmt),
            NodeKind::PostfixWhen => self.lower_postfix(stmt, true),
            NodeKind::PostfixUnless => self.lower_postfix(stmt, false),
            NodeKind::MatchStmt => self.lower_match(stmt, false).map(drop),
            NodeKind::FailStmt => self.lower_fail(stmt),
            NodeKind::NurseryStmt => self.lower_nursery(stmt),
            kind if is_expression(kind) => self.lower_expr(stmt).map(drop),
            kind @ (NodeKind::FuncDecl
            | NodeKind::AsyncFuncDecl
            | NodeKind::StructDecl
            | NodeKind::ErrorDecl
            | NodeKind::TraitDecl
            | NodeKind::ImplDecl
            | NodeKind::ImportStmt
            | NodeKind::UseZigStmt) => Err(syntax.semantic(
                ErrorCode::E4007,
                stmt,
                format!("{kind:?} is only allowed at the top level of a module"),
            )),
            kind => Err(syntax.structural(stmt, format!("{kind:?} is not a statement"))),
        }
    }

    fn lower_let(&mut self, stmt: NodeId) -> Result<(), LowerError> {
        let syntax = self.syntax;
        let name = syntax.name(syntax.child(stmt, 0)?)?;
        let Some(init) = syntax.optional_child(stmt, 2)? else {
            return Err(syntax.semantic(
                ErrorCode::E4007,
                stmt,
                "`let` bindings need an initializer",
            ));
        };
        let declared = ValueType::from_node(syntax, syntax.child(stmt, 1)?)?;
        let value = self.lower_expr(init)?;
        let value = self.coerce(value, &declared, init)?;
        self.scope.bind(name, value.value, value.ty);
        Ok(())
    }

    fn lower_var(&mut self, stmt: NodeId) -> Result<(), LowerError> {
        let syntax = self.syntax;
        let name_node = syntax.child(stmt, 0)?;
        let name = syntax.name(name_node)?;
        let declared = ValueType::from_node(syntax, syntax.child(stmt, 1)?)?;

        let init = match syntax.optional_child(stmt, 2)? {
            Some(init) => {
                let value = self.lower_expr(init)?;
                Some(self.coerce(value, &declared, init)?)
            }
            None => None,
        };
        let ty = match &init {
            Some(init) if declared.is_unknown() => init.ty.clone(),
            _ => declared,
        };

        let slot = self.builder.emit(
            OpCode::Alloca,
            &[],
            IrData::Str(syntax.text(name_node)?.to_string()),
        );
        if let Some(init) = init {
            self.builder.emit(OpCode::Store, &[slot, init.value], IrData::None);
        }
        self.scope.bind_slot(name, slot, ty);
        Ok(())
    }

    fn lower_assign(&mut self, stmt: NodeId) -> Result<(), LowerError> {
        let value_node = self.syntax.child(stmt, 1)?;
        let (ptr, ty) = self.assignable_address(self.syntax.child(stmt, 0)?)?;
        let value = self.lower_expr(value_node)?;
        let value = self.coerce(value, &ty, value_node)?;
        self.builder
            .emit(OpCode::Store, &[ptr, value.value], IrData::None);
        Ok(())
    }

    fn lower_compound_assign(&mut self, stmt: NodeId) -> Result<(), LowerError> {
        let syntax = self.syntax;
        let op_node = syntax.child(stmt, 1)?;
        let op = syntax.operator(op_node)?;
        let Some(opcode) = super::expr::compound_opcode(op) else {
            return Err(syntax.semantic(
                ErrorCode::E4007,
                op_node,
                format!("unsupported compound assignment operator {op:?}"),
            ));
        };

        let (ptr, _) = self.assignable_address(syntax.child(stmt, 0)?)?;
        let current = self.builder.emit(OpCode::Load, &[ptr], IrData::None);
        let rhs = self.lower_expr(syntax.child(stmt, 2)?)?;
        let updated = self
            .builder
            .emit(opcode, &[current, rhs.value], IrData::None);
        self.builder
            .emit(OpCode::Store, &[ptr, updated], IrData::None);
        Ok(())
    }

    /// Address written by an assignment.
    fn assignable_address(&mut self, target: NodeId) -> Result<(IrRef, ValueType), LowerError> {
        let syntax = self.syntax;
        match syntax.kind(target)? {
            NodeKind::Identifier => {
                let name = syntax.name(target)?;
                match self.scope.lookup(name) {
                    Some(Binding::Slot { ptr, ty }) => Ok((*ptr, ty.clone())),
                    Some(Binding::Value { .. }) => Err(syntax.semantic(
                        ErrorCode::E4006,
                        target,
                        format!(
                            "cannot assign to immutable binding `{}`",
                            syntax.text(target)?
                        ),
                    )),
                    None => Err(syntax.semantic(
                        ErrorCode::E4002,
                        target,
                        format!("undefined variable `{}`", syntax.text(target)?),
                    )),
                }
            }
            NodeKind::FieldExpr => self.field_address(target),
            NodeKind::IndexExpr => self.index_address(target),
            kind => Err(syntax.semantic(
                ErrorCode::E4007,
                target,
                format!("cannot assign to a {kind:?}"),
            )),
        }
    }

    fn lower_return(&mut self, stmt: NodeId) -> Result<(), LowerError> {
        let value = match self.syntax.children(stmt)?.first() {
            Some(&expr) => Some((expr, self.lower_expr(expr)?)),
            None => None,
        };

        let returned = if self.is_fallible() {
            Some(match value {
                Some((_, value)) if value.ty.is_error_union() => value.value,
                Some((_, value)) => self.builder.emit(
                    OpCode::ErrorUnionConstruct,
                    &[value.value],
                    IrData::None,
                ),
                None => self
                    .builder
                    .emit(OpCode::ErrorUnionConstruct, &[], IrData::None),
            })
        } else {
            match value {
                Some((expr, value)) => {
                    let ret = self.ret.clone();
                    Some(self.coerce(value, &ret, expr)?.value)
                }
                None => None,
            }
        };
        self.builder.ret(returned);
        Ok(())
    }

    /// Close a body that falls off its end.
    pub(super) fn implicit_return(&mut self) {
        if self.builder.is_terminated() {
            return;
        }
        if self.is_fallible() {
            let ok = self
                .builder
                .emit(OpCode::ErrorUnionConstruct, &[], IrData::None);
            self.builder.ret(Some(ok));
        } else {
            self.builder.ret(None);
        }
    }
}
