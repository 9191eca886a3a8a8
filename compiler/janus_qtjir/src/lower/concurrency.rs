//! Structured concurrency: nurseries and `spawn`.

use janus_diagnostic::ErrorCode;
use janus_ir::{NodeId, NodeKind};

use super::expr::Lowered;
use super::func::FnLowerer;
use super::types::ValueType;
use crate::ir::{IrData, OpCode};
use crate::LowerError;

impl FnLowerer<'_, '_> {
    /// `nursery { ... }`: tasks spawned inside are joined at the end.
    pub(super) fn lower_nursery(&mut self, stmt: NodeId) -> Result<(), LowerError> {
        let begin = self
            .builder
            .emit(OpCode::NurseryBegin, &[], IrData::None);
        self.nursery_depth += 1;
        let result = self.lower_block(self.syntax.child(stmt, 0)?);
        self.nursery_depth -= 1;
        result?;
        if !self.builder.is_terminated() {
            self.builder
                .emit(OpCode::NurseryEnd, &[begin], IrData::None);
        }
        Ok(())
    }

    /// `spawn f(args)`. Calls with arguments go through a thunk graph that
    /// reads them back as captured values.
    pub(super) fn lower_spawn(&mut self, expr: NodeId) -> Result<Lowered, LowerError> {
        let syntax = self.syntax;
        if self.nursery_depth == 0 {
            return Err(syntax.semantic(
                ErrorCode::E4301,
                expr,
                "`spawn` outside of a nursery",
            ));
        }
        let call = syntax.child(expr, 0)?;
        let callee = match syntax.kind(call)? {
            NodeKind::CallExpr => syntax.child(call, 0)?,
            _ => call,
        };
        if syntax.kind(call)? != NodeKind::CallExpr
            || syntax.kind(callee)? != NodeKind::Identifier
        {
            return Err(syntax.semantic(
                ErrorCode::E4007,
                call,
                "`spawn` takes a call of a named function",
            ));
        }
        let name = syntax.text(callee)?;
        let symbols = self.symbols;
        let Some(sig) = symbols.functions.get(name) else {
            return Err(syntax.semantic(
                ErrorCode::E4001,
                callee,
                format!("undefined function `{name}`"),
            ));
        };

        let args = syntax.children_from(call, 1)?;
        if sig.params.len() != args.len() {
            return Err(syntax.semantic(
                ErrorCode::E4007,
                call,
                format!(
                    "`{name}` takes {} arguments but {} were given",
                    sig.params.len(),
                    args.len()
                ),
            ));
        }
        if args.is_empty() {
            let task = self
                .builder
                .emit(OpCode::Spawn, &[], IrData::Str(sig.graph.clone()));
            return Ok(Lowered::new(task, ValueType::Unknown));
        }

        let mut captured = Vec::with_capacity(args.len());
        for (&arg, ty) in args.iter().zip(&sig.params) {
            let value = self.lower_expr(arg)?;
            captured.push(self.coerce(value, ty, arg)?.value);
        }
        let thunk = self
            .session
            .spawn_thunk(&sig.graph, args.len(), syntax, expr)?;
        tracing::trace!(target_graph = %sig.graph, %thunk, "spawn through thunk");
        let task = self
            .builder
            .emit(OpCode::Spawn, &captured, IrData::Str(thunk));
        Ok(Lowered::new(task, ValueType::Unknown))
    }
}
