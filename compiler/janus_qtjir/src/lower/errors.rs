//! Error unions: `fail`, `?`, `catch` and error variant constants.

use janus_diagnostic::ErrorCode;
use janus_ir::{NodeId, NodeKind};

use super::expr::Lowered;
use super::func::FnLowerer;
use super::types::ValueType;
use crate::ir::{IrData, OpCode};
use crate::LowerError;

impl FnLowerer<'_, '_> {
    /// `fail Set.Variant`: construct the error and return it.
    pub(super) fn lower_fail(&mut self, stmt: NodeId) -> Result<(), LowerError> {
        let syntax = self.syntax;
        if !self.is_fallible() {
            return Err(syntax.semantic(
                ErrorCode::E4201,
                stmt,
                format!(
                    "`fail` in `{}`, which does not return an error union",
                    self.builder.name()
                ),
            ));
        }
        let value = syntax.child(stmt, 0)?;
        if syntax.kind(value)? != NodeKind::FieldExpr {
            return Err(syntax.semantic(
                ErrorCode::E4007,
                value,
                "`fail` takes an `ErrorSet.Variant` value",
            ));
        }
        let code = self.variant_code(value)?;
        let error = self
            .builder
            .emit(OpCode::ErrorFailConstruct, &[], IrData::Int(code));
        self.builder.ret(Some(error));
        Ok(())
    }

    /// Code of `Set.Variant` at a `FieldExpr`.
    fn variant_code(&self, expr: NodeId) -> Result<i64, LowerError> {
        let syntax = self.syntax;
        let set = syntax.text(syntax.child(expr, 0)?)?;
        let variant = syntax.ident_text(expr, 1)?;
        let Some(def) = self.symbols.error_sets.get(set) else {
            return Err(syntax.semantic(
                ErrorCode::E4203,
                expr,
                format!("unknown error set `{set}`"),
            ));
        };
        def.code_of(variant).ok_or_else(|| {
            syntax.semantic(
                ErrorCode::E4203,
                expr,
                format!("error set `{set}` has no variant `{variant}`"),
            )
        })
    }

    /// `Set.Variant` in expression position, when `Set` names an error set
    /// rather than a local.
    pub(super) fn error_variant_constant(
        &mut self,
        expr: NodeId,
    ) -> Result<Option<Lowered>, LowerError> {
        let syntax = self.syntax;
        let object = syntax.child(expr, 0)?;
        if syntax.kind(object)? != NodeKind::Identifier
            || self.scope.is_bound(syntax.name(object)?)
            || !self.symbols.error_sets.contains_key(syntax.text(object)?)
        {
            return Ok(None);
        }
        let code = self.variant_code(expr)?;
        let value = self.builder.const_int(code);
        Ok(Some(Lowered::new(value, ValueType::Int)))
    }

    /// Postfix `?`: return the union unchanged on error, unwrap otherwise.
    pub(super) fn lower_try(&mut self, expr: NodeId) -> Result<Lowered, LowerError> {
        let syntax = self.syntax;
        if !self.is_fallible() {
            return Err(syntax.semantic(
                ErrorCode::E4202,
                expr,
                format!(
                    "`?` in `{}`, which does not return an error union",
                    self.builder.name()
                ),
            ));
        }
        let union = self.lower_expr(syntax.child(expr, 0)?)?;
        let ValueType::ErrorUnion { payload, .. } = &union.ty else {
            return Err(syntax.semantic(
                ErrorCode::E4204,
                expr,
                format!("`?` on a value of type `{}`, which cannot fail", union.ty),
            ));
        };
        let payload = (**payload).clone();

        let is_error = self
            .builder
            .emit(OpCode::ErrorUnionIsError, &[union.value], IrData::None);
        let propagate = self.builder.new_label();
        let proceed = self.builder.new_label();
        self.builder.branch(is_error, propagate, proceed);

        self.builder.start_label(propagate);
        self.builder.ret(Some(union.value));

        self.builder.start_label(proceed);
        let value = self
            .builder
            .emit(OpCode::ErrorUnionUnwrap, &[union.value], IrData::None);
        Ok(Lowered::new(value, payload))
    }

    /// `expr catch |e| { handler }`: the payload on success, the handler's
    /// trailing value on error.
    pub(super) fn lower_catch(&mut self, expr: NodeId) -> Result<Lowered, LowerError> {
        let syntax = self.syntax;
        let union = self.lower_expr(syntax.child(expr, 0)?)?;
        let ValueType::ErrorUnion { payload, .. } = &union.ty else {
            return Err(syntax.semantic(
                ErrorCode::E4204,
                expr,
                format!("`catch` on a value of type `{}`, which cannot fail", union.ty),
            ));
        };
        let payload = (**payload).clone();
        let binding = syntax.optional_child(expr, 1)?;
        let handler = syntax.child(expr, 2)?;

        let is_error = self
            .builder
            .emit(OpCode::ErrorUnionIsError, &[union.value], IrData::None);
        let on_error = self.builder.new_label();
        let on_ok = self.builder.new_label();
        let merge = self.builder.new_label();
        self.builder.branch(is_error, on_error, on_ok);

        self.builder.start_label(on_error);
        let saved = self.scope.clone();
        if let Some(binding) = binding {
            let error = self
                .builder
                .emit(OpCode::ErrorUnionGetError, &[union.value], IrData::None);
            self.scope.bind(syntax.name(binding)?, error, ValueType::Int);
        }
        let handled = self.lower_block_value(handler);
        self.scope = saved;
        let handled = handled?;

        let mut incoming = Vec::with_capacity(2);
        if !self.builder.is_terminated() {
            let handled = match handled {
                Some(value) => value.value,
                None => self.builder.const_none(),
            };
            incoming.push((handled, self.builder.current_label()));
            self.builder.jump(merge);
        }

        self.builder.start_label(on_ok);
        let value = self
            .builder
            .emit(OpCode::ErrorUnionUnwrap, &[union.value], IrData::None);
        incoming.push((value, on_ok));
        self.builder.jump(merge);

        self.builder.start_label(merge);
        if incoming.len() == 1 {
            return Ok(Lowered::new(value, payload));
        }
        let merged = self.builder.phi(&incoming);
        Ok(Lowered::new(merged, payload))
    }
}
