//! Expressions, addressing and value coercion.

use janus_diagnostic::ErrorCode;
use janus_ir::{NodeId, NodeKind, TokenKind};
use janus_stack::ensure_sufficient_stack;

use super::func::FnLowerer;
use super::index_data;
use super::scope::Binding;
use super::types::ValueType;
use crate::ir::{IrData, IrRef, OpCode};
use crate::trait_meta::vtable_name;
use crate::LowerError;

/// An SSA value and its tracked type.
#[derive(Clone, Debug)]
pub(super) struct Lowered {
    pub value: IrRef,
    pub ty: ValueType,
}

impl Lowered {
    pub fn new(value: IrRef, ty: ValueType) -> Self {
        Lowered { value, ty }
    }
}

fn binary_opcode(op: TokenKind) -> Option<OpCode> {
    Some(match op {
        TokenKind::Plus => OpCode::Add,
        TokenKind::Minus => OpCode::Sub,
        TokenKind::Star => OpCode::Mul,
        TokenKind::Slash => OpCode::Div,
        TokenKind::Percent => OpCode::Mod,
        TokenKind::Amp => OpCode::BitAnd,
        TokenKind::Pipe => OpCode::BitOr,
        TokenKind::Caret => OpCode::BitXor,
        TokenKind::Shl => OpCode::Shl,
        TokenKind::Shr => OpCode::Shr,
        TokenKind::EqEq => OpCode::Equal,
        TokenKind::BangEq => OpCode::NotEqual,
        TokenKind::Lt => OpCode::Less,
        TokenKind::LtEq => OpCode::LessEqual,
        TokenKind::Gt => OpCode::Greater,
        TokenKind::GtEq => OpCode::GreaterEqual,
        _ => return None,
    })
}

/// Operator applied by `op=`.
pub(super) fn compound_opcode(op: TokenKind) -> Option<OpCode> {
    Some(match op {
        TokenKind::PlusEq => OpCode::Add,
        TokenKind::MinusEq => OpCode::Sub,
        TokenKind::StarEq => OpCode::Mul,
        TokenKind::SlashEq => OpCode::Div,
        TokenKind::PercentEq => OpCode::Mod,
        _ => return None,
    })
}

fn is_comparison(op: OpCode) -> bool {
    matches!(
        op,
        OpCode::Equal
            | OpCode::NotEqual
            | OpCode::Less
            | OpCode::LessEqual
            | OpCode::Greater
            | OpCode::GreaterEqual
    )
}

impl FnLowerer<'_, '_> {
    pub(super) fn lower_expr(&mut self, expr: NodeId) -> Result<Lowered, LowerError> {
        ensure_sufficient_stack(|| self.lower_expr_inner(expr))
    }

    fn lower_expr_inner(&mut self, expr: NodeId) -> Result<Lowered, LowerError> {
        let syntax = self.syntax;
        match syntax.kind(expr)? {
            NodeKind::IntegerLiteral => {
                let text = syntax.text(expr)?;
                let value = text.replace('_', "").parse::<i64>().map_err(|_| {
                    syntax.structural(expr, format!("invalid integer literal `{text}`"))
                })?;
                Ok(Lowered::new(self.builder.const_int(value), ValueType::Int))
            }
            NodeKind::FloatLiteral => {
                let text = syntax.text(expr)?;
                let value = text.replace('_', "").parse::<f64>().map_err(|_| {
                    syntax.structural(expr, format!("invalid float literal `{text}`"))
                })?;
                Ok(Lowered::new(self.builder.const_float(value), ValueType::Float))
            }
            NodeKind::StringLiteral => {
                let text = syntax.text(expr)?;
                Ok(Lowered::new(self.builder.const_str(text), ValueType::Str))
            }
            NodeKind::BoolLiteral => {
                let value = syntax.lead_token(expr)? == TokenKind::True;
                Ok(Lowered::new(self.builder.const_bool(value), ValueType::Bool))
            }
            NodeKind::Identifier => self.lower_identifier(expr),
            NodeKind::BinaryExpr => self.lower_binary(expr),
            NodeKind::UnaryExpr => self.lower_unary(expr),
            NodeKind::CallExpr => self.lower_call(expr),
            NodeKind::FieldExpr => self.lower_field_read(expr),
            NodeKind::IndexExpr => {
                let (ptr, ty) = self.index_address(expr)?;
                let value = self.builder.emit(OpCode::Load, &[ptr], IrData::None);
                Ok(Lowered::new(value, ty))
            }
            NodeKind::StructLiteral => self.lower_struct_literal(expr),
            NodeKind::ArrayLiteral => self.lower_array_literal(expr),
            NodeKind::TryExpr => self.lower_try(expr),
            NodeKind::CatchExpr => self.lower_catch(expr),
            NodeKind::AwaitExpr => self.lower_expr(syntax.child(expr, 0)?),
            NodeKind::SpawnExpr => self.lower_spawn(expr),
            NodeKind::IfStmt => {
                let value = self.lower_if(expr, true)?;
                Ok(self.value_or_unit(value))
            }
            NodeKind::MatchStmt => {
                let value = self.lower_match(expr, true)?;
                Ok(self.value_or_unit(value))
            }
            NodeKind::RangeExpr | NodeKind::RangeExclusiveExpr => Err(syntax.semantic(
                ErrorCode::E4007,
                expr,
                "ranges are only supported as `for` loop bounds",
            )),
            kind => Err(syntax.structural(expr, format!("{kind:?} is not an expression"))),
        }
    }

    fn lower_identifier(&mut self, expr: NodeId) -> Result<Lowered, LowerError> {
        let name = self.syntax.name(expr)?;
        match self.scope.lookup(name).cloned() {
            Some(Binding::Value { value, ty }) => Ok(Lowered::new(value, ty)),
            Some(Binding::Slot { ptr, ty }) => {
                let value = self.builder.emit(OpCode::Load, &[ptr], IrData::None);
                Ok(Lowered::new(value, ty))
            }
            None => Err(self.syntax.semantic(
                ErrorCode::E4002,
                expr,
                format!("undefined variable `{}`", self.syntax.text(expr)?),
            )),
        }
    }

    fn lower_binary(&mut self, expr: NodeId) -> Result<Lowered, LowerError> {
        let syntax = self.syntax;
        let lhs_node = syntax.child(expr, 0)?;
        let op_node = syntax.child(expr, 1)?;
        let rhs_node = syntax.child(expr, 2)?;
        let op = syntax.operator(op_node)?;

        match op {
            TokenKind::And => return self.lower_short_circuit(lhs_node, rhs_node, true),
            TokenKind::Or => return self.lower_short_circuit(lhs_node, rhs_node, false),
            _ => {}
        }
        let Some(opcode) = binary_opcode(op) else {
            return Err(syntax.semantic(
                ErrorCode::E4007,
                op_node,
                format!("unsupported binary operator {op:?}"),
            ));
        };

        let lhs = self.lower_expr(lhs_node)?;
        let rhs = self.lower_expr(rhs_node)?;
        let value = self
            .builder
            .emit(opcode, &[lhs.value, rhs.value], IrData::None);
        let ty = if is_comparison(opcode) {
            ValueType::Bool
        } else if lhs.ty.is_unknown() {
            rhs.ty
        } else {
            lhs.ty
        };
        Ok(Lowered::new(value, ty))
    }

    fn lower_unary(&mut self, expr: NodeId) -> Result<Lowered, LowerError> {
        let syntax = self.syntax;
        let op_node = syntax.child(expr, 0)?;
        let op = syntax.operator(op_node)?;
        let opcode = match op {
            TokenKind::Minus => OpCode::Neg,
            TokenKind::Not | TokenKind::Bang => OpCode::Not,
            TokenKind::Tilde => OpCode::BitNot,
            _ => {
                return Err(syntax.semantic(
                    ErrorCode::E4007,
                    op_node,
                    format!("unsupported unary operator {op:?}"),
                ))
            }
        };
        let operand = self.lower_expr(syntax.child(expr, 1)?)?;
        let value = self.builder.emit(opcode, &[operand.value], IrData::None);
        let ty = if opcode == OpCode::Not {
            ValueType::Bool
        } else {
            operand.ty
        };
        Ok(Lowered::new(value, ty))
    }

    fn lower_field_read(&mut self, expr: NodeId) -> Result<Lowered, LowerError> {
        if let Some(code) = self.error_variant_constant(expr)? {
            return Ok(code);
        }
        let (ptr, ty) = self.field_address(expr)?;
        let value = self.builder.emit(OpCode::Load, &[ptr], IrData::None);
        Ok(Lowered::new(value, ty))
    }

    /// `Field_Ptr` of `object.field` and the field's type.
    pub(super) fn field_address(&mut self, expr: NodeId) -> Result<(IrRef, ValueType), LowerError> {
        let syntax = self.syntax;
        let field = syntax.ident_text(expr, 1)?;
        let object = self.lower_expr(syntax.child(expr, 0)?)?;

        let ValueType::Named(type_name) = &object.ty else {
            return Err(syntax.semantic(
                ErrorCode::E4004,
                expr,
                format!("no field `{field}` on a value of type `{}`", object.ty),
            ));
        };
        let symbols = self.symbols;
        let Some(def) = symbols.structs.get(type_name) else {
            return Err(syntax.semantic(
                ErrorCode::E4003,
                expr,
                format!("unknown struct type `{type_name}`"),
            ));
        };
        let Some((offset, ty)) = def.field(field) else {
            return Err(syntax.semantic(
                ErrorCode::E4004,
                expr,
                format!("struct `{type_name}` has no field `{field}`"),
            ));
        };
        let ptr = self
            .builder
            .emit(OpCode::FieldPtr, &[object.value], index_data(offset));
        Ok((ptr, ty.clone()))
    }

    /// `Index_Ptr` of `object[index]` and the element type.
    pub(super) fn index_address(&mut self, expr: NodeId) -> Result<(IrRef, ValueType), LowerError> {
        let object = self.lower_expr(self.syntax.child(expr, 0)?)?;
        let index = self.lower_expr(self.syntax.child(expr, 1)?)?;
        let ptr = self
            .builder
            .emit(OpCode::IndexPtr, &[object.value, index.value], IrData::None);
        let ty = match object.ty {
            ValueType::Array(element) => *element,
            _ => ValueType::Unknown,
        };
        Ok((ptr, ty))
    }

    fn lower_struct_literal(&mut self, expr: NodeId) -> Result<Lowered, LowerError> {
        let syntax = self.syntax;
        let type_name = syntax.text(syntax.child(expr, 0)?)?;
        let symbols = self.symbols;
        let Some(def) = symbols.structs.get(type_name) else {
            return Err(syntax.semantic(
                ErrorCode::E4003,
                expr,
                format!("unknown struct type `{type_name}`"),
            ));
        };

        let ptr = self.builder.emit(
            OpCode::StructAlloca,
            &[],
            IrData::Str(type_name.to_string()),
        );
        for &init in syntax.children_from(expr, 1)? {
            let field = syntax.ident_text(init, 0)?;
            let Some((offset, ty)) = def.field(field) else {
                return Err(syntax.semantic(
                    ErrorCode::E4004,
                    init,
                    format!("struct `{type_name}` has no field `{field}`"),
                ));
            };
            let value_node = syntax.child(init, 1)?;
            let value = self.lower_expr(value_node)?;
            let value = self.coerce(value, ty, value_node)?;
            let field_ptr = self
                .builder
                .emit(OpCode::FieldPtr, &[ptr], index_data(offset));
            self.builder
                .emit(OpCode::Store, &[field_ptr, value.value], IrData::None);
        }
        Ok(Lowered::new(ptr, ValueType::Named(type_name.to_string())))
    }

    fn lower_array_literal(&mut self, expr: NodeId) -> Result<Lowered, LowerError> {
        let elements = self.syntax.children(expr)?;
        let ptr = self
            .builder
            .emit(OpCode::ArrayAlloca, &[], index_data(elements.len()));
        let mut element_ty = ValueType::Unknown;
        for (index, &element) in elements.iter().enumerate() {
            let value = self.lower_expr(element)?;
            if element_ty.is_unknown() {
                element_ty = value.ty;
            }
            let offset = self.builder.emit(OpCode::Constant, &[], index_data(index));
            let slot = self
                .builder
                .emit(OpCode::IndexPtr, &[ptr, offset], IrData::None);
            self.builder
                .emit(OpCode::Store, &[slot, value.value], IrData::None);
        }
        Ok(Lowered::new(ptr, ValueType::Array(Box::new(element_ty))))
    }

    /// Convert `value` for a slot of type `target`.
    ///
    /// A concrete value flowing into `&dyn Trait` gets its vtable here.
    pub(super) fn coerce(
        &mut self,
        value: Lowered,
        target: &ValueType,
        node: NodeId,
    ) -> Result<Lowered, LowerError> {
        let ValueType::Dyn(trait_name) = target else {
            if target.is_unknown() {
                return Ok(value);
            }
            return Ok(Lowered::new(value.value, target.clone()));
        };
        match &value.ty {
            ValueType::Dyn(_) => Ok(Lowered::new(value.value, target.clone())),
            ValueType::Named(type_name) => {
                if !self.symbols.implements(type_name, trait_name) {
                    return Err(self.syntax.semantic(
                        ErrorCode::E4101,
                        node,
                        format!("`{type_name}` does not implement `{trait_name}`"),
                    ));
                }
                let vtable = self.builder.emit(
                    OpCode::VtableConstruct,
                    &[value.value],
                    IrData::Str(vtable_name(type_name, trait_name)),
                );
                Ok(Lowered::new(vtable, target.clone()))
            }
            ValueType::Unknown => Err(self.syntax.semantic(
                ErrorCode::E4102,
                node,
                format!("cannot tell which `{trait_name}` impl to use for a value of unknown type"),
            )),
            other => Err(self.syntax.semantic(
                ErrorCode::E4101,
                node,
                format!("`{other}` does not implement `{trait_name}`"),
            )),
        }
    }

    /// Placeholder value for an expression whose every path left the
    /// function.
    fn value_or_unit(&mut self, value: Option<Lowered>) -> Lowered {
        match value {
            Some(value) => value,
            None => Lowered::new(self.builder.const_none(), ValueType::Unknown),
        }
    }
}
