//! Calls: functions, externs, builtins, module-qualified calls, inherent
//! methods, channel operations and trait dispatch.

use janus_diagnostic::ErrorCode;
use janus_ir::{NodeId, NodeKind};

use super::collect::{FuncSig, TraitDef};
use super::expr::Lowered;
use super::func::FnLowerer;
use super::index_data;
use super::types::ValueType;
use crate::ir::{IrData, IrRef, OpCode};
use crate::trait_meta::{inherent_name, qualified_name};
use crate::LowerError;

/// Return type of a runtime builtin, for names that are builtins.
fn builtin_return(name: &str) -> Option<ValueType> {
    match name {
        "print" | "println" | "print_int" | "panic" => Some(ValueType::Unknown),
        "string_len" => Some(ValueType::Int),
        "string_concat" => Some(ValueType::Str),
        _ => None,
    }
}

impl FnLowerer<'_, '_> {
    pub(super) fn lower_call(&mut self, expr: NodeId) -> Result<Lowered, LowerError> {
        let syntax = self.syntax;
        let callee = syntax.child(expr, 0)?;
        let args = syntax.children_from(expr, 1)?;
        match syntax.kind(callee)? {
            NodeKind::Identifier => self.lower_named_call(syntax.text(callee)?, args, expr),
            NodeKind::FieldExpr => self.lower_method_call(callee, args, expr),
            kind => Err(syntax.semantic(
                ErrorCode::E4007,
                callee,
                format!("calls through a {kind:?} are not supported"),
            )),
        }
    }

    fn lower_named_call(
        &mut self,
        name: &str,
        args: &[NodeId],
        expr: NodeId,
    ) -> Result<Lowered, LowerError> {
        let symbols = self.symbols;
        if let Some(sig) = symbols.functions.get(name) {
            return self.call_function(sig, None, args, expr);
        }

        let ret = self
            .session
            .externs
            .lookup(name)
            .map(|symbol| ValueType::from_native(&symbol.signature.ret))
            .or_else(|| builtin_return(name));
        let Some(ret) = ret else {
            return Err(self.syntax.semantic(
                ErrorCode::E4001,
                expr,
                format!("undefined function `{name}`"),
            ));
        };
        let inputs = self.lower_args(args)?;
        let value = self
            .builder
            .emit(OpCode::Call, &inputs, IrData::Str(name.to_string()));
        Ok(Lowered::new(value, ret))
    }

    fn lower_args(&mut self, args: &[NodeId]) -> Result<Vec<IrRef>, LowerError> {
        args.iter()
            .map(|&arg| self.lower_expr(arg).map(|value| value.value))
            .collect()
    }

    /// Arguments coerced to `params`, checking the count.
    fn lower_checked_args(
        &mut self,
        callee: &str,
        params: &[ValueType],
        args: &[NodeId],
        expr: NodeId,
    ) -> Result<Vec<IrRef>, LowerError> {
        if params.len() != args.len() {
            return Err(self.syntax.semantic(
                ErrorCode::E4007,
                expr,
                format!(
                    "`{callee}` takes {} arguments but {} were given",
                    params.len(),
                    args.len()
                ),
            ));
        }
        let mut inputs = Vec::with_capacity(args.len());
        for (&arg, ty) in args.iter().zip(params) {
            let value = self.lower_expr(arg)?;
            inputs.push(self.coerce(value, ty, arg)?.value);
        }
        Ok(inputs)
    }

    /// `Call` of a graph, with an optional receiver as first argument.
    pub(super) fn call_function(
        &mut self,
        sig: &FuncSig,
        receiver: Option<&Lowered>,
        args: &[NodeId],
        expr: NodeId,
    ) -> Result<Lowered, LowerError> {
        let params = match receiver {
            Some(_) => sig.params.get(1..).unwrap_or_default(),
            None => &sig.params,
        };
        let mut inputs: Vec<IrRef> = receiver.map(|r| r.value).into_iter().collect();
        inputs.extend(self.lower_checked_args(&sig.graph, params, args, expr)?);
        let value = self
            .builder
            .emit(OpCode::Call, &inputs, IrData::Str(sig.graph.clone()));
        Ok(Lowered::new(value, sig.ret.clone()))
    }

    fn lower_method_call(
        &mut self,
        callee: NodeId,
        args: &[NodeId],
        expr: NodeId,
    ) -> Result<Lowered, LowerError> {
        let syntax = self.syntax;
        let receiver_node = syntax.child(callee, 0)?;
        let method = syntax.ident_text(callee, 1)?;

        if syntax.kind(receiver_node)? == NodeKind::Identifier
            && !self.scope.is_bound(syntax.name(receiver_node)?)
        {
            let qualifier = syntax.text(receiver_node)?;
            return self.lower_static_call(qualifier, method, args, expr, receiver_node);
        }

        let receiver = self.lower_expr(receiver_node)?;
        match receiver.ty.clone() {
            ValueType::Channel => self.lower_channel_op(&receiver, method, args, expr),
            ValueType::Dyn(trait_name) => {
                self.lower_dyn_call(&receiver, &trait_name, method, args, expr)
            }
            ValueType::Named(type_name) => {
                self.lower_named_method(&receiver, &type_name, method, args, expr)
            }
            other => {
                let mut candidates: Vec<&str> = self
                    .symbols
                    .traits
                    .values()
                    .filter(|def| def.method(method).is_some())
                    .map(|def| def.name.as_str())
                    .collect();
                candidates.sort_unstable();
                if candidates.is_empty() {
                    Err(syntax.semantic(
                        ErrorCode::E4101,
                        expr,
                        format!("no method `{method}` for a value of type `{other}`"),
                    ))
                } else {
                    Err(syntax.semantic(
                        ErrorCode::E4102,
                        expr,
                        format!(
                            "cannot resolve `{method}` on a value of type `{other}`; \
                             candidate traits: {}",
                            candidates.join(", ")
                        ),
                    ))
                }
            }
        }
    }

    /// `alias.f()`, `Channel.new(n)` or `Type.method()`.
    fn lower_static_call(
        &mut self,
        qualifier: &str,
        method: &str,
        args: &[NodeId],
        expr: NodeId,
        qualifier_node: NodeId,
    ) -> Result<Lowered, LowerError> {
        let symbols = self.symbols;
        if let Some(module) = symbols.aliases.get(qualifier) {
            let Some(sig) = module.functions.get(method) else {
                return Err(self.syntax.semantic(
                    ErrorCode::E4001,
                    expr,
                    format!("module `{qualifier}` has no function `{method}`"),
                ));
            };
            return self.call_function(sig, None, args, expr);
        }

        if qualifier == "Channel" && method == "new" {
            let inputs = self.lower_checked_args("Channel.new", &[ValueType::Int], args, expr)?;
            let value = self
                .builder
                .emit(OpCode::ChannelCreate, &inputs, IrData::None);
            return Ok(Lowered::new(value, ValueType::Channel));
        }

        let graph = inherent_name(qualifier, method);
        if symbols.inherent.contains(&graph) {
            if let Some(sig) = symbols.functions.get(&graph) {
                return self.call_function(sig, None, args, expr);
            }
        }
        Err(self.syntax.semantic(
            ErrorCode::E4002,
            qualifier_node,
            format!("undefined variable `{qualifier}`"),
        ))
    }

    fn lower_channel_op(
        &mut self,
        channel: &Lowered,
        method: &str,
        args: &[NodeId],
        expr: NodeId,
    ) -> Result<Lowered, LowerError> {
        let (op, params, ty) = match method {
            "send" => (OpCode::ChannelSend, 1, ValueType::channel_result()),
            "try_send" => (OpCode::ChannelTrySend, 1, ValueType::channel_result()),
            "recv" => (OpCode::ChannelRecv, 0, ValueType::channel_result()),
            "try_recv" => (OpCode::ChannelTryRecv, 0, ValueType::channel_result()),
            "close" => (OpCode::ChannelClose, 0, ValueType::Unknown),
            _ => {
                return Err(self.syntax.semantic(
                    ErrorCode::E4001,
                    expr,
                    format!("channels have no method `{method}`"),
                ))
            }
        };
        let params = vec![ValueType::Unknown; params];
        let mut inputs = vec![channel.value];
        inputs.extend(self.lower_checked_args(method, &params, args, expr)?);
        let value = self.builder.emit(op, &inputs, IrData::None);
        Ok(Lowered::new(value, ty))
    }

    /// Call through a `&dyn Trait` value: slot lookup, then indirect call.
    ///
    /// The lookup's first input is the vtable value as the receiver holds
    /// it: the `Vtable_Construct` itself for `let` bindings and coerced
    /// arguments, a `Load` of the binding's slot for `var` bindings.
    fn lower_dyn_call(
        &mut self,
        receiver: &Lowered,
        trait_name: &str,
        method: &str,
        args: &[NodeId],
        expr: NodeId,
    ) -> Result<Lowered, LowerError> {
        let symbols = self.symbols;
        let Some(def) = symbols.traits.get(trait_name) else {
            return Err(self.syntax.semantic(
                ErrorCode::E4105,
                expr,
                format!("unknown trait `{trait_name}`"),
            ));
        };
        let Some((slot, sig)) = def.method(method) else {
            return Err(self.syntax.semantic(
                ErrorCode::E4104,
                expr,
                format!("`{method}` is not a method of trait `{trait_name}`"),
            ));
        };

        let lookup = self
            .builder
            .emit(OpCode::VtableLookup, &[receiver.value], index_data(slot));
        let mut inputs = vec![lookup, receiver.value];
        inputs.extend(self.lower_checked_args(method, &sig.params, args, expr)?);
        let value = self
            .builder
            .emit(OpCode::CallIndirect, &inputs, IrData::None);
        Ok(Lowered::new(value, sig.ret.clone()))
    }

    /// Method on a concrete type: inherent first, then the one trait that
    /// provides it.
    fn lower_named_method(
        &mut self,
        receiver: &Lowered,
        type_name: &str,
        method: &str,
        args: &[NodeId],
        expr: NodeId,
    ) -> Result<Lowered, LowerError> {
        let symbols = self.symbols;
        let graph = inherent_name(type_name, method);
        if symbols.inherent.contains(&graph) {
            if let Some(sig) = symbols.functions.get(&graph) {
                return self.call_function(sig, Some(receiver), args, expr);
            }
        }

        let candidates: Vec<&TraitDef> = symbols
            .impls
            .iter()
            .filter(|imp| imp.type_name == type_name)
            .filter_map(|imp| imp.trait_name.as_deref())
            .filter_map(|trait_name| symbols.traits.get(trait_name))
            .filter(|def| def.method(method).is_some())
            .map(|def| &**def)
            .collect();

        match candidates.as_slice() {
            [] => Err(self.syntax.semantic(
                ErrorCode::E4101,
                expr,
                format!("`{type_name}` has no method `{method}`"),
            )),
            [def] => {
                let Some((_, sig)) = def.method(method) else {
                    return Err(self.syntax.structural(expr, "trait method vanished"));
                };
                let mut inputs = vec![receiver.value];
                inputs.extend(self.lower_checked_args(method, &sig.params, args, expr)?);
                let target = qualified_name(type_name, &def.name, method);
                let value = self
                    .builder
                    .emit(OpCode::TraitMethodCall, &inputs, IrData::Str(target));
                Ok(Lowered::new(value, sig.ret.clone()))
            }
            many => {
                let mut names: Vec<&str> = many.iter().map(|def| def.name.as_str()).collect();
                names.sort_unstable();
                Err(self.syntax.semantic(
                    ErrorCode::E4102,
                    expr,
                    format!(
                        "ambiguous call to `{method}` on `{type_name}`: provided by traits {}",
                        names.join(", ")
                    ),
                ))
            }
        }
    }
}
