//! Pass 2: one graph per function, inherent method and trait method
//! instantiation.

use std::sync::Arc;

use janus_diagnostic::ErrorCode;
use janus_ir::{NodeId, NodeKind};

use super::collect::{FuncSig, ModuleSymbols};
use super::scope::{LoopTargets, Scope};
use super::syntax::Syntax;
use super::types::ValueType;
use super::{index_data, Session};
use crate::ir::{IrGraph, OpCode};
use crate::trait_meta::{inherent_name, qualified_name};
use crate::{IrBuilder, LowerError};

impl Session<'_> {
    /// Lower every body of a collected module, in source order.
    pub(super) fn emit_items(
        &mut self,
        syntax: Syntax<'_>,
        symbols: &ModuleSymbols,
    ) -> Result<(), LowerError> {
        for &item in syntax.children(syntax.snapshot.root())? {
            match syntax.kind(item)? {
                NodeKind::FuncDecl | NodeKind::AsyncFuncDecl => {
                    let name = syntax.ident_text(item, 0)?;
                    let sig = lookup_sig(syntax, symbols, item, name)?;
                    self.lower_function(syntax, symbols, item, sig)?;
                }
                NodeKind::ImplDecl => self.emit_impl(syntax, symbols, item)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn emit_impl(
        &mut self,
        syntax: Syntax<'_>,
        symbols: &ModuleSymbols,
        item: NodeId,
    ) -> Result<(), LowerError> {
        let type_name = syntax.text(syntax.child(item, 0)?)?;
        let methods = syntax.children_from(item, 2)?;

        let Some(trait_node) = syntax.optional_child(item, 1)? else {
            for &decl in methods {
                let graph = inherent_name(type_name, syntax.ident_text(decl, 0)?);
                let sig = lookup_sig(syntax, symbols, decl, &graph)?;
                self.lower_function(syntax, symbols, decl, sig)?;
            }
            return Ok(());
        };

        let trait_name = syntax.text(trait_node)?;
        let Some(def) = symbols.traits.get(trait_name).map(Arc::clone) else {
            return Err(syntax.semantic(
                ErrorCode::E4105,
                trait_node,
                format!("unknown trait `{trait_name}`"),
            ));
        };
        // Default bodies resolve names in the module that declared the trait,
        // extended with what this module implements.
        let layered = match self.modules.get(&def.unit) {
            Some(owner) if def.unit != syntax.unit => Some(ModuleSymbols::layered(owner, symbols)),
            _ => None,
        };
        let default_symbols = layered.as_ref().unwrap_or(symbols);

        for method in &def.methods {
            let graph = qualified_name(type_name, trait_name, &method.name);
            let overriding = methods
                .iter()
                .copied()
                .find(|&decl| syntax.ident_text(decl, 0).is_ok_and(|n| n == method.name));
            match overriding {
                Some(decl) => {
                    let sig = self.func_sig(syntax, decl, graph, Some(type_name))?;
                    self.lower_function(syntax, symbols, decl, &sig)?;
                }
                None => {
                    let trait_syntax = Syntax::new(&def.snapshot, &def.unit);
                    let sig =
                        self.func_sig(trait_syntax, method.decl, graph, Some(type_name))?;
                    tracing::trace!(graph = %sig.graph, "instantiating default method");
                    self.lower_function(trait_syntax, default_symbols, method.decl, &sig)?;
                }
            }
        }
        Ok(())
    }

    /// Lower the body of `decl` into the graph named by `sig`.
    fn lower_function(
        &mut self,
        syntax: Syntax<'_>,
        symbols: &ModuleSymbols,
        decl: NodeId,
        sig: &FuncSig,
    ) -> Result<(), LowerError> {
        let Some(body) = syntax.optional_child(decl, 3)? else {
            return Err(syntax.semantic(
                ErrorCode::E4007,
                decl,
                format!("function `{}` has no body", sig.graph),
            ));
        };

        let graph = {
            let mut lowerer = FnLowerer::new(self, symbols, syntax, sig);
            lowerer.bind_params(decl, &sig.params)?;
            lowerer.lower_block(body)?;
            lowerer.implicit_return();
            lowerer.finish(sig)
        };
        tracing::debug!(
            graph = %graph.name,
            nodes = graph.nodes.len(),
            fallible = graph.fallible,
            is_async = graph.is_async,
            "lowered function"
        );
        self.push_graph(graph, syntax, decl)
    }
}

fn lookup_sig<'m>(
    syntax: Syntax<'_>,
    symbols: &'m ModuleSymbols,
    decl: NodeId,
    name: &str,
) -> Result<&'m FuncSig, LowerError> {
    symbols
        .functions
        .get(name)
        .ok_or_else(|| syntax.structural(decl, format!("`{name}` was not collected")))
}

/// Lowering state for one function body.
pub(super) struct FnLowerer<'s, 'a> {
    pub(super) session: &'s mut Session<'a>,
    pub(super) symbols: &'s ModuleSymbols,
    pub(super) syntax: Syntax<'s>,
    pub(super) builder: IrBuilder,
    pub(super) scope: Scope,
    pub(super) loops: Vec<LoopTargets>,
    /// Declared return type.
    pub(super) ret: ValueType,
    pub(super) nursery_depth: u32,
}

impl<'s, 'a> FnLowerer<'s, 'a> {
    fn new(
        session: &'s mut Session<'a>,
        symbols: &'s ModuleSymbols,
        syntax: Syntax<'s>,
        sig: &FuncSig,
    ) -> Self {
        FnLowerer {
            session,
            symbols,
            syntax,
            builder: IrBuilder::new(sig.graph.clone()),
            scope: Scope::new(),
            loops: Vec::new(),
            ret: sig.ret.clone(),
            nursery_depth: 0,
        }
    }

    fn bind_params(&mut self, decl: NodeId, types: &[ValueType]) -> Result<(), LowerError> {
        let params = self.syntax.children(self.syntax.child(decl, 1)?)?;
        for (index, (&param, ty)) in params.iter().zip(types).enumerate() {
            let name = self.syntax.name(self.syntax.child(param, 0)?)?;
            let value = self
                .builder
                .emit(OpCode::Parameter, &[], index_data(index));
            self.scope.bind(name, value, ty.clone());
        }
        Ok(())
    }

    /// Whether the function returns an error union.
    pub(super) fn is_fallible(&self) -> bool {
        self.ret.is_error_union()
    }

    fn finish(self, sig: &FuncSig) -> IrGraph {
        let param_count = u32::try_from(sig.params.len()).unwrap_or(u32::MAX);
        let fallible = self.is_fallible();
        self.builder.finish(param_count, fallible, sig.is_async)
    }
}
