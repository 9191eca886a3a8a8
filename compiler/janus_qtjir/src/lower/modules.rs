//! Module resolution: `import`, `use zig` and per-session module caching.

use std::fs;
use std::sync::Arc;

use janus_diagnostic::ErrorCode;
use janus_ir::{NodeId, NodeKind, Snapshot};
use janus_stack::ensure_sufficient_stack;

use super::collect::ModuleSymbols;
use super::syntax::Syntax;
use super::{index_data, Session};
use crate::externs::{scan_native_exports, ExternSymbol, NativeSignature, NativeType};
use crate::ir::{IrData, OpCode};
use crate::{IrBuilder, LowerError};

impl Session<'_> {
    /// Collect and emit one module, once per session.
    pub(super) fn lower_module(
        &mut self,
        name: &str,
        snapshot: Arc<Snapshot>,
    ) -> Result<Arc<ModuleSymbols>, LowerError> {
        if let Some(symbols) = self.modules.get(name) {
            return Ok(Arc::clone(symbols));
        }
        let syntax = Syntax::new(&snapshot, name);
        if !snapshot.interner().same_session(self.db.interner()) {
            return Err(syntax.structural(
                snapshot.root(),
                "snapshot was built against a different interner than the session",
            ));
        }

        let _span = tracing::debug_span!("lower_module", module = name).entered();
        self.import_stack.push(name.to_string());
        let result: Result<Arc<ModuleSymbols>, LowerError> = ensure_sufficient_stack(|| {
            let symbols = Arc::new(self.collect(syntax, &snapshot)?);
            self.emit_items(syntax, &symbols)?;
            Ok(symbols)
        });
        self.import_stack.pop();

        let symbols = result?;
        self.modules.insert(name.to_string(), Arc::clone(&symbols));
        Ok(symbols)
    }

    /// `import a.b.c`: returns the alias (`c`) and the module's symbols.
    pub(super) fn collect_import(
        &mut self,
        syntax: Syntax<'_>,
        item: NodeId,
    ) -> Result<(String, Arc<ModuleSymbols>), LowerError> {
        let segments = syntax
            .children(item)?
            .iter()
            .map(|&segment| syntax.text(segment))
            .collect::<Result<Vec<_>, _>>()?;
        let Some(&alias) = segments.last() else {
            return Err(syntax.structural(item, "import has no path"));
        };
        let module = segments.join("/");
        let symbols = self.import_module(&module, syntax, item)?;
        Ok((alias.to_string(), symbols))
    }

    fn import_module(
        &mut self,
        module: &str,
        syntax: Syntax<'_>,
        node: NodeId,
    ) -> Result<Arc<ModuleSymbols>, LowerError> {
        if let Some(symbols) = self.modules.get(module) {
            return Ok(Arc::clone(symbols));
        }
        if let Some(start) = self.import_stack.iter().position(|m| m == module) {
            let cycle = self.import_stack[start..]
                .iter()
                .map(String::as_str)
                .chain([module])
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(syntax.semantic(
                ErrorCode::E5001,
                node,
                format!("cyclic import: {cycle}"),
            ));
        }
        if self.import_stack.len() >= self.options.max_import_depth {
            return Err(syntax.semantic(
                ErrorCode::E5001,
                node,
                format!(
                    "import depth limit of {} exceeded while importing `{module}`",
                    self.options.max_import_depth
                ),
            ));
        }

        let snapshot = if let Some(unit) = self.db.unit_by_name(module) {
            Arc::clone(&unit.snapshot)
        } else {
            let loaded = match self.loader {
                Some(loader) => loader.load(module, self.db.interner())?,
                None => None,
            };
            let Some(loaded) = loaded else {
                return Err(syntax.semantic(
                    ErrorCode::E5002,
                    node,
                    format!("module `{module}` not found"),
                ));
            };
            tracing::debug!(module, path = ?loaded.path, "loaded module");
            loaded.snapshot
        };
        self.lower_module(module, snapshot)
    }

    /// `use zig "path"`: register explicit signatures, or scan the native
    /// source for exports when none are given.
    pub(super) fn collect_native(
        &mut self,
        syntax: Syntax<'_>,
        item: NodeId,
    ) -> Result<(), LowerError> {
        let path_node = syntax.child(item, 0)?;
        syntax.expect(path_node, NodeKind::StringLiteral)?;
        let path = syntax.text(path_node)?;
        let declared = syntax.children_from(item, 1)?;

        let bindings = if declared.is_empty() {
            let file = self.options.resolve_native(path);
            let source = fs::read_to_string(&file).map_err(|source| LowerError::Io {
                path: file.clone(),
                source,
            })?;
            let found = scan_native_exports(&source);
            tracing::debug!(path, exports = found.len(), "scanned native source");
            found
        } else {
            declared
                .iter()
                .map(|&decl| native_signature(syntax, decl))
                .collect::<Result<Vec<_>, _>>()?
        };

        for (name, signature) in bindings {
            let symbol = ExternSymbol {
                native_symbol: name.clone(),
                signature,
                origin: path.to_string(),
            };
            self.externs
                .register(name, symbol)
                .map_err(|e| syntax.semantic(ErrorCode::E5003, item, e.to_string()))?;
        }
        Ok(())
    }

    /// Graph that replays a spawned call from its captured arguments.
    pub(super) fn spawn_thunk(
        &mut self,
        target: &str,
        arity: usize,
        syntax: Syntax<'_>,
        node: NodeId,
    ) -> Result<String, LowerError> {
        let name = format!("{target}__spawn_thunk");
        if self.spawn_thunks.contains(&name) {
            return Ok(name);
        }
        let mut builder = IrBuilder::new(name.clone());
        let captured: Vec<_> = (0..arity)
            .map(|i| builder.emit(OpCode::CapturedArg, &[], index_data(i)))
            .collect();
        builder.emit(OpCode::Call, &captured, IrData::Str(target.to_string()));
        builder.ret(None);
        self.push_graph(builder.finish(0, false, false), syntax, node)?;
        self.spawn_thunks.insert(name.clone());
        Ok(name)
    }
}

/// Signature of a bodiless `FuncDecl` inside `use zig`.
fn native_signature(
    syntax: Syntax<'_>,
    decl: NodeId,
) -> Result<(String, NativeSignature), LowerError> {
    let name = syntax.ident_text(decl, 0)?;
    let mut params = Vec::new();
    for &param in syntax.children(syntax.child(decl, 1)?)? {
        let ty = match syntax.optional_child(param, 1)? {
            Some(ty) => NativeType::parse(syntax.text(ty)?),
            None => NativeType::Other("anytype".to_string()),
        };
        params.push(ty);
    }
    let ret = match syntax.optional_child(decl, 2)? {
        Some(ty) => NativeType::parse(syntax.text(ty)?),
        None => NativeType::Void,
    };
    Ok((name.to_string(), NativeSignature { params, ret }))
}
