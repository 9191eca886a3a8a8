//! Pass 1: record every declaration of a module.
//!
//! Items are visited in a fixed order (imports, native bindings, structs,
//! error sets, traits, impls, functions) so later categories can refer to
//! earlier ones regardless of source order.

use std::sync::Arc;

use janus_diagnostic::ErrorCode;
use janus_ir::{NodeId, NodeKind, Snapshot};
use rustc_hash::{FxHashMap, FxHashSet};

use super::syntax::Syntax;
use super::types::{ValueType, CHANNEL_ERROR, CHANNEL_ERROR_VARIANTS};
use super::Session;
use crate::trait_meta::{inherent_name, qualified_name, MethodSig};
use crate::LowerError;

/// Signature of a callable graph.
#[derive(Clone, Debug)]
pub(crate) struct FuncSig {
    /// Graph name.
    pub graph: String,
    pub params: Vec<ValueType>,
    pub ret: ValueType,
    pub is_async: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct StructDef {
    pub fields: Vec<(String, ValueType)>,
}

impl StructDef {
    /// Offset and type of a field.
    pub fn field(&self, name: &str) -> Option<(usize, &ValueType)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, (field, _))| field == name)
            .map(|(offset, (_, ty))| (offset, ty))
    }
}

#[derive(Clone, Debug)]
pub(crate) struct ErrorSetDef {
    pub variants: Vec<String>,
}

impl ErrorSetDef {
    /// 1-based code of a variant; 0 is reserved for "no error".
    pub fn code_of(&self, variant: &str) -> Option<i64> {
        let index = self.variants.iter().position(|v| v == variant)?;
        i64::try_from(index + 1).ok()
    }
}

#[derive(Clone, Debug)]
pub(crate) struct TraitMethod {
    pub name: String,
    /// The method's `FuncDecl` in the trait's snapshot.
    pub decl: NodeId,
    /// Parameter types after `self`.
    pub params: Vec<ValueType>,
    pub ret: ValueType,
    pub has_default: bool,
}

#[derive(Debug)]
pub(crate) struct TraitDef {
    pub name: String,
    /// Unit the trait was declared in, for lowering default bodies.
    pub unit: String,
    pub snapshot: Arc<Snapshot>,
    pub methods: Vec<TraitMethod>,
}

impl TraitDef {
    /// Vtable slot and signature of a method.
    pub fn method(&self, name: &str) -> Option<(usize, &TraitMethod)> {
        self.methods.iter().enumerate().find(|(_, m)| m.name == name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ImplDef {
    pub type_name: String,
    pub trait_name: Option<String>,
}

/// Everything a module declares, plus what its imports bring in.
pub(crate) struct ModuleSymbols {
    /// Callables by name. Inherent methods are keyed by `Type_method`.
    pub functions: FxHashMap<String, FuncSig>,
    /// Graph names of inherent methods.
    pub inherent: FxHashSet<String>,
    pub structs: FxHashMap<String, StructDef>,
    pub error_sets: FxHashMap<String, ErrorSetDef>,
    pub traits: FxHashMap<String, Arc<TraitDef>>,
    /// Impl blocks in declaration order.
    pub impls: Vec<ImplDef>,
    /// Imported modules by alias (last path segment).
    pub aliases: FxHashMap<String, Arc<ModuleSymbols>>,
}

impl ModuleSymbols {
    fn new() -> Self {
        let mut error_sets = FxHashMap::default();
        error_sets.insert(
            CHANNEL_ERROR.to_string(),
            ErrorSetDef {
                variants: CHANNEL_ERROR_VARIANTS.iter().map(|v| (*v).to_string()).collect(),
            },
        );
        ModuleSymbols {
            functions: FxHashMap::default(),
            inherent: FxHashSet::default(),
            structs: FxHashMap::default(),
            error_sets,
            traits: FxHashMap::default(),
            impls: Vec::new(),
            aliases: FxHashMap::default(),
        }
    }

    /// Bring an imported module's declarations into scope.
    fn merge(&mut self, other: &ModuleSymbols) {
        for (name, sig) in &other.functions {
            self.functions.entry(name.clone()).or_insert_with(|| sig.clone());
        }
        self.inherent.extend(other.inherent.iter().cloned());
        for (name, def) in &other.structs {
            self.structs.entry(name.clone()).or_insert_with(|| def.clone());
        }
        for (name, def) in &other.error_sets {
            self.error_sets.entry(name.clone()).or_insert_with(|| def.clone());
        }
        for (name, def) in &other.traits {
            self.traits.entry(name.clone()).or_insert_with(|| Arc::clone(def));
        }
        for imp in &other.impls {
            if !self.impls.contains(imp) {
                self.impls.push(imp.clone());
            }
        }
    }

    /// Scope for a default trait body instantiated by an importing module.
    /// The owner's names win; the importer adds its types, impls and
    /// methods so `self` dispatch reaches them.
    pub fn layered(owner: &ModuleSymbols, importer: &ModuleSymbols) -> Self {
        let mut symbols = ModuleSymbols::new();
        symbols.merge(owner);
        symbols.aliases.clone_from(&owner.aliases);
        symbols.merge(importer);
        symbols
    }

    /// Check if `type_name` has an impl of `trait_name`.
    pub fn implements(&self, type_name: &str, trait_name: &str) -> bool {
        self.impls
            .iter()
            .any(|i| i.type_name == type_name && i.trait_name.as_deref() == Some(trait_name))
    }
}

impl Session<'_> {
    /// Pass 1 over `snapshot`'s top-level items.
    pub(super) fn collect(
        &mut self,
        syntax: Syntax<'_>,
        snapshot: &Arc<Snapshot>,
    ) -> Result<ModuleSymbols, LowerError> {
        let root = snapshot.root();
        let items = syntax.expect(root, NodeKind::SourceFile)?.children;
        let mut symbols = ModuleSymbols::new();

        let of_kind = |kind: NodeKind| -> Vec<NodeId> {
            items
                .iter()
                .copied()
                .filter(|&item| syntax.kind(item).is_ok_and(|k| k == kind))
                .collect()
        };

        for item in of_kind(NodeKind::ImportStmt) {
            let (alias, module) = self.collect_import(syntax, item)?;
            symbols.merge(&module);
            symbols.aliases.insert(alias, module);
        }
        for item in of_kind(NodeKind::UseZigStmt) {
            self.collect_native(syntax, item)?;
        }

        let mut local: FxHashSet<String> = FxHashSet::default();
        for item in of_kind(NodeKind::StructDecl) {
            let name = syntax.ident_text(item, 0)?;
            claim(syntax, &mut local, item, name)?;
            let def = collect_struct(syntax, item)?;
            symbols.structs.insert(name.to_string(), def);
        }
        for item in of_kind(NodeKind::ErrorDecl) {
            let name = syntax.ident_text(item, 0)?;
            claim(syntax, &mut local, item, name)?;
            let mut variants = Vec::new();
            for &variant in syntax.children_from(item, 1)? {
                let text = syntax.text(variant)?;
                if variants.iter().any(|v| v == text) {
                    return Err(duplicate(syntax, variant, &format!("{name}.{text}")));
                }
                variants.push(text.to_string());
            }
            symbols
                .error_sets
                .insert(name.to_string(), ErrorSetDef { variants });
        }
        for item in of_kind(NodeKind::TraitDecl) {
            let name = syntax.ident_text(item, 0)?;
            claim(syntax, &mut local, item, name)?;
            let def = self.collect_trait(syntax, snapshot, item, name)?;
            symbols.traits.insert(name.to_string(), Arc::new(def));
        }

        let mut inherent_impls: Vec<(String, Vec<String>)> = Vec::new();
        for item in of_kind(NodeKind::ImplDecl) {
            self.collect_impl(syntax, item, &mut symbols, &mut inherent_impls)?;
        }
        for (type_name, methods) in inherent_impls {
            self.trait_meta
                .record_impl(type_name.clone(), None, methods)
                .map_err(|e| duplicate_impl(syntax, root, &e.to_string()))?;
        }

        for &item in items {
            match syntax.kind(item)? {
                NodeKind::FuncDecl | NodeKind::AsyncFuncDecl => {
                    let name = syntax.ident_text(item, 0)?;
                    claim(syntax, &mut local, item, name)?;
                    let sig = self.func_sig(syntax, item, name.to_string(), None)?;
                    symbols.functions.insert(name.to_string(), sig);
                }
                NodeKind::ImportStmt
                | NodeKind::UseZigStmt
                | NodeKind::StructDecl
                | NodeKind::ErrorDecl
                | NodeKind::TraitDecl
                | NodeKind::ImplDecl => {}
                kind => {
                    return Err(syntax.semantic(
                        ErrorCode::E4007,
                        item,
                        format!("{kind:?} is not allowed at the top level of a module"),
                    ))
                }
            }
        }

        tracing::debug!(
            unit = syntax.unit,
            functions = symbols.functions.len(),
            structs = symbols.structs.len(),
            traits = symbols.traits.len(),
            impls = symbols.impls.len(),
            "collected declarations"
        );
        Ok(symbols)
    }

    /// Signature of a `FuncDecl`. An untyped `self` parameter takes
    /// `self_type`.
    pub(super) fn func_sig(
        &self,
        syntax: Syntax<'_>,
        decl: NodeId,
        graph: String,
        self_type: Option<&str>,
    ) -> Result<FuncSig, LowerError> {
        let kind = syntax.kind(decl)?;
        if !kind.is_function() {
            return Err(syntax.structural(decl, format!("expected a function, found {kind:?}")));
        }
        let param_list = syntax.child(decl, 1)?;
        syntax.expect(param_list, NodeKind::ParamList)?;

        let mut params = Vec::new();
        for &param in syntax.children(param_list)? {
            syntax.expect(param, NodeKind::Param)?;
            let name = syntax.name(syntax.child(param, 0)?)?;
            let ty_node = syntax.child(param, 1)?;
            let ty = match (syntax.kind(ty_node)?, self_type) {
                (NodeKind::Empty, Some(self_type)) if name == self.self_name => {
                    ValueType::Named(self_type.to_string())
                }
                _ => ValueType::from_node(syntax, ty_node)?,
            };
            params.push(ty);
        }

        Ok(FuncSig {
            graph,
            params,
            ret: ValueType::from_node(syntax, syntax.child(decl, 2)?)?,
            is_async: kind == NodeKind::AsyncFuncDecl,
        })
    }

    fn collect_trait(
        &mut self,
        syntax: Syntax<'_>,
        snapshot: &Arc<Snapshot>,
        item: NodeId,
        name: &str,
    ) -> Result<TraitDef, LowerError> {
        let mut methods: Vec<TraitMethod> = Vec::new();
        for &decl in syntax.children_from(item, 1)? {
            let method = syntax.ident_text(decl, 0)?;
            if methods.iter().any(|m| m.name == method) {
                return Err(duplicate(syntax, decl, &format!("{name}.{method}")));
            }
            let sig = self.func_sig(syntax, decl, String::new(), Some(name))?;
            let has_self = match syntax.children(syntax.child(decl, 1)?)?.first() {
                Some(&first) => syntax.name(syntax.child(first, 0)?)? == self.self_name,
                None => false,
            };
            let params = sig.params.into_iter().skip(usize::from(has_self)).collect();
            methods.push(TraitMethod {
                name: method.to_string(),
                decl,
                params,
                ret: sig.ret,
                has_default: syntax.optional_child(decl, 3)?.is_some(),
            });
        }

        let sigs = methods
            .iter()
            .map(|m| MethodSig {
                name: m.name.clone(),
                param_count: u32::try_from(m.params.len() + 1).unwrap_or(u32::MAX),
                has_default: m.has_default,
            })
            .collect();
        self.trait_meta
            .record_trait(name, sigs)
            .map_err(|e| duplicate_impl(syntax, item, &e.to_string()))?;

        Ok(TraitDef {
            name: name.to_string(),
            unit: syntax.unit.to_string(),
            snapshot: Arc::clone(snapshot),
            methods,
        })
    }

    fn collect_impl(
        &mut self,
        syntax: Syntax<'_>,
        item: NodeId,
        symbols: &mut ModuleSymbols,
        inherent_impls: &mut Vec<(String, Vec<String>)>,
    ) -> Result<(), LowerError> {
        let type_name = syntax.text(syntax.child(item, 0)?)?;
        let trait_node = syntax.optional_child(item, 1)?;
        let methods = syntax.children_from(item, 2)?;

        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for &decl in methods {
            let name = syntax.ident_text(decl, 0)?;
            if !seen.insert(name) {
                return Err(duplicate(syntax, decl, &format!("{type_name}.{name}")));
            }
        }

        let Some(trait_node) = trait_node else {
            let mut graphs = Vec::new();
            for &decl in methods {
                let graph = inherent_name(type_name, syntax.ident_text(decl, 0)?);
                if symbols.functions.contains_key(&graph) {
                    return Err(duplicate(syntax, decl, &graph));
                }
                let sig = self.func_sig(syntax, decl, graph.clone(), Some(type_name))?;
                symbols.functions.insert(graph.clone(), sig);
                symbols.inherent.insert(graph.clone());
                graphs.push(graph);
            }
            match inherent_impls.iter_mut().find(|(t, _)| t == type_name) {
                Some((_, existing)) => existing.extend(graphs),
                None => inherent_impls.push((type_name.to_string(), graphs)),
            }
            let imp = ImplDef {
                type_name: type_name.to_string(),
                trait_name: None,
            };
            if !symbols.impls.contains(&imp) {
                symbols.impls.push(imp);
            }
            return Ok(());
        };

        let trait_name = syntax.text(trait_node)?;
        let Some(def) = symbols.traits.get(trait_name).cloned() else {
            return Err(syntax.semantic(
                ErrorCode::E4105,
                trait_node,
                format!("unknown trait `{trait_name}`"),
            ));
        };
        for &decl in methods {
            let name = syntax.ident_text(decl, 0)?;
            if def.method(name).is_none() {
                return Err(syntax.semantic(
                    ErrorCode::E4104,
                    decl,
                    format!("`{name}` is not a method of trait `{trait_name}`"),
                ));
            }
        }
        for method in &def.methods {
            if !method.has_default && !seen.contains(method.name.as_str()) {
                return Err(syntax.semantic(
                    ErrorCode::E4103,
                    item,
                    format!(
                        "`{type_name}` does not implement `{trait_name}.{}`, which has no default",
                        method.name
                    ),
                ));
            }
        }

        let imp = ImplDef {
            type_name: type_name.to_string(),
            trait_name: Some(trait_name.to_string()),
        };
        if symbols.impls.contains(&imp) {
            return Err(duplicate(syntax, item, &format!("impl {trait_name} for {type_name}")));
        }
        let qualified = def
            .methods
            .iter()
            .map(|m| qualified_name(type_name, trait_name, &m.name))
            .collect();
        self.trait_meta
            .record_impl(type_name, Some(trait_name), qualified)
            .map_err(|e| duplicate_impl(syntax, item, &e.to_string()))?;
        symbols.impls.push(imp);
        Ok(())
    }
}

fn collect_struct(syntax: Syntax<'_>, item: NodeId) -> Result<StructDef, LowerError> {
    let mut fields: Vec<(String, ValueType)> = Vec::new();
    for &field in syntax.children_from(item, 1)? {
        syntax.expect(field, NodeKind::FieldDecl)?;
        let name = syntax.ident_text(field, 0)?;
        if fields.iter().any(|(f, _)| f == name) {
            return Err(duplicate(syntax, field, name));
        }
        let ty = ValueType::from_node(syntax, syntax.child(field, 1)?)?;
        fields.push((name.to_string(), ty));
    }
    Ok(StructDef { fields })
}

/// Reserve a top-level name within one module.
fn claim(
    syntax: Syntax<'_>,
    local: &mut FxHashSet<String>,
    item: NodeId,
    name: &str,
) -> Result<(), LowerError> {
    if local.insert(name.to_string()) {
        Ok(())
    } else {
        Err(duplicate(syntax, item, name))
    }
}

fn duplicate(syntax: Syntax<'_>, node: NodeId, what: &str) -> LowerError {
    syntax.semantic(
        ErrorCode::E4005,
        node,
        format!("`{what}` is defined more than once"),
    )
}

fn duplicate_impl(syntax: Syntax<'_>, node: NodeId, message: &str) -> LowerError {
    syntax.semantic(ErrorCode::E4005, node, message.to_string())
}
