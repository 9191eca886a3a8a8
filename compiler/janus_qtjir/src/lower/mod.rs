//! AST snapshot to QTJIR lowering.
//!
//! # Entry point
//!
//! [`Lowerer::lower`] lowers one unit of an [`AstDb`] together with every
//! module it imports, producing a [`LoweredUnit`].
//!
//! # Architecture
//!
//! - `Session` (this file) owns the output of one run: graphs, externs,
//!   trait metadata, and the per-session module cache used by imports.
//! - `collect.rs` is pass 1: it records every declaration of a module into
//!   a `ModuleSymbols` table.
//! - `func.rs` is pass 2: it lowers function bodies and impl methods with a
//!   `FnLowerer`, whose expression, control-flow, call, error and
//!   concurrency lowering live in the sibling files.
//! - `modules.rs` resolves imports and `use zig` bindings.

mod calls;
mod collect;
mod concurrency;
mod control_flow;
mod errors;
mod expr;
mod func;
mod modules;
mod scope;
mod stmt;
mod syntax;
mod types;

use std::sync::Arc;

use janus_diagnostic::ErrorCode;
use janus_ir::{AstDb, Name, NodeId, UnitId};
use rustc_hash::{FxHashMap, FxHashSet};

use self::collect::ModuleSymbols;
use self::syntax::Syntax;
use crate::ir::{IrData, IrGraph};
use crate::loader::{FsModuleLoader, ModuleLoader};
use crate::{ExternRegistry, LowerError, LowerOptions, TraitMeta};

/// Output of lowering one unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct LoweredUnit {
    /// Graphs of the unit and its imports, in emission order.
    pub graphs: Vec<IrGraph>,
    pub externs: ExternRegistry,
    pub trait_meta: TraitMeta,
}

impl LoweredUnit {
    /// Graph by name.
    pub fn graph(&self, name: &str) -> Option<&IrGraph> {
        self.graphs.iter().find(|g| g.name == name)
    }

    /// Names of all graphs, in emission order.
    pub fn graph_names(&self) -> impl Iterator<Item = &str> {
        self.graphs.iter().map(|g| g.name.as_str())
    }
}

/// Configurable lowering entry point.
pub struct Lowerer<'db> {
    db: &'db AstDb,
    loader: Option<Arc<dyn ModuleLoader>>,
    options: LowerOptions,
}

impl<'db> Lowerer<'db> {
    pub fn new(db: &'db AstDb) -> Self {
        Lowerer {
            db,
            loader: None,
            options: LowerOptions::default(),
        }
    }

    /// Resolve imports that are not units of the database through `loader`.
    ///
    /// Without a loader, a filesystem loader rooted at the search path is
    /// used when one is configured.
    #[must_use]
    pub fn with_loader(mut self, loader: impl ModuleLoader + 'static) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: LowerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &LowerOptions {
        &self.options
    }

    /// Lower `unit` and everything it imports.
    pub fn lower(&self, unit: UnitId) -> Result<LoweredUnit, LowerError> {
        let unit = self.db.unit(unit).ok_or(LowerError::UnknownUnit(unit))?;

        let fallback;
        let loader: Option<&dyn ModuleLoader> = match (&self.loader, self.options.search_path()) {
            (Some(loader), _) => Some(loader.as_ref()),
            (None, Some(root)) => {
                fallback =
                    FsModuleLoader::new(root).with_extension(&self.options.source_extension);
                Some(&fallback)
            }
            (None, None) => None,
        };

        let _span = tracing::debug_span!("lower_unit", unit = %unit.name).entered();
        let mut session = Session::new(self.db, loader, &self.options)?;
        session.lower_module(&unit.name, Arc::clone(&unit.snapshot))?;
        let lowered = session.finish();
        tracing::debug!(
            graphs = lowered.graphs.len(),
            externs = lowered.externs.len(),
            "lowered unit"
        );
        Ok(lowered)
    }
}

/// State of one lowering run, shared by the root unit and its imports.
pub(crate) struct Session<'a> {
    db: &'a AstDb,
    loader: Option<&'a dyn ModuleLoader>,
    options: &'a LowerOptions,
    /// Interned `self`, for recognizing receiver parameters.
    self_name: Name,
    graphs: Vec<IrGraph>,
    graph_names: FxHashSet<String>,
    externs: ExternRegistry,
    trait_meta: TraitMeta,
    /// Modules already lowered in this session.
    modules: FxHashMap<String, Arc<ModuleSymbols>>,
    /// Modules being lowered, outermost first.
    import_stack: Vec<String>,
    spawn_thunks: FxHashSet<String>,
}

impl<'a> Session<'a> {
    fn new(
        db: &'a AstDb,
        loader: Option<&'a dyn ModuleLoader>,
        options: &'a LowerOptions,
    ) -> Result<Self, LowerError> {
        Ok(Session {
            db,
            loader,
            options,
            self_name: db.interner().try_intern("self")?,
            graphs: Vec::new(),
            graph_names: FxHashSet::default(),
            externs: ExternRegistry::new(),
            trait_meta: TraitMeta::new(),
            modules: FxHashMap::default(),
            import_stack: Vec::new(),
            spawn_thunks: FxHashSet::default(),
        })
    }

    /// Append a finished graph. Graph names are unique across the session.
    fn push_graph(
        &mut self,
        graph: IrGraph,
        syntax: Syntax<'_>,
        node: NodeId,
    ) -> Result<(), LowerError> {
        if !self.graph_names.insert(graph.name.clone()) {
            return Err(syntax.semantic(
                ErrorCode::E4005,
                node,
                format!("`{}` is defined more than once", graph.name),
            ));
        }
        tracing::trace!(graph = %graph.name, nodes = graph.nodes.len(), "emitted graph");
        self.graphs.push(graph);
        Ok(())
    }

    fn finish(self) -> LoweredUnit {
        LoweredUnit {
            graphs: self.graphs,
            externs: self.externs,
            trait_meta: self.trait_meta,
        }
    }
}

/// `IrData::Int` holding a position or count.
fn index_data(index: usize) -> IrData {
    IrData::Int(i64::try_from(index).unwrap_or(i64::MAX))
}
