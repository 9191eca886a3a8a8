//! QTJIR lowering for Janus.
//!
//! Turns the syntax snapshots of an [`AstDb`] into QTJIR graphs: one
//! SSA-style graph per function, with explicit labels, jumps and phis.
//!
//! # Entry points
//!
//! - [`lower_unit`]: graphs for one unit and everything it imports
//! - [`lower_unit_with_externs`]: graphs plus the extern registry and trait
//!   metadata, with an optional search path for imports and native files
//! - [`Lowerer`]: full control over the module loader and [`LowerOptions`]
//! - [`lower_units_parallel`]: independent units on the rayon pool
//!
//! The [`Interpreter`] executes lowered graphs and is the execution oracle
//! used by the tests.
//!
//! # Debugging
//!
//! - `RUST_LOG=janus_qtjir=debug`: unit, import and function boundaries
//! - `RUST_LOG=janus_qtjir=trace`: every emitted graph and dropped statement
//!
//! Call [`init_tracing`] once to install a subscriber.

mod builder;
mod error;
mod externs;
mod interp;
pub mod ir;
mod loader;
mod lower;
mod options;
mod trait_meta;

use std::path::Path;
use std::sync::Once;

use janus_ir::{AstDb, UnitId};
use rayon::prelude::*;

pub use builder::IrBuilder;
pub use error::{ErrorKind, LowerError};
pub use externs::{
    scan_native_exports, ExternError, ExternRegistry, ExternSymbol, NativeSignature, NativeType,
};
pub use interp::{InterpError, Interpreter, Value, DEFAULT_STEP_LIMIT};
pub use ir::{validate_graph, IrData, IrGraph, IrNode, IrRef, IrViolation, LabelId, OpCode};
pub use loader::{FsModuleLoader, LoadedModule, MemoryLoader, ModuleLoader, SourceParser};
pub use lower::{LoweredUnit, Lowerer};
pub use options::{LowerOptions, DEFAULT_MAX_IMPORT_DEPTH};
pub use trait_meta::{
    inherent_name, qualified_name, vtable_name, ImplInfo, MethodSig, TraitInfo, TraitMeta,
    TraitMetaError,
};

/// Lower `unit` and its imports with default options.
pub fn lower_unit(db: &AstDb, unit: UnitId) -> Result<Vec<IrGraph>, LowerError> {
    Ok(Lowerer::new(db).lower(unit)?.graphs)
}

/// Lower `unit`, resolving imports and `use zig` paths under `search_path`.
pub fn lower_unit_with_externs(
    db: &AstDb,
    unit: UnitId,
    search_path: Option<&Path>,
) -> Result<LoweredUnit, LowerError> {
    let mut options = LowerOptions::default();
    if let Some(path) = search_path {
        options = options.with_search_path(path);
    }
    Lowerer::new(db).with_options(options).lower(unit)
}

/// Lower independent units in parallel. Results keep the order of `units`.
///
/// Each unit gets its own session, so a module imported by several units is
/// lowered once per importing unit.
pub fn lower_units_parallel(
    db: &AstDb,
    units: &[UnitId],
) -> Vec<Result<LoweredUnit, LowerError>> {
    let lowerer = Lowerer::new(db);
    units.par_iter().map(|&unit| lowerer.lower(unit)).collect()
}

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Does nothing unless `RUST_LOG` is set.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}
