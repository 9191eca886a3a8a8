//! Test Utilities for Lowering Integration Tests
//!
//! Provides shared helpers for:
//! - Building a one-unit database from an `AstBuilder` closure
//! - Lowering and validating every produced graph
//! - Running a lowered entry point and capturing its output

use janus_ir::{AstBuilder, AstDb, NodeId, UnitId};
use janus_qtjir::{validate_graph, Interpreter, LowerError, LoweredUnit, Lowerer, Value};

/// Build a database holding a single unit named `main`.
pub fn single_unit(build: impl FnOnce(&mut AstBuilder) -> Vec<NodeId>) -> (AstDb, UnitId) {
    let mut db = AstDb::new();
    let mut builder = AstBuilder::new(db.interner().clone());
    let items = build(&mut builder);
    let snapshot = builder.finish(&items).unwrap();
    let unit = db.add_unit("main", None, snapshot).unwrap();
    (db, unit)
}

/// Lower a single-unit program, returning the error if lowering fails.
pub fn try_lower(build: impl FnOnce(&mut AstBuilder) -> Vec<NodeId>) -> Result<LoweredUnit, LowerError> {
    let (db, unit) = single_unit(build);
    Lowerer::new(&db).lower(unit)
}

/// Lower a single-unit program and validate every graph.
pub fn lower(build: impl FnOnce(&mut AstBuilder) -> Vec<NodeId>) -> LoweredUnit {
    let lowered = try_lower(build).unwrap();
    assert_valid(&lowered);
    lowered
}

pub fn assert_valid(lowered: &LoweredUnit) {
    for graph in &lowered.graphs {
        if let Err(violation) = validate_graph(graph) {
            panic!("{violation}\n{graph}");
        }
    }
}

/// Run `entry` and return its result and printed output.
pub fn run(lowered: &LoweredUnit, entry: &str, args: Vec<Value>) -> (Value, String) {
    let mut interp = Interpreter::new(&lowered.graphs, &lowered.trait_meta);
    let value = interp.run(entry, args).unwrap();
    (value, interp.output().to_string())
}

/// Printed output of `main`.
pub fn output_of(lowered: &LoweredUnit) -> String {
    run(lowered, "main", Vec::new()).1
}

/// `func main() { stmts }`.
pub fn main_fn(b: &mut AstBuilder, stmts: &[NodeId]) -> NodeId {
    let body = b.block(stmts);
    b.func("main", &[], None, body)
}

/// `func name(params) -> i32 { stmts }`.
pub fn int_fn(b: &mut AstBuilder, name: &str, params: &[NodeId], stmts: &[NodeId]) -> NodeId {
    let body = b.block(stmts);
    let ret = b.ty("i32");
    b.func(name, params, Some(ret), body)
}

/// `name: ty` parameter.
pub fn typed_param(b: &mut AstBuilder, name: &str, ty: &str) -> NodeId {
    let ty = b.ty(ty);
    b.param(name, Some(ty))
}

/// `print_int(value)` statement.
pub fn print_int(b: &mut AstBuilder, value: NodeId) -> NodeId {
    let call = b.call("print_int", &[value]);
    b.expr_stmt(call)
}

/// `return value`.
pub fn ret(b: &mut AstBuilder, value: NodeId) -> NodeId {
    b.ret(Some(value))
}
