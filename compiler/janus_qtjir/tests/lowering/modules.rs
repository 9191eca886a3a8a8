//! Imports, `use zig` bindings and the batch entry points.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use janus_diagnostic::ErrorCode;
use janus_ir::{AstBuilder, AstDb, NodeId, SharedInterner, Snapshot, TokenKind};
use janus_qtjir::{
    lower_unit, lower_unit_with_externs, lower_units_parallel, ErrorKind, FsModuleLoader,
    InterpError, Interpreter, IrData, LowerError, LowerOptions, Lowerer, NativeType, OpCode,
    SourceParser, Value,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use crate::util::{assert_valid, int_fn, print_int, ret, run, typed_param};

/// `func double(x: i32) -> i32 { return x * 2 }`.
fn double_module(b: &mut AstBuilder) -> Vec<NodeId> {
    let x = typed_param(b, "x", "i32");
    let lhs = b.ident("x");
    let two = b.int(2);
    let product = b.binary(lhs, TokenKind::Star, two);
    let result = ret(b, product);
    vec![int_fn(b, "double", &[x], &[result])]
}

/// Stands in for the real parser: recognizes the one source text the
/// tests write to disk.
struct DoubleParser;

impl SourceParser for DoubleParser {
    fn parse(&self, source: &str, interner: &SharedInterner) -> Result<Snapshot, String> {
        if !source.contains("func double") {
            return Err(format!("unexpected source: {source}"));
        }
        let mut b = AstBuilder::new(interner.clone());
        let items = double_module(&mut b);
        b.finish(&items).map_err(|e| e.to_string())
    }
}

/// `main` returning `math.double(21)` after `import util.math`.
fn importing_main(db: &mut AstDb) -> janus_ir::UnitId {
    let mut b = AstBuilder::new(db.interner().clone());
    let import = b.import(&["util", "math"]);
    let module = b.ident("math");
    let arg = b.int(21);
    let call = b.method_call(module, "double", &[arg]);
    let result = ret(&mut b, call);
    let main = int_fn(&mut b, "main", &[], &[result]);
    let snapshot = b.finish(&[import, main]).unwrap();
    db.add_unit("main", None, snapshot).unwrap()
}

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

#[test]
fn filesystem_loader_parses_imports() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "util/math.jan", "func double(x: i32) -> i32 { return x * 2 }\n");

    let mut db = AstDb::new();
    let main = importing_main(&mut db);
    let loader = FsModuleLoader::new(dir.path()).with_parser(Arc::new(DoubleParser));
    let lowered = Lowerer::new(&db).with_loader(loader).lower(main).unwrap();

    assert_eq!(lowered.graph_names().collect::<Vec<_>>(), vec!["double", "main"]);
    assert_eq!(run(&lowered, "main", Vec::new()).0, Value::Int(42));
}

#[test]
fn units_of_the_database_win_over_the_loader() {
    let mut db = AstDb::new();
    let mut b = AstBuilder::new(db.interner().clone());
    let items = double_module(&mut b);
    let library = b.finish(&items).unwrap();
    db.add_unit("util/math", None, library).unwrap();
    let main = importing_main(&mut db);

    let lowered = lower_unit(&db, main).unwrap();
    assert_eq!(lowered.len(), 2);
}

#[test]
fn search_path_without_parser_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "util/math.jan", "func double(x: i32) -> i32 { return x * 2 }\n");

    let mut db = AstDb::new();
    let main = importing_main(&mut db);
    let options = LowerOptions::default().with_search_path(dir.path());
    let err = Lowerer::new(&db).with_options(options).lower(main).unwrap_err();
    assert!(matches!(err, LowerError::Parse { .. }), "{err}");
    assert_eq!(err.kind(), ErrorKind::Semantic);
    assert_eq!(err.code(), ErrorCode::E0001);
}

#[test]
fn missing_module_under_search_path() {
    let dir = TempDir::new().unwrap();
    let mut db = AstDb::new();
    let main = importing_main(&mut db);
    let err = lower_unit_with_externs(&db, main, Some(dir.path())).unwrap_err();
    assert_eq!(err.code(), ErrorCode::E5002);
    assert!(err.to_string().contains("util/math"), "{err}");
}

/// `shapes`: a trait whose default `twice` calls the abstract `label` on
/// `self`. `main` imports it and implements only `label` for `Thing`.
fn imported_trait_program(db: &mut AstDb) -> janus_ir::UnitId {
    let mut b = AstBuilder::new(db.interner().clone());
    let this = b.param("self", None);
    let i32_ty = b.ty("i32");
    let label = b.abstract_method("label", &[this], Some(i32_ty));
    let this = b.param("self", None);
    let receiver = b.ident("self");
    let call = b.method_call(receiver, "label", &[]);
    let two = b.int(2);
    let doubled = b.binary(call, TokenKind::Star, two);
    let result = ret(&mut b, doubled);
    let twice = int_fn(&mut b, "twice", &[this], &[result]);
    let describable = b.trait_decl("Describable", &[label, twice]);
    let shapes = b.finish(&[describable]).unwrap();
    db.add_unit("shapes", None, shapes).unwrap();

    let mut b = AstBuilder::new(db.interner().clone());
    let import = b.import(&["shapes"]);
    let thing = b.struct_decl("Thing", &[("v", "i32")]);
    let this = b.param("self", None);
    let value = b.int(21);
    let value = ret(&mut b, value);
    let label = int_fn(&mut b, "label", &[this], &[value]);
    let imp = b.impl_decl("Thing", Some("Describable"), &[label]);
    let one = b.int(1);
    let lit = b.struct_lit("Thing", &[("v", one)]);
    let bind = b.let_stmt("t", lit);
    let t = b.ident("t");
    let call = b.method_call(t, "twice", &[]);
    let result = ret(&mut b, call);
    let main = int_fn(&mut b, "main", &[], &[bind, result]);
    let snapshot = b.finish(&[import, thing, imp, main]).unwrap();
    db.add_unit("main", None, snapshot).unwrap()
}

#[test]
fn imported_default_dispatches_on_the_implementing_type() {
    let mut db = AstDb::new();
    let main = imported_trait_program(&mut db);
    let lowered = lower_unit_with_externs(&db, main, None).unwrap();
    assert_valid(&lowered);

    let copies = lowered
        .graph_names()
        .filter(|name| *name == "Thing_Describable_twice")
        .count();
    assert_eq!(copies, 1);
    let twice = lowered.graph("Thing_Describable_twice").unwrap();
    let (_, call) = twice.find(OpCode::TraitMethodCall).next().unwrap();
    assert_eq!(call.data, IrData::Str("Thing_Describable_label".into()));

    assert_eq!(run(&lowered, "main", Vec::new()).0, Value::Int(42));
}

fn native_user(db: &mut AstDb, path: &str) -> janus_ir::UnitId {
    let mut b = AstBuilder::new(db.interner().clone());
    let binding = b.use_zig(path, &[]);
    let one = b.int(1);
    let two = b.int(2);
    let call = b.call("add", &[one, two]);
    let stmt = print_int(&mut b, call);
    let body = b.block(&[stmt]);
    let main = b.func("main", &[], None, body);
    let snapshot = b.finish(&[binding, main]).unwrap();
    db.add_unit("main", None, snapshot).unwrap()
}

#[test]
fn native_exports_are_scanned_from_the_search_path() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "native/math.zig",
        "const std = @import(\"std\");\n\
         \n\
         pub fn add(a: i32, b: i32) i32 {\n    return a + b;\n}\n\
         \n\
         fn helper() void {}\n\
         export fn scale(x: f64) f64 {\n    return x * 2.0;\n}\n",
    );

    let mut db = AstDb::new();
    let main = native_user(&mut db, "native/math.zig");
    let lowered = lower_unit_with_externs(&db, main, Some(dir.path())).unwrap();

    let names: Vec<_> = lowered.externs.iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["add", "scale"]);
    let add = lowered.externs.lookup("add").unwrap();
    assert_eq!(add.signature.params, vec![NativeType::I32, NativeType::I32]);
    assert_eq!(add.signature.ret, NativeType::I32);
    assert_eq!(add.origin, "native/math.zig");

    // Natives have no graph; the interpreter stops at the boundary.
    let mut interp = Interpreter::new(&lowered.graphs, &lowered.trait_meta);
    assert_eq!(
        interp.run("main", Vec::new()),
        Err(InterpError::NativeCall("add".into()))
    );
}

#[test]
fn unreadable_native_source_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let mut db = AstDb::new();
    let main = native_user(&mut db, "native/absent.zig");
    let err = lower_unit_with_externs(&db, main, Some(dir.path())).unwrap_err();
    assert!(matches!(err, LowerError::Io { .. }), "{err}");
    assert_eq!(err.kind(), ErrorKind::Resource);
    assert_eq!(err.code(), ErrorCode::E9002);
}

#[test]
fn units_lower_in_parallel() {
    let mut db = AstDb::new();
    let mut units = Vec::new();
    for (name, value) in [("a", 1), ("b", 2), ("c", 3)] {
        let mut b = AstBuilder::new(db.interner().clone());
        let value = b.int(value);
        let result = ret(&mut b, value);
        let entry = int_fn(&mut b, "entry", &[], &[result]);
        let snapshot = b.finish(&[entry]).unwrap();
        units.push(db.add_unit(name, None, snapshot).unwrap());
    }
    let mut b = AstBuilder::new(db.interner().clone());
    let missing = b.call("missing", &[]);
    let missing = b.expr_stmt(missing);
    let body = b.block(&[missing]);
    let broken = b.func("broken", &[], None, body);
    let snapshot = b.finish(&[broken]).unwrap();
    units.push(db.add_unit("broken", None, snapshot).unwrap());

    let results = lower_units_parallel(&db, &units);
    assert_eq!(results.len(), 4);
    for (expected, result) in [1, 2, 3].into_iter().zip(&results) {
        let lowered = result.as_ref().unwrap();
        assert_eq!(run(lowered, "entry", Vec::new()).0, Value::Int(expected));
    }
    let err = results[3].as_ref().unwrap_err();
    assert_eq!(err.code(), ErrorCode::E4001);
}
