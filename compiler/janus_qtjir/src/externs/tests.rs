use pretty_assertions::assert_eq;

use super::*;

fn symbol(params: Vec<NativeType>, ret: NativeType, origin: &str) -> ExternSymbol {
    ExternSymbol {
        native_symbol: "add".to_string(),
        signature: NativeSignature { params, ret },
        origin: origin.to_string(),
    }
}

#[test]
fn parse_native_types() {
    assert_eq!(NativeType::parse("i32"), NativeType::I32);
    assert_eq!(NativeType::parse(" usize "), NativeType::I64);
    assert_eq!(NativeType::parse("[*:0]const u8"), NativeType::CString);
    assert_eq!(NativeType::parse("*Context"), NativeType::Ptr);
    assert_eq!(NativeType::parse(""), NativeType::Void);
    assert_eq!(
        NativeType::parse("Matrix"),
        NativeType::Other("Matrix".to_string())
    );
}

#[test]
fn register_is_idempotent_for_identical_symbols() {
    let mut registry = ExternRegistry::new();
    let sym = symbol(vec![NativeType::I32, NativeType::I32], NativeType::I32, "math.zig");
    assert_eq!(registry.register("add", sym.clone()), Ok(()));

    // Same signature from another origin is still the same symbol.
    let again = ExternSymbol {
        origin: "other.zig".to_string(),
        ..sym
    };
    assert_eq!(registry.register("add", again), Ok(()));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.lookup("add").map(|s| s.origin.as_str()), Some("math.zig"));
}

#[test]
fn register_conflicting_signature_fails() {
    let mut registry = ExternRegistry::new();
    registry
        .register("add", symbol(vec![NativeType::I32], NativeType::I32, "a.zig"))
        .unwrap();
    let err = registry
        .register("add", symbol(vec![NativeType::I64], NativeType::I64, "b.zig"))
        .unwrap_err();
    let ExternError::Conflict { name, new_origin, .. } = &err;
    assert_eq!(name, "add");
    assert_eq!(new_origin, "b.zig");
    assert!(err.to_string().contains("(i32) -> i32"));
}

#[test]
fn iteration_is_name_ordered() {
    let mut registry = ExternRegistry::new();
    for name in ["zeta", "alpha", "mid"] {
        let sym = ExternSymbol {
            native_symbol: name.to_string(),
            signature: NativeSignature {
                params: vec![],
                ret: NativeType::Void,
            },
            origin: "x.zig".to_string(),
        };
        registry.register(name, sym).unwrap();
    }
    let names: Vec<&str> = registry.iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    assert!(registry.contains("mid"));
    assert!(!registry.is_empty());
}

#[test]
fn scan_exports() {
    let source = r#"
const std = @import("std");

pub fn add(a: i32, b: i32) i32 {
    return a + b;
}

fn helper(x: i32) i32 { return x; }

export fn greet(name: [*:0]const u8) void {
    _ = name;
}

pub export fn now() i64 { return 0; }
pub fn parse(text: []const u8) !u32 {
"#;
    let found = scan_native_exports(source);
    let names: Vec<&str> = found.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["add", "greet", "now", "parse"]);

    assert_eq!(
        found[0].1,
        NativeSignature {
            params: vec![NativeType::I32, NativeType::I32],
            ret: NativeType::I32,
        }
    );
    assert_eq!(found[1].1.params, vec![NativeType::CString]);
    assert_eq!(found[1].1.ret, NativeType::Void);
    assert_eq!(found[2].1.params, vec![]);
    assert_eq!(found[3].1.ret, NativeType::Other("u32".to_string()));
}

#[test]
fn scan_handles_nested_parens() {
    let found = scan_native_exports("pub fn apply(f: *const fn (i32) i32, x: i32) i32 {");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].1.params, vec![NativeType::Ptr, NativeType::I32]);
}
