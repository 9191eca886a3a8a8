//! End-to-end lowering scenarios: one program per core feature, checked
//! both for graph shape and for what it does when run.

use janus_ir::{AstBuilder, NodeId};
use janus_qtjir::{IrData, OpCode, Value};
use pretty_assertions::assert_eq;

use crate::util::{int_fn, lower, main_fn, output_of, print_int, ret, run, typed_param};

// -----------------------------------------------------------------------
// Counted loop
// -----------------------------------------------------------------------

#[test]
fn for_loop_prints_each_index() {
    let lowered = lower(|b| {
        let zero = b.int(0);
        let five = b.int(5);
        let range = b.range_excl(zero, five);
        let i = b.ident("i");
        let stmt = print_int(b, i);
        let body = b.block(&[stmt]);
        let for_stmt = b.for_stmt("i", range, body);
        vec![main_fn(b, &[for_stmt])]
    });

    let main = lowered.graph("main").unwrap();
    for op in [OpCode::Phi, OpCode::Less, OpCode::Branch, OpCode::Add, OpCode::Call] {
        assert_eq!(main.count(op), 1, "{op} in\n{main}");
    }
    assert_eq!(output_of(&lowered), "0\n1\n2\n3\n4\n");
}

// -----------------------------------------------------------------------
// Trait default and override
// -----------------------------------------------------------------------

fn describable(b: &mut AstBuilder, override_value: Option<i64>) -> Vec<NodeId> {
    let thing = b.struct_decl("Thing", &[]);

    let this = b.param("self", None);
    let default = b.int(99);
    let default = ret(b, default);
    let label = int_fn(b, "label", &[this], &[default]);
    let describable = b.trait_decl("Describable", &[label]);

    let methods = match override_value {
        Some(value) => {
            let this = b.param("self", None);
            let value = b.int(value);
            let value = ret(b, value);
            vec![int_fn(b, "label", &[this], &[value])]
        }
        None => Vec::new(),
    };
    let imp = b.impl_decl("Thing", Some("Describable"), &methods);

    let lit = b.struct_lit("Thing", &[]);
    let bind = b.let_stmt("t", lit);
    let t = b.ident("t");
    let call = b.method_call(t, "label", &[]);
    let result = ret(b, call);
    let main = int_fn(b, "main", &[], &[bind, result]);

    vec![thing, describable, imp, main]
}

#[test]
fn trait_default_is_instantiated_once() {
    let lowered = lower(|b| describable(b, None));
    let copies = lowered
        .graph_names()
        .filter(|name| *name == "Thing_Describable_label")
        .count();
    assert_eq!(copies, 1);

    let main = lowered.graph("main").unwrap();
    let (_, call) = main.find(OpCode::TraitMethodCall).next().unwrap();
    assert_eq!(call.data, IrData::Str("Thing_Describable_label".into()));
    assert_eq!(run(&lowered, "main", Vec::new()).0, Value::Int(99));
}

#[test]
fn trait_override_replaces_default() {
    let lowered = lower(|b| describable(b, Some(42)));
    let copies = lowered
        .graph_names()
        .filter(|name| *name == "Thing_Describable_label")
        .count();
    assert_eq!(copies, 1);
    assert_eq!(run(&lowered, "main", Vec::new()).0, Value::Int(42));
}

// -----------------------------------------------------------------------
// Match with a negated pattern
// -----------------------------------------------------------------------

#[test]
fn negated_pattern_matches_everything_else() {
    let lowered = lower(|b| {
        let x = typed_param(b, "x", "i32");
        let scrutinee = b.ident("x");
        let zero = b.int(0);
        let ten = b.int(10);
        let first = b.arm(zero, None, ten);
        let zero = b.int(0);
        let not_zero = b.negate(zero);
        let twenty = b.int(20);
        let second = b.arm(not_zero, None, twenty);
        let m = b.match_stmt(scrutinee, &[first, second]);
        let result = ret(b, m);
        vec![int_fn(b, "pick", &[x], &[result])]
    });

    let pick = lowered.graph("pick").unwrap();
    assert!(!pick.contains(OpCode::Switch));
    assert_eq!(run(&lowered, "pick", vec![Value::Int(5)]).0, Value::Int(20));
    assert_eq!(run(&lowered, "pick", vec![Value::Int(0)]).0, Value::Int(10));
}

// -----------------------------------------------------------------------
// Error unions
// -----------------------------------------------------------------------

#[test]
fn fail_returns_the_variant_code() {
    let lowered = lower(|b| {
        let set = b.error_decl("E", &["V"]);
        let e = b.ident("E");
        let variant = b.field(e, "V");
        let fail = b.fail(variant);
        let body = b.block(&[fail]);
        let ret_ty = b.error_union_ty("i32", "E");
        vec![set, b.func("f", &[], Some(ret_ty), body)]
    });

    let f = lowered.graph("f").unwrap();
    assert!(f.fallible);
    let (_, fail) = f.find(OpCode::ErrorFailConstruct).next().unwrap();
    assert_eq!(fail.data, IrData::Int(1));
    assert_eq!(run(&lowered, "f", Vec::new()).0, Value::ErrorUnion(Err(1)));
}

// -----------------------------------------------------------------------
// Structured concurrency
// -----------------------------------------------------------------------

#[test]
fn spawned_tasks_run_inside_the_nursery() {
    let lowered = lower(|b| {
        let one = b.int(1);
        let stmt = print_int(b, one);
        let body = b.block(&[stmt]);
        let worker = b.func("worker", &[], None, body);

        let n = typed_param(b, "n", "i32");
        let value = b.ident("n");
        let stmt = print_int(b, value);
        let body = b.block(&[stmt]);
        let job = b.func("job", &[n], None, body);

        let call = b.call("worker", &[]);
        let spawn = b.spawn(call);
        let first = b.expr_stmt(spawn);
        let seven = b.int(7);
        let call = b.call("job", &[seven]);
        let spawn = b.spawn(call);
        let second = b.expr_stmt(spawn);
        let block = b.block(&[first, second]);
        let nursery = b.nursery(block);
        vec![worker, job, main_fn(b, &[nursery])]
    });

    let main = lowered.graph("main").unwrap();
    let spawns: Vec<_> = main.find(OpCode::Spawn).map(|(_, node)| node).collect();
    assert_eq!(spawns.len(), 2);
    assert_eq!(spawns[0].data, IrData::Str("worker".into()));
    assert!(spawns[0].inputs.is_empty());
    assert_eq!(spawns[1].data, IrData::Str("job__spawn_thunk".into()));
    assert_eq!(spawns[1].inputs.len(), 1);
    assert!(lowered.graph("job__spawn_thunk").is_some());
    assert!(lowered.graph("worker__spawn_thunk").is_none());

    assert_eq!(output_of(&lowered), "1\n7\n");
}
