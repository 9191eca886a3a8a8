//! Structural guarantees of lowering, checked over generated and fixed
//! programs.

#![allow(
    clippy::doc_markdown,
    clippy::redundant_closure_for_method_calls,
    reason = "Proptest macros generate code with these patterns"
)]

use janus_ir::{AstBuilder, NodeId, TokenKind};
use janus_qtjir::{IrData, Lowerer, OpCode, Value};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::util::{assert_valid, int_fn, lower, print_int, ret, run, single_unit, try_lower, typed_param};

/// A program touching most lowering paths: traits, loops, matches,
/// error unions and spawns.
fn kitchen_sink(b: &mut AstBuilder) -> Vec<NodeId> {
    let counter = b.struct_decl("Counter", &[("count", "i32")]);
    let set = b.error_decl("Oops", &["Bad"]);

    let this = b.param("self", None);
    let zero = b.int(0);
    let zero = ret(b, zero);
    let describe = int_fn(b, "describe", &[this], &[zero]);
    let tr = b.trait_decl("Describe", &[describe]);
    let imp = b.impl_decl("Counter", Some("Describe"), &[]);

    let n = typed_param(b, "n", "i32");
    let value = b.ident("n");
    let stmt = print_int(b, value);
    let body = b.block(&[stmt]);
    let task = b.func("task", &[n], None, body);

    let flag = typed_param(b, "flag", "bool");
    let cond = b.ident("flag");
    let oops = b.ident("Oops");
    let variant = b.field(oops, "Bad");
    let fail = b.fail(variant);
    let then = b.block(&[fail]);
    let check = b.if_stmt(cond, then, None);
    let body = b.block(&[check]);
    let ret_ty = b.error_union_ty("i32", "Oops");
    let risky = b.func("risky", &[flag], Some(ret_ty), body);

    let zero = b.int(0);
    let lit = b.struct_lit("Counter", &[("count", zero)]);
    let c = b.let_stmt("c", lit);
    let receiver = b.ident("c");
    let described = b.method_call(receiver, "describe", &[]);
    let described = print_int(b, described);

    let start = b.int(0);
    let end = b.int(3);
    let range = b.range_excl(start, end);
    let i = b.ident("i");
    let scrutinee = b.ident("i");
    let one = b.int(1);
    let hit = b.call("task", &[i]);
    let hit = b.spawn(hit);
    let hit = b.expr_stmt(hit);
    let first = b.arm(one, None, hit);
    let wildcard = b.wildcard();
    let nothing = b.block(&[]);
    let second = b.arm(wildcard, None, nothing);
    let m = b.match_stmt(scrutinee, &[first, second]);
    let body = b.block(&[m]);
    let for_stmt = b.for_stmt("i", range, body);
    let nursery_body = b.block(&[for_stmt]);
    let nursery = b.nursery(nursery_body);

    let f = b.bool(false);
    let call = b.call("risky", &[f]);
    let handler = b.block(&[]);
    let caught = b.catch_expr(call, None, handler);
    let caught = b.expr_stmt(caught);

    let body = b.block(&[c, described, nursery, caught]);
    let main = b.func("main", &[], None, body);
    vec![counter, set, tr, imp, task, risky, main]
}

#[test]
fn lowering_is_deterministic() {
    let (db, unit) = single_unit(kitchen_sink);
    let first = Lowerer::new(&db).lower(unit).unwrap();
    let second = Lowerer::new(&db).lower(unit).unwrap();
    assert_eq!(first, second);

    let (other_db, other_unit) = single_unit(kitchen_sink);
    let third = Lowerer::new(&other_db).lower(other_unit).unwrap();
    assert_eq!(first.graphs, third.graphs);
}

#[test]
fn every_graph_is_well_formed() {
    let lowered = lower(kitchen_sink);
    assert_valid(&lowered);
    for graph in &lowered.graphs {
        assert_eq!(graph.nodes[0].op, OpCode::Label, "{graph}");
        assert!(
            matches!(
                graph.nodes.last().map(|n| n.op),
                Some(OpCode::Return | OpCode::Unreachable | OpCode::Jump)
            ),
            "{graph}"
        );
    }
    let (_, output) = run(&lowered, "main", Vec::new());
    assert_eq!(output, "0\n1\n");
}

#[test]
fn direct_call_targets_name_graphs() {
    let lowered = lower(kitchen_sink);
    for graph in &lowered.graphs {
        for callee in graph.callees() {
            assert!(
                lowered.graph(callee).is_some() || callee.starts_with("print"),
                "`{}` calls unknown `{callee}`",
                graph.name
            );
        }
    }
}

#[test]
fn phi_inputs_follow_incoming_labels() {
    let lowered = lower(kitchen_sink);
    for graph in &lowered.graphs {
        for (_, phi) in graph.find(OpCode::Phi) {
            let IrData::Incoming(labels) = &phi.data else {
                panic!("phi without incoming labels in\n{graph}");
            };
            assert_eq!(labels.len(), phi.inputs.len());
            assert!(labels.iter().all(|&l| graph.label_position(l).is_some()));
        }
    }
}

#[test]
fn semantic_errors_become_diagnostics() {
    let err = try_lower(|b| {
        let ok = b.block(&[]);
        let ok = b.func("fine", &[], None, ok);
        let missing = b.call("missing", &[]);
        let missing = b.expr_stmt(missing);
        let body = b.block(&[missing]);
        vec![ok, b.func("broken", &[], None, body)]
    })
    .unwrap_err();
    assert_eq!(err.code(), janus_diagnostic::ErrorCode::E4001);
    let diagnostic = err.to_diagnostic(Some("main.jan"));
    assert_eq!(diagnostic.code, janus_diagnostic::ErrorCode::E4001);
    assert!(diagnostic.message.contains("`missing`"), "{}", diagnostic.message);
}

fn sum_program(b: &mut AstBuilder, start: i64, end: i64, inclusive: bool) -> Vec<NodeId> {
    let zero = b.int(0);
    let total = b.var_stmt("total", zero);
    let start = b.int(start);
    let end = b.int(end);
    let range = if inclusive {
        b.range(start, end)
    } else {
        b.range_excl(start, end)
    };
    let target = b.ident("total");
    let i = b.ident("i");
    let add = b.compound_assign(target, TokenKind::PlusEq, i);
    let body = b.block(&[add]);
    let for_stmt = b.for_stmt("i", range, body);
    let value = b.ident("total");
    let result = ret(b, value);
    vec![int_fn(b, "main", &[], &[total, for_stmt, result])]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn counted_loops_sum_their_range(start in -20i64..20, len in 0i64..20, inclusive in any::<bool>()) {
        let end = start + len;
        let lowered = lower(|b| sum_program(b, start, end, inclusive));
        let last = if inclusive { end } else { end - 1 };
        let expected: i64 = (start..=last).sum();
        prop_assert_eq!(run(&lowered, "main", Vec::new()).0, Value::Int(expected));
    }

    #[test]
    fn switch_and_chain_agree(x in -5i64..5, switch in any::<bool>()) {
        let (db, unit) = single_unit(|b| {
            let param = typed_param(b, "x", "i32");
            let scrutinee = b.ident("x");
            let mut arms = Vec::new();
            for pattern in [-2, 0, 3] {
                let pat = b.int(pattern);
                let value = b.int(pattern * 10);
                arms.push(b.arm(pat, None, value));
            }
            let wildcard = b.wildcard();
            let fallback = b.int(7);
            arms.push(b.arm(wildcard, None, fallback));
            let m = b.match_stmt(scrutinee, &arms);
            let result = ret(b, m);
            vec![int_fn(b, "pick", &[param], &[result])]
        });
        let options = janus_qtjir::LowerOptions::default().with_switch_lowering(switch);
        let lowered = Lowerer::new(&db).with_options(options).lower(unit).unwrap();
        assert_valid(&lowered);
        prop_assert_eq!(lowered.graph("pick").unwrap().contains(OpCode::Switch), switch);

        let expected = if [-2, 0, 3].contains(&x) { x * 10 } else { 7 };
        prop_assert_eq!(run(&lowered, "pick", vec![Value::Int(x)]).0, Value::Int(expected));
    }
}
