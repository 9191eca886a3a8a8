//! Runtime behavior of lowered programs.

use janus_ir::{AstBuilder, NodeId, TokenKind};
use janus_qtjir::{InterpError, Interpreter, Value};
use pretty_assertions::assert_eq;

use crate::util::{int_fn, lower, main_fn, output_of, print_int, ret, run, typed_param};

fn counted_sum(b: &mut AstBuilder, start: i64, end: i64, inclusive: bool) -> Vec<NodeId> {
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
    let total_value = b.ident("total");
    let result = ret(b, total_value);
    vec![int_fn(b, "main", &[], &[total, for_stmt, result])]
}

#[test]
fn range_bounds() {
    let cases = [
        (1, 4, true, 10),
        (1, 4, false, 6),
        (0, 0, false, 0),
        (3, 3, true, 3),
        (5, 1, true, 0),
    ];
    for (start, end, inclusive, expected) in cases {
        let lowered = lower(|b| counted_sum(b, start, end, inclusive));
        assert_eq!(
            run(&lowered, "main", Vec::new()).0,
            Value::Int(expected),
            "{start}..{end} inclusive={inclusive}"
        );
    }
}

#[test]
fn while_loop_updates_vars() {
    let lowered = lower(|b| {
        let zero = b.int(0);
        let i = b.var_stmt("i", zero);
        let zero = b.int(0);
        let total = b.var_stmt("total", zero);

        let lhs = b.ident("i");
        let four = b.int(4);
        let cond = b.binary(lhs, TokenKind::Lt, four);
        let target = b.ident("total");
        let value = b.ident("i");
        let add = b.compound_assign(target, TokenKind::PlusEq, value);
        let target = b.ident("i");
        let one = b.int(1);
        let step = b.compound_assign(target, TokenKind::PlusEq, one);
        let body = b.block(&[add, step]);
        let w = b.while_stmt(cond, body);

        let value = b.ident("total");
        let result = ret(b, value);
        vec![int_fn(b, "main", &[], &[i, total, w, result])]
    });
    assert_eq!(run(&lowered, "main", Vec::new()).0, Value::Int(6));
}

#[test]
fn break_and_continue() {
    let lowered = lower(|b| {
        let lhs = b.ident("i");
        let three = b.int(3);
        let is_three = b.binary(lhs, TokenKind::EqEq, three);
        let cont = b.cont();
        let skip = b.block(&[cont]);
        let skip = b.if_stmt(is_three, skip, None);

        let lhs = b.ident("i");
        let five = b.int(5);
        let is_five = b.binary(lhs, TokenKind::EqEq, five);
        let brk = b.brk();
        let stop = b.block(&[brk]);
        let stop = b.if_stmt(is_five, stop, None);

        let i = b.ident("i");
        let print = print_int(b, i);
        let body = b.block(&[skip, stop, print]);
        let zero = b.int(0);
        let ten = b.int(10);
        let range = b.range_excl(zero, ten);
        let for_stmt = b.for_stmt("i", range, body);
        vec![main_fn(b, &[for_stmt])]
    });
    assert_eq!(output_of(&lowered), "0\n1\n2\n4\n");
}

#[test]
fn short_circuit_skips_the_right_operand() {
    let lowered = lower(|b| {
        let one = b.int(1);
        let print = print_int(b, one);
        let t = b.bool(true);
        let result = ret(b, t);
        let body = b.block(&[print, result]);
        let ret_ty = b.ty("bool");
        let side = b.func("side", &[], Some(ret_ty), body);

        let mut stmts = Vec::new();
        for (lhs, op) in [(false, TokenKind::And), (true, TokenKind::Or), (true, TokenKind::And)] {
            let lhs = b.bool(lhs);
            let call = b.call("side", &[]);
            let both = b.binary(lhs, op, call);
            stmts.push(b.expr_stmt(both));
        }
        vec![side, main_fn(b, &stmts)]
    });
    // Only `true and side()` evaluates its right side.
    assert_eq!(output_of(&lowered), "1\n");
}

#[test]
fn if_else_as_value() {
    let lowered = lower(|b| {
        let x = typed_param(b, "x", "i32");
        let lhs = b.ident("x");
        let zero = b.int(0);
        let cond = b.binary(lhs, TokenKind::Lt, zero);
        let operand = b.ident("x");
        let negated = b.unary(TokenKind::Minus, operand);
        let negated = b.expr_stmt(negated);
        let then = b.block(&[negated]);
        let same = b.ident("x");
        let same = b.expr_stmt(same);
        let otherwise = b.block(&[same]);
        let value = b.if_stmt(cond, then, Some(otherwise));
        let result = ret(b, value);
        vec![int_fn(b, "abs", &[x], &[result])]
    });
    assert_eq!(run(&lowered, "abs", vec![Value::Int(-4)]).0, Value::Int(4));
    assert_eq!(run(&lowered, "abs", vec![Value::Int(9)]).0, Value::Int(9));
}

#[test]
fn integer_switch_with_default() {
    let lowered = lower(|b| {
        let x = typed_param(b, "x", "i32");
        let scrutinee = b.ident("x");
        let mut arms = Vec::new();
        for (pattern, value) in [(1, 100), (2, 200)] {
            let pattern = b.int(pattern);
            let value = b.int(value);
            arms.push(b.arm(pattern, None, value));
        }
        let wildcard = b.wildcard();
        let fallback = b.int(-1);
        arms.push(b.arm(wildcard, None, fallback));
        let m = b.match_stmt(scrutinee, &arms);
        let result = ret(b, m);
        vec![int_fn(b, "classify", &[x], &[result])]
    });
    for (input, expected) in [(1, 100), (2, 200), (3, -1)] {
        assert_eq!(
            run(&lowered, "classify", vec![Value::Int(input)]).0,
            Value::Int(expected)
        );
    }
}

#[test]
fn postfix_guards() {
    let lowered = lower(|b| {
        let one = b.int(1);
        let print = print_int(b, one);
        let t = b.bool(true);
        let shown = b.when(print, t);
        let two = b.int(2);
        let print = print_int(b, two);
        let t = b.bool(true);
        let hidden = b.unless(print, t);
        vec![main_fn(b, &[shown, hidden])]
    });
    assert_eq!(output_of(&lowered), "1\n");
}

#[test]
fn arrays_and_struct_fields() {
    let lowered = lower(|b| {
        let point = b.struct_decl("Point", &[("x", "i32"), ("y", "i32")]);

        let elements = [10, 20, 30].map(|v| b.int(v));
        let lit = b.array_lit(&elements);
        let xs = b.let_stmt("xs", lit);
        let array = b.ident("xs");
        let one = b.int(1);
        let read = b.index(array, one);
        let print_element = print_int(b, read);

        let x = b.int(1);
        let y = b.int(2);
        let lit = b.struct_lit("Point", &[("x", x), ("y", y)]);
        let p = b.let_stmt("p", lit);
        let object = b.ident("p");
        let target = b.field(object, "x");
        let five = b.int(5);
        let assign = b.assign(target, five);
        let object = b.ident("p");
        let x = b.field(object, "x");
        let object = b.ident("p");
        let y = b.field(object, "y");
        let sum = b.binary(x, TokenKind::Plus, y);
        let print_sum = print_int(b, sum);

        vec![point, main_fn(b, &[xs, print_element, p, assign, print_sum])]
    });
    assert_eq!(output_of(&lowered), "20\n7\n");
}

#[test]
fn dyn_dispatch_through_vtable() {
    let lowered = lower(|b| {
        let square = b.struct_decl("Square", &[("side", "i32")]);
        let this = b.param("self", None);
        let ret_ty = b.ty("i32");
        let area = b.abstract_method("area", &[this], Some(ret_ty));
        let shape = b.trait_decl("Shape", &[area]);

        let this = b.param("self", None);
        let lhs = b.ident("self");
        let lhs = b.field(lhs, "side");
        let rhs = b.ident("self");
        let rhs = b.field(rhs, "side");
        let product = b.binary(lhs, TokenKind::Star, rhs);
        let result = ret(b, product);
        let area = int_fn(b, "area", &[this], &[result]);
        let imp = b.impl_decl("Square", Some("Shape"), &[area]);

        let dyn_ty = b.dyn_ty("Shape");
        let s = b.param("s", Some(dyn_ty));
        let receiver = b.ident("s");
        let call = b.method_call(receiver, "area", &[]);
        let result = ret(b, call);
        let measure = int_fn(b, "measure", &[s], &[result]);

        let five = b.int(5);
        let lit = b.struct_lit("Square", &[("side", five)]);
        let sq = b.let_stmt("sq", lit);
        let arg = b.ident("sq");
        let call = b.call("measure", &[arg]);
        let result = ret(b, call);
        let main = int_fn(b, "main", &[], &[sq, result]);
        vec![square, shape, imp, measure, main]
    });
    assert_eq!(run(&lowered, "main", Vec::new()).0, Value::Int(25));
}

/// `error E { V }` and `inner(flag) -> i32 ! E`, failing when `flag`.
fn fallible_inner(b: &mut AstBuilder) -> Vec<NodeId> {
    let set = b.error_decl("E", &["V"]);
    let flag = typed_param(b, "flag", "bool");
    let cond = b.ident("flag");
    let e = b.ident("E");
    let variant = b.field(e, "V");
    let fail = b.fail(variant);
    let then = b.block(&[fail]);
    let check = b.if_stmt(cond, then, None);
    let five = b.int(5);
    let result = ret(b, five);
    let body = b.block(&[check, result]);
    let ret_ty = b.error_union_ty("i32", "E");
    let inner = b.func("inner", &[flag], Some(ret_ty), body);
    vec![set, inner]
}

#[test]
fn catch_recovers_with_the_error_code() {
    let lowered = lower(|b| {
        let mut items = fallible_inner(b);
        let flag = typed_param(b, "flag", "bool");
        let arg = b.ident("flag");
        let call = b.call("inner", &[arg]);
        let e = b.ident("e");
        let hundred = b.int(100);
        let handled = b.binary(e, TokenKind::Plus, hundred);
        let handled = b.expr_stmt(handled);
        let handler = b.block(&[handled]);
        let caught = b.catch_expr(call, Some("e"), handler);
        let result = ret(b, caught);
        items.push(int_fn(b, "recover", &[flag], &[result]));
        items
    });
    assert_eq!(run(&lowered, "recover", vec![Value::Bool(false)]).0, Value::Int(5));
    assert_eq!(run(&lowered, "recover", vec![Value::Bool(true)]).0, Value::Int(101));
}

#[test]
fn try_propagates_errors() {
    let lowered = lower(|b| {
        let mut items = fallible_inner(b);
        let flag = typed_param(b, "flag", "bool");
        let arg = b.ident("flag");
        let call = b.call("inner", &[arg]);
        let tried = b.try_expr(call);
        let v = b.let_stmt("v", tried);
        let value = b.ident("v");
        let three = b.int(3);
        let sum = b.binary(value, TokenKind::Plus, three);
        let result = ret(b, sum);
        let body = b.block(&[v, result]);
        let ret_ty = b.error_union_ty("i32", "E");
        items.push(b.func("outer", &[flag], Some(ret_ty), body));
        items
    });
    assert_eq!(
        run(&lowered, "outer", vec![Value::Bool(false)]).0,
        Value::ErrorUnion(Ok(Box::new(Value::Int(8))))
    );
    assert_eq!(
        run(&lowered, "outer", vec![Value::Bool(true)]).0,
        Value::ErrorUnion(Err(1))
    );
}

#[test]
fn closed_channel_drains_then_reports_closed() {
    let lowered = lower(|b| {
        let channel = b.ident("Channel");
        let two = b.int(2);
        let create = b.method_call(channel, "new", &[two]);
        let ch = b.let_stmt("ch", create);
        let receiver = b.ident("ch");
        let one = b.int(1);
        let send = b.method_call(receiver, "send", &[one]);
        let send = b.expr_stmt(send);
        let receiver = b.ident("ch");
        let close = b.method_call(receiver, "close", &[]);
        let close = b.expr_stmt(close);

        let mut stmts = vec![ch, send, close];
        for _ in 0..2 {
            let receiver = b.ident("ch");
            let recv = b.method_call(receiver, "recv", &[]);
            let zero = b.int(0);
            let e = b.ident("e");
            let negated = b.binary(zero, TokenKind::Minus, e);
            let negated = b.expr_stmt(negated);
            let handler = b.block(&[negated]);
            let caught = b.catch_expr(recv, Some("e"), handler);
            stmts.push(print_int(b, caught));
        }
        vec![main_fn(b, &stmts)]
    });
    assert_eq!(output_of(&lowered), "1\n-1\n");
}

#[test]
fn runaway_loop_hits_the_step_limit() {
    let lowered = lower(|b| {
        let t = b.bool(true);
        let body = b.block(&[]);
        let w = b.while_stmt(t, body);
        vec![main_fn(b, &[w])]
    });
    let mut interp = Interpreter::new(&lowered.graphs, &lowered.trait_meta).with_step_limit(500);
    assert_eq!(interp.run("main", Vec::new()), Err(InterpError::StepLimit(500)));
}
