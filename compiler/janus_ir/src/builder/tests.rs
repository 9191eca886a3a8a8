use pretty_assertions::assert_eq;

use crate::{AstBuilder, NodeKind, SharedInterner, TokenKind};

#[test]
fn function_has_the_documented_child_layout() {
    let mut b = AstBuilder::new(SharedInterner::new());
    let ty = b.ty("i32");
    let x = b.param("x", Some(ty));
    let ret_ty = b.ty("i32");
    let value = b.ident("x");
    let ret = b.ret(Some(value));
    let body = b.block(&[ret]);
    let f = b.func("id", &[x], Some(ret_ty), body);
    let snap = b.finish(&[f]).unwrap();

    let kinds: Vec<NodeKind> = snap
        .children(f)
        .iter()
        .filter_map(|&c| snap.kind(c))
        .collect();
    assert_eq!(
        kinds,
        [
            NodeKind::Identifier,
            NodeKind::ParamList,
            NodeKind::TypeExpr,
            NodeKind::BlockStmt,
        ]
    );
    assert_eq!(snap.node_text(snap.children(f)[0]), Some("id"));
    assert_eq!(snap.children(snap.children(f)[1]), [x]);
    assert_eq!(snap.kind(snap.root()), Some(NodeKind::SourceFile));
    assert_eq!(snap.children(snap.root()), [f]);
}

#[test]
fn optional_children_become_empty_nodes() {
    let mut b = AstBuilder::new(SharedInterner::new());
    let m = b.abstract_method("area", &[], None);
    let cond = b.bool(true);
    let then = b.block(&[]);
    let branch = b.if_stmt(cond, then, None);
    let snap = b.finish(&[m, branch]).unwrap();

    let m_children = snap.children(m);
    assert_eq!(snap.kind(m_children[2]), Some(NodeKind::Empty));
    assert_eq!(snap.kind(m_children[3]), Some(NodeKind::Empty));
    assert_eq!(snap.kind(snap.children(branch)[2]), Some(NodeKind::Empty));
}

#[test]
fn operators_keep_their_token_kind() {
    let mut b = AstBuilder::new(SharedInterner::new());
    let l = b.ident("a");
    let r = b.ident("b");
    let and = b.binary(l, TokenKind::And, r);
    let snap = b.finish(&[and]).unwrap();

    let op = snap.node(snap.children(and)[1]).unwrap();
    assert_eq!(op.kind, NodeKind::Operator);
    assert_eq!(snap.token(op.first_token).unwrap().kind, TokenKind::And);
    assert_eq!(snap.node_text(snap.children(and)[1]), Some("and"));
}

#[test]
fn literals_carry_their_text() {
    let mut b = AstBuilder::new(SharedInterner::new());
    let i = b.int(-42);
    let f = b.float(2.5);
    let s = b.string("hello");
    let t = b.bool(false);
    let snap = b.finish(&[]).unwrap();

    assert_eq!(snap.node_text(i), Some("-42"));
    assert_eq!(snap.node_text(f), Some("2.5"));
    assert_eq!(snap.node_text(s), Some("hello"));
    assert_eq!(snap.node_text(t), Some("false"));
}

#[test]
fn set_line_moves_subsequent_tokens() {
    let mut b = AstBuilder::new(SharedInterner::new());
    let first = b.ident("a");
    b.set_line(7);
    let second = b.ident("b");
    let snap = b.finish(&[]).unwrap();

    assert_eq!(snap.node_span(first).unwrap().start_line, 1);
    let span = snap.node_span(second).unwrap();
    assert_eq!((span.start_line, span.start_col), (7, 1));
}

#[test]
fn declarations_have_expected_shapes() {
    let mut b = AstBuilder::new(SharedInterner::new());
    let point = b.struct_decl("Point", &[("x", "i32"), ("y", "i32")]);
    let err = b.error_decl("IoError", &["NotFound", "Denied"]);
    let imp = b.import(&["std", "math"]);
    let sig = b.abstract_method("add", &[], None);
    let zig = b.use_zig("native/math.zig", &[sig]);
    let inherent = b.impl_decl("Point", None, &[]);
    let snap = b.finish(&[point, err, imp, zig, inherent]).unwrap();

    assert_eq!(snap.children(point).len(), 3);
    assert_eq!(snap.kind(snap.children(point)[1]), Some(NodeKind::FieldDecl));
    let variants: Vec<_> = snap.children(err)[1..]
        .iter()
        .filter_map(|&v| snap.node_text(v))
        .collect();
    assert_eq!(variants, ["NotFound", "Denied"]);
    assert_eq!(snap.children(imp).len(), 2);
    assert_eq!(snap.node_text(snap.children(zig)[0]), Some("native/math.zig"));
    assert_eq!(snap.kind(snap.children(inherent)[1]), Some(NodeKind::Empty));
}

#[test]
fn method_call_is_call_with_field_callee() {
    let mut b = AstBuilder::new(SharedInterner::new());
    let recv = b.ident("c");
    let arg = b.int(1);
    let call = b.method_call(recv, "scale", &[arg]);
    let snap = b.finish(&[]).unwrap();

    let callee = snap.children(call)[0];
    assert_eq!(snap.kind(call), Some(NodeKind::CallExpr));
    assert_eq!(snap.kind(callee), Some(NodeKind::FieldExpr));
    assert_eq!(snap.children(callee)[0], recv);
    assert_eq!(snap.node_text(snap.children(callee)[1]), Some("scale"));
    assert_eq!(snap.children(call)[1], arg);
}
