use pretty_assertions::assert_eq;

use super::*;

fn label(n: u32) -> IrNode {
    IrNode::new(OpCode::Label, &[], IrData::Label(LabelId::new(n)))
}

fn graph(nodes: Vec<IrNode>) -> IrGraph {
    IrGraph {
        name: "g".to_string(),
        param_count: 0,
        fallible: false,
        is_async: false,
        nodes,
    }
}

#[test]
fn opcode_names_match_emitter_spelling() {
    assert_eq!(OpCode::TraitMethodCall.as_str(), "Trait_Method_Call");
    assert_eq!(OpCode::CallIndirect.to_string(), "Call_Indirect");
    assert_eq!(OpCode::ErrorUnionGetError.as_str(), "Error_Union_Get_Error");
    assert_eq!(OpCode::Phi.as_str(), "Phi");
}

#[test]
fn terminators() {
    assert!(OpCode::Jump.is_terminator());
    assert!(OpCode::Unreachable.is_terminator());
    assert!(!OpCode::Label.is_terminator());
    assert!(!OpCode::Call.is_terminator());
}

#[test]
fn data_labels_cover_every_target() {
    let cases = IrData::Cases {
        cases: vec![(1, LabelId::new(2)), (2, LabelId::new(3))],
        default: LabelId::new(4),
    };
    assert_eq!(
        cases.labels().to_vec(),
        vec![LabelId::new(2), LabelId::new(3), LabelId::new(4)]
    );
    assert!(IrData::Int(3).labels().is_empty());
}

#[test]
fn display_dump_is_stable() {
    let g = graph(vec![
        label(0),
        IrNode::new(OpCode::Constant, &[], IrData::Int(7)),
        IrNode::new(OpCode::Return, &[IrRef::new(1)], IrData::None),
    ]);
    assert_eq!(
        g.to_string(),
        "graph g(params=0):\n  %0 = Label {L0}\n  %1 = Constant {7}\n  %2 = Return %1\n"
    );
}

#[test]
fn find_and_count() {
    let g = graph(vec![
        label(0),
        IrNode::new(OpCode::Constant, &[], IrData::Int(1)),
        IrNode::new(OpCode::Constant, &[], IrData::Int(2)),
        IrNode::new(OpCode::Call, &[IrRef::new(1)], IrData::Str("f".into())),
        IrNode::new(OpCode::Return, &[], IrData::None),
    ]);
    assert_eq!(g.count(OpCode::Constant), 2);
    assert!(g.contains(OpCode::Call));
    assert!(!g.contains(OpCode::Phi));
    assert_eq!(g.find(OpCode::Call).map(|(r, _)| r).collect::<Vec<_>>(), vec![IrRef::new(3)]);
    assert_eq!(g.callees().collect::<Vec<_>>(), vec!["f"]);
    assert_eq!(g.label_position(LabelId::ENTRY), Some(0));
}

#[test]
fn valid_loop_with_back_edge_phi() {
    // L0: c0 = 0; jump L1
    // L1: i = phi [c0 from L0, next from L2]; br cond L2 L3
    // L2: next = i + 1; jump L1
    // L3: return
    let g = graph(vec![
        label(0),
        IrNode::new(OpCode::Constant, &[], IrData::Int(0)),
        IrNode::new(OpCode::Jump, &[], IrData::Label(LabelId::new(1))),
        label(1),
        IrNode::new(
            OpCode::Phi,
            &[IrRef::new(1), IrRef::new(9)],
            IrData::Incoming(vec![LabelId::new(0), LabelId::new(2)]),
        ),
        IrNode::new(OpCode::Constant, &[], IrData::Int(5)),
        IrNode::new(OpCode::Less, &[IrRef::new(4), IrRef::new(5)], IrData::None),
        IrNode::new(
            OpCode::Branch,
            &[IrRef::new(6)],
            IrData::Targets {
                then_label: LabelId::new(2),
                else_label: LabelId::new(3),
            },
        ),
        label(2),
        IrNode::new(OpCode::Add, &[IrRef::new(4), IrRef::new(5)], IrData::None),
        IrNode::new(OpCode::Jump, &[], IrData::Label(LabelId::new(1))),
        label(3),
        IrNode::new(OpCode::Return, &[], IrData::None),
    ]);
    assert_eq!(validate_graph(&g), Ok(()));
}

#[test]
fn forward_input_rejected() {
    let g = graph(vec![
        label(0),
        IrNode::new(OpCode::Return, &[IrRef::new(2)], IrData::None),
        IrNode::new(OpCode::Constant, &[], IrData::Int(1)),
    ]);
    assert!(matches!(
        validate_graph(&g),
        Err(IrViolation::ForwardInput { node: 1, input: 2, .. })
    ));
}

#[test]
fn self_input_rejected() {
    let g = graph(vec![
        label(0),
        IrNode::new(OpCode::Neg, &[IrRef::new(1)], IrData::None),
    ]);
    assert!(matches!(
        validate_graph(&g),
        Err(IrViolation::ForwardInput { node: 1, input: 1, .. })
    ));
}

#[test]
fn phi_arity_mismatch_rejected() {
    let g = graph(vec![
        label(0),
        IrNode::new(OpCode::Constant, &[], IrData::Int(1)),
        IrNode::new(
            OpCode::Phi,
            &[IrRef::new(1)],
            IrData::Incoming(vec![LabelId::new(0), LabelId::new(0)]),
        ),
    ]);
    assert!(matches!(
        validate_graph(&g),
        Err(IrViolation::PhiArity { inputs: 1, labels: 2, .. })
    ));
}

#[test]
fn phi_out_of_range_rejected() {
    let g = graph(vec![
        label(0),
        IrNode::new(
            OpCode::Phi,
            &[IrRef::new(40)],
            IrData::Incoming(vec![LabelId::new(0)]),
        ),
    ]);
    assert!(matches!(
        validate_graph(&g),
        Err(IrViolation::PhiOutOfRange { input: 40, .. })
    ));
}

#[test]
fn label_rules() {
    let duplicate = graph(vec![label(0), label(0)]);
    assert!(matches!(
        validate_graph(&duplicate),
        Err(IrViolation::DuplicateLabel { .. })
    ));

    let undefined = graph(vec![
        label(0),
        IrNode::new(OpCode::Jump, &[], IrData::Label(LabelId::new(9))),
    ]);
    assert!(matches!(
        validate_graph(&undefined),
        Err(IrViolation::UndefinedLabel { node: 1, .. })
    ));

    let no_entry = graph(vec![IrNode::new(OpCode::Return, &[], IrData::None)]);
    assert!(matches!(
        validate_graph(&no_entry),
        Err(IrViolation::MissingEntry { .. })
    ));
}

#[test]
fn malformed_branch_rejected() {
    let g = graph(vec![
        label(0),
        IrNode::new(OpCode::Branch, &[], IrData::Label(LabelId::new(0))),
    ]);
    assert!(matches!(
        validate_graph(&g),
        Err(IrViolation::Malformed { node: 1, .. })
    ));
}
