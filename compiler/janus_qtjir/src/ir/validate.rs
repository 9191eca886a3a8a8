//! Structural checks over a finished [`IrGraph`].

use rustc_hash::{FxHashMap, FxHashSet};

use super::{IrData, IrGraph, IrRef, LabelId, OpCode};

/// A broken structural rule in an IR graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IrViolation {
    #[error("graph `{graph}` does not start with the entry label")]
    MissingEntry { graph: String },
    #[error("graph `{graph}`: node %{node} uses %{input}, which is not earlier in the graph")]
    ForwardInput { graph: String, node: u32, input: u32 },
    #[error("graph `{graph}`: phi %{node} uses %{input}, which is out of range")]
    PhiOutOfRange { graph: String, node: u32, input: u32 },
    #[error("graph `{graph}`: phi %{node} has {inputs} inputs but {labels} incoming labels")]
    PhiArity {
        graph: String,
        node: u32,
        inputs: usize,
        labels: usize,
    },
    #[error("graph `{graph}`: label {label} is defined more than once")]
    DuplicateLabel { graph: String, label: LabelId },
    #[error("graph `{graph}`: node %{node} refers to undefined label {label}")]
    UndefinedLabel {
        graph: String,
        node: u32,
        label: LabelId,
    },
    #[error("graph `{graph}`: node %{node} is malformed: {reason}")]
    Malformed {
        graph: String,
        node: u32,
        reason: &'static str,
    },
}

/// Check the structural rules every lowered graph obeys:
///
/// - the first node defines the entry label
/// - non-`Phi` inputs point strictly backwards
/// - `Phi` inputs are in range and paired one-to-one with incoming labels
/// - every label is defined once and every referenced label is defined
/// - control-flow ops carry the payload shape they need
pub fn validate_graph(graph: &IrGraph) -> Result<(), IrViolation> {
    let name = || graph.name.clone();

    match graph.nodes.first() {
        Some(first) if first.op == OpCode::Label && first.data == IrData::Label(LabelId::ENTRY) => {}
        _ => return Err(IrViolation::MissingEntry { graph: name() }),
    }

    let mut defined: FxHashSet<LabelId> = FxHashSet::default();
    let mut referenced: FxHashMap<LabelId, u32> = FxHashMap::default();
    let len = graph.nodes.len();

    for (position, node) in graph.nodes.iter().enumerate() {
        let index = u32::try_from(position).unwrap_or(u32::MAX);

        if node.op == OpCode::Phi {
            let IrData::Incoming(labels) = &node.data else {
                return Err(IrViolation::Malformed {
                    graph: name(),
                    node: index,
                    reason: "phi without incoming labels",
                });
            };
            if labels.len() != node.inputs.len() {
                return Err(IrViolation::PhiArity {
                    graph: name(),
                    node: index,
                    inputs: node.inputs.len(),
                    labels: labels.len(),
                });
            }
            if let Some(input) = node.inputs.iter().find(|r| r.index() >= len) {
                return Err(IrViolation::PhiOutOfRange {
                    graph: name(),
                    node: index,
                    input: input.raw(),
                });
            }
        } else if let Some(input) = node.inputs.iter().find(|r| r.index() >= position) {
            return Err(IrViolation::ForwardInput {
                graph: name(),
                node: index,
                input: input.raw(),
            });
        }

        check_payload(graph, index, node.op, &node.data, &node.inputs)?;

        if node.op == OpCode::Label {
            if let IrData::Label(label) = node.data {
                if !defined.insert(label) {
                    return Err(IrViolation::DuplicateLabel {
                        graph: name(),
                        label,
                    });
                }
            }
        } else {
            for label in node.data.labels() {
                referenced.entry(label).or_insert(index);
            }
        }
    }

    let mut missing: Vec<(LabelId, u32)> = referenced
        .into_iter()
        .filter(|(label, _)| !defined.contains(label))
        .collect();
    missing.sort_unstable_by_key(|&(_, node)| node);
    if let Some(&(label, node)) = missing.first() {
        return Err(IrViolation::UndefinedLabel {
            graph: name(),
            node,
            label,
        });
    }

    Ok(())
}

fn check_payload(
    graph: &IrGraph,
    node: u32,
    op: OpCode,
    data: &IrData,
    inputs: &[IrRef],
) -> Result<(), IrViolation> {
    let reason = match (op, data) {
        (OpCode::Label | OpCode::Jump, IrData::Label(_)) => return Ok(()),
        (OpCode::Label, _) => "label without a label id",
        (OpCode::Jump, _) => "jump without a target",
        (OpCode::Branch, IrData::Targets { .. }) if inputs.len() == 1 => return Ok(()),
        (OpCode::Branch, _) => "branch needs one condition and two targets",
        (OpCode::Switch, IrData::Cases { .. }) if inputs.len() == 1 => return Ok(()),
        (OpCode::Switch, _) => "switch needs one scrutinee and a case table",
        (OpCode::Return, _) if inputs.len() <= 1 => return Ok(()),
        (OpCode::Return, _) => "return takes at most one value",
        _ => return Ok(()),
    };
    Err(IrViolation::Malformed {
        graph: graph.name.clone(),
        node,
        reason,
    })
}
