//! Incremental construction of one [`IrGraph`].
//!
//! Follows the "open a block, emit, terminate" pattern: the builder always
//! has a current block, starting with the entry label `L0`. Terminators
//! close it; [`IrBuilder::start_label`] opens the next one, inserting a
//! fall-through `Jump` if the previous block was left open.

use crate::ir::{validate_graph, IrData, IrGraph, IrNode, IrRef, LabelId, OpCode};

/// Builder for an in-progress IR graph.
pub struct IrBuilder {
    name: String,
    nodes: Vec<IrNode>,
    next_label: u32,
    current: LabelId,
    terminated: bool,
}

impl IrBuilder {
    /// Create a builder whose entry block is already open.
    pub fn new(name: impl Into<String>) -> Self {
        let mut builder = IrBuilder {
            name: name.into(),
            nodes: Vec::new(),
            next_label: 1,
            current: LabelId::ENTRY,
            terminated: false,
        };
        builder.push(OpCode::Label, &[], IrData::Label(LabelId::ENTRY));
        builder
    }

    /// Name of the graph being built.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of nodes emitted so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // Block management

    /// Allocate a label without placing it.
    pub fn new_label(&mut self) -> LabelId {
        let label = LabelId::new(self.next_label);
        self.next_label += 1;
        label
    }

    /// Place `label` and make it the current block.
    pub fn start_label(&mut self, label: LabelId) {
        if !self.terminated {
            self.push(OpCode::Jump, &[], IrData::Label(label));
        }
        self.push(OpCode::Label, &[], IrData::Label(label));
        self.current = label;
        self.terminated = false;
    }

    /// Label of the block being built.
    #[inline]
    pub fn current_label(&self) -> LabelId {
        self.current
    }

    /// Check whether the current block already ended with a terminator.
    #[inline]
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    // Emission

    #[expect(
        clippy::cast_possible_truncation,
        reason = "graph node counts never exceed u32"
    )]
    fn push(&mut self, op: OpCode, inputs: &[IrRef], data: IrData) -> IrRef {
        let r = IrRef::new(self.nodes.len() as u32);
        self.nodes.push(IrNode::new(op, inputs, data));
        r
    }

    /// Emit a non-terminator node into the current block.
    ///
    /// Code after a terminator lands in a fresh block with no predecessors.
    pub fn emit(&mut self, op: OpCode, inputs: &[IrRef], data: IrData) -> IrRef {
        debug_assert!(
            !op.is_terminator() && op != OpCode::Label && op != OpCode::Phi,
            "{op} must go through its dedicated builder method"
        );
        if self.terminated {
            let dead = self.new_label();
            tracing::trace!(graph = %self.name, label = %dead, "emitting into unreachable block");
            self.start_label(dead);
        }
        self.push(op, inputs, data)
    }

    pub fn const_int(&mut self, value: i64) -> IrRef {
        self.emit(OpCode::Constant, &[], IrData::Int(value))
    }

    pub fn const_float(&mut self, value: f64) -> IrRef {
        self.emit(OpCode::Constant, &[], IrData::Float(value.to_bits()))
    }

    pub fn const_bool(&mut self, value: bool) -> IrRef {
        self.emit(OpCode::Constant, &[], IrData::Bool(value))
    }

    pub fn const_str(&mut self, value: impl Into<String>) -> IrRef {
        self.emit(OpCode::Constant, &[], IrData::Str(value.into()))
    }

    /// The unit value.
    pub fn const_none(&mut self) -> IrRef {
        self.emit(OpCode::Constant, &[], IrData::None)
    }

    /// Phi merging `(value, predecessor)` pairs. Must directly follow the
    /// block's label or another phi.
    pub fn phi(&mut self, incoming: &[(IrRef, LabelId)]) -> IrRef {
        debug_assert!(
            matches!(
                self.nodes.last().map(|n| n.op),
                Some(OpCode::Label | OpCode::Phi)
            ),
            "phi must lead its block"
        );
        let inputs: Vec<IrRef> = incoming.iter().map(|(v, _)| *v).collect();
        let labels = incoming.iter().map(|(_, l)| *l).collect();
        self.push(OpCode::Phi, &inputs, IrData::Incoming(labels))
    }

    /// Add a predecessor to an existing phi, used to close loop back-edges.
    pub fn add_phi_incoming(&mut self, phi: IrRef, value: IrRef, from: LabelId) {
        match self.nodes.get_mut(phi.index()) {
            Some(IrNode {
                op: OpCode::Phi,
                inputs,
                data: IrData::Incoming(labels),
            }) => {
                inputs.push(value);
                labels.push(from);
            }
            _ => tracing::warn!(graph = %self.name, ?phi, "back-edge target is not a phi"),
        }
    }

    // Terminators. Each is a no-op if the block is already closed.

    pub fn jump(&mut self, target: LabelId) {
        self.terminate(OpCode::Jump, &[], IrData::Label(target));
    }

    pub fn branch(&mut self, cond: IrRef, then_label: LabelId, else_label: LabelId) {
        self.terminate(
            OpCode::Branch,
            &[cond],
            IrData::Targets {
                then_label,
                else_label,
            },
        );
    }

    pub fn switch(&mut self, scrutinee: IrRef, cases: Vec<(i64, LabelId)>, default: LabelId) {
        self.terminate(OpCode::Switch, &[scrutinee], IrData::Cases { cases, default });
    }

    pub fn ret(&mut self, value: Option<IrRef>) {
        match value {
            Some(value) => self.terminate(OpCode::Return, &[value], IrData::None),
            None => self.terminate(OpCode::Return, &[], IrData::None),
        }
    }

    pub fn unreachable(&mut self) {
        self.terminate(OpCode::Unreachable, &[], IrData::None);
    }

    fn terminate(&mut self, op: OpCode, inputs: &[IrRef], data: IrData) {
        if self.terminated {
            return;
        }
        self.push(op, inputs, data);
        self.terminated = true;
    }

    /// Finish the graph. An open final block is closed with `Unreachable`.
    pub fn finish(mut self, param_count: u32, fallible: bool, is_async: bool) -> IrGraph {
        if !self.terminated {
            tracing::warn!(graph = %self.name, label = %self.current, "final block left open");
            self.unreachable();
        }
        let graph = IrGraph {
            name: self.name,
            param_count,
            fallible,
            is_async,
            nodes: self.nodes,
        };
        debug_assert!(
            validate_graph(&graph).is_ok(),
            "invalid graph: {:?}",
            validate_graph(&graph)
        );
        graph
    }
}
