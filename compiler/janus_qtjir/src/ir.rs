//! QTJIR: the graph IR produced by lowering.
//!
//! A graph is a flat, ordered list of [`IrNode`]s. Inputs are indices into
//! the same list. Control flow is explicit:
//!
//! - a block starts with a `Label` node (data = [`IrData::Label`])
//! - it ends with `Jump`, `Branch`, `Switch`, `Return` or `Unreachable`
//! - `Phi` nodes follow a block's `Label` and pair each input with the
//!   label of the predecessor block it flows in from
//!
//! Every non-`Phi` input points strictly backwards. `Phi` inputs may point
//! forward, which is how loop back-edges are expressed.

use std::fmt;

use smallvec::SmallVec;

mod validate;

pub use validate::{validate_graph, IrViolation};

/// Index of a node within its graph.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct IrRef(u32);

impl IrRef {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for IrRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Block label within a graph. Label 0 is the entry block.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct LabelId(u32);

impl LabelId {
    pub const ENTRY: LabelId = LabelId(0);

    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// IR operation.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum OpCode {
    // Values and memory
    Constant,
    Parameter,
    Alloca,
    Load,
    Store,

    // Arithmetic and bitwise
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Neg,
    Not,
    BitNot,

    // Comparison
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // Control flow
    Label,
    Jump,
    Branch,
    Switch,
    Phi,
    Return,
    Unreachable,

    // Calls
    Call,
    CallIndirect,

    // Aggregates
    StructAlloca,
    FieldPtr,
    ArrayAlloca,
    IndexPtr,

    // Traits
    TraitMethodCall,
    VtableConstruct,
    VtableLookup,

    // Error unions
    ErrorUnionConstruct,
    ErrorFailConstruct,
    ErrorUnionIsError,
    ErrorUnionUnwrap,
    ErrorUnionGetError,

    // Concurrency
    NurseryBegin,
    NurseryEnd,
    Spawn,
    CapturedArg,
    ChannelCreate,
    ChannelSend,
    ChannelRecv,
    ChannelTrySend,
    ChannelTryRecv,
    ChannelClose,
}

impl OpCode {
    /// Textual name used in dumps and by the emitter.
    pub const fn as_str(self) -> &'static str {
        match self {
            OpCode::Constant => "Constant",
            OpCode::Parameter => "Parameter",
            OpCode::Alloca => "Alloca",
            OpCode::Load => "Load",
            OpCode::Store => "Store",
            OpCode::Add => "Add",
            OpCode::Sub => "Sub",
            OpCode::Mul => "Mul",
            OpCode::Div => "Div",
            OpCode::Mod => "Mod",
            OpCode::BitAnd => "BitAnd",
            OpCode::BitOr => "BitOr",
            OpCode::BitXor => "BitXor",
            OpCode::Shl => "Shl",
            OpCode::Shr => "Shr",
            OpCode::Neg => "Neg",
            OpCode::Not => "Not",
            OpCode::BitNot => "BitNot",
            OpCode::Equal => "Equal",
            OpCode::NotEqual => "NotEqual",
            OpCode::Less => "Less",
            OpCode::LessEqual => "LessEqual",
            OpCode::Greater => "Greater",
            OpCode::GreaterEqual => "GreaterEqual",
            OpCode::Label => "Label",
            OpCode::Jump => "Jump",
            OpCode::Branch => "Branch",
            OpCode::Switch => "Switch",
            OpCode::Phi => "Phi",
            OpCode::Return => "Return",
            OpCode::Unreachable => "Unreachable",
            OpCode::Call => "Call",
            OpCode::CallIndirect => "Call_Indirect",
            OpCode::StructAlloca => "Struct_Alloca",
            OpCode::FieldPtr => "Field_Ptr",
            OpCode::ArrayAlloca => "Array_Alloca",
            OpCode::IndexPtr => "Index_Ptr",
            OpCode::TraitMethodCall => "Trait_Method_Call",
            OpCode::VtableConstruct => "Vtable_Construct",
            OpCode::VtableLookup => "Vtable_Lookup",
            OpCode::ErrorUnionConstruct => "Error_Union_Construct",
            OpCode::ErrorFailConstruct => "Error_Fail_Construct",
            OpCode::ErrorUnionIsError => "Error_Union_Is_Error",
            OpCode::ErrorUnionUnwrap => "Error_Union_Unwrap",
            OpCode::ErrorUnionGetError => "Error_Union_Get_Error",
            OpCode::NurseryBegin => "Nursery_Begin",
            OpCode::NurseryEnd => "Nursery_End",
            OpCode::Spawn => "Spawn",
            OpCode::CapturedArg => "Captured_Arg",
            OpCode::ChannelCreate => "Channel_Create",
            OpCode::ChannelSend => "Channel_Send",
            OpCode::ChannelRecv => "Channel_Recv",
            OpCode::ChannelTrySend => "Channel_Try_Send",
            OpCode::ChannelTryRecv => "Channel_Try_Recv",
            OpCode::ChannelClose => "Channel_Close",
        }
    }

    /// Ops that end a block.
    pub const fn is_terminator(self) -> bool {
        matches!(
            self,
            OpCode::Jump | OpCode::Branch | OpCode::Switch | OpCode::Return | OpCode::Unreachable
        )
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of an IR node.
///
/// Control-flow ops carry their targets here so block structure never has
/// to be inferred from node order.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum IrData {
    #[default]
    None,
    Int(i64),
    /// `f64` stored as bits for `Eq`/`Hash`.
    Float(u64),
    Bool(bool),
    Str(String),
    /// `Label` definition or `Jump` target.
    Label(LabelId),
    /// `Branch` targets.
    Targets {
        then_label: LabelId,
        else_label: LabelId,
    },
    /// `Phi` predecessor labels, one per input.
    Incoming(Vec<LabelId>),
    /// `Switch` cases and default target.
    Cases {
        cases: Vec<(i64, LabelId)>,
        default: LabelId,
    },
}

impl IrData {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            IrData::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            IrData::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Every label this payload mentions, definitions included.
    pub fn labels(&self) -> SmallVec<[LabelId; 4]> {
        match self {
            IrData::Label(l) => SmallVec::from_slice(&[*l]),
            IrData::Targets {
                then_label,
                else_label,
            } => SmallVec::from_slice(&[*then_label, *else_label]),
            IrData::Incoming(labels) => labels.iter().copied().collect(),
            IrData::Cases { cases, default } => cases
                .iter()
                .map(|(_, l)| *l)
                .chain(std::iter::once(*default))
                .collect(),
            _ => SmallVec::new(),
        }
    }
}

impl fmt::Display for IrData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrData::None => Ok(()),
            IrData::Int(v) => write!(f, "{v}"),
            IrData::Float(bits) => write!(f, "{:?}", f64::from_bits(*bits)),
            IrData::Bool(b) => write!(f, "{b}"),
            IrData::Str(s) => write!(f, "{s:?}"),
            IrData::Label(l) => write!(f, "{l}"),
            IrData::Targets {
                then_label,
                else_label,
            } => write!(f, "then {then_label} else {else_label}"),
            IrData::Incoming(labels) => {
                f.write_str("[")?;
                for (i, l) in labels.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{l}")?;
                }
                f.write_str("]")
            }
            IrData::Cases { cases, default } => {
                for (value, label) in cases {
                    write!(f, "{value} => {label}, ")?;
                }
                write!(f, "_ => {default}")
            }
        }
    }
}

/// One IR node.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct IrNode {
    pub op: OpCode,
    pub inputs: SmallVec<[IrRef; 4]>,
    pub data: IrData,
}

impl IrNode {
    pub fn new(op: OpCode, inputs: &[IrRef], data: IrData) -> Self {
        IrNode {
            op,
            inputs: SmallVec::from_slice(inputs),
            data,
        }
    }
}

/// The lowered form of one function, method instantiation or spawn thunk.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct IrGraph {
    pub name: String,
    pub param_count: u32,
    /// Returns an error union.
    pub fallible: bool,
    pub is_async: bool,
    pub nodes: Vec<IrNode>,
}

impl IrGraph {
    #[inline]
    pub fn node(&self, r: IrRef) -> Option<&IrNode> {
        self.nodes.get(r.index())
    }

    /// Number of nodes with the given op.
    pub fn count(&self, op: OpCode) -> usize {
        self.nodes.iter().filter(|n| n.op == op).count()
    }

    /// Check if any node has the given op.
    pub fn contains(&self, op: OpCode) -> bool {
        self.nodes.iter().any(|n| n.op == op)
    }

    /// Positions and nodes with the given op, in order.
    pub fn find(&self, op: OpCode) -> impl Iterator<Item = (IrRef, &IrNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, n)| n.op == op)
            .filter_map(|(i, n)| u32::try_from(i).ok().map(|i| (IrRef::new(i), n)))
    }

    /// Position of the `Label` node defining `label`.
    pub fn label_position(&self, label: LabelId) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.op == OpCode::Label && n.data == IrData::Label(label))
    }

    /// Names of every function this graph calls directly.
    pub fn callees(&self) -> impl Iterator<Item = &str> {
        self.nodes
            .iter()
            .filter(|n| {
                matches!(
                    n.op,
                    OpCode::Call | OpCode::TraitMethodCall | OpCode::Spawn
                )
            })
            .filter_map(|n| n.data.as_str())
    }
}

impl fmt::Display for IrGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "graph {}(params={})", self.name, self.param_count)?;
        if self.fallible {
            f.write_str(" fallible")?;
        }
        if self.is_async {
            f.write_str(" async")?;
        }
        f.write_str(":\n")?;
        for (i, node) in self.nodes.iter().enumerate() {
            write!(f, "  %{i} = {}", node.op)?;
            for (j, input) in node.inputs.iter().enumerate() {
                let sep = if j == 0 { " " } else { ", " };
                write!(f, "{sep}{input:?}")?;
            }
            if node.data != IrData::None {
                write!(f, " {{{}}}", node.data)?;
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
