//! Reference interpreter for QTJIR graphs.
//!
//! Runs lowered graphs directly so tests can check behaviour, not just
//! shape. The task model is blocking: a spawned task runs to completion at
//! its spawn point, and channel operations that would need a scheduler
//! fail with `WouldBlock`. Native functions other than the runtime
//! builtins cannot be executed.

use std::collections::VecDeque;
use std::fmt;

use janus_stack::ensure_sufficient_stack;
use rustc_hash::FxHashMap;

use crate::ir::{IrData, IrGraph, IrNode, LabelId, OpCode};
use crate::TraitMeta;

/// Steps a run may take before it is treated as runaway.
pub const DEFAULT_STEP_LIMIT: u64 = 1_000_000;

const MAX_CALL_DEPTH: usize = 4096;

/// Codes of `ChannelError.Closed` and `ChannelError.WouldBlock`.
const CHANNEL_CLOSED: i64 = 1;
const CHANNEL_WOULD_BLOCK: i64 = 2;

/// Runtime value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Unit,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    /// Address of a slot in an allocated record.
    Ptr { record: usize, offset: usize },
    /// A value paired with the `Type_Trait` qualifier of its vtable.
    Vtable { qualifier: String, data: Box<Value> },
    FnRef(String),
    /// `Ok(payload)` or `Err(error code)`.
    ErrorUnion(Result<Box<Value>, i64>),
    Channel(usize),
}

impl Value {
    fn kind_name(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Ptr { .. } => "pointer",
            Value::Vtable { .. } => "vtable",
            Value::FnRef(_) => "function reference",
            Value::ErrorUnion(_) => "error union",
            Value::Channel(_) => "channel",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => f.write_str("()"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Str(v) => f.write_str(v),
            Value::Ptr { record, offset } => write!(f, "<ptr {record}+{offset}>"),
            Value::Vtable { qualifier, data } => write!(f, "<{qualifier} {data}>"),
            Value::FnRef(name) => write!(f, "<fn {name}>"),
            Value::ErrorUnion(Ok(payload)) => write!(f, "ok({payload})"),
            Value::ErrorUnion(Err(code)) => write!(f, "error({code})"),
            Value::Channel(id) => write!(f, "<channel {id}>"),
        }
    }
}

/// Error raised while running graphs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InterpError {
    #[error("no graph or builtin named `{0}`")]
    NativeCall(String),
    #[error("step limit of {0} exceeded")]
    StepLimit(u64),
    #[error("call depth limit of {0} exceeded")]
    CallDepth(usize),
    #[error("division by zero in `{graph}`")]
    DivisionByZero { graph: String },
    #[error("reached `Unreachable` in `{graph}`")]
    Unreachable { graph: String },
    #[error("panic: {0}")]
    Panic(String),
    #[error("`{op}` in `{graph}` cannot take a {found} operand")]
    TypeMismatch {
        graph: String,
        op: OpCode,
        found: &'static str,
    },
    #[error("index {index} is out of bounds for length {len}")]
    IndexOutOfBounds { index: i64, len: usize },
    #[error("unwrapped an error union holding error {0}")]
    UnwrapError(i64),
    #[error("no vtable entry for `{0}`")]
    MissingVtable(String),
    #[error("malformed graph `{graph}`: {reason}")]
    Malformed { graph: String, reason: &'static str },
}

struct Record {
    slots: Vec<Value>,
    /// Fixed length for arrays and `Alloca` slots; structs grow on store.
    len: Option<usize>,
}

struct Channel {
    buffer: VecDeque<Value>,
    capacity: usize,
    closed: bool,
}

/// Executes a set of graphs against their trait metadata.
pub struct Interpreter<'ir> {
    graphs: FxHashMap<&'ir str, &'ir IrGraph>,
    labels: FxHashMap<&'ir str, FxHashMap<LabelId, usize>>,
    trait_meta: &'ir TraitMeta,
    records: Vec<Record>,
    channels: Vec<Channel>,
    output: String,
    steps: u64,
    step_limit: u64,
    depth: usize,
}

fn mismatch(graph: &IrGraph, op: OpCode, found: &Value) -> InterpError {
    InterpError::TypeMismatch {
        graph: graph.name.clone(),
        op,
        found: found.kind_name(),
    }
}

fn malformed(graph: &IrGraph, reason: &'static str) -> InterpError {
    InterpError::Malformed {
        graph: graph.name.clone(),
        reason,
    }
}

fn int_op(graph: &IrGraph, op: OpCode, a: i64, b: i64) -> Result<Value, InterpError> {
    let shift = |b: i64| u32::try_from(b.rem_euclid(64)).unwrap_or(0);
    let value = match op {
        OpCode::Add => a.wrapping_add(b),
        OpCode::Sub => a.wrapping_sub(b),
        OpCode::Mul => a.wrapping_mul(b),
        OpCode::Div | OpCode::Mod if b == 0 => {
            return Err(InterpError::DivisionByZero {
                graph: graph.name.clone(),
            })
        }
        OpCode::Div => a.wrapping_div(b),
        OpCode::Mod => a.wrapping_rem(b),
        OpCode::BitAnd => a & b,
        OpCode::BitOr => a | b,
        OpCode::BitXor => a ^ b,
        OpCode::Shl => a.wrapping_shl(shift(b)),
        OpCode::Shr => a.wrapping_shr(shift(b)),
        _ => return Err(malformed(graph, "not an arithmetic operation")),
    };
    Ok(Value::Int(value))
}

fn arith(graph: &IrGraph, op: OpCode, lhs: &Value, rhs: &Value) -> Result<Value, InterpError> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => int_op(graph, op, *a, *b),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(match op {
            OpCode::Add => a + b,
            OpCode::Sub => a - b,
            OpCode::Mul => a * b,
            OpCode::Div => a / b,
            OpCode::Mod => a % b,
            _ => return Err(mismatch(graph, op, lhs)),
        })),
        (Value::Str(a), Value::Str(b)) if op == OpCode::Add => Ok(Value::Str(format!("{a}{b}"))),
        (Value::Int(_) | Value::Float(_) | Value::Str(_), other) | (other, _) => {
            Err(mismatch(graph, op, other))
        }
    }
}

fn compare(graph: &IrGraph, op: OpCode, lhs: &Value, rhs: &Value) -> Result<Value, InterpError> {
    let ordering = match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
        _ if matches!(op, OpCode::Equal | OpCode::NotEqual) => {
            return Ok(Value::Bool((lhs == rhs) == (op == OpCode::Equal)));
        }
        _ => return Err(mismatch(graph, op, lhs)),
    };
    let Some(ordering) = ordering else {
        return Ok(Value::Bool(op == OpCode::NotEqual));
    };
    let result = match op {
        OpCode::Equal => ordering.is_eq(),
        OpCode::NotEqual => ordering.is_ne(),
        OpCode::Less => ordering.is_lt(),
        OpCode::LessEqual => ordering.is_le(),
        OpCode::Greater => ordering.is_gt(),
        OpCode::GreaterEqual => ordering.is_ge(),
        _ => return Err(malformed(graph, "not a comparison")),
    };
    Ok(Value::Bool(result))
}

impl<'ir> Interpreter<'ir> {
    pub fn new(graphs: &'ir [IrGraph], trait_meta: &'ir TraitMeta) -> Self {
        let labels = graphs
            .iter()
            .map(|graph| {
                let positions = graph
                    .nodes
                    .iter()
                    .enumerate()
                    .filter_map(|(pos, node)| match (node.op, &node.data) {
                        (OpCode::Label, IrData::Label(label)) => Some((*label, pos)),
                        _ => None,
                    })
                    .collect();
                (graph.name.as_str(), positions)
            })
            .collect();
        Interpreter {
            graphs: graphs.iter().map(|g| (g.name.as_str(), g)).collect(),
            labels,
            trait_meta,
            records: Vec::new(),
            channels: Vec::new(),
            output: String::new(),
            steps: 0,
            step_limit: DEFAULT_STEP_LIMIT,
            depth: 0,
        }
    }

    #[must_use]
    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = limit;
        self
    }

    /// Run `entry` with `args` and return its result.
    pub fn run(&mut self, entry: &str, args: Vec<Value>) -> Result<Value, InterpError> {
        tracing::debug!(entry, "interpreting");
        self.call(entry, args, &[])
    }

    /// Text written by the print builtins so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Steps taken so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn call(&mut self, name: &str, args: Vec<Value>, captured: &[Value]) -> Result<Value, InterpError> {
        let Some(&graph) = self.graphs.get(name) else {
            return self.builtin(name, args);
        };
        if self.depth >= MAX_CALL_DEPTH {
            return Err(InterpError::CallDepth(MAX_CALL_DEPTH));
        }
        self.depth += 1;
        let result = ensure_sufficient_stack(|| self.execute(graph, &args, captured));
        self.depth -= 1;
        result
    }

    fn label_position(&self, graph: &IrGraph, label: LabelId) -> Result<usize, InterpError> {
        self.labels
            .get(graph.name.as_str())
            .and_then(|labels| labels.get(&label))
            .copied()
            .ok_or_else(|| malformed(graph, "jump to an undefined label"))
    }

    fn execute(
        &mut self,
        graph: &'ir IrGraph,
        args: &[Value],
        captured: &[Value],
    ) -> Result<Value, InterpError> {
        let mut values = vec![Value::Unit; graph.nodes.len()];
        let mut pc = 0;
        let mut current = LabelId::ENTRY;
        let mut previous = LabelId::ENTRY;

        loop {
            self.steps += 1;
            if self.steps > self.step_limit {
                return Err(InterpError::StepLimit(self.step_limit));
            }
            let Some(node) = graph.nodes.get(pc) else {
                return Err(malformed(graph, "ran past the last node"));
            };
            let input = |i: usize| {
                node.inputs
                    .get(i)
                    .and_then(|r| values.get(r.index()))
                    .ok_or_else(|| malformed(graph, "missing input"))
            };

            pc = match (node.op, &node.data) {
                (OpCode::Label, IrData::Label(label)) => {
                    current = *label;
                    pc + 1
                }
                (OpCode::Jump, IrData::Label(target)) => {
                    previous = current;
                    self.label_position(graph, *target)?
                }
                (
                    OpCode::Branch,
                    IrData::Targets {
                        then_label,
                        else_label,
                    },
                ) => {
                    let target = match input(0)? {
                        Value::Bool(true) => *then_label,
                        Value::Bool(false) => *else_label,
                        other => return Err(mismatch(graph, node.op, other)),
                    };
                    previous = current;
                    self.label_position(graph, target)?
                }
                (OpCode::Switch, IrData::Cases { cases, default }) => {
                    let Value::Int(scrutinee) = input(0)? else {
                        return Err(mismatch(graph, node.op, input(0)?));
                    };
                    let target = cases
                        .iter()
                        .find(|(value, _)| value == scrutinee)
                        .map_or(*default, |(_, label)| *label);
                    previous = current;
                    self.label_position(graph, target)?
                }
                (OpCode::Phi, IrData::Incoming(labels)) => {
                    let Some(slot) = labels.iter().position(|&l| l == previous) else {
                        return Err(malformed(graph, "phi has no input for its predecessor"));
                    };
                    let value = input(slot)?.clone();
                    values[pc] = value;
                    pc + 1
                }
                (OpCode::Return, _) => {
                    return Ok(match node.inputs.first() {
                        Some(_) => input(0)?.clone(),
                        None => Value::Unit,
                    });
                }
                (OpCode::Unreachable, _) => {
                    return Err(InterpError::Unreachable {
                        graph: graph.name.clone(),
                    });
                }
                (OpCode::Label | OpCode::Jump | OpCode::Branch | OpCode::Switch | OpCode::Phi, _) => {
                    return Err(malformed(graph, "control node with the wrong payload"));
                }
                _ => {
                    let inputs: Vec<Value> = node
                        .inputs
                        .iter()
                        .map(|r| values.get(r.index()).cloned().unwrap_or(Value::Unit))
                        .collect();
                    values[pc] = self.eval(graph, node, inputs, args, captured)?;
                    pc + 1
                }
            };
        }
    }

    /// A data node. `inputs` are the resolved input values.
    fn eval(
        &mut self,
        graph: &IrGraph,
        node: &IrNode,
        mut inputs: Vec<Value>,
        args: &[Value],
        captured: &[Value],
    ) -> Result<Value, InterpError> {
        let op = node.op;
        let operand = |i: usize| inputs.get(i).ok_or_else(|| malformed(graph, "missing input"));
        let index = || {
            node.data
                .as_int()
                .and_then(|i| usize::try_from(i).ok())
                .ok_or_else(|| malformed(graph, "expected an index payload"))
        };
        let target = || {
            node.data
                .as_str()
                .ok_or_else(|| malformed(graph, "expected a name payload"))
        };

        match op {
            OpCode::Constant => Ok(match &node.data {
                IrData::Int(v) => Value::Int(*v),
                IrData::Float(bits) => Value::Float(f64::from_bits(*bits)),
                IrData::Bool(v) => Value::Bool(*v),
                IrData::Str(v) => Value::Str(v.clone()),
                _ => Value::Unit,
            }),
            OpCode::Parameter => args
                .get(index()?)
                .cloned()
                .ok_or_else(|| malformed(graph, "parameter index out of range")),
            OpCode::CapturedArg => captured
                .get(index()?)
                .cloned()
                .ok_or_else(|| malformed(graph, "captured index out of range")),

            OpCode::Add
            | OpCode::Sub
            | OpCode::Mul
            | OpCode::Div
            | OpCode::Mod
            | OpCode::BitAnd
            | OpCode::BitOr
            | OpCode::BitXor
            | OpCode::Shl
            | OpCode::Shr => arith(graph, op, operand(0)?, operand(1)?),
            OpCode::Equal
            | OpCode::NotEqual
            | OpCode::Less
            | OpCode::LessEqual
            | OpCode::Greater
            | OpCode::GreaterEqual => compare(graph, op, operand(0)?, operand(1)?),
            OpCode::Neg => match operand(0)? {
                Value::Int(v) => Ok(Value::Int(v.wrapping_neg())),
                Value::Float(v) => Ok(Value::Float(-v)),
                other => Err(mismatch(graph, op, other)),
            },
            OpCode::Not => match operand(0)? {
                Value::Bool(v) => Ok(Value::Bool(!v)),
                other => Err(mismatch(graph, op, other)),
            },
            OpCode::BitNot => match operand(0)? {
                Value::Int(v) => Ok(Value::Int(!v)),
                other => Err(mismatch(graph, op, other)),
            },

            OpCode::Alloca => Ok(self.allocate(Some(1))),
            OpCode::StructAlloca => Ok(self.allocate(None)),
            OpCode::ArrayAlloca => {
                let len = index()?;
                Ok(self.allocate(Some(len)))
            }
            OpCode::FieldPtr => {
                let offset = index()?;
                match operand(0)? {
                    Value::Ptr { record, offset: base } => Ok(Value::Ptr {
                        record: *record,
                        offset: base + offset,
                    }),
                    other => Err(mismatch(graph, op, other)),
                }
            }
            OpCode::IndexPtr => match (operand(0)?, operand(1)?) {
                (Value::Ptr { record, offset }, Value::Int(i)) => {
                    let Ok(i) = usize::try_from(*i) else {
                        return Err(InterpError::IndexOutOfBounds {
                            index: *i,
                            len: self.records.get(*record).and_then(|r| r.len).unwrap_or(0),
                        });
                    };
                    Ok(Value::Ptr {
                        record: *record,
                        offset: offset + i,
                    })
                }
                (Value::Ptr { .. }, other) | (other, _) => Err(mismatch(graph, op, other)),
            },
            OpCode::Load => self.load(graph, op, operand(0)?),
            OpCode::Store => {
                let value = operand(1)?.clone();
                self.store(graph, op, operand(0)?, value)?;
                Ok(Value::Unit)
            }

            OpCode::Call => {
                let target = target()?;
                self.call(target, inputs, &[])
            }
            OpCode::TraitMethodCall => {
                let target = target()?;
                self.call(target, inputs, &[])
            }
            OpCode::CallIndirect => {
                if inputs.len() < 2 {
                    return Err(malformed(graph, "indirect call without a receiver"));
                }
                let mut rest = inputs.split_off(1);
                let Value::FnRef(name) = &inputs[0] else {
                    return Err(mismatch(graph, op, &inputs[0]));
                };
                if let Value::Vtable { data, .. } = &rest[0] {
                    rest[0] = (**data).clone();
                }
                self.call(name, rest, &[])
            }
            OpCode::VtableConstruct => Ok(Value::Vtable {
                qualifier: target()?.to_string(),
                data: Box::new(operand(0)?.clone()),
            }),
            OpCode::VtableLookup => {
                let Value::Vtable { qualifier, .. } = operand(0)? else {
                    return Err(mismatch(graph, op, operand(0)?));
                };
                let slot = index()?;
                self.trait_meta
                    .impl_by_vtable(qualifier)
                    .and_then(|imp| imp.methods.get(slot))
                    .map(|name| Value::FnRef(name.clone()))
                    .ok_or_else(|| InterpError::MissingVtable(format!("{qualifier}[{slot}]")))
            }

            OpCode::ErrorUnionConstruct => {
                let payload = inputs.first().cloned().unwrap_or(Value::Unit);
                Ok(Value::ErrorUnion(Ok(Box::new(payload))))
            }
            OpCode::ErrorFailConstruct => {
                let code = node
                    .data
                    .as_int()
                    .ok_or_else(|| malformed(graph, "error without a code"))?;
                Ok(Value::ErrorUnion(Err(code)))
            }
            OpCode::ErrorUnionIsError => match operand(0)? {
                Value::ErrorUnion(result) => Ok(Value::Bool(result.is_err())),
                other => Err(mismatch(graph, op, other)),
            },
            OpCode::ErrorUnionUnwrap => match operand(0)? {
                Value::ErrorUnion(Ok(payload)) => Ok((**payload).clone()),
                Value::ErrorUnion(Err(code)) => Err(InterpError::UnwrapError(*code)),
                other => Err(mismatch(graph, op, other)),
            },
            OpCode::ErrorUnionGetError => match operand(0)? {
                Value::ErrorUnion(Err(code)) => Ok(Value::Int(*code)),
                Value::ErrorUnion(Ok(_)) => Ok(Value::Int(0)),
                other => Err(mismatch(graph, op, other)),
            },

            OpCode::NurseryBegin | OpCode::NurseryEnd => Ok(Value::Unit),
            OpCode::Spawn => {
                let target = target()?;
                tracing::trace!(task = target, "running spawned task");
                self.call(target, Vec::new(), &inputs)?;
                Ok(Value::Unit)
            }

            OpCode::ChannelCreate => match operand(0)? {
                Value::Int(capacity) => {
                    let capacity = usize::try_from(*capacity).unwrap_or(0).max(1);
                    self.channels.push(Channel {
                        buffer: VecDeque::with_capacity(capacity),
                        capacity,
                        closed: false,
                    });
                    Ok(Value::Channel(self.channels.len() - 1))
                }
                other => Err(mismatch(graph, op, other)),
            },
            OpCode::ChannelSend | OpCode::ChannelTrySend => {
                let value = operand(1)?.clone();
                let channel = self.channel(graph, op, operand(0)?)?;
                let result = if channel.closed {
                    Err(CHANNEL_CLOSED)
                } else if channel.buffer.len() >= channel.capacity {
                    Err(CHANNEL_WOULD_BLOCK)
                } else {
                    channel.buffer.push_back(value);
                    Ok(Box::new(Value::Unit))
                };
                Ok(Value::ErrorUnion(result))
            }
            OpCode::ChannelRecv | OpCode::ChannelTryRecv => {
                let channel = self.channel(graph, op, operand(0)?)?;
                let result = match channel.buffer.pop_front() {
                    Some(value) => Ok(Box::new(value)),
                    None if channel.closed => Err(CHANNEL_CLOSED),
                    None => Err(CHANNEL_WOULD_BLOCK),
                };
                Ok(Value::ErrorUnion(result))
            }
            OpCode::ChannelClose => {
                self.channel(graph, op, operand(0)?)?.closed = true;
                Ok(Value::Unit)
            }

            OpCode::Label
            | OpCode::Jump
            | OpCode::Branch
            | OpCode::Switch
            | OpCode::Phi
            | OpCode::Return
            | OpCode::Unreachable => Err(malformed(graph, "control node evaluated as data")),
        }
    }

    fn allocate(&mut self, len: Option<usize>) -> Value {
        self.records.push(Record {
            slots: vec![Value::Unit; len.unwrap_or(0)],
            len,
        });
        Value::Ptr {
            record: self.records.len() - 1,
            offset: 0,
        }
    }

    fn load(&self, graph: &IrGraph, op: OpCode, ptr: &Value) -> Result<Value, InterpError> {
        let Value::Ptr { record, offset } = ptr else {
            return Err(mismatch(graph, op, ptr));
        };
        let record = self
            .records
            .get(*record)
            .ok_or_else(|| malformed(graph, "dangling pointer"))?;
        match record.len {
            Some(len) if *offset >= len => Err(InterpError::IndexOutOfBounds {
                index: i64::try_from(*offset).unwrap_or(i64::MAX),
                len,
            }),
            _ => Ok(record.slots.get(*offset).cloned().unwrap_or(Value::Unit)),
        }
    }

    fn store(
        &mut self,
        graph: &IrGraph,
        op: OpCode,
        ptr: &Value,
        value: Value,
    ) -> Result<(), InterpError> {
        let Value::Ptr { record, offset } = ptr else {
            return Err(mismatch(graph, op, ptr));
        };
        let record = self
            .records
            .get_mut(*record)
            .ok_or_else(|| malformed(graph, "dangling pointer"))?;
        match record.len {
            Some(len) if *offset >= len => {
                return Err(InterpError::IndexOutOfBounds {
                    index: i64::try_from(*offset).unwrap_or(i64::MAX),
                    len,
                })
            }
            Some(_) => {}
            None if record.slots.len() <= *offset => {
                record.slots.resize(*offset + 1, Value::Unit);
            }
            None => {}
        }
        record.slots[*offset] = value;
        Ok(())
    }

    fn channel(
        &mut self,
        graph: &IrGraph,
        op: OpCode,
        value: &Value,
    ) -> Result<&mut Channel, InterpError> {
        let Value::Channel(id) = value else {
            return Err(mismatch(graph, op, value));
        };
        self.channels
            .get_mut(*id)
            .ok_or_else(|| malformed(graph, "unknown channel"))
    }

    fn builtin(&mut self, name: &str, args: Vec<Value>) -> Result<Value, InterpError> {
        match name {
            "print" => {
                for arg in &args {
                    self.output.push_str(&arg.to_string());
                }
                Ok(Value::Unit)
            }
            "println" | "print_int" => {
                for arg in &args {
                    self.output.push_str(&arg.to_string());
                }
                self.output.push('\n');
                Ok(Value::Unit)
            }
            "panic" => {
                let message: Vec<String> = args.iter().map(ToString::to_string).collect();
                Err(InterpError::Panic(message.join(" ")))
            }
            "string_len" => match args.first() {
                Some(Value::Str(s)) => Ok(Value::Int(i64::try_from(s.len()).unwrap_or(i64::MAX))),
                _ => Err(InterpError::NativeCall(name.to_string())),
            },
            "string_concat" => {
                let joined: String = args.iter().map(ToString::to_string).collect();
                Ok(Value::Str(joined))
            }
            _ => Err(InterpError::NativeCall(name.to_string())),
        }
    }
}
