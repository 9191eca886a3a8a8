//! Value types tracked during lowering.
//!
//! Lowering does not type-check. It keeps just enough type information to
//! pick field offsets, vtables and dispatch targets, read from annotations
//! and propagated through expressions.

use std::fmt;

use janus_ir::{NodeId, NodeKind};

use super::syntax::Syntax;
use crate::{LowerError, NativeType};

/// Error set returned by channel operations.
pub(crate) const CHANNEL_ERROR: &str = "ChannelError";

/// Variants of [`CHANNEL_ERROR`], in code order.
pub(crate) const CHANNEL_ERROR_VARIANTS: [&str; 2] = ["Closed", "WouldBlock"];

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum ValueType {
    Unknown,
    Int,
    Float,
    Bool,
    Str,
    Channel,
    /// A struct or other user type.
    Named(String),
    /// `&dyn Trait`.
    Dyn(String),
    Array(Box<ValueType>),
    ErrorUnion {
        payload: Box<ValueType>,
        error_set: String,
    },
}

impl ValueType {
    pub fn from_name(name: &str) -> Self {
        match name {
            "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" | "u64" | "int" | "isize"
            | "usize" => ValueType::Int,
            "f32" | "f64" | "float" => ValueType::Float,
            "bool" => ValueType::Bool,
            "str" | "string" | "String" => ValueType::Str,
            "Channel" => ValueType::Channel,
            "" | "void" => ValueType::Unknown,
            _ => ValueType::Named(name.to_string()),
        }
    }

    /// Type written at `node`; `Empty` means no annotation.
    pub fn from_node(syntax: Syntax<'_>, node: NodeId) -> Result<Self, LowerError> {
        match syntax.kind(node)? {
            NodeKind::Empty => Ok(ValueType::Unknown),
            NodeKind::TypeExpr => Ok(ValueType::from_name(syntax.text(node)?)),
            NodeKind::DynRefType => {
                let inner = syntax.child(node, 0)?;
                Ok(ValueType::Dyn(syntax.text(inner)?.to_string()))
            }
            NodeKind::ErrorUnionType => {
                let payload = ValueType::from_node(syntax, syntax.child(node, 0)?)?;
                let error_set = syntax.text(syntax.child(node, 1)?)?;
                Ok(ValueType::ErrorUnion {
                    payload: Box::new(payload),
                    error_set: error_set.to_string(),
                })
            }
            kind => Err(syntax.structural(node, format!("{kind:?} is not a type"))),
        }
    }

    pub fn from_native(native: &NativeType) -> Self {
        match native {
            NativeType::I32 | NativeType::I64 | NativeType::U8 => ValueType::Int,
            NativeType::F32 | NativeType::F64 => ValueType::Float,
            NativeType::Bool => ValueType::Bool,
            NativeType::CString => ValueType::Str,
            NativeType::Void | NativeType::Ptr | NativeType::Other(_) => ValueType::Unknown,
        }
    }

    pub fn channel_result() -> Self {
        ValueType::ErrorUnion {
            payload: Box::new(ValueType::Unknown),
            error_set: CHANNEL_ERROR.to_string(),
        }
    }

    pub fn is_error_union(&self) -> bool {
        matches!(self, ValueType::ErrorUnion { .. })
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ValueType::Unknown)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Unknown => f.write_str("unknown"),
            ValueType::Int => f.write_str("int"),
            ValueType::Float => f.write_str("float"),
            ValueType::Bool => f.write_str("bool"),
            ValueType::Str => f.write_str("str"),
            ValueType::Channel => f.write_str("Channel"),
            ValueType::Named(name) => f.write_str(name),
            ValueType::Dyn(name) => write!(f, "&dyn {name}"),
            ValueType::Array(element) => write!(f, "[{element}]"),
            ValueType::ErrorUnion { payload, error_set } => write!(f, "{payload} ! {error_set}"),
        }
    }
}
