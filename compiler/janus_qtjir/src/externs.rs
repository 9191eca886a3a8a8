//! Registry of native functions bound with `use zig`.
//!
//! The emitter reads it to declare each symbol once. Entries are kept in a
//! `BTreeMap` so iteration order is the same on every run.

use std::collections::BTreeMap;
use std::fmt;

/// Machine-level type of a native parameter or return value.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum NativeType {
    Void,
    Bool,
    I32,
    I64,
    U8,
    F32,
    F64,
    /// NUL-terminated string pointer.
    CString,
    Ptr,
    Other(String),
}

impl NativeType {
    /// Map a type as written in a native signature or a Janus binding.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        match text {
            "" | "void" => NativeType::Void,
            "bool" => NativeType::Bool,
            "i32" | "c_int" | "int" => NativeType::I32,
            "i64" | "isize" | "usize" | "u64" | "c_long" => NativeType::I64,
            "u8" => NativeType::U8,
            "f32" => NativeType::F32,
            "f64" | "float" => NativeType::F64,
            "str" | "string" | "String" | "[*:0]const u8" | "[*:0]u8" | "[*c]const u8" => {
                NativeType::CString
            }
            _ if text.starts_with('*') || text.starts_with("[*") || text.starts_with("?*") => {
                NativeType::Ptr
            }
            _ => NativeType::Other(text.to_string()),
        }
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeType::Void => f.write_str("void"),
            NativeType::Bool => f.write_str("bool"),
            NativeType::I32 => f.write_str("i32"),
            NativeType::I64 => f.write_str("i64"),
            NativeType::U8 => f.write_str("u8"),
            NativeType::F32 => f.write_str("f32"),
            NativeType::F64 => f.write_str("f64"),
            NativeType::CString => f.write_str("cstring"),
            NativeType::Ptr => f.write_str("ptr"),
            NativeType::Other(name) => f.write_str(name),
        }
    }
}

/// Parameter and return types of a native function.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct NativeSignature {
    pub params: Vec<NativeType>,
    pub ret: NativeType,
}

impl fmt::Display for NativeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ") -> {}", self.ret)
    }
}

/// One native function known to the emitter.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct ExternSymbol {
    /// Link-level symbol name.
    pub native_symbol: String,
    pub signature: NativeSignature,
    /// The `use zig` path that declared it.
    pub origin: String,
}

/// Error raised when registering an extern.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExternError {
    #[error(
        "extern `{name}` is already declared as `{existing}` from `{existing_origin}`, \
         now redeclared as `{new}` from `{new_origin}`"
    )]
    Conflict {
        name: String,
        existing: NativeSignature,
        existing_origin: String,
        new: NativeSignature,
        new_origin: String,
    },
}

/// Name-ordered table of native functions.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct ExternRegistry {
    symbols: BTreeMap<String, ExternSymbol>,
}

impl ExternRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`. Re-registering the same symbol and signature is a
    /// no-op; anything else under the same name is a conflict.
    pub fn register(&mut self, name: impl Into<String>, symbol: ExternSymbol) -> Result<(), ExternError> {
        let name = name.into();
        match self.symbols.get(&name) {
            Some(existing)
                if existing.native_symbol == symbol.native_symbol
                    && existing.signature == symbol.signature =>
            {
                tracing::trace!(%name, "extern already registered");
                Ok(())
            }
            Some(existing) => Err(ExternError::Conflict {
                name,
                existing: existing.signature.clone(),
                existing_origin: existing.origin.clone(),
                new: symbol.signature,
                new_origin: symbol.origin,
            }),
            None => {
                tracing::debug!(%name, signature = %symbol.signature, origin = %symbol.origin, "registered extern");
                self.symbols.insert(name, symbol);
                Ok(())
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&ExternSymbol> {
        self.symbols.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    /// All entries in name order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &ExternSymbol)> {
        self.symbols.iter().map(|(name, symbol)| (name.as_str(), symbol))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Scan native source for exported functions.
///
/// Recognizes `pub fn` and `export fn` declarations (optionally
/// `pub export fn`) whose parameter list closes on the same line.
/// Anything else is skipped.
pub fn scan_native_exports(source: &str) -> Vec<(String, NativeSignature)> {
    source.lines().filter_map(scan_line).collect()
}

fn scan_line(line: &str) -> Option<(String, NativeSignature)> {
    let line = line.trim_start();
    let rest = ["pub export fn ", "export fn ", "pub fn "]
        .iter()
        .find_map(|prefix| line.strip_prefix(prefix))?;

    let open = rest.find('(')?;
    let name = rest[..open].trim();
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }

    let after_open = &rest[open + 1..];
    let close = matching_paren(after_open)?;
    let params_text = &after_open[..close];
    let tail = &after_open[close + 1..];
    let ret_text = tail.split('{').next().unwrap_or("").trim();
    let ret_text = ret_text.trim_start_matches('!');

    let params = params_text
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| NativeType::parse(p.split_once(':').map_or(p, |(_, ty)| ty)))
        .collect();

    Some((
        name.to_string(),
        NativeSignature {
            params,
            ret: NativeType::parse(ret_text),
        },
    ))
}

/// Position of the `)` closing an already-opened `(`.
fn matching_paren(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return Some(i),
            ')' => depth -= 1,
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests;
