//! Lowering errors.
//!
//! Three families, told apart by [`LowerError::kind`]:
//!
//! - structural: the syntax tree breaks the parser contract
//! - semantic: the program is wrong (unresolved name, ambiguous dispatch)
//! - resource: the environment failed (I/O, interner capacity)
//!
//! Every error aborts lowering of the unit; no partial output is produced.

use std::io;
use std::path::PathBuf;

use janus_diagnostic::{Diagnostic, ErrorCode, Label};
use janus_ir::{InternError, NodeId, TokenSpan, UnitId};

/// Coarse classification of a [`LowerError`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorKind {
    /// Parser contract violation.
    Structural,
    /// The program being lowered is wrong.
    Semantic,
    /// The toolchain environment is broken.
    Resource,
}

/// Error produced while lowering a unit.
#[derive(Debug, thiserror::Error)]
pub enum LowerError {
    #[error("unit {0:?} is not registered in the database")]
    UnknownUnit(UnitId),
    #[error("malformed syntax tree in `{unit}` at node {node}: {reason}")]
    Structural {
        unit: String,
        node: NodeId,
        reason: String,
    },
    #[error("failed to parse module `{module}`: {message}")]
    Parse { module: String, message: String },
    #[error("[{code}] {message}")]
    Semantic {
        code: ErrorCode,
        unit: String,
        node: NodeId,
        span: Option<TokenSpan>,
        message: String,
    },
    #[error("failed to read `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Intern(#[from] InternError),
}

impl LowerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LowerError::UnknownUnit(_) | LowerError::Structural { .. } => ErrorKind::Structural,
            LowerError::Parse { .. } | LowerError::Semantic { .. } => ErrorKind::Semantic,
            LowerError::Io { .. } | LowerError::Intern(_) => ErrorKind::Resource,
        }
    }

    /// Diagnostic code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            LowerError::UnknownUnit(_) | LowerError::Structural { .. } | LowerError::Parse { .. } => {
                ErrorCode::E0001
            }
            LowerError::Semantic { code, .. } => *code,
            LowerError::Io { .. } => ErrorCode::E9002,
            LowerError::Intern(_) => ErrorCode::E9001,
        }
    }

    /// Source span of the offending node, when known.
    pub fn span(&self) -> Option<TokenSpan> {
        match self {
            LowerError::Semantic { span, .. } => *span,
            _ => None,
        }
    }

    /// Convert to a user-facing diagnostic. `file` names the source file
    /// the span points into.
    pub fn to_diagnostic(&self, file: Option<&str>) -> Diagnostic {
        let diagnostic = Diagnostic::error(self.code());
        match self {
            LowerError::Semantic {
                message,
                span,
                unit,
                ..
            } => {
                let diagnostic = diagnostic.with_message(message.clone());
                let Some(span) = span else {
                    return diagnostic.with_note(format!("in unit `{unit}`"));
                };
                let label = Label::primary(*span, "");
                match file {
                    Some(file) => diagnostic.with_labelled(label.in_file(file)),
                    None => diagnostic.with_labelled(label),
                }
            }
            LowerError::Structural { unit, node, reason } => diagnostic
                .with_message(format!("malformed syntax tree: {reason}"))
                .with_note(format!("at node {node} of unit `{unit}`"))
                .with_note("this is a parser bug, not an error in the program"),
            LowerError::Io { source, .. } => diagnostic
                .with_message(self.to_string())
                .with_note(source.to_string()),
            LowerError::UnknownUnit(_) | LowerError::Parse { .. } | LowerError::Intern(_) => {
                diagnostic.with_message(self.to_string())
            }
        }
    }
}
