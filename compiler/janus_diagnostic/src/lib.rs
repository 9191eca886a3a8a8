//! Diagnostic system for rich error reporting.
//!
//! Every user-facing problem carries:
//! - an error code for searchability
//! - a clear message (what went wrong)
//! - a primary label (where it went wrong)
//! - optional notes and suggestions (why, and how to fix it)

mod diagnostic;
pub mod emitter;
mod error_code;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use emitter::{ColorMode, DiagnosticEmitter, TerminalEmitter};
pub use error_code::ErrorCode;
