//! Error codes for all lowering diagnostics.
//!
//! The first digit names the phase, so codes stay grep-able in logs and
//! documentation.

use std::fmt;

/// Error codes for all compiler diagnostics.
///
/// Format: E#### where the first digit indicates the phase:
/// - E0xxx: AST contract violations
/// - E4xxx: lowering errors (names, traits, errors, concurrency)
/// - E5xxx: module and native binding resolution
/// - E9xxx: internal and I/O errors
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // AST contract (E0xxx)
    /// Malformed AST
    E0001,

    // Names and statements (E40xx)
    /// Undefined function
    E4001,
    /// Undefined variable
    E4002,
    /// Unknown type
    E4003,
    /// Unknown field
    E4004,
    /// Duplicate definition
    E4005,
    /// Assignment to an immutable binding
    E4006,
    /// Unsupported construct
    E4007,
    /// `break` or `continue` outside a loop
    E4008,

    // Traits (E41xx)
    /// No impl provides the called trait method
    E4101,
    /// Ambiguous trait dispatch
    E4102,
    /// Abstract trait method not implemented
    E4103,
    /// Method is not a member of the trait
    E4104,
    /// Unknown trait
    E4105,

    // Error unions (E42xx)
    /// `fail` outside a fallible function
    E4201,
    /// `?` outside a fallible function
    E4202,
    /// Unknown error variant
    E4203,
    /// `catch` or `?` on an infallible expression
    E4204,

    // Concurrency (E43xx)
    /// `spawn` outside a nursery
    E4301,

    // Modules and native bindings (E5xxx)
    /// Cyclic import
    E5001,
    /// Module not found
    E5002,
    /// Conflicting extern declaration
    E5003,

    // Internal (E9xxx)
    /// Internal compiler error
    E9001,
    /// I/O error
    E9002,
}

impl ErrorCode {
    /// Every error code, in numeric order.
    pub const ALL: &[ErrorCode] = &[
        ErrorCode::E0001,
        ErrorCode::E4001,
        ErrorCode::E4002,
        ErrorCode::E4003,
        ErrorCode::E4004,
        ErrorCode::E4005,
        ErrorCode::E4006,
        ErrorCode::E4007,
        ErrorCode::E4008,
        ErrorCode::E4101,
        ErrorCode::E4102,
        ErrorCode::E4103,
        ErrorCode::E4104,
        ErrorCode::E4105,
        ErrorCode::E4201,
        ErrorCode::E4202,
        ErrorCode::E4203,
        ErrorCode::E4204,
        ErrorCode::E4301,
        ErrorCode::E5001,
        ErrorCode::E5002,
        ErrorCode::E5003,
        ErrorCode::E9001,
        ErrorCode::E9002,
    ];

    /// Get the code as a string (e.g., "E4001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E0001 => "E0001",
            ErrorCode::E4001 => "E4001",
            ErrorCode::E4002 => "E4002",
            ErrorCode::E4003 => "E4003",
            ErrorCode::E4004 => "E4004",
            ErrorCode::E4005 => "E4005",
            ErrorCode::E4006 => "E4006",
            ErrorCode::E4007 => "E4007",
            ErrorCode::E4008 => "E4008",
            ErrorCode::E4101 => "E4101",
            ErrorCode::E4102 => "E4102",
            ErrorCode::E4103 => "E4103",
            ErrorCode::E4104 => "E4104",
            ErrorCode::E4105 => "E4105",
            ErrorCode::E4201 => "E4201",
            ErrorCode::E4202 => "E4202",
            ErrorCode::E4203 => "E4203",
            ErrorCode::E4204 => "E4204",
            ErrorCode::E4301 => "E4301",
            ErrorCode::E5001 => "E5001",
            ErrorCode::E5002 => "E5002",
            ErrorCode::E5003 => "E5003",
            ErrorCode::E9001 => "E9001",
            ErrorCode::E9002 => "E9002",
        }
    }

    /// Short description, used as the message when none is given.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E0001 => "malformed AST",
            ErrorCode::E4001 => "undefined function",
            ErrorCode::E4002 => "undefined variable",
            ErrorCode::E4003 => "unknown type",
            ErrorCode::E4004 => "unknown field",
            ErrorCode::E4005 => "duplicate definition",
            ErrorCode::E4006 => "assignment to immutable binding",
            ErrorCode::E4007 => "unsupported construct",
            ErrorCode::E4008 => "`break` or `continue` outside of a loop",
            ErrorCode::E4101 => "no implementation for trait method",
            ErrorCode::E4102 => "ambiguous trait dispatch",
            ErrorCode::E4103 => "missing implementation of abstract trait method",
            ErrorCode::E4104 => "method is not a member of trait",
            ErrorCode::E4105 => "unknown trait",
            ErrorCode::E4201 => "`fail` outside of a fallible function",
            ErrorCode::E4202 => "`?` outside of a fallible function",
            ErrorCode::E4203 => "unknown error variant",
            ErrorCode::E4204 => "`catch` or `?` on an infallible expression",
            ErrorCode::E4301 => "`spawn` outside of a nursery",
            ErrorCode::E5001 => "cyclic import",
            ErrorCode::E5002 => "module not found",
            ErrorCode::E5003 => "conflicting extern declaration",
            ErrorCode::E9001 => "internal compiler error",
            ErrorCode::E9002 => "I/O error",
        }
    }

    /// Check if this is an AST contract violation (E0xxx range).
    pub fn is_structural_error(&self) -> bool {
        matches!(self, ErrorCode::E0001)
    }

    /// Check if this is a lowering error (E4xxx range).
    pub fn is_lowering_error(&self) -> bool {
        self.as_str().starts_with("E4")
    }

    /// Check if this is a module or native binding error (E5xxx range).
    pub fn is_resolution_error(&self) -> bool {
        matches!(self, ErrorCode::E5001 | ErrorCode::E5002 | ErrorCode::E5003)
    }

    /// Check if this is an internal or I/O error (E9xxx range).
    pub fn is_internal_error(&self) -> bool {
        matches!(self, ErrorCode::E9001 | ErrorCode::E9002)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse an error code string like `"E4001"`. Case-insensitive.
impl std::str::FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        Self::ALL
            .iter()
            .find(|code| code.as_str() == upper)
            .copied()
            .ok_or(())
    }
}

#[cfg(test)]
mod tests;
