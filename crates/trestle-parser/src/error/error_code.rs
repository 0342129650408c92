//! Error codes for the Trestle diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Lexer errors
//! - `E1xx` - Parser (structure) errors
//! - `E3xx` - Elaboration errors

use std::fmt;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer Errors (E0xx)
    // =========================================================================
    /// Unterminated string literal.
    ///
    /// A string was opened with a quote but never closed on the same line.
    E001,

    /// Unexpected character.
    E002,

    /// Invalid escape sequence.
    ///
    /// Valid escapes are: `\n`, `\t`, `\\`, `\"`, `\'` and `\u{...}`.
    E003,

    /// Invalid unicode escape.
    ///
    /// Unicode escapes use the format `\u{XXXX}` with 1-6 hexadecimal digits
    /// naming a valid codepoint.
    E004,

    /// Integer literal out of range.
    E005,

    // =========================================================================
    // Parser Errors (E1xx)
    // =========================================================================
    /// Unexpected token.
    E100,

    /// Incomplete input.
    ///
    /// The input ended before a complete statement was parsed.
    E101,

    // =========================================================================
    // Elaboration Errors (E3xx)
    // =========================================================================
    /// Undefined binding.
    ///
    /// An identifier was used that no earlier `let` statement defines.
    E300,

    /// Duplicate binding.
    E301,

    /// Duplicate diagram name.
    E302,

    /// Unknown function.
    E303,

    /// Wrong number of arguments.
    E304,

    /// Argument kind mismatch.
    ///
    /// For example, a diagram expression where a string is required, or a
    /// number where a diagram is required.
    E305,

    /// Malformed diagram.
    ///
    /// The arguments are well-typed but describe an invalid structure, such as
    /// a choice whose default index is out of range.
    E306,
}

impl ErrorCode {
    /// Returns the code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
            ErrorCode::E303 => "E303",
            ErrorCode::E304 => "E304",
            ErrorCode::E305 => "E305",
            ErrorCode::E306 => "E306",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E003 => "invalid escape sequence",
            ErrorCode::E004 => "invalid unicode escape",
            ErrorCode::E005 => "integer literal out of range",
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "incomplete input",
            ErrorCode::E300 => "undefined binding",
            ErrorCode::E301 => "duplicate binding",
            ErrorCode::E302 => "duplicate diagram name",
            ErrorCode::E303 => "unknown function",
            ErrorCode::E304 => "wrong number of arguments",
            ErrorCode::E305 => "argument kind mismatch",
            ErrorCode::E306 => "malformed diagram",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
