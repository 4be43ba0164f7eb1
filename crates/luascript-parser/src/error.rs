//! Parse error types.

use std::fmt;

use luascript_common::error::MemoryError;
use luascript_common::span::Span;

/// A syntax error with location information.
///
/// Carries what the parser was looking for and what it actually saw, plus
/// the span of the offending token.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// Human-readable description of what went wrong.
    pub message: String,
    /// What the parser expected at this point, when known.
    pub expected: Option<String>,
    /// Description of the token actually found.
    pub found: String,
    /// Source location of the offending token or construct.
    pub span: Span,
}

impl ParseError {
    /// An "expected X, found Y" error at the given span.
    pub fn expected(expected: impl Into<String>, found: impl Into<String>, span: Span) -> Self {
        let expected = expected.into();
        let found = found.into();
        Self {
            message: format!("expected {expected}, found {found}"),
            expected: Some(expected),
            found,
            span,
        }
    }

    /// A free-form syntax error at the given span.
    pub fn new(message: impl Into<String>, found: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            expected: None,
            found: found.into(),
            span,
        }
    }

    /// The depth budget was exceeded by the construct at `span`.
    pub fn nesting_too_deep(max_depth: u32, span: Span) -> Self {
        Self {
            message: format!("nesting exceeds the maximum depth of {max_depth}"),
            expected: None,
            found: "deeply nested construct".to_string(),
            span,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Why a parse failed: bad syntax or an exhausted node budget.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseFailure {
    Syntax(ParseError),
    Memory(MemoryError),
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseFailure::Syntax(e) => write!(f, "{e}"),
            ParseFailure::Memory(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ParseFailure {}

impl From<ParseError> for ParseFailure {
    fn from(e: ParseError) -> Self {
        ParseFailure::Syntax(e)
    }
}

impl From<MemoryError> for ParseFailure {
    fn from(e: MemoryError) -> Self {
        ParseFailure::Memory(e)
    }
}
