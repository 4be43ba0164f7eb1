use std::fmt;

use serde::Serialize;

use crate::span::Span;

/// A lexer error with location information.
///
/// Lex errors are fatal for the call that produced them; the driver maps
/// them to its typed error surface unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

impl LexError {
    /// Create a new lexer error.
    pub fn new(kind: LexErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The specific kind of lexer error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LexErrorKind {
    /// A character the surface language has no token for.
    UnexpectedCharacter(char),
    /// A string literal was not closed before end of input.
    UnterminatedString,
    /// A `/* ... */` comment was not closed before end of input.
    UnterminatedBlockComment,
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedCharacter(c) => write!(f, "unexpected character: {c:?}"),
            Self::UnterminatedString => write!(f, "unterminated string literal"),
            Self::UnterminatedBlockComment => write!(f, "unterminated block comment"),
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for LexError {}

/// An allocation budget violation in a node arena.
///
/// Raised when a parse or lowering pass asks for more nodes than the
/// per-call budget allows. The arena is released by the caller; there is no
/// recovery inside a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryError {
    /// The budget that was exceeded.
    pub limit: usize,
    /// How many allocations had already been served.
    pub allocated: usize,
}

impl MemoryError {
    /// Create a new budget-violation error.
    pub fn new(limit: usize, allocated: usize) -> Self {
        Self { limit, allocated }
    }
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "node budget exhausted: {} nodes allocated, limit is {}",
            self.allocated, self.limit
        )
    }
}

impl std::error::Error for MemoryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_error_display() {
        let err = LexError::new(LexErrorKind::UnexpectedCharacter('@'), Span::new(3, 4));
        assert_eq!(err.to_string(), "unexpected character: '@'");
        assert_eq!(
            LexErrorKind::UnterminatedString.to_string(),
            "unterminated string literal"
        );
        assert_eq!(
            LexErrorKind::UnterminatedBlockComment.to_string(),
            "unterminated block comment"
        );
    }

    #[test]
    fn memory_error_display() {
        let err = MemoryError::new(10_000, 10_000);
        assert_eq!(
            err.to_string(),
            "node budget exhausted: 10000 nodes allocated, limit is 10000"
        );
    }
}
