//! The driver's typed error surface.
//!
//! Every phase failure is wrapped into a [`TranspileError`] carrying the
//! error kind, the phase it happened in, the filename (when the caller
//! supplied one) and a source location when the underlying error had one.
//! `Display` renders the single-line `LUASCRIPT_<KIND>: message` form the
//! CLI prints.

use std::fmt;

use luascript_common::span::Span;

/// Which contract was violated. One variant per error kind of the
/// pipeline; kinds map one-to-one onto the `LUASCRIPT_*` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input rejected before the pipeline ran.
    Validation,
    Lex,
    Parse,
    /// IR structural invariant violated.
    Ir,
    Emit,
    /// Output delimiter balance violated.
    Balance,
    /// Keyword imbalance, forbidden artifact, or missing runtime marker.
    OutputValidation,
    /// Arena budget exhausted.
    Memory,
    /// File read/write failed (driver only).
    Io,
}

impl ErrorKind {
    /// The stable error code printed by the CLI.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Validation => "LUASCRIPT_VALIDATION_ERROR",
            ErrorKind::Lex => "LUASCRIPT_LEX_ERROR",
            ErrorKind::Parse => "LUASCRIPT_PARSE_ERROR",
            ErrorKind::Ir => "LUASCRIPT_IR_ERROR",
            ErrorKind::Emit => "LUASCRIPT_EMIT_ERROR",
            ErrorKind::Balance => "LUASCRIPT_BALANCE_ERROR",
            ErrorKind::OutputValidation => "LUASCRIPT_OUTPUT_VALIDATION_ERROR",
            ErrorKind::Memory => "LUASCRIPT_MEMORY_ERROR",
            ErrorKind::Io => "LUASCRIPT_IO_ERROR",
        }
    }
}

/// A failed transpile call. Exactly one of these is produced per failing
/// call; there is no partial output.
#[derive(Debug, Clone, PartialEq)]
pub struct TranspileError {
    pub kind: ErrorKind,
    pub message: String,
    /// Pipeline phase the error was raised in.
    pub phase: &'static str,
    /// Filename the driver was working on, when known.
    pub filename: Option<String>,
    /// 1-based source location, when the underlying error had one.
    pub line: Option<u32>,
    pub column: Option<u32>,
    /// Byte index into the output, for balance errors.
    pub index: Option<usize>,
    /// Input span for diagnostics rendering, when available.
    pub span: Option<Span>,
}

impl TranspileError {
    pub fn new(kind: ErrorKind, phase: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            phase,
            filename: None,
            line: None,
            column: None,
            index: None,
            span: None,
        }
    }

    pub fn with_location(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_filename(mut self, filename: Option<&str>) -> Self {
        self.filename = filename.map(str::to_string);
        self
    }
}

impl fmt::Display for TranspileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.code(), self.message)?;
        if let (Some(line), Some(column)) = (self.line, self.column) {
            write!(f, " (line {line}, column {column})")?;
        } else if let Some(index) = self.index {
            write!(f, " (at byte {index})")?;
        }
        if let Some(filename) = &self.filename {
            write!(f, " [{filename}, phase: {}]", self.phase)?;
        }
        Ok(())
    }
}

impl std::error::Error for TranspileError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ErrorKind::Validation.code(), "LUASCRIPT_VALIDATION_ERROR");
        assert_eq!(ErrorKind::Lex.code(), "LUASCRIPT_LEX_ERROR");
        assert_eq!(ErrorKind::Balance.code(), "LUASCRIPT_BALANCE_ERROR");
        assert_eq!(ErrorKind::Io.code(), "LUASCRIPT_IO_ERROR");
    }

    #[test]
    fn display_is_single_line_with_location() {
        let err = TranspileError::new(ErrorKind::Lex, "lex", "unterminated string literal")
            .with_location(3, 9);
        let text = err.to_string();
        assert_eq!(
            text,
            "LUASCRIPT_LEX_ERROR: unterminated string literal (line 3, column 9)"
        );
        assert!(!text.contains('\n'));
    }

    #[test]
    fn display_includes_filename_and_phase() {
        let err = TranspileError::new(ErrorKind::Parse, "parse", "expected `;`")
            .with_filename(Some("main.ls"));
        assert!(err.to_string().contains("[main.ls, phase: parse]"));
    }
}
