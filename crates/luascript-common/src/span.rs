use serde::Serialize;

/// Half-open byte range into source text.
///
/// Every location in the transpiler is a byte offset into the original
/// UTF-8 source string. Human-readable (line, column) pairs are produced
/// by [`line_col`] only at reporting boundaries; a failing call reports a
/// single location, so no line table is kept around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Create a new span from byte offsets.
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "span start ({start}) must be <= end ({end})");
        Self { start, end }
    }

    /// The span stretching from the beginning of `first` to the end of
    /// `last`. When `last` sits inside `first` (a sub-token of an
    /// already-covered region), `first`'s own end wins.
    pub fn across(first: Span, last: Span) -> Span {
        Span {
            start: first.start,
            end: first.end.max(last.end),
        }
    }
}

/// Translate a byte offset to a 1-based (line, column) pair by scanning
/// the source up to the offset. Column counts bytes from the line start.
pub fn line_col(source: &str, offset: u32) -> (u32, u32) {
    let mut line = 1u32;
    let mut column = 1u32;
    for byte in source.as_bytes().iter().take(offset as usize) {
        if *byte == b'\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn across_joins_adjacent_spans() {
        let first = Span::new(3, 7);
        let last = Span::new(9, 14);
        assert_eq!(Span::across(first, last), Span::new(3, 14));
    }

    #[test]
    fn across_keeps_the_outer_end_for_contained_spans() {
        let outer = Span::new(0, 20);
        let inner = Span::new(5, 9);
        assert_eq!(Span::across(outer, inner), Span::new(0, 20));
    }

    #[test]
    fn across_of_a_span_with_itself_is_identity() {
        let span = Span::new(4, 4);
        assert_eq!(Span::across(span, span), span);
    }

    #[test]
    fn line_col_on_the_first_line() {
        let source = "let x = 1;";
        assert_eq!(line_col(source, 0), (1, 1));
        assert_eq!(line_col(source, 4), (1, 5));
    }

    #[test]
    fn line_col_after_newlines() {
        let source = "let a = 1;\nlet b = 2;\nreturn a;";
        assert_eq!(line_col(source, 11), (2, 1));
        assert_eq!(line_col(source, 15), (2, 5));
        assert_eq!(line_col(source, 22), (3, 1));
    }

    #[test]
    fn line_col_at_a_newline_byte_stays_on_its_line() {
        // The newline byte itself belongs to the line it terminates.
        assert_eq!(line_col("ab\ncd", 2), (1, 3));
        assert_eq!(line_col("ab\ncd", 3), (2, 1));
    }

    #[test]
    fn line_col_past_the_end_is_clamped_by_the_scan() {
        // Offsets beyond the source simply consume the whole text.
        assert_eq!(line_col("ab", 10), (1, 3));
    }
}
