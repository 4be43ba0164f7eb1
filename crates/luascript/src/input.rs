//! Input validation, run before any pipeline phase.
//!
//! Rejects empty and oversized inputs, the forbidden constructs the
//! transpiler refuses to translate (`eval`, `with`, `debugger`), and
//! inputs whose delimiters or strings do not close. The delimiter scan is
//! string- and comment-aware so punctuation inside literals does not
//! count.

use crate::error::{ErrorKind, TranspileError};
use crate::options::TranspileOptions;
use luascript_common::span::line_col;

const FORBIDDEN: [(&str, &str); 3] = [
    ("eval(", "`eval` is not supported"),
    ("with (", "`with` is not supported"),
    ("debugger", "`debugger` is not supported"),
];

/// Validate raw input against the acceptance contract.
pub fn validate_input(source: &str, options: &TranspileOptions) -> Result<(), TranspileError> {
    if source.trim().is_empty() {
        return Err(TranspileError::new(
            ErrorKind::Validation,
            "input",
            "input is empty",
        ));
    }
    let max = options.max_input_size();
    if source.len() > max {
        return Err(TranspileError::new(
            ErrorKind::Validation,
            "input",
            format!("input is {} bytes, limit is {max}", source.len()),
        ));
    }

    for (needle, reason) in FORBIDDEN {
        if let Some(at) = source.find(needle) {
            let (line, column) = line_col(source, at as u32);
            return Err(TranspileError::new(
                ErrorKind::Validation,
                "input",
                format!("forbidden construct: {reason}"),
            )
            .with_location(line, column));
        }
    }

    check_input_balance(source)
}

/// Count `()`, `{}`, `[]` outside strings and comments; verify strings
/// and block comments terminate.
fn check_input_balance(source: &str) -> Result<(), TranspileError> {
    #[derive(PartialEq)]
    enum State {
        Code,
        LineComment,
        BlockComment,
        Str(u8),
    }

    let bytes = source.as_bytes();
    let mut state = State::Code;
    let mut stack: Vec<(u8, usize)> = Vec::new();
    let mut i = 0;

    let err_at = |at: usize, message: String| {
        let (line, column) = line_col(source, at as u32);
        Err(TranspileError::new(ErrorKind::Validation, "input", message)
            .with_location(line, column))
    };

    while i < bytes.len() {
        let b = bytes[i];
        match state {
            State::Code => match b {
                b'/' if bytes.get(i + 1) == Some(&b'/') => state = State::LineComment,
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    state = State::BlockComment;
                    i += 2;
                    continue;
                }
                b'\'' | b'"' => state = State::Str(b),
                b'(' | b'{' | b'[' => stack.push((b, i)),
                b')' | b'}' | b']' => {
                    let expected = match b {
                        b')' => b'(',
                        b'}' => b'{',
                        _ => b'[',
                    };
                    match stack.pop() {
                        Some((open, _)) if open == expected => {}
                        _ => {
                            return err_at(
                                i,
                                format!("unbalanced delimiter {:?}", b as char),
                            );
                        }
                    }
                }
                _ => {}
            },
            State::LineComment => {
                if b == b'\n' {
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if b == b'*' && bytes.get(i + 1) == Some(&b'/') {
                    state = State::Code;
                    i += 2;
                    continue;
                }
            }
            State::Str(quote) => match b {
                b'\\' => {
                    i += 2;
                    continue;
                }
                b'\n' => return err_at(i, "unterminated string in input".to_string()),
                _ if b == quote => state = State::Code,
                _ => {}
            },
        }
        i += 1;
    }

    match state {
        State::Str(_) => {
            return err_at(bytes.len(), "unterminated string in input".to_string());
        }
        State::BlockComment => {
            return err_at(bytes.len(), "unterminated comment in input".to_string());
        }
        _ => {}
    }
    if let Some((open, at)) = stack.pop() {
        return err_at(at, format!("unclosed delimiter {:?}", open as char));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(source: &str) -> Result<(), TranspileError> {
        validate_input(source, &TranspileOptions::default())
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = check("").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        let err = check("  \n\t").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn oversized_input_is_rejected() {
        let big = "x".repeat(1024 * 1024 + 1);
        let err = check(&big).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("limit"));
    }

    #[test]
    fn extended_size_accepts_more() {
        let big = format!("let x = 1; {}", " ".repeat(2 * 1024 * 1024));
        let options = TranspileOptions {
            extended_size: true,
            ..TranspileOptions::default()
        };
        validate_input(&big, &options).unwrap();
    }

    #[test]
    fn forbidden_constructs_are_rejected() {
        for source in ["eval(code);", "with (obj) { }", "debugger;"] {
            let err = check(source).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation, "{source}");
            assert!(err.message.contains("forbidden construct"), "{source}");
        }
    }

    #[test]
    fn unbalanced_input_is_rejected() {
        let err = check("if (a { b; }").unwrap_err();
        assert!(err.message.contains("unbalanced") || err.message.contains("unclosed"));
    }

    #[test]
    fn unterminated_string_is_rejected() {
        let err = check("let s = \"oops;").unwrap_err();
        assert!(err.message.contains("unterminated string"));
    }

    #[test]
    fn delimiters_inside_strings_are_fine() {
        check("let s = \"(((\"; let t = '}{';").unwrap();
    }

    #[test]
    fn delimiters_inside_comments_are_fine() {
        check("// (((\nlet x = 1; /* }}} */").unwrap();
    }

    #[test]
    fn clean_input_passes() {
        check("function f(a) { return a * 2; }").unwrap();
    }
}
