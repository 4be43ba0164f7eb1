//! Structural balance check over emitted Lua.
//!
//! A small state machine scans the output byte-by-byte, tracking comments
//! (line and long-bracket block forms), quoted strings and long strings,
//! and balancing `()`, `{}`, `[]` in code. Long-bracket forms carry an
//! equal-sign level: `--[==[` only closes at `]==]`.
//!
//! Terminal state must be `code` with an empty delimiter stack; anything
//! else is a [`BalanceError`].

use std::fmt;

/// A delimiter mismatch or an unterminated lexical region.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceError {
    /// Byte index the problem was detected at.
    pub index: usize,
    /// Scanner state the problem occurred in.
    pub phase: &'static str,
    pub message: String,
}

impl BalanceError {
    fn new(index: usize, phase: &'static str, message: impl Into<String>) -> Self {
        Self {
            index,
            phase,
            message: message.into(),
        }
    }
}

impl fmt::Display for BalanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at byte {}, in {})", self.message, self.index, self.phase)
    }
}

impl std::error::Error for BalanceError {}

/// Scanner state.
#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Code,
    LineComment,
    /// `--[=*[ ... ]=*]` with the equal-sign level.
    BlockComment(usize),
    /// `'...'` or `"..."` with the quote character.
    Str(char),
    /// `[=*[ ... ]=*]` with the equal-sign level.
    LongStr(usize),
}

impl State {
    fn phase(self) -> &'static str {
        match self {
            State::Code => "code",
            State::LineComment => "line_comment",
            State::BlockComment(_) => "block_comment",
            State::Str(_) => "string",
            State::LongStr(_) => "long_string",
        }
    }
}

/// Scan `code` and verify every delimiter closes in order and every
/// lexical region terminates.
pub fn scan_balance(code: &str) -> Result<(), BalanceError> {
    let bytes = code.as_bytes();
    let mut state = State::Code;
    let mut stack: Vec<(u8, usize)> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match state {
            State::Code => match b {
                b'-' if bytes.get(i + 1) == Some(&b'-') => {
                    // Comment: long-bracket form or to end of line.
                    if let Some(level) = long_bracket_open(bytes, i + 2) {
                        state = State::BlockComment(level);
                        i += 2 + level + 2;
                        continue;
                    }
                    state = State::LineComment;
                    i += 2;
                    continue;
                }
                b'\'' | b'"' => state = State::Str(b as char),
                b'[' => {
                    if let Some(level) = long_bracket_open(bytes, i) {
                        state = State::LongStr(level);
                        i += level + 2;
                        continue;
                    }
                    stack.push((b'[', i));
                }
                b'(' | b'{' => stack.push((b, i)),
                b')' | b'}' | b']' => {
                    let expected = match b {
                        b')' => b'(',
                        b'}' => b'{',
                        _ => b'[',
                    };
                    match stack.pop() {
                        Some((open, _)) if open == expected => {}
                        Some((open, at)) => {
                            return Err(BalanceError::new(
                                i,
                                "code",
                                format!(
                                    "mismatched {:?}: expected closer for {:?} opened at byte {at}",
                                    b as char, open as char
                                ),
                            ));
                        }
                        None => {
                            return Err(BalanceError::new(
                                i,
                                "code",
                                format!("unmatched closing {:?}", b as char),
                            ));
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
            State::BlockComment(level) => {
                if let Some(consumed) = long_bracket_close(bytes, i, level) {
                    state = State::Code;
                    i += consumed;
                    continue;
                }
            }
            State::Str(quote) => match b {
                b'\\' => {
                    i += 2;
                    continue;
                }
                b'\n' => {
                    return Err(BalanceError::new(
                        i,
                        "string",
                        "newline inside quoted string",
                    ));
                }
                _ if b as char == quote => state = State::Code,
                _ => {}
            },
            State::LongStr(level) => {
                if let Some(consumed) = long_bracket_close(bytes, i, level) {
                    state = State::Code;
                    i += consumed;
                    continue;
                }
            }
        }
        i += 1;
    }

    if state != State::Code {
        return Err(BalanceError::new(
            bytes.len(),
            state.phase(),
            format!("input ended inside {}", state.phase()),
        ));
    }
    if let Some((open, at)) = stack.pop() {
        return Err(BalanceError::new(
            at,
            "code",
            format!("unclosed {:?}", open as char),
        ));
    }
    Ok(())
}

/// If `bytes[at..]` opens a long bracket (`[=*[`), return its level.
fn long_bracket_open(bytes: &[u8], at: usize) -> Option<usize> {
    if bytes.get(at) != Some(&b'[') {
        return None;
    }
    let mut level = 0;
    while bytes.get(at + 1 + level) == Some(&b'=') {
        level += 1;
    }
    if bytes.get(at + 1 + level) == Some(&b'[') {
        Some(level)
    } else {
        None
    }
}

/// If `bytes[at..]` closes a long bracket of the given level (`]=*]`),
/// return the number of bytes consumed.
fn long_bracket_close(bytes: &[u8], at: usize, level: usize) -> Option<usize> {
    if bytes.get(at) != Some(&b']') {
        return None;
    }
    for k in 0..level {
        if bytes.get(at + 1 + k) != Some(&b'=') {
            return None;
        }
    }
    if bytes.get(at + 1 + level) == Some(&b']') {
        Some(level + 2)
    } else {
        None
    }
}
