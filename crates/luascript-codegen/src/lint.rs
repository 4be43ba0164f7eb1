//! Keyword balance and forbidden-artifact checks over emitted Lua.
//!
//! Runs after the structural balance scan. Keyword balance counts block
//! openers (`function`, `if`, `while`, `for`, standalone `do`, `repeat`)
//! against closers (`end`, `until`) over the non-comment, non-string text;
//! a negative running count means a stray `end`, a positive final count an
//! unclosed opener. Forbidden artifacts are source-language operators that
//! must never survive transpilation (`++`, `===`, `!==`, `||`, `&&`) plus
//! `--` glued to an identifier, which reads as a leftover decrement that
//! Lua would silently treat as a comment.

use crate::runtime::RUNTIME_MARKER;

/// Output validation configuration.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Require the runtime prelude marker to be present.
    pub require_runtime_marker: bool,
    /// Report forbidden artifacts as errors instead of warnings.
    pub strict_artifacts: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            require_runtime_marker: false,
            strict_artifacts: true,
        }
    }
}

/// One finding of the output validator.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputIssue {
    /// 1-based line the finding refers to, when line-attributable.
    pub line: Option<usize>,
    pub message: String,
}

impl OutputIssue {
    fn at(line: usize, message: impl Into<String>) -> Self {
        Self {
            line: Some(line),
            message: message.into(),
        }
    }

    fn global(message: impl Into<String>) -> Self {
        Self {
            line: None,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for OutputIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {line}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Outcome of output validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputReport {
    pub errors: Vec<OutputIssue>,
    pub warnings: Vec<OutputIssue>,
}

impl OutputReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Run the keyword-balance and artifact checks.
pub fn validate_output(code: &str, config: &OutputConfig) -> OutputReport {
    let mut report = OutputReport::default();
    let masked = mask_non_code(code);

    check_keyword_balance(&masked, &mut report);
    check_artifacts(&masked, config, &mut report);
    check_leftover_decrements(code, &masked, &mut report);

    if config.require_runtime_marker && !code.contains(RUNTIME_MARKER) {
        report.errors.push(OutputIssue::global(format!(
            "runtime prelude marker {RUNTIME_MARKER:?} is missing"
        )));
    }

    report
}

// ── Masking ──────────────────────────────────────────────────────────

/// Replace comment and string contents with spaces, preserving byte
/// positions and newlines, so the textual checks only see code.
fn mask_non_code(code: &str) -> String {
    #[derive(PartialEq)]
    enum State {
        Code,
        LineComment,
        BlockComment(usize),
        Str(u8),
        LongStr(usize),
    }

    let bytes = code.as_bytes();
    let mut out = vec![b' '; bytes.len()];
    let mut state = State::Code;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\n' {
            out[i] = b'\n';
            if state == State::LineComment {
                state = State::Code;
            }
            i += 1;
            continue;
        }
        match state {
            State::Code => match b {
                b'-' if bytes.get(i + 1) == Some(&b'-') => {
                    if let Some(level) = bracket_open(bytes, i + 2) {
                        state = State::BlockComment(level);
                        i += 2 + level + 2;
                        continue;
                    }
                    state = State::LineComment;
                    i += 2;
                    continue;
                }
                b'\'' | b'"' => {
                    state = State::Str(b);
                    i += 1;
                    continue;
                }
                b'[' => {
                    if let Some(level) = bracket_open(bytes, i) {
                        state = State::LongStr(level);
                        i += level + 2;
                        continue;
                    }
                    out[i] = b;
                }
                _ => out[i] = b,
            },
            State::LineComment => {}
            State::BlockComment(level) | State::LongStr(level) => {
                if bracket_close(bytes, i, level) {
                    state = State::Code;
                    i += level + 2;
                    continue;
                }
            }
            State::Str(quote) => match b {
                b'\\' => {
                    i += 2;
                    continue;
                }
                _ if b == quote => state = State::Code,
                _ => {}
            },
        }
        i += 1;
    }

    String::from_utf8(out).unwrap_or_default()
}

fn bracket_open(bytes: &[u8], at: usize) -> Option<usize> {
    if bytes.get(at) != Some(&b'[') {
        return None;
    }
    let mut level = 0;
    while bytes.get(at + 1 + level) == Some(&b'=') {
        level += 1;
    }
    (bytes.get(at + 1 + level) == Some(&b'[')).then_some(level)
}

fn bracket_close(bytes: &[u8], at: usize, level: usize) -> bool {
    if bytes.get(at) != Some(&b']') {
        return false;
    }
    for k in 0..level {
        if bytes.get(at + 1 + k) != Some(&b'=') {
            return false;
        }
    }
    bytes.get(at + 1 + level) == Some(&b']')
}

// ── Keyword balance ──────────────────────────────────────────────────

fn check_keyword_balance(masked: &str, report: &mut OutputReport) {
    let mut balance: i64 = 0;
    // A `while`/`for` header's own `do` must not count twice.
    let mut pending_header_do = false;
    let mut last_open_line = 0usize;

    for (line_no, line) in masked.lines().enumerate() {
        let line_no = line_no + 1;
        for word in words(line) {
            match word {
                "function" | "if" | "repeat" => {
                    balance += 1;
                    last_open_line = line_no;
                }
                "while" | "for" => {
                    balance += 1;
                    last_open_line = line_no;
                    pending_header_do = true;
                }
                "do" => {
                    if pending_header_do {
                        pending_header_do = false;
                    } else {
                        balance += 1;
                        last_open_line = line_no;
                    }
                }
                "end" | "until" => {
                    balance -= 1;
                    if balance < 0 {
                        report
                            .errors
                            .push(OutputIssue::at(line_no, format!("unmatched `{word}`")));
                        balance = 0;
                    }
                }
                _ => {}
            }
        }
    }

    if balance > 0 {
        report.errors.push(OutputIssue::at(
            last_open_line,
            format!("{balance} unclosed block opening(s)"),
        ));
    }
}

/// Iterate identifier-shaped words of a line.
fn words(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
}

// ── Forbidden artifacts ──────────────────────────────────────────────

const ARTIFACTS: [&str; 5] = ["++", "===", "!==", "||", "&&"];

fn check_artifacts(masked: &str, config: &OutputConfig, report: &mut OutputReport) {
    for (line_no, line) in masked.lines().enumerate() {
        for artifact in ARTIFACTS {
            if line.contains(artifact) {
                let issue = OutputIssue::at(
                    line_no + 1,
                    format!("forbidden artifact {artifact:?} in output"),
                );
                if config.strict_artifacts {
                    report.errors.push(issue);
                } else {
                    report.warnings.push(issue);
                }
            }
        }
    }
}

/// `x--` in the raw text is a decrement that survived transpilation; Lua
/// reads it as `x` followed by a comment, so flag it. Detection looks at
/// the raw text (the masked copy has already eaten the comment) but only
/// where the masked copy shows the preceding identifier, so `--`
/// sequences inside strings stay exempt.
fn check_leftover_decrements(code: &str, masked: &str, report: &mut OutputReport) {
    for (line_no, (raw, clean)) in code.lines().zip(masked.lines()).enumerate() {
        let bytes = raw.as_bytes();
        let clean_bytes = clean.as_bytes();
        for i in 1..bytes.len().saturating_sub(1) {
            if bytes[i] == b'-'
                && bytes[i + 1] == b'-'
                && clean_bytes
                    .get(i - 1)
                    .is_some_and(|&b| (b as char).is_ascii_alphanumeric() || b == b'_')
            {
                report.warnings.push(OutputIssue::at(
                    line_no + 1,
                    "`--` immediately follows an identifier; possible leftover decrement",
                ));
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(code: &str) -> OutputReport {
        validate_output(code, &OutputConfig::default())
    }

    #[test]
    fn balanced_program_is_clean() {
        let code = "\
local function add(a, b)
  return a + b
end
if x == 1 then
  y = 2
else
  y = 3
end
while y > 0 do
  y = y - 1
end
for i = 1, 10 do
  s = s + i
end
repeat
  z = z + 1
until not (z < 5)
";
        let report = clean(code);
        assert!(report.is_clean(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn unmatched_end_is_reported() {
        let report = clean("x = 1\nend\n");
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].message.contains("unmatched `end`"));
        assert_eq!(report.errors[0].line, Some(2));
    }

    #[test]
    fn unclosed_function_is_reported() {
        let report = clean("local function f()\nif x then end\n");
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].message.contains("unclosed"));
    }

    #[test]
    fn while_header_do_counts_once() {
        let report = clean("while x do\n  y = 1\nend\n");
        assert!(report.is_clean(), "errors: {:?}", report.errors);
    }

    #[test]
    fn standalone_do_block_counts() {
        let report = clean("do\n  x = 1\nend\n");
        assert!(report.is_clean(), "errors: {:?}", report.errors);
    }

    #[test]
    fn artifacts_are_errors_when_strict() {
        let report = clean("if a && b then\nend\n");
        assert!(report
            .errors
            .iter()
            .any(|e| e.message.contains("\"&&\"")));
    }

    #[test]
    fn artifacts_are_warnings_when_lenient() {
        let config = OutputConfig {
            strict_artifacts: false,
            ..OutputConfig::default()
        };
        let report = validate_output("x = y || z\n", &config);
        assert!(report.errors.is_empty());
        assert!(report.warnings.iter().any(|w| w.message.contains("\"||\"")));
    }

    #[test]
    fn artifacts_inside_strings_are_exempt(){
        let report = clean("local s = \"a && b ++ c\"\n");
        assert!(report.is_clean(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn keywords_inside_comments_are_exempt() {
        let report = clean("-- if while for function do\nx = 1\n");
        assert!(report.is_clean(), "errors: {:?}", report.errors);
    }

    #[test]
    fn keywords_inside_identifiers_do_not_count() {
        let report = clean("local endpoint = do_work(iffy)\n");
        assert!(report.is_clean(), "errors: {:?}", report.errors);
    }

    #[test]
    fn leftover_decrement_is_warned() {
        let report = clean("count-- comment\n");
        assert!(report
            .warnings
            .iter()
            .any(|w| w.message.contains("leftover decrement")));
    }

    #[test]
    fn ordinary_comment_is_not_a_decrement() {
        let report = clean("x = 1 -- fine\n");
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn missing_runtime_marker_is_an_error() {
        let config = OutputConfig {
            require_runtime_marker: true,
            ..OutputConfig::default()
        };
        let report = validate_output("local x = 1\n", &config);
        assert!(report
            .errors
            .iter()
            .any(|e| e.message.contains("runtime prelude marker")));
    }
}
