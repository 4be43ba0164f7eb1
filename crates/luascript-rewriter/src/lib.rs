//! Legacy regex-driven rewriter.
//!
//! The alternative pipeline: the same source-to-Lua transformation as the
//! IR path for the supported subset, performed purely by ordered textual
//! rewrites without building an AST. The phase order is normative and
//! fragile; do not reorder:
//!
//! 1. protect string literals behind placeholders;
//! 2. convert switch, then loops, then conditionals, then ternary;
//! 3. convert function declarations and arrows, then variable
//!    declarations;
//! 4. rewrite operators (equality, logical, unary, increment/decrement,
//!    compound assignment, `.length`, null-ish literals);
//! 5. convert object keys, then array literals;
//! 6. close-brace normalization and statement-separator cleanup;
//! 7. restore string literals;
//! 8. fix string concatenation contextually (`+` next to a string
//!    literal becomes `..`, propagating through an existing `..` chain).
//!
//! Runtime prelude injection (the original phase 9) is performed by the
//! driver for both pipelines; injection is last either way, so the
//! ordering is preserved.
//!
//! For inputs outside the subset the output is best-effort; callers that
//! need guarantees use the canonical IR pipeline.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Placeholder sentinels for protected string literals. Control bytes
/// cannot appear in valid source, so the phases never collide with them.
const STR_OPEN: char = '\u{1}';
const STR_CLOSE: char = '\u{2}';

/// Rewrite a source string to Lua using the ordered textual phases.
pub fn rewrite(source: &str) -> String {
    let (mut code, strings) = protect_strings(source);
    code = convert_switch(&code);
    code = convert_loops(&code);
    code = convert_conditionals(&code);
    code = convert_ternary(&code);
    code = convert_functions(&code);
    code = convert_variables(&code);
    code = convert_operators(&code);
    code = convert_objects(&code);
    code = convert_arrays(&code);
    code = normalize_braces(&code);
    code = restore_strings(&code, &strings);
    code = fix_string_concat(&code);
    if !code.ends_with('\n') {
        code.push('\n');
    }
    code
}

// ── Phase 1: string protection ───────────────────────────────────────

/// Replace every quoted literal with `\x01<index>\x02`, returning the
/// protected text and the extracted literals. Escape-aware; regexes in
/// later phases never see string contents.
fn protect_strings(source: &str) -> (String, Vec<String>) {
    let mut out = String::with_capacity(source.len());
    let mut strings = Vec::new();
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '"' && c != '\'' {
            out.push(c);
            continue;
        }
        let quote = c;
        let mut literal = String::new();
        literal.push(quote);
        while let Some(&next) = chars.peek() {
            chars.next();
            literal.push(next);
            if next == '\\' {
                if let Some(escaped) = chars.next() {
                    literal.push(escaped);
                }
                continue;
            }
            if next == quote {
                break;
            }
        }
        out.push(STR_OPEN);
        out.push_str(&strings.len().to_string());
        out.push(STR_CLOSE);
        strings.push(literal);
    }
    (out, strings)
}

fn restore_strings(code: &str, strings: &[String]) -> String {
    static PLACEHOLDER: Lazy<Regex> =
        Lazy::new(|| Regex::new("\u{1}([0-9]+)\u{2}").expect("placeholder regex"));
    PLACEHOLDER
        .replace_all(code, |caps: &Captures| {
            let idx: usize = caps[1].parse().unwrap_or(0);
            strings.get(idx).cloned().unwrap_or_default()
        })
        .into_owned()
}

// ── Phase 2a: switch ─────────────────────────────────────────────────

static SWITCH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"switch\s*\(([^)]+)\)\s*\{").expect("switch regex"));
static CASE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"case\s+([^:]+):").expect("case regex"));
static DEFAULT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"default\s*:").expect("default regex"));
static BREAK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"break\s*;").expect("break regex"));

/// Convert each switch into a selector binding plus an if/elseif chain.
/// Case labels and breaks are rewritten only inside the switch's own
/// braces, located by brace counting (strings are already protected).
fn convert_switch(code: &str) -> String {
    let mut out = String::new();
    let mut rest = code;
    let mut seq = 0;

    while let Some(caps) = SWITCH_RE.captures(rest) {
        let header = caps.get(0).expect("whole match");
        let selector = format!("__switch{seq}");
        seq += 1;

        out.push_str(&rest[..header.start()]);
        out.push_str(&format!(
            "local {selector} = {}\nif false then",
            caps[1].trim()
        ));

        let tail = &rest[header.end()..];
        let body_len = matching_brace(tail).unwrap_or(tail.len());
        let body = &tail[..body_len];
        let body = CASE_RE.replace_all(body, format!("elseif {selector} == $1 then").as_str());
        let body = DEFAULT_RE.replace_all(&body, "else");
        let body = BREAK_RE.replace_all(&body, "");
        out.push_str(&body);
        out.push_str("\nend");

        // Skip the switch's closing brace.
        rest = if body_len < tail.len() {
            &tail[body_len + 1..]
        } else {
            ""
        };
    }
    out.push_str(rest);
    out
}

/// Index of the `}` matching an already-open brace, or `None`.
fn matching_brace(text: &str) -> Option<usize> {
    let mut depth = 1u32;
    for (i, c) in text.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

// ── Phase 2b: loops ──────────────────────────────────────────────────

static DO_OPEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bdo\s*\{").expect("do regex"));
static DO_CLOSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\}\s*while\s*\(([^)]+)\)\s*;").expect("do-while regex"));
static FOR_LE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"for\s*\(\s*(?:let|var|const)\s+(\w+)\s*=\s*([^;]+?)\s*;\s*(\w+)\s*<=\s*([^;]+?)\s*;\s*(\w+)\+\+\s*\)\s*\{")
        .expect("for<= regex")
});
static FOR_LT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"for\s*\(\s*(?:let|var|const)\s+(\w+)\s*=\s*([^;]+?)\s*;\s*(\w+)\s*<\s*([^;]+?)\s*;\s*(\w+)\+\+\s*\)\s*\{")
        .expect("for< regex")
});
static FOR_IN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"for\s*\(\s*(?:let|var|const)\s+(\w+)\s+in\s+([^)]+?)\s*\)\s*\{")
        .expect("for-in regex")
});
static FOR_OF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"for\s*\(\s*(?:let|var|const)\s+(\w+)\s+of\s+([^)]+?)\s*\)\s*\{")
        .expect("for-of regex")
});
static WHILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"while\s*\(([^)]+)\)\s*\{").expect("while regex"));

fn convert_loops(code: &str) -> String {
    // do/while first so its trailing `while (...)` is not mistaken for a
    // loop header.
    let code = DO_OPEN_RE.replace_all(code, "repeat");
    let code = DO_CLOSE_RE.replace_all(&code, "until not ($1)");
    let code = FOR_LE_RE.replace_all(&code, |caps: &Captures| {
        if caps[1] == caps[3] && caps[1] == caps[5] {
            format!("for {} = {}, {} do", &caps[1], &caps[2], &caps[4])
        } else {
            caps[0].to_string()
        }
    });
    let code = FOR_LT_RE.replace_all(&code, |caps: &Captures| {
        if caps[1] == caps[3] && caps[1] == caps[5] {
            format!("for {} = {}, {} - 1 do", &caps[1], &caps[2], &caps[4])
        } else {
            caps[0].to_string()
        }
    });
    let code = FOR_IN_RE.replace_all(&code, "for $1, _ in pairs($2) do");
    let code = FOR_OF_RE.replace_all(&code, "for _, $1 in ipairs($2) do");
    WHILE_RE.replace_all(&code, "while $1 do").into_owned()
}

// ── Phase 2c: conditionals and ternary ───────────────────────────────

static ELSE_IF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\}\s*else\s+if\s*\(([^)]+)\)\s*\{").expect("else-if regex"));
static ELSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\}\s*else\s*\{").expect("else regex"));
static IF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bif\s*\(([^)]+)\)\s*\{").expect("if regex"));

fn convert_conditionals(code: &str) -> String {
    let code = ELSE_IF_RE.replace_all(code, "elseif $1 then");
    let code = ELSE_RE.replace_all(&code, "else");
    IF_RE.replace_all(&code, "if $1 then").into_owned()
}

static TERNARY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"=\s*([^;?\n]+?)\s*\?\s*([^:;\n]+?)\s*:\s*([^;\n]+?);").expect("ternary regex")
});

fn convert_ternary(code: &str) -> String {
    TERNARY_RE
        .replace_all(code, "= ($1) and $2 or $3;")
        .into_owned()
}

// ── Phase 3: functions and variables ─────────────────────────────────

static FUNCTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bfunction\s+(\w+)\s*\(([^)]*)\)\s*\{").expect("function regex"));
static ARROW_BLOCK_PAREN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(let|const|var)\s+(\w+)\s*=\s*(?:async\s+)?\(([^)]*)\)\s*=>\s*\{")
        .expect("arrow block regex")
});
static ARROW_BLOCK_IDENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(let|const|var)\s+(\w+)\s*=\s*(?:async\s+)?(\w+)\s*=>\s*\{")
        .expect("arrow block ident regex")
});
static ARROW_EXPR_PAREN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(let|const|var)\s+(\w+)\s*=\s*(?:async\s+)?\(([^)]*)\)\s*=>\s*([^{;\n][^;\n]*?)\s*;")
        .expect("arrow expr regex")
});
static ARROW_EXPR_IDENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(let|const|var)\s+(\w+)\s*=\s*(?:async\s+)?(\w+)\s*=>\s*([^{;\n][^;\n]*?)\s*;")
        .expect("arrow expr ident regex")
});

fn convert_functions(code: &str) -> String {
    let code = FUNCTION_RE.replace_all(code, "local function $1($2)");
    let code = ARROW_BLOCK_PAREN_RE.replace_all(&code, "$1 $2 = function($3)");
    let code = ARROW_BLOCK_IDENT_RE.replace_all(&code, "$1 $2 = function($3)");
    let code = ARROW_EXPR_PAREN_RE.replace_all(&code, "$1 $2 = function($3) return $4 end;");
    ARROW_EXPR_IDENT_RE
        .replace_all(&code, "$1 $2 = function($3) return $4 end;")
        .into_owned()
}

static DECL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:let|const|var)\s+").expect("decl regex"));

/// Convert declarations to `local`. A Lua `local` statement allows only
/// one `=` between its namelist and explist, so multi-declarator forms
/// are regrouped: `let a = 1, b = 2;` becomes `local a, b = 1, 2`, with
/// `nil` fillers for initializer-less names in the middle and a trimmed
/// tail, matching what the canonical emitter produces. Statements whose
/// shape is not a plain declarator list fall back to the keyword-only
/// rewrite.
fn convert_variables(code: &str) -> String {
    let mut out = String::new();
    let mut rest = code;
    while let Some(m) = DECL_RE.find(rest) {
        out.push_str(&rest[..m.start()]);
        let tail = &rest[m.end()..];
        match declarator_list(tail) {
            Some((parts, semi)) if parts.len() > 1 => {
                out.push_str(&regroup_declarators(&parts));
                // Leave the `;` in place for the separator cleanup phase.
                rest = &tail[semi..];
            }
            _ => {
                out.push_str("local ");
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Split the text after a declaration keyword into its declarators,
/// cutting only on commas outside `()`, `{}` and `[]` so call arguments
/// and table literals stay whole. Returns the parts and the byte index
/// of the terminating `;`. Returns `None` (keyword-only fallback) when
/// no statement-level `;` exists, a closing bracket underflows, the
/// statement carries a function initializer, or a part is not shaped
/// `name` / `name = expr`.
fn declarator_list(tail: &str) -> Option<(Vec<String>, usize)> {
    let mut depth = 0u32;
    let mut parts = Vec::new();
    let mut part_start = 0;
    let mut semi = None;
    for (i, c) in tail.char_indices() {
        match c {
            '(' | '{' | '[' => depth += 1,
            ')' | '}' | ']' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => {
                parts.push(tail[part_start..i].trim().to_string());
                part_start = i + 1;
            }
            ';' if depth == 0 => {
                parts.push(tail[part_start..i].trim().to_string());
                semi = Some(i);
                break;
            }
            _ => {}
        }
    }
    let semi = semi?;
    if tail[..semi].contains("function") {
        return None;
    }
    for part in &parts {
        let name = part.split('=').next().unwrap_or("").trim();
        let ident = !name.is_empty()
            && !name.starts_with(|c: char| c.is_ascii_digit())
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !ident {
            return None;
        }
        // A doubled `=` is a comparison, not an initializer.
        if let Some(eq) = part.find('=') {
            if part.as_bytes().get(eq + 1) == Some(&b'=') {
                return None;
            }
        }
    }
    Some((parts, semi))
}

/// Rebuild declarators as one `local names = values` statement.
fn regroup_declarators(parts: &[String]) -> String {
    let mut names = Vec::with_capacity(parts.len());
    let mut values: Vec<Option<String>> = Vec::with_capacity(parts.len());
    for part in parts {
        match part.split_once('=') {
            Some((name, value)) => {
                names.push(name.trim().to_string());
                values.push(Some(value.trim().to_string()));
            }
            None => {
                names.push(part.trim().to_string());
                values.push(None);
            }
        }
    }
    while values.last().is_some_and(Option::is_none) {
        values.pop();
    }
    if values.is_empty() {
        format!("local {}", names.join(", "))
    } else {
        let exps: Vec<String> = values
            .into_iter()
            .map(|v| v.unwrap_or_else(|| "nil".to_string()))
            .collect();
        format!("local {} = {}", names.join(", "), exps.join(", "))
    }
}

// ── Phase 4: operators ───────────────────────────────────────────────

static INC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+)\+\+").expect("inc regex"));
static DEC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+)--").expect("dec regex"));
static COMPOUND_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([\w.\[\]]+)\s*([+\-*/%])=\s*").expect("compound assign regex")
});
static AND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*&&\s*").expect("and regex"));
static OR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\|\|\s*").expect("or regex"));
static NOT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!([A-Za-z_(])").expect("not regex"));
static LENGTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([\w.\[\]]+)\.length\b").expect("length regex"));
static NULL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:null|undefined)\b").expect("null regex"));

fn convert_operators(code: &str) -> String {
    // Equality first: the longer forms must go before their prefixes.
    let code = code.replace("===", "==").replace("!==", "~=").replace("!=", "~=");
    let code = AND_RE.replace_all(&code, " and ");
    let code = OR_RE.replace_all(&code, " or ");
    let code = NOT_RE.replace_all(&code, "not $1");
    let code = INC_RE.replace_all(&code, "$1 = $1 + 1");
    let code = DEC_RE.replace_all(&code, "$1 = $1 - 1");
    let code = COMPOUND_RE.replace_all(&code, "$1 = $1 $2 ");
    let code = LENGTH_RE.replace_all(&code, "#$1");
    NULL_RE.replace_all(&code, "nil").into_owned()
}

// ── Phase 5: objects and arrays ──────────────────────────────────────

static OBJECT_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([,{]\s*)(\w+)\s*:").expect("object key regex"));
static OBJECT_STR_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new("([,{]\\s*)(\u{1}[0-9]+\u{2})\\s*:").expect("object str key regex"));
static ARRAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(=|\breturn)\s*\[([^\]]*)\]").expect("array regex"));

fn convert_objects(code: &str) -> String {
    let code = OBJECT_KEY_RE.replace_all(code, "$1$2 =");
    OBJECT_STR_KEY_RE
        .replace_all(&code, "$1[$2] =")
        .into_owned()
}

fn convert_arrays(code: &str) -> String {
    ARRAY_RE.replace_all(code, "$1 {$2}").into_owned()
}

// ── Phase 6: close-brace normalization ───────────────────────────────

static SEMI_BRACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r";\s*\}").expect("semi brace regex"));
static BRACE_ELSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\}(\s*else)").expect("brace else regex"));
static SEMI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r";[ \t]*").expect("semi regex"));

/// Close-brace normalization. A `}` that ends a statement (`; }`) or
/// stands alone on its line becomes `end`; `} else`/`} elseif` leftovers
/// become `end else`/`end elseif`; a `}` embedded in a table or array
/// literal on the same line stays. Statement-separator semicolons are
/// then dropped (the canonical pipeline emits none).
fn normalize_braces(code: &str) -> String {
    let code = SEMI_BRACE_RE.replace_all(code, "; end");
    let code = BRACE_ELSE_RE.replace_all(&code, "end$1");
    let mut out = String::with_capacity(code.len());
    for line in code.split_inclusive('\n') {
        let (body, newline) = match line.strip_suffix('\n') {
            Some(body) => (body, "\n"),
            None => (line, ""),
        };
        let trimmed = body.trim();
        if trimmed == "}" || trimmed == "};" {
            let indent_len = body.len() - body.trim_start().len();
            out.push_str(&body[..indent_len]);
            out.push_str("end");
        } else {
            out.push_str(body);
        }
        out.push_str(newline);
    }
    SEMI_RE.replace_all(&out, "\n").into_owned()
}

// ── Phase 8: contextual string concatenation ─────────────────────────

static STR_THEN_PLUS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"("(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*')\s*\+"#).expect("str plus regex")
});
static PLUS_THEN_STR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\+\s*("(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*')"#).expect("plus str regex")
});
static CHAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.\.\s*([A-Za-z_][\w]*(?:\.\w+|\[[^\]]+\])*)\s*\+").expect("chain regex")
});

/// `+` adjacent to a string literal becomes `..`; a `+` reached through
/// an existing `..` chain keeps concatenating. Identifier-to-identifier
/// `+` with no string in the chain stays arithmetic.
fn fix_string_concat(code: &str) -> String {
    let mut code = STR_THEN_PLUS_RE.replace_all(code, "$1 ..").into_owned();
    code = PLUS_THEN_STR_RE.replace_all(&code, ".. $1").into_owned();
    loop {
        let next = CHAIN_RE.replace_all(&code, ".. $1 ..").into_owned();
        if next == code {
            return next;
        }
        code = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize_ws(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn protect_and_restore_round_trip() {
        let source = r#"let a = "x\"y"; let b = 'z';"#;
        let (protected, strings) = protect_strings(source);
        assert!(!protected.contains('"'));
        assert!(!protected.contains('\''));
        assert_eq!(strings.len(), 2);
        assert_eq!(restore_strings(&protected, &strings), source);
    }

    #[test]
    fn logical_and_equality() {
        let out = rewrite("if (a === b && !c) { return 1; } else { return 0; }");
        assert_eq!(
            normalize_ws(&out),
            "if a == b and not c then return 1 else return 0 end"
        );
    }

    #[test]
    fn string_concat_vs_numeric_addition() {
        let out = rewrite("let msg = \"x=\" + x + (1 + 2);");
        assert!(out.contains("local msg = \"x=\" .. x .. (1 + 2)"), "{out}");
    }

    #[test]
    fn numeric_for_with_length() {
        let out = rewrite("for (let i = 0; i < arr.length; i++) { sum += arr[i]; }");
        assert!(out.contains("for i = 0, #arr - 1 do"), "{out}");
        assert!(out.contains("sum = sum + arr[i]"), "{out}");
        assert!(normalize_ws(&out).ends_with("end"));
    }

    #[test]
    fn inclusive_for_keeps_bound() {
        let out = rewrite("for (let i = 1; i <= 10; i++) { f(i); }");
        assert!(out.contains("for i = 1, 10 do"), "{out}");
    }

    #[test]
    fn arrow_expression_body() {
        let out = rewrite("const inc = x => x + 1;");
        assert!(
            out.contains("local inc = function(x) return x + 1 end"),
            "{out}"
        );
    }

    #[test]
    fn arrow_with_parameter_list() {
        let out = rewrite("const add = (a, b) => a + b;");
        assert!(
            out.contains("local add = function(a, b) return a + b end"),
            "{out}"
        );
    }

    #[test]
    fn switch_conversion() {
        let out =
            rewrite("switch (v) { case 1: a = 1; break; case 2: a = 2; break; default: a = 0; }");
        let flat = normalize_ws(&out);
        assert!(flat.starts_with("local __switch0 = v"), "{flat}");
        assert!(flat.contains("if false then"), "{flat}");
        assert!(flat.contains("elseif __switch0 == 1 then a = 1"), "{flat}");
        assert!(flat.contains("elseif __switch0 == 2 then a = 2"), "{flat}");
        assert!(flat.contains("else a = 0"), "{flat}");
        assert!(!flat.contains("break"), "{flat}");
        assert!(flat.ends_with("end"), "{flat}");
    }

    #[test]
    fn while_and_do_while() {
        let out = rewrite("while (x < 10) { x = x + 1; } do { y = y - 1; } while (y > 0);");
        assert!(out.contains("while x < 10 do"), "{out}");
        assert!(out.contains("repeat"), "{out}");
        assert!(out.contains("until not (y > 0)"), "{out}");
    }

    #[test]
    fn ternary() {
        let out = rewrite("let m = a ? b : c;");
        assert!(out.contains("local m = (a) and b or c"), "{out}");
    }

    #[test]
    fn objects_and_arrays() {
        let out = rewrite("let o = { a: 1, \"b\": 2 }; let xs = [1, 2, 3];");
        assert!(out.contains("local o = { a = 1, [\"b\"] = 2 }"), "{out}");
        assert!(out.contains("local xs = {1, 2, 3}"), "{out}");
    }

    #[test]
    fn function_declaration() {
        let out = rewrite("function add(a, b) {\n  return a + b;\n}\n");
        assert!(out.contains("local function add(a, b)"), "{out}");
        assert!(normalize_ws(&out).ends_with("end"), "{out}");
    }

    #[test]
    fn for_in_and_for_of() {
        let out = rewrite("for (let k in obj) { f(k); } for (const v of items) { g(v); }");
        assert!(out.contains("for k, _ in pairs(obj) do"), "{out}");
        assert!(out.contains("for _, v in ipairs(items) do"), "{out}");
    }

    #[test]
    fn null_and_undefined() {
        let out = rewrite("let a = null; let b = undefined;");
        assert!(out.contains("local a = nil"), "{out}");
        assert!(out.contains("local b = nil"), "{out}");
    }

    #[test]
    fn multi_declarator_regroups_into_one_local() {
        let out = rewrite("let a = 1, b = 2;");
        assert!(out.contains("local a, b = 1, 2"), "{out}");
    }

    #[test]
    fn multi_declarator_nil_fillers_match_the_emitter() {
        let out = rewrite("let a = 1, b;");
        assert!(out.contains("local a, b = 1"), "{out}");
        let out = rewrite("let a, b = 2;");
        assert!(out.contains("local a, b = nil, 2"), "{out}");
        let out = rewrite("let a, b;");
        assert!(out.contains("local a, b"), "{out}");
    }

    #[test]
    fn multi_declarator_commas_inside_initializers_do_not_split() {
        let out = rewrite("let o = { a: 1, b: 2 }, n = f(1, 2);");
        assert!(
            out.contains("local o, n = { a = 1, b = 2 }, f(1, 2)"),
            "{out}"
        );
    }

    #[test]
    fn operators_inside_strings_survive() {
        let out = rewrite("let s = \"a && b || !c ++\";");
        assert!(out.contains("\"a && b || !c ++\""), "{out}");
    }

    #[test]
    fn identifier_plus_identifier_stays_arithmetic() {
        let out = rewrite("let t = a + b;");
        assert!(out.contains("local t = a + b"), "{out}");
    }

    #[test]
    fn multiline_if_else() {
        let out = rewrite("if (x > 0) {\n  y = 1;\n} else {\n  y = 2;\n}\n");
        let flat = normalize_ws(&out);
        assert_eq!(flat, "if x > 0 then y = 1 else y = 2 end");
    }
}
