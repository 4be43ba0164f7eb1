//! Driver-level tests: boundary behaviors, end-to-end scenarios, and the
//! legacy/IR pipeline agreement property.

use luascript::{transpile, ErrorKind, TranspileOptions};
use luascript_parser::arena::Limits;

fn defaults() -> TranspileOptions {
    TranspileOptions::default()
}

fn no_runtime(use_canonical_ir: bool) -> TranspileOptions {
    TranspileOptions {
        include_runtime: false,
        use_canonical_ir,
        use_cache: false,
        ..TranspileOptions::default()
    }
}

fn normalize_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Boundary behaviors ───────────────────────────────────────────────

#[test]
fn empty_input_is_a_validation_error() {
    let err = transpile("", &defaults()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[test]
fn oversized_input_is_a_validation_error() {
    let big = format!("let x = 1; // {}", "y".repeat(1024 * 1024));
    let err = transpile(&big, &defaults()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[test]
fn forbidden_constructs_are_validation_errors() {
    for source in ["eval(x);", "with (obj) {}", "let d = 1; debugger;"] {
        let err = transpile(source, &defaults()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation, "{source}");
    }
}

#[test]
fn unterminated_string_is_rejected_before_the_pipeline() {
    let err = transpile("let s = \"oops;", &defaults()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[test]
fn mismatched_brackets_are_rejected() {
    let err = transpile("if (a { return 1; }", &defaults()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[test]
fn depth_cap_is_a_parse_error_with_a_location() {
    let mut source = String::from("x = ");
    for _ in 0..150 {
        source.push('(');
    }
    source.push('1');
    for _ in 0..150 {
        source.push(')');
    }
    source.push(';');
    let err = transpile(&source, &defaults()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Parse);
    assert!(err.line.is_some());
}

#[test]
fn node_cap_is_a_memory_error() {
    let mut source = String::new();
    for i in 0..300 {
        source.push_str(&format!("let v{i} = {i};\n"));
    }
    let options = TranspileOptions {
        limits: Limits {
            max_nodes: 64,
            max_depth: 100,
        },
        use_cache: false,
        ..TranspileOptions::default()
    };
    let err = transpile(&source, &options).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Memory);
}

#[test]
fn parse_errors_carry_line_and_column() {
    let err = transpile("let x = ;", &defaults()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Parse);
    assert_eq!(err.line, Some(1));
    assert!(err.column.is_some());
    // The Display form is the single-line CLI shape.
    assert!(err.to_string().starts_with("LUASCRIPT_PARSE_ERROR:"));
}

// ── End-to-end scenarios ─────────────────────────────────────────────

#[test]
fn scenario_logical_and_equality() {
    let out = transpile(
        "if (a === b && !c) { return 1; } else { return 0; }",
        &defaults(),
    )
    .unwrap();
    assert!(out.code.contains("if a == b and not c then"), "{}", out.code);
    assert!(out.code.contains("return 1"));
    assert!(out.code.contains("else"));
    assert!(out.code.contains("return 0"));
    assert!(out.code.trim_end().ends_with("end"), "{}", out.code);
}

#[test]
fn scenario_concat_vs_addition() {
    let out = transpile("let msg = \"x=\" + x + (1 + 2);", &defaults()).unwrap();
    assert!(out.code.contains("\"x=\" .. x .. (1 + 2)"), "{}", out.code);
    assert!(out.code.contains("local msg"));
}

#[test]
fn scenario_numeric_for() {
    let out = transpile(
        "for (let i = 0; i < arr.length; i++) { sum += arr[i]; }",
        &defaults(),
    )
    .unwrap();
    assert!(out.code.contains("for i = 0, #arr - 1 do"), "{}", out.code);
    assert!(out.code.contains("sum = sum + arr[i]"));
}

#[test]
fn scenario_arrow_function() {
    let out = transpile("const inc = x => x + 1;", &defaults()).unwrap();
    assert!(
        out.code
            .contains("local inc = function(x) return x + 1 end"),
        "{}",
        out.code
    );
}

#[test]
fn scenario_switch() {
    let out = transpile(
        "switch (v) { case 1: a = 1; break; case 2: a = 2; break; default: a = 0; }",
        &no_runtime(true),
    )
    .unwrap();
    let flat = normalize_ws(&out.code);
    assert!(flat.starts_with("local __switch"), "{flat}");
    assert!(flat.contains("if false then"), "{flat}");
    assert!(flat.contains("== 1 then a = 1"), "{flat}");
    assert!(flat.contains("== 2 then a = 2"), "{flat}");
    assert!(flat.contains("else a = 0"), "{flat}");
    assert!(flat.ends_with("end"), "{flat}");
    assert!(!out.code.contains("break"), "{}", out.code);
}

// ── Result record and options ────────────────────────────────────────

#[test]
fn runtime_prelude_is_injected_by_default() {
    let out = transpile("let x = 1;", &defaults()).unwrap();
    assert!(out.code.starts_with("-- LUASCRIPT Runtime Library Integration"));
    assert!(out.code.contains("require('runtime.runtime')"));
}

#[test]
fn no_runtime_omits_the_prelude() {
    let out = transpile("let x = 1;", &no_runtime(true)).unwrap();
    assert!(!out.code.contains("require('runtime.runtime')"));
}

#[test]
fn ir_is_present_only_on_the_canonical_path() {
    let with_ir = transpile("let x = 1;", &no_runtime(true)).unwrap();
    assert!(with_ir.ir.is_some());
    assert!(with_ir.stats.node_count > 0);

    let without_ir = transpile("let x = 1;", &no_runtime(false)).unwrap();
    assert!(without_ir.ir.is_none());
    assert_eq!(without_ir.stats.node_count, 0);
}

#[test]
fn custom_indent_is_honored() {
    let options = TranspileOptions {
        indent: "\t".to_string(),
        include_runtime: false,
        use_cache: false,
        ..TranspileOptions::default()
    };
    let out = transpile("if (a) { b = 1; }", &options).unwrap();
    assert!(out.code.contains("\n\tb = 1\n"), "{:?}", out.code);
}

#[test]
fn filename_lands_in_stats_and_errors() {
    let options = TranspileOptions {
        filename: Some("main.ls".to_string()),
        use_cache: false,
        ..TranspileOptions::default()
    };
    let out = transpile("let x = 1;", &options).unwrap();
    assert_eq!(out.stats.filename.as_deref(), Some("main.ls"));

    let err = transpile("let x = ;", &options).unwrap_err();
    assert_eq!(err.filename.as_deref(), Some("main.ls"));
}

#[test]
fn cache_serves_repeat_calls() {
    let options = TranspileOptions {
        filename: None,
        ..TranspileOptions::default()
    };
    // A source unique to this test keeps parallel tests out of the key.
    let source = "let cache_probe_7319 = 1;";
    let first = transpile(source, &options).unwrap();
    assert!(!first.stats.cache_hit);
    let second = transpile(source, &options).unwrap();
    assert!(second.stats.cache_hit);
    assert_eq!(first.code, second.code);
}

#[test]
fn counters_advance() {
    let before = luascript::counters();
    transpile("let counter_probe = 1;", &no_runtime(true)).unwrap();
    let after = luascript::counters();
    assert!(after.transpilations_count > before.transpilations_count);
}

#[test]
fn optimizations_count_numeric_loops() {
    let out = transpile(
        "for (let i = 0; i < 10; i++) { f(i); } for (let j = 0; j < 10; j++) { g(j); }",
        &no_runtime(true),
    )
    .unwrap();
    assert_eq!(out.stats.optimizations_applied, 2);
}

// ── Pipeline agreement ───────────────────────────────────────────────

/// Spec property: for inputs in the supported subset, the two pipelines
/// agree modulo whitespace.
#[test]
fn pipelines_agree_on_the_supported_subset() {
    let corpus = [
        "if (a === b && !c) { return 1; } else { return 0; }",
        "let msg = \"x=\" + x + (1 + 2);",
        "for (let i = 0; i < arr.length; i++) { sum += arr[i]; }",
        "const inc = x => x + 1;",
        "switch (v) { case 1: a = 1; break; case 2: a = 2; break; default: a = 0; }",
        "while (x < 10) { x = x + 1; }",
        "let o = { a: 1, \"b\": 2 };",
        "let a = null; let b = undefined;",
        "let a = 1, b = 2;",
        "let a = 1, b;",
        "for (let k in obj) { f(k); }",
        "for (const v of items) { g(v); }",
    ];
    for source in corpus {
        let canonical = transpile(source, &no_runtime(true)).unwrap();
        let legacy = transpile(source, &no_runtime(false)).unwrap();
        assert_eq!(
            normalize_ws(&canonical.code),
            normalize_ws(&legacy.code),
            "pipelines disagree on {source:?}"
        );
    }
}

// ── Error exclusivity ────────────────────────────────────────────────

#[test]
fn failures_return_exactly_one_typed_error() {
    // A lex-clean, parse-broken input: the error is a parse error, not a
    // cascade.
    let err = transpile("function () { return 1; }", &defaults()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Parse);

    // Lex-broken input fails in input validation (unterminated string) or
    // the lexer, never both.
    let err = transpile("let s = 'a\nb';", &defaults()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}
