//! Emitter snapshot tests over the full front half of the pipeline
//! (lex, parse, lower) plus output-validator invariants: every emitted
//! program must pass the balance scan and the keyword checks.

use insta::assert_snapshot;
use luascript_codegen::{
    emit, scan_balance, validate_output, EmitConfig, OutputConfig,
};
use luascript_ir::lower;
use luascript_lexer::Lexer;
use luascript_parser::arena::Limits;

fn transpile(source: &str) -> String {
    let tokens = Lexer::tokenize(source).expect("lex failed");
    let ast = luascript_parser::parse(tokens, source, Limits::default()).expect("parse failed");
    let module = lower(&ast, source, None, 10_000).expect("lowering failed");
    let report = luascript_ir::validate(&module);
    assert!(report.valid, "IR invalid: {:?}", report.errors);
    let code = emit(&module, &EmitConfig::default()).expect("emit failed");

    // Invariants: structurally balanced, keyword-balanced, artifact-free.
    scan_balance(&code).expect("emitted code is unbalanced");
    let output = validate_output(&code, &OutputConfig::default());
    assert!(output.is_clean(), "output validator: {:?}", output.errors);

    code
}

#[test]
fn logical_and_equality_operators() {
    let code = transpile("if (a === b && !c) { return 1; } else { return 0; }");
    assert_snapshot!(code, @r###"
    if a == b and not c then
      return 1
    else
      return 0
    end
    "###);
}

#[test]
fn string_concatenation_vs_numeric_addition() {
    let code = transpile("let msg = \"x=\" + x + (1 + 2);");
    assert_snapshot!(code, @r###"
    local msg = "x=" .. x .. (1 + 2)
    "###);
}

#[test]
fn numeric_for_with_array_length() {
    let code = transpile("for (let i = 0; i < arr.length; i++) { sum += arr[i]; }");
    assert_snapshot!(code, @r###"
    for i = 0, #arr - 1 do
      sum = sum + arr[i]
    end
    "###);
}

#[test]
fn arrow_function_with_expression_body() {
    let code = transpile("const inc = x => x + 1;");
    assert_snapshot!(code, @r###"
    local inc = function(x) return x + 1 end
    "###);
}

#[test]
fn switch_lowering() {
    let code =
        transpile("switch (v) { case 1: a = 1; break; case 2: a = 2; break; default: a = 0; }");
    assert_snapshot!(code, @r###"
    local __switch0 = v
    if false then
    elseif __switch0 == 1 then
      a = 1
    elseif __switch0 == 2 then
      a = 2
    else
      a = 0
    end
    "###);
    assert!(!code.contains("break"));
}

#[test]
fn function_declaration_and_calls() {
    let code = transpile(
        "function fib(n) { if (n < 2) { return n; } return fib(n - 1) + fib(n - 2); }",
    );
    assert_snapshot!(code, @r###"
    local function fib(n)
      if n < 2 then
        return n
      end
      return fib(n - 1) + fib(n - 2)
    end
    "###);
}

#[test]
fn while_and_do_while() {
    let code = transpile("while (x < 10) { x = x + 1; } do { y = y - 1; } while (y > 0);");
    assert_snapshot!(code, @r###"
    while x < 10 do
      x = x + 1
    end
    repeat
      y = y - 1
    until not (y > 0)
    "###);
}

#[test]
fn object_and_array_literals() {
    let code = transpile("let o = { a: 1, \"b\": 2 }; let xs = [1, 2, 3]; let e = {};");
    assert_snapshot!(code, @r###"
    local o = { a = 1, ["b"] = 2 }
    local xs = {1, 2, 3}
    local e = {}
    "###);
}

#[test]
fn ternary_becomes_and_or() {
    let code = transpile("let m = a ? b : c;");
    assert_snapshot!(code, @r###"
    local m = (a) and b or c
    "###);
}

#[test]
fn for_in_and_for_of() {
    let code = transpile("for (let k in obj) { t += obj[k]; } for (const v of items) { push(v); }");
    assert_snapshot!(code, @r###"
    for k, _ in pairs(obj) do
      t = t + obj[k]
    end
    for _, v in ipairs(items) do
      push(v)
    end
    "###);
}

#[test]
fn increments_expand_to_assignments() {
    let code = transpile("i++; j--; k += 2; s -= 3; m *= 4; d /= 5; r %= 6;");
    assert_snapshot!(code, @r###"
    i = i + 1
    j = j - 1
    k = k + 2
    s = s - 3
    m = m * 4
    d = d / 5
    r = r % 6
    "###);
}

#[test]
fn null_and_undefined_render_nil() {
    let code = transpile("let a = null; let b = undefined;");
    assert_snapshot!(code, @r###"
    local a = nil
    local b = nil
    "###);
}

#[test]
fn member_calls_keep_their_shape() {
    let code = transpile("console.log(JSON.stringify(data));");
    assert_snapshot!(code, @r###"
    console.log(JSON.stringify(data))
    "###);
}

#[test]
fn descending_numeric_for() {
    let code = transpile("for (let i = 10; i >= 0; i--) { f(i); }");
    assert_snapshot!(code, @r###"
    for i = 10, 0, -1 do
      f(i)
    end
    "###);
}

#[test]
fn custom_indent_unit() {
    let source = "if (a) { b = 1; }";
    let tokens = Lexer::tokenize(source).unwrap();
    let ast = luascript_parser::parse(tokens, source, Limits::default()).unwrap();
    let module = lower(&ast, source, None, 10_000).unwrap();
    let code = emit(
        &module,
        &EmitConfig {
            indent: "    ".to_string(),
        },
    )
    .unwrap();
    assert_snapshot!(code, @r###"
    if a then
        b = 1
    end
    "###);
}

#[test]
fn string_plus_assignment_concatenates() {
    let code = transpile("msg += \" world\";");
    assert_snapshot!(code, @r###"
    msg = msg .. " world"
    "###);
}

#[test]
fn keyword_imbalance_is_caught_by_the_output_validator() {
    // Emitter never produces this; simulate a fuzzed emitter bug.
    let broken = "local function f()\nif x then\nend\n";
    scan_balance(broken).expect("delimiters alone are balanced");
    let report = validate_output(broken, &OutputConfig::default());
    assert!(!report.is_clean());
    assert!(report.errors[0].message.contains("unclosed"));
}
