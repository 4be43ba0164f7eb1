//! Token-stream snapshot tests for the LuaScript lexer.
//!
//! Each test tokenizes a small program and snapshots a one-token-per-line
//! dump (kind, lexeme, span) so regressions in operator splitting or span
//! tracking show up as readable diffs.

use insta::assert_snapshot;
use luascript_common::token::TokenKind;
use luascript_lexer::Lexer;

/// Render a token stream as one `Kind "lexeme" start..end` line per token.
fn dump(source: &str) -> String {
    let tokens = Lexer::tokenize(source).expect("tokenize failed");
    let mut out = String::new();
    for token in &tokens {
        let lexeme = if token.kind == TokenKind::Eof {
            ""
        } else {
            token.lexeme(source)
        };
        out.push_str(&format!(
            "{:?} {:?} {}..{}\n",
            token.kind, lexeme, token.span.start, token.span.end
        ));
    }
    out
}

#[test]
fn variable_declaration() {
    assert_snapshot!(dump("let x = 1;"), @r###"
    Let "let" 0..3
    Identifier "x" 4..5
    Eq "=" 6..7
    Number "1" 8..9
    Semicolon ";" 9..10
    Eof "" 10..10
    "###);
}

#[test]
fn arrow_function() {
    assert_snapshot!(dump("const inc = x => x + 1;"), @r###"
    Const "const" 0..5
    Identifier "inc" 6..9
    Eq "=" 10..11
    Identifier "x" 12..13
    FatArrow "=>" 14..16
    Identifier "x" 17..18
    Plus "+" 19..20
    Number "1" 21..22
    Semicolon ";" 22..23
    Eof "" 23..23
    "###);
}

#[test]
fn logical_condition() {
    assert_snapshot!(dump("a === b && !c"), @r###"
    Identifier "a" 0..1
    EqEqEq "===" 2..5
    Identifier "b" 6..7
    AmpAmp "&&" 8..10
    Bang "!" 11..12
    Identifier "c" 12..13
    Eof "" 13..13
    "###);
}

#[test]
fn string_and_concat() {
    assert_snapshot!(dump(r#""x=" + x"#), @r###"
    String "\"x=\"" 0..4
    Plus "+" 5..6
    Identifier "x" 7..8
    Eof "" 8..8
    "###);
}

#[test]
fn for_header() {
    assert_snapshot!(dump("for (let i = 0; i < n; i++)"), @r###"
    For "for" 0..3
    LParen "(" 4..5
    Let "let" 5..8
    Identifier "i" 9..10
    Eq "=" 11..12
    Number "0" 13..14
    Semicolon ";" 14..15
    Identifier "i" 16..17
    Lt "<" 18..19
    Identifier "n" 20..21
    Semicolon ";" 21..22
    Identifier "i" 23..24
    PlusPlus "++" 24..26
    RParen ")" 26..27
    Eof "" 27..27
    "###);
}
