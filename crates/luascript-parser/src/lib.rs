//! Recursive-descent parser for the LuaScript surface language.
//!
//! The entry point is [`parse`]: a token stream in, an arena-backed AST
//! out. Resource budgets (node count, nesting depth) are enforced per call
//! through [`arena::Limits`].

pub mod arena;
pub mod ast;
pub mod error;
mod parser;

use arena::{Arena, Limits, NodeId};
use luascript_common::token::Token;

pub use error::{ParseError, ParseFailure};
pub use parser::Parser;

/// A parsed program: the owning arena plus the root `Program` node id.
#[derive(Debug)]
pub struct Ast {
    pub arena: Arena,
    pub root: NodeId,
}

impl Ast {
    /// Look up a node.
    pub fn node(&self, id: NodeId) -> &ast::AstNode {
        self.arena.node(id)
    }

    /// Look up a node's source span.
    pub fn span(&self, id: NodeId) -> luascript_common::span::Span {
        self.arena.span(id)
    }
}

/// Parse a token stream into an AST under the given budgets.
///
/// `source` must be the text the tokens were lexed from; it is used to
/// extract identifier and literal lexemes.
pub fn parse(tokens: Vec<Token>, source: &str, limits: Limits) -> Result<Ast, ParseFailure> {
    let parser = Parser::new(tokens, source, limits);
    let (arena, root) = parser.parse_program()?;
    Ok(Ast { arena, root })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstNode, BinaryOp, DeclKind, LitValue};
    use luascript_lexer::Lexer;

    fn parse_ok(source: &str) -> Ast {
        let tokens = Lexer::tokenize(source).expect("lex failed");
        parse(tokens, source, Limits::default()).expect("parse failed")
    }

    fn parse_err(source: &str) -> ParseFailure {
        let tokens = Lexer::tokenize(source).expect("lex failed");
        parse(tokens, source, Limits::default()).expect_err("parse unexpectedly succeeded")
    }

    #[test]
    fn empty_program() {
        let ast = parse_ok("");
        match ast.node(ast.root) {
            AstNode::Program { body } => assert!(body.is_empty()),
            other => panic!("expected Program, got {other:?}"),
        }
    }

    #[test]
    fn variable_declaration_with_two_declarators() {
        let ast = parse_ok("let a = 1, b;");
        let AstNode::Program { body } = ast.node(ast.root) else {
            panic!("no program");
        };
        let AstNode::VariableDeclaration { kind, declarators } = ast.node(body[0]) else {
            panic!("expected declaration");
        };
        assert_eq!(*kind, DeclKind::Let);
        assert_eq!(declarators.len(), 2);
        let AstNode::Declarator { name, init } = ast.node(declarators[0]) else {
            panic!("expected declarator");
        };
        assert_eq!(name, "a");
        assert!(init.is_some());
        let AstNode::Declarator { name, init } = ast.node(declarators[1]) else {
            panic!("expected declarator");
        };
        assert_eq!(name, "b");
        assert!(init.is_none());
    }

    #[test]
    fn missing_semicolon_is_a_syntax_error() {
        let failure = parse_err("let a = 1");
        let ParseFailure::Syntax(err) = failure else {
            panic!("expected syntax failure");
        };
        assert_eq!(err.expected.as_deref(), Some("`;`"));
    }

    #[test]
    fn precedence_or_binds_looser_than_and() {
        let ast = parse_ok("x = a || b && c;");
        // Walk: Program -> ExpressionStatement -> Assignment -> Binary(Or).
        let AstNode::Program { body } = ast.node(ast.root) else {
            panic!()
        };
        let AstNode::ExpressionStatement { expression } = ast.node(body[0]) else {
            panic!()
        };
        let AstNode::AssignmentExpression { value, .. } = ast.node(*expression) else {
            panic!()
        };
        let AstNode::BinaryExpression { op, right, .. } = ast.node(*value) else {
            panic!()
        };
        assert_eq!(*op, BinaryOp::Or);
        let AstNode::BinaryExpression { op, .. } = ast.node(*right) else {
            panic!("right operand of || should be the && chain");
        };
        assert_eq!(*op, BinaryOp::And);
    }

    #[test]
    fn single_param_arrow_with_expression_body() {
        let ast = parse_ok("const inc = x => x + 1;");
        let AstNode::Program { body } = ast.node(ast.root) else {
            panic!()
        };
        let AstNode::VariableDeclaration { declarators, .. } = ast.node(body[0]) else {
            panic!()
        };
        let AstNode::Declarator { init, .. } = ast.node(declarators[0]) else {
            panic!()
        };
        let AstNode::ArrowFunction {
            params,
            expression_body,
            is_async,
            ..
        } = ast.node(init.unwrap())
        else {
            panic!("expected arrow function");
        };
        assert_eq!(params.len(), 1);
        assert!(*expression_body);
        assert!(!*is_async);
    }

    #[test]
    fn paren_arrow_vs_grouped_expression() {
        // `(a, b) => a` is an arrow; `(a)` alone is a grouped expression.
        let ast = parse_ok("f = (a, b) => a; g = (a);");
        let AstNode::Program { body } = ast.node(ast.root) else {
            panic!()
        };
        let AstNode::ExpressionStatement { expression } = ast.node(body[0]) else {
            panic!()
        };
        let AstNode::AssignmentExpression { value, .. } = ast.node(*expression) else {
            panic!()
        };
        assert!(matches!(ast.node(*value), AstNode::ArrowFunction { .. }));

        let AstNode::ExpressionStatement { expression } = ast.node(body[1]) else {
            panic!()
        };
        let AstNode::AssignmentExpression { value, .. } = ast.node(*expression) else {
            panic!()
        };
        assert!(matches!(ast.node(*value), AstNode::GroupedExpression { .. }));
    }

    #[test]
    fn for_forms_are_distinguished() {
        let ast = parse_ok(
            "for (let i = 0; i < 10; i++) { x = i; } \
             for (let k in obj) { y = k; } \
             for (const v of items) { z = v; }",
        );
        let AstNode::Program { body } = ast.node(ast.root) else {
            panic!()
        };
        assert!(matches!(ast.node(body[0]), AstNode::ForStatement { .. }));
        assert!(matches!(ast.node(body[1]), AstNode::ForInStatement { .. }));
        assert!(matches!(ast.node(body[2]), AstNode::ForOfStatement { .. }));
    }

    #[test]
    fn switch_with_cases_and_default() {
        let ast = parse_ok(
            "switch (v) { case 1: a = 1; break; case 2: a = 2; break; default: a = 0; }",
        );
        let AstNode::Program { body } = ast.node(ast.root) else {
            panic!()
        };
        let AstNode::SwitchStatement { cases, .. } = ast.node(body[0]) else {
            panic!("expected switch");
        };
        assert_eq!(cases.len(), 3);
        let AstNode::SwitchCase { test, body } = ast.node(cases[2]) else {
            panic!()
        };
        assert!(test.is_none());
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn member_index_and_call_chain() {
        let ast = parse_ok("console.log(arr[i].length);");
        let AstNode::Program { body } = ast.node(ast.root) else {
            panic!()
        };
        let AstNode::ExpressionStatement { expression } = ast.node(body[0]) else {
            panic!()
        };
        let AstNode::CallExpression { callee, args } = ast.node(*expression) else {
            panic!("expected call");
        };
        assert!(matches!(
            ast.node(*callee),
            AstNode::MemberExpression { property, .. } if property == "log"
        ));
        assert_eq!(args.len(), 1);
        assert!(matches!(
            ast.node(args[0]),
            AstNode::MemberExpression { property, .. } if property == "length"
        ));
    }

    #[test]
    fn literal_lexemes_are_preserved() {
        let ast = parse_ok("x = 3.14;");
        let AstNode::Program { body } = ast.node(ast.root) else {
            panic!()
        };
        let AstNode::ExpressionStatement { expression } = ast.node(body[0]) else {
            panic!()
        };
        let AstNode::AssignmentExpression { value, .. } = ast.node(*expression) else {
            panic!()
        };
        let AstNode::Literal { value } = ast.node(*value) else {
            panic!()
        };
        assert_eq!(*value, LitValue::Number("3.14".to_string()));
    }

    #[test]
    fn invalid_assignment_target() {
        let failure = parse_err("1 = x;");
        let ParseFailure::Syntax(err) = failure else {
            panic!()
        };
        assert!(err.message.contains("invalid assignment target"));
    }

    #[test]
    fn depth_budget_reports_parse_error() {
        let mut source = String::from("x = ");
        for _ in 0..120 {
            source.push('(');
        }
        source.push('1');
        for _ in 0..120 {
            source.push(')');
        }
        source.push(';');
        let failure = parse_err(&source);
        let ParseFailure::Syntax(err) = failure else {
            panic!("depth overflow should be a parse error");
        };
        assert!(err.message.contains("depth"));
    }

    #[test]
    fn node_budget_reports_memory_error() {
        let mut source = String::new();
        for i in 0..4000 {
            source.push_str(&format!("let v{i} = {i};\n"));
        }
        let tokens = Lexer::tokenize(&source).unwrap();
        let failure = parse(
            tokens,
            &source,
            Limits {
                max_nodes: 100,
                max_depth: 100,
            },
        )
        .unwrap_err();
        assert!(matches!(failure, ParseFailure::Memory(_)));
    }

    #[test]
    fn do_while_requires_trailing_semicolon() {
        parse_ok("do { x = x + 1; } while (x < 10);");
        let failure = parse_err("do { x = x + 1; } while (x < 10)");
        assert!(matches!(failure, ParseFailure::Syntax(_)));
    }
}
