//! Recursive-descent parser for the LuaScript surface language.
//!
//! Statements are parsed by one method per grammar production; expressions
//! live in [`expressions`] with one method per precedence level. The parser
//! walks a token vector by position with a small helper set (`match_token`,
//! `check`, `consume`, `peek`, `peek_next`, `advance`, `previous`) and
//! allocates every node out of a budgeted [`Arena`].
//!
//! Arrow functions are parsed speculatively: the token position is saved,
//! a parameter list and `=>` are attempted, and the position is restored
//! when the attempt fails so the tokens re-parse as an ordinary
//! parenthesized expression.

mod expressions;

use luascript_common::span::Span;
use luascript_common::token::{Token, TokenKind};

use crate::arena::{Arena, Limits, NodeId};
use crate::ast::{AstNode, DeclKind};
use crate::error::{ParseError, ParseFailure};

pub(crate) type PResult<T> = Result<T, ParseFailure>;

/// Token-stream parser producing arena-allocated AST nodes.
pub struct Parser<'src> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'src str,
    arena: Arena,
}

impl<'src> Parser<'src> {
    /// Create a parser over a token stream and its source text.
    ///
    /// The stream is expected to end with `Eof`; one is appended if the
    /// caller handed over a bare vector.
    pub fn new(mut tokens: Vec<Token>, source: &'src str, limits: Limits) -> Self {
        if tokens.last().map(|t| &t.kind) != Some(&TokenKind::Eof) {
            let end = source.len() as u32;
            tokens.push(Token::new(TokenKind::Eof, end, end));
        }
        Self {
            tokens,
            pos: 0,
            source,
            arena: Arena::new(limits),
        }
    }

    /// Parse a whole program. Consumes the parser and returns the arena
    /// together with the root `Program` id.
    pub fn parse_program(mut self) -> PResult<(Arena, NodeId)> {
        let start = self.peek().span;
        let mut body = Vec::new();
        while !self.at_eof() {
            body.push(self.statement()?);
        }
        let span = Span::across(start, self.previous_span());
        let root = self.alloc(AstNode::Program { body }, span)?;
        Ok((self.arena, root))
    }

    // ── Token helpers ──────────────────────────────────────────────────

    /// The current token.
    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    /// The token after the current one.
    pub(crate) fn peek_next(&self) -> &Token {
        let idx = (self.pos + 1).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    /// The kind of the token `n` positions ahead.
    pub(crate) fn peek_kind_at(&self, n: usize) -> &TokenKind {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    /// The most recently consumed token.
    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.pos.saturating_sub(1)]
    }

    /// Span of the most recently consumed token.
    pub(crate) fn previous_span(&self) -> Span {
        self.previous().span
    }

    /// Consume and return the current token.
    pub(crate) fn advance(&mut self) -> &Token {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        self.previous()
    }

    /// Whether the current token has the given kind.
    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Consume the current token if it has the given kind.
    pub(crate) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a token of the given kind or fail with "expected X, found Y".
    pub(crate) fn consume(&mut self, kind: TokenKind) -> PResult<Span> {
        if self.check(kind.clone()) {
            self.advance();
            Ok(self.previous_span())
        } else {
            let found = self.peek();
            Err(ParseError::expected(kind.describe(), found.kind.describe(), found.span).into())
        }
    }

    /// Whether all input has been consumed.
    pub(crate) fn at_eof(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    /// Text of the most recently consumed token.
    pub(crate) fn previous_text(&self) -> &'src str {
        self.previous().lexeme(self.source)
    }

    /// Save the current token position for speculative parsing.
    pub(crate) fn save(&self) -> usize {
        self.pos
    }

    /// Rewind to a saved token position.
    pub(crate) fn rewind(&mut self, saved: usize) {
        self.pos = saved;
    }

    // ── Arena helpers ──────────────────────────────────────────────────

    /// Allocate a node, mapping budget exhaustion to `ParseFailure`.
    pub(crate) fn alloc(&mut self, node: AstNode, span: Span) -> PResult<NodeId> {
        Ok(self.arena.alloc(node, span)?)
    }

    /// Look up a previously allocated node.
    pub(crate) fn arena_node(&self, id: NodeId) -> &AstNode {
        self.arena.node(id)
    }

    /// Look up a previously allocated node's span.
    pub(crate) fn arena_span(&self, id: NodeId) -> Span {
        self.arena.span(id)
    }

    /// Enter one nesting level or fail with the depth diagnostic.
    pub(crate) fn enter_depth(&mut self, span: Span) -> PResult<()> {
        if self.arena.enter() {
            Ok(())
        } else {
            Err(ParseError::nesting_too_deep(self.arena.limits().max_depth, span).into())
        }
    }

    /// Leave one nesting level.
    pub(crate) fn exit_depth(&mut self) {
        self.arena.exit();
    }

    // ── Statements ─────────────────────────────────────────────────────

    fn statement(&mut self) -> PResult<NodeId> {
        let kind = self.peek().kind.clone();
        match kind {
            TokenKind::Let | TokenKind::Const | TokenKind::Var => self.variable_declaration(),
            TokenKind::Function => self.function_declaration(false),
            TokenKind::Async if self.peek_next().kind == TokenKind::Function => {
                self.advance();
                self.function_declaration(true)
            }
            TokenKind::If => self.if_statement(),
            TokenKind::While => self.while_statement(),
            TokenKind::Do => self.do_while_statement(),
            TokenKind::For => self.for_statement(),
            TokenKind::Switch => self.switch_statement(),
            TokenKind::Return => self.return_statement(),
            TokenKind::Break => {
                let span = self.advance().span;
                self.consume(TokenKind::Semicolon)?;
                self.alloc(AstNode::BreakStatement, span)
            }
            TokenKind::Continue => {
                // Lua has no `continue`; reject early with a clear message
                // instead of emitting a statement the target cannot express.
                let span = self.peek().span;
                Err(ParseError::new(
                    "`continue` is not supported by the transpiled subset",
                    "`continue`",
                    span,
                )
                .into())
            }
            TokenKind::LBrace => self.block(),
            _ => self.expression_statement(),
        }
    }

    /// `let|const|var name (= expr)? (, name (= expr)?)* ;`
    fn variable_declaration(&mut self) -> PResult<NodeId> {
        let start = self.peek().span;
        let kind = match self.advance().kind {
            TokenKind::Const => DeclKind::Const,
            TokenKind::Var => DeclKind::Var,
            _ => DeclKind::Let,
        };

        let mut declarators = Vec::new();
        loop {
            let name_span = self.consume(TokenKind::Identifier)?;
            let name = self.previous_text().to_string();
            let init = if self.match_token(TokenKind::Eq) {
                Some(self.expression()?)
            } else {
                None
            };
            let span = Span::across(name_span, self.previous_span());
            declarators.push(self.alloc(AstNode::Declarator { name, init }, span)?);
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }

        self.consume(TokenKind::Semicolon)?;
        let span = Span::across(start, self.previous_span());
        self.alloc(AstNode::VariableDeclaration { kind, declarators }, span)
    }

    /// `function name(params) { ... }`
    fn function_declaration(&mut self, is_async: bool) -> PResult<NodeId> {
        let start = self.consume(TokenKind::Function)?;
        self.consume(TokenKind::Identifier)?;
        let name = self.previous_text().to_string();
        let params = self.parameter_list()?;
        let body = self.block()?;
        let span = Span::across(start, self.previous_span());
        self.alloc(
            AstNode::FunctionDeclaration {
                name,
                params,
                body,
                is_async,
            },
            span,
        )
    }

    /// `( name (, name)* )` as allocated `Parameter` nodes.
    fn parameter_list(&mut self) -> PResult<Vec<NodeId>> {
        self.consume(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let span = self.consume(TokenKind::Identifier)?;
                let name = self.previous_text().to_string();
                params.push(self.alloc(AstNode::Parameter { name }, span)?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RParen)?;
        Ok(params)
    }

    /// `{ statement* }`
    pub(crate) fn block(&mut self) -> PResult<NodeId> {
        let start = self.consume(TokenKind::LBrace)?;
        self.enter_depth(start)?;
        let mut body = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_eof() {
            body.push(self.statement()?);
        }
        self.consume(TokenKind::RBrace)?;
        self.exit_depth();
        let span = Span::across(start, self.previous_span());
        self.alloc(AstNode::Block { body }, span)
    }

    /// `if (test) statement (else statement)?`
    fn if_statement(&mut self) -> PResult<NodeId> {
        let start = self.consume(TokenKind::If)?;
        self.consume(TokenKind::LParen)?;
        let test = self.expression()?;
        self.consume(TokenKind::RParen)?;
        let consequent = self.statement()?;
        let alternate = if self.match_token(TokenKind::Else) {
            Some(self.statement()?)
        } else {
            None
        };
        let span = Span::across(start, self.previous_span());
        self.alloc(
            AstNode::IfStatement {
                test,
                consequent,
                alternate,
            },
            span,
        )
    }

    /// `while (test) statement`
    fn while_statement(&mut self) -> PResult<NodeId> {
        let start = self.consume(TokenKind::While)?;
        self.consume(TokenKind::LParen)?;
        let test = self.expression()?;
        self.consume(TokenKind::RParen)?;
        let body = self.statement()?;
        let span = Span::across(start, self.previous_span());
        self.alloc(AstNode::WhileStatement { test, body }, span)
    }

    /// `do statement while (test);`
    fn do_while_statement(&mut self) -> PResult<NodeId> {
        let start = self.consume(TokenKind::Do)?;
        let body = self.statement()?;
        self.consume(TokenKind::While)?;
        self.consume(TokenKind::LParen)?;
        let test = self.expression()?;
        self.consume(TokenKind::RParen)?;
        self.consume(TokenKind::Semicolon)?;
        let span = Span::across(start, self.previous_span());
        self.alloc(AstNode::DoWhileStatement { body, test }, span)
    }

    /// Any of the three `for` forms.
    fn for_statement(&mut self) -> PResult<NodeId> {
        let start = self.consume(TokenKind::For)?;
        self.consume(TokenKind::LParen)?;

        // `for (let k in obj)` / `for (k in obj)` and the `of` variants.
        let decl_form = matches!(
            self.peek().kind,
            TokenKind::Let | TokenKind::Const | TokenKind::Var
        ) && *self.peek_kind_at(1) == TokenKind::Identifier
            && matches!(*self.peek_kind_at(2), TokenKind::In | TokenKind::Of);
        let bare_form = self.check(TokenKind::Identifier)
            && matches!(*self.peek_kind_at(1), TokenKind::In | TokenKind::Of);

        if decl_form || bare_form {
            let decl = if decl_form {
                Some(match self.advance().kind {
                    TokenKind::Const => DeclKind::Const,
                    TokenKind::Var => DeclKind::Var,
                    _ => DeclKind::Let,
                })
            } else {
                None
            };
            self.consume(TokenKind::Identifier)?;
            let name = self.previous_text().to_string();
            let of = self.advance().kind == TokenKind::Of;
            let subject = self.expression()?;
            self.consume(TokenKind::RParen)?;
            let body = self.statement()?;
            let span = Span::across(start, self.previous_span());
            return if of {
                self.alloc(
                    AstNode::ForOfStatement {
                        decl,
                        name,
                        iterable: subject,
                        body,
                    },
                    span,
                )
            } else {
                self.alloc(
                    AstNode::ForInStatement {
                        decl,
                        name,
                        object: subject,
                        body,
                    },
                    span,
                )
            };
        }

        // C-style header: init; test; update.
        let init = if self.match_token(TokenKind::Semicolon) {
            None
        } else if matches!(
            self.peek().kind,
            TokenKind::Let | TokenKind::Const | TokenKind::Var
        ) {
            // The declaration consumes the first `;` itself.
            Some(self.variable_declaration()?)
        } else {
            let expression = self.expression()?;
            let span = self.previous_span();
            self.consume(TokenKind::Semicolon)?;
            Some(self.alloc(AstNode::ExpressionStatement { expression }, span)?)
        };

        let test = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::Semicolon)?;

        let update = if self.check(TokenKind::RParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::RParen)?;

        let body = self.statement()?;
        let span = Span::across(start, self.previous_span());
        self.alloc(
            AstNode::ForStatement {
                init,
                test,
                update,
                body,
            },
            span,
        )
    }

    /// `switch (expr) { (case expr: statement*)* (default: statement*)? }`
    fn switch_statement(&mut self) -> PResult<NodeId> {
        let start = self.consume(TokenKind::Switch)?;
        self.consume(TokenKind::LParen)?;
        let discriminant = self.expression()?;
        self.consume(TokenKind::RParen)?;
        self.consume(TokenKind::LBrace)?;
        self.enter_depth(start)?;

        let mut cases = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_eof() {
            let arm_start = self.peek().span;
            let test = if self.match_token(TokenKind::Case) {
                let test = self.expression()?;
                self.consume(TokenKind::Colon)?;
                Some(test)
            } else {
                self.consume(TokenKind::Default)?;
                self.consume(TokenKind::Colon)?;
                None
            };
            let mut body = Vec::new();
            while !matches!(
                self.peek().kind,
                TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
            ) {
                body.push(self.statement()?);
            }
            let span = Span::across(arm_start, self.previous_span());
            cases.push(self.alloc(AstNode::SwitchCase { test, body }, span)?);
        }

        self.consume(TokenKind::RBrace)?;
        self.exit_depth();
        let span = Span::across(start, self.previous_span());
        self.alloc(
            AstNode::SwitchStatement {
                discriminant,
                cases,
            },
            span,
        )
    }

    /// `return expr? ;`
    fn return_statement(&mut self) -> PResult<NodeId> {
        let start = self.consume(TokenKind::Return)?;
        let argument = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::Semicolon)?;
        let span = Span::across(start, self.previous_span());
        self.alloc(AstNode::ReturnStatement { argument }, span)
    }

    /// `expr ;`
    fn expression_statement(&mut self) -> PResult<NodeId> {
        let start = self.peek().span;
        let expression = self.expression()?;
        self.consume(TokenKind::Semicolon)?;
        let span = Span::across(start, self.previous_span());
        self.alloc(AstNode::ExpressionStatement { expression }, span)
    }
}
