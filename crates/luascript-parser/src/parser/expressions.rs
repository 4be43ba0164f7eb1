//! Expression parsing, one method per precedence level.
//!
//! Precedence, low to high: assignment, ternary, logical-or, logical-and,
//! equality, comparison, additive, multiplicative, unary, postfix
//! (call / member / index / update), primary. All binary levels are
//! left-associative; assignment and ternary are right-associative.

use luascript_common::span::Span;
use luascript_common::token::TokenKind;

use crate::arena::NodeId;
use crate::ast::{AssignOp, AstNode, BinaryOp, LitValue, PropKey, UnaryOp, UpdateOp};
use crate::error::ParseError;

use super::{PResult, Parser};

impl<'src> Parser<'src> {
    /// Parse a full expression (entry point, lowest precedence).
    pub(crate) fn expression(&mut self) -> PResult<NodeId> {
        self.assignment()
    }

    /// `target (=|+=|-=|*=|/=|%=) value` — right-associative.
    fn assignment(&mut self) -> PResult<NodeId> {
        let lhs = self.conditional()?;

        let op = match self.peek().kind {
            TokenKind::Eq => AssignOp::Assign,
            TokenKind::PlusEq => AssignOp::AddAssign,
            TokenKind::MinusEq => AssignOp::SubAssign,
            TokenKind::StarEq => AssignOp::MulAssign,
            TokenKind::SlashEq => AssignOp::DivAssign,
            TokenKind::PercentEq => AssignOp::RemAssign,
            _ => return Ok(lhs),
        };
        let op_span = self.advance().span;
        self.require_assignable(lhs, op_span)?;
        let value = self.assignment()?;
        let span = Span::across(self.node_span(lhs), self.previous_span());
        self.alloc(
            AstNode::AssignmentExpression {
                op,
                target: lhs,
                value,
            },
            span,
        )
    }

    /// `test ? consequent : alternate`.
    fn conditional(&mut self) -> PResult<NodeId> {
        let test = self.logical_or()?;
        if !self.match_token(TokenKind::Question) {
            return Ok(test);
        }
        let consequent = self.assignment()?;
        self.consume(TokenKind::Colon)?;
        let alternate = self.assignment()?;
        let span = Span::across(self.node_span(test), self.previous_span());
        self.alloc(
            AstNode::ConditionalExpression {
                test,
                consequent,
                alternate,
            },
            span,
        )
    }

    fn logical_or(&mut self) -> PResult<NodeId> {
        let mut left = self.logical_and()?;
        while self.match_token(TokenKind::PipePipe) {
            let right = self.logical_and()?;
            left = self.binary(BinaryOp::Or, left, right)?;
        }
        Ok(left)
    }

    fn logical_and(&mut self) -> PResult<NodeId> {
        let mut left = self.equality()?;
        while self.match_token(TokenKind::AmpAmp) {
            let right = self.equality()?;
            left = self.binary(BinaryOp::And, left, right)?;
        }
        Ok(left)
    }

    fn equality(&mut self) -> PResult<NodeId> {
        let mut left = self.comparison()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqEq => BinaryOp::EqEq,
                TokenKind::EqEqEq => BinaryOp::EqEqEq,
                TokenKind::NotEq => BinaryOp::NotEq,
                TokenKind::NotEqEq => BinaryOp::NotEqEq,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.comparison()?;
            left = self.binary(op, left, right)?;
        }
    }

    fn comparison(&mut self) -> PResult<NodeId> {
        let mut left = self.additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::LtEq,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::GtEq,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.additive()?;
            left = self.binary(op, left, right)?;
        }
    }

    fn additive(&mut self) -> PResult<NodeId> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.multiplicative()?;
            left = self.binary(op, left, right)?;
        }
    }

    fn multiplicative(&mut self) -> PResult<NodeId> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Rem,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.unary()?;
            left = self.binary(op, left, right)?;
        }
    }

    /// Prefix `!`, `-`, `++`, `--`.
    fn unary(&mut self) -> PResult<NodeId> {
        let kind = self.peek().kind.clone();
        match kind {
            TokenKind::Bang => {
                let start = self.advance().span;
                let operand = self.unary()?;
                let span = Span::across(start, self.previous_span());
                self.alloc(
                    AstNode::UnaryExpression {
                        op: UnaryOp::Not,
                        operand,
                    },
                    span,
                )
            }
            TokenKind::Minus => {
                let start = self.advance().span;
                let operand = self.unary()?;
                let span = Span::across(start, self.previous_span());
                self.alloc(
                    AstNode::UnaryExpression {
                        op: UnaryOp::Neg,
                        operand,
                    },
                    span,
                )
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let op = if self.advance().kind == TokenKind::PlusPlus {
                    UpdateOp::Increment
                } else {
                    UpdateOp::Decrement
                };
                let start = self.previous_span();
                let target = self.unary()?;
                self.require_assignable(target, start)?;
                let span = Span::across(start, self.previous_span());
                self.alloc(
                    AstNode::UpdateExpression {
                        op,
                        prefix: true,
                        target,
                    },
                    span,
                )
            }
            _ => self.postfix(),
        }
    }

    /// Calls, member access, indexing, and postfix `++`/`--`.
    fn postfix(&mut self) -> PResult<NodeId> {
        let mut expr = self.primary()?;
        loop {
            let kind = self.peek().kind.clone();
            match kind {
                TokenKind::LParen => {
                    let open = self.advance().span;
                    self.enter_depth(open)?;
                    let mut args = Vec::new();
                    if !self.check(TokenKind::RParen) {
                        loop {
                            args.push(self.expression()?);
                            if !self.match_token(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.consume(TokenKind::RParen)?;
                    self.exit_depth();
                    let span = Span::across(self.node_span(expr), self.previous_span());
                    expr = self.alloc(AstNode::CallExpression { callee: expr, args }, span)?;
                }
                TokenKind::Dot => {
                    self.advance();
                    self.consume(TokenKind::Identifier)?;
                    let property = self.previous_text().to_string();
                    let span = Span::across(self.node_span(expr), self.previous_span());
                    expr = self.alloc(
                        AstNode::MemberExpression {
                            object: expr,
                            property,
                        },
                        span,
                    )?;
                }
                TokenKind::LBracket => {
                    let open = self.advance().span;
                    self.enter_depth(open)?;
                    let index = self.expression()?;
                    self.consume(TokenKind::RBracket)?;
                    self.exit_depth();
                    let span = Span::across(self.node_span(expr), self.previous_span());
                    expr = self.alloc(
                        AstNode::IndexExpression {
                            object: expr,
                            index,
                        },
                        span,
                    )?;
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let op = if self.advance().kind == TokenKind::PlusPlus {
                        UpdateOp::Increment
                    } else {
                        UpdateOp::Decrement
                    };
                    let op_span = self.previous_span();
                    self.require_assignable(expr, op_span)?;
                    let span = Span::across(self.node_span(expr), op_span);
                    expr = self.alloc(
                        AstNode::UpdateExpression {
                            op,
                            prefix: false,
                            target: expr,
                        },
                        span,
                    )?;
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Literals, identifiers, arrows, grouping, array/object literals.
    fn primary(&mut self) -> PResult<NodeId> {
        let kind = self.peek().kind.clone();
        match kind {
            TokenKind::Number => {
                let span = self.advance().span;
                let raw = self.previous_text().to_string();
                self.alloc(
                    AstNode::Literal {
                        value: LitValue::Number(raw),
                    },
                    span,
                )
            }
            TokenKind::String => {
                let span = self.advance().span;
                let raw = self.previous_text().to_string();
                self.alloc(
                    AstNode::Literal {
                        value: LitValue::Str(raw),
                    },
                    span,
                )
            }
            TokenKind::True => {
                let span = self.advance().span;
                self.alloc(
                    AstNode::Literal {
                        value: LitValue::Bool(true),
                    },
                    span,
                )
            }
            TokenKind::False => {
                let span = self.advance().span;
                self.alloc(
                    AstNode::Literal {
                        value: LitValue::Bool(false),
                    },
                    span,
                )
            }
            TokenKind::Null => {
                let span = self.advance().span;
                self.alloc(
                    AstNode::Literal {
                        value: LitValue::Null,
                    },
                    span,
                )
            }
            TokenKind::Undefined => {
                let span = self.advance().span;
                self.alloc(
                    AstNode::Literal {
                        value: LitValue::Undefined,
                    },
                    span,
                )
            }
            TokenKind::Async => self.async_arrow(),
            TokenKind::Identifier => {
                // Single-identifier arrow: `x => ...`.
                if self.peek_next().kind == TokenKind::FatArrow {
                    return self.single_param_arrow(false);
                }
                let span = self.advance().span;
                let name = self.previous_text().to_string();
                self.alloc(AstNode::Identifier { name }, span)
            }
            TokenKind::LParen => {
                if let Some(arrow) = self.try_paren_arrow(false)? {
                    return Ok(arrow);
                }
                let open = self.advance().span;
                self.enter_depth(open)?;
                let expression = self.expression()?;
                self.consume(TokenKind::RParen)?;
                self.exit_depth();
                let span = Span::across(open, self.previous_span());
                self.alloc(AstNode::GroupedExpression { expression }, span)
            }
            TokenKind::LBracket => self.array_literal(),
            TokenKind::LBrace => self.object_literal(),
            _ => {
                let found = self.peek();
                Err(
                    ParseError::expected("expression", found.kind.describe(), found.span)
                        .into(),
                )
            }
        }
    }

    // ── Arrow functions ────────────────────────────────────────────────

    /// `async x => ...` or `async (a, b) => ...`.
    fn async_arrow(&mut self) -> PResult<NodeId> {
        let start = self.consume(TokenKind::Async)?;
        if self.check(TokenKind::Identifier) && self.peek_next().kind == TokenKind::FatArrow {
            return self.single_param_arrow(true);
        }
        if self.check(TokenKind::LParen) {
            if let Some(arrow) = self.try_paren_arrow(true)? {
                return Ok(arrow);
            }
        }
        let found = self.peek();
        Err(ParseError::expected(
            "arrow function after `async`",
            found.kind.describe(),
            Span::across(start, found.span),
        )
        .into())
    }

    /// `x => body`, the identifier already verified by lookahead.
    fn single_param_arrow(&mut self, is_async: bool) -> PResult<NodeId> {
        let start = self.consume(TokenKind::Identifier)?;
        let name = self.previous_text().to_string();
        let param = self.alloc(AstNode::Parameter { name }, start)?;
        self.consume(TokenKind::FatArrow)?;
        self.arrow_body(vec![param], start, is_async)
    }

    /// Speculatively parse `(a, b) => body`.
    ///
    /// Saves the token index, scans a parenthesized identifier list plus
    /// `=>`, and rewinds when the shape does not match so the caller can
    /// re-parse the tokens as a grouped expression. Parameter nodes are
    /// allocated only after the `=>` is confirmed.
    fn try_paren_arrow(&mut self, is_async: bool) -> PResult<Option<NodeId>> {
        let saved = self.save();
        let start = self.peek().span;

        let names = match self.scan_arrow_params() {
            Some(names) => names,
            None => {
                self.rewind(saved);
                return Ok(None);
            }
        };

        let mut params = Vec::with_capacity(names.len());
        for (name, span) in names {
            params.push(self.alloc(AstNode::Parameter { name }, span)?);
        }
        self.arrow_body(params, start, is_async).map(Some)
    }

    /// Token-level scan of `( ident (, ident)* ) =>`. Returns the
    /// parameter names when the shape matches, leaving the position after
    /// the `=>`; returns `None` (position unspecified, caller rewinds)
    /// otherwise.
    fn scan_arrow_params(&mut self) -> Option<Vec<(String, Span)>> {
        if !self.match_token(TokenKind::LParen) {
            return None;
        }
        let mut names = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                if !self.match_token(TokenKind::Identifier) {
                    return None;
                }
                names.push((self.previous_text().to_string(), self.previous_span()));
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        if !self.match_token(TokenKind::RParen) {
            return None;
        }
        if !self.match_token(TokenKind::FatArrow) {
            return None;
        }
        Some(names)
    }

    /// Parse an arrow body (block or bare expression) and allocate the node.
    fn arrow_body(&mut self, params: Vec<NodeId>, start: Span, is_async: bool) -> PResult<NodeId> {
        let (body, expression_body) = if self.check(TokenKind::LBrace) {
            (self.block()?, false)
        } else {
            (self.assignment()?, true)
        };
        let span = Span::across(start, self.previous_span());
        self.alloc(
            AstNode::ArrowFunction {
                params,
                body,
                expression_body,
                is_async,
            },
            span,
        )
    }

    // ── Literals ───────────────────────────────────────────────────────

    /// `[ expr (, expr)* ]`
    fn array_literal(&mut self) -> PResult<NodeId> {
        let open = self.consume(TokenKind::LBracket)?;
        self.enter_depth(open)?;
        let mut elements = Vec::new();
        if !self.check(TokenKind::RBracket) {
            loop {
                elements.push(self.expression()?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
                if self.check(TokenKind::RBracket) {
                    break; // trailing comma
                }
            }
        }
        self.consume(TokenKind::RBracket)?;
        self.exit_depth();
        let span = Span::across(open, self.previous_span());
        self.alloc(AstNode::ArrayExpression { elements }, span)
    }

    /// `{ key: expr (, key: expr)* }` with identifier or string keys.
    fn object_literal(&mut self) -> PResult<NodeId> {
        let open = self.consume(TokenKind::LBrace)?;
        self.enter_depth(open)?;
        let mut properties = Vec::new();
        if !self.check(TokenKind::RBrace) {
            loop {
                let key_kind = self.peek().kind.clone();
                let key = match key_kind {
                    TokenKind::Identifier => {
                        self.advance();
                        PropKey::Ident(self.previous_text().to_string())
                    }
                    TokenKind::String => {
                        self.advance();
                        PropKey::Str(self.previous_text().to_string())
                    }
                    _ => {
                        let found = self.peek();
                        return Err(ParseError::expected(
                            "property name",
                            found.kind.describe(),
                            found.span,
                        )
                        .into());
                    }
                };
                self.consume(TokenKind::Colon)?;
                let value = self.expression()?;
                properties.push((key, value));
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
                if self.check(TokenKind::RBrace) {
                    break; // trailing comma
                }
            }
        }
        self.consume(TokenKind::RBrace)?;
        self.exit_depth();
        let span = Span::across(open, self.previous_span());
        self.alloc(AstNode::ObjectExpression { properties }, span)
    }

    // ── Shared helpers ─────────────────────────────────────────────────

    fn binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId) -> PResult<NodeId> {
        let span = Span::across(self.node_span(left), self.node_span(right));
        self.alloc(AstNode::BinaryExpression { op, left, right }, span)
    }

    fn node_span(&self, id: NodeId) -> Span {
        self.arena_span(id)
    }

    fn require_assignable(&self, target: NodeId, op_span: Span) -> PResult<()> {
        if self.arena_node(target).is_assignable() {
            Ok(())
        } else {
            Err(ParseError::new(
                "invalid assignment target",
                "non-assignable expression",
                Span::across(self.node_span(target), op_span),
            )
            .into())
        }
    }
}
