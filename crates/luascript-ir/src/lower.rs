//! AST-to-IR lowering.
//!
//! Converts the arena AST into the canonical IR: field names normalized,
//! children id-referenced, and target-unfriendly control flow desugared.
//! Lowering is total and deterministic; the only failure mode is node
//! budget exhaustion.

use luascript_common::error::MemoryError;
use luascript_parser::arena::NodeId;
use luascript_parser::ast::{self, AstNode};
use luascript_parser::Ast;

use crate::{
    AssignOp, BinOp, DeclKind, IrId, IrModule, IrNode, Literal, PropKey, UnOp, UpdateOp,
};

/// Lower a parsed program into an [`IrModule`].
///
/// `source` is the text the AST was parsed from; it becomes the module
/// record's source and is scanned for generated-name freshness.
/// `max_nodes` bounds the IR store the same way the parse arena is
/// bounded; both stores belong to the same call.
pub fn lower(
    ast: &Ast,
    source: &str,
    filename: Option<&str>,
    max_nodes: usize,
) -> Result<IrModule, MemoryError> {
    let mut lowerer = Lowerer {
        ast,
        module: IrModule::new(source),
        max_nodes,
        switch_seq: 0,
        in_switch_arm: false,
    };

    let AstNode::Program { body } = ast.node(ast.root) else {
        // The parser only ever hands over a Program root.
        let mut module = lowerer.module;
        module.metadata.filename = filename.map(str::to_string);
        return Ok(module);
    };
    let top = body.clone();
    for stmt in top {
        let lowered = lowerer.lower_statement(stmt)?;
        lowerer.module.body.extend(lowered);
    }

    let mut module = lowerer.module;
    module.metadata.filename = filename.map(str::to_string);
    module.metadata.node_count = module.len();
    Ok(module)
}

struct Lowerer<'a> {
    ast: &'a Ast,
    module: IrModule,
    max_nodes: usize,
    /// Monotonic counter for generated switch selector names.
    switch_seq: u32,
    /// True while lowering the body of a switch arm; `break` is elided
    /// there (the if/elseif chain needs none) but survives inside loops.
    in_switch_arm: bool,
}

impl<'a> Lowerer<'a> {
    fn push(&mut self, node: IrNode) -> Result<IrId, MemoryError> {
        self.module.push(node, self.max_nodes)
    }

    // ── Statements ───────────────────────────────────────────────────

    /// Lower one statement. Returns a list because a single source
    /// statement may expand to several IR statements (switch becomes a
    /// selector binding plus an if/elseif chain).
    fn lower_statement(&mut self, id: NodeId) -> Result<Vec<IrId>, MemoryError> {
        match self.ast.node(id).clone() {
            AstNode::Block { body } => {
                let block = self.lower_statements_to_block(&body)?;
                Ok(vec![block])
            }
            AstNode::VariableDeclaration { kind, declarators } => {
                let decl = self.lower_variable_declaration(kind, &declarators)?;
                Ok(vec![decl])
            }
            AstNode::FunctionDeclaration {
                name,
                params,
                body,
                is_async,
            } => {
                let parameters = self.lower_parameters(&params)?;
                let body = self.lower_body(body)?;
                let id = self.push(IrNode::Function {
                    name: Some(name),
                    parameters,
                    body,
                    is_async,
                })?;
                Ok(vec![id])
            }
            AstNode::IfStatement {
                test,
                consequent,
                alternate,
            } => {
                let id = self.lower_if(test, consequent, alternate)?;
                Ok(vec![id])
            }
            AstNode::WhileStatement { test, body } => {
                let condition = self.lower_expression(test)?;
                let body = self.lower_body(body)?;
                let id = self.push(IrNode::While { condition, body })?;
                Ok(vec![id])
            }
            AstNode::DoWhileStatement { body, test } => {
                let body = self.lower_body(body)?;
                let condition = self.lower_expression(test)?;
                let id = self.push(IrNode::DoWhile { body, condition })?;
                Ok(vec![id])
            }
            AstNode::ForStatement {
                init,
                test,
                update,
                body,
            } => self.lower_for(init, test, update, body),
            AstNode::ForInStatement {
                name, object, body, ..
            } => {
                let object = self.lower_expression(object)?;
                let body = self.lower_body(body)?;
                let id = self.push(IrNode::ForIn {
                    key: name,
                    object,
                    body,
                })?;
                Ok(vec![id])
            }
            AstNode::ForOfStatement {
                name,
                iterable,
                body,
                ..
            } => {
                let iterable = self.lower_expression(iterable)?;
                let body = self.lower_body(body)?;
                let id = self.push(IrNode::ForOf {
                    value: name,
                    iterable,
                    body,
                })?;
                Ok(vec![id])
            }
            AstNode::SwitchStatement {
                discriminant,
                cases,
            } => self.lower_switch(discriminant, &cases),
            AstNode::BreakStatement => {
                if self.in_switch_arm {
                    // The if/elseif chain falls out on its own.
                    Ok(vec![])
                } else {
                    let id = self.push(IrNode::Break)?;
                    Ok(vec![id])
                }
            }
            AstNode::ReturnStatement { argument } => {
                let argument = match argument {
                    Some(arg) => Some(self.lower_expression(arg)?),
                    None => None,
                };
                let id = self.push(IrNode::Return { argument })?;
                Ok(vec![id])
            }
            AstNode::ExpressionStatement { expression } => {
                let expression = self.lower_expression(expression)?;
                let id = self.push(IrNode::ExpressionStatement { expression })?;
                Ok(vec![id])
            }
            // Expression nodes never reach statement lowering from the
            // parser; treat one defensively as an expression statement.
            other => {
                debug_assert!(false, "expression in statement position: {other:?}");
                let expression = self.lower_expression(id)?;
                let id = self.push(IrNode::ExpressionStatement { expression })?;
                Ok(vec![id])
            }
        }
    }

    fn lower_variable_declaration(
        &mut self,
        kind: ast::DeclKind,
        declarators: &[NodeId],
    ) -> Result<IrId, MemoryError> {
        let mut declarations = Vec::with_capacity(declarators.len());
        for &decl in declarators {
            let AstNode::Declarator { name, init } = self.ast.node(decl).clone() else {
                continue;
            };
            let init = match init {
                Some(expr) => Some(self.lower_expression(expr)?),
                None => None,
            };
            declarations.push(self.push(IrNode::Declarator { name, init })?);
        }
        self.push(IrNode::VariableDeclaration {
            kind: lower_decl_kind(kind),
            declarations,
        })
    }

    fn lower_parameters(&mut self, params: &[NodeId]) -> Result<Vec<IrId>, MemoryError> {
        let mut parameters = Vec::with_capacity(params.len());
        for &param in params {
            if let AstNode::Parameter { name } = self.ast.node(param).clone() {
                parameters.push(self.push(IrNode::Parameter { name })?);
            }
        }
        Ok(parameters)
    }

    /// Lower a statement-position body to a `Block`, wrapping a single
    /// statement when the source omitted the braces.
    fn lower_body(&mut self, id: NodeId) -> Result<IrId, MemoryError> {
        match self.ast.node(id) {
            AstNode::Block { body } => {
                let body = body.clone();
                self.lower_statements_to_block(&body)
            }
            _ => {
                let statements = self.lower_statement(id)?;
                self.push(IrNode::Block { statements })
            }
        }
    }

    fn lower_statements_to_block(&mut self, stmts: &[NodeId]) -> Result<IrId, MemoryError> {
        let mut statements = Vec::with_capacity(stmts.len());
        for &stmt in stmts {
            statements.extend(self.lower_statement(stmt)?);
        }
        self.push(IrNode::Block { statements })
    }

    fn lower_if(
        &mut self,
        test: NodeId,
        consequent: NodeId,
        alternate: Option<NodeId>,
    ) -> Result<IrId, MemoryError> {
        let condition = self.lower_expression(test)?;
        let consequent = self.lower_body(consequent)?;
        let alternate = match alternate {
            // `else if` chains stay nested `If`s so the emitter can print
            // `elseif` without a block in between.
            Some(alt) if matches!(self.ast.node(alt), AstNode::IfStatement { .. }) => {
                let AstNode::IfStatement {
                    test,
                    consequent,
                    alternate,
                } = self.ast.node(alt).clone()
                else {
                    unreachable!()
                };
                Some(self.lower_if(test, consequent, alternate)?)
            }
            Some(alt) => Some(self.lower_body(alt)?),
            None => None,
        };
        self.push(IrNode::If {
            condition,
            consequent,
            alternate,
        })
    }

    // ── Loops ────────────────────────────────────────────────────────

    /// Lower a C-style `for`. Canonical headers become a numeric range
    /// loop; everything else becomes init statements plus a `while` with
    /// the update appended to the body.
    fn lower_for(
        &mut self,
        init: Option<NodeId>,
        test: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    ) -> Result<Vec<IrId>, MemoryError> {
        if let (Some(init), Some(test), Some(update)) = (init, test, update) {
            if let Some(numeric) = self.try_numeric_for(init, test, update, body)? {
                return Ok(vec![numeric]);
            }
        }

        // General form.
        let mut out = Vec::new();
        if let Some(init) = init {
            out.extend(self.lower_statement(init)?);
        }
        let condition = match test {
            Some(test) => self.lower_expression(test)?,
            None => self.push(IrNode::Literal {
                value: Literal::Bool(true),
            })?,
        };
        let body_block = {
            let mut statements = match self.ast.node(body) {
                AstNode::Block { body } => {
                    let body = body.clone();
                    let mut acc = Vec::with_capacity(body.len());
                    for stmt in body {
                        acc.extend(self.lower_statement(stmt)?);
                    }
                    acc
                }
                _ => self.lower_statement(body)?,
            };
            if let Some(update) = update {
                let expression = self.lower_expression(update)?;
                statements.push(self.push(IrNode::ExpressionStatement { expression })?);
            }
            self.push(IrNode::Block { statements })?
        };
        out.push(self.push(IrNode::While {
            condition,
            body: body_block,
        })?);
        Ok(out)
    }

    /// Recognize `(let i = N; i < M; i++)`-shaped headers and lower them
    /// to a numeric range loop. Returns `None` when the header is not
    /// canonical (wrong variable, inconsistent direction, non-literal
    /// step) so the caller can fall back to the general form.
    fn try_numeric_for(
        &mut self,
        init: NodeId,
        test: NodeId,
        update: NodeId,
        body: NodeId,
    ) -> Result<Option<IrId>, MemoryError> {
        // Header init: exactly one declarator with an initializer.
        let AstNode::VariableDeclaration { declarators, .. } = self.ast.node(init) else {
            return Ok(None);
        };
        let [decl] = declarators.as_slice() else {
            return Ok(None);
        };
        let AstNode::Declarator {
            name,
            init: Some(start),
        } = self.ast.node(*decl).clone()
        else {
            return Ok(None);
        };

        // Header test: `name <op> end` with a comparison operator.
        let AstNode::BinaryExpression { op, left, right } = self.ast.node(test).clone() else {
            return Ok(None);
        };
        if !matches!(
            self.ast.node(left),
            AstNode::Identifier { name: n } if *n == name
        ) {
            return Ok(None);
        }
        let (ascending, inclusive) = match op {
            ast::BinaryOp::Lt => (true, false),
            ast::BinaryOp::LtEq => (true, true),
            ast::BinaryOp::Gt => (false, false),
            ast::BinaryOp::GtEq => (false, true),
            _ => return Ok(None),
        };

        // Header update: `name++`, `name--`, `name += K`, `name -= K`,
        // direction-consistent with the comparison.
        let step_raw: Option<String> = match self.ast.node(update).clone() {
            AstNode::UpdateExpression { op, target, .. } => {
                if !matches!(
                    self.ast.node(target),
                    AstNode::Identifier { name: n } if *n == name
                ) {
                    return Ok(None);
                }
                match (op, ascending) {
                    (ast::UpdateOp::Increment, true) => None,
                    (ast::UpdateOp::Decrement, false) => Some("-1".to_string()),
                    _ => return Ok(None),
                }
            }
            AstNode::AssignmentExpression { op, target, value } => {
                if !matches!(
                    self.ast.node(target),
                    AstNode::Identifier { name: n } if *n == name
                ) {
                    return Ok(None);
                }
                let AstNode::Literal {
                    value: ast::LitValue::Number(raw),
                } = self.ast.node(value).clone()
                else {
                    return Ok(None);
                };
                match (op, ascending) {
                    (ast::AssignOp::AddAssign, true) => {
                        if raw == "1" {
                            None
                        } else {
                            Some(raw)
                        }
                    }
                    (ast::AssignOp::SubAssign, false) => Some(format!("-{raw}")),
                    _ => return Ok(None),
                }
            }
            _ => return Ok(None),
        };

        let start = self.lower_expression(start)?;
        let end = self.lower_expression(right)?;
        let step = match step_raw {
            Some(raw) => Some(self.push(IrNode::Literal {
                value: Literal::Number(raw),
            })?),
            None => None,
        };
        let body = self.lower_body(body)?;
        let id = self.push(IrNode::NumericFor {
            var: name,
            start,
            end,
            step,
            inclusive,
            body,
        })?;
        Ok(Some(id))
    }

    // ── Switch ───────────────────────────────────────────────────────

    /// Desugar `switch` into a fresh selector binding plus an
    /// `if false / elseif ... / else` chain. The leading literal-false
    /// arm keeps every case an `elseif`; `default` becomes the `else`.
    fn lower_switch(
        &mut self,
        discriminant: NodeId,
        cases: &[NodeId],
    ) -> Result<Vec<IrId>, MemoryError> {
        let selector = self.fresh_selector();

        // local <sel> = <discriminant>
        let init = self.lower_expression(discriminant)?;
        let declarator = self.push(IrNode::Declarator {
            name: selector.clone(),
            init: Some(init),
        })?;
        let decl = self.push(IrNode::VariableDeclaration {
            kind: DeclKind::Let,
            declarations: vec![declarator],
        })?;

        // Split arms into tests and the default.
        let mut arms: Vec<(IrId, IrId)> = Vec::new();
        let mut default_block: Option<IrId> = None;
        for &case in cases {
            let AstNode::SwitchCase { test, body } = self.ast.node(case).clone() else {
                continue;
            };
            let block = self.lower_switch_arm(&body)?;
            match test {
                Some(test) => {
                    let sel = self.push(IrNode::Identifier {
                        name: selector.clone(),
                    })?;
                    let value = self.lower_expression(test)?;
                    let condition = self.push(IrNode::Binary {
                        op: BinOp::EqEq,
                        left: sel,
                        right: value,
                    })?;
                    arms.push((condition, block));
                }
                None => default_block = Some(block),
            }
        }

        // Fold the arms right-to-left into nested `If`s.
        let mut alternate = default_block;
        for (condition, block) in arms.into_iter().rev() {
            let arm = self.push(IrNode::If {
                condition,
                consequent: block,
                alternate,
            })?;
            alternate = Some(arm);
        }

        let false_lit = self.push(IrNode::Literal {
            value: Literal::Bool(false),
        })?;
        let empty = self.push(IrNode::Block { statements: vec![] })?;
        let chain = self.push(IrNode::If {
            condition: false_lit,
            consequent: empty,
            alternate,
        })?;

        Ok(vec![decl, chain])
    }

    /// Lower a switch arm body with `break` elision enabled. Loop bodies
    /// nested inside the arm restore `break` on their own because
    /// `lower_statement` for loops goes through `lower_body`, which does
    /// not re-enter arm mode.
    fn lower_switch_arm(&mut self, body: &[NodeId]) -> Result<IrId, MemoryError> {
        let was_in_arm = self.in_switch_arm;
        self.in_switch_arm = true;
        let mut statements = Vec::with_capacity(body.len());
        for &stmt in body {
            // Loops re-enable `break` for their own bodies.
            let reenable = matches!(
                self.ast.node(stmt),
                AstNode::WhileStatement { .. }
                    | AstNode::DoWhileStatement { .. }
                    | AstNode::ForStatement { .. }
                    | AstNode::ForInStatement { .. }
                    | AstNode::ForOfStatement { .. }
            );
            if reenable {
                self.in_switch_arm = false;
            }
            let lowered = self.lower_statement(stmt);
            if reenable {
                self.in_switch_arm = true;
            }
            statements.extend(lowered?);
        }
        self.in_switch_arm = was_in_arm;
        self.push(IrNode::Block { statements })
    }

    /// A selector name that does not collide with anything in the input.
    fn fresh_selector(&mut self) -> String {
        loop {
            let candidate = format!("__switch{}", self.switch_seq);
            self.switch_seq += 1;
            if !self.module.source.contains(&candidate) {
                return candidate;
            }
        }
    }

    // ── Expressions ──────────────────────────────────────────────────

    fn lower_expression(&mut self, id: NodeId) -> Result<IrId, MemoryError> {
        match self.ast.node(id).clone() {
            AstNode::BinaryExpression { op, left, right } => {
                let left = self.lower_expression(left)?;
                let right = self.lower_expression(right)?;
                self.push(IrNode::Binary {
                    op: lower_bin_op(op),
                    left,
                    right,
                })
            }
            AstNode::UnaryExpression { op, operand } => {
                let operand = self.lower_expression(operand)?;
                self.push(IrNode::Unary {
                    op: match op {
                        ast::UnaryOp::Not => UnOp::Not,
                        ast::UnaryOp::Neg => UnOp::Neg,
                    },
                    operand,
                })
            }
            AstNode::UpdateExpression { op, prefix, target } => {
                let target = self.lower_expression(target)?;
                self.push(IrNode::Update {
                    op: match op {
                        ast::UpdateOp::Increment => UpdateOp::Increment,
                        ast::UpdateOp::Decrement => UpdateOp::Decrement,
                    },
                    prefix,
                    target,
                })
            }
            AstNode::AssignmentExpression { op, target, value } => {
                let target = self.lower_expression(target)?;
                let value = self.lower_expression(value)?;
                self.push(IrNode::Assignment {
                    op: lower_assign_op(op),
                    target,
                    value,
                })
            }
            AstNode::ConditionalExpression {
                test,
                consequent,
                alternate,
            } => {
                let condition = self.lower_expression(test)?;
                let consequent = self.lower_expression(consequent)?;
                let alternate = self.lower_expression(alternate)?;
                self.push(IrNode::Conditional {
                    condition,
                    consequent,
                    alternate,
                })
            }
            AstNode::CallExpression { callee, args } => {
                let callee = self.lower_expression(callee)?;
                let mut lowered = Vec::with_capacity(args.len());
                for arg in args {
                    lowered.push(self.lower_expression(arg)?);
                }
                self.push(IrNode::Call {
                    callee,
                    args: lowered,
                })
            }
            AstNode::MemberExpression { object, property } => {
                let object = self.lower_expression(object)?;
                self.push(IrNode::Member { object, property })
            }
            AstNode::IndexExpression { object, index } => {
                let object = self.lower_expression(object)?;
                let index = self.lower_expression(index)?;
                self.push(IrNode::Index { object, index })
            }
            AstNode::ObjectExpression { properties } => {
                let mut lowered = Vec::with_capacity(properties.len());
                for (key, value) in properties {
                    let key = match key {
                        ast::PropKey::Ident(name) => PropKey::Ident(name),
                        ast::PropKey::Str(raw) => PropKey::Str(raw),
                    };
                    let value = self.lower_expression(value)?;
                    lowered.push((key, value));
                }
                self.push(IrNode::Object { properties: lowered })
            }
            AstNode::ArrayExpression { elements } => {
                let mut lowered = Vec::with_capacity(elements.len());
                for element in elements {
                    lowered.push(self.lower_expression(element)?);
                }
                self.push(IrNode::Array { elements: lowered })
            }
            AstNode::GroupedExpression { expression } => {
                let expression = self.lower_expression(expression)?;
                self.push(IrNode::Grouped { expression })
            }
            AstNode::ArrowFunction {
                params,
                body,
                expression_body,
                is_async,
            } => {
                let parameters = self.lower_parameters(&params)?;
                let body = if expression_body {
                    // `x => expr` becomes a one-statement return block.
                    let argument = self.lower_expression(body)?;
                    let ret = self.push(IrNode::Return {
                        argument: Some(argument),
                    })?;
                    self.push(IrNode::Block {
                        statements: vec![ret],
                    })?
                } else {
                    self.lower_body(body)?
                };
                self.push(IrNode::Function {
                    name: None,
                    parameters,
                    body,
                    is_async,
                })
            }
            AstNode::Identifier { name } => self.push(IrNode::Identifier { name }),
            AstNode::Literal { value } => self.push(IrNode::Literal {
                value: match value {
                    ast::LitValue::Number(raw) => Literal::Number(raw),
                    ast::LitValue::Str(raw) => Literal::Str(raw),
                    ast::LitValue::Bool(b) => Literal::Bool(b),
                    // Both null-ish source literals collapse to nil.
                    ast::LitValue::Null | ast::LitValue::Undefined => Literal::Nil,
                },
            }),
            // Statement kinds never reach expression lowering.
            other => {
                debug_assert!(false, "statement in expression position: {other:?}");
                self.push(IrNode::Literal {
                    value: Literal::Nil,
                })
            }
        }
    }
}

fn lower_decl_kind(kind: ast::DeclKind) -> DeclKind {
    match kind {
        ast::DeclKind::Let => DeclKind::Let,
        ast::DeclKind::Const => DeclKind::Const,
        ast::DeclKind::Var => DeclKind::Var,
    }
}

fn lower_bin_op(op: ast::BinaryOp) -> BinOp {
    match op {
        ast::BinaryOp::Add => BinOp::Add,
        ast::BinaryOp::Sub => BinOp::Sub,
        ast::BinaryOp::Mul => BinOp::Mul,
        ast::BinaryOp::Div => BinOp::Div,
        ast::BinaryOp::Rem => BinOp::Rem,
        ast::BinaryOp::Lt => BinOp::Lt,
        ast::BinaryOp::LtEq => BinOp::LtEq,
        ast::BinaryOp::Gt => BinOp::Gt,
        ast::BinaryOp::GtEq => BinOp::GtEq,
        ast::BinaryOp::EqEq => BinOp::EqEq,
        ast::BinaryOp::EqEqEq => BinOp::EqEqEq,
        ast::BinaryOp::NotEq => BinOp::NotEq,
        ast::BinaryOp::NotEqEq => BinOp::NotEqEq,
        ast::BinaryOp::And => BinOp::And,
        ast::BinaryOp::Or => BinOp::Or,
    }
}

fn lower_assign_op(op: ast::AssignOp) -> AssignOp {
    match op {
        ast::AssignOp::Assign => AssignOp::Assign,
        ast::AssignOp::AddAssign => AssignOp::AddAssign,
        ast::AssignOp::SubAssign => AssignOp::SubAssign,
        ast::AssignOp::MulAssign => AssignOp::MulAssign,
        ast::AssignOp::DivAssign => AssignOp::DivAssign,
        ast::AssignOp::RemAssign => AssignOp::RemAssign,
    }
}
