//! Structural validation of lowered modules.
//!
//! The validator never panics on a malformed store: every id is
//! bounds-checked and every problem is collected into the report rather
//! than aborting at the first. A module produced by [`crate::lower`] is
//! expected to validate clean; the checks exist for IR that arrives
//! through the JSON intake or a fuzz harness.

use crate::{IrId, IrModule, IrNode};

/// One problem found in a module.
#[derive(Debug, Clone, PartialEq)]
pub struct IrDiagnostic {
    /// The node the problem was found at, when attributable.
    pub node: Option<IrId>,
    pub message: String,
}

impl IrDiagnostic {
    fn at(node: IrId, message: impl Into<String>) -> Self {
        Self {
            node: Some(node),
            message: message.into(),
        }
    }

    fn module(message: impl Into<String>) -> Self {
        Self {
            node: None,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for IrDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.node {
            Some(id) => write!(f, "node{}: {}", id.0, self.message),
            None => write!(f, "module: {}", self.message),
        }
    }
}

/// Outcome of validating a module.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<IrDiagnostic>,
    pub warnings: Vec<IrDiagnostic>,
}

/// Validate the structural invariants of a module.
///
/// Reports all problems; `valid` is true exactly when no errors (warnings
/// do not count) were found.
pub fn validate(module: &IrModule) -> ValidationReport {
    let mut v = Validator {
        module,
        errors: Vec::new(),
        warnings: Vec::new(),
    };

    for &id in &module.body {
        v.expect_statement(id, "module body");
    }
    for (id, node) in module.iter() {
        v.check_node(id, node);
    }
    v.check_expression_cycles();

    ValidationReport {
        valid: v.errors.is_empty(),
        errors: v.errors,
        warnings: v.warnings,
    }
}

struct Validator<'a> {
    module: &'a IrModule,
    errors: Vec<IrDiagnostic>,
    warnings: Vec<IrDiagnostic>,
}

impl<'a> Validator<'a> {
    fn error(&mut self, node: IrId, message: impl Into<String>) {
        self.errors.push(IrDiagnostic::at(node, message));
    }

    fn exists(&mut self, id: IrId, context: &str) -> bool {
        if self.module.get(id).is_some() {
            true
        } else {
            self.errors.push(IrDiagnostic::module(format!(
                "{context} references missing node{}",
                id.0
            )));
            false
        }
    }

    fn expect_statement(&mut self, id: IrId, context: &str) {
        if !self.exists(id, context) {
            return;
        }
        let node = self.module.node(id);
        if !node.is_statement() {
            self.errors.push(IrDiagnostic::at(
                id,
                format!("{} is not a statement kind in {context}", node.kind_name()),
            ));
        }
    }

    fn expect_expression(&mut self, id: IrId, context: &str) {
        if !self.exists(id, context) {
            return;
        }
        let node = self.module.node(id);
        if !node.is_expression() {
            self.errors.push(IrDiagnostic::at(
                id,
                format!("{} is not an expression kind in {context}", node.kind_name()),
            ));
        }
    }

    fn check_node(&mut self, id: IrId, node: &IrNode) {
        match node {
            IrNode::Block { statements } => {
                for &stmt in statements {
                    self.expect_statement(stmt, "block statements");
                }
            }
            IrNode::VariableDeclaration { declarations, .. } => {
                if declarations.is_empty() {
                    self.error(id, "variable declaration has no declarations");
                }
                for &decl in declarations {
                    if !self.exists(decl, "declaration list") {
                        continue;
                    }
                    match self.module.node(decl) {
                        IrNode::Declarator { name, init } => {
                            if name.is_empty() {
                                self.error(decl, "declarator has an empty name");
                            }
                            if let Some(init) = *init {
                                self.expect_expression(init, "declarator initializer");
                            }
                        }
                        other => self.error(
                            decl,
                            format!("expected VariableDeclarator, found {}", other.kind_name()),
                        ),
                    }
                }
            }
            IrNode::Function {
                name,
                parameters,
                body,
                ..
            } => {
                if let Some(name) = name {
                    if name.is_empty() {
                        self.error(id, "function declaration has an empty name");
                    }
                }
                for &param in parameters {
                    if !self.exists(param, "parameter list") {
                        continue;
                    }
                    if !matches!(self.module.node(param), IrNode::Parameter { .. }) {
                        self.error(param, "function parameter is not a Parameter node");
                    }
                }
                if self.exists(*body, "function body")
                    && !matches!(self.module.node(*body), IrNode::Block { .. })
                {
                    self.error(*body, "function body is not a BlockStatement");
                }
            }
            IrNode::Parameter { name } => {
                if name.is_empty() {
                    self.error(id, "parameter has an empty name");
                }
            }
            IrNode::If {
                condition,
                consequent,
                alternate,
            } => {
                self.expect_expression(*condition, "if condition");
                self.expect_statement(*consequent, "if consequent");
                if let Some(alt) = *alternate {
                    self.expect_statement(alt, "if alternate");
                }
            }
            IrNode::While { condition, body } => {
                self.expect_expression(*condition, "while condition");
                self.expect_statement(*body, "while body");
            }
            IrNode::DoWhile { body, condition } => {
                self.expect_statement(*body, "do-while body");
                self.expect_expression(*condition, "do-while condition");
            }
            IrNode::NumericFor {
                var,
                start,
                end,
                step,
                body,
                ..
            } => {
                if var.is_empty() {
                    self.error(id, "numeric for has an empty loop variable");
                }
                self.expect_expression(*start, "numeric for start");
                self.expect_expression(*end, "numeric for end");
                if let Some(step) = *step {
                    self.expect_expression(step, "numeric for step");
                }
                self.expect_statement(*body, "numeric for body");
            }
            IrNode::ForIn { key, object, body } => {
                if key.is_empty() {
                    self.error(id, "for-in has an empty key variable");
                }
                self.expect_expression(*object, "for-in object");
                self.expect_statement(*body, "for-in body");
            }
            IrNode::ForOf {
                value,
                iterable,
                body,
            } => {
                if value.is_empty() {
                    self.error(id, "for-of has an empty value variable");
                }
                self.expect_expression(*iterable, "for-of iterable");
                self.expect_statement(*body, "for-of body");
            }
            IrNode::Return { argument } => {
                if let Some(arg) = *argument {
                    self.expect_expression(arg, "return argument");
                }
            }
            IrNode::Break => {}
            IrNode::ExpressionStatement { expression } => {
                self.expect_expression(*expression, "expression statement");
            }
            IrNode::Binary { left, right, .. } => {
                self.expect_expression(*left, "binary left operand");
                self.expect_expression(*right, "binary right operand");
            }
            IrNode::Unary { operand, .. } => {
                self.expect_expression(*operand, "unary operand");
            }
            IrNode::Update { target, .. } => {
                self.expect_expression(*target, "update target");
            }
            IrNode::Assignment { target, value, .. } => {
                self.expect_expression(*target, "assignment target");
                self.expect_expression(*value, "assignment value");
            }
            IrNode::Conditional {
                condition,
                consequent,
                alternate,
            } => {
                self.expect_expression(*condition, "conditional condition");
                self.expect_expression(*consequent, "conditional consequent");
                self.expect_expression(*alternate, "conditional alternate");
            }
            IrNode::Call { callee, args } => {
                self.expect_expression(*callee, "call callee");
                for &arg in args {
                    self.expect_expression(arg, "call args");
                }
            }
            IrNode::Member { object, property } => {
                self.expect_expression(*object, "member object");
                if property.is_empty() {
                    self.error(id, "member access has an empty property name");
                }
            }
            IrNode::Index { object, index } => {
                self.expect_expression(*object, "index object");
                self.expect_expression(*index, "index expression");
            }
            IrNode::Object { properties } => {
                for (_, value) in properties {
                    self.expect_expression(*value, "object property value");
                }
            }
            IrNode::Array { elements } => {
                for &element in elements {
                    self.expect_expression(element, "array element");
                }
            }
            IrNode::Grouped { expression } => {
                self.expect_expression(*expression, "grouped expression");
            }
            IrNode::Identifier { name } => {
                if name.is_empty() {
                    self.error(id, "identifier has an empty name");
                }
            }
            IrNode::Literal { .. } => {}
            IrNode::Declarator { name, init } => {
                if name.is_empty() {
                    self.error(id, "declarator has an empty name");
                }
                if let Some(init) = *init {
                    self.expect_expression(init, "declarator initializer");
                }
            }
        }
    }

    /// Detect cycles along expression edges. Function bodies are exempt:
    /// a function may (via calls) reach itself, which is fine; what must
    /// not happen is an expression containing itself as a subexpression.
    fn check_expression_cycles(&mut self) {
        #[derive(Clone, Copy, PartialEq)]
        enum State {
            Unvisited,
            InProgress,
            Done,
        }

        let len = self.module.len();
        let mut state = vec![State::Unvisited; len];
        let mut cycles: Vec<IrId> = Vec::new();

        // Iterative DFS with an explicit stack of (id, child cursor).
        for root in 0..len {
            if state[root] != State::Unvisited {
                continue;
            }
            let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
            state[root] = State::InProgress;
            while let Some(&(node, cursor)) = stack.last() {
                let children = expression_children(self.module.node(IrId(node as u32)));
                if cursor >= children.len() {
                    state[node] = State::Done;
                    stack.pop();
                    continue;
                }
                stack.last_mut().expect("stack is non-empty").1 += 1;
                let child = children[cursor].0 as usize;
                if child >= len {
                    // Missing-node errors are reported elsewhere.
                    continue;
                }
                match state[child] {
                    State::Unvisited => {
                        state[child] = State::InProgress;
                        stack.push((child, 0));
                    }
                    State::InProgress => cycles.push(IrId(child as u32)),
                    State::Done => {}
                }
            }
        }

        for id in cycles {
            self.error(id, "expression reachable from itself (cycle in IR)");
        }
    }
}

/// Children of a node along expression edges only; function bodies are
/// not descended into.
fn expression_children(node: &IrNode) -> Vec<IrId> {
    match node {
        IrNode::Binary { left, right, .. } => vec![*left, *right],
        IrNode::Unary { operand, .. } => vec![*operand],
        IrNode::Update { target, .. } => vec![*target],
        IrNode::Assignment { target, value, .. } => vec![*target, *value],
        IrNode::Conditional {
            condition,
            consequent,
            alternate,
        } => vec![*condition, *consequent, *alternate],
        IrNode::Call { callee, args } => {
            let mut out = vec![*callee];
            out.extend(args.iter().copied());
            out
        }
        IrNode::Member { object, .. } => vec![*object],
        IrNode::Index { object, index } => vec![*object, *index],
        IrNode::Object { properties } => properties.iter().map(|(_, v)| *v).collect(),
        IrNode::Array { elements } => elements.clone(),
        IrNode::Grouped { expression } => vec![*expression],
        _ => Vec::new(),
    }
}
