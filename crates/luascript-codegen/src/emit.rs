//! IR-to-Lua rendering.
//!
//! The emitter walks a validated module and prints Lua source. Operator
//! substitutions happen here (`===`/`==` to `==`, `!=`/`!==` to `~=`,
//! `&&`/`||` to `and`/`or`, `!` to `not`), as does the string-concatenation
//! decision: a `+` whose chain contains a string literal renders as `..`,
//! every other `+` stays arithmetic. Statements the target lacks are
//! printed in their expanded form (compound assignments, `++`/`--`,
//! ternary as `and`/`or`, `repeat`/`until` for do-while).

use std::fmt;

use luascript_ir::{AssignOp, BinOp, IrId, IrModule, IrNode, Literal, PropKey, UnOp, UpdateOp};

/// Emitter configuration.
#[derive(Debug, Clone)]
pub struct EmitConfig {
    /// One level of indentation. Default: two spaces.
    pub indent: String,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
        }
    }
}

/// An emitter invariant was broken. Should not occur for modules that
/// passed validation; kept typed so the driver can report it faithfully.
#[derive(Debug, Clone, PartialEq)]
pub struct EmitError {
    pub message: String,
}

impl EmitError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for EmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EmitError {}

/// Render a module as Lua source text.
pub fn emit(module: &IrModule, config: &EmitConfig) -> Result<String, EmitError> {
    let emitter = Emitter { module, config };
    let mut out = String::new();
    for &stmt in &module.body {
        emitter.statement(stmt, 0, &mut out)?;
    }
    Ok(out)
}

/// Rendering precedence of the Lua output, used to decide where
/// parentheses are required. Higher binds tighter.
const PREC_OR: u8 = 1;
const PREC_AND: u8 = 2;
const PREC_COMPARE: u8 = 3;
const PREC_CONCAT: u8 = 4;
const PREC_ADD: u8 = 5;
const PREC_MUL: u8 = 6;
const PREC_UNARY: u8 = 7;
const PREC_ATOM: u8 = 10;

struct Emitter<'a> {
    module: &'a IrModule,
    config: &'a EmitConfig,
}

impl<'a> Emitter<'a> {
    fn indent(&self, level: usize) -> String {
        self.config.indent.repeat(level)
    }

    fn line(&self, level: usize, text: &str, out: &mut String) {
        out.push_str(&self.indent(level));
        out.push_str(text);
        out.push('\n');
    }

    // ── Statements ───────────────────────────────────────────────────

    fn statement(&self, id: IrId, level: usize, out: &mut String) -> Result<(), EmitError> {
        match self.module.node(id) {
            IrNode::Block { statements } => {
                self.line(level, "do", out);
                for &stmt in statements {
                    self.statement(stmt, level + 1, out)?;
                }
                self.line(level, "end", out);
                Ok(())
            }
            IrNode::VariableDeclaration { declarations, .. } => {
                self.variable_declaration(declarations, level, out)
            }
            IrNode::Function {
                name: Some(name),
                parameters,
                body,
                ..
            } => {
                let params = self.parameter_names(parameters)?;
                self.line(
                    level,
                    &format!("local function {name}({})", params.join(", ")),
                    out,
                );
                self.block_body(*body, level + 1, out)?;
                self.line(level, "end", out);
                Ok(())
            }
            IrNode::If { .. } => self.if_chain(id, level, true, out),
            IrNode::While { condition, body } => {
                let cond = self.expr(*condition, PREC_OR, level)?;
                self.line(level, &format!("while {cond} do"), out);
                self.block_body(*body, level + 1, out)?;
                self.line(level, "end", out);
                Ok(())
            }
            IrNode::DoWhile { body, condition } => {
                self.line(level, "repeat", out);
                self.block_body(*body, level + 1, out)?;
                let cond = self.expr_raw(*condition, level)?;
                self.line(level, &format!("until not ({cond})"), out);
                Ok(())
            }
            IrNode::NumericFor {
                var,
                start,
                end,
                step,
                inclusive,
                body,
            } => {
                let start = self.expr(*start, PREC_OR, level)?;
                let bound = self.numeric_bound(*end, *step, *inclusive, level)?;
                let header = match step {
                    Some(step) => {
                        let step = self.expr(*step, PREC_OR, level)?;
                        format!("for {var} = {start}, {bound}, {step} do")
                    }
                    None => format!("for {var} = {start}, {bound} do"),
                };
                self.line(level, &header, out);
                self.block_body(*body, level + 1, out)?;
                self.line(level, "end", out);
                Ok(())
            }
            IrNode::ForIn { key, object, body } => {
                let object = self.expr(*object, PREC_OR, level)?;
                self.line(level, &format!("for {key}, _ in pairs({object}) do"), out);
                self.block_body(*body, level + 1, out)?;
                self.line(level, "end", out);
                Ok(())
            }
            IrNode::ForOf {
                value,
                iterable,
                body,
            } => {
                let iterable = self.expr(*iterable, PREC_OR, level)?;
                self.line(level, &format!("for _, {value} in ipairs({iterable}) do"), out);
                self.block_body(*body, level + 1, out)?;
                self.line(level, "end", out);
                Ok(())
            }
            IrNode::Return { argument } => {
                match argument {
                    Some(arg) => {
                        let arg = self.expr(*arg, PREC_OR, level)?;
                        self.line(level, &format!("return {arg}"), out);
                    }
                    None => self.line(level, "return", out),
                }
                Ok(())
            }
            IrNode::Break => {
                self.line(level, "break", out);
                Ok(())
            }
            IrNode::ExpressionStatement { expression } => {
                self.expression_statement(*expression, level, out)
            }
            other => Err(EmitError::new(format!(
                "{} cannot be emitted in statement position",
                other.kind_name()
            ))),
        }
    }

    /// `local a, b = 1, 2`, trimming a trailing run of `nil` initializers.
    fn variable_declaration(
        &self,
        declarations: &[IrId],
        level: usize,
        out: &mut String,
    ) -> Result<(), EmitError> {
        let mut names = Vec::with_capacity(declarations.len());
        // `None` marks a declarator without an initializer; those become
        // `nil` fillers only when a later declarator has a value.
        let mut values: Vec<Option<String>> = Vec::with_capacity(declarations.len());
        for &decl in declarations {
            let IrNode::Declarator { name, init } = self.module.node(decl) else {
                return Err(EmitError::new("declaration list holds a non-declarator"));
            };
            names.push(name.clone());
            match init {
                Some(init) => values.push(Some(self.expr(*init, PREC_OR, level)?)),
                None => values.push(None),
            }
        }
        while values.last().is_some_and(Option::is_none) {
            values.pop();
        }
        let text = if values.is_empty() {
            format!("local {}", names.join(", "))
        } else {
            let rendered: Vec<String> = values
                .into_iter()
                .map(|v| v.unwrap_or_else(|| "nil".to_string()))
                .collect();
            format!("local {} = {}", names.join(", "), rendered.join(", "))
        };
        self.line(level, &text, out);
        Ok(())
    }

    /// Render an `if`/`elseif` chain. Nested `If` nodes in the alternate
    /// position continue the chain; a block alternate becomes `else`.
    fn if_chain(
        &self,
        id: IrId,
        level: usize,
        head: bool,
        out: &mut String,
    ) -> Result<(), EmitError> {
        let IrNode::If {
            condition,
            consequent,
            alternate,
        } = self.module.node(id)
        else {
            return Err(EmitError::new("if chain reached a non-if node"));
        };
        let cond = self.expr(*condition, PREC_OR, level)?;
        let keyword = if head { "if" } else { "elseif" };
        self.line(level, &format!("{keyword} {cond} then"), out);
        self.block_body(*consequent, level + 1, out)?;
        match alternate {
            // The chain continues; the tail prints the shared `end`.
            Some(alt) if matches!(self.module.node(*alt), IrNode::If { .. }) => {
                self.if_chain(*alt, level, false, out)?;
            }
            Some(alt) => {
                self.line(level, "else", out);
                self.block_body(*alt, level + 1, out)?;
                self.line(level, "end", out);
            }
            None => self.line(level, "end", out),
        }
        Ok(())
    }

    /// Emit the statements of a block body without the `do`/`end` frame.
    fn block_body(&self, id: IrId, level: usize, out: &mut String) -> Result<(), EmitError> {
        match self.module.node(id) {
            IrNode::Block { statements } => {
                for &stmt in statements {
                    self.statement(stmt, level, out)?;
                }
                Ok(())
            }
            _ => self.statement(id, level, out),
        }
    }

    /// The upper (or lower) bound of a numeric for: exclusive bounds are
    /// shifted by one in the direction of travel.
    fn numeric_bound(
        &self,
        end: IrId,
        step: Option<IrId>,
        inclusive: bool,
        level: usize,
    ) -> Result<String, EmitError> {
        let rendered = self.expr(end, PREC_ADD, level)?;
        if inclusive {
            return Ok(rendered);
        }
        let descending = match step {
            Some(step) => matches!(
                self.module.node(step),
                IrNode::Literal { value: Literal::Number(raw) } if raw.starts_with('-')
            ),
            None => false,
        };
        if descending {
            Ok(format!("{rendered} + 1"))
        } else {
            Ok(format!("{rendered} - 1"))
        }
    }

    /// Statement-position expressions: assignments and updates expand to
    /// Lua assignment statements, calls stay calls, anything else is
    /// bound to a throwaway local so the line remains a valid statement.
    fn expression_statement(
        &self,
        id: IrId,
        level: usize,
        out: &mut String,
    ) -> Result<(), EmitError> {
        match self.module.node(id) {
            IrNode::Assignment { op, target, value } => {
                let target = self.expr(*target, PREC_ATOM, level)?;
                let value_str = self.expr(*value, PREC_OR, level)?;
                let text = match op.expansion() {
                    None => format!("{target} = {value_str}"),
                    Some(op_str) => {
                        // `msg += "…"` concatenates like bare `+` does.
                        let op_str = if *op == AssignOp::AddAssign && self.stringy(*value) {
                            ".."
                        } else {
                            op_str
                        };
                        format!("{target} = {target} {op_str} {value_str}")
                    }
                };
                self.line(level, &text, out);
                Ok(())
            }
            IrNode::Update { op, target, .. } => {
                let target = self.expr(*target, PREC_ATOM, level)?;
                let op_str = match op {
                    UpdateOp::Increment => "+",
                    UpdateOp::Decrement => "-",
                };
                self.line(level, &format!("{target} = {target} {op_str} 1"), out);
                Ok(())
            }
            IrNode::Call { .. } => {
                let call = self.expr(id, PREC_ATOM, level)?;
                self.line(level, &call, out);
                Ok(())
            }
            _ => {
                let value = self.expr(id, PREC_OR, level)?;
                self.line(level, &format!("local _ = {value}"), out);
                Ok(())
            }
        }
    }

    // ── Expressions ──────────────────────────────────────────────────

    /// Render an expression, parenthesizing when its precedence is below
    /// what the context requires.
    fn expr(&self, id: IrId, min_prec: u8, level: usize) -> Result<String, EmitError> {
        let rendered = self.expr_raw(id, level)?;
        if self.prec(id) < min_prec {
            Ok(format!("({rendered})"))
        } else {
            Ok(rendered)
        }
    }

    fn expr_raw(&self, id: IrId, level: usize) -> Result<String, EmitError> {
        match self.module.node(id) {
            IrNode::Identifier { name } => Ok(name.clone()),
            IrNode::Literal { value } => Ok(render_literal(value)),
            IrNode::Grouped { expression } => {
                let inner = self.expr_raw(*expression, level)?;
                Ok(format!("({inner})"))
            }
            IrNode::Binary { op, left, right } => {
                let prec = self.prec(id);
                let op_str = if *op == BinOp::Add && self.stringy(id) {
                    ".."
                } else {
                    lua_bin_op(*op)
                };
                // Comparisons are non-associative in Lua; a chained
                // comparison operand must keep its parentheses.
                let left_min = if prec == PREC_COMPARE { prec + 1 } else { prec };
                let left = self.expr(*left, left_min, level)?;
                let right = self.expr(*right, prec + 1, level)?;
                Ok(format!("{left} {op_str} {right}"))
            }
            IrNode::Unary { op, operand } => {
                let operand = self.expr(*operand, PREC_UNARY, level)?;
                Ok(match op {
                    UnOp::Not => format!("not {operand}"),
                    // `--x` would open a comment; parenthesize nested minus.
                    UnOp::Neg if operand.starts_with('-') => format!("-({operand})"),
                    UnOp::Neg => format!("-{operand}"),
                })
            }
            IrNode::Conditional {
                condition,
                consequent,
                alternate,
            } => {
                // `a ? b : c` becomes `(a) and b or c`.
                let cond = self.expr_raw(*condition, level)?;
                let consequent = self.expr(*consequent, PREC_COMPARE, level)?;
                let alternate = self.expr(*alternate, PREC_COMPARE, level)?;
                Ok(format!("({cond}) and {consequent} or {alternate}"))
            }
            IrNode::Call { callee, args } => {
                let callee = self.expr(*callee, PREC_ATOM, level)?;
                let mut rendered = Vec::with_capacity(args.len());
                for &arg in args {
                    rendered.push(self.expr(arg, PREC_OR, level)?);
                }
                Ok(format!("{callee}({})", rendered.join(", ")))
            }
            IrNode::Member { object, property } => {
                let object_str = self.expr(*object, PREC_ATOM, level)?;
                if property == "length" {
                    // `.length` maps onto Lua's length operator.
                    Ok(format!("#{object_str}"))
                } else {
                    Ok(format!("{object_str}.{property}"))
                }
            }
            IrNode::Index { object, index } => {
                let object = self.expr(*object, PREC_ATOM, level)?;
                let index = self.expr(*index, PREC_OR, level)?;
                Ok(format!("{object}[{index}]"))
            }
            IrNode::Object { properties } => {
                if properties.is_empty() {
                    return Ok("{}".to_string());
                }
                let mut fields = Vec::with_capacity(properties.len());
                for (key, value) in properties {
                    let value = self.expr(*value, PREC_OR, level)?;
                    fields.push(match key {
                        PropKey::Ident(name) => format!("{name} = {value}"),
                        PropKey::Str(raw) => format!("[{raw}] = {value}"),
                    });
                }
                Ok(format!("{{ {} }}", fields.join(", ")))
            }
            IrNode::Array { elements } => {
                if elements.is_empty() {
                    return Ok("{}".to_string());
                }
                let mut rendered = Vec::with_capacity(elements.len());
                for &element in elements {
                    rendered.push(self.expr(element, PREC_OR, level)?);
                }
                Ok(format!("{{{}}}", rendered.join(", ")))
            }
            IrNode::Function {
                name: None,
                parameters,
                body,
                ..
            } => self.function_expr(parameters, *body, level),
            IrNode::Update { .. } | IrNode::Assignment { .. } => Err(EmitError::new(
                "increment and assignment have no Lua expression form",
            )),
            other => Err(EmitError::new(format!(
                "{} cannot be emitted in expression position",
                other.kind_name()
            ))),
        }
    }

    /// An anonymous function expression. Single-`return` bodies render on
    /// one line (`function(x) return x + 1 end`); anything else breaks
    /// across lines at the current indentation.
    fn function_expr(
        &self,
        parameters: &[IrId],
        body: IrId,
        level: usize,
    ) -> Result<String, EmitError> {
        let params = self.parameter_names(parameters)?.join(", ");
        let IrNode::Block { statements } = self.module.node(body) else {
            return Err(EmitError::new("function body is not a block"));
        };

        if statements.is_empty() {
            return Ok(format!("function({params}) end"));
        }
        if statements.len() == 1 {
            if let IrNode::Return { argument } = self.module.node(statements[0]) {
                let text = match argument {
                    Some(arg) => {
                        let arg = self.expr(*arg, PREC_OR, level)?;
                        format!("function({params}) return {arg} end")
                    }
                    None => format!("function({params}) return end"),
                };
                return Ok(text);
            }
        }

        let mut out = format!("function({params})\n");
        for &stmt in statements {
            self.statement(stmt, level + 1, &mut out)?;
        }
        out.push_str(&self.indent(level));
        out.push_str("end");
        Ok(out)
    }

    fn parameter_names(&self, parameters: &[IrId]) -> Result<Vec<String>, EmitError> {
        parameters
            .iter()
            .map(|&id| match self.module.node(id) {
                IrNode::Parameter { name } => Ok(name.clone()),
                other => Err(EmitError::new(format!(
                    "parameter list holds a {}",
                    other.kind_name()
                ))),
            })
            .collect()
    }

    // ── Classification ───────────────────────────────────────────────

    /// Rendering precedence of the node's Lua form.
    fn prec(&self, id: IrId) -> u8 {
        match self.module.node(id) {
            IrNode::Binary { op, .. } => match op {
                BinOp::Or => PREC_OR,
                BinOp::And => PREC_AND,
                BinOp::Lt
                | BinOp::LtEq
                | BinOp::Gt
                | BinOp::GtEq
                | BinOp::EqEq
                | BinOp::EqEqEq
                | BinOp::NotEq
                | BinOp::NotEqEq => PREC_COMPARE,
                BinOp::Add => {
                    if self.stringy(id) {
                        PREC_CONCAT
                    } else {
                        PREC_ADD
                    }
                }
                BinOp::Sub => PREC_ADD,
                BinOp::Mul | BinOp::Div | BinOp::Rem => PREC_MUL,
            },
            IrNode::Unary { .. } => PREC_UNARY,
            IrNode::Conditional { .. } => PREC_OR,
            // `.length` renders as the `#` unary operator.
            IrNode::Member { property, .. } if property == "length" => PREC_UNARY,
            _ => PREC_ATOM,
        }
    }

    /// Whether a `+` over this expression concatenates: true when the
    /// node is a string literal, or an additive/grouped chain containing
    /// one.
    fn stringy(&self, id: IrId) -> bool {
        match self.module.node(id) {
            IrNode::Literal {
                value: Literal::Str(_),
            } => true,
            IrNode::Binary {
                op: BinOp::Add,
                left,
                right,
            } => self.stringy(*left) || self.stringy(*right),
            IrNode::Grouped { expression } => self.stringy(*expression),
            _ => false,
        }
    }
}

fn lua_bin_op(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Rem => "%",
        BinOp::Lt => "<",
        BinOp::LtEq => "<=",
        BinOp::Gt => ">",
        BinOp::GtEq => ">=",
        BinOp::EqEq | BinOp::EqEqEq => "==",
        BinOp::NotEq | BinOp::NotEqEq => "~=",
        BinOp::And => "and",
        BinOp::Or => "or",
    }
}

fn render_literal(value: &Literal) -> String {
    match value {
        Literal::Number(raw) | Literal::Str(raw) => raw.clone(),
        Literal::Bool(true) => "true".to_string(),
        Literal::Bool(false) => "false".to_string(),
        Literal::Nil => "nil".to_string(),
    }
}
