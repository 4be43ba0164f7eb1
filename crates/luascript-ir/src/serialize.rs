//! JSON serialization of IR modules.
//!
//! The document shape is `{ module: { source, body, metadata }, nodes:
//! { nodeN: { kind, ... } } }` with stable `nodeN` ids, monotonic within a
//! call. Emission uses only the canonical field names; intake
//! ([`module_from_json`]) additionally tolerates the legacy names
//! (`body` for `statements`, `params` for `parameters`, `test` for
//! `condition`, `arguments` for `args`) and normalizes them into the
//! typed store. Unknown node kinds are preserved as `nil` literal
//! placeholders and reported as warnings, never as errors.

use std::fmt;

use serde_json::{json, Map, Value};

use crate::{
    AssignOp, BinOp, DeclKind, IrId, IrModule, IrNode, Literal, Metadata, PropKey, UnOp, UpdateOp,
};

/// A structurally unusable document (not an object, missing sections,
/// malformed ids). Tolerated irregularities become warnings instead.
#[derive(Debug, Clone, PartialEq)]
pub struct IntakeError {
    pub message: String,
}

impl IntakeError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for IntakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for IntakeError {}

fn id_key(id: IrId) -> String {
    format!("node{}", id.0)
}

fn id_value(id: IrId) -> Value {
    Value::String(id_key(id))
}

fn opt_id_value(id: Option<IrId>) -> Value {
    match id {
        Some(id) => id_value(id),
        None => Value::Null,
    }
}

fn id_list(ids: &[IrId]) -> Value {
    Value::Array(ids.iter().map(|&id| id_value(id)).collect())
}

// ── Emission ─────────────────────────────────────────────────────────

/// Serialize a module to the interchange document.
pub fn module_to_json(module: &IrModule) -> Value {
    let mut nodes = Map::new();
    for (id, node) in module.iter() {
        nodes.insert(id_key(id), node_to_json(node));
    }
    json!({
        "module": {
            "source": module.source,
            "body": id_list(&module.body),
            "metadata": {
                "filename": module.metadata.filename,
                "nodeCount": module.metadata.node_count,
            },
        },
        "nodes": Value::Object(nodes),
    })
}

fn literal_to_json(value: &Literal) -> Value {
    match value {
        Literal::Number(raw) => json!({ "type": "number", "raw": raw }),
        Literal::Str(raw) => json!({ "type": "string", "raw": raw }),
        Literal::Bool(b) => json!({ "type": "boolean", "value": b }),
        Literal::Nil => json!({ "type": "nil" }),
    }
}

fn prop_key_to_json(key: &PropKey) -> Value {
    match key {
        PropKey::Ident(name) => json!({ "type": "identifier", "name": name }),
        PropKey::Str(raw) => json!({ "type": "string", "raw": raw }),
    }
}

fn node_to_json(node: &IrNode) -> Value {
    let kind = node.kind_name();
    match node {
        IrNode::Block { statements } => json!({
            "kind": kind,
            "statements": id_list(statements),
        }),
        IrNode::VariableDeclaration { kind: decl, declarations } => json!({
            "kind": kind,
            "declKind": decl.as_str(),
            "declarations": id_list(declarations),
        }),
        IrNode::Declarator { name, init } => json!({
            "kind": kind,
            "name": name,
            "init": opt_id_value(*init),
        }),
        IrNode::Function {
            name,
            parameters,
            body,
            is_async,
        } => json!({
            "kind": kind,
            "name": name,
            "parameters": id_list(parameters),
            "body": id_value(*body),
            "isAsync": is_async,
        }),
        IrNode::Parameter { name } => json!({ "kind": kind, "name": name }),
        IrNode::If {
            condition,
            consequent,
            alternate,
        } => json!({
            "kind": kind,
            "condition": id_value(*condition),
            "consequent": id_value(*consequent),
            "alternate": opt_id_value(*alternate),
        }),
        IrNode::While { condition, body } => json!({
            "kind": kind,
            "condition": id_value(*condition),
            "body": id_value(*body),
        }),
        IrNode::DoWhile { body, condition } => json!({
            "kind": kind,
            "body": id_value(*body),
            "condition": id_value(*condition),
        }),
        IrNode::NumericFor {
            var,
            start,
            end,
            step,
            inclusive,
            body,
        } => json!({
            "kind": kind,
            "var": var,
            "start": id_value(*start),
            "end": id_value(*end),
            "step": opt_id_value(*step),
            "inclusive": inclusive,
            "body": id_value(*body),
        }),
        IrNode::ForIn { key, object, body } => json!({
            "kind": kind,
            "key": key,
            "object": id_value(*object),
            "body": id_value(*body),
        }),
        IrNode::ForOf {
            value,
            iterable,
            body,
        } => json!({
            "kind": kind,
            "value": value,
            "iterable": id_value(*iterable),
            "body": id_value(*body),
        }),
        IrNode::Return { argument } => json!({
            "kind": kind,
            "argument": opt_id_value(*argument),
        }),
        IrNode::Break => json!({ "kind": kind }),
        IrNode::ExpressionStatement { expression } => json!({
            "kind": kind,
            "expression": id_value(*expression),
        }),
        IrNode::Binary { op, left, right } => json!({
            "kind": kind,
            "op": op.as_str(),
            "left": id_value(*left),
            "right": id_value(*right),
        }),
        IrNode::Unary { op, operand } => json!({
            "kind": kind,
            "op": op.as_str(),
            "operand": id_value(*operand),
        }),
        IrNode::Update { op, prefix, target } => json!({
            "kind": kind,
            "op": op.as_str(),
            "prefix": prefix,
            "target": id_value(*target),
        }),
        IrNode::Assignment { op, target, value } => json!({
            "kind": kind,
            "op": op.as_str(),
            "target": id_value(*target),
            "value": id_value(*value),
        }),
        IrNode::Conditional {
            condition,
            consequent,
            alternate,
        } => json!({
            "kind": kind,
            "condition": id_value(*condition),
            "consequent": id_value(*consequent),
            "alternate": id_value(*alternate),
        }),
        IrNode::Call { callee, args } => json!({
            "kind": kind,
            "callee": id_value(*callee),
            "args": id_list(args),
        }),
        IrNode::Member { object, property } => json!({
            "kind": kind,
            "object": id_value(*object),
            "property": property,
        }),
        IrNode::Index { object, index } => json!({
            "kind": kind,
            "object": id_value(*object),
            "index": id_value(*index),
        }),
        IrNode::Object { properties } => json!({
            "kind": kind,
            "properties": properties
                .iter()
                .map(|(key, value)| json!({
                    "key": prop_key_to_json(key),
                    "value": id_value(*value),
                }))
                .collect::<Vec<_>>(),
        }),
        IrNode::Array { elements } => json!({
            "kind": kind,
            "elements": id_list(elements),
        }),
        IrNode::Grouped { expression } => json!({
            "kind": kind,
            "expression": id_value(*expression),
        }),
        IrNode::Identifier { name } => json!({ "kind": kind, "name": name }),
        IrNode::Literal { value } => json!({
            "kind": kind,
            "value": literal_to_json(value),
        }),
    }
}

// ── Intake ───────────────────────────────────────────────────────────

/// Deserialize a document into a typed module, normalizing legacy field
/// names. Returns the module plus intake warnings (unknown kinds,
/// gap-filled ids).
pub fn module_from_json(value: &Value) -> Result<(IrModule, Vec<String>), IntakeError> {
    let root = value
        .as_object()
        .ok_or_else(|| IntakeError::new("document is not an object"))?;
    let module_rec = root
        .get("module")
        .and_then(Value::as_object)
        .ok_or_else(|| IntakeError::new("document has no module record"))?;
    let nodes_rec = root
        .get("nodes")
        .and_then(Value::as_object)
        .ok_or_else(|| IntakeError::new("document has no nodes mapping"))?;

    let mut warnings = Vec::new();

    let source = module_rec
        .get("source")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let mut module = IrModule::new(source);

    // Metadata is best-effort: absent fields default.
    if let Some(metadata) = module_rec.get("metadata").and_then(Value::as_object) {
        module.metadata = Metadata {
            filename: metadata
                .get("filename")
                .and_then(Value::as_str)
                .map(str::to_string),
            node_count: metadata
                .get("nodeCount")
                .and_then(Value::as_u64)
                .unwrap_or(0) as usize,
        };
    }

    // Determine the store size from the highest id present.
    let mut max_id: Option<u32> = None;
    for key in nodes_rec.keys() {
        let id = parse_id(key)
            .ok_or_else(|| IntakeError::new(format!("malformed node id {key:?}")))?;
        max_id = Some(max_id.map_or(id, |m| m.max(id)));
    }

    if let Some(max_id) = max_id {
        for n in 0..=max_id {
            let key = format!("node{n}");
            let node = match nodes_rec.get(&key) {
                Some(value) => node_from_json(value, &key, &mut warnings)?,
                None => {
                    warnings.push(format!("missing {key}; filled with nil literal"));
                    IrNode::Literal {
                        value: Literal::Nil,
                    }
                }
            };
            module
                .push(node, usize::MAX)
                .expect("unbounded push cannot fail");
        }
    }

    let body = module_rec
        .get("body")
        .or_else(|| module_rec.get("statements"))
        .and_then(Value::as_array)
        .ok_or_else(|| IntakeError::new("module record has no body list"))?;
    for entry in body {
        module.body.push(parse_id_value(entry, "module body")?);
    }

    Ok((module, warnings))
}

fn parse_id(key: &str) -> Option<u32> {
    key.strip_prefix("node")?.parse().ok()
}

fn parse_id_value(value: &Value, context: &str) -> Result<IrId, IntakeError> {
    let text = value
        .as_str()
        .ok_or_else(|| IntakeError::new(format!("{context}: id is not a string")))?;
    parse_id(text)
        .map(IrId)
        .ok_or_else(|| IntakeError::new(format!("{context}: malformed id {text:?}")))
}

/// Fetch an id field, trying each of the accepted (canonical then legacy)
/// names in order.
fn id_field(
    obj: &Map<String, Value>,
    names: &[&str],
    context: &str,
) -> Result<IrId, IntakeError> {
    for name in names {
        if let Some(value) = obj.get(*name) {
            if !value.is_null() {
                return parse_id_value(value, context);
            }
        }
    }
    Err(IntakeError::new(format!(
        "{context}: missing field (any of {names:?})"
    )))
}

fn opt_id_field(
    obj: &Map<String, Value>,
    names: &[&str],
    context: &str,
) -> Result<Option<IrId>, IntakeError> {
    for name in names {
        if let Some(value) = obj.get(*name) {
            if value.is_null() {
                return Ok(None);
            }
            return parse_id_value(value, context).map(Some);
        }
    }
    Ok(None)
}

fn id_list_field(
    obj: &Map<String, Value>,
    names: &[&str],
    context: &str,
) -> Result<Vec<IrId>, IntakeError> {
    for name in names {
        if let Some(value) = obj.get(*name) {
            let list = value
                .as_array()
                .ok_or_else(|| IntakeError::new(format!("{context}: {name} is not a list")))?;
            return list
                .iter()
                .map(|entry| parse_id_value(entry, context))
                .collect();
        }
    }
    Err(IntakeError::new(format!(
        "{context}: missing list (any of {names:?})"
    )))
}

fn str_field(obj: &Map<String, Value>, name: &str, context: &str) -> Result<String, IntakeError> {
    obj.get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| IntakeError::new(format!("{context}: missing string field {name:?}")))
}

fn bool_field(obj: &Map<String, Value>, name: &str) -> bool {
    obj.get(name).and_then(Value::as_bool).unwrap_or(false)
}

fn literal_from_json(value: &Value, context: &str) -> Result<Literal, IntakeError> {
    let obj = value
        .as_object()
        .ok_or_else(|| IntakeError::new(format!("{context}: literal value is not an object")))?;
    let ty = obj.get("type").and_then(Value::as_str).unwrap_or("nil");
    match ty {
        "number" => Ok(Literal::Number(str_field(obj, "raw", context)?)),
        "string" => Ok(Literal::Str(str_field(obj, "raw", context)?)),
        "boolean" => Ok(Literal::Bool(bool_field(obj, "value"))),
        "nil" | "null" | "undefined" => Ok(Literal::Nil),
        other => Err(IntakeError::new(format!(
            "{context}: unknown literal type {other:?}"
        ))),
    }
}

fn prop_key_from_json(value: &Value, context: &str) -> Result<PropKey, IntakeError> {
    let obj = value
        .as_object()
        .ok_or_else(|| IntakeError::new(format!("{context}: property key is not an object")))?;
    match obj.get("type").and_then(Value::as_str) {
        Some("identifier") => Ok(PropKey::Ident(str_field(obj, "name", context)?)),
        Some("string") => Ok(PropKey::Str(str_field(obj, "raw", context)?)),
        other => Err(IntakeError::new(format!(
            "{context}: unknown property key type {other:?}"
        ))),
    }
}

fn bin_op_from_str(text: &str) -> Option<BinOp> {
    let op = match text {
        "+" => BinOp::Add,
        "-" => BinOp::Sub,
        "*" => BinOp::Mul,
        "/" => BinOp::Div,
        "%" => BinOp::Rem,
        "<" => BinOp::Lt,
        "<=" => BinOp::LtEq,
        ">" => BinOp::Gt,
        ">=" => BinOp::GtEq,
        "==" => BinOp::EqEq,
        "===" => BinOp::EqEqEq,
        "!=" => BinOp::NotEq,
        "!==" => BinOp::NotEqEq,
        "&&" => BinOp::And,
        "||" => BinOp::Or,
        _ => return None,
    };
    Some(op)
}

fn assign_op_from_str(text: &str) -> Option<AssignOp> {
    let op = match text {
        "=" => AssignOp::Assign,
        "+=" => AssignOp::AddAssign,
        "-=" => AssignOp::SubAssign,
        "*=" => AssignOp::MulAssign,
        "/=" => AssignOp::DivAssign,
        "%=" => AssignOp::RemAssign,
        _ => return None,
    };
    Some(op)
}

fn decl_kind_from_str(text: &str) -> DeclKind {
    match text {
        "const" => DeclKind::Const,
        "var" => DeclKind::Var,
        _ => DeclKind::Let,
    }
}

fn node_from_json(
    value: &Value,
    key: &str,
    warnings: &mut Vec<String>,
) -> Result<IrNode, IntakeError> {
    let obj = value
        .as_object()
        .ok_or_else(|| IntakeError::new(format!("{key}: node is not an object")))?;
    let kind = obj
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| IntakeError::new(format!("{key}: node has no kind")))?;

    let node = match kind {
        "BlockStatement" => IrNode::Block {
            statements: id_list_field(obj, &["statements", "body"], key)?,
        },
        "VariableDeclaration" => IrNode::VariableDeclaration {
            kind: decl_kind_from_str(obj.get("declKind").and_then(Value::as_str).unwrap_or("let")),
            declarations: id_list_field(obj, &["declarations", "declarators"], key)?,
        },
        "VariableDeclarator" => IrNode::Declarator {
            name: str_field(obj, "name", key)?,
            init: opt_id_field(obj, &["init"], key)?,
        },
        "FunctionDeclaration" | "FunctionExpression" => IrNode::Function {
            name: obj
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string),
            parameters: id_list_field(obj, &["parameters", "params"], key)?,
            body: id_field(obj, &["body"], key)?,
            is_async: bool_field(obj, "isAsync"),
        },
        "Parameter" => IrNode::Parameter {
            name: str_field(obj, "name", key)?,
        },
        "IfStatement" => IrNode::If {
            condition: id_field(obj, &["condition", "test"], key)?,
            consequent: id_field(obj, &["consequent"], key)?,
            alternate: opt_id_field(obj, &["alternate"], key)?,
        },
        "WhileStatement" => IrNode::While {
            condition: id_field(obj, &["condition", "test"], key)?,
            body: id_field(obj, &["body"], key)?,
        },
        "DoWhileStatement" => IrNode::DoWhile {
            body: id_field(obj, &["body"], key)?,
            condition: id_field(obj, &["condition", "test"], key)?,
        },
        "NumericForStatement" => IrNode::NumericFor {
            var: str_field(obj, "var", key)?,
            start: id_field(obj, &["start"], key)?,
            end: id_field(obj, &["end"], key)?,
            step: opt_id_field(obj, &["step"], key)?,
            inclusive: bool_field(obj, "inclusive"),
            body: id_field(obj, &["body"], key)?,
        },
        "ForInStatement" => IrNode::ForIn {
            key: str_field(obj, "key", key)?,
            object: id_field(obj, &["object"], key)?,
            body: id_field(obj, &["body"], key)?,
        },
        "ForOfStatement" => IrNode::ForOf {
            value: str_field(obj, "value", key)?,
            iterable: id_field(obj, &["iterable"], key)?,
            body: id_field(obj, &["body"], key)?,
        },
        "ReturnStatement" => IrNode::Return {
            argument: opt_id_field(obj, &["argument"], key)?,
        },
        "BreakStatement" => IrNode::Break,
        "ExpressionStatement" => IrNode::ExpressionStatement {
            expression: id_field(obj, &["expression"], key)?,
        },
        "BinaryExpression" => {
            let op_text = str_field(obj, "op", key)?;
            IrNode::Binary {
                op: bin_op_from_str(&op_text).ok_or_else(|| {
                    IntakeError::new(format!("{key}: unknown binary operator {op_text:?}"))
                })?,
                left: id_field(obj, &["left"], key)?,
                right: id_field(obj, &["right"], key)?,
            }
        }
        "UnaryExpression" => IrNode::Unary {
            op: match str_field(obj, "op", key)?.as_str() {
                "!" => UnOp::Not,
                "-" => UnOp::Neg,
                other => {
                    return Err(IntakeError::new(format!(
                        "{key}: unknown unary operator {other:?}"
                    )))
                }
            },
            operand: id_field(obj, &["operand"], key)?,
        },
        "UpdateExpression" => IrNode::Update {
            op: match str_field(obj, "op", key)?.as_str() {
                "++" => UpdateOp::Increment,
                "--" => UpdateOp::Decrement,
                other => {
                    return Err(IntakeError::new(format!(
                        "{key}: unknown update operator {other:?}"
                    )))
                }
            },
            prefix: bool_field(obj, "prefix"),
            target: id_field(obj, &["target"], key)?,
        },
        "AssignmentExpression" => {
            let op_text = str_field(obj, "op", key)?;
            IrNode::Assignment {
                op: assign_op_from_str(&op_text).ok_or_else(|| {
                    IntakeError::new(format!("{key}: unknown assignment operator {op_text:?}"))
                })?,
                target: id_field(obj, &["target"], key)?,
                value: id_field(obj, &["value"], key)?,
            }
        }
        "ConditionalExpression" => IrNode::Conditional {
            condition: id_field(obj, &["condition", "test"], key)?,
            consequent: id_field(obj, &["consequent"], key)?,
            alternate: id_field(obj, &["alternate"], key)?,
        },
        "CallExpression" => IrNode::Call {
            callee: id_field(obj, &["callee"], key)?,
            args: id_list_field(obj, &["args", "arguments"], key)?,
        },
        "MemberExpression" => IrNode::Member {
            object: id_field(obj, &["object"], key)?,
            property: str_field(obj, "property", key)?,
        },
        "IndexExpression" => IrNode::Index {
            object: id_field(obj, &["object"], key)?,
            index: id_field(obj, &["index"], key)?,
        },
        "ObjectExpression" => {
            let list = obj
                .get("properties")
                .and_then(Value::as_array)
                .ok_or_else(|| IntakeError::new(format!("{key}: object has no properties")))?;
            let mut properties = Vec::with_capacity(list.len());
            for entry in list {
                let entry_obj = entry.as_object().ok_or_else(|| {
                    IntakeError::new(format!("{key}: property entry is not an object"))
                })?;
                let prop_key = prop_key_from_json(
                    entry_obj.get("key").unwrap_or(&Value::Null),
                    key,
                )?;
                let value = parse_id_value(entry_obj.get("value").unwrap_or(&Value::Null), key)?;
                properties.push((prop_key, value));
            }
            IrNode::Object { properties }
        }
        "ArrayExpression" => IrNode::Array {
            elements: id_list_field(obj, &["elements"], key)?,
        },
        "GroupedExpression" => IrNode::Grouped {
            expression: id_field(obj, &["expression"], key)?,
        },
        "Identifier" => IrNode::Identifier {
            name: str_field(obj, "name", key)?,
        },
        "Literal" => IrNode::Literal {
            value: literal_from_json(obj.get("value").unwrap_or(&Value::Null), key)?,
        },
        unknown => {
            warnings.push(format!(
                "{key}: unknown kind {unknown:?}; kept as nil literal"
            ));
            IrNode::Literal {
                value: Literal::Nil,
            }
        }
    };
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trip_is_identity() {
        let mut module = IrModule::new("let a = 1;");
        let lit = module
            .push(
                IrNode::Literal {
                    value: Literal::Number("1".into()),
                },
                100,
            )
            .unwrap();
        let decl = module
            .push(
                IrNode::Declarator {
                    name: "a".into(),
                    init: Some(lit),
                },
                100,
            )
            .unwrap();
        let var = module
            .push(
                IrNode::VariableDeclaration {
                    kind: DeclKind::Let,
                    declarations: vec![decl],
                },
                100,
            )
            .unwrap();
        module.body.push(var);
        module.metadata.node_count = module.len();

        let doc = module_to_json(&module);
        let (back, warnings) = module_from_json(&doc).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(back, module);
    }

    #[test]
    fn legacy_field_names_are_accepted() {
        let doc = json!({
            "module": {
                "source": "if (a) { f(x); }",
                "body": ["node5"],
                "metadata": { "filename": null, "nodeCount": 6 },
            },
            "nodes": {
                "node0": { "kind": "Identifier", "name": "a" },
                "node1": { "kind": "Identifier", "name": "f" },
                "node2": { "kind": "Identifier", "name": "x" },
                // Legacy spellings: arguments, body-for-statements, test.
                "node3": { "kind": "CallExpression", "callee": "node1", "arguments": ["node2"] },
                "node4": { "kind": "ExpressionStatement", "expression": "node3" },
                "node5": {
                    "kind": "IfStatement",
                    "test": "node0",
                    "consequent": "node6",
                    "alternate": null,
                },
                "node6": { "kind": "BlockStatement", "body": ["node4"] },
            },
        });
        let (module, warnings) = module_from_json(&doc).unwrap();
        assert!(warnings.is_empty());
        assert!(matches!(
            module.node(IrId(5)),
            IrNode::If { condition, .. } if *condition == IrId(0)
        ));
        assert!(matches!(
            module.node(IrId(3)),
            IrNode::Call { args, .. } if args.len() == 1
        ));
        assert!(matches!(
            module.node(IrId(6)),
            IrNode::Block { statements } if statements.len() == 1
        ));
    }

    #[test]
    fn unknown_kind_becomes_warning() {
        let doc = json!({
            "module": {
                "source": "",
                "body": [],
                "metadata": { "filename": null, "nodeCount": 1 },
            },
            "nodes": {
                "node0": { "kind": "WithStatement" },
            },
        });
        let (module, warnings) = module_from_json(&doc).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("WithStatement"));
        assert!(matches!(
            module.node(IrId(0)),
            IrNode::Literal {
                value: Literal::Nil
            }
        ));
    }

    #[test]
    fn missing_module_record_is_an_error() {
        let err = module_from_json(&json!({ "nodes": {} })).unwrap_err();
        assert!(err.message.contains("module record"));
    }

    #[test]
    fn gap_in_node_ids_is_filled_with_warning() {
        let doc = json!({
            "module": { "source": "", "body": [], "metadata": {} },
            "nodes": {
                "node0": { "kind": "BreakStatement" },
                "node2": { "kind": "BreakStatement" },
            },
        });
        let (module, warnings) = module_from_json(&doc).unwrap();
        assert_eq!(module.len(), 3);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("node1"));
    }
}
