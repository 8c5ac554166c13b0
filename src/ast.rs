//! AST for the dsviz console language
//!
//! The AST is an immutable template. Statement blocks are shared through
//! `Rc<[Stmt]>` so loops and function calls can run the same body many
//! times; all per-run mutable state lives in the Commands the evaluator
//! creates while executing a statement, never in the tree itself.

use crate::model::EntityId;
use serde_json::Value as JsonValue;
use std::fmt;
use std::rc::Rc;

/// Convert a Value to a JSON value for serialization
pub fn value_to_json(v: &Value) -> JsonValue {
    match v {
        Value::Nil => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Number(n) => serde_json::Number::from_f64(*n)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Str(s) => JsonValue::String(s.clone()),
        Value::List(items) => JsonValue::Array(items.iter().map(value_to_json).collect()),
        Value::Entity(id) => {
            let mut obj = serde_json::Map::new();
            obj.insert("entity".into(), JsonValue::Number(id.0.into()));
            JsonValue::Object(obj)
        }
    }
}

/// Convert a JSON value to a console Value
pub fn json_to_value(json: JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Nil,
        JsonValue::Bool(b) => Value::Bool(b),
        JsonValue::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
        JsonValue::String(s) => Value::Str(s),
        JsonValue::Array(arr) => Value::List(arr.into_iter().map(json_to_value).collect()),
        JsonValue::Object(obj) => match obj.get("entity").and_then(JsonValue::as_u64) {
            Some(id) if obj.len() == 1 => Value::Entity(EntityId(id)),
            _ => Value::List(obj.into_iter().map(|(_, v)| json_to_value(v)).collect()),
        },
    }
}

/// A runtime value
///
/// Equality is structural: two lists holding the same coordinates are equal
/// even if they were built separately. Entity handles compare by id.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// No value
    #[default]
    Nil,
    /// A boolean value
    Bool(bool),
    /// A numeric value
    Number(f64),
    /// A string
    Str(String),
    /// A list of values (coordinate pairs, array literals, query results)
    List(Vec<Value>),
    /// Handle to an entity on the canvas
    Entity(EntityId),
}

impl Value {
    /// Short name of the value's type, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Entity(_) => "entity",
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<EntityId> {
        match self {
            Value::Entity(id) => Some(*id),
            _ => None,
        }
    }

    /// Interpret the value as a non-negative integer index
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 => Some(*n as usize),
            _ => None,
        }
    }

    /// Truthiness used by loop and branch conditions
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Entity(_) => true,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => {
                // No trailing .0 for integers
                if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Str(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match item {
                        Value::Str(s) => write!(f, "\"{}\"", s)?,
                        other => write!(f, "{}", other)?,
                    }
                }
                write!(f, "]")
            }
            Value::Entity(id) => write!(f, "{}", id),
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// An expression in the console language
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value (number, string, true/false/nil)
    Literal(Value),

    /// A variable reference
    Variable(String),

    /// A list literal `[a, b, ...]`
    List(Vec<Expr>),

    /// `-x`, `!x`
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// `a + b`, `a < b`, ...
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// `name(args)` - construction, utility, or user function call
    Call { name: String, args: Vec<Expr> },

    /// `receiver.method(args)` - operation on a named entity
    MethodCall {
        receiver: String,
        method: String,
        args: Vec<Expr>,
    },

    /// `target[index]`
    Index { target: Box<Expr>, index: Box<Expr> },
}

/// A shared, immutable statement sequence
pub type Block = Rc<[Stmt]>;

/// A user function definition
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
}

/// A statement in the console language
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// An expression evaluated for its effect (usually a call)
    Expr(Expr),

    /// `name = expr`
    Assign { name: String, value: Expr },

    /// `while (cond) { body }`
    While { cond: Expr, body: Block },

    /// `for (init; cond; step) { body }`
    For {
        init: Block,
        cond: Option<Expr>,
        step: Block,
        body: Block,
    },

    /// `if (cond) { then } else { otherwise }`
    If {
        cond: Expr,
        then_branch: Block,
        else_branch: Option<Block>,
    },

    /// `define name(params) { body }`
    Define(Rc<FunctionDef>),

    /// `return expr`
    Return(Option<Expr>),
}

/// A parsed program is a sequence of statements
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Program { statements }
    }

    /// The program body as a shared block
    pub fn block(&self) -> Block {
        Rc::from(self.statements.clone())
    }
}
