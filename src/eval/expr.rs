//! Expression evaluation and call resolution

use super::command::{Command, Operation};
use super::{EvalError, Evaluator};
use crate::ast::{BinaryOp, Expr, UnaryOp, Value};
use crate::model::{compare_values, Entity, EntityId, ModelError, Receiver};
use std::cmp::Ordering;

impl Evaluator {
    pub(crate) fn eval_expr(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Variable(name) => self.ctx.env.lookup(name).cloned(),
            Expr::List(items) => {
                let values = items
                    .iter()
                    .map(|e| self.eval_expr(e))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::List(values))
            }
            Expr::Unary { op, operand } => {
                let v = self.eval_expr(operand)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!v.is_truthy())),
                    UnaryOp::Neg => match v {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        other => Err(EvalError::TypeError {
                            expected: "number".into(),
                            got: other.type_name().into(),
                        }),
                    },
                }
            }
            Expr::Binary { op, lhs, rhs } => self.eval_binary(*op, lhs, rhs),
            Expr::Call { name, args } => {
                let args = self.eval_args(args)?;
                self.call_named(name, args)
            }
            Expr::MethodCall {
                receiver,
                method,
                args,
            } => {
                let target = self.ctx.env.lookup(receiver)?.clone();
                let id = target.as_entity().ok_or_else(|| EvalError::TypeError {
                    expected: "entity".into(),
                    got: target.type_name().into(),
                })?;
                let kind = self.ctx.canvas.kind_of(id).ok_or_else(|| {
                    EvalError::Runtime(format!("{} refers to deleted entity {}", receiver, id))
                })?;
                let op = self.dispatcher.lookup_method(kind, method).ok_or_else(|| {
                    EvalError::UnknownOperation {
                        name: method.clone(),
                        kind: Some(kind),
                    }
                })?;
                let args = self.eval_args(args)?;
                self.run_operation(op.instantiate(), Some(id), args)
            }
            Expr::Index { target, index } => {
                let target = self.eval_expr(target)?;
                let index = self.eval_expr(index)?;
                self.eval_index(target, index)
            }
        }
    }

    fn eval_args(&mut self, args: &[Expr]) -> Result<Vec<Value>, EvalError> {
        args.iter().map(|e| self.eval_expr(e)).collect()
    }

    fn eval_binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Result<Value, EvalError> {
        // Short-circuit forms first
        match op {
            BinaryOp::And => {
                let l = self.eval_expr(lhs)?;
                if !l.is_truthy() {
                    return Ok(Value::Bool(false));
                }
                return Ok(Value::Bool(self.eval_expr(rhs)?.is_truthy()));
            }
            BinaryOp::Or => {
                let l = self.eval_expr(lhs)?;
                if l.is_truthy() {
                    return Ok(Value::Bool(true));
                }
                return Ok(Value::Bool(self.eval_expr(rhs)?.is_truthy()));
            }
            _ => {}
        }

        let l = self.eval_expr(lhs)?;
        let r = self.eval_expr(rhs)?;
        match op {
            BinaryOp::Eq => Ok(Value::Bool(l == r)),
            BinaryOp::Ne => Ok(Value::Bool(l != r)),
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                let ord = compare_values(&l, &r).map_err(|_| EvalError::TypeError {
                    expected: format!("comparable operands for {}", op.symbol()),
                    got: format!("{} and {}", l.type_name(), r.type_name()),
                })?;
                let result = match op {
                    BinaryOp::Lt => ord == Ordering::Less,
                    BinaryOp::Le => ord != Ordering::Greater,
                    BinaryOp::Gt => ord == Ordering::Greater,
                    _ => ord != Ordering::Less,
                };
                Ok(Value::Bool(result))
            }
            BinaryOp::Add => match (l, r) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::List(mut a), Value::List(b)) => {
                    a.extend(b);
                    Ok(Value::List(a))
                }
                (a @ Value::Str(_), b) | (a, b @ Value::Str(_)) => {
                    Ok(Value::Str(format!("{}{}", a, b)))
                }
                (a, b) => Err(arith_error(op, &a, &b)),
            },
            _ => {
                let (a, b) = match (&l, &r) {
                    (Value::Number(a), Value::Number(b)) => (*a, *b),
                    _ => return Err(arith_error(op, &l, &r)),
                };
                let n = match op {
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div if b == 0.0 => {
                        return Err(EvalError::Runtime("division by zero".into()))
                    }
                    BinaryOp::Div => a / b,
                    BinaryOp::Rem if b == 0.0 => {
                        return Err(EvalError::Runtime("division by zero".into()))
                    }
                    BinaryOp::Rem => a % b,
                    _ => return Err(EvalError::Invariant(format!("unhandled operator {}", op.symbol()))),
                };
                Ok(Value::Number(n))
            }
        }
    }

    fn eval_index(&self, target: Value, index: Value) -> Result<Value, EvalError> {
        let i = index.as_index().ok_or_else(|| EvalError::TypeError {
            expected: "index".into(),
            got: index.to_string(),
        })?;
        let out_of_range = |len: usize| EvalError::Model(ModelError::IndexOutOfRange { index: i, len });
        match target {
            Value::List(items) => {
                let len = items.len();
                items.into_iter().nth(i).ok_or_else(|| out_of_range(len))
            }
            Value::Str(s) => s
                .chars()
                .nth(i)
                .map(|c| Value::Str(c.to_string()))
                .ok_or_else(|| out_of_range(s.chars().count())),
            Value::Entity(id) => match self.ctx.canvas.get(id) {
                Some(Entity::Array(a)) => a.items.get(i).cloned().ok_or_else(|| out_of_range(a.items.len())),
                Some(Entity::List(l)) => Ok(l.get(i)?),
                Some(Entity::Heap(h)) => h.items.get(i).cloned().ok_or_else(|| out_of_range(h.len())),
                Some(other) => Err(EvalError::TypeError {
                    expected: "indexable value".into(),
                    got: other.kind().to_string(),
                }),
                None => Err(EvalError::Runtime(format!("entity {} no longer exists", id))),
            },
            other => Err(EvalError::TypeError {
                expected: "indexable value".into(),
                got: other.type_name().into(),
            }),
        }
    }

    /// Resolve `name(args)`.
    ///
    /// Order: user function, function table (including constructor
    /// aliases), then the receiver-first method form where the first
    /// argument is an entity handle (`insert(list, 0, 5)`).
    pub(crate) fn call_named(&mut self, name: &str, mut args: Vec<Value>) -> Result<Value, EvalError> {
        if let Some(def) = self.functions.get(name).cloned() {
            return self.call_function(def, args);
        }
        if let Some(op) = self.dispatcher.function(name) {
            return self.run_operation(op.instantiate(), None, args);
        }
        if let Some(id) = args.first().and_then(Value::as_entity) {
            if let Some(kind) = self.ctx.canvas.kind_of(id) {
                let op = self
                    .dispatcher
                    .lookup_method(kind, name)
                    .ok_or_else(|| EvalError::UnknownOperation {
                        name: name.to_string(),
                        kind: Some(kind),
                    })?;
                args.remove(0);
                return self.run_operation(op.instantiate(), Some(id), args);
            }
        }
        Err(EvalError::UnknownOperation {
            name: name.to_string(),
            kind: None,
        })
    }

    /// Check, execute, and record one primitive command
    pub(crate) fn run_operation(
        &mut self,
        op: Box<dyn Operation>,
        receiver: Option<EntityId>,
        args: Vec<Value>,
    ) -> Result<Value, EvalError> {
        let mut command = Command::new(op);
        command.check_arguments(receiver, args, &mut self.ctx)?;
        if let Some(delay) = command.suspension() {
            if self.call_depth() > 0 {
                return Err(EvalError::Usage(format!(
                    "{} cannot be used inside a function",
                    command.label()
                )));
            }
            self.pending_wait = Some(delay);
        }
        let value = command.execute(&mut self.ctx)?;
        if command.records() {
            self.record(command);
        }
        Ok(value)
    }
}

fn arith_error(op: BinaryOp, a: &Value, b: &Value) -> EvalError {
    EvalError::TypeError {
        expected: format!("numbers for {}", op.symbol()),
        got: format!("{} and {}", a.type_name(), b.type_name()),
    }
}
