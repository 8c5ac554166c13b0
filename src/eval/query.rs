//! Read-only methods
//!
//! Queries run through the same command lifecycle as edits so they get the
//! same argument checking, but they touch nothing and are never recorded.

use super::command::{expect_index, expect_receiver, invalid, Operation};
use super::{Context, EvalError};
use crate::ast::Value;
use crate::model::{Entity, EntityId, EntityKind, Receiver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMethod {
    Get,
    Len,
    IndexOf,
    Values,
    Contains,
    Peek,
    Height,
    Position,
    Size,
    Text,
    Ends,
}

impl QueryMethod {
    fn name(self) -> &'static str {
        match self {
            QueryMethod::Get => "get",
            QueryMethod::Len => "len",
            QueryMethod::IndexOf => "index_of",
            QueryMethod::Values => "values",
            QueryMethod::Contains => "contains",
            QueryMethod::Peek => "peek",
            QueryMethod::Height => "height",
            QueryMethod::Position => "position",
            QueryMethod::Size => "size",
            QueryMethod::Text => "text",
            QueryMethod::Ends => "ends",
        }
    }

    fn takes_argument(self) -> bool {
        matches!(self, QueryMethod::Get | QueryMethod::IndexOf | QueryMethod::Contains)
    }
}

#[derive(Debug)]
pub struct Query {
    kind: EntityKind,
    method: QueryMethod,
    target: Option<EntityId>,
    arg: Value,
}

impl Query {
    pub fn new(kind: EntityKind, method: QueryMethod) -> Self {
        Query {
            kind,
            method,
            target: None,
            arg: Value::Nil,
        }
    }
}

fn number(n: f64) -> Value {
    Value::Number(n)
}

/// Element values of a container, in its natural order
fn elements(entity: &Entity) -> Option<Vec<Value>> {
    match entity {
        Entity::Array(a) => Some(a.items.clone()),
        Entity::List(l) => Some(l.values()),
        Entity::Tree(t) => Some(t.values()),
        Entity::Heap(h) => Some(h.items.clone()),
        Entity::Shape(_) | Entity::Arrow(_) => None,
    }
}

impl Operation for Query {
    fn name(&self) -> &str {
        self.method.name()
    }

    fn usage(&self) -> String {
        let arg = match self.method {
            QueryMethod::Get => "index",
            QueryMethod::IndexOf | QueryMethod::Contains => "value",
            _ => "",
        };
        format!("{}.{}({})", self.kind, self.method.name(), arg)
    }

    fn arity(&self) -> (usize, Option<usize>) {
        if self.method.takes_argument() {
            (1, Some(1))
        } else {
            (0, Some(0))
        }
    }

    fn bind(
        &mut self,
        receiver: Option<EntityId>,
        mut args: Vec<Value>,
        ctx: &mut Context,
    ) -> Result<(), EvalError> {
        let op = self.method.name();
        let (id, _) = expect_receiver(op, receiver, self.kind, &ctx.canvas)?;
        if self.method == QueryMethod::Get {
            expect_index(op, &args[0])?;
        }
        if self.method.takes_argument() {
            self.arg = args.remove(0);
        }
        self.target = Some(id);
        Ok(())
    }

    fn apply(&mut self, ctx: &mut Context) -> Result<Value, EvalError> {
        let op = self.method.name();
        let entity = self
            .target
            .and_then(|id| ctx.canvas.get(id))
            .ok_or_else(|| EvalError::Invariant(format!("{}: receiver vanished", op)))?;

        let value = match (self.method, entity) {
            (QueryMethod::Get, Entity::Array(a)) => {
                let index = expect_index(op, &self.arg)?;
                a.check_index(index)?;
                a.items[index].clone()
            }
            (QueryMethod::Get, Entity::List(l)) => l.get(expect_index(op, &self.arg)?)?,
            (QueryMethod::Len, e) => {
                let values = elements(e).ok_or_else(|| invalid(op, format!("{} has no length", e.kind())))?;
                number(values.len() as f64)
            }
            (QueryMethod::Values, e) => Value::List(
                elements(e).ok_or_else(|| invalid(op, format!("{} has no values", e.kind())))?,
            ),
            (QueryMethod::IndexOf, e) => match e.position_of(&self.arg) {
                Some(i) => number(i as f64),
                None => match e {
                    Entity::Tree(t) => match t.values().iter().position(|v| v == &self.arg) {
                        Some(i) => number(i as f64),
                        None => Value::Nil,
                    },
                    _ => Value::Nil,
                },
            },
            (QueryMethod::Contains, Entity::Tree(t)) => Value::Bool(t.contains(&self.arg).unwrap_or(false)),
            (QueryMethod::Contains, e) => Value::Bool(e.position_of(&self.arg).is_some()),
            (QueryMethod::Peek, Entity::Heap(h)) => h.peek().cloned().unwrap_or(Value::Nil),
            (QueryMethod::Height, Entity::Tree(t)) => number(t.height() as f64),
            (QueryMethod::Position, Entity::Shape(s)) => Value::List(vec![number(s.x), number(s.y)]),
            (QueryMethod::Size, Entity::Shape(s)) => {
                Value::List(vec![number(s.width), number(s.height)])
            }
            (QueryMethod::Text, Entity::Shape(s)) => Value::Str(s.label.clone()),
            (QueryMethod::Text, Entity::Arrow(a)) => Value::Str(a.label.clone()),
            (QueryMethod::Ends, Entity::Arrow(a)) => {
                Value::List(vec![Value::Entity(a.from), Value::Entity(a.to)])
            }
            (method, e) => {
                return Err(EvalError::UnknownOperation {
                    name: method.name().to_string(),
                    kind: Some(e.kind()),
                })
            }
        };
        Ok(value)
    }

    fn records(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::Command;
    use crate::model::{Array, LinkedList};

    fn query(ctx: &mut Context, id: EntityId, kind: EntityKind, method: QueryMethod, args: Vec<Value>) -> Value {
        let mut cmd = Command::new(Box::new(Query::new(kind, method)));
        cmd.check_arguments(Some(id), args, ctx).unwrap();
        assert!(!cmd.records());
        cmd.execute(ctx).unwrap()
    }

    #[test]
    fn test_index_of_matches_coordinate_pairs() {
        let mut ctx = Context::new();
        let id = ctx.canvas.allocate();
        let pair = |x: f64, y: f64| Value::List(vec![Value::Number(x), Value::Number(y)]);
        ctx.canvas.insert(id, Entity::Array(Array { items: vec![pair(1.0, 1.0), pair(2.0, 5.0)] }));
        let found = query(&mut ctx, id, EntityKind::Array, QueryMethod::IndexOf, vec![pair(2.0, 5.0)]);
        assert_eq!(found, Value::Number(1.0));
        let missing = query(&mut ctx, id, EntityKind::Array, QueryMethod::IndexOf, vec![pair(5.0, 2.0)]);
        assert_eq!(missing, Value::Nil);
    }

    #[test]
    fn test_list_get_and_len() {
        let mut ctx = Context::new();
        let id = ctx.canvas.allocate();
        let list = LinkedList::from_values(vec![Value::Number(7.0), Value::Number(8.0)]);
        ctx.canvas.insert(id, Entity::List(list));
        assert_eq!(
            query(&mut ctx, id, EntityKind::List, QueryMethod::Get, vec![Value::Number(1.0)]),
            Value::Number(8.0)
        );
        assert_eq!(query(&mut ctx, id, EntityKind::List, QueryMethod::Len, vec![]), Value::Number(2.0));
    }
}
