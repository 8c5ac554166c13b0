//! Array mutations
//!
//! Indices are validated against the array as it is when the arguments are
//! bound; apply runs immediately afterwards, so it can index without checks.

use super::command::{expect_index, expect_receiver, invalid, Operation};
use super::snapshot::{Snapshot, StatePair};
use super::{Context, EvalError};
use crate::ast::Value;
use crate::model::{compare_values, Array, Entity, EntityId, EntityKind};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayMethod {
    Push,
    Pop,
    Set,
    Insert,
    Remove,
    Swap,
    Clear,
    Reverse,
    Sort,
}

impl ArrayMethod {
    fn name(self) -> &'static str {
        match self {
            ArrayMethod::Push => "push",
            ArrayMethod::Pop => "pop",
            ArrayMethod::Set => "set",
            ArrayMethod::Insert => "insert",
            ArrayMethod::Remove => "remove",
            ArrayMethod::Swap => "swap",
            ArrayMethod::Clear => "clear",
            ArrayMethod::Reverse => "reverse",
            ArrayMethod::Sort => "sort",
        }
    }
}

#[derive(Debug)]
pub struct ArrayEdit {
    method: ArrayMethod,
    target: Option<EntityId>,
    index: usize,
    other: usize,
    values: Vec<Value>,
    journal: Option<StatePair>,
}

impl ArrayEdit {
    pub fn new(method: ArrayMethod) -> Self {
        ArrayEdit {
            method,
            target: None,
            index: 0,
            other: 0,
            values: Vec::new(),
            journal: None,
        }
    }
}

fn existing_index(op: &str, v: &Value, array: &Array) -> Result<usize, EvalError> {
    let index = expect_index(op, v)?;
    array.check_index(index).map_err(|e| invalid(op, e.to_string()))?;
    Ok(index)
}

impl Operation for ArrayEdit {
    fn name(&self) -> &str {
        self.method.name()
    }

    fn usage(&self) -> String {
        let args = match self.method {
            ArrayMethod::Push => "value, ...",
            ArrayMethod::Set | ArrayMethod::Insert => "index, value",
            ArrayMethod::Remove => "index",
            ArrayMethod::Swap => "i, j",
            ArrayMethod::Pop | ArrayMethod::Clear | ArrayMethod::Reverse | ArrayMethod::Sort => "",
        };
        format!("array.{}({})", self.method.name(), args)
    }

    fn arity(&self) -> (usize, Option<usize>) {
        match self.method {
            ArrayMethod::Push => (1, None),
            ArrayMethod::Set | ArrayMethod::Insert | ArrayMethod::Swap => (2, Some(2)),
            ArrayMethod::Remove => (1, Some(1)),
            ArrayMethod::Pop | ArrayMethod::Clear | ArrayMethod::Reverse | ArrayMethod::Sort => {
                (0, Some(0))
            }
        }
    }

    fn bind(
        &mut self,
        receiver: Option<EntityId>,
        mut args: Vec<Value>,
        ctx: &mut Context,
    ) -> Result<(), EvalError> {
        let op = self.method.name();
        let (id, entity) = expect_receiver(op, receiver, EntityKind::Array, &ctx.canvas)?;
        let Entity::Array(array) = entity else {
            return Err(invalid(op, "requires an array receiver"));
        };
        match self.method {
            ArrayMethod::Push => {}
            ArrayMethod::Pop => {
                if array.items.is_empty() {
                    return Err(invalid(op, "array is empty"));
                }
            }
            ArrayMethod::Set | ArrayMethod::Remove => {
                self.index = existing_index(op, &args[0], array)?;
                args.remove(0);
            }
            ArrayMethod::Insert => {
                let index = expect_index(op, &args[0])?;
                if index > array.items.len() {
                    return Err(invalid(
                        op,
                        format!("index {} out of range for length {}", index, array.items.len()),
                    ));
                }
                self.index = index;
                args.remove(0);
            }
            ArrayMethod::Swap => {
                self.index = existing_index(op, &args[0], array)?;
                self.other = existing_index(op, &args[1], array)?;
                args.clear();
            }
            ArrayMethod::Sort => {
                for pair in array.items.windows(2) {
                    compare_values(&pair[0], &pair[1]).map_err(|e| invalid(op, e.to_string()))?;
                }
            }
            ArrayMethod::Clear | ArrayMethod::Reverse => {}
        }
        self.values = args;
        self.target = Some(id);
        Ok(())
    }

    fn touched(&self) -> Vec<EntityId> {
        self.target.into_iter().collect()
    }

    fn journaled(&self) -> bool {
        !matches!(self.method, ArrayMethod::Clear | ArrayMethod::Reverse | ArrayMethod::Sort)
    }

    fn take_journal(&mut self) -> Option<StatePair> {
        self.journal.take()
    }

    fn apply(&mut self, ctx: &mut Context) -> Result<Value, EvalError> {
        let (id, array) = match self.target.and_then(|id| ctx.canvas.get_mut(id).map(|e| (id, e))) {
            Some((id, Entity::Array(a))) => (id, a),
            _ => return Err(EvalError::Invariant(format!("{}: receiver vanished", self.name()))),
        };
        let items = &mut array.items;
        let result = match self.method {
            ArrayMethod::Push => {
                let at = items.len();
                items.extend(self.values.iter().cloned());
                self.journal = Some(StatePair::splice(id, at, Vec::new(), self.values.clone()));
                Value::Number(items.len() as f64)
            }
            ArrayMethod::Pop => {
                let popped = items.pop().unwrap_or(Value::Nil);
                self.journal = Some(StatePair::splice(id, items.len(), vec![popped.clone()], Vec::new()));
                popped
            }
            ArrayMethod::Set => {
                if let Some(v) = self.values.first() {
                    let old = std::mem::replace(&mut items[self.index], v.clone());
                    self.journal = Some(StatePair::splice(id, self.index, vec![old], vec![v.clone()]));
                }
                Value::Nil
            }
            ArrayMethod::Insert => {
                if let Some(v) = self.values.first() {
                    items.insert(self.index, v.clone());
                    self.journal = Some(StatePair::splice(id, self.index, Vec::new(), vec![v.clone()]));
                }
                Value::Nil
            }
            ArrayMethod::Remove => {
                let removed = items.remove(self.index);
                self.journal = Some(StatePair::splice(id, self.index, vec![removed.clone()], Vec::new()));
                removed
            }
            ArrayMethod::Swap => {
                let (lo, hi) = (self.index.min(self.other), self.index.max(self.other));
                let cells = |items: &[Value]| {
                    let mut cells = vec![(lo, items[lo].clone())];
                    if hi != lo {
                        cells.push((hi, items[hi].clone()));
                    }
                    Snapshot::Cells { id, len: items.len(), cells }
                };
                let before = cells(&items[..]);
                items.swap(lo, hi);
                self.journal = Some(StatePair { before, after: cells(&items[..]) });
                Value::Nil
            }
            ArrayMethod::Clear => {
                items.clear();
                Value::Nil
            }
            ArrayMethod::Reverse => {
                items.reverse();
                Value::Nil
            }
            ArrayMethod::Sort => {
                // Comparability was checked pairwise while binding
                items.sort_by(|a, b| compare_values(a, b).unwrap_or(Ordering::Equal));
                Value::Nil
            }
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::Command;

    fn setup(values: &[f64]) -> (Context, EntityId) {
        let mut ctx = Context::new();
        let id = ctx.canvas.allocate();
        let items = values.iter().map(|n| Value::Number(*n)).collect();
        ctx.canvas.insert(id, Entity::Array(Array { items }));
        (ctx, id)
    }

    fn items(ctx: &Context, id: EntityId) -> Vec<Value> {
        match ctx.canvas.get(id) {
            Some(Entity::Array(a)) => a.items.clone(),
            _ => panic!("not an array"),
        }
    }

    fn run(ctx: &mut Context, id: EntityId, method: ArrayMethod, args: Vec<Value>) -> Result<Command, EvalError> {
        let mut cmd = Command::new(Box::new(ArrayEdit::new(method)));
        cmd.check_arguments(Some(id), args, ctx)?;
        cmd.execute(ctx)?;
        Ok(cmd)
    }

    #[test]
    fn test_insert_shifts_right() {
        let (mut ctx, id) = setup(&[1.0, 3.0]);
        run(&mut ctx, id, ArrayMethod::Insert, vec![Value::Number(1.0), Value::Number(2.0)]).unwrap();
        assert_eq!(
            items(&ctx, id),
            vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]
        );
    }

    #[test]
    fn test_set_out_of_range_is_validation_error() {
        let (mut ctx, id) = setup(&[1.0]);
        let err = run(&mut ctx, id, ArrayMethod::Set, vec![Value::Number(5.0), Value::Nil]).unwrap_err();
        assert!(err.to_string().contains("out of range"));
        assert_eq!(items(&ctx, id), vec![Value::Number(1.0)]);
    }

    #[test]
    fn test_sort_then_undo() {
        let (mut ctx, id) = setup(&[3.0, 1.0, 2.0]);
        let mut cmd = run(&mut ctx, id, ArrayMethod::Sort, vec![]).unwrap();
        assert_eq!(
            items(&ctx, id),
            vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]
        );
        cmd.undo(&mut ctx).unwrap();
        assert_eq!(
            items(&ctx, id),
            vec![Value::Number(3.0), Value::Number(1.0), Value::Number(2.0)]
        );
    }

    #[test]
    fn test_journaled_edits_undo_and_redo() {
        let (mut ctx, id) = setup(&[1.0, 2.0, 3.0]);
        let start = ctx.canvas.clone();
        let mut cmds = vec![
            run(&mut ctx, id, ArrayMethod::Push, vec![Value::Number(4.0), Value::Number(5.0)]).unwrap(),
            run(&mut ctx, id, ArrayMethod::Swap, vec![Value::Number(4.0), Value::Number(0.0)]).unwrap(),
            run(&mut ctx, id, ArrayMethod::Set, vec![Value::Number(1.0), Value::Number(9.0)]).unwrap(),
            run(&mut ctx, id, ArrayMethod::Remove, vec![Value::Number(2.0)]).unwrap(),
            run(&mut ctx, id, ArrayMethod::Insert, vec![Value::Number(0.0), Value::Number(7.0)]).unwrap(),
            run(&mut ctx, id, ArrayMethod::Pop, vec![]).unwrap(),
        ];
        let end = ctx.canvas.clone();
        assert_eq!(
            items(&ctx, id),
            [7.0, 5.0, 9.0, 4.0].iter().map(|n| Value::Number(*n)).collect::<Vec<_>>()
        );

        for cmd in cmds.iter_mut().rev() {
            cmd.undo(&mut ctx).unwrap();
        }
        assert_eq!(ctx.canvas, start);
        for cmd in cmds.iter_mut() {
            cmd.execute(&mut ctx).unwrap();
        }
        assert_eq!(ctx.canvas, end);
    }

    #[test]
    fn test_pop_empty() {
        let (mut ctx, id) = setup(&[]);
        assert!(run(&mut ctx, id, ArrayMethod::Pop, vec![]).is_err());
    }
}
