//! Tree and heap mutations
//!
//! Both structures only hold mutually comparable values (all numbers or all
//! strings). The comparison is tried while binding so a mismatched value is
//! rejected before anything changes.

use super::command::{expect_receiver, invalid, Operation};
use super::snapshot::{Snapshot, StatePair};
use super::{Context, EvalError};
use crate::ast::Value;
use crate::model::{compare_values, is_orderable, Entity, EntityId, EntityKind, SlotLog};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeMethod {
    Insert,
    Remove,
}

#[derive(Debug)]
pub struct TreeEdit {
    method: TreeMethod,
    target: Option<EntityId>,
    value: Value,
    journal: Option<StatePair>,
}

impl TreeEdit {
    pub fn new(method: TreeMethod) -> Self {
        TreeEdit {
            method,
            target: None,
            value: Value::Nil,
            journal: None,
        }
    }
}

fn check_orderable(op: &str, v: &Value) -> Result<(), EvalError> {
    if is_orderable(v) {
        Ok(())
    } else {
        Err(invalid(op, format!("requires a number or string, got {}", v.type_name())))
    }
}

impl Operation for TreeEdit {
    fn name(&self) -> &str {
        match self.method {
            TreeMethod::Insert => "insert",
            TreeMethod::Remove => "remove",
        }
    }

    fn usage(&self) -> String {
        format!("tree.{}(value)", self.name())
    }

    fn arity(&self) -> (usize, Option<usize>) {
        (1, Some(1))
    }

    fn bind(
        &mut self,
        receiver: Option<EntityId>,
        mut args: Vec<Value>,
        ctx: &mut Context,
    ) -> Result<(), EvalError> {
        let op = match self.method {
            TreeMethod::Insert => "insert",
            TreeMethod::Remove => "remove",
        };
        let (id, entity) = expect_receiver(op, receiver, EntityKind::Tree, &ctx.canvas)?;
        let Entity::Tree(tree) = entity else {
            return Err(invalid(op, "requires a tree receiver"));
        };
        let value = args.remove(0);
        check_orderable(op, &value)?;
        let present = tree.contains(&value).map_err(|e| invalid(op, e.to_string()))?;
        if self.method == TreeMethod::Remove && !present {
            return Err(invalid(op, format!("value {} not found", value)));
        }
        self.value = value;
        self.target = Some(id);
        Ok(())
    }

    fn touched(&self) -> Vec<EntityId> {
        self.target.into_iter().collect()
    }

    fn journaled(&self) -> bool {
        true
    }

    fn take_journal(&mut self) -> Option<StatePair> {
        self.journal.take()
    }

    fn apply(&mut self, ctx: &mut Context) -> Result<Value, EvalError> {
        let (id, tree) = match self.target.and_then(|id| ctx.canvas.get_mut(id).map(|e| (id, e))) {
            Some((id, Entity::Tree(t))) => (id, t),
            _ => return Err(EvalError::Invariant(format!("{}: receiver vanished", self.name()))),
        };
        let keys = tree.affected_nodes(&self.value);
        let before = tree.patch(&keys);
        let result = match self.method {
            TreeMethod::Insert => Value::Bool(tree.insert(self.value.clone())?),
            TreeMethod::Remove => {
                tree.remove(&self.value)?;
                Value::Nil
            }
        };
        self.journal = Some(StatePair {
            before: Snapshot::Tree { id, patch: before },
            after: Snapshot::Tree { id, patch: tree.patch(&keys) },
        });
        Ok(result)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapMethod {
    Push,
    Pop,
}

#[derive(Debug)]
pub struct HeapEdit {
    method: HeapMethod,
    target: Option<EntityId>,
    value: Value,
    journal: Option<StatePair>,
}

impl HeapEdit {
    pub fn new(method: HeapMethod) -> Self {
        HeapEdit {
            method,
            target: None,
            value: Value::Nil,
            journal: None,
        }
    }
}

impl Operation for HeapEdit {
    fn name(&self) -> &str {
        match self.method {
            HeapMethod::Push => "push",
            HeapMethod::Pop => "pop",
        }
    }

    fn usage(&self) -> String {
        match self.method {
            HeapMethod::Push => "heap.push(value)".into(),
            HeapMethod::Pop => "heap.pop()".into(),
        }
    }

    fn arity(&self) -> (usize, Option<usize>) {
        match self.method {
            HeapMethod::Push => (1, Some(1)),
            HeapMethod::Pop => (0, Some(0)),
        }
    }

    fn bind(
        &mut self,
        receiver: Option<EntityId>,
        mut args: Vec<Value>,
        ctx: &mut Context,
    ) -> Result<(), EvalError> {
        let op = match self.method {
            HeapMethod::Push => "push",
            HeapMethod::Pop => "pop",
        };
        let (id, entity) = expect_receiver(op, receiver, EntityKind::Heap, &ctx.canvas)?;
        let Entity::Heap(heap) = entity else {
            return Err(invalid(op, "requires a heap receiver"));
        };
        match self.method {
            HeapMethod::Push => {
                let value = args.remove(0);
                check_orderable(op, &value)?;
                if let Some(top) = heap.peek() {
                    compare_values(&value, top).map_err(|e| invalid(op, e.to_string()))?;
                }
                self.value = value;
            }
            HeapMethod::Pop => {
                if heap.is_empty() {
                    return Err(invalid(op, "heap is empty"));
                }
            }
        }
        self.target = Some(id);
        Ok(())
    }

    fn touched(&self) -> Vec<EntityId> {
        self.target.into_iter().collect()
    }

    fn journaled(&self) -> bool {
        true
    }

    fn take_journal(&mut self) -> Option<StatePair> {
        self.journal.take()
    }

    fn apply(&mut self, ctx: &mut Context) -> Result<Value, EvalError> {
        let (id, heap) = match self.target.and_then(|id| ctx.canvas.get_mut(id).map(|e| (id, e))) {
            Some((id, Entity::Heap(h))) => (id, h),
            _ => return Err(EvalError::Invariant(format!("{}: receiver vanished", self.name()))),
        };
        let old_len = heap.len();
        let mut log = SlotLog::new();
        let result = match self.method {
            HeapMethod::Push => {
                heap.push_logged(self.value.clone(), &mut log)?;
                // the pushed slot did not exist before
                log.remove(&old_len);
                Value::Number(heap.len() as f64)
            }
            HeapMethod::Pop => heap.pop_logged(&mut log)?,
        };

        let new_len = heap.len();
        let mut written: Vec<usize> = log.keys().copied().filter(|i| *i < new_len).collect();
        if new_len > old_len {
            written.push(old_len);
        }
        let after = written
            .into_iter()
            .map(|i| (i, heap.items[i].clone()))
            .collect();
        self.journal = Some(StatePair {
            before: Snapshot::Cells {
                id,
                len: old_len,
                cells: log.into_iter().collect(),
            },
            after: Snapshot::Cells { id, len: new_len, cells: after },
        });
        Ok(result)
    }
}
