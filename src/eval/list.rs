//! Linked-list mutations

use super::command::{expect_index, expect_receiver, invalid, Operation};
use super::snapshot::{Snapshot, StatePair};
use super::{Context, EvalError};
use crate::ast::Value;
use crate::model::{Entity, EntityId, EntityKind, LinkedList};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMethod {
    Append,
    Prepend,
    /// Attach a new node after the node at an index
    Insert,
    Remove,
    Set,
    Clear,
}

impl ListMethod {
    fn name(self) -> &'static str {
        match self {
            ListMethod::Append => "append",
            ListMethod::Prepend => "prepend",
            ListMethod::Insert => "insert",
            ListMethod::Remove => "remove",
            ListMethod::Set => "set",
            ListMethod::Clear => "clear",
        }
    }
}

#[derive(Debug)]
pub struct ListEdit {
    method: ListMethod,
    target: Option<EntityId>,
    index: usize,
    values: Vec<Value>,
    journal: Option<StatePair>,
}

impl ListEdit {
    pub fn new(method: ListMethod) -> Self {
        ListEdit {
            method,
            target: None,
            index: 0,
            values: Vec::new(),
            journal: None,
        }
    }
}

impl Operation for ListEdit {
    fn name(&self) -> &str {
        self.method.name()
    }

    fn usage(&self) -> String {
        let args = match self.method {
            ListMethod::Append | ListMethod::Prepend => "value, ...",
            ListMethod::Insert => "after_index, value",
            ListMethod::Set => "index, value",
            ListMethod::Remove => "index",
            ListMethod::Clear => "",
        };
        format!("list.{}({})", self.method.name(), args)
    }

    fn arity(&self) -> (usize, Option<usize>) {
        match self.method {
            ListMethod::Append | ListMethod::Prepend => (1, None),
            ListMethod::Insert | ListMethod::Set => (2, Some(2)),
            ListMethod::Remove => (1, Some(1)),
            ListMethod::Clear => (0, Some(0)),
        }
    }

    fn bind(
        &mut self,
        receiver: Option<EntityId>,
        mut args: Vec<Value>,
        ctx: &mut Context,
    ) -> Result<(), EvalError> {
        let op = self.method.name();
        let (id, entity) = expect_receiver(op, receiver, EntityKind::List, &ctx.canvas)?;
        let Entity::List(list) = entity else {
            return Err(invalid(op, "requires a list receiver"));
        };
        if matches!(self.method, ListMethod::Insert | ListMethod::Set | ListMethod::Remove) {
            let index = expect_index(op, &args[0])?;
            if index >= list.len() {
                return Err(invalid(
                    op,
                    format!("index {} out of range for length {}", index, list.len()),
                ));
            }
            self.index = index;
            args.remove(0);
        }
        self.values = args;
        self.target = Some(id);
        Ok(())
    }

    fn touched(&self) -> Vec<EntityId> {
        self.target.into_iter().collect()
    }

    fn journaled(&self) -> bool {
        self.method != ListMethod::Clear
    }

    fn take_journal(&mut self) -> Option<StatePair> {
        self.journal.take()
    }

    fn apply(&mut self, ctx: &mut Context) -> Result<Value, EvalError> {
        let (id, list) = match self.target.and_then(|id| ctx.canvas.get_mut(id).map(|e| (id, e))) {
            Some((id, Entity::List(l))) => (id, l),
            _ => return Err(EvalError::Invariant(format!("{}: receiver vanished", self.name()))),
        };
        let (nodes, edges) = self.slots(list)?;
        let before = list.patch(&nodes, &edges);
        let first = self.values.first().cloned().unwrap_or(Value::Nil);
        let result = match self.method {
            ListMethod::Append => {
                for v in &self.values {
                    list.append(v.clone());
                }
                Value::Number(list.len() as f64)
            }
            ListMethod::Prepend => {
                for v in self.values.iter().rev() {
                    list.prepend(v.clone());
                }
                Value::Number(list.len() as f64)
            }
            ListMethod::Insert => {
                list.insert_after(self.index, first)?;
                Value::Nil
            }
            ListMethod::Set => {
                list.set(self.index, first)?;
                Value::Nil
            }
            ListMethod::Remove => list.remove(self.index)?,
            ListMethod::Clear => {
                *list = LinkedList::new();
                Value::Nil
            }
        };
        if self.journaled() {
            self.journal = Some(StatePair {
                before: Snapshot::List { id, patch: before },
                after: Snapshot::List {
                    id,
                    patch: list.patch(&nodes, &edges),
                },
            });
        }
        Ok(result)
    }
}

impl ListEdit {
    /// Node and edge slots the edit writes, including ids it will create
    fn slots(&self, list: &LinkedList) -> Result<(Vec<u64>, Vec<u64>), EvalError> {
        let next = list.next_node_id();
        let slots = match self.method {
            ListMethod::Append => {
                let fresh: Vec<u64> = (next..next + self.values.len() as u64).collect();
                let mut edges: Vec<u64> = list.order().last().copied().into_iter().collect();
                edges.extend(&fresh);
                (fresh, edges)
            }
            ListMethod::Prepend => {
                let fresh: Vec<u64> = (next..next + self.values.len() as u64).collect();
                (fresh.clone(), fresh)
            }
            ListMethod::Insert => (vec![next], vec![list.node_at(self.index)?, next]),
            ListMethod::Remove => {
                let node = list.node_at(self.index)?;
                let mut edges = vec![node];
                if self.index > 0 {
                    edges.push(list.node_at(self.index - 1)?);
                }
                (vec![node], edges)
            }
            ListMethod::Set => (vec![list.node_at(self.index)?], Vec::new()),
            ListMethod::Clear => (Vec::new(), Vec::new()),
        };
        Ok(slots)
    }
}
