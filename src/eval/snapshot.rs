//! Recorded states of the canvas around one command
//!
//! `Slots` holds whole entities and can be restored from anywhere. The other
//! variants describe one edit relative to its neighbouring state: a command's
//! `before` is only ever restored from its `after` and vice versa, which the
//! linear history guarantees. They keep the cost of a record proportional to
//! the edit instead of the receiver.

use crate::ast::Value;
use crate::model::{Canvas, Entity, EntityId, ListPatch, TreePatch};

#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    /// Whole slots; an empty slot is `None`, so restoring removes anything
    /// created there since
    Slots(Vec<(EntityId, Option<Entity>)>),
    /// Replace `items[at..at + remove]` of an array or heap with `insert`
    Splice {
        id: EntityId,
        at: usize,
        remove: usize,
        insert: Vec<Value>,
    },
    /// Cut an array or heap to `len`, then write `cells` in index order
    Cells {
        id: EntityId,
        len: usize,
        cells: Vec<(usize, Value)>,
    },
    List { id: EntityId, patch: ListPatch },
    Tree { id: EntityId, patch: TreePatch },
}

impl Snapshot {
    pub fn capture(canvas: &Canvas, ids: &[EntityId]) -> Self {
        Snapshot::Slots(ids.iter().map(|id| (*id, canvas.capture(*id))).collect())
    }

    pub fn restore(&self, canvas: &mut Canvas) {
        match self {
            Snapshot::Slots(slots) => {
                for (id, state) in slots {
                    canvas.restore(*id, state.clone());
                }
            }
            Snapshot::Splice { id, at, remove, insert } => {
                if let Some(items) = sequence_mut(canvas, *id) {
                    let start = (*at).min(items.len());
                    let end = (start + remove).min(items.len());
                    items.splice(start..end, insert.iter().cloned());
                }
            }
            Snapshot::Cells { id, len, cells } => {
                if let Some(items) = sequence_mut(canvas, *id) {
                    items.truncate(*len);
                    for (i, v) in cells {
                        match items.get_mut(*i) {
                            Some(slot) => *slot = v.clone(),
                            None => items.push(v.clone()),
                        }
                    }
                }
            }
            Snapshot::List { id, patch } => {
                if let Some(Entity::List(list)) = canvas.get_mut(*id) {
                    list.apply_patch(patch);
                }
            }
            Snapshot::Tree { id, patch } => {
                if let Some(Entity::Tree(tree)) = canvas.get_mut(*id) {
                    tree.apply_patch(patch);
                }
            }
        }
    }
}

fn sequence_mut(canvas: &mut Canvas, id: EntityId) -> Option<&mut Vec<Value>> {
    match canvas.get_mut(id)? {
        Entity::Array(a) => Some(&mut a.items),
        Entity::Heap(h) => Some(&mut h.items),
        _ => None,
    }
}

/// Pre- and post-execution states of one command
#[derive(Debug, Clone, PartialEq)]
pub struct StatePair {
    pub before: Snapshot,
    pub after: Snapshot,
}

impl StatePair {
    /// Record of replacing `removed` at `at` with `inserted`
    pub fn splice(id: EntityId, at: usize, removed: Vec<Value>, inserted: Vec<Value>) -> Self {
        StatePair {
            before: Snapshot::Splice {
                id,
                at,
                remove: inserted.len(),
                insert: removed.clone(),
            },
            after: Snapshot::Splice {
                id,
                at,
                remove: removed.len(),
                insert: inserted,
            },
        }
    }
}
