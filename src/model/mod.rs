//! Object model mutated by console commands
//!
//! The canvas owns every entity the console can address. Entities are plain
//! values: capturing state is a clone and restoring state is a replace. Lists,
//! trees and heaps also expose slot-level patches and logs so a single edit can
//! be recorded without cloning the whole receiver.

mod heap;
mod linked;
mod tree;

pub use heap::{Heap, SlotLog};
pub use linked::{LinkedList, ListPatch};
pub use tree::{Tree, TreeNode, TreePatch};

use crate::ast::Value;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("{0} is empty")]
    Empty(&'static str),
    #[error("values {0} and {1} are not comparable")]
    NotComparable(String, String),
    #[error("value {0} not found")]
    NotFound(String),
}

/// Stable handle to an entity on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, serde::Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Runtime kind of an entity, used as the method dispatch key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Shape,
    Array,
    List,
    Tree,
    Heap,
    Arrow,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Shape,
        EntityKind::Array,
        EntityKind::List,
        EntityKind::Tree,
        EntityKind::Heap,
        EntityKind::Arrow,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Shape => "shape",
            EntityKind::Array => "array",
            EntityKind::List => "list",
            EntityKind::Tree => "tree",
            EntityKind::Heap => "heap",
            EntityKind::Arrow => "arrow",
        }
    }

    /// Resolve a constructor alias (`box`, `bst`, ...) to a kind
    pub fn from_alias(name: &str) -> Option<EntityKind> {
        match name {
            "box" | "rect" | "shape" => Some(EntityKind::Shape),
            "array" => Some(EntityKind::Array),
            "list" | "linkedlist" => Some(EntityKind::List),
            "tree" | "bst" => Some(EntityKind::Tree),
            "heap" => Some(EntityKind::Heap),
            "arrow" => Some(EntityKind::Arrow),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// What every addressable entity exposes to the command layer
pub trait Receiver {
    /// Dispatch key for method lookup
    fn kind(&self) -> EntityKind;

    /// One-line description for listings
    fn summary(&self) -> String;

    /// Position of the first element structurally equal to `needle`
    fn position_of(&self, _needle: &Value) -> Option<usize> {
        None
    }
}

/// A drawn box
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shape {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub label: String,
}

impl Receiver for Shape {
    fn kind(&self) -> EntityKind {
        EntityKind::Shape
    }

    fn summary(&self) -> String {
        format!(
            "box \"{}\" at ({}, {}) size {}x{}",
            self.label,
            Value::Number(self.x),
            Value::Number(self.y),
            Value::Number(self.width),
            Value::Number(self.height)
        )
    }
}

/// A contiguous array of values
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Array {
    pub items: Vec<Value>,
}

impl Array {
    pub fn check_index(&self, index: usize) -> Result<(), ModelError> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(ModelError::IndexOutOfRange { index, len: self.items.len() })
        }
    }
}

impl Receiver for Array {
    fn kind(&self) -> EntityKind {
        EntityKind::Array
    }

    fn summary(&self) -> String {
        format!("array {}", Value::List(self.items.clone()))
    }

    fn position_of(&self, needle: &Value) -> Option<usize> {
        self.items.iter().position(|v| v == needle)
    }
}

/// A directed edge between two entities
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arrow {
    pub from: EntityId,
    pub to: EntityId,
    pub label: String,
}

impl Receiver for Arrow {
    fn kind(&self) -> EntityKind {
        EntityKind::Arrow
    }

    fn summary(&self) -> String {
        if self.label.is_empty() {
            format!("arrow {} -> {}", self.from, self.to)
        } else {
            format!("arrow {} -> {} \"{}\"", self.from, self.to, self.label)
        }
    }
}

/// Any entity the canvas can hold
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    Shape(Shape),
    Array(Array),
    List(LinkedList),
    Tree(Tree),
    Heap(Heap),
    Arrow(Arrow),
}

impl Entity {
    fn receiver(&self) -> &dyn Receiver {
        match self {
            Entity::Shape(e) => e,
            Entity::Array(e) => e,
            Entity::List(e) => e,
            Entity::Tree(e) => e,
            Entity::Heap(e) => e,
            Entity::Arrow(e) => e,
        }
    }
}

impl Receiver for Entity {
    fn kind(&self) -> EntityKind {
        self.receiver().kind()
    }

    fn summary(&self) -> String {
        self.receiver().summary()
    }

    fn position_of(&self, needle: &Value) -> Option<usize> {
        self.receiver().position_of(needle)
    }
}

/// Order two values of the same comparable type (numbers or strings)
pub fn compare_values(a: &Value, b: &Value) -> Result<Ordering, ModelError> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .partial_cmp(y)
            .ok_or_else(|| ModelError::NotComparable(a.to_string(), b.to_string())),
        (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
        _ => Err(ModelError::NotComparable(a.to_string(), b.to_string())),
    }
}

/// Whether a value can live in an ordered structure (tree, heap)
pub fn is_orderable(v: &Value) -> bool {
    matches!(v, Value::Number(n) if !n.is_nan()) || matches!(v, Value::Str(_))
}

const LAYOUT_COLUMNS: u64 = 5;
const LAYOUT_STEP_X: f64 = 140.0;
const LAYOUT_STEP_Y: f64 = 100.0;
const LAYOUT_MARGIN: f64 = 20.0;

/// The shared object graph
#[derive(Debug, Clone, Default, Serialize)]
pub struct Canvas {
    entities: BTreeMap<EntityId, Entity>,
    #[serde(skip)]
    next_id: u64,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a fresh id; ids are never reused, even after undo
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn kind_of(&self, id: EntityId) -> Option<EntityKind> {
        self.entities.get(&id).map(Entity::kind)
    }

    pub fn insert(&mut self, id: EntityId, entity: Entity) {
        self.entities.insert(id, entity);
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Capture the state of one slot (`None` when the slot is empty)
    pub fn capture(&self, id: EntityId) -> Option<Entity> {
        self.entities.get(&id).cloned()
    }

    /// Put a slot back into a captured state
    pub fn restore(&mut self, id: EntityId, state: Option<Entity>) {
        match state {
            Some(entity) => {
                self.entities.insert(id, entity);
            }
            None => {
                self.entities.remove(&id);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter().map(|(id, e)| (*id, e))
    }

    /// Arrows that start or end at `id`
    pub fn arrows_touching(&self, id: EntityId) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter_map(|(arrow_id, e)| match e {
                Entity::Arrow(a) if a.from == id || a.to == id => Some(*arrow_id),
                _ => None,
            })
            .collect()
    }

    /// Next free grid position for an auto-placed box
    ///
    /// Depends on how many boxes are on the canvas right now, so re-running a
    /// placement after other edits can land somewhere else.
    pub fn next_slot(&self) -> (f64, f64) {
        let n = self
            .entities
            .values()
            .filter(|e| matches!(e, Entity::Shape(_)))
            .count() as u64;
        let col = (n % LAYOUT_COLUMNS) as f64;
        let row = (n / LAYOUT_COLUMNS) as f64;
        (LAYOUT_MARGIN + col * LAYOUT_STEP_X, LAYOUT_MARGIN + row * LAYOUT_STEP_Y)
    }
}

// The id allocator is bookkeeping, not observable state
impl PartialEq for Canvas {
    fn eq(&self, other: &Self) -> bool {
        self.entities == other.entities
    }
}
