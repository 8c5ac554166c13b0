//! Command factory
//!
//! Two lookup tables turn a call form into an operation:
//!
//! - free functions, keyed by name (`print`, `export`, `wait`, ...)
//! - methods, keyed by `(EntityKind, method name)` (`(Array, "push")`, ...)
//!
//! Constructor aliases (`box`, `array`, `bst`, ...) route to the generic
//! construct operation for their kind. Table values are `OpKind` tags, so
//! adding an operation means adding a variant and every `match` on it.

use super::array::{ArrayEdit, ArrayMethod};
use super::command::Operation;
use super::construct::{Construct, Delete};
use super::list::{ListEdit, ListMethod};
use super::ordered::{HeapEdit, HeapMethod, TreeEdit, TreeMethod};
use super::query::{Query, QueryMethod};
use super::shape::{ArrowEdit, ShapeEdit, ShapeMethod};
use super::utility::{Export, Len, Print, Str, TypeOf, Wait};
use crate::model::EntityKind;
use std::collections::HashMap;

/// Tag for every operation the console knows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Construct(EntityKind),
    Delete,
    Print,
    Len,
    Str,
    TypeOf,
    Export,
    Wait,
    Shape(ShapeMethod),
    ArrowLabel,
    Array(ArrayMethod),
    List(ListMethod),
    Tree(TreeMethod),
    Heap(HeapMethod),
    Query(EntityKind, QueryMethod),
}

impl OpKind {
    /// Fresh, unbound operation instance
    pub fn instantiate(self) -> Box<dyn Operation> {
        match self {
            OpKind::Construct(kind) => Box::new(Construct::new(kind)),
            OpKind::Delete => Box::new(Delete::default()),
            OpKind::Print => Box::new(Print::default()),
            OpKind::Len => Box::new(Len::default()),
            OpKind::Str => Box::new(Str::default()),
            OpKind::TypeOf => Box::new(TypeOf::default()),
            OpKind::Export => Box::new(Export::default()),
            OpKind::Wait => Box::new(Wait::default()),
            OpKind::Shape(method) => Box::new(ShapeEdit::new(method)),
            OpKind::ArrowLabel => Box::new(ArrowEdit::default()),
            OpKind::Array(method) => Box::new(ArrayEdit::new(method)),
            OpKind::List(method) => Box::new(ListEdit::new(method)),
            OpKind::Tree(method) => Box::new(TreeEdit::new(method)),
            OpKind::Heap(method) => Box::new(HeapEdit::new(method)),
            OpKind::Query(kind, method) => Box::new(Query::new(kind, method)),
        }
    }
}

pub struct Dispatcher {
    functions: HashMap<&'static str, OpKind>,
    methods: HashMap<(EntityKind, &'static str), OpKind>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        let mut d = Dispatcher {
            functions: HashMap::new(),
            methods: HashMap::new(),
        };

        // Process-level utilities
        d.functions.insert("print", OpKind::Print);
        d.functions.insert("len", OpKind::Len);
        d.functions.insert("str", OpKind::Str);
        d.functions.insert("type", OpKind::TypeOf);
        d.functions.insert("export", OpKind::Export);
        d.functions.insert("wait", OpKind::Wait);
        d.functions.insert("sleep", OpKind::Wait);
        d.functions.insert("delete", OpKind::Delete);

        use EntityKind as K;

        // Boxes
        d.method(K::Shape, "move", OpKind::Shape(ShapeMethod::MoveTo));
        d.method(K::Shape, "translate", OpKind::Shape(ShapeMethod::MoveBy));
        d.method(K::Shape, "resize", OpKind::Shape(ShapeMethod::Resize));
        d.method(K::Shape, "label", OpKind::Shape(ShapeMethod::Label));
        d.method(K::Shape, "position", OpKind::Query(K::Shape, QueryMethod::Position));
        d.method(K::Shape, "size", OpKind::Query(K::Shape, QueryMethod::Size));
        d.method(K::Shape, "text", OpKind::Query(K::Shape, QueryMethod::Text));

        // Arrows
        d.method(K::Arrow, "label", OpKind::ArrowLabel);
        d.method(K::Arrow, "ends", OpKind::Query(K::Arrow, QueryMethod::Ends));
        d.method(K::Arrow, "text", OpKind::Query(K::Arrow, QueryMethod::Text));

        // Arrays
        d.method(K::Array, "push", OpKind::Array(ArrayMethod::Push));
        d.method(K::Array, "pop", OpKind::Array(ArrayMethod::Pop));
        d.method(K::Array, "set", OpKind::Array(ArrayMethod::Set));
        d.method(K::Array, "insert", OpKind::Array(ArrayMethod::Insert));
        d.method(K::Array, "remove", OpKind::Array(ArrayMethod::Remove));
        d.method(K::Array, "swap", OpKind::Array(ArrayMethod::Swap));
        d.method(K::Array, "clear", OpKind::Array(ArrayMethod::Clear));
        d.method(K::Array, "reverse", OpKind::Array(ArrayMethod::Reverse));
        d.method(K::Array, "sort", OpKind::Array(ArrayMethod::Sort));

        // Linked lists
        d.method(K::List, "append", OpKind::List(ListMethod::Append));
        d.method(K::List, "push", OpKind::List(ListMethod::Append));
        d.method(K::List, "prepend", OpKind::List(ListMethod::Prepend));
        d.method(K::List, "insert", OpKind::List(ListMethod::Insert));
        d.method(K::List, "remove", OpKind::List(ListMethod::Remove));
        d.method(K::List, "set", OpKind::List(ListMethod::Set));
        d.method(K::List, "clear", OpKind::List(ListMethod::Clear));

        // Trees and heaps
        d.method(K::Tree, "insert", OpKind::Tree(TreeMethod::Insert));
        d.method(K::Tree, "remove", OpKind::Tree(TreeMethod::Remove));
        d.method(K::Tree, "contains", OpKind::Query(K::Tree, QueryMethod::Contains));
        d.method(K::Tree, "height", OpKind::Query(K::Tree, QueryMethod::Height));
        d.method(K::Heap, "push", OpKind::Heap(HeapMethod::Push));
        d.method(K::Heap, "pop", OpKind::Heap(HeapMethod::Pop));
        d.method(K::Heap, "peek", OpKind::Query(K::Heap, QueryMethod::Peek));

        // Queries shared by every container
        for kind in [K::Array, K::List, K::Tree, K::Heap] {
            d.method(kind, "len", OpKind::Query(kind, QueryMethod::Len));
            d.method(kind, "values", OpKind::Query(kind, QueryMethod::Values));
            d.method(kind, "index_of", OpKind::Query(kind, QueryMethod::IndexOf));
        }
        for kind in [K::Array, K::List] {
            d.method(kind, "get", OpKind::Query(kind, QueryMethod::Get));
            d.method(kind, "contains", OpKind::Query(kind, QueryMethod::Contains));
        }

        d
    }

    fn method(&mut self, kind: EntityKind, name: &'static str, op: OpKind) {
        self.methods.insert((kind, name), op);
    }

    /// Resolve a free-function name, including constructor aliases
    pub fn function(&self, name: &str) -> Option<OpKind> {
        if let Some(kind) = EntityKind::from_alias(name) {
            return Some(OpKind::Construct(kind));
        }
        self.functions.get(name).copied()
    }

    /// Resolve `(kind, method)`
    pub fn lookup_method(&self, kind: EntityKind, name: &str) -> Option<OpKind> {
        self.methods.get(&(kind, name)).copied()
    }

    /// Free-function names, sorted (constructor aliases not included)
    pub fn function_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.functions.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Method names available on `kind`, sorted
    pub fn methods_for(&self, kind: EntityKind) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .methods
            .keys()
            .filter(|(k, _)| *k == kind)
            .map(|(_, name)| *name)
            .collect();
        names.sort_unstable();
        names
    }
}
