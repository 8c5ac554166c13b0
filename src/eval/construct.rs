//! Entity construction and deletion

use super::command::{expect_number, expect_text, invalid, Operation};
use super::{Context, EvalError};
use crate::ast::Value;
use crate::model::{Array, Arrow, Entity, EntityId, EntityKind, Heap, LinkedList, Shape, Tree};

const DEFAULT_WIDTH: f64 = 100.0;
const DEFAULT_HEIGHT: f64 = 60.0;

/// Name a constructor is reported under
fn constructor_name(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Shape => "box",
        other => other.name(),
    }
}

/// Create a new entity of one kind
///
/// The id is reserved while binding so the command's snapshot covers the
/// slot the entity will occupy. Boxes built without coordinates take the
/// next layout slot when applied.
#[derive(Debug)]
pub struct Construct {
    kind: EntityKind,
    id: Option<EntityId>,
    entity: Option<Entity>,
    auto_place: bool,
}

impl Construct {
    pub fn new(kind: EntityKind) -> Self {
        Construct {
            kind,
            id: None,
            entity: None,
            auto_place: false,
        }
    }

    fn bind_shape(&mut self, args: &[Value]) -> Result<Entity, EvalError> {
        let op = constructor_name(self.kind);
        let label = |v: Option<&Value>| -> Result<String, EvalError> {
            v.map(|v| expect_text(op, v)).transpose().map(Option::unwrap_or_default)
        };
        let (x, y, width, height, text) = match args.len() {
            0 | 1 => {
                self.auto_place = true;
                (0.0, 0.0, DEFAULT_WIDTH, DEFAULT_HEIGHT, label(args.first())?)
            }
            2 | 3 => (
                expect_number(op, &args[0])?,
                expect_number(op, &args[1])?,
                DEFAULT_WIDTH,
                DEFAULT_HEIGHT,
                label(args.get(2))?,
            ),
            _ => (
                expect_number(op, &args[0])?,
                expect_number(op, &args[1])?,
                expect_number(op, &args[2])?,
                expect_number(op, &args[3])?,
                label(args.get(4))?,
            ),
        };
        if width <= 0.0 || height <= 0.0 {
            return Err(invalid(op, "requires a positive width and height"));
        }
        Ok(Entity::Shape(Shape {
            x,
            y,
            width,
            height,
            label: text,
        }))
    }

    fn bind_arrow(&self, args: &[Value], ctx: &Context) -> Result<Entity, EvalError> {
        let op = constructor_name(self.kind);
        let mut ends = [EntityId(0); 2];
        for (slot, v) in ends.iter_mut().zip(args) {
            let id = v
                .as_entity()
                .ok_or_else(|| invalid(op, format!("requires entity endpoints, got {}", v.type_name())))?;
            if !ctx.canvas.contains(id) {
                return Err(invalid(op, format!("entity {} does not exist", id)));
            }
            *slot = id;
        }
        let label = match args.get(2) {
            Some(v) => expect_text(op, v)?,
            None => String::new(),
        };
        Ok(Entity::Arrow(Arrow {
            from: ends[0],
            to: ends[1],
            label,
        }))
    }
}

/// `array([1, 2, 3])` spreads a single list argument
fn initial_values(args: Vec<Value>) -> Vec<Value> {
    match <[Value; 1]>::try_from(args) {
        Ok([Value::List(items)]) => items,
        Ok([single]) => vec![single],
        Err(args) => args,
    }
}

impl Operation for Construct {
    fn name(&self) -> &str {
        constructor_name(self.kind)
    }

    fn usage(&self) -> String {
        match self.kind {
            EntityKind::Shape => "box([label]) | box(x, y[, label]) | box(x, y, w, h[, label])".into(),
            EntityKind::Arrow => "arrow(from, to[, label])".into(),
            kind => format!("{}(values...)", kind),
        }
    }

    fn arity(&self) -> (usize, Option<usize>) {
        match self.kind {
            EntityKind::Shape => (0, Some(5)),
            EntityKind::Arrow => (2, Some(3)),
            _ => (0, None),
        }
    }

    fn bind(
        &mut self,
        _receiver: Option<EntityId>,
        args: Vec<Value>,
        ctx: &mut Context,
    ) -> Result<(), EvalError> {
        let op = constructor_name(self.kind);
        let entity = match self.kind {
            EntityKind::Shape => self.bind_shape(&args)?,
            EntityKind::Arrow => self.bind_arrow(&args, ctx)?,
            EntityKind::Array => Entity::Array(Array {
                items: initial_values(args),
            }),
            EntityKind::List => Entity::List(LinkedList::from_values(initial_values(args))),
            EntityKind::Tree => {
                let mut tree = Tree::new();
                for v in initial_values(args) {
                    tree.insert(v).map_err(|e| invalid(op, e.to_string()))?;
                }
                Entity::Tree(tree)
            }
            EntityKind::Heap => {
                let mut heap = Heap::new();
                for v in initial_values(args) {
                    heap.push(v).map_err(|e| invalid(op, e.to_string()))?;
                }
                Entity::Heap(heap)
            }
        };
        self.entity = Some(entity);
        self.id = Some(ctx.canvas.allocate());
        Ok(())
    }

    fn touched(&self) -> Vec<EntityId> {
        self.id.into_iter().collect()
    }

    fn apply(&mut self, ctx: &mut Context) -> Result<Value, EvalError> {
        let (Some(id), Some(mut entity)) = (self.id, self.entity.clone()) else {
            return Err(EvalError::Invariant(format!("{}: applied before binding", self.name())));
        };
        if let (true, Entity::Shape(shape)) = (self.auto_place, &mut entity) {
            let (x, y) = ctx.canvas.next_slot();
            shape.x = x;
            shape.y = y;
        }
        ctx.canvas.insert(id, entity);
        Ok(Value::Entity(id))
    }
}

/// Remove an entity and every arrow attached to it
#[derive(Debug, Default)]
pub struct Delete {
    targets: Vec<EntityId>,
}

impl Operation for Delete {
    fn name(&self) -> &str {
        "delete"
    }

    fn usage(&self) -> String {
        "delete(entity)".into()
    }

    fn arity(&self) -> (usize, Option<usize>) {
        (1, Some(1))
    }

    fn bind(
        &mut self,
        _receiver: Option<EntityId>,
        args: Vec<Value>,
        ctx: &mut Context,
    ) -> Result<(), EvalError> {
        let id = args[0]
            .as_entity()
            .ok_or_else(|| invalid("delete", format!("requires an entity, got {}", args[0].type_name())))?;
        if !ctx.canvas.contains(id) {
            return Err(invalid("delete", format!("entity {} does not exist", id)));
        }
        self.targets = vec![id];
        self.targets.extend(ctx.canvas.arrows_touching(id));
        Ok(())
    }

    fn touched(&self) -> Vec<EntityId> {
        self.targets.clone()
    }

    fn apply(&mut self, ctx: &mut Context) -> Result<Value, EvalError> {
        for id in &self.targets {
            ctx.canvas.remove(*id);
        }
        Ok(Value::Nil)
    }
}
