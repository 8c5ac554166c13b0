//! Box and arrow edits

use super::command::{expect_number, expect_receiver, expect_text, invalid, Operation};
use super::{Context, EvalError};
use crate::ast::Value;
use crate::model::{Entity, EntityId, EntityKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeMethod {
    /// `move(x, y)` or `move([x, y])`
    MoveTo,
    /// `translate(dx, dy)`
    MoveBy,
    /// `resize(w, h)`
    Resize,
    /// `label(text)`
    Label,
}

impl ShapeMethod {
    fn name(self) -> &'static str {
        match self {
            ShapeMethod::MoveTo => "move",
            ShapeMethod::MoveBy => "translate",
            ShapeMethod::Resize => "resize",
            ShapeMethod::Label => "label",
        }
    }
}

/// Read a coordinate pair given either as two numbers or as one `[x, y]` list
fn expect_pair(op: &str, args: &[Value]) -> Result<(f64, f64), EvalError> {
    match args {
        [Value::List(items)] if items.len() == 2 => {
            Ok((expect_number(op, &items[0])?, expect_number(op, &items[1])?))
        }
        [a, b] => Ok((expect_number(op, a)?, expect_number(op, b)?)),
        _ => Err(invalid(op, "requires a coordinate pair")),
    }
}

#[derive(Debug)]
pub struct ShapeEdit {
    method: ShapeMethod,
    target: Option<EntityId>,
    pair: (f64, f64),
    text: String,
}

impl ShapeEdit {
    pub fn new(method: ShapeMethod) -> Self {
        ShapeEdit {
            method,
            target: None,
            pair: (0.0, 0.0),
            text: String::new(),
        }
    }
}

impl Operation for ShapeEdit {
    fn name(&self) -> &str {
        self.method.name()
    }

    fn usage(&self) -> String {
        match self.method {
            ShapeMethod::MoveTo => "box.move(x, y)".into(),
            ShapeMethod::MoveBy => "box.translate(dx, dy)".into(),
            ShapeMethod::Resize => "box.resize(width, height)".into(),
            ShapeMethod::Label => "box.label(text)".into(),
        }
    }

    fn arity(&self) -> (usize, Option<usize>) {
        match self.method {
            ShapeMethod::MoveTo | ShapeMethod::MoveBy => (1, Some(2)),
            ShapeMethod::Resize => (2, Some(2)),
            ShapeMethod::Label => (1, Some(1)),
        }
    }

    fn bind(
        &mut self,
        receiver: Option<EntityId>,
        args: Vec<Value>,
        ctx: &mut Context,
    ) -> Result<(), EvalError> {
        let op = self.method.name();
        let (id, _) = expect_receiver(op, receiver, EntityKind::Shape, &ctx.canvas)?;
        match self.method {
            ShapeMethod::MoveTo | ShapeMethod::MoveBy => self.pair = expect_pair(op, &args)?,
            ShapeMethod::Resize => {
                self.pair = expect_pair(op, &args)?;
                if self.pair.0 <= 0.0 || self.pair.1 <= 0.0 {
                    return Err(invalid(op, "requires a positive width and height"));
                }
            }
            ShapeMethod::Label => self.text = expect_text(op, &args[0])?,
        }
        self.target = Some(id);
        Ok(())
    }

    fn touched(&self) -> Vec<EntityId> {
        self.target.into_iter().collect()
    }

    fn apply(&mut self, ctx: &mut Context) -> Result<Value, EvalError> {
        let shape = match self.target.and_then(|id| ctx.canvas.get_mut(id)) {
            Some(Entity::Shape(s)) => s,
            _ => return Err(EvalError::Invariant(format!("{}: receiver vanished", self.name()))),
        };
        let (a, b) = self.pair;
        match self.method {
            ShapeMethod::MoveTo => {
                shape.x = a;
                shape.y = b;
            }
            ShapeMethod::MoveBy => {
                shape.x += a;
                shape.y += b;
            }
            ShapeMethod::Resize => {
                shape.width = a;
                shape.height = b;
            }
            ShapeMethod::Label => shape.label = self.text.clone(),
        }
        Ok(Value::Nil)
    }
}

/// `arrow.label(text)`
#[derive(Debug, Default)]
pub struct ArrowEdit {
    target: Option<EntityId>,
    text: String,
}

impl Operation for ArrowEdit {
    fn name(&self) -> &str {
        "label"
    }

    fn usage(&self) -> String {
        "arrow.label(text)".into()
    }

    fn arity(&self) -> (usize, Option<usize>) {
        (1, Some(1))
    }

    fn bind(
        &mut self,
        receiver: Option<EntityId>,
        args: Vec<Value>,
        ctx: &mut Context,
    ) -> Result<(), EvalError> {
        let (id, _) = expect_receiver("label", receiver, EntityKind::Arrow, &ctx.canvas)?;
        self.text = expect_text("label", &args[0])?;
        self.target = Some(id);
        Ok(())
    }

    fn touched(&self) -> Vec<EntityId> {
        self.target.into_iter().collect()
    }

    fn apply(&mut self, ctx: &mut Context) -> Result<Value, EvalError> {
        match self.target.and_then(|id| ctx.canvas.get_mut(id)) {
            Some(Entity::Arrow(a)) => {
                a.label = self.text.clone();
                Ok(Value::Nil)
            }
            _ => Err(EvalError::Invariant("label: receiver vanished".into())),
        }
    }
}
