//! Process-level utilities: print, len, str, type, export, wait
//!
//! None of these change the canvas, so none of them are recorded.

use super::command::{expect_number, expect_text, invalid, Operation};
use super::{Context, EvalError};
use crate::ast::Value;
use crate::model::{Entity, EntityId, Receiver};
use std::time::Duration;

// === Output ===

/// print(values...) - write one line of output
#[derive(Debug, Default)]
pub struct Print {
    values: Vec<Value>,
}

impl Operation for Print {
    fn name(&self) -> &str {
        "print"
    }

    fn usage(&self) -> String {
        "print(value, ...)".into()
    }

    fn arity(&self) -> (usize, Option<usize>) {
        (0, None)
    }

    fn bind(&mut self, _: Option<EntityId>, args: Vec<Value>, _: &mut Context) -> Result<(), EvalError> {
        self.values = args;
        Ok(())
    }

    fn apply(&mut self, ctx: &mut Context) -> Result<Value, EvalError> {
        let line = self
            .values
            .iter()
            .map(|v| match v {
                Value::Entity(id) => match ctx.canvas.get(*id) {
                    Some(e) => e.summary(),
                    None => format!("{} (deleted)", id),
                },
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ");
        ctx.output.push(line);
        Ok(Value::Nil)
    }

    fn records(&self) -> bool {
        false
    }
}

// === Inspection ===

/// len(x) - length of a string, list, or container entity
#[derive(Debug, Default)]
pub struct Len {
    value: Value,
}

impl Operation for Len {
    fn name(&self) -> &str {
        "len"
    }

    fn usage(&self) -> String {
        "len(value)".into()
    }

    fn arity(&self) -> (usize, Option<usize>) {
        (1, Some(1))
    }

    fn bind(&mut self, _: Option<EntityId>, mut args: Vec<Value>, ctx: &mut Context) -> Result<(), EvalError> {
        let value = args.remove(0);
        match &value {
            Value::Str(_) | Value::List(_) => {}
            Value::Entity(id) => match ctx.canvas.get(*id) {
                Some(Entity::Shape(_)) | Some(Entity::Arrow(_)) | None => {
                    return Err(invalid("len", format!("{} has no length", value)))
                }
                Some(_) => {}
            },
            other => return Err(invalid("len", format!("{} has no length", other.type_name()))),
        }
        self.value = value;
        Ok(())
    }

    fn apply(&mut self, ctx: &mut Context) -> Result<Value, EvalError> {
        let n = match &self.value {
            Value::Str(s) => s.chars().count(),
            Value::List(items) => items.len(),
            Value::Entity(id) => match ctx.canvas.get(*id) {
                Some(Entity::Array(a)) => a.items.len(),
                Some(Entity::List(l)) => l.len(),
                Some(Entity::Tree(t)) => t.len(),
                Some(Entity::Heap(h)) => h.len(),
                _ => return Err(EvalError::Invariant("len: receiver vanished".into())),
            },
            _ => 0,
        };
        Ok(Value::Number(n as f64))
    }

    fn records(&self) -> bool {
        false
    }
}

/// str(x) - render a value as text
#[derive(Debug, Default)]
pub struct Str {
    value: Value,
}

impl Operation for Str {
    fn name(&self) -> &str {
        "str"
    }

    fn usage(&self) -> String {
        "str(value)".into()
    }

    fn arity(&self) -> (usize, Option<usize>) {
        (1, Some(1))
    }

    fn bind(&mut self, _: Option<EntityId>, mut args: Vec<Value>, _: &mut Context) -> Result<(), EvalError> {
        self.value = args.remove(0);
        Ok(())
    }

    fn apply(&mut self, _: &mut Context) -> Result<Value, EvalError> {
        Ok(Value::Str(self.value.to_string()))
    }

    fn records(&self) -> bool {
        false
    }
}

/// type(x) - type name, or the entity kind for handles
#[derive(Debug, Default)]
pub struct TypeOf {
    value: Value,
}

impl Operation for TypeOf {
    fn name(&self) -> &str {
        "type"
    }

    fn usage(&self) -> String {
        "type(value)".into()
    }

    fn arity(&self) -> (usize, Option<usize>) {
        (1, Some(1))
    }

    fn bind(&mut self, _: Option<EntityId>, mut args: Vec<Value>, _: &mut Context) -> Result<(), EvalError> {
        self.value = args.remove(0);
        Ok(())
    }

    fn apply(&mut self, ctx: &mut Context) -> Result<Value, EvalError> {
        let name = match &self.value {
            Value::Entity(id) => ctx.canvas.kind_of(*id).map_or("deleted", |k| k.name()),
            other => other.type_name(),
        };
        Ok(Value::Str(name.to_string()))
    }

    fn records(&self) -> bool {
        false
    }
}

// === Export ===

/// export([path]) - the canvas as JSON, returned or written to `path`
#[derive(Debug, Default)]
pub struct Export {
    path: Option<String>,
}

impl Export {
    fn document(ctx: &Context) -> Result<serde_json::Value, EvalError> {
        let mut entities = Vec::with_capacity(ctx.canvas.len());
        for (id, entity) in ctx.canvas.iter() {
            let mut json = serde_json::to_value(entity)
                .map_err(|e| EvalError::Runtime(format!("export: {}", e)))?;
            if let Some(obj) = json.as_object_mut() {
                obj.insert("id".into(), serde_json::Value::from(id.0));
            }
            entities.push(json);
        }
        Ok(serde_json::json!({
            "exported_at": chrono::Local::now().to_rfc3339(),
            "entities": entities,
        }))
    }
}

impl Operation for Export {
    fn name(&self) -> &str {
        "export"
    }

    fn usage(&self) -> String {
        "export([path])".into()
    }

    fn arity(&self) -> (usize, Option<usize>) {
        (0, Some(1))
    }

    fn bind(&mut self, _: Option<EntityId>, args: Vec<Value>, _: &mut Context) -> Result<(), EvalError> {
        self.path = match args.first() {
            Some(v) => Some(expect_text("export", v)?),
            None => None,
        };
        Ok(())
    }

    fn apply(&mut self, ctx: &mut Context) -> Result<Value, EvalError> {
        let doc = Self::document(ctx)?;
        let text = serde_json::to_string_pretty(&doc)
            .map_err(|e| EvalError::Runtime(format!("export: {}", e)))?;
        match &self.path {
            Some(path) => {
                std::fs::write(path, text)?;
                tracing::debug!(path = %path, "canvas exported");
                Ok(Value::Str(path.clone()))
            }
            None => Ok(Value::Str(text)),
        }
    }

    fn records(&self) -> bool {
        false
    }
}

// === Suspension ===

/// wait(ms) - park the running program for `ms` milliseconds
#[derive(Debug, Default)]
pub struct Wait {
    delay: Option<Duration>,
}

impl Operation for Wait {
    fn name(&self) -> &str {
        "wait"
    }

    fn usage(&self) -> String {
        "wait(milliseconds)".into()
    }

    fn arity(&self) -> (usize, Option<usize>) {
        (1, Some(1))
    }

    fn bind(&mut self, _: Option<EntityId>, args: Vec<Value>, _: &mut Context) -> Result<(), EvalError> {
        let ms = expect_number("wait", &args[0])?;
        if ms < 0.0 {
            return Err(invalid("wait", "requires a non-negative delay"));
        }
        self.delay = Some(Duration::from_micros((ms * 1000.0).round() as u64));
        Ok(())
    }

    fn apply(&mut self, _: &mut Context) -> Result<Value, EvalError> {
        Ok(Value::Nil)
    }

    fn records(&self) -> bool {
        false
    }

    fn suspension(&self) -> Option<Duration> {
        self.delay
    }
}
