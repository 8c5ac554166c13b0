//! Scoped variable storage
//!
//! A LIFO stack of namespaces. Frame 0 is the global namespace: it is created
//! with the environment and can never be popped. Function calls push a frame
//! on entry and pop it on every exit path.

use super::{Context, EvalError, Evaluator};
use crate::ast::Value;
use std::collections::HashMap;

/// One scope level
pub type Frame = HashMap<String, Value>;

#[derive(Debug, Clone)]
pub struct Environment {
    frames: Vec<Frame>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Environment { frames: vec![Frame::new()] }
    }

    pub fn push_frame(&mut self, bindings: Frame) {
        self.frames.push(bindings);
    }

    /// Pop the innermost call frame. The global frame is never popped.
    pub fn pop_frame(&mut self) -> Result<Frame, EvalError> {
        if self.frames.len() <= 1 {
            return Err(EvalError::Invariant("pop_frame: cannot pop the global frame".into()));
        }
        self.frames
            .pop()
            .ok_or_else(|| EvalError::Invariant("pop_frame: frame stack is empty".into()))
    }

    /// Number of call frames above the global frame
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    /// Search frames from the top down
    pub fn lookup(&self, name: &str) -> Result<&Value, EvalError> {
        self.get(name)
            .ok_or_else(|| EvalError::UndefinedName(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|f| f.get(name))
    }

    /// Assign in the nearest frame that already binds `name`; otherwise
    /// create the binding in the current top frame.
    pub fn assign(&mut self, name: &str, value: Value) {
        if let Some(frame) = self.frames.iter_mut().rev().find(|f| f.contains_key(name)) {
            frame.insert(name.to_string(), value);
            return;
        }
        if let Some(top) = self.frames.last_mut() {
            top.insert(name.to_string(), value);
        }
    }

    /// Bind in the global frame regardless of call depth
    pub fn global_assign(&mut self, name: &str, value: Value) {
        self.frames[0].insert(name.to_string(), value);
    }

    pub fn globals(&self) -> &Frame {
        &self.frames[0]
    }

    /// Run `body` on `owner` with `bindings` pushed as the innermost frame.
    /// The frame is popped whatever `body` returns and is handed back with
    /// the body's result.
    pub fn with_frame<S: Scoped, T>(
        owner: &mut S,
        bindings: Frame,
        body: impl FnOnce(&mut S) -> T,
    ) -> Result<(T, Frame), EvalError> {
        owner.env_mut().push_frame(bindings);
        let out = body(owner);
        let frame = owner.env_mut().pop_frame()?;
        Ok((out, frame))
    }
}

/// Anything that owns the variable environment
pub trait Scoped {
    fn env_mut(&mut self) -> &mut Environment;
}

impl Scoped for Environment {
    fn env_mut(&mut self) -> &mut Environment {
        self
    }
}

impl Scoped for Context {
    fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }
}

impl Scoped for Evaluator {
    fn env_mut(&mut self) -> &mut Environment {
        &mut self.ctx.env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    #[test]
    fn test_lookup_falls_through_to_global() {
        let mut env = Environment::new();
        env.assign("x", num(1.0));
        env.push_frame(Frame::new());
        assert_eq!(env.lookup("x").unwrap(), &num(1.0));
    }

    #[test]
    fn test_undefined_name() {
        let env = Environment::new();
        assert!(matches!(env.lookup("nope"), Err(EvalError::UndefinedName(n)) if n == "nope"));
    }

    #[test]
    fn test_shadowing_and_pop() {
        let mut env = Environment::new();
        env.assign("x", num(1.0));
        let mut frame = Frame::new();
        frame.insert("x".into(), num(2.0));
        env.push_frame(frame);
        assert_eq!(env.lookup("x").unwrap(), &num(2.0));
        env.pop_frame().unwrap();
        assert_eq!(env.lookup("x").unwrap(), &num(1.0));
    }

    #[test]
    fn test_assign_updates_nearest_binding() {
        let mut env = Environment::new();
        env.assign("total", num(0.0));
        env.push_frame(Frame::new());
        env.assign("total", num(5.0));
        env.assign("local", num(1.0));
        let popped = env.pop_frame().unwrap();
        assert_eq!(env.lookup("total").unwrap(), &num(5.0));
        assert!(env.get("local").is_none());
        assert!(popped.contains_key("local"));
    }

    #[test]
    fn test_global_assign_from_depth() {
        let mut env = Environment::new();
        env.push_frame(Frame::new());
        env.push_frame(Frame::new());
        env.global_assign("g", num(3.0));
        assert_eq!(env.depth(), 2);
        env.pop_frame().unwrap();
        env.pop_frame().unwrap();
        assert_eq!(env.globals().get("g"), Some(&num(3.0)));
    }

    #[test]
    fn test_with_frame_pops_on_error() {
        let mut env = Environment::new();
        let mut frame = Frame::new();
        frame.insert("n".into(), num(1.0));
        let (out, popped) = Environment::with_frame(&mut env, frame, |env| {
            env.assign("n", num(2.0));
            env.lookup("missing").cloned()
        })
        .unwrap();
        assert!(matches!(out, Err(EvalError::UndefinedName(_))));
        assert_eq!(popped.get("n"), Some(&num(2.0)));
        assert_eq!(env.depth(), 0);
        assert!(env.get("n").is_none());
    }

    #[test]
    fn test_global_frame_never_popped() {
        let mut env = Environment::new();
        assert!(matches!(env.pop_frame(), Err(EvalError::Invariant(_))));
        assert_eq!(env.depth(), 0);
    }
}
