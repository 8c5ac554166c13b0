//! Reversible commands
//!
//! Every console operation runs through the same lifecycle:
//!
//! ```text
//! Created -> ArgumentsChecked -> Executed <-> Undone
//!        \-> Failed (bad arity or arguments; nothing was touched)
//! ```
//!
//! Operations only say how to bind their arguments, which canvas slots they
//! touch, and how to apply themselves. `Command` owns the shared skeleton:
//! arity check, state capture before and after the first execution, replay
//! of the recorded post-state on redo, and restore of the pre-state on undo.
//! Operations that journal their own edits skip the capture and hand over a
//! record sized to the edit.

use super::environment::{Environment, Frame};
use super::snapshot::{Snapshot, StatePair};
use super::{Context, EvalError};
use crate::ast::{FunctionDef, Value};
use crate::model::{Canvas, Entity, EntityId, EntityKind, Receiver};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Lifecycle status of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Created,
    ArgumentsChecked,
    Executed,
    Undone,
    Failed,
}

/// One kind of console operation
///
/// `bind` must validate everything `apply` relies on: after a successful bind
/// the only errors `apply` may raise are unexpected ones.
pub trait Operation: fmt::Debug {
    /// Name used in messages and history listings
    fn name(&self) -> &str;

    /// Usage line shown with argument errors
    fn usage(&self) -> String;

    /// Minimum and optional maximum argument count
    fn arity(&self) -> (usize, Option<usize>);

    /// Extract and type-check operands. Must not mutate any receiver.
    fn bind(
        &mut self,
        receiver: Option<EntityId>,
        args: Vec<Value>,
        ctx: &mut Context,
    ) -> Result<(), EvalError>;

    /// Canvas slots whose state the operation may change
    fn touched(&self) -> Vec<EntityId> {
        Vec::new()
    }

    /// Perform the effect once
    fn apply(&mut self, ctx: &mut Context) -> Result<Value, EvalError>;

    /// True when `apply` records its own edit-level states instead of
    /// having the touched slots cloned around it. Such an `apply` must leave
    /// the canvas unchanged when it fails.
    fn journaled(&self) -> bool {
        false
    }

    /// Hand over the states recorded by the last `apply`
    fn take_journal(&mut self) -> Option<StatePair> {
        None
    }

    /// Whether executed instances belong in the undo history
    fn records(&self) -> bool {
        true
    }

    /// Set by operations that park the running program
    fn suspension(&self) -> Option<Duration> {
        None
    }
}

/// A finished user-function call and what it executed
#[derive(Debug)]
pub struct CallFrame {
    pub function: Rc<FunctionDef>,
    /// Bindings of the call's frame when it returned
    pub frame: Frame,
    /// Commands executed during the call, in order
    pub executed: Vec<Command>,
}

#[derive(Debug)]
enum Body {
    Primitive {
        op: Box<dyn Operation>,
        states: Option<StatePair>,
    },
    Call(CallFrame),
}

/// A reversible unit of execution
#[derive(Debug)]
pub struct Command {
    label: String,
    status: Status,
    body: Body,
    result: Value,
}

impl Command {
    pub fn new(op: Box<dyn Operation>) -> Self {
        Command {
            label: op.name().to_string(),
            status: Status::Created,
            body: Body::Primitive { op, states: None },
            result: Value::Nil,
        }
    }

    /// Wrap a user-function call that has already run
    pub fn call(call: CallFrame, args: &[Value], result: Value) -> Self {
        Command {
            label: format!("{}({})", call.function.name, join_args(args)),
            status: Status::Executed,
            body: Body::Call(call),
            result,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn result(&self) -> &Value {
        &self.result
    }

    /// States recorded by the first execution of a primitive command
    pub fn states(&self) -> Option<&StatePair> {
        match &self.body {
            Body::Primitive { states, .. } => states.as_ref(),
            Body::Call(_) => None,
        }
    }

    pub fn records(&self) -> bool {
        match &self.body {
            Body::Primitive { op, .. } => op.records(),
            Body::Call(_) => true,
        }
    }

    pub fn suspension(&self) -> Option<Duration> {
        match &self.body {
            Body::Primitive { op, .. } => op.suspension(),
            Body::Call(_) => None,
        }
    }

    /// Sub-commands of a function call (empty for primitives)
    pub fn children(&self) -> &[Command] {
        match &self.body {
            Body::Call(call) => &call.executed,
            Body::Primitive { .. } => &[],
        }
    }

    /// Check arity, then bind. Any failure is terminal and leaves every
    /// receiver untouched.
    pub fn check_arguments(
        &mut self,
        receiver: Option<EntityId>,
        args: Vec<Value>,
        ctx: &mut Context,
    ) -> Result<(), EvalError> {
        let Body::Primitive { op, .. } = &mut self.body else {
            return Err(EvalError::Invariant("check_arguments: not a primitive command".into()));
        };
        if self.status != Status::Created {
            return Err(EvalError::Invariant(format!(
                "{}: arguments already checked",
                op.name()
            )));
        }

        self.label = match receiver {
            Some(id) => format!("{}.{}({})", id, op.name(), join_args(&args)),
            None => format!("{}({})", op.name(), join_args(&args)),
        };

        let (min, max) = op.arity();
        if let Err(e) = check_argument_count(&**op, min, max, args.len()) {
            self.status = Status::Failed;
            return Err(e);
        }
        if let Err(e) = op.bind(receiver, args, ctx) {
            self.status = Status::Failed;
            return Err(e);
        }
        self.status = Status::ArgumentsChecked;
        Ok(())
    }

    /// Run the command.
    ///
    /// The first run captures the pre- and post-state of every touched slot.
    /// Later runs (redo) restore the recorded post-state instead of applying
    /// the operation again, so they reproduce the original outcome exactly.
    pub fn execute(&mut self, ctx: &mut Context) -> Result<Value, EvalError> {
        match &mut self.body {
            Body::Primitive { op, states } => match self.status {
                Status::ArgumentsChecked => {
                    let ids = op.touched();
                    let before = (!op.journaled()).then(|| Snapshot::capture(&ctx.canvas, &ids));
                    match op.apply(ctx) {
                        Ok(value) => {
                            let pair = match before {
                                Some(before) => StatePair {
                                    before,
                                    after: Snapshot::capture(&ctx.canvas, &ids),
                                },
                                None => match op.take_journal() {
                                    Some(pair) => pair,
                                    None => {
                                        self.status = Status::Failed;
                                        return Err(EvalError::Invariant(format!(
                                            "{}: applied without a journal",
                                            self.label
                                        )));
                                    }
                                },
                            };
                            *states = Some(pair);
                            self.result = value;
                            self.status = Status::Executed;
                            tracing::debug!(command = %self.label, "executed");
                            Ok(self.result.clone())
                        }
                        Err(e) => {
                            if let Some(before) = before {
                                before.restore(&mut ctx.canvas);
                            }
                            self.status = Status::Failed;
                            Err(e)
                        }
                    }
                }
                Status::Executed | Status::Undone => {
                    let pair = states.as_ref().ok_or_else(|| {
                        EvalError::Invariant(format!("{}: executed without a snapshot", self.label))
                    })?;
                    pair.after.restore(&mut ctx.canvas);
                    self.status = Status::Executed;
                    tracing::debug!(command = %self.label, "reapplied");
                    Ok(self.result.clone())
                }
                Status::Created | Status::Failed => Err(EvalError::Invariant(format!(
                    "{}: execute called before a successful argument check",
                    self.label
                ))),
            },
            Body::Call(call) => {
                let executed = &mut call.executed;
                let (outcome, _) = Environment::with_frame(ctx, call.frame.clone(), |ctx| {
                    executed.iter_mut().try_for_each(|c| c.execute(ctx).map(|_| ()))
                })?;
                outcome?;
                self.status = Status::Executed;
                tracing::debug!(command = %self.label, "reapplied call");
                Ok(self.result.clone())
            }
        }
    }

    /// Restore the state from before the first execution
    pub fn undo(&mut self, ctx: &mut Context) -> Result<(), EvalError> {
        if !matches!(self.status, Status::Executed | Status::Undone) {
            return Err(EvalError::Invariant(format!(
                "{}: undo called before execute",
                self.label
            )));
        }
        match &mut self.body {
            Body::Primitive { states, .. } => {
                let pair = states.as_ref().ok_or_else(|| {
                    EvalError::Invariant(format!("{}: executed without a snapshot", self.label))
                })?;
                pair.before.restore(&mut ctx.canvas);
            }
            Body::Call(call) => {
                let executed = &mut call.executed;
                let (outcome, _) = Environment::with_frame(ctx, call.frame.clone(), |ctx| {
                    executed.iter_mut().rev().try_for_each(|c| c.undo(ctx))
                })?;
                outcome?;
            }
        }
        self.status = Status::Undone;
        tracing::debug!(command = %self.label, "undone");
        Ok(())
    }

    /// Jump straight to the pre-state without the undo bookkeeping
    pub(crate) fn seek_before(&mut self, canvas: &mut Canvas) {
        match &mut self.body {
            Body::Primitive { states, .. } => {
                if let Some(pair) = states {
                    pair.before.restore(canvas);
                }
            }
            Body::Call(call) => {
                for c in call.executed.iter_mut().rev() {
                    c.seek_before(canvas);
                }
            }
        }
        if self.status == Status::Executed {
            self.status = Status::Undone;
        }
    }

    /// Jump straight to the post-state
    pub(crate) fn seek_after(&mut self, canvas: &mut Canvas) {
        match &mut self.body {
            Body::Primitive { states, .. } => {
                if let Some(pair) = states {
                    pair.after.restore(canvas);
                }
            }
            Body::Call(call) => {
                for c in call.executed.iter_mut() {
                    c.seek_after(canvas);
                }
            }
        }
        if self.status == Status::Undone {
            self.status = Status::Executed;
        }
    }
}

fn join_args(args: &[Value]) -> String {
    args.iter()
        .map(|v| match v {
            Value::Str(s) => format!("\"{}\"", s),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fail with an arity error if `got` is outside `min..=max`
pub fn check_argument_count(
    op: &dyn Operation,
    min: usize,
    max: Option<usize>,
    got: usize,
) -> Result<(), EvalError> {
    let too_many = max.is_some_and(|m| got > m);
    if got < min || too_many {
        return Err(EvalError::Arity {
            op: op.name().to_string(),
            expected: match max {
                Some(m) if m == min => format!("{}", min),
                Some(m) => format!("{} to {}", min, m),
                None => format!("at least {}", min),
            },
            got,
            usage: op.usage(),
        });
    }
    Ok(())
}

// === Binding helpers shared by operations ===

pub(crate) fn invalid(op: &str, reason: impl Into<String>) -> EvalError {
    EvalError::Validation {
        op: op.to_string(),
        reason: reason.into(),
    }
}

pub(crate) fn expect_number(op: &str, v: &Value) -> Result<f64, EvalError> {
    match v {
        Value::Number(n) if n.is_finite() => Ok(*n),
        _ => Err(invalid(op, format!("requires numeric arguments, got {}", v.type_name()))),
    }
}

pub(crate) fn expect_index(op: &str, v: &Value) -> Result<usize, EvalError> {
    v.as_index()
        .ok_or_else(|| invalid(op, format!("requires a non-negative integer index, got {}", v)))
}

pub(crate) fn expect_text(op: &str, v: &Value) -> Result<String, EvalError> {
    match v {
        Value::Str(s) => Ok(s.clone()),
        Value::Number(_) | Value::Bool(_) => Ok(v.to_string()),
        _ => Err(invalid(op, format!("requires a text argument, got {}", v.type_name()))),
    }
}

/// Resolve the receiver a method was bound to and check its kind
pub(crate) fn expect_receiver<'a>(
    op: &str,
    receiver: Option<EntityId>,
    kind: EntityKind,
    canvas: &'a Canvas,
) -> Result<(EntityId, &'a Entity), EvalError> {
    let id = receiver.ok_or_else(|| invalid(op, format!("requires a {} receiver", kind)))?;
    let entity = canvas
        .get(id)
        .ok_or_else(|| invalid(op, format!("entity {} no longer exists", id)))?;
    if entity.kind() != kind {
        return Err(invalid(
            op,
            format!("requires a {} receiver, got {}", kind, entity.kind()),
        ));
    }
    Ok((id, entity))
}
