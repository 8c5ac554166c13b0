//! Evaluator for the dsviz console language
//!
//! The evaluator turns statements into reversible commands:
//! - Calls resolve through the dispatch tables into an `Operation`
//! - Each operation runs inside a `Command` that validates its arguments,
//!   captures the touched canvas state, and can undo/redo itself exactly
//! - Executed commands land in the `Recorder` (top level) or in the
//!   accumulation list of the enclosing user-function call
//!
//! # Execution model
//!
//! Statement sequences run on an explicit task stack (see `control.rs`), so
//! loops, branches and function bodies never recurse through the host stack
//! for control flow, and `return` is an ordinary `Flow` value. The same task
//! stack is what gets parked when `wait(ms)` suspends a program
//! (see `async_ops.rs`).

mod array;
mod async_ops;
mod command;
mod construct;
mod control;
mod dispatch;
mod environment;
mod expr;
mod function;
mod list;
mod ordered;
mod query;
mod recorder;
mod shape;
mod snapshot;
mod utility;
mod tests;

pub use async_ops::EvalStatus;
pub use command::{check_argument_count, CallFrame, Command, Operation, Status};
pub use array::ArrayMethod;
pub use dispatch::{Dispatcher, OpKind};
pub use list::ListMethod;
pub use ordered::{HeapMethod, TreeMethod};
pub use query::QueryMethod;
pub use shape::ShapeMethod;
pub use environment::{Environment, Frame, Scoped};
pub use recorder::{Entry, Recorder};
pub use snapshot::{Snapshot, StatePair};

use crate::ast::{FunctionDef, Program, Value};
use crate::clock::{Clock, SystemClock};
use crate::model::{Canvas, EntityKind, ModelError};
use crate::signals::InterruptFlag;
use async_ops::Continuation;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("{op}: expected {expected} arguments, got {got} (usage: {usage})")]
    Arity {
        op: String,
        expected: String,
        got: usize,
        usage: String,
    },
    #[error("{op}: {reason}")]
    Validation { op: String, reason: String },
    #[error("{}", unknown_operation_message(.name, .kind))]
    UnknownOperation {
        name: String,
        kind: Option<EntityKind>,
    },
    #[error("Undefined name: {0}")]
    UndefinedName(String),
    #[error("Internal error: {0}")]
    Invariant(String),
    #[error("Usage error: {0}")]
    Usage(String),
    #[error("Type error: expected {expected}, got {got}")]
    TypeError { expected: String, got: String },
    #[error("Runtime error: {0}")]
    Runtime(String),
    #[error("Interrupted")]
    Interrupted,
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

fn unknown_operation_message(name: &str, kind: &Option<EntityKind>) -> String {
    match kind {
        Some(k) => format!("Unknown operation: {} has no method '{}'", k, name),
        None => format!("Unknown operation: '{}'", name),
    }
}

/// Runtime limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Iterations a single loop may run before it is stopped
    pub max_loop_steps: usize,
    /// Maximum nesting of user-function calls
    pub max_call_depth: usize,
}

pub const DEFAULT_MAX_LOOP_STEPS: usize = 1_000_000;
pub const DEFAULT_MAX_CALL_DEPTH: usize = 200;

impl Default for Config {
    fn default() -> Self {
        Config {
            max_loop_steps: DEFAULT_MAX_LOOP_STEPS,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl Config {
    /// Defaults, overridden by DSVIZ_MAX_LOOP_STEPS / DSVIZ_MAX_DEPTH
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Config {
            max_loop_steps: std::env::var("DSVIZ_MAX_LOOP_STEPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_loop_steps),
            max_call_depth: std::env::var("DSVIZ_MAX_DEPTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_call_depth),
        }
    }
}

/// Everything a command may read or change
#[derive(Debug, Default)]
pub struct Context {
    pub canvas: Canvas,
    pub env: Environment,
    /// Lines printed since the last result was returned
    pub output: Vec<String>,
    /// Warnings raised since the last result was returned
    pub warnings: Vec<String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, message: String) {
        tracing::warn!("{}", message);
        self.warnings.push(message);
    }
}

/// Result of evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct EvalResult {
    /// Value of the last expression statement that ran
    pub value: Value,
    /// Printed lines, joined by newlines
    pub output: String,
    /// Warnings such as stopped runaway loops
    pub warnings: Vec<String>,
    /// Whether the program finished or is parked on a wait
    pub status: EvalStatus,
}

/// The evaluator maintains state and executes programs
pub struct Evaluator {
    /// Canvas, variables, and pending output
    pub(crate) ctx: Context,
    /// Undo/redo history of top-level commands
    pub(crate) recorder: Recorder,
    /// Function and method tables
    pub(crate) dispatcher: Dispatcher,
    /// User-defined functions (visible at every call depth)
    pub(crate) functions: HashMap<String, Rc<FunctionDef>>,
    /// Commands executed by each active user-function call, innermost last
    pub(crate) accumulators: Vec<Vec<Command>>,
    /// Programs waiting to run or resume, in submission order
    pub(crate) queue: VecDeque<Continuation>,
    /// Suspension requested by the command that just ran
    pub(crate) pending_wait: Option<Duration>,
    /// Time source for history timestamps
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) config: Config,
    pub(crate) last_value: Value,
    /// Raised by Ctrl+C, polled by the task loop
    pub(crate) interrupt: InterruptFlag,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self::with_config(Config::from_env())
    }

    pub fn with_config(config: Config) -> Self {
        Evaluator {
            ctx: Context::new(),
            recorder: Recorder::new(),
            dispatcher: Dispatcher::new(),
            functions: HashMap::new(),
            accumulators: Vec::new(),
            queue: VecDeque::new(),
            pending_wait: None,
            clock: Box::new(SystemClock::new()),
            config,
            last_value: Value::Nil,
            interrupt: InterruptFlag::new(),
        }
    }

    /// Replace the time source used to stamp history entries
    pub fn set_clock(&mut self, clock: Box<dyn Clock>) {
        self.clock = clock;
    }

    /// Current reading of the history clock
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Handle that stops the running program when raised
    pub fn interrupt_handle(&self) -> InterruptFlag {
        self.interrupt.clone()
    }

    pub fn config(&self) -> Config {
        self.config
    }

    pub fn canvas(&self) -> &Canvas {
        &self.ctx.canvas
    }

    pub fn env(&self) -> &Environment {
        &self.ctx.env
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Look up a variable in the current scope chain
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.ctx.env.get(name)
    }

    /// Names of user-defined functions, sorted
    pub fn function_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.keys().cloned().collect();
        names.sort();
        names
    }

    /// Depth of user-function calls currently running
    pub(crate) fn call_depth(&self) -> usize {
        self.accumulators.len()
    }

    // === History control ===

    /// Undo the newest applied command. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> Result<bool, EvalError> {
        self.recorder.undo(&mut self.ctx)
    }

    /// Redo the oldest undone command. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> Result<bool, EvalError> {
        self.recorder.redo(&mut self.ctx)
    }

    /// Drop history past `time` and seek the canvas to that point
    pub fn truncate(&mut self, time: f64) -> usize {
        self.recorder.truncate(time, &mut self.ctx.canvas)
    }

    /// Hand a command to the innermost active call, or to the history
    pub(crate) fn record(&mut self, command: Command) {
        if let Some(acc) = self.accumulators.last_mut() {
            acc.push(command);
        } else {
            let now = self.clock.now();
            self.recorder.push(command, now);
        }
    }

    // === Program entry points ===

    /// Evaluate a program.
    ///
    /// If an earlier program is parked on a `wait`, this one is queued behind
    /// it and reported as `EvalStatus::Queued`; it runs when the earlier one
    /// finishes.
    pub fn eval(&mut self, program: &Program) -> Result<EvalResult, EvalError> {
        let continuation = Continuation::new(program.block());
        if self.is_suspended() {
            self.queue.push_back(continuation);
            return Ok(self.take_result(EvalStatus::Queued));
        }
        self.queue.push_back(continuation);
        self.drive()
    }

    pub(crate) fn take_result(&mut self, status: EvalStatus) -> EvalResult {
        EvalResult {
            value: std::mem::take(&mut self.last_value),
            output: std::mem::take(&mut self.ctx.output).join("\n"),
            warnings: std::mem::take(&mut self.ctx.warnings),
            status,
        }
    }
}
