//! User-defined function calls
//!
//! A call binds its arguments in a brand-new frame, runs the body on its own
//! task stack, and collects every command the body executed. The collected
//! list becomes a single history entry for the call, so one undo reverts the
//! whole call.

use super::command::{CallFrame, Command};
use super::control::{Step, Task};
use super::environment::{Environment, Frame};
use super::{EvalError, Evaluator};
use crate::ast::{FunctionDef, Value};
use std::rc::Rc;

impl Evaluator {
    pub(crate) fn call_function(&mut self, def: Rc<FunctionDef>, args: Vec<Value>) -> Result<Value, EvalError> {
        if args.len() != def.params.len() {
            return Err(EvalError::Arity {
                op: def.name.clone(),
                expected: def.params.len().to_string(),
                got: args.len(),
                usage: format!("{}({})", def.name, def.params.join(", ")),
            });
        }
        if self.call_depth() >= self.config.max_call_depth {
            return Err(EvalError::Runtime(format!(
                "maximum call depth exceeded ({}) in {}",
                self.config.max_call_depth, def.name
            )));
        }

        let frame: Frame = def.params.iter().cloned().zip(args.iter().cloned()).collect();
        let ((outcome, executed), frame) = Environment::with_frame(self, frame, |eval| {
            eval.accumulators.push(Vec::new());
            tracing::debug!(function = %def.name, depth = eval.call_depth(), "call");
            let mut tasks = vec![Task::block(Rc::clone(&def.body))];
            let outcome = eval.run_tasks(&mut tasks);
            (outcome, eval.accumulators.pop().unwrap_or_default())
        })?;

        let value = match outcome {
            Ok(Step::Returned(value)) => value,
            Ok(Step::Finished) => Value::Nil,
            Ok(Step::Suspended(_)) => {
                self.rollback(executed);
                return Err(EvalError::Invariant(format!("{} suspended inside a call", def.name)));
            }
            Err(e) => {
                self.rollback(executed);
                return Err(e);
            }
        };

        if !executed.is_empty() {
            let call = CallFrame {
                function: def,
                frame,
                executed,
            };
            self.record(Command::call(call, &args, value.clone()));
        }
        Ok(value)
    }

    /// Undo what a failed call already did, newest first
    fn rollback(&mut self, mut executed: Vec<Command>) {
        for command in executed.iter_mut().rev() {
            if let Err(e) = command.undo(&mut self.ctx) {
                self.ctx
                    .warn(format!("could not roll back {}: {}", command.label(), e));
            }
        }
    }
}
