//! Suspension and the continuation queue
//!
//! `wait(ms)` is the only point where a program gives control back to the
//! host. The parked program stays at the front of the queue with its task
//! stack intact; programs submitted meanwhile line up behind it. The host
//! calls `resume` once the delay has passed.

use super::control::{Step, Task};
use super::{EvalError, EvalResult, Evaluator};
use crate::ast::{Block, Program};
use std::time::Duration;

/// A program that has not finished yet
#[derive(Debug)]
pub(crate) struct Continuation {
    tasks: Vec<Task>,
    suspended: bool,
}

impl Continuation {
    pub(crate) fn new(block: Block) -> Self {
        Continuation {
            tasks: vec![Task::block(block)],
            suspended: false,
        }
    }
}

/// Where evaluation stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalStatus {
    /// Nothing is left to run
    Completed,
    /// Parked on `wait`; call `resume` after `delay`
    Suspended { delay: Duration },
    /// Queued behind a parked program
    Queued,
}

impl Evaluator {
    /// Whether the front program is parked on a `wait`
    pub fn is_suspended(&self) -> bool {
        self.queue.front().is_some_and(|c| c.suspended)
    }

    /// Number of programs parked or waiting to start
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Run queued programs in order until one suspends or all finish
    pub(crate) fn drive(&mut self) -> Result<EvalResult, EvalError> {
        while let Some(mut continuation) = self.queue.pop_front() {
            continuation.suspended = false;
            let step = match self.run_tasks(&mut continuation.tasks) {
                Ok(step) => step,
                Err(e) => {
                    self.pending_wait = None;
                    return Err(e);
                }
            };
            match step {
                Step::Suspended(delay) => {
                    continuation.suspended = true;
                    self.queue.push_front(continuation);
                    return Ok(self.take_result(EvalStatus::Suspended { delay }));
                }
                Step::Finished => {}
                Step::Returned(_) => {
                    return Err(EvalError::Invariant("return escaped to top level".into()));
                }
            }
        }
        Ok(self.take_result(EvalStatus::Completed))
    }

    /// Continue after a `wait` has elapsed
    pub fn resume(&mut self) -> Result<EvalResult, EvalError> {
        tracing::debug!(pending = self.queue.len(), "resume");
        self.drive()
    }

    /// Evaluate, sleeping through every `wait`, and merge the results
    pub fn run_to_completion(&mut self, program: &Program) -> Result<EvalResult, EvalError> {
        let mut result = self.eval(program)?;
        let mut output: Vec<String> = Vec::new();
        let mut warnings = Vec::new();
        loop {
            if !result.output.is_empty() {
                output.push(std::mem::take(&mut result.output));
            }
            warnings.append(&mut result.warnings);
            let delay = match result.status {
                EvalStatus::Suspended { delay } => delay,
                EvalStatus::Completed => break,
                // Something else is parked ahead of us; wait for it too
                EvalStatus::Queued => Duration::ZERO,
            };
            std::thread::sleep(delay);
            result = self.resume()?;
        }
        Ok(EvalResult {
            value: result.value,
            output: output.join("\n"),
            warnings,
            status: EvalStatus::Completed,
        })
    }

    /// Hand over output and warnings produced before an error
    pub fn take_partial(&mut self) -> EvalResult {
        self.take_result(EvalStatus::Completed)
    }
}
