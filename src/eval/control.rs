//! Statement execution on an explicit task stack
//!
//! A running statement sequence is a `Vec<Task>`: the top task decides what
//! runs next. Loops push their body as a fresh `Block` task each iteration,
//! so every iteration builds new Commands from the shared statement
//! template. Because the whole continuation lives in the vector, a program
//! can be parked on `wait` and picked up later without unwinding anything.

use super::{EvalError, Evaluator};
use crate::ast::{Block, Expr, Stmt, Value};
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug)]
pub(crate) enum Task {
    /// Run `stmts[next..]`
    Block { stmts: Block, next: usize },
    While {
        cond: Expr,
        body: Block,
        steps: usize,
    },
    For {
        cond: Option<Expr>,
        step: Block,
        body: Block,
        steps: usize,
        phase: ForPhase,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ForPhase {
    /// Test the condition, then run the body
    Check,
    /// The body just finished; run the increment
    Step,
}

impl Task {
    pub(crate) fn block(stmts: Block) -> Self {
        Task::Block { stmts, next: 0 }
    }
}

/// Outcome of a single statement
#[derive(Debug, PartialEq)]
pub(crate) enum Flow {
    Next,
    Return(Value),
}

/// Outcome of running a task stack
#[derive(Debug, PartialEq)]
pub(crate) enum Step {
    /// Every task finished
    Finished,
    /// A `return` unwound the whole stack
    Returned(Value),
    /// A `wait` parked the stack; what is left is the continuation
    Suspended(Duration),
}

impl Evaluator {
    /// Run tasks until the stack is empty, a `return` fires, or a `wait`
    /// suspends. On suspension the remaining tasks stay in `tasks`.
    pub(crate) fn run_tasks(&mut self, tasks: &mut Vec<Task>) -> Result<Step, EvalError> {
        loop {
            if let Some(delay) = self.pending_wait.take() {
                tracing::debug!(?delay, remaining = tasks.len(), "suspending");
                return Ok(Step::Suspended(delay));
            }
            if self.interrupt.take() {
                return Err(EvalError::Interrupted);
            }
            let Some(task) = tasks.last_mut() else {
                return Ok(Step::Finished);
            };

            match task {
                Task::Block { stmts, next } => {
                    if *next >= stmts.len() {
                        tasks.pop();
                        continue;
                    }
                    let stmts = Rc::clone(stmts);
                    let index = *next;
                    *next += 1;
                    if let Flow::Return(value) = self.exec_stmt(&stmts[index], tasks)? {
                        return Ok(Step::Returned(value));
                    }
                }
                Task::While { cond, body, steps } => {
                    if !self.eval_expr(cond)?.is_truthy() {
                        tasks.pop();
                        continue;
                    }
                    if *steps >= self.config.max_loop_steps {
                        let limit = *steps;
                        tasks.pop();
                        self.loop_ceiling(limit);
                        continue;
                    }
                    *steps += 1;
                    let body = Rc::clone(body);
                    tasks.push(Task::block(body));
                }
                Task::For {
                    cond,
                    step,
                    body,
                    steps,
                    phase,
                } => match *phase {
                    ForPhase::Step => {
                        *phase = ForPhase::Check;
                        let step = Rc::clone(step);
                        tasks.push(Task::block(step));
                    }
                    ForPhase::Check => {
                        let go = match cond {
                            Some(c) => self.eval_expr(c)?.is_truthy(),
                            None => true,
                        };
                        if !go {
                            tasks.pop();
                            continue;
                        }
                        if *steps >= self.config.max_loop_steps {
                            let limit = *steps;
                            tasks.pop();
                            self.loop_ceiling(limit);
                            continue;
                        }
                        *steps += 1;
                        *phase = ForPhase::Step;
                        let body = Rc::clone(body);
                        tasks.push(Task::block(body));
                    }
                },
            }
        }
    }

    fn loop_ceiling(&mut self, steps: usize) {
        self.ctx
            .warn(format!("loop took too long: stopped after {} iterations", steps));
    }

    fn exec_stmt(&mut self, stmt: &Stmt, tasks: &mut Vec<Task>) -> Result<Flow, EvalError> {
        match stmt {
            Stmt::Expr(expr) => {
                let value = self.eval_expr(expr)?;
                if self.call_depth() == 0 {
                    self.last_value = value;
                }
            }
            Stmt::Assign { name, value } => {
                let value = self.eval_expr(value)?;
                self.ctx.env.assign(name, value);
            }
            Stmt::While { cond, body } => tasks.push(Task::While {
                cond: cond.clone(),
                body: Rc::clone(body),
                steps: 0,
            }),
            Stmt::For {
                init,
                cond,
                step,
                body,
            } => {
                tasks.push(Task::For {
                    cond: cond.clone(),
                    step: Rc::clone(step),
                    body: Rc::clone(body),
                    steps: 0,
                    phase: ForPhase::Check,
                });
                // init runs first
                tasks.push(Task::block(Rc::clone(init)));
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let branch = if self.eval_expr(cond)?.is_truthy() {
                    Some(then_branch)
                } else {
                    else_branch.as_ref()
                };
                if let Some(block) = branch {
                    tasks.push(Task::block(Rc::clone(block)));
                }
            }
            Stmt::Define(def) => {
                tracing::debug!(name = %def.name, params = def.params.len(), "defining function");
                self.functions.insert(def.name.clone(), Rc::clone(def));
            }
            Stmt::Return(expr) => {
                if self.call_depth() == 0 {
                    return Err(EvalError::Usage("return outside of a function".into()));
                }
                let value = match expr {
                    Some(e) => self.eval_expr(e)?,
                    None => Value::Nil,
                };
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Next)
    }
}
