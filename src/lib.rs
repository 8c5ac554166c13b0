//! dsviz - a reversible data-structure console
//!
//! # Overview
//!
//! dsviz runs short imperative scripts against a canvas of data structures
//! (arrays, linked lists, trees, heaps, boxes and arrows). Every mutating
//! call becomes a Command that captures enough state to undo and redo
//! itself exactly, and every top-level command lands in a linear history
//! that can be cut back in step with an external timeline.
//!
//! # Core Concepts
//!
//! ## Calls and methods
//!
//! ```text
//! a = array(3, 1, 2)      # constructor, recorded
//! a.push(4)               # method form
//! push(a, 5)              # receiver-first form, same command
//! print(a.len())          # queries and utilities are not recorded
//! ```
//!
//! ## Control flow
//!
//! ```text
//! for (i = 0; i < 3; i = i + 1) { l.append(i) }
//! while (h.len() > 0) { print(h.pop()) }
//! ```
//!
//! Loops stop after 1,000,000 iterations with a warning instead of hanging.
//!
//! ## Functions
//!
//! ```text
//! define fill(arr, n) { for (i = 0; i < n; i = i + 1) { arr.push(i) } }
//! fill(a, 10)             # one history entry, one undo
//! ```
//!
//! ## Suspension
//!
//! `wait(ms)` parks the running program; the host resumes it later.
//! Programs submitted meanwhile queue behind it.
//!
//! # Example
//!
//! ```rust
//! use dsviz::{lex, parse, Evaluator};
//!
//! let tokens = lex("a = array()\na.push(1)").unwrap();
//! let program = parse(tokens).unwrap();
//! let mut eval = Evaluator::new();
//! eval.eval(&program).unwrap();
//! eval.undo().unwrap();
//! // the push is reverted, the array still exists
//! ```

pub mod ast;
pub mod clock;
pub mod display;
pub mod eval;
pub mod lexer;
pub mod model;
pub mod parser;
pub mod signals;

// Re-export commonly used items
pub use ast::{Expr, Program, Stmt, Value};
pub use clock::{Clock, ManualClock, SystemClock};
pub use eval::{Config, EvalError, EvalResult, EvalStatus, Evaluator};
pub use lexer::{lex, LexError, Operator, Token};
pub use model::{Canvas, Entity, EntityId, EntityKind};
pub use parser::{parse, ParseError};
pub use signals::InterruptFlag;

/// Convenience function to evaluate a dsviz program on a fresh evaluator,
/// sleeping through any `wait`
pub fn eval(input: &str) -> Result<EvalResult, String> {
    let tokens = lex(input).map_err(|e| e.to_string())?;
    let program = parse(tokens).map_err(|e| e.to_string())?;
    let mut evaluator = Evaluator::new();
    evaluator.run_to_completion(&program).map_err(|e| e.to_string())
}
