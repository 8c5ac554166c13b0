//! Interrupt handling
//!
//! Each evaluator owns an interrupt flag. Ctrl+C sets it; the evaluator polls
//! it between steps of its task stack and abandons the running program with
//! `EvalError::Interrupted`. Commands that already ran stay applied.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag between a signal handler and one evaluator
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request an interrupt, as Ctrl+C would
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Consume a pending interrupt
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }

    /// Drop an interrupt that arrived while nothing was running
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Route Ctrl+C to `flag`. Only the first call in a process takes effect.
pub fn install_interrupt_handler(flag: InterruptFlag) {
    if let Err(e) = ctrlc::set_handler(move || flag.raise()) {
        tracing::debug!(error = %e, "interrupt handler not installed");
    }
}
