//! Linear undo/redo history
//!
//! Entries before the cursor are applied (history); entries from the cursor
//! on are redo candidates (future) and have never been applied to the
//! current state. Pushing after an undo drops the future: there is no
//! branching.

use super::command::Command;
use super::{Context, EvalError};
use crate::model::Canvas;

/// One recorded command and the time it was pushed
#[derive(Debug)]
pub struct Entry {
    pub command: Command,
    pub timestamp: f64,
}

#[derive(Debug, Default)]
pub struct Recorder {
    entries: Vec<Entry>,
    cursor: usize,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an executed command; clears the future
    pub fn push(&mut self, command: Command, timestamp: f64) {
        let dropped = self.entries.len() - self.cursor;
        if dropped > 0 {
            tracing::debug!(dropped, "discarding redo entries");
        }
        self.entries.truncate(self.cursor);
        self.entries.push(Entry { command, timestamp });
        self.cursor = self.entries.len();
    }

    /// Undo the newest applied entry. Returns false when history is empty.
    pub fn undo(&mut self, ctx: &mut Context) -> Result<bool, EvalError> {
        if self.cursor == 0 {
            tracing::debug!("nothing to undo");
            return Ok(false);
        }
        self.entries[self.cursor - 1].command.undo(ctx)?;
        self.cursor -= 1;
        Ok(true)
    }

    /// Re-apply the oldest future entry. Returns false when future is empty.
    pub fn redo(&mut self, ctx: &mut Context) -> Result<bool, EvalError> {
        if self.cursor == self.entries.len() {
            tracing::debug!("nothing to redo");
            return Ok(false);
        }
        self.entries[self.cursor].command.execute(ctx)?;
        self.cursor += 1;
        Ok(true)
    }

    /// Drop every entry stamped after `time` and seek the canvas to the
    /// post-state of the newest remaining entry.
    ///
    /// This is a seek, not a series of undos: applied entries past `time` are
    /// reverted straight to their captured pre-state, and remaining entries
    /// that were undone are brought forward to their post-state. Afterwards
    /// every remaining entry is applied and the future is empty. Returns the
    /// number of entries dropped.
    pub fn truncate(&mut self, time: f64, canvas: &mut Canvas) -> usize {
        let keep = self.entries.partition_point(|e| e.timestamp <= time);

        if keep < self.cursor {
            for entry in self.entries[keep..self.cursor].iter_mut().rev() {
                entry.command.seek_before(canvas);
            }
        } else {
            for entry in self.entries[self.cursor..keep].iter_mut() {
                entry.command.seek_after(canvas);
            }
        }

        let dropped = self.entries.len() - keep;
        self.entries.truncate(keep);
        self.cursor = keep;
        tracing::debug!(time, dropped, "history truncated");
        dropped
    }

    /// Applied entries, oldest first
    pub fn history(&self) -> &[Entry] {
        &self.entries[..self.cursor]
    }

    /// Redo candidates, next-to-redo first
    pub fn future(&self) -> &[Entry] {
        &self.entries[self.cursor..]
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }
}
