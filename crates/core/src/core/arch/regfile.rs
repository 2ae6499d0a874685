//! Architectural register file with busy tags.
//!
//! This module implements the 32-entry integer register file together with
//! the per-register renaming state used by the out-of-order engine. It
//! performs the following:
//! 1. **Storage:** 32 signed 32-bit registers (`x0`-`x31`).
//! 2. **Invariant enforcement:** register `x0` is hardwired to zero; writes
//!    and pending-tag updates to it are silently dropped.
//! 3. **Renaming:** each register optionally carries the reorder-buffer tag
//!    of the in-flight instruction that will produce its next value.

use crate::core::pipeline::rob::RobTag;

/// Number of architectural integer registers.
pub const REG_COUNT: usize = 32;

/// Integer register file with per-register pending reorder-buffer tags.
pub struct RegisterFile {
    values: [i32; REG_COUNT],
    pending: [Option<RobTag>; REG_COUNT],
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterFile {
    /// Creates a register file with all values zero and no pending tags.
    pub fn new() -> Self {
        Self {
            values: [0; REG_COUNT],
            pending: [None; REG_COUNT],
        }
    }

    /// Reads a register value. Register `x0` always returns 0.
    #[inline]
    pub fn read(&self, idx: usize) -> i32 {
        if idx == 0 { 0 } else { self.values[idx] }
    }

    /// Writes a register value. Writes to `x0` are dropped.
    #[inline]
    pub fn write(&mut self, idx: usize, value: i32) {
        if idx != 0 {
            self.values[idx] = value;
        }
    }

    /// Returns the tag of the in-flight producer of `idx`, if any.
    #[inline]
    pub fn pending_of(&self, idx: usize) -> Option<RobTag> {
        self.pending[idx]
    }

    /// Marks `idx` as produced by the in-flight entry `tag`.
    /// Updates to `x0` are dropped.
    pub fn set_pending(&mut self, idx: usize, tag: RobTag) {
        if idx != 0 {
            self.pending[idx] = Some(tag);
        }
    }

    /// Clears the pending tag of `idx`. Clearing `x0` is a no-op.
    pub fn clear_pending(&mut self, idx: usize) {
        if idx != 0 {
            self.pending[idx] = None;
        }
    }

    /// Zeroes every register and clears every pending tag.
    ///
    /// This resets architectural state, not just speculation; misprediction
    /// recovery must not call it.
    pub fn reset(&mut self) {
        self.values = [0; REG_COUNT];
        self.pending = [None; REG_COUNT];
    }

    /// Returns a copy of all 32 register values, for dumps and tests.
    pub fn snapshot(&self) -> [i32; REG_COUNT] {
        let mut regs = self.values;
        regs[0] = 0;
        regs
    }
}
