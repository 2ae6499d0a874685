//! Reservation Station (RS).
//!
//! Holding area for issued instructions whose operands have not all been
//! produced yet. It provides:
//! 1. **Entry storage:** up to `capacity` entries kept in program order
//!    (issue order), which is also the order dispatch scans them in.
//! 2. **Operand capture:** `snoop` watches the common data bus and fills any
//!    operand waiting on the broadcast tag.
//! 3. **Dispatch support:** positional access and removal so the front-end
//!    can hand ready entries to functional units.

use crate::core::pipeline::rob::RobTag;
use crate::isa::instruction::Instruction;

/// A single reservation station entry.
///
/// `qj`/`qk` name the in-flight producers of the two source operands; `None`
/// means the corresponding value in `vj`/`vk` is live. Entries whose second
/// operand is an immediate are issued with `vk` set and `qk` empty.
#[derive(Clone, Copy, Debug)]
pub struct RsEntry {
    /// The issued instruction.
    pub instr: Instruction,
    /// First operand value (valid when `qj` is `None`).
    pub vj: i32,
    /// Second operand value (valid when `qk` is `None`).
    pub vk: i32,
    /// Tag of the in-flight producer of `vj`.
    pub qj: Option<RobTag>,
    /// Tag of the in-flight producer of `vk`.
    pub qk: Option<RobTag>,
    /// Immediate operand (address offset for memory ops).
    pub imm: i32,
    /// ROB tag this entry's result will be broadcast under.
    pub dest_tag: RobTag,
    /// PC the instruction was fetched from.
    pub pc: u32,
}

impl RsEntry {
    /// Returns true once both operands are live.
    #[inline]
    pub fn operands_ready(&self) -> bool {
        self.qj.is_none() && self.qk.is_none()
    }
}

/// Reservation station — bounded, program-ordered entry list.
pub struct ReservationStation {
    entries: Vec<RsEntry>,
    capacity: usize,
}

impl ReservationStation {
    /// Creates a reservation station with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns the number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the station holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if the station is at capacity.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.entries.len() == self.capacity
    }

    /// Appends an entry. Issue must check [`is_full`](Self::is_full) first.
    pub fn add(&mut self, entry: RsEntry) {
        debug_assert!(!self.is_full());
        self.entries.push(entry);
    }

    /// Captures a broadcast value: any operand waiting on `tag` becomes live.
    pub fn snoop(&mut self, value: i32, tag: RobTag) {
        for entry in &mut self.entries {
            if entry.qj == Some(tag) {
                entry.vj = value;
                entry.qj = None;
            }
            if entry.qk == Some(tag) {
                entry.vk = value;
                entry.qk = None;
            }
        }
    }

    /// Returns the entry at position `idx` (program order).
    pub fn get(&self, idx: usize) -> &RsEntry {
        &self.entries[idx]
    }

    /// Returns the entry at position `idx`, mutably.
    pub fn get_mut(&mut self, idx: usize) -> &mut RsEntry {
        &mut self.entries[idx]
    }

    /// Removes and returns the entry at position `idx`, preserving the order
    /// of the remaining entries.
    pub fn remove(&mut self, idx: usize) -> RsEntry {
        self.entries.remove(idx)
    }

    /// Empties the station.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
