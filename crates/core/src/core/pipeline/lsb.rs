//! Load/Store Buffer (LSB).
//!
//! All memory traffic funnels through this buffer, which serializes it in
//! program order. It provides:
//! 1. **Placeholders:** dispatch inserts an entry for every memory op as
//!    soon as it is seen, even before the base register value has arrived,
//!    so the buffer always knows each op's position in program order.
//! 2. **Head-only execution:** only the oldest entry (smallest ROB tag) may
//!    start; an unresolved or not-yet-committed head stalls everything
//!    behind it, so a load can never overtake an older store.
//! 3. **Store gating:** stores touch memory only after the ROB has retired
//!    them; commit notifies the buffer through [`commit_up_to`].
//! 4. **Fixed latency:** every access occupies the memory port for a
//!    configurable number of cycles before its result is broadcast.
//! 5. **Recovery:** a flush removes all non-committed entries; committed
//!    stores finish draining because memory order has already promised them.
//!
//! [`commit_up_to`]: LoadStoreBuffer::commit_up_to

use crate::core::pipeline::rob::RobTag;
use crate::isa::instruction::{LoadOp, StoreOp};
use crate::mem::SparseMemory;

/// The kind of memory operation an LSB entry performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemOp {
    /// A load of the given width/signedness.
    Load(LoadOp),
    /// A store of the given width.
    Store(StoreOp),
}

impl MemOp {
    /// Returns true for loads.
    #[inline]
    pub fn is_load(&self) -> bool {
        matches!(self, MemOp::Load(_))
    }
}

/// A memory request inserted (or refreshed) by dispatch.
#[derive(Clone, Copy, Debug)]
pub struct MemRequest {
    /// Load or store, with width.
    pub op: MemOp,
    /// Base register value (meaningful once `addr_resolved`).
    pub base: i32,
    /// Store data value (meaningful for stores once `addr_resolved`).
    pub data: i32,
    /// Immediate address offset.
    pub imm: i32,
    /// Broadcast tag for the result (the owning ROB tag).
    pub dest_tag: RobTag,
    /// Owning ROB tag; position in program order.
    pub rob_id: RobTag,
    /// Whether the operands above are final.
    pub addr_resolved: bool,
}

/// A single entry in the load/store buffer.
#[derive(Clone, Copy, Debug)]
struct LsbEntry {
    request: MemRequest,
    /// Set when the owning ROB entry has retired (stores become eligible).
    committed: bool,
    /// Set while the entry occupies the memory port.
    executing: bool,
    /// Cycles left on the memory port.
    cycles_left: u32,
}

/// A completed memory access published on the common data bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemBroadcast {
    /// Loaded value; zero for stores.
    pub data: i32,
    /// Broadcast tag; `None` for stores (nothing waits on them).
    pub dest_tag: Option<RobTag>,
    /// Owning ROB tag.
    pub rob_id: RobTag,
    /// Whether the access was a load.
    pub is_load: bool,
}

/// Load/store buffer with a single fixed-latency memory port.
pub struct LoadStoreBuffer {
    entries: Vec<LsbEntry>,
    capacity: usize,
    latency: u32,
    mem: SparseMemory,
    /// Result visible to readers this cycle.
    current: Option<MemBroadcast>,
    /// Result computed this cycle, exposed on the next tick.
    next: Option<MemBroadcast>,
}

impl LoadStoreBuffer {
    /// Creates a buffer with the given capacity and access latency.
    pub fn new(capacity: usize, latency: u32) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            latency,
            mem: SparseMemory::new(),
            current: None,
            next: None,
        }
    }

    /// Returns the number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the buffer holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if the buffer is at capacity.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.entries.len() == self.capacity
    }

    /// Replaces the data memory (used when loading the program image).
    pub fn set_memory(&mut self, mem: SparseMemory) {
        self.mem = mem;
    }

    /// Returns the data memory, for inspection.
    pub fn memory(&self) -> &SparseMemory {
        &self.mem
    }

    /// Inserts a request, or updates the entry already held for its ROB tag.
    ///
    /// Dispatch calls this every cycle for memory ops still in the RS, so an
    /// entry inserted as a placeholder is refreshed in place until its
    /// operands resolve. Returns false if a new entry was needed but the
    /// buffer is full; the caller must then also hold back every younger
    /// memory op this cycle, or program order would be lost.
    pub fn insert_or_update(&mut self, request: MemRequest) -> bool {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.request.rob_id == request.rob_id)
        {
            entry.request = request;
            return true;
        }

        if self.is_full() {
            return false;
        }

        self.entries.push(LsbEntry {
            request,
            committed: false,
            executing: false,
            cycles_left: 0,
        });
        true
    }

    /// Marks every entry owned by a ROB tag at or before `tag` as committed.
    ///
    /// Called when the ROB retires its head; this is what releases stores to
    /// memory.
    pub fn commit_up_to(&mut self, tag: RobTag) {
        for entry in &mut self.entries {
            if entry.request.rob_id <= tag {
                entry.committed = true;
            }
        }
    }

    /// Advances the memory port by one cycle.
    ///
    /// Rolls the broadcast double-buffer, then works exclusively on the
    /// oldest entry: start it if it is allowed to run, count down its
    /// latency, and on expiry perform the access and queue the broadcast.
    pub fn tick(&mut self) {
        self.current = self.next.take();

        let oldest = match self
            .entries
            .iter()
            .enumerate()
            .min_by_key(|(_, e)| e.request.rob_id)
        {
            Some((idx, _)) => idx,
            None => return,
        };

        let entry = &mut self.entries[oldest];

        // An unresolved head blocks the whole buffer.
        if !entry.request.addr_resolved && !entry.executing {
            return;
        }

        if !entry.executing {
            let can_start = entry.request.addr_resolved
                && (entry.request.op.is_load() || entry.committed);
            if can_start {
                entry.executing = true;
                entry.cycles_left = self.latency;
            }
        }

        if entry.executing {
            entry.cycles_left -= 1;
            if entry.cycles_left == 0 {
                let request = entry.request;
                let addr = (request.base as u32).wrapping_add(request.imm as u32);

                let broadcast = match request.op {
                    MemOp::Load(op) => MemBroadcast {
                        data: self.mem.load(addr, op),
                        dest_tag: Some(request.dest_tag),
                        rob_id: request.rob_id,
                        is_load: true,
                    },
                    MemOp::Store(op) => {
                        self.mem.store(addr, request.data, op);
                        MemBroadcast {
                            data: 0,
                            dest_tag: None,
                            rob_id: request.rob_id,
                            is_load: false,
                        }
                    }
                };

                self.next = Some(broadcast);
                self.entries.remove(oldest);
            }
        }
    }

    /// Returns the broadcast visible this cycle, if any.
    pub fn broadcast(&self) -> Option<MemBroadcast> {
        self.current
    }

    /// Discards all non-committed entries.
    ///
    /// Committed stores are past the point of no return and stay to finish
    /// draining. An executing but uncommitted access is cancelled outright:
    /// it cannot have been observed yet.
    pub fn flush(&mut self) {
        self.entries.retain(|e| e.committed);
        if self.entries.is_empty() {
            self.current = None;
            self.next = None;
        }
    }
}
