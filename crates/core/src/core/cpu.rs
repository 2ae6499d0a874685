//! CPU front-end and per-cycle orchestration.
//!
//! Owns every structure of the out-of-order core and drives them through a
//! synchronous `tick`. Each cycle:
//! 1. **Unit ticks:** the ALU, predictor, and LSB roll their `next` output
//!    slots to `current` and advance any latched work.
//! 2. **Broadcast capture:** results visible at the unit ports are copied
//!    into waiting ROB entries and snooped by the reservation station.
//! 3. **Dispatch:** the reservation station is scanned in program order and
//!    ready entries are routed to a free functional unit; memory ops push
//!    placeholders into the LSB as soon as they are seen so the buffer
//!    always knows program order.
//! 4. **Commit:** the ROB head retires if ready — writing back, releasing
//!    stores, or flushing the speculative state and redirecting the PC on a
//!    misprediction.
//! 5. **Fetch + issue:** one instruction is fetched, decoded, and issued
//!    into ROB and RS, with a speculative PC redirect for branches and JAL.
//!
//! The commit-time misprediction signal suppresses the same cycle's fetch,
//! which is the one-cycle bubble the flush needs to settle.

use tracing::{debug, trace};

use crate::common::SimError;
use crate::config::Config;
use crate::core::arch::RegisterFile;
use crate::core::pipeline::lsb::{LoadStoreBuffer, MemOp, MemRequest};
use crate::core::pipeline::rob::{ReorderBuffer, RobEntry, RobTag};
use crate::core::pipeline::station::{ReservationStation, RsEntry};
use crate::core::units::alu::{Alu, AluRequest};
use crate::core::units::predictor::{ControlKind, ControlRequest, PredictorUnit};
use crate::isa::abi;
use crate::isa::decode::decode;
use crate::isa::disasm::disassemble;
use crate::isa::instruction::{Instruction, UpperOp};
use crate::mem::SparseMemory;
use crate::sim::dump::RegisterDumper;

/// Outcome of the commit stage for one cycle.
enum CommitOutcome {
    /// Nothing retired (empty ROB or head not ready).
    Idle,
    /// The head retired normally.
    Retired,
    /// The head retired and repaired the speculative path.
    Mispredict,
    /// The termination trap retired; carries the exit code.
    Exit(u8),
}

/// The out-of-order core.
pub struct Cpu {
    regs: RegisterFile,
    rob: ReorderBuffer,
    rs: ReservationStation,
    lsb: LoadStoreBuffer,
    alu: Alu,
    pred: PredictorUnit,
    /// Instruction image seen by fetch.
    image: SparseMemory,
    pc: u32,
    /// Fetched-but-not-issued instruction and the PC it came from.
    fetched: Option<(u32, Instruction)>,
    /// Optional per-commit register trace sink.
    dumper: Option<RegisterDumper>,
    /// Running commit count, used by the dump sink.
    commits: u64,
}

impl Cpu {
    /// Creates a core over a loaded memory image, with the PC at zero.
    ///
    /// Fetch reads the image directly; the LSB's data memory starts as a
    /// copy of it.
    pub fn new(image: SparseMemory, config: &Config) -> Self {
        let mut lsb = LoadStoreBuffer::new(config.lsb_capacity, config.mem_latency);
        lsb.set_memory(image.clone());

        Self {
            regs: RegisterFile::new(),
            rob: ReorderBuffer::new(config.rob_capacity),
            rs: ReservationStation::new(config.rs_capacity),
            lsb,
            alu: Alu::new(),
            pred: PredictorUnit::new(),
            image,
            pc: 0,
            fetched: None,
            dumper: None,
            commits: 0,
        }
    }

    /// Attaches a per-commit register dump sink.
    pub fn attach_dumper(&mut self, dumper: RegisterDumper) {
        self.dumper = Some(dumper);
    }

    /// Returns the current program counter.
    pub fn pc(&self) -> u32 {
        self.pc
    }

    /// Reads an architectural register.
    pub fn register(&self, idx: usize) -> i32 {
        self.regs.read(idx)
    }

    /// Returns a snapshot of all 32 architectural registers.
    pub fn registers(&self) -> [i32; 32] {
        self.regs.snapshot()
    }

    /// Returns the data memory, for inspection.
    pub fn data_memory(&self) -> &SparseMemory {
        self.lsb.memory()
    }

    /// Advances the core by one clock cycle.
    ///
    /// Returns `Ok(Some(code))` when the termination trap retires, carrying
    /// the process-style exit code.
    pub fn tick(&mut self) -> Result<Option<u8>, SimError> {
        self.alu.tick();
        self.pred.tick();
        self.lsb.tick();

        self.capture_broadcasts();
        self.dispatch();

        match self.commit() {
            CommitOutcome::Exit(code) => return Ok(Some(code)),
            CommitOutcome::Mispredict => {
                // One-cycle fetch bubble while the flush settles; anything
                // fetched down the dead path is dropped.
                self.fetched = None;
            }
            CommitOutcome::Idle | CommitOutcome::Retired => {
                self.fetch_and_issue()?;
            }
        }

        Ok(None)
    }

    /// Copies results visible at the unit broadcast ports into the ROB and
    /// the reservation station.
    fn capture_broadcasts(&mut self) {
        if let Some(b) = self.alu.broadcast() {
            trace!(tag = b.dest_tag.0, value = b.value, "alu broadcast");
            self.rob.complete(b.dest_tag, b.value);
            self.rs.snoop(b.value, b.dest_tag);
        }

        // Store completions are informational: the store already retired.
        if let Some(b) = self.lsb.broadcast() {
            if b.is_load {
                if let Some(tag) = b.dest_tag {
                    trace!(tag = tag.0, value = b.data, "load broadcast");
                    self.rob.complete(tag, b.data);
                    self.rs.snoop(b.data, tag);
                }
            }
        }

        if let Some(b) = self.pred.broadcast() {
            let link = b.pc.wrapping_add(4) as i32;
            trace!(
                tag = b.rob_id.0,
                target = b.target,
                mispredicted = b.mispredicted,
                "control broadcast"
            );
            self.rob
                .complete_control(b.rob_id, b.dest_tag.map(|_| link), b.recovery_pc, b.mispredicted);
            if let Some(tag) = b.dest_tag {
                self.rs.snoop(link, tag);
            }
        }
    }

    /// Scans the reservation station in program order and routes ready
    /// entries to free functional units.
    fn dispatch(&mut self) {
        // Once one memory op fails to enter the LSB, every younger memory op
        // must also hold back this cycle, or FIFO order would be lost.
        let mut mem_blocked = false;
        let mut i = 0;

        while i < self.rs.len() {
            let entry = *self.rs.get(i);

            if !entry.operands_ready() {
                // Memory ops announce their program position to the LSB even
                // before the base value has arrived.
                if entry.instr.is_memory() && !mem_blocked {
                    if !self.lsb.insert_or_update(Self::mem_request(&entry, false)) {
                        mem_blocked = true;
                    }
                }
                i += 1;
                continue;
            }

            let dispatched = match entry.instr {
                Instruction::Register { op, .. } => self.try_alu(AluRequest {
                    a: entry.vj,
                    b: entry.vk,
                    op: op.into(),
                    dest_tag: entry.dest_tag,
                }),
                Instruction::Immediate { op, .. } => self.try_alu(AluRequest {
                    a: entry.vj,
                    b: entry.vk,
                    op: op.into(),
                    dest_tag: entry.dest_tag,
                }),
                Instruction::Upper { op, .. } => self.try_alu(AluRequest {
                    // AUIPC is relative to the instruction's own PC.
                    a: match op {
                        UpperOp::Auipc => entry.pc as i32,
                        UpperOp::Lui => 0,
                    },
                    b: entry.vk,
                    op: op.into(),
                    dest_tag: entry.dest_tag,
                }),
                Instruction::Load { .. } => {
                    if mem_blocked {
                        false
                    } else {
                        let ok = self.lsb.insert_or_update(Self::mem_request(&entry, true));
                        mem_blocked |= !ok;
                        ok
                    }
                }
                Instruction::Store { .. } => {
                    if mem_blocked {
                        false
                    } else {
                        let ok = self.lsb.insert_or_update(Self::mem_request(&entry, true));
                        if ok {
                            // A store has no broadcast to wait for; once the
                            // LSB holds it fully resolved it may retire.
                            self.rob.mark_ready(entry.dest_tag);
                        } else {
                            mem_blocked = true;
                        }
                        ok
                    }
                }
                Instruction::Branch { op, .. } => self.try_pred(ControlRequest {
                    pc: entry.pc,
                    rs1: entry.vj,
                    rs2: entry.vk,
                    imm: entry.imm,
                    kind: ControlKind::Branch(op),
                    dest_tag: None,
                    rob_id: entry.dest_tag,
                }),
                Instruction::Jal { .. } => self.try_pred(ControlRequest {
                    pc: entry.pc,
                    rs1: 0,
                    rs2: 0,
                    imm: entry.imm,
                    kind: ControlKind::Jal,
                    dest_tag: Some(entry.dest_tag),
                    rob_id: entry.dest_tag,
                }),
                Instruction::Jalr { .. } => self.try_pred(ControlRequest {
                    pc: entry.pc,
                    rs1: entry.vj,
                    rs2: 0,
                    imm: entry.imm,
                    kind: ControlKind::Jalr,
                    dest_tag: Some(entry.dest_tag),
                    rob_id: entry.dest_tag,
                }),
            };

            if dispatched {
                trace!(tag = entry.dest_tag.0, "dispatched {}", disassemble(&entry.instr));
                self.rs.remove(i);
            } else {
                i += 1;
            }
        }
    }

    /// Latches an ALU request if the unit is free.
    fn try_alu(&mut self, request: AluRequest) -> bool {
        if self.alu.is_available() {
            self.alu.set_op(request);
            true
        } else {
            false
        }
    }

    /// Latches a predictor request if the unit is free.
    fn try_pred(&mut self, request: ControlRequest) -> bool {
        if self.pred.is_available() {
            self.pred.set_op(request);
            true
        } else {
            false
        }
    }

    /// Builds the LSB request for a memory-type RS entry.
    fn mem_request(entry: &RsEntry, resolved: bool) -> MemRequest {
        let op = match entry.instr {
            Instruction::Load { op, .. } => MemOp::Load(op),
            Instruction::Store { op, .. } => MemOp::Store(op),
            _ => unreachable!("only memory instructions reach the LSB"),
        };
        MemRequest {
            op,
            base: entry.vj,
            data: entry.vk,
            imm: entry.imm,
            dest_tag: entry.dest_tag,
            rob_id: entry.dest_tag,
            addr_resolved: resolved,
        }
    }

    /// Inspects the ROB head and retires it if ready.
    fn commit(&mut self) -> CommitOutcome {
        let (ready, is_trap) = match self.rob.head() {
            Some(head) => (head.ready, head.instr.is_termination_trap()),
            None => return CommitOutcome::Idle,
        };
        if !ready {
            return CommitOutcome::Idle;
        }

        if is_trap {
            // The exit code is a0 *before* the trap's own writeback, which
            // is therefore suppressed.
            let code = (self.regs.read(abi::REG_A0) & 0xFF) as u8;
            debug!(code, "termination trap committed");
            return CommitOutcome::Exit(code);
        }

        let entry = match self.rob.pop_head() {
            Some(entry) => entry,
            None => return CommitOutcome::Idle,
        };

        if entry.mispredicted {
            debug!(
                pc = entry.pc,
                recovery = entry.recovery_pc,
                "misprediction at commit, flushing speculative state"
            );
            self.flush_speculation();
            // The repairing instruction itself still retires: a JALR link
            // write must land even though its path was wrong.
            self.write_back(&entry);
            self.pc = entry.recovery_pc;
            self.record_commit(&entry);
            return CommitOutcome::Mispredict;
        }

        self.write_back(&entry);
        self.lsb.commit_up_to(entry.tag);
        self.record_commit(&entry);
        trace!(tag = entry.tag.0, "retired {}", disassemble(&entry.instr));
        CommitOutcome::Retired
    }

    /// Writes a retired entry's value to its destination register.
    ///
    /// The pending slot is cleared only if this entry still owns it; a
    /// younger issue may already have claimed the register.
    fn write_back(&mut self, entry: &RobEntry) {
        if let Some(rd) = entry.dest_reg {
            self.regs.write(rd, entry.value);
            if self.regs.pending_of(rd) == Some(entry.tag) {
                self.regs.clear_pending(rd);
            }
        }
    }

    /// Appends a line to the register dump sink, if one is attached.
    fn record_commit(&mut self, entry: &RobEntry) {
        self.commits += 1;
        if let Some(dumper) = &mut self.dumper {
            dumper.record(self.commits, entry.pc, &self.regs.snapshot()).ok();
        }
    }

    /// Discards all speculative state after a misprediction.
    ///
    /// Committed stores keep draining; the predictor's counter keeps its
    /// training; everything else younger than the repairing entry dies.
    fn flush_speculation(&mut self) {
        let regs = &mut self.regs;
        self.rob.for_each(|entry| {
            if let Some(rd) = entry.dest_reg {
                if regs.pending_of(rd) == Some(entry.tag) {
                    regs.clear_pending(rd);
                }
            }
        });
        self.rob.clear();
        self.rs.clear();
        self.lsb.flush();
        self.pred.flush();
    }

    /// Fetches at the PC and issues into ROB + RS.
    fn fetch_and_issue(&mut self) -> Result<(), SimError> {
        if self.fetched.is_none() {
            if self.rob.is_full() || self.rs.is_full() {
                trace!(pc = self.pc, "issue stalled, structures full");
                return Ok(());
            }

            let word = match self.image.fetch_word(self.pc) {
                Some(word) => word,
                None => {
                    if self.rob.is_empty() {
                        return Err(SimError::FetchOutOfBounds(self.pc));
                    }
                    // Speculative overrun; an in-flight recovery will move
                    // the PC. Retry next cycle.
                    trace!(pc = self.pc, "fetch past image, waiting for redirect");
                    return Ok(());
                }
            };

            let instr = match decode(word) {
                Some(instr) => instr,
                None => {
                    if self.rob.is_empty() {
                        return Err(SimError::IllegalInstruction { pc: self.pc, word });
                    }
                    trace!(pc = self.pc, word, "undecodable word on speculative path");
                    return Ok(());
                }
            };

            self.fetched = Some((self.pc, instr));
            self.pc = self.pc.wrapping_add(4);
        }

        if let Some((_, instr)) = self.fetched {
            // Memory ops need LSB space before they may issue.
            if instr.is_memory() && self.lsb.is_full() {
                return Ok(());
            }
        }
        if self.rob.is_full() || self.rs.is_full() {
            return Ok(());
        }

        if let Some((fetched_pc, instr)) = self.fetched.take() {
            self.issue(fetched_pc, instr);
        }
        Ok(())
    }

    /// Creates the ROB and RS entries for one instruction and performs the
    /// speculative PC redirect for branches and JAL.
    fn issue(&mut self, fetched_pc: u32, instr: Instruction) {
        let dest_reg = instr.dest_reg();

        let Some(tag) = self.rob.allocate(instr, dest_reg, fetched_pc) else {
            // Should not happen: capacity was checked before fetch. Roll the
            // PC back so nothing is lost.
            self.pc = fetched_pc;
            return;
        };

        let (vj, qj) = match instr.src1() {
            Some(r) => self.resolve_operand(r),
            None => (0, None),
        };
        let (vk, qk) = match instr.src2() {
            Some(r) => self.resolve_operand(r),
            // Second operand is the immediate for I/U/J shapes.
            None => (instr.imm().unwrap_or(0), None),
        };

        self.rs.add(RsEntry {
            instr,
            vj,
            vk,
            qj,
            qk,
            imm: instr.imm().unwrap_or(0),
            dest_tag: tag,
            pc: fetched_pc,
        });

        if let Some(rd) = dest_reg {
            self.regs.set_pending(rd, tag);
        }

        debug!(tag = tag.0, pc = fetched_pc, "issued {}", disassemble(&instr));

        // Speculative redirect: branch and JAL targets are known at issue.
        // JALR is left alone; its resolution repairs the path at commit.
        match instr {
            Instruction::Branch { imm, .. } | Instruction::Jal { imm, .. } => {
                self.pc = fetched_pc.wrapping_add(imm as u32);
            }
            _ => {}
        }
    }

    /// Resolves a source register against the register file and the ROB.
    ///
    /// Returns the live value, or the tag of the in-flight producer to wait
    /// on.
    fn resolve_operand(&self, reg: usize) -> (i32, Option<RobTag>) {
        match self.regs.pending_of(reg) {
            None => (self.regs.read(reg), None),
            Some(tag) => match self.rob.value_of(tag) {
                Some(value) => (value, None),
                None => (0, Some(tag)),
            },
        }
    }
}
