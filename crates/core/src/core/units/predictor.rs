//! Branch/Jump unit with a dynamic branch predictor.
//!
//! This unit resolves all control-flow instructions. It carries a single
//! global 2-bit saturating counter and the same latch/next/current
//! double-buffer as the ALU. Its broadcast reports, for each resolved
//! instruction, whether the speculative fetch path must be repaired and
//! where execution should resume:
//! 1. **Conditional branches:** evaluated against the operand values; the
//!    misprediction flag compares the counter's direction with the actual
//!    outcome, and the counter is trained with the actual outcome.
//! 2. **JAL:** always taken; the front-end already redirected at issue, so
//!    it never flags a misprediction. The link value is written back.
//! 3. **JALR:** the target depends on a register unknown at issue, so the
//!    front-end never redirects; the unit always flags a misprediction,
//!    forcing recovery to the computed target at commit.

use crate::core::pipeline::rob::RobTag;
use crate::isa::instruction::BranchOp;

/// 2-bit saturating predictor state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PredictorState {
    StrongTaken,
    WeakTaken,
    WeakNotTaken,
    StrongNotTaken,
}

impl PredictorState {
    /// Returns the predicted direction in this state.
    #[inline]
    pub fn predicts_taken(&self) -> bool {
        matches!(self, PredictorState::StrongTaken | PredictorState::WeakTaken)
    }

    /// Returns the successor state after observing an actual outcome.
    pub fn update(self, taken: bool) -> Self {
        use PredictorState::*;
        match (self, taken) {
            (StrongTaken, true) => StrongTaken,
            (StrongTaken, false) => WeakTaken,
            (WeakTaken, true) => StrongTaken,
            (WeakTaken, false) => WeakNotTaken,
            (WeakNotTaken, true) => WeakTaken,
            (WeakNotTaken, false) => StrongNotTaken,
            (StrongNotTaken, true) => WeakNotTaken,
            (StrongNotTaken, false) => StrongNotTaken,
        }
    }
}

/// The kind of control-flow instruction being resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlKind {
    /// Conditional branch.
    Branch(BranchOp),
    /// Jump and link (target known at issue).
    Jal,
    /// Jump and link register (target unknown at issue).
    Jalr,
}

/// A control-flow instruction latched into the unit by dispatch.
#[derive(Clone, Copy, Debug)]
pub struct ControlRequest {
    /// PC the instruction was fetched from.
    pub pc: u32,
    /// First source operand value.
    pub rs1: i32,
    /// Second source operand value (branches only).
    pub rs2: i32,
    /// Immediate offset.
    pub imm: i32,
    /// Instruction kind.
    pub kind: ControlKind,
    /// Broadcast tag for the link value (jumps only).
    pub dest_tag: Option<RobTag>,
    /// Owning ROB tag.
    pub rob_id: RobTag,
}

/// A resolved control-flow outcome exposed at the broadcast port.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlBroadcast {
    /// PC of the resolved instruction; `pc + 4` is the link value.
    pub pc: u32,
    /// Computed target address.
    pub target: u32,
    /// Actual direction of the instruction.
    pub taken: bool,
    /// Whether the speculative path must be repaired at commit.
    pub mispredicted: bool,
    /// PC to resume from when `mispredicted` is set.
    pub recovery_pc: u32,
    /// Broadcast tag for the link value (jumps only).
    pub dest_tag: Option<RobTag>,
    /// Owning ROB tag.
    pub rob_id: RobTag,
}

/// Single-slot branch/jump unit with a global 2-bit predictor.
pub struct PredictorUnit {
    state: PredictorState,
    latched: Option<ControlRequest>,
    next: Option<ControlBroadcast>,
    current: Option<ControlBroadcast>,
}

impl Default for PredictorUnit {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictorUnit {
    /// Creates an idle unit in the `WeakNotTaken` state.
    pub fn new() -> Self {
        Self {
            state: PredictorState::WeakNotTaken,
            latched: None,
            next: None,
            current: None,
        }
    }

    /// Returns the current counter state.
    pub fn state(&self) -> PredictorState {
        self.state
    }

    /// Returns true if an instruction can be latched this cycle.
    #[inline]
    pub fn is_available(&self) -> bool {
        self.latched.is_none()
    }

    /// Latches a control-flow instruction for resolution on the next tick.
    pub fn set_op(&mut self, request: ControlRequest) {
        debug_assert!(self.is_available());
        self.latched = Some(request);
    }

    /// Advances one cycle: `next` rolls to `current`, and any latched
    /// instruction is resolved into `next`.
    pub fn tick(&mut self) {
        self.current = self.next.take();

        if let Some(request) = self.latched.take() {
            self.next = Some(self.resolve(request));
        }
    }

    /// Returns the outcome visible at the broadcast port this cycle.
    pub fn broadcast(&self) -> Option<ControlBroadcast> {
        self.current
    }

    /// Discards the latched instruction and both broadcast slots.
    ///
    /// The counter is training state, not speculation, and survives.
    pub fn flush(&mut self) {
        self.latched = None;
        self.next = None;
        self.current = None;
    }

    /// Resolves a latched instruction, training the counter for branches.
    fn resolve(&mut self, request: ControlRequest) -> ControlBroadcast {
        let pc = request.pc;

        match request.kind {
            ControlKind::Branch(op) => {
                let taken = Self::evaluate(op, request.rs1, request.rs2);
                let target = pc.wrapping_add(request.imm as u32);
                let predicted = self.state.predicts_taken();
                let recovery_pc = if taken { target } else { pc.wrapping_add(4) };

                self.state = self.state.update(taken);

                ControlBroadcast {
                    pc,
                    target,
                    taken,
                    mispredicted: predicted != taken,
                    recovery_pc,
                    dest_tag: request.dest_tag,
                    rob_id: request.rob_id,
                }
            }
            ControlKind::Jal => {
                let target = pc.wrapping_add(request.imm as u32);
                ControlBroadcast {
                    pc,
                    target,
                    taken: true,
                    // The front-end already redirected at issue.
                    mispredicted: false,
                    recovery_pc: target,
                    dest_tag: request.dest_tag,
                    rob_id: request.rob_id,
                }
            }
            ControlKind::Jalr => {
                let target = (request.rs1 as u32).wrapping_add(request.imm as u32) & !1;
                ControlBroadcast {
                    pc,
                    target,
                    taken: true,
                    // The front-end could not redirect at issue, so commit
                    // must always repair the sequential speculative path.
                    mispredicted: true,
                    recovery_pc: target,
                    dest_tag: request.dest_tag,
                    rob_id: request.rob_id,
                }
            }
        }
    }

    /// Evaluates a conditional branch on its operand values.
    fn evaluate(op: BranchOp, rs1: i32, rs2: i32) -> bool {
        match op {
            BranchOp::Beq => rs1 == rs2,
            BranchOp::Bne => rs1 != rs2,
            BranchOp::Blt => rs1 < rs2,
            BranchOp::Bge => rs1 >= rs2,
            BranchOp::Bltu => (rs1 as u32) < (rs2 as u32),
            BranchOp::Bgeu => (rs1 as u32) >= (rs2 as u32),
        }
    }
}
