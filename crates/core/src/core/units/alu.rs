//! Arithmetic Logic Unit (ALU).
//!
//! Single-slot, one-cycle execution unit for integer arithmetic. An
//! operation latched by dispatch is computed on the following [`tick`] into
//! a *next* output slot, and becomes visible at the broadcast port one tick
//! later when `next` rolls into `current`. This double-buffering is the
//! register between combinational stages: within any cycle, readers see a
//! stable broadcast while the unit advances.
//!
//! [`tick`]: Alu::tick

use crate::core::pipeline::rob::RobTag;
use crate::isa::instruction::{ImmOp, RegOp, UpperOp};

/// Number of low bits of a shift operand that are significant.
const SHAMT_BITS: u32 = 0x1F;

/// Operations the ALU evaluates.
///
/// `Lui` and `Auipc` take the raw upper-20 immediate as operand `b` and
/// apply the `<< 12` here; `Auipc` additionally takes the instruction PC as
/// operand `a`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Sub,
    And,
    Or,
    Xor,
    Sll,
    Srl,
    Sra,
    Slt,
    Sltu,
    Lui,
    Auipc,
}

impl From<RegOp> for AluOp {
    fn from(op: RegOp) -> Self {
        match op {
            RegOp::Add => AluOp::Add,
            RegOp::Sub => AluOp::Sub,
            RegOp::And => AluOp::And,
            RegOp::Or => AluOp::Or,
            RegOp::Xor => AluOp::Xor,
            RegOp::Sll => AluOp::Sll,
            RegOp::Srl => AluOp::Srl,
            RegOp::Sra => AluOp::Sra,
            RegOp::Slt => AluOp::Slt,
            RegOp::Sltu => AluOp::Sltu,
        }
    }
}

impl From<ImmOp> for AluOp {
    fn from(op: ImmOp) -> Self {
        match op {
            ImmOp::Addi => AluOp::Add,
            ImmOp::Andi => AluOp::And,
            ImmOp::Ori => AluOp::Or,
            ImmOp::Xori => AluOp::Xor,
            ImmOp::Slli => AluOp::Sll,
            ImmOp::Srli => AluOp::Srl,
            ImmOp::Srai => AluOp::Sra,
            ImmOp::Slti => AluOp::Slt,
            ImmOp::Sltiu => AluOp::Sltu,
        }
    }
}

impl From<UpperOp> for AluOp {
    fn from(op: UpperOp) -> Self {
        match op {
            UpperOp::Lui => AluOp::Lui,
            UpperOp::Auipc => AluOp::Auipc,
        }
    }
}

/// An operation latched into the ALU by dispatch.
#[derive(Clone, Copy, Debug)]
pub struct AluRequest {
    /// First operand (instruction PC for AUIPC).
    pub a: i32,
    /// Second operand (raw upper immediate for LUI/AUIPC).
    pub b: i32,
    /// Operation to evaluate.
    pub op: AluOp,
    /// ROB tag the result is broadcast under.
    pub dest_tag: RobTag,
}

/// A computed result exposed at the broadcast port.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AluBroadcast {
    /// Result value.
    pub value: i32,
    /// ROB tag of the producing instruction.
    pub dest_tag: RobTag,
}

/// Evaluates a single ALU operation.
fn execute(op: AluOp, a: i32, b: i32) -> i32 {
    match op {
        AluOp::Add => a.wrapping_add(b),
        AluOp::Sub => a.wrapping_sub(b),
        AluOp::And => a & b,
        AluOp::Or => a | b,
        AluOp::Xor => a ^ b,
        AluOp::Sll => a.wrapping_shl((b as u32) & SHAMT_BITS),
        AluOp::Srl => ((a as u32).wrapping_shr((b as u32) & SHAMT_BITS)) as i32,
        AluOp::Sra => a.wrapping_shr((b as u32) & SHAMT_BITS),
        AluOp::Slt => (a < b) as i32,
        AluOp::Sltu => ((a as u32) < (b as u32)) as i32,
        AluOp::Lui => ((b as u32) << 12) as i32,
        AluOp::Auipc => a.wrapping_add(((b as u32) << 12) as i32),
    }
}

/// Single-slot, double-buffered arithmetic unit.
#[derive(Default)]
pub struct Alu {
    latched: Option<AluRequest>,
    next: Option<AluBroadcast>,
    current: Option<AluBroadcast>,
}

impl Alu {
    /// Creates an idle ALU.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if an operation can be latched this cycle.
    #[inline]
    pub fn is_available(&self) -> bool {
        self.latched.is_none()
    }

    /// Latches an operation for execution on the next tick.
    pub fn set_op(&mut self, request: AluRequest) {
        debug_assert!(self.is_available());
        self.latched = Some(request);
    }

    /// Advances one cycle: `next` rolls to `current`, and any latched
    /// operation is computed into `next`.
    pub fn tick(&mut self) {
        self.current = self.next.take();

        if let Some(request) = self.latched.take() {
            self.next = Some(AluBroadcast {
                value: execute(request.op, request.a, request.b),
                dest_tag: request.dest_tag,
            });
        }
    }

    /// Returns the result visible at the broadcast port this cycle.
    pub fn broadcast(&self) -> Option<AluBroadcast> {
        self.current
    }
}
