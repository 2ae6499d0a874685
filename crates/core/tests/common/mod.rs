//! Shared test infrastructure: an RV32I encoder and an end-to-end harness.

#![allow(dead_code)]

use std::io::Cursor;

use tomasim_core::sim::loader;
use tomasim_core::{Config, Simulator};

/// Instruction encoders producing canonical RV32I words.
pub mod asm {
    use tomasim_core::isa::rv32i::{funct3, funct7, opcodes};

    pub fn r_type(f7: u32, rs2: usize, rs1: usize, f3: u32, rd: usize, opcode: u32) -> u32 {
        (f7 << 25)
            | ((rs2 as u32) << 20)
            | ((rs1 as u32) << 15)
            | (f3 << 12)
            | ((rd as u32) << 7)
            | opcode
    }

    pub fn i_type(imm: i32, rs1: usize, f3: u32, rd: usize, opcode: u32) -> u32 {
        (((imm as u32) & 0xFFF) << 20)
            | ((rs1 as u32) << 15)
            | (f3 << 12)
            | ((rd as u32) << 7)
            | opcode
    }

    pub fn s_type(imm: i32, rs2: usize, rs1: usize, f3: u32) -> u32 {
        let imm = imm as u32;
        (((imm >> 5) & 0x7F) << 25)
            | ((rs2 as u32) << 20)
            | ((rs1 as u32) << 15)
            | (f3 << 12)
            | ((imm & 0x1F) << 7)
            | opcodes::OP_STORE
    }

    pub fn b_type(imm: i32, rs2: usize, rs1: usize, f3: u32) -> u32 {
        let imm = imm as u32;
        (((imm >> 12) & 0x1) << 31)
            | (((imm >> 5) & 0x3F) << 25)
            | ((rs2 as u32) << 20)
            | ((rs1 as u32) << 15)
            | (f3 << 12)
            | (((imm >> 1) & 0xF) << 8)
            | (((imm >> 11) & 0x1) << 7)
            | opcodes::OP_BRANCH
    }

    pub fn u_type(imm20: u32, rd: usize, opcode: u32) -> u32 {
        ((imm20 & 0xFFFFF) << 12) | ((rd as u32) << 7) | opcode
    }

    pub fn j_type(imm: i32, rd: usize) -> u32 {
        let imm = imm as u32;
        (((imm >> 20) & 0x1) << 31)
            | (((imm >> 1) & 0x3FF) << 21)
            | (((imm >> 11) & 0x1) << 20)
            | (((imm >> 12) & 0xFF) << 12)
            | ((rd as u32) << 7)
            | opcodes::OP_JAL
    }

    // ── mnemonics ─────────────────────────────────────────

    pub fn add(rd: usize, rs1: usize, rs2: usize) -> u32 {
        r_type(funct7::DEFAULT, rs2, rs1, funct3::ADD_SUB, rd, opcodes::OP_REG)
    }

    pub fn sub(rd: usize, rs1: usize, rs2: usize) -> u32 {
        r_type(funct7::SUB, rs2, rs1, funct3::ADD_SUB, rd, opcodes::OP_REG)
    }

    pub fn sll(rd: usize, rs1: usize, rs2: usize) -> u32 {
        r_type(funct7::DEFAULT, rs2, rs1, funct3::SLL, rd, opcodes::OP_REG)
    }

    pub fn sltu(rd: usize, rs1: usize, rs2: usize) -> u32 {
        r_type(funct7::DEFAULT, rs2, rs1, funct3::SLTU, rd, opcodes::OP_REG)
    }

    pub fn addi(rd: usize, rs1: usize, imm: i32) -> u32 {
        i_type(imm, rs1, funct3::ADD_SUB, rd, opcodes::OP_IMM)
    }

    pub fn xori(rd: usize, rs1: usize, imm: i32) -> u32 {
        i_type(imm, rs1, funct3::XOR, rd, opcodes::OP_IMM)
    }

    pub fn slli(rd: usize, rs1: usize, shamt: i32) -> u32 {
        i_type(shamt, rs1, funct3::SLL, rd, opcodes::OP_IMM)
    }

    pub fn srai(rd: usize, rs1: usize, shamt: i32) -> u32 {
        i_type(shamt | (funct7::SRA << 5) as i32, rs1, funct3::SRL_SRA, rd, opcodes::OP_IMM)
    }

    pub fn lb(rd: usize, rs1: usize, imm: i32) -> u32 {
        i_type(imm, rs1, funct3::LB, rd, opcodes::OP_LOAD)
    }

    pub fn lh(rd: usize, rs1: usize, imm: i32) -> u32 {
        i_type(imm, rs1, funct3::LH, rd, opcodes::OP_LOAD)
    }

    pub fn lw(rd: usize, rs1: usize, imm: i32) -> u32 {
        i_type(imm, rs1, funct3::LW, rd, opcodes::OP_LOAD)
    }

    pub fn lbu(rd: usize, rs1: usize, imm: i32) -> u32 {
        i_type(imm, rs1, funct3::LBU, rd, opcodes::OP_LOAD)
    }

    pub fn lhu(rd: usize, rs1: usize, imm: i32) -> u32 {
        i_type(imm, rs1, funct3::LHU, rd, opcodes::OP_LOAD)
    }

    pub fn sb(rs2: usize, rs1: usize, imm: i32) -> u32 {
        s_type(imm, rs2, rs1, funct3::SB)
    }

    pub fn sh(rs2: usize, rs1: usize, imm: i32) -> u32 {
        s_type(imm, rs2, rs1, funct3::SH)
    }

    pub fn sw(rs2: usize, rs1: usize, imm: i32) -> u32 {
        s_type(imm, rs2, rs1, funct3::SW)
    }

    pub fn beq(rs1: usize, rs2: usize, imm: i32) -> u32 {
        b_type(imm, rs2, rs1, funct3::BEQ)
    }

    pub fn bne(rs1: usize, rs2: usize, imm: i32) -> u32 {
        b_type(imm, rs2, rs1, funct3::BNE)
    }

    pub fn blt(rs1: usize, rs2: usize, imm: i32) -> u32 {
        b_type(imm, rs2, rs1, funct3::BLT)
    }

    pub fn lui(rd: usize, imm20: u32) -> u32 {
        u_type(imm20, rd, opcodes::OP_LUI)
    }

    pub fn auipc(rd: usize, imm20: u32) -> u32 {
        u_type(imm20, rd, opcodes::OP_AUIPC)
    }

    pub fn jal(rd: usize, imm: i32) -> u32 {
        j_type(imm, rd)
    }

    pub fn jalr(rd: usize, rs1: usize, imm: i32) -> u32 {
        i_type(imm, rs1, 0b000, rd, opcodes::OP_JALR)
    }

    pub fn nop() -> u32 {
        addi(0, 0, 0)
    }

    /// The conventional termination trap `addi a0, zero, 255`.
    pub fn trap() -> u32 {
        addi(10, 0, 255)
    }
}

/// Renders instruction words as the text hex image format, loaded at zero.
pub fn hex_image(words: &[u32]) -> String {
    let mut text = String::from("@0\n");
    for word in words {
        let bytes = word.to_le_bytes();
        text.push_str(&format!(
            "{:02x} {:02x} {:02x} {:02x}\n",
            bytes[0], bytes[1], bytes[2], bytes[3]
        ));
    }
    text
}

/// Outcome of an end-to-end program run.
pub struct RunResult {
    pub exit_code: u8,
    pub regs: [i32; 32],
    pub sim: Simulator,
}

/// Cycle cap for test programs; hitting it means a hang.
const TEST_CYCLE_LIMIT: u64 = 1_000_000;

/// Assembles, loads, and runs a program to completion.
pub fn run_program(words: &[u32]) -> RunResult {
    let image = loader::load_image(Cursor::new(hex_image(words))).expect("image parses");
    let config = Config {
        cycle_limit: TEST_CYCLE_LIMIT,
        ..Config::default()
    };
    let mut sim = Simulator::new(image, &config).expect("simulator builds");
    let exit_code = sim.run().expect("program runs");
    assert!(
        sim.cycles() < TEST_CYCLE_LIMIT,
        "program hit the cycle cap instead of terminating"
    );
    RunResult {
        exit_code,
        regs: sim.cpu().registers(),
        sim,
    }
}
