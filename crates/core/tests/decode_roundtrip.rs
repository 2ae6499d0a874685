//! Decode/re-encode round trip over canonical RV32I encodings.
//!
//! For every word produced by the test assembler, decoding and then
//! structurally re-encoding must reproduce the original bits.

mod common;

use common::asm;
use tomasim_core::isa::decode::decode;
use tomasim_core::isa::instruction::{
    BranchOp, ImmOp, Instruction, LoadOp, RegOp, StoreOp, UpperOp,
};
use tomasim_core::isa::rv32i::{funct3, funct7, opcodes};

/// Structurally re-encodes a decoded instruction.
fn encode(instr: &Instruction) -> u32 {
    match *instr {
        Instruction::Register { op, rd, rs1, rs2 } => {
            let (f3, f7) = match op {
                RegOp::Add => (funct3::ADD_SUB, funct7::DEFAULT),
                RegOp::Sub => (funct3::ADD_SUB, funct7::SUB),
                RegOp::Sll => (funct3::SLL, funct7::DEFAULT),
                RegOp::Slt => (funct3::SLT, funct7::DEFAULT),
                RegOp::Sltu => (funct3::SLTU, funct7::DEFAULT),
                RegOp::Xor => (funct3::XOR, funct7::DEFAULT),
                RegOp::Srl => (funct3::SRL_SRA, funct7::DEFAULT),
                RegOp::Sra => (funct3::SRL_SRA, funct7::SRA),
                RegOp::Or => (funct3::OR, funct7::DEFAULT),
                RegOp::And => (funct3::AND, funct7::DEFAULT),
            };
            asm::r_type(f7, rs2, rs1, f3, rd, opcodes::OP_REG)
        }
        Instruction::Immediate { op, rd, rs1, imm } => {
            let (f3, imm) = match op {
                ImmOp::Addi => (funct3::ADD_SUB, imm),
                ImmOp::Slti => (funct3::SLT, imm),
                ImmOp::Sltiu => (funct3::SLTU, imm),
                ImmOp::Xori => (funct3::XOR, imm),
                ImmOp::Ori => (funct3::OR, imm),
                ImmOp::Andi => (funct3::AND, imm),
                ImmOp::Slli => (funct3::SLL, imm),
                ImmOp::Srli => (funct3::SRL_SRA, imm),
                ImmOp::Srai => (funct3::SRL_SRA, imm | ((funct7::SRA << 5) as i32)),
            };
            asm::i_type(imm, rs1, f3, rd, opcodes::OP_IMM)
        }
        Instruction::Load { op, rd, rs1, imm } => {
            let f3 = match op {
                LoadOp::Lb => funct3::LB,
                LoadOp::Lh => funct3::LH,
                LoadOp::Lw => funct3::LW,
                LoadOp::Lbu => funct3::LBU,
                LoadOp::Lhu => funct3::LHU,
            };
            asm::i_type(imm, rs1, f3, rd, opcodes::OP_LOAD)
        }
        Instruction::Jalr { rd, rs1, imm } => asm::i_type(imm, rs1, 0b000, rd, opcodes::OP_JALR),
        Instruction::Store { op, rs1, rs2, imm } => {
            let f3 = match op {
                StoreOp::Sb => funct3::SB,
                StoreOp::Sh => funct3::SH,
                StoreOp::Sw => funct3::SW,
            };
            asm::s_type(imm, rs2, rs1, f3)
        }
        Instruction::Branch { op, rs1, rs2, imm } => {
            let f3 = match op {
                BranchOp::Beq => funct3::BEQ,
                BranchOp::Bne => funct3::BNE,
                BranchOp::Blt => funct3::BLT,
                BranchOp::Bge => funct3::BGE,
                BranchOp::Bltu => funct3::BLTU,
                BranchOp::Bgeu => funct3::BGEU,
            };
            asm::b_type(imm, rs2, rs1, f3)
        }
        Instruction::Upper { op, rd, imm } => {
            let opcode = match op {
                UpperOp::Lui => opcodes::OP_LUI,
                UpperOp::Auipc => opcodes::OP_AUIPC,
            };
            asm::u_type(imm as u32, rd, opcode)
        }
        Instruction::Jal { rd, imm } => asm::j_type(imm, rd),
    }
}

#[test]
fn test_roundtrip_over_full_base_set() {
    let words = [
        // R-type, every operation
        asm::r_type(funct7::DEFAULT, 3, 2, funct3::ADD_SUB, 1, opcodes::OP_REG),
        asm::r_type(funct7::SUB, 3, 2, funct3::ADD_SUB, 1, opcodes::OP_REG),
        asm::r_type(funct7::DEFAULT, 3, 2, funct3::SLL, 1, opcodes::OP_REG),
        asm::r_type(funct7::DEFAULT, 3, 2, funct3::SLT, 1, opcodes::OP_REG),
        asm::r_type(funct7::DEFAULT, 3, 2, funct3::SLTU, 1, opcodes::OP_REG),
        asm::r_type(funct7::DEFAULT, 3, 2, funct3::XOR, 1, opcodes::OP_REG),
        asm::r_type(funct7::DEFAULT, 3, 2, funct3::SRL_SRA, 1, opcodes::OP_REG),
        asm::r_type(funct7::SRA, 3, 2, funct3::SRL_SRA, 1, opcodes::OP_REG),
        asm::r_type(funct7::DEFAULT, 3, 2, funct3::OR, 1, opcodes::OP_REG),
        asm::r_type(funct7::DEFAULT, 3, 2, funct3::AND, 1, opcodes::OP_REG),
        // I-type arithmetic, positive and negative immediates
        asm::addi(31, 15, 2047),
        asm::addi(1, 2, -2048),
        asm::i_type(-1, 4, funct3::SLT, 5, opcodes::OP_IMM),
        asm::i_type(123, 4, funct3::SLTU, 5, opcodes::OP_IMM),
        asm::xori(6, 7, -1),
        asm::i_type(0x7F, 8, funct3::OR, 9, opcodes::OP_IMM),
        asm::i_type(0x55, 10, funct3::AND, 11, opcodes::OP_IMM),
        asm::slli(12, 13, 31),
        asm::i_type(7, 14, funct3::SRL_SRA, 15, opcodes::OP_IMM),
        asm::srai(16, 17, 1),
        // Memory
        asm::lb(1, 2, -4),
        asm::lh(1, 2, 0),
        asm::lw(1, 2, 4),
        asm::lbu(1, 2, 8),
        asm::lhu(1, 2, 12),
        asm::sb(3, 4, -1),
        asm::sh(3, 4, 2),
        asm::sw(3, 4, 2047),
        // Control flow
        asm::beq(1, 2, -4096),
        asm::bne(1, 2, 4094),
        asm::blt(1, 2, 8),
        asm::b_type(-8, 2, 1, funct3::BGE),
        asm::b_type(16, 2, 1, funct3::BLTU),
        asm::b_type(-16, 2, 1, funct3::BGEU),
        asm::jal(1, -1048576),
        asm::jal(0, 1048574),
        asm::jalr(0, 1, -2),
        // Upper
        asm::lui(5, 0xFFFFF),
        asm::lui(5, 0),
        asm::auipc(6, 0x80000),
    ];

    for &word in &words {
        let decoded = decode(word)
            .unwrap_or_else(|| panic!("canonical word {:#010x} failed to decode", word));
        assert_eq!(
            encode(&decoded),
            word,
            "round trip mismatch for {:#010x} ({:?})",
            word,
            decoded
        );
    }
}
